#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Core contracts shared across the Vanguard agent.
//!
//! This crate defines the vocabulary that connects the game-client adapter,
//! the per-tick world snapshot, and the decision systems. The adapter parses
//! an observation into a snapshot made of [`UnitSnapshot`] values, systems
//! read that snapshot, and respond exclusively by pushing [`Command`] values
//! into a [`CommandBatch`] that the adapter flushes once at the end of the
//! tick.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Distance around a town hall within which resources count as part of its base.
pub const RESOURCE_SPREAD_DISTANCE: f32 = 9.0;

/// Long-range awareness distance used for wave retarget and recenter thresholds.
///
/// Matches the radius revealed by a scanner sweep.
pub const DETECTION_RADIUS: f32 = 13.0;

/// Sight range shared by structures unless their kind says otherwise.
pub const BUILDING_SIGHT_RANGE: f32 = 9.0;

/// Hard supply ceiling imposed by the game.
pub const MAX_SUPPLY: u32 = 200;

/// Number of game loops elapsing per in-game second at the fastest speed.
pub const LOOPS_PER_SECOND: f32 = 22.4;

/// Unique identifier assigned to a unit by the game engine.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct UnitTag(u64);

impl UnitTag {
    /// Creates a new unit tag with the provided numeric value.
    #[must_use]
    pub const fn new(value: u64) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the tag.
    #[must_use]
    pub const fn get(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for UnitTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Continuous position on the map expressed in world units.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Point {
    x: f32,
    y: f32,
}

impl Point {
    /// Creates a new point from its coordinates.
    #[must_use]
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Horizontal coordinate.
    #[must_use]
    pub const fn x(&self) -> f32 {
        self.x
    }

    /// Vertical coordinate. Larger values are further north.
    #[must_use]
    pub const fn y(&self) -> f32 {
        self.y
    }

    /// Euclidean distance between two points.
    #[must_use]
    pub fn distance(self, other: Point) -> f32 {
        self.distance_squared(other).sqrt()
    }

    /// Squared Euclidean distance between two points.
    #[must_use]
    pub fn distance_squared(self, other: Point) -> f32 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        dx * dx + dy * dy
    }

    /// Reports whether `other` lies strictly within `distance` of this point.
    #[must_use]
    pub fn is_closer_than(self, distance: f32, other: Point) -> bool {
        self.distance_squared(other) < distance * distance
    }

    /// Moves `distance` units from this point in the direction of `target`.
    ///
    /// Returns the point unchanged when both points coincide.
    #[must_use]
    pub fn towards(self, target: Point, distance: f32) -> Point {
        let length = self.distance(target);
        if length <= f32::EPSILON {
            return self;
        }

        let scale = distance / length;
        Point::new(
            self.x + (target.x - self.x) * scale,
            self.y + (target.y - self.y) * scale,
        )
    }

    /// Translates the point by the provided offsets.
    #[must_use]
    pub fn offset(self, dx: f32, dy: f32) -> Point {
        Point::new(self.x + dx, self.y + dy)
    }

    /// Rounds both coordinates down onto the placement grid.
    #[must_use]
    pub fn floor(self) -> Point {
        Point::new(self.x.floor(), self.y.floor())
    }

    /// Grid cell containing this point.
    #[must_use]
    pub fn cell(self) -> CellCoord {
        CellCoord::new(self.x.floor() as i32, self.y.floor() as i32)
    }

    /// Arithmetic mean of the provided points, if there are any.
    #[must_use]
    pub fn centroid<I>(points: I) -> Option<Point>
    where
        I: IntoIterator<Item = Point>,
    {
        let mut count = 0_u32;
        let (mut sum_x, mut sum_y) = (0.0_f32, 0.0_f32);
        for point in points {
            count += 1;
            sum_x += point.x;
            sum_y += point.y;
        }

        if count == 0 {
            return None;
        }

        Some(Point::new(sum_x / count as f32, sum_y / count as f32))
    }
}

impl fmt::Display for Point {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({:.1}, {:.1})", self.x, self.y)
    }
}

/// Location of a single placement grid cell.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CellCoord {
    x: i32,
    y: i32,
}

impl CellCoord {
    /// Creates a new grid cell coordinate.
    #[must_use]
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Column of the cell.
    #[must_use]
    pub const fn x(&self) -> i32 {
        self.x
    }

    /// Row of the cell.
    #[must_use]
    pub const fn y(&self) -> i32 {
        self.y
    }

    /// Position of the cell's lower-left corner.
    #[must_use]
    pub fn corner(self) -> Point {
        Point::new(self.x as f32, self.y as f32)
    }

    /// Euclidean distance between the corners of two cells.
    #[must_use]
    pub fn distance(self, other: CellCoord) -> f32 {
        self.corner().distance(other.corner())
    }
}

/// Relationship between a unit's owner and the agent.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Alliance {
    /// Owned by the agent.
    Own,
    /// Owned by the opponent.
    Enemy,
    /// Map features such as mineral fields and geysers.
    Neutral,
}

/// Static properties shared by every unit of a kind.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct KindProfile {
    /// Whether the kind is a building.
    pub structure: bool,
    /// Whether the kind trains harvesters and anchors a base.
    pub town_hall: bool,
    /// Whether the kind can construct buildings.
    pub worker: bool,
    /// Whether the kind gathers resources.
    pub miner: bool,
    /// Whether the kind trains military units.
    pub production: bool,
    /// Whether the kind is a claimed gas extraction structure.
    pub refinery: bool,
    /// Whether the kind is a mineral patch.
    pub mineral_field: bool,
    /// Whether the kind is an unclaimed gas site.
    pub geyser: bool,
    /// Whether the kind is a combat unit that deals meaningful damage.
    pub army: bool,
    /// Whether units of this kind are airborne.
    pub flying: bool,
    /// Physical radius in world units.
    pub radius: f32,
    /// Sight range in world units.
    pub sight: f32,
}

impl KindProfile {
    const fn unit(radius: f32, sight: f32) -> Self {
        Self {
            structure: false,
            town_hall: false,
            worker: false,
            miner: false,
            production: false,
            refinery: false,
            mineral_field: false,
            geyser: false,
            army: false,
            flying: false,
            radius,
            sight,
        }
    }

    const fn building(radius: f32) -> Self {
        Self {
            structure: true,
            ..Self::unit(radius, BUILDING_SIGHT_RANGE)
        }
    }

    const fn town_hall(sight: f32) -> Self {
        Self {
            town_hall: true,
            sight,
            ..Self::building(2.75)
        }
    }

    const fn worker() -> Self {
        Self {
            worker: true,
            miner: true,
            ..Self::unit(0.375, 8.0)
        }
    }

    const fn army(radius: f32, sight: f32) -> Self {
        Self {
            army: true,
            ..Self::unit(radius, sight)
        }
    }

    const fn air_army(radius: f32, sight: f32) -> Self {
        Self {
            flying: true,
            ..Self::army(radius, sight)
        }
    }

    const fn production(radius: f32) -> Self {
        Self {
            production: true,
            ..Self::building(radius)
        }
    }

    const fn lifted(self) -> Self {
        Self {
            flying: true,
            ..self
        }
    }

    const fn refinery() -> Self {
        Self {
            refinery: true,
            ..Self::building(1.8125)
        }
    }

    const fn mineral_field() -> Self {
        Self {
            mineral_field: true,
            ..Self::unit(1.125, 1.0)
        }
    }

    const fn geyser() -> Self {
        Self {
            geyser: true,
            ..Self::unit(1.8125, 1.0)
        }
    }
}

/// Unit and structure types the agent reasons about.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum UnitKind {
    /// Terran harvester and builder.
    Scv,
    /// Temporary Terran harvester that cannot build.
    Mule,
    /// Terran basic infantry.
    Marine,
    /// Terran armoured infantry.
    Marauder,
    /// Terran healing air transport.
    Medivac,
    /// Terran town hall.
    CommandCenter,
    /// Lifted Terran town hall.
    CommandCenterFlying,
    /// Economic role-morph of the command center.
    OrbitalCommand,
    /// Lifted orbital command.
    OrbitalCommandFlying,
    /// Defensive role-morph of the command center.
    PlanetaryFortress,
    /// Terran supply structure.
    SupplyDepot,
    /// Terran supply structure lowered into the ground.
    SupplyDepotLowered,
    /// Terran gas extraction structure.
    Refinery,
    /// Terran gas extraction structure on a rich geyser.
    RefineryRich,
    /// Terran infantry production.
    Barracks,
    /// Lifted barracks.
    BarracksFlying,
    /// Reactor add-on attached to a barracks.
    BarracksReactor,
    /// Tech lab add-on attached to a barracks.
    BarracksTechLab,
    /// Terran vehicle production.
    Factory,
    /// Lifted factory.
    FactoryFlying,
    /// Reactor add-on attached to a factory.
    FactoryReactor,
    /// Tech lab add-on attached to a factory.
    FactoryTechLab,
    /// Terran air production.
    Starport,
    /// Lifted starport.
    StarportFlying,
    /// Reactor add-on attached to a starport.
    StarportReactor,
    /// Tech lab add-on attached to a starport.
    StarportTechLab,
    /// Terran infantry research structure.
    EngineeringBay,
    /// Terran vehicle research structure.
    Armory,
    /// Terran anti-air point defense.
    MissileTurret,
    /// Terran infantry bunker.
    Bunker,
    /// Protoss town hall.
    Nexus,
    /// Protoss harvester.
    Probe,
    /// Protoss supply structure.
    Pylon,
    /// Protoss infantry production.
    Gateway,
    /// Protoss gas extraction structure.
    Assimilator,
    /// Protoss melee infantry.
    Zealot,
    /// Protoss ranged walker.
    Stalker,
    /// Protoss air unit.
    VoidRay,
    /// Protoss point defense.
    PhotonCannon,
    /// Zerg town hall.
    Hatchery,
    /// First Zerg town hall upgrade.
    Lair,
    /// Second Zerg town hall upgrade.
    Hive,
    /// Zerg harvester.
    Drone,
    /// Zerg gas extraction structure.
    Extractor,
    /// Zerg tech structure.
    SpawningPool,
    /// Zerg melee swarm unit.
    Zergling,
    /// Zerg ranged armoured unit.
    Roach,
    /// Zerg air unit.
    Mutalisk,
    /// Zerg supply provider and scout.
    Overlord,
    /// Zerg scout disguised as an enemy soldier. It cannot attack.
    Changeling,
    /// Zerg ground defense.
    SpineCrawler,
    /// Zerg anti-air defense.
    SporeCrawler,
    /// Standard mineral patch.
    MineralField,
    /// Rich mineral patch.
    RichMineralField,
    /// Unclaimed gas site.
    VespeneGeyser,
    /// Unclaimed rich gas site.
    RichVespeneGeyser,
}

impl UnitKind {
    /// Looks up the static properties of the kind.
    #[must_use]
    pub const fn profile(self) -> KindProfile {
        match self {
            Self::Scv | Self::Probe | Self::Drone => KindProfile::worker(),
            Self::Mule => KindProfile {
                worker: false,
                ..KindProfile::worker()
            },
            Self::Marine => KindProfile::army(0.375, 9.0),
            Self::Marauder => KindProfile::army(0.5625, 10.0),
            Self::Medivac => KindProfile::unit(0.75, 11.0).lifted(),
            Self::CommandCenter => KindProfile::town_hall(11.0),
            Self::CommandCenterFlying => KindProfile::town_hall(11.0).lifted(),
            Self::OrbitalCommand => KindProfile::town_hall(11.0),
            Self::OrbitalCommandFlying => KindProfile::town_hall(11.0).lifted(),
            Self::PlanetaryFortress => KindProfile::town_hall(11.0),
            Self::SupplyDepot | Self::SupplyDepotLowered => KindProfile::building(1.125),
            Self::Refinery | Self::RefineryRich | Self::Assimilator | Self::Extractor => {
                KindProfile::refinery()
            }
            Self::Barracks | Self::Factory | Self::Starport | Self::Gateway => {
                KindProfile::production(1.8125)
            }
            Self::BarracksFlying | Self::FactoryFlying | Self::StarportFlying => {
                KindProfile::production(1.8125).lifted()
            }
            Self::BarracksReactor
            | Self::BarracksTechLab
            | Self::FactoryReactor
            | Self::FactoryTechLab
            | Self::StarportReactor
            | Self::StarportTechLab => KindProfile::building(1.0),
            Self::EngineeringBay | Self::Armory | Self::SpawningPool => {
                KindProfile::building(1.8125)
            }
            Self::MissileTurret | Self::PhotonCannon => KindProfile {
                army: true,
                sight: 11.0,
                ..KindProfile::building(1.125)
            },
            Self::SpineCrawler | Self::SporeCrawler => KindProfile {
                army: true,
                sight: 11.0,
                ..KindProfile::building(1.125)
            },
            Self::Bunker => KindProfile::building(1.8125),
            Self::Nexus => KindProfile::town_hall(11.0),
            Self::Hatchery | Self::Lair | Self::Hive => KindProfile {
                production: true,
                ..KindProfile::town_hall(12.0)
            },
            Self::Pylon => KindProfile::building(1.125),
            Self::Zealot => KindProfile::army(0.5, 9.0),
            Self::Stalker => KindProfile::army(0.625, 10.0),
            Self::VoidRay => KindProfile::air_army(1.0, 10.0),
            Self::Zergling => KindProfile::army(0.375, 8.0),
            Self::Roach => KindProfile::army(0.625, 9.0),
            Self::Mutalisk => KindProfile::air_army(0.5, 11.0),
            Self::Overlord => KindProfile::unit(1.0, 11.0).lifted(),
            Self::Changeling => KindProfile::unit(0.375, 8.0),
            Self::MineralField | Self::RichMineralField => KindProfile::mineral_field(),
            Self::VespeneGeyser | Self::RichVespeneGeyser => KindProfile::geyser(),
        }
    }

    /// Whether the kind is a building.
    #[must_use]
    pub const fn is_structure(self) -> bool {
        self.profile().structure
    }

    /// Whether the kind trains harvesters and anchors a base.
    #[must_use]
    pub const fn is_town_hall(self) -> bool {
        self.profile().town_hall
    }

    /// Whether the kind can construct buildings.
    #[must_use]
    pub const fn is_worker(self) -> bool {
        self.profile().worker
    }

    /// Whether the kind gathers resources.
    #[must_use]
    pub const fn is_miner(self) -> bool {
        self.profile().miner
    }

    /// Whether the kind trains military units.
    #[must_use]
    pub const fn is_production(self) -> bool {
        self.profile().production
    }

    /// Whether the kind is a claimed gas extraction structure.
    #[must_use]
    pub const fn is_refinery(self) -> bool {
        self.profile().refinery
    }

    /// Whether the kind is a mineral patch.
    #[must_use]
    pub const fn is_mineral_field(self) -> bool {
        self.profile().mineral_field
    }

    /// Whether the kind is an unclaimed gas site.
    #[must_use]
    pub const fn is_geyser(self) -> bool {
        self.profile().geyser
    }

    /// Whether the kind is a combat unit.
    #[must_use]
    pub const fn is_army(self) -> bool {
        self.profile().army
    }

    /// Whether the kind may touch one foreign building kind when placed.
    #[must_use]
    pub const fn is_touchy(self) -> bool {
        matches!(
            self,
            Self::SupplyDepot | Self::SupplyDepotLowered | Self::MissileTurret
        )
    }
}

/// Mineral, gas, and supply price of an ability.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Cost {
    /// Minerals spent.
    pub minerals: u32,
    /// Vespene gas spent.
    pub vespene: u32,
    /// Supply consumed.
    pub supply: u32,
}

impl Cost {
    const fn new(minerals: u32, vespene: u32, supply: u32) -> Self {
        Self {
            minerals,
            vespene,
            supply,
        }
    }
}

/// Abilities the agent orders units to use.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum AbilityId {
    /// Context-sensitive right click.
    Smart,
    /// Move without engaging.
    Move,
    /// Attack-move.
    Attack,
    /// Gather from a resource.
    HarvestGather,
    /// Return carried resources.
    HarvestReturn,
    /// Cancel the most recent queued order.
    CancelLast,
    /// Set a production structure's rally point.
    RallyBuilding,
    /// Set a town hall's worker rally point.
    RallyWorkers,
    /// Construct a supply depot.
    BuildSupplyDepot,
    /// Construct a barracks.
    BuildBarracks,
    /// Construct a refinery on a geyser.
    BuildRefinery,
    /// Construct a command center.
    BuildCommandCenter,
    /// Construct a factory.
    BuildFactory,
    /// Construct a starport.
    BuildStarport,
    /// Construct an engineering bay.
    BuildEngineeringBay,
    /// Construct an armory.
    BuildArmory,
    /// Construct a missile turret.
    BuildMissileTurret,
    /// Construct a bunker.
    BuildBunker,
    /// Attach a reactor to a barracks.
    BuildReactorBarracks,
    /// Attach a tech lab to a barracks.
    BuildTechLabBarracks,
    /// Attach a reactor to a factory.
    BuildReactorFactory,
    /// Attach a tech lab to a factory.
    BuildTechLabFactory,
    /// Attach a reactor to a starport.
    BuildReactorStarport,
    /// Attach a tech lab to a starport.
    BuildTechLabStarport,
    /// Upgrade a command center into an orbital command.
    MorphOrbitalCommand,
    /// Upgrade a command center into a planetary fortress.
    MorphPlanetaryFortress,
    /// Train a harvester.
    TrainScv,
    /// Train a marine.
    TrainMarine,
    /// Research combat shield.
    ResearchCombatShield,
    /// Research stimpack.
    ResearchStimpack,
    /// Research infantry weapons level 1.
    ResearchInfantryWeapons1,
    /// Research infantry weapons level 2.
    ResearchInfantryWeapons2,
    /// Research infantry weapons level 3.
    ResearchInfantryWeapons3,
    /// Research infantry armor level 1.
    ResearchInfantryArmor1,
    /// Research infantry armor level 2.
    ResearchInfantryArmor2,
    /// Research infantry armor level 3.
    ResearchInfantryArmor3,
    /// Lift a command center off the ground.
    LiftCommandCenter,
    /// Lift an orbital command off the ground.
    LiftOrbitalCommand,
    /// Land a flying command center.
    LandCommandCenter,
    /// Land a flying orbital command.
    LandOrbitalCommand,
}

impl AbilityId {
    /// Price paid when the ability is used.
    #[must_use]
    pub const fn cost(self) -> Cost {
        match self {
            Self::BuildSupplyDepot => Cost::new(100, 0, 0),
            Self::BuildBarracks => Cost::new(150, 0, 0),
            Self::BuildRefinery => Cost::new(75, 0, 0),
            Self::BuildCommandCenter => Cost::new(400, 0, 0),
            Self::BuildFactory | Self::BuildStarport | Self::BuildArmory => Cost::new(150, 100, 0),
            Self::BuildEngineeringBay => Cost::new(125, 0, 0),
            Self::BuildMissileTurret | Self::BuildBunker => Cost::new(100, 0, 0),
            Self::BuildReactorBarracks | Self::BuildReactorFactory | Self::BuildReactorStarport => {
                Cost::new(50, 50, 0)
            }
            Self::BuildTechLabBarracks | Self::BuildTechLabFactory | Self::BuildTechLabStarport => {
                Cost::new(50, 25, 0)
            }
            Self::MorphOrbitalCommand => Cost::new(150, 0, 0),
            Self::MorphPlanetaryFortress => Cost::new(150, 150, 0),
            Self::TrainScv | Self::TrainMarine => Cost::new(50, 0, 1),
            Self::ResearchCombatShield
            | Self::ResearchStimpack
            | Self::ResearchInfantryWeapons1
            | Self::ResearchInfantryArmor1 => Cost::new(100, 100, 0),
            Self::ResearchInfantryWeapons2 | Self::ResearchInfantryArmor2 => Cost::new(175, 175, 0),
            Self::ResearchInfantryWeapons3 | Self::ResearchInfantryArmor3 => Cost::new(250, 250, 0),
            Self::Smart
            | Self::Move
            | Self::Attack
            | Self::HarvestGather
            | Self::HarvestReturn
            | Self::CancelLast
            | Self::RallyBuilding
            | Self::RallyWorkers
            | Self::LiftCommandCenter
            | Self::LiftOrbitalCommand
            | Self::LandCommandCenter
            | Self::LandOrbitalCommand => Cost::new(0, 0, 0),
        }
    }

    /// Structure produced when a worker or building uses this ability, if any.
    #[must_use]
    pub const fn builds(self) -> Option<UnitKind> {
        match self {
            Self::BuildSupplyDepot => Some(UnitKind::SupplyDepot),
            Self::BuildBarracks => Some(UnitKind::Barracks),
            Self::BuildRefinery => Some(UnitKind::Refinery),
            Self::BuildCommandCenter => Some(UnitKind::CommandCenter),
            Self::BuildFactory => Some(UnitKind::Factory),
            Self::BuildStarport => Some(UnitKind::Starport),
            Self::BuildEngineeringBay => Some(UnitKind::EngineeringBay),
            Self::BuildArmory => Some(UnitKind::Armory),
            Self::BuildMissileTurret => Some(UnitKind::MissileTurret),
            Self::BuildBunker => Some(UnitKind::Bunker),
            Self::BuildReactorBarracks => Some(UnitKind::BarracksReactor),
            Self::BuildTechLabBarracks => Some(UnitKind::BarracksTechLab),
            Self::BuildReactorFactory => Some(UnitKind::FactoryReactor),
            Self::BuildTechLabFactory => Some(UnitKind::FactoryTechLab),
            Self::BuildReactorStarport => Some(UnitKind::StarportReactor),
            Self::BuildTechLabStarport => Some(UnitKind::StarportTechLab),
            _ => None,
        }
    }

    /// Whether a worker uses this ability to start a new structure.
    #[must_use]
    pub const fn is_worker_build(self) -> bool {
        matches!(
            self,
            Self::BuildSupplyDepot
                | Self::BuildBarracks
                | Self::BuildRefinery
                | Self::BuildCommandCenter
                | Self::BuildFactory
                | Self::BuildStarport
                | Self::BuildEngineeringBay
                | Self::BuildArmory
                | Self::BuildMissileTurret
                | Self::BuildBunker
        )
    }

    /// Whether the ability lifts or lands a town hall.
    #[must_use]
    pub const fn is_lift_or_land(self) -> bool {
        matches!(
            self,
            Self::LiftCommandCenter
                | Self::LiftOrbitalCommand
                | Self::LandCommandCenter
                | Self::LandOrbitalCommand
        )
    }
}

/// Researchable upgrades tracked through completion flags.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum UpgradeId {
    /// Marine health upgrade.
    CombatShield,
    /// Infantry speed boost.
    Stimpack,
    /// Infantry weapons level 1.
    InfantryWeapons1,
    /// Infantry weapons level 2.
    InfantryWeapons2,
    /// Infantry weapons level 3.
    InfantryWeapons3,
    /// Infantry armor level 1.
    InfantryArmor1,
    /// Infantry armor level 2.
    InfantryArmor2,
    /// Infantry armor level 3.
    InfantryArmor3,
}

impl UpgradeId {
    /// Ability a research structure uses to start this upgrade.
    #[must_use]
    pub const fn research_ability(self) -> AbilityId {
        match self {
            Self::CombatShield => AbilityId::ResearchCombatShield,
            Self::Stimpack => AbilityId::ResearchStimpack,
            Self::InfantryWeapons1 => AbilityId::ResearchInfantryWeapons1,
            Self::InfantryWeapons2 => AbilityId::ResearchInfantryWeapons2,
            Self::InfantryWeapons3 => AbilityId::ResearchInfantryWeapons3,
            Self::InfantryArmor1 => AbilityId::ResearchInfantryArmor1,
            Self::InfantryArmor2 => AbilityId::ResearchInfantryArmor2,
            Self::InfantryArmor3 => AbilityId::ResearchInfantryArmor3,
        }
    }
}

/// Target of an order or command.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub enum OrderTarget {
    /// The ability needs no target.
    None,
    /// The ability targets a map position.
    Point(Point),
    /// The ability targets another unit.
    Unit(UnitTag),
}

/// Order currently queued on a unit, as reported by the game.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Order {
    /// Ability being executed.
    pub ability: AbilityId,
    /// Target of the ability.
    pub target: OrderTarget,
}

impl Order {
    /// Creates a new order descriptor.
    #[must_use]
    pub const fn new(ability: AbilityId, target: OrderTarget) -> Self {
        Self { ability, target }
    }
}

/// Grid area occupied by a structure.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BuildingSize {
    /// Two by two cells, such as supply depots and turrets.
    S2x2,
    /// Three by three cells, such as barracks.
    S3x3,
    /// A three by three building with room for a two by two add-on on its right.
    S5x3,
    /// Five by five cells, such as town halls.
    S5x5,
}

impl BuildingSize {
    /// Derives the footprint of a structure from its physical radius.
    ///
    /// Radii of one or less belong to units and add-ons that do not block
    /// placement on their own.
    #[must_use]
    pub fn from_radius(radius: f32) -> Option<Self> {
        if radius <= 1.0 {
            None
        } else if (1.125..=1.25).contains(&radius) {
            Some(Self::S2x2)
        } else if radius > 1.25 && radius < 2.75 {
            Some(Self::S3x3)
        } else if (radius - 2.75).abs() < f32::EPSILON {
            Some(Self::S5x5)
        } else {
            None
        }
    }

    /// Width and height measured in cells.
    #[must_use]
    pub const fn dimensions(self) -> (i32, i32) {
        match self {
            Self::S2x2 => (2, 2),
            Self::S3x3 => (3, 3),
            Self::S5x3 => (5, 3),
            Self::S5x5 => (5, 5),
        }
    }

    /// Cells covered when the structure is centered at `center`.
    ///
    /// For [`BuildingSize::S5x3`] the center refers to the main building and the
    /// add-on cells extend to the right.
    #[must_use]
    pub fn cells(self, center: Point) -> Vec<CellCoord> {
        let (width, height) = self.dimensions();
        let main_width = match self {
            Self::S5x3 => 3,
            _ => width,
        };
        let left = first_cell(center.x(), main_width);
        let bottom = first_cell(center.y(), height);

        let mut cells = Vec::with_capacity((width * height) as usize);
        for y in bottom..bottom + height {
            for x in left..left + width {
                cells.push(CellCoord::new(x, y));
            }
        }
        cells
    }

    /// Reports whether two footprints come within one diagonal cell of each other.
    #[must_use]
    pub fn touches(self, center: Point, other: BuildingSize, other_center: Point) -> bool {
        let ours = self.cells(center);
        let theirs = other.cells(other_center);
        ours.iter().any(|cell| {
            theirs
                .iter()
                .any(|candidate| cell.distance(*candidate) <= std::f32::consts::SQRT_2)
        })
    }
}

/// Lowest cell of a run of `span` cells centered on `center`.
///
/// Odd spans snap to the nearest cell, so a 3-wide footprint at `x` or
/// `x + 0.5` covers `x - 1..=x + 1`.
fn first_cell(center: f32, span: i32) -> i32 {
    let start = center - span as f32 / 2.0;
    if span % 2 == 0 {
        start.floor() as i32
    } else {
        (start + 0.5).floor() as i32
    }
}

/// Immutable representation of a single unit's state used for queries.
#[derive(Clone, Debug, PartialEq)]
pub struct UnitSnapshot {
    /// Unique identifier assigned by the game.
    pub tag: UnitTag,
    /// Kind of the unit.
    pub kind: UnitKind,
    /// Owner relationship.
    pub alliance: Alliance,
    /// Center of the unit.
    pub position: Point,
    /// Physical radius in world units.
    pub radius: f32,
    /// Sight range in world units.
    pub sight_range: f32,
    /// Construction progress in `[0, 1]`.
    pub build_progress: f32,
    /// Orders queued on the unit, current order first.
    pub orders: Vec<Order>,
    /// Add-on attached to the structure, if any.
    pub add_on: Option<UnitTag>,
    /// Whether the unit is airborne.
    pub flying: bool,
    /// Minerals remaining in a mineral patch.
    pub mineral_contents: u32,
    /// Gas remaining in a geyser or refinery.
    pub vespene_contents: u32,
}

impl UnitSnapshot {
    /// Creates a completed, idle unit whose physical properties come from its kind.
    #[must_use]
    pub fn new(tag: UnitTag, kind: UnitKind, alliance: Alliance, position: Point) -> Self {
        let profile = kind.profile();
        Self {
            tag,
            kind,
            alliance,
            position,
            radius: profile.radius,
            sight_range: profile.sight,
            build_progress: 1.0,
            orders: Vec::new(),
            add_on: None,
            flying: profile.flying,
            mineral_contents: 0,
            vespene_contents: 0,
        }
    }

    /// Replaces the unit's order queue.
    #[must_use]
    pub fn with_orders(mut self, orders: Vec<Order>) -> Self {
        self.orders = orders;
        self
    }

    /// Appends one order to the unit's queue.
    #[must_use]
    pub fn with_order(mut self, ability: AbilityId, target: OrderTarget) -> Self {
        self.orders.push(Order::new(ability, target));
        self
    }

    /// Sets the construction progress.
    #[must_use]
    pub fn with_build_progress(mut self, progress: f32) -> Self {
        self.build_progress = progress;
        self
    }

    /// Attaches an add-on.
    #[must_use]
    pub fn with_add_on(mut self, add_on: UnitTag) -> Self {
        self.add_on = Some(add_on);
        self
    }

    /// Sets the remaining mineral contents.
    #[must_use]
    pub fn with_minerals(mut self, contents: u32) -> Self {
        self.mineral_contents = contents;
        self
    }

    /// Sets the remaining gas contents.
    #[must_use]
    pub fn with_vespene(mut self, contents: u32) -> Self {
        self.vespene_contents = contents;
        self
    }

    /// Overrides the physical radius.
    #[must_use]
    pub fn with_radius(mut self, radius: f32) -> Self {
        self.radius = radius;
        self
    }

    /// Whether construction has finished.
    #[must_use]
    pub fn is_ready(&self) -> bool {
        self.build_progress >= 1.0
    }

    /// Whether construction is still underway.
    #[must_use]
    pub fn is_in_progress(&self) -> bool {
        self.build_progress < 1.0
    }

    /// Whether the unit has no orders.
    #[must_use]
    pub fn is_idle(&self) -> bool {
        self.orders.is_empty()
    }

    /// Whether the unit is a building.
    #[must_use]
    pub fn is_structure(&self) -> bool {
        self.kind.is_structure()
    }

    /// Whether the unit is one of the provided kinds.
    #[must_use]
    pub fn is_any(&self, kinds: &[UnitKind]) -> bool {
        kinds.contains(&self.kind)
    }

    /// Whether any queued order uses `ability`.
    #[must_use]
    pub fn is_ordered_to(&self, ability: AbilityId) -> bool {
        self.orders.iter().any(|order| order.ability == ability)
    }

    /// Whether any queued order uses one of `abilities`.
    #[must_use]
    pub fn is_ordered_to_any(&self, abilities: &[AbilityId]) -> bool {
        self.orders
            .iter()
            .any(|order| abilities.contains(&order.ability))
    }

    /// Whether an order uses `ability` on a point within one unit of `target`.
    #[must_use]
    pub fn is_ordered_to_point(&self, ability: AbilityId, target: Point) -> bool {
        self.orders.iter().any(|order| {
            order.ability == ability
                && matches!(order.target, OrderTarget::Point(point) if point.is_closer_than(1.0, target))
        })
    }

    /// Whether an order uses `ability` on the unit identified by `tag`.
    #[must_use]
    pub fn is_ordered_to_unit(&self, ability: AbilityId, tag: UnitTag) -> bool {
        self.orders
            .iter()
            .any(|order| order.ability == ability && order.target == OrderTarget::Unit(tag))
    }

    /// Whether any order targets the unit identified by `tag`.
    #[must_use]
    pub fn targets_unit(&self, tag: UnitTag) -> bool {
        self.orders
            .iter()
            .any(|order| order.target == OrderTarget::Unit(tag))
    }

    /// Whether the unit is walking to or mining a resource.
    #[must_use]
    pub fn is_gathering(&self) -> bool {
        self.is_ordered_to(AbilityId::HarvestGather)
    }

    /// Whether the unit is carrying resources back to a town hall.
    #[must_use]
    pub fn is_returning(&self) -> bool {
        self.is_ordered_to(AbilityId::HarvestReturn)
    }

    /// Whether the unit is ordered to construct a structure.
    #[must_use]
    pub fn is_building(&self) -> bool {
        self.orders.iter().any(|order| order.ability.is_worker_build())
    }

    /// Whether the patch still holds minerals.
    #[must_use]
    pub fn has_minerals(&self) -> bool {
        self.kind.is_mineral_field() && self.mineral_contents > 0
    }

    /// Whether the geyser or refinery still holds gas.
    #[must_use]
    pub fn has_gas(&self) -> bool {
        self.vespene_contents > 0
    }

    /// Grid footprint derived from the unit's radius; lifted structures block nothing.
    #[must_use]
    pub fn footprint(&self) -> Option<BuildingSize> {
        if self.flying || !self.is_structure() {
            return None;
        }
        BuildingSize::from_radius(self.radius)
    }
}

/// Resource stock reported by the game for the current tick.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resources {
    /// Minerals in the bank.
    pub minerals: u32,
    /// Vespene gas in the bank.
    pub vespene: u32,
    /// Supply in use.
    pub food_used: u32,
    /// Supply available.
    pub food_cap: u32,
}

/// Spendable resources for one tick.
///
/// The game deducts costs only once it processes commands, so every step that
/// commits currency deducts it here first. Later steps in the same tick then
/// see what is really left.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Budget {
    minerals: u32,
    vespene: u32,
    food_used: u32,
    food_cap: u32,
}

impl Budget {
    /// Seeds the budget from the snapshot's resource stock.
    #[must_use]
    pub const fn from_resources(resources: Resources) -> Self {
        Self {
            minerals: resources.minerals,
            vespene: resources.vespene,
            food_used: resources.food_used,
            food_cap: resources.food_cap,
        }
    }

    /// Minerals not yet committed this tick.
    #[must_use]
    pub const fn minerals(&self) -> u32 {
        self.minerals
    }

    /// Gas not yet committed this tick.
    #[must_use]
    pub const fn vespene(&self) -> u32 {
        self.vespene
    }

    /// Supply in use including units committed this tick.
    #[must_use]
    pub const fn food_used(&self) -> u32 {
        self.food_used
    }

    /// Supply available.
    #[must_use]
    pub const fn food_cap(&self) -> u32 {
        self.food_cap
    }

    /// Whether the remaining budget covers the ability's cost.
    #[must_use]
    pub fn can_afford(&self, ability: AbilityId) -> bool {
        let cost = ability.cost();
        self.minerals >= cost.minerals
            && self.vespene >= cost.vespene
            && (cost.supply == 0 || self.food_used + cost.supply <= self.food_cap)
    }

    /// Commits the ability's cost against the budget.
    pub fn deduct(&mut self, ability: AbilityId) {
        let cost = ability.cost();
        self.minerals = self.minerals.saturating_sub(cost.minerals);
        self.vespene = self.vespene.saturating_sub(cost.vespene);
        self.food_used = self.food_used.saturating_add(cost.supply);
    }
}

/// Chat audience for a message.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ChatChannel {
    /// Every player in the game.
    Broadcast,
    /// Allies only.
    Team,
}

/// Commands the agent sends to the game client.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum Command {
    /// Orders a unit to use an ability.
    Ability {
        /// Unit receiving the order.
        unit: UnitTag,
        /// Ability to use.
        ability: AbilityId,
        /// Target of the ability.
        target: OrderTarget,
        /// Whether the order is appended to the unit's queue.
        queued: bool,
    },
    /// Sends a chat message.
    Chat {
        /// Audience of the message.
        channel: ChatChannel,
        /// Text of the message.
        message: String,
    },
}

/// Commands accumulated during a tick and flushed once at its end.
#[derive(Clone, Debug, Default)]
pub struct CommandBatch {
    commands: Vec<Command>,
}

impl CommandBatch {
    /// Creates an empty batch.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the unit's orders with a new one.
    pub fn issue(&mut self, unit: UnitTag, ability: AbilityId, target: OrderTarget) {
        self.push(Command::Ability {
            unit,
            ability,
            target,
            queued: false,
        });
    }

    /// Appends an order to the unit's queue.
    pub fn queue(&mut self, unit: UnitTag, ability: AbilityId, target: OrderTarget) {
        self.commands.push(Command::Ability {
            unit,
            ability,
            target,
            queued: true,
        });
    }

    /// Sends a chat message.
    pub fn chat(&mut self, channel: ChatChannel, message: impl Into<String>) {
        self.commands.push(Command::Chat {
            channel,
            message: message.into(),
        });
    }

    fn push(&mut self, command: Command) {
        if self.commands.contains(&command) {
            return;
        }
        self.commands.push(command);
    }

    /// Number of commands gathered so far.
    #[must_use]
    pub fn len(&self) -> usize {
        self.commands.len()
    }

    /// Whether the batch holds no commands.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    /// Iterator over the commands in issue order.
    pub fn iter(&self) -> impl Iterator<Item = &Command> {
        self.commands.iter()
    }

    /// Commands addressed to `unit`, in issue order.
    pub fn for_unit(&self, unit: UnitTag) -> impl Iterator<Item = &Command> {
        self.commands.iter().filter(move |command| {
            matches!(command, Command::Ability { unit: recipient, .. } if *recipient == unit)
        })
    }

    /// Consumes the batch, yielding the underlying commands.
    #[must_use]
    pub fn into_vec(self) -> Vec<Command> {
        self.commands
    }
}

/// Engine-side placement legality check.
///
/// The game engine has the final word on whether a structure fits at a cell;
/// this trait is the boundary through which placement search asks it.
pub trait PlacementOracle {
    /// Whether the engine accepts `ability` being used at `position`.
    fn can_place(&self, ability: AbilityId, position: Point) -> bool;
}

impl<F> PlacementOracle for F
where
    F: Fn(AbilityId, Point) -> bool,
{
    fn can_place(&self, ability: AbilityId, position: Point) -> bool {
        self(ability, position)
    }
}

/// Build durations expressed in game loops.
pub mod build_time {
    use super::LOOPS_PER_SECOND;

    /// Time to train a harvester.
    pub const WORKER: f32 = 12.0 * LOOPS_PER_SECOND;
    /// Time to construct a supply depot.
    pub const SUPPLY_DEPOT: f32 = 21.0 * LOOPS_PER_SECOND;
    /// Time to construct a town hall.
    pub const TOWN_HALL: f32 = 71.0 * LOOPS_PER_SECOND;

    /// How many times the `fast` action completes during one `slow` action.
    #[must_use]
    pub fn during(fast: f32, slow: f32) -> u32 {
        if fast <= 0.0 {
            return 0;
        }
        (slow / fast) as u32
    }
}

#[cfg(test)]
mod tests {
    use super::{
        build_time, AbilityId, Alliance, BuildingSize, Budget, CommandBatch, OrderTarget, Point,
        Resources, UnitKind, UnitSnapshot, UnitTag,
    };

    #[test]
    fn towards_moves_requested_distance() {
        let origin = Point::new(0.0, 0.0);
        let moved = origin.towards(Point::new(10.0, 0.0), 3.0);
        assert!((moved.x() - 3.0).abs() < 1e-5);
        assert!(moved.y().abs() < 1e-5);
        assert_eq!(origin.towards(origin, 5.0), origin);
    }

    #[test]
    fn centroid_of_nothing_is_none() {
        assert_eq!(Point::centroid(Vec::new()), None);
        let center = Point::centroid(vec![Point::new(0.0, 0.0), Point::new(4.0, 2.0)]);
        assert_eq!(center, Some(Point::new(2.0, 1.0)));
    }

    #[test]
    fn building_size_follows_radius_table() {
        assert_eq!(BuildingSize::from_radius(0.375), None);
        assert_eq!(BuildingSize::from_radius(1.0), None);
        assert_eq!(BuildingSize::from_radius(1.125), Some(BuildingSize::S2x2));
        assert_eq!(BuildingSize::from_radius(1.8125), Some(BuildingSize::S3x3));
        assert_eq!(BuildingSize::from_radius(2.75), Some(BuildingSize::S5x5));
        assert_eq!(BuildingSize::from_radius(3.5), None);
    }

    #[test]
    fn footprints_touch_within_one_diagonal() {
        let depot = BuildingSize::S2x2;
        let a = Point::new(10.0, 10.0);
        assert!(depot.touches(a, depot, Point::new(12.0, 10.0)));
        assert!(depot.touches(a, depot, Point::new(12.0, 12.0)));
        assert!(!depot.touches(a, depot, Point::new(13.0, 10.0)));
    }

    #[test]
    fn odd_footprints_are_centered_on_integer_points() {
        let cells = BuildingSize::S3x3.cells(Point::new(10.0, 10.0));
        let columns: Vec<i32> = cells.iter().map(|cell| cell.x()).collect();
        assert_eq!(columns.iter().min(), Some(&9));
        assert_eq!(columns.iter().max(), Some(&11));
        assert_eq!(cells, BuildingSize::S3x3.cells(Point::new(10.5, 10.5)));

        let barracks = BuildingSize::S3x3;
        let depot = BuildingSize::S2x2;
        let center = Point::new(10.0, 10.0);
        assert!(
            barracks.touches(center, depot, Point::new(13.0, 10.0)),
            "a depot flush on the right touches"
        );
        assert!(
            barracks.touches(center, depot, Point::new(8.0, 10.0)),
            "a depot flush on the left touches"
        );
        assert!(
            !barracks.touches(center, depot, Point::new(14.0, 10.0)),
            "one free column on the right keeps them apart"
        );
        assert!(
            !barracks.touches(center, depot, Point::new(7.0, 10.0)),
            "one free column on the left keeps them apart"
        );
    }

    #[test]
    fn wide_footprint_leaves_room_on_the_right() {
        let cells = BuildingSize::S5x3.cells(Point::new(10.5, 10.5));
        assert_eq!(cells.len(), 15);
        assert!(cells.iter().all(|cell| (9..14).contains(&cell.x())));
    }

    #[test]
    fn budget_deduction_blocks_overspending() {
        let mut budget = Budget::from_resources(Resources {
            minerals: 120,
            vespene: 0,
            food_used: 10,
            food_cap: 11,
        });
        assert!(budget.can_afford(AbilityId::TrainMarine));
        budget.deduct(AbilityId::TrainMarine);
        assert!(!budget.can_afford(AbilityId::TrainMarine), "supply is exhausted");
        assert!(!budget.can_afford(AbilityId::BuildSupplyDepot));
        assert_eq!(budget.minerals(), 70);
    }

    #[test]
    fn batch_drops_duplicate_orders() {
        let mut batch = CommandBatch::new();
        let target = OrderTarget::Point(Point::new(5.0, 5.0));
        batch.issue(UnitTag::new(1), AbilityId::Attack, target);
        batch.issue(UnitTag::new(1), AbilityId::Attack, target);
        batch.queue(UnitTag::new(1), AbilityId::Smart, target);
        assert_eq!(batch.len(), 2);
        assert_eq!(batch.for_unit(UnitTag::new(2)).count(), 0);
    }

    #[test]
    fn snapshot_order_queries() {
        let unit = UnitSnapshot::new(
            UnitTag::new(3),
            UnitKind::Marine,
            Alliance::Own,
            Point::new(0.0, 0.0),
        )
        .with_order(AbilityId::Attack, OrderTarget::Point(Point::new(20.0, 20.5)));
        assert!(unit.is_ordered_to_point(AbilityId::Attack, Point::new(20.0, 20.0)));
        assert!(!unit.is_ordered_to_point(AbilityId::Attack, Point::new(22.0, 20.0)));
        assert!(!unit.is_ordered_to_point(AbilityId::Move, Point::new(20.0, 20.0)));
        assert!(unit.footprint().is_none());
    }

    #[test]
    fn workers_trained_during_town_hall() {
        assert_eq!(build_time::during(build_time::WORKER, build_time::TOWN_HALL), 5);
    }

    #[test]
    fn unit_tag_survives_json() {
        let json = serde_json::to_string(&UnitTag::new(42)).expect("serialize");
        let restored: UnitTag = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(restored, UnitTag::new(42));
    }
}
