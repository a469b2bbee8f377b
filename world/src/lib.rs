#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Per-tick world snapshot consumed by the Vanguard decision systems.
//!
//! The game client adapter assembles a [`World`] once per observation through
//! [`WorldBuilder`]. The snapshot is immutable for the duration of the tick;
//! systems read it through the accessors on [`World`] and the helpers in
//! [`query`].

use std::collections::{BTreeSet, HashMap, HashSet};

use vanguard_core::{
    AbilityId, BuildingSize, CellCoord, PlacementOracle, Point, Resources, UnitKind,
    UnitSnapshot, UnitTag, UpgradeId,
};

mod terrain;

pub use terrain::TerrainGrid;

/// Well-known map locations for both players.
#[derive(Clone, Debug, PartialEq)]
pub struct Locations {
    own_start: Point,
    own_expansions: Vec<Point>,
    enemy_start: Point,
    enemy_expansions: Vec<Point>,
}

impl Locations {
    /// Creates the location table from both start positions.
    #[must_use]
    pub fn new(own_start: Point, enemy_start: Point) -> Self {
        Self {
            own_start,
            own_expansions: Vec::new(),
            enemy_start,
            enemy_expansions: Vec::new(),
        }
    }

    /// Sets the expansion points ordered by proximity to the agent's start.
    #[must_use]
    pub fn with_own_expansions(mut self, expansions: Vec<Point>) -> Self {
        self.own_expansions = expansions;
        self
    }

    /// Sets the expansion points ordered by proximity to the enemy's start.
    #[must_use]
    pub fn with_enemy_expansions(mut self, expansions: Vec<Point>) -> Self {
        self.enemy_expansions = expansions;
        self
    }

    /// Town hall position the agent started the game at.
    #[must_use]
    pub const fn own_start(&self) -> Point {
        self.own_start
    }

    /// Expansion points closest to the agent, nearest first.
    #[must_use]
    pub fn own_expansions(&self) -> &[Point] {
        &self.own_expansions
    }

    /// Town hall position the opponent started the game at.
    #[must_use]
    pub const fn enemy_start(&self) -> Point {
        self.enemy_start
    }

    /// Expansion points closest to the opponent, nearest first.
    #[must_use]
    pub fn enemy_expansions(&self) -> &[Point] {
        &self.enemy_expansions
    }

    /// Every base location the agent may occupy: its expansions followed by its start.
    #[must_use]
    pub fn own_bases(&self) -> Vec<Point> {
        let mut bases = self.own_expansions.clone();
        bases.push(self.own_start);
        bases
    }
}

/// Immutable snapshot of everything the agent can observe during one tick.
#[derive(Clone, Debug)]
pub struct World {
    game_loop: u32,
    units: Vec<UnitSnapshot>,
    index: HashMap<UnitTag, usize>,
    resources: Resources,
    upgrades: BTreeSet<UpgradeId>,
    terrain: TerrainGrid,
    locations: Locations,
}

impl World {
    /// Game loop counter at which the snapshot was taken.
    #[must_use]
    pub const fn game_loop(&self) -> u32 {
        self.game_loop
    }

    /// Resource stock at the time of the snapshot.
    #[must_use]
    pub const fn resources(&self) -> Resources {
        self.resources
    }

    /// Whether the upgrade has finished researching.
    #[must_use]
    pub fn has_upgrade(&self, upgrade: UpgradeId) -> bool {
        self.upgrades.contains(&upgrade)
    }

    /// Terrain flags of the map.
    #[must_use]
    pub const fn terrain(&self) -> &TerrainGrid {
        &self.terrain
    }

    /// Well-known map locations.
    #[must_use]
    pub const fn locations(&self) -> &Locations {
        &self.locations
    }

    /// Every visible unit ordered by tag.
    #[must_use]
    pub fn units(&self) -> &[UnitSnapshot] {
        &self.units
    }

    /// Looks up a visible unit by tag.
    #[must_use]
    pub fn unit(&self, tag: UnitTag) -> Option<&UnitSnapshot> {
        self.index.get(&tag).and_then(|index| self.units.get(*index))
    }

    /// Whether a unit with the tag is visible in this snapshot.
    #[must_use]
    pub fn contains(&self, tag: UnitTag) -> bool {
        self.index.contains_key(&tag)
    }
}

/// Assembles a [`World`] snapshot.
#[derive(Debug)]
pub struct WorldBuilder {
    game_loop: u32,
    units: Vec<UnitSnapshot>,
    resources: Resources,
    upgrades: BTreeSet<UpgradeId>,
    terrain: TerrainGrid,
    locations: Locations,
}

impl WorldBuilder {
    /// Starts an empty snapshot over the provided map.
    #[must_use]
    pub fn new(terrain: TerrainGrid, locations: Locations) -> Self {
        Self {
            game_loop: 0,
            units: Vec::new(),
            resources: Resources::default(),
            upgrades: BTreeSet::new(),
            terrain,
            locations,
        }
    }

    /// Sets the game loop counter.
    #[must_use]
    pub fn game_loop(mut self, game_loop: u32) -> Self {
        self.game_loop = game_loop;
        self
    }

    /// Sets the resource stock.
    #[must_use]
    pub fn resources(mut self, resources: Resources) -> Self {
        self.resources = resources;
        self
    }

    /// Adds a visible unit.
    #[must_use]
    pub fn unit(mut self, unit: UnitSnapshot) -> Self {
        self.units.push(unit);
        self
    }

    /// Adds several visible units.
    #[must_use]
    pub fn units<I>(mut self, units: I) -> Self
    where
        I: IntoIterator<Item = UnitSnapshot>,
    {
        self.units.extend(units);
        self
    }

    /// Marks an upgrade as completed.
    #[must_use]
    pub fn upgrade(mut self, upgrade: UpgradeId) -> Self {
        let _ = self.upgrades.insert(upgrade);
        self
    }

    /// Freezes the snapshot. When two units share a tag the first one wins.
    #[must_use]
    pub fn build(self) -> World {
        let mut units = self.units;
        units.sort_by_key(|unit| unit.tag);
        units.dedup_by_key(|unit| unit.tag);

        let index = units
            .iter()
            .enumerate()
            .map(|(position, unit)| (unit.tag, position))
            .collect();

        World {
            game_loop: self.game_loop,
            units,
            index,
            resources: self.resources,
            upgrades: self.upgrades,
            terrain: self.terrain,
            locations: self.locations,
        }
    }
}

/// Placement legality derived from the snapshot alone.
///
/// Used when no engine is available to answer placement requests: the
/// footprint must sit on clear terrain and must not overlap any grounded
/// structure or resource.
#[derive(Clone, Copy, Debug)]
pub struct FootprintOracle<'a> {
    world: &'a World,
}

impl<'a> FootprintOracle<'a> {
    /// Creates an oracle answering for the provided snapshot.
    #[must_use]
    pub const fn new(world: &'a World) -> Self {
        Self { world }
    }

    fn occupied_cells(&self) -> HashSet<CellCoord> {
        self.world
            .units()
            .iter()
            .filter(|unit| !unit.flying)
            .filter(|unit| {
                unit.is_structure() || unit.kind.is_mineral_field() || unit.kind.is_geyser()
            })
            .filter_map(|unit| {
                BuildingSize::from_radius(unit.radius).map(|size| size.cells(unit.position))
            })
            .flatten()
            .collect()
    }
}

impl PlacementOracle for FootprintOracle<'_> {
    fn can_place(&self, ability: AbilityId, position: Point) -> bool {
        let Some(kind) = ability.builds() else {
            return false;
        };

        if kind.is_refinery() {
            return self.world.units().iter().any(|unit| {
                unit.kind.is_geyser() && unit.position.is_closer_than(0.5, position)
            });
        }

        let cells = match BuildingSize::from_radius(kind.profile().radius) {
            Some(size) => size.cells(position),
            None => BuildingSize::S2x2.cells(position.offset(2.5, -0.5)),
        };

        if !self.world.terrain().is_clear(&cells) {
            return false;
        }

        let occupied = self.occupied_cells();
        cells.iter().all(|cell| !occupied.contains(cell))
    }
}

/// Query functions that provide read-only, derived views of the snapshot.
pub mod query {
    use vanguard_core::{AbilityId, Alliance, Point, UnitKind, UnitSnapshot};

    use super::World;

    /// Units owned by the agent.
    pub fn own(world: &World) -> impl Iterator<Item = &UnitSnapshot> {
        world
            .units()
            .iter()
            .filter(|unit| unit.alliance == Alliance::Own)
    }

    /// Units owned by the opponent.
    pub fn enemies(world: &World) -> impl Iterator<Item = &UnitSnapshot> {
        world
            .units()
            .iter()
            .filter(|unit| unit.alliance == Alliance::Enemy)
    }

    /// Own units whose kind is one of `kinds`.
    pub fn own_of_kind<'a: 'k, 'k>(
        world: &'a World,
        kinds: &'k [UnitKind],
    ) -> impl Iterator<Item = &'a UnitSnapshot> + 'k {
        own(world).filter(move |unit| unit.is_any(kinds))
    }

    /// Own buildings, lifted ones included.
    pub fn structures(world: &World) -> impl Iterator<Item = &UnitSnapshot> {
        own(world).filter(|unit| unit.is_structure())
    }

    /// Own grounded structures capable of training harvesters.
    #[must_use]
    pub fn town_halls(world: &World) -> Vec<&UnitSnapshot> {
        own(world)
            .filter(|unit| unit.kind.is_town_hall() && !unit.kind.profile().flying)
            .collect()
    }

    /// Own units capable of constructing buildings.
    #[must_use]
    pub fn workers(world: &World) -> Vec<&UnitSnapshot> {
        own(world).filter(|unit| unit.kind.is_worker()).collect()
    }

    /// Own units capable of gathering resources.
    #[must_use]
    pub fn miners(world: &World) -> Vec<&UnitSnapshot> {
        own(world).filter(|unit| unit.kind.is_miner()).collect()
    }

    /// Workers free to take a construction order.
    ///
    /// Idle workers are preferred; gathering workers come next since they are
    /// not carrying anything, and returning workers are the last resort.
    #[must_use]
    pub fn idle_or_gathering_workers(world: &World) -> Vec<&UnitSnapshot> {
        let available: Vec<&UnitSnapshot> = workers(world)
            .into_iter()
            .filter(|worker| !worker.is_building())
            .collect();

        let idle: Vec<&UnitSnapshot> = available
            .iter()
            .copied()
            .filter(|worker| worker.is_idle())
            .collect();
        if !idle.is_empty() {
            return idle;
        }

        let gathering: Vec<&UnitSnapshot> = available
            .iter()
            .copied()
            .filter(|worker| worker.is_gathering())
            .collect();
        if !gathering.is_empty() {
            return gathering;
        }

        available
            .into_iter()
            .filter(|worker| worker.is_returning())
            .collect()
    }

    /// Mineral patches with minerals left within the hall's sight range.
    #[must_use]
    pub fn mineral_fields_near<'a>(world: &'a World, hall: &UnitSnapshot) -> Vec<&'a UnitSnapshot> {
        world
            .units()
            .iter()
            .filter(|unit| unit.has_minerals())
            .filter(|unit| unit.position.is_closer_than(hall.sight_range, hall.position))
            .collect()
    }

    /// Own refineries with gas left within the hall's sight range.
    #[must_use]
    pub fn claimed_geysers_near<'a>(
        world: &'a World,
        hall: &UnitSnapshot,
    ) -> Vec<&'a UnitSnapshot> {
        own(world)
            .filter(|unit| unit.kind.is_refinery() && unit.has_gas())
            .filter(|unit| unit.position.is_closer_than(hall.sight_range, hall.position))
            .collect()
    }

    /// Raw geysers with gas left within the hall's sight range.
    #[must_use]
    pub fn geysers_near<'a>(world: &'a World, hall: &UnitSnapshot) -> Vec<&'a UnitSnapshot> {
        world
            .units()
            .iter()
            .filter(|unit| unit.kind.is_geyser() && unit.has_gas())
            .filter(|unit| unit.position.is_closer_than(hall.sight_range, hall.position))
            .collect()
    }

    /// Mineral patches followed by refineries around every provided hall, without repeats.
    #[must_use]
    pub fn resources_near<'a>(world: &'a World, halls: &[&UnitSnapshot]) -> Vec<&'a UnitSnapshot> {
        let mut minerals: Vec<&UnitSnapshot> = Vec::new();
        let mut refineries: Vec<&UnitSnapshot> = Vec::new();
        for hall in halls {
            minerals.extend(mineral_fields_near(world, hall));
            refineries.extend(claimed_geysers_near(world, hall));
        }
        minerals.extend(refineries);

        let mut seen = std::collections::HashSet::new();
        minerals.retain(|unit| seen.insert(unit.tag));
        minerals
    }

    /// Unit nearest to `point`; ties go to the smallest tag.
    #[must_use]
    pub fn closest_to<'a, I>(units: I, point: Point) -> Option<&'a UnitSnapshot>
    where
        I: IntoIterator<Item = &'a UnitSnapshot>,
    {
        units.into_iter().min_by(|a, b| {
            a.position
                .distance_squared(point)
                .total_cmp(&b.position.distance_squared(point))
                .then(a.tag.cmp(&b.tag))
        })
    }

    /// Mean position of the provided units.
    #[must_use]
    pub fn centroid<'a, I>(units: I) -> Option<Point>
    where
        I: IntoIterator<Item = &'a UnitSnapshot>,
    {
        Point::centroid(units.into_iter().map(|unit| unit.position))
    }

    /// Enemy combat units that fly.
    #[must_use]
    pub fn enemy_air_army(world: &World) -> Vec<&UnitSnapshot> {
        enemies(world)
            .filter(|unit| unit.kind.is_army() && unit.flying)
            .collect()
    }

    /// Enemies closer than `distance` to `point`.
    pub fn enemies_near(
        world: &World,
        point: Point,
        distance: f32,
    ) -> impl Iterator<Item = &UnitSnapshot> {
        enemies(world).filter(move |unit| unit.position.is_closer_than(distance, point))
    }

    /// Buildings of `kinds` that exist or that a worker is about to start with `ability`.
    ///
    /// Workers keep their build order while constructing, so structures still
    /// under construction are only counted once.
    #[must_use]
    pub fn construction_count(world: &World, kinds: &[UnitKind], ability: AbilityId) -> usize {
        let buildings: Vec<&UnitSnapshot> = own_of_kind(world, kinds).collect();
        let in_progress = buildings
            .iter()
            .filter(|building| building.is_in_progress())
            .count();
        let ordered = workers(world)
            .into_iter()
            .filter(|worker| worker.is_ordered_to(ability))
            .count();

        (buildings.len() - in_progress) + ordered.max(in_progress)
    }
}
