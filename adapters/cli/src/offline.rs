//! Scripted stand-in for the game used by dry runs.
//!
//! The client serves a fixed one-base map and applies the agent's commands in
//! the crudest way that keeps the build order moving: structures appear
//! finished where they were ordered, trained units appear next to their
//! producer, and minerals trickle in per harvester.

use log::info;
use vanguard_agent::{ClientError, GameClient};
use vanguard_core::{
    AbilityId, Alliance, Command, Order, OrderTarget, PlacementOracle, Point, Resources,
    UnitKind, UnitSnapshot, UnitTag, UpgradeId, MAX_SUPPLY,
};
use vanguard_world::{FootprintOracle, Locations, TerrainGrid, World, WorldBuilder};

const MAP_SIZE: u32 = 96;
const START: Point = Point::new(20.5, 20.5);
const NATURAL: Point = Point::new(20.5, 60.5);
const ENEMY_START: Point = Point::new(75.5, 75.5);
const ENEMY_NATURAL: Point = Point::new(75.5, 35.5);

/// Resources one harvester brings in per game loop.
const INCOME_PER_LOOP: f32 = 0.031_25;
/// Thirty minutes of game time.
const GAME_LENGTH: u32 = 40_320;

const UPGRADES: [UpgradeId; 8] = [
    UpgradeId::CombatShield,
    UpgradeId::Stimpack,
    UpgradeId::InfantryWeapons1,
    UpgradeId::InfantryWeapons2,
    UpgradeId::InfantryWeapons3,
    UpgradeId::InfantryArmor1,
    UpgradeId::InfantryArmor2,
    UpgradeId::InfantryArmor3,
];

/// Offline game serving a synthetic one-base map.
#[derive(Debug)]
pub(crate) struct OfflineClient {
    game_loop: u32,
    units: Vec<UnitSnapshot>,
    upgrades: Vec<UpgradeId>,
    minerals: f32,
    vespene: f32,
    food_used: u32,
    next_tag: u64,
    current: World,
}

impl OfflineClient {
    /// Creates a game at loop zero with one town hall and twelve harvesters.
    pub(crate) fn new() -> Self {
        let mut units = vec![
            unit(1, UnitKind::CommandCenter, Alliance::Own, START),
            unit(2, UnitKind::CommandCenter, Alliance::Enemy, ENEMY_START),
        ];
        units.extend((0..8).map(|index| {
            unit(
                10 + index,
                UnitKind::MineralField,
                Alliance::Neutral,
                Point::new(17.0 + index as f32, 28.5),
            )
            .with_minerals(1800)
        }));
        units.extend((0..6).map(|index| {
            unit(
                20 + index,
                UnitKind::MineralField,
                Alliance::Neutral,
                Point::new(17.0 + index as f32, 68.5),
            )
            .with_minerals(1800)
        }));
        for (tag, position) in [(30, Point::new(27.5, 13.5)), (31, Point::new(13.5, 13.5))] {
            units.push(
                unit(tag, UnitKind::VespeneGeyser, Alliance::Neutral, position)
                    .with_vespene(2250),
            );
        }
        units.extend((0..12).map(|index| {
            unit(100 + index, UnitKind::Scv, Alliance::Own, Point::new(22.0, 25.0)).with_order(
                AbilityId::HarvestGather,
                OrderTarget::Unit(UnitTag::new(10 + index % 8)),
            )
        }));

        let mut client = Self {
            game_loop: 0,
            units,
            upgrades: Vec::new(),
            minerals: 50.0,
            vespene: 0.0,
            food_used: 12,
            next_tag: 1000,
            current: WorldBuilder::new(TerrainGrid::open(1, 1), locations()).build(),
        };
        client.current = client.snapshot();
        client
    }

    fn snapshot(&self) -> World {
        let mut builder = WorldBuilder::new(TerrainGrid::open(MAP_SIZE, MAP_SIZE), locations())
            .game_loop(self.game_loop)
            .resources(Resources {
                minerals: self.minerals as u32,
                vespene: self.vespene as u32,
                food_used: self.food_used,
                food_cap: self.food_cap(),
            })
            .units(self.units.iter().cloned());
        for upgrade in &self.upgrades {
            builder = builder.upgrade(*upgrade);
        }
        builder.build()
    }

    fn food_cap(&self) -> u32 {
        let cap: u32 = self
            .own()
            .map(|unit| match unit.kind {
                kind if kind.is_town_hall() => 15,
                UnitKind::SupplyDepot | UnitKind::SupplyDepotLowered => 8,
                _ => 0,
            })
            .sum();
        cap.min(MAX_SUPPLY)
    }

    fn own(&self) -> impl Iterator<Item = &UnitSnapshot> {
        self.units
            .iter()
            .filter(|unit| unit.alliance == Alliance::Own)
    }

    fn spawn(&mut self, kind: UnitKind, position: Point) -> UnitTag {
        let tag = UnitTag::new(self.next_tag);
        self.next_tag += 1;
        self.units
            .push(unit(tag.get(), kind, Alliance::Own, position));
        tag
    }

    fn unit_mut(&mut self, tag: UnitTag) -> Option<&mut UnitSnapshot> {
        self.units.iter_mut().find(|unit| unit.tag == tag)
    }

    fn pay(&mut self, ability: AbilityId) {
        let cost = ability.cost();
        self.minerals = (self.minerals - cost.minerals as f32).max(0.0);
        self.vespene = (self.vespene - cost.vespene as f32).max(0.0);
        self.food_used += cost.supply;
    }

    fn apply(&mut self, unit: UnitTag, ability: AbilityId, target: OrderTarget, queued: bool) {
        let Some(actor) = self.units.iter().find(|candidate| candidate.tag == unit).cloned() else {
            return;
        };

        match ability {
            _ if ability.is_worker_build() => self.construct(ability, target),
            AbilityId::TrainScv => {
                self.pay(ability);
                let scv = self.spawn(UnitKind::Scv, actor.position.offset(0.0, 3.0));
                self.order(scv, AbilityId::HarvestGather, OrderTarget::Unit(UnitTag::new(10)), false);
            }
            AbilityId::TrainMarine => {
                self.pay(ability);
                let _ = self.spawn(UnitKind::Marine, actor.position.offset(0.0, -3.0));
            }
            AbilityId::MorphOrbitalCommand | AbilityId::MorphPlanetaryFortress => {
                self.pay(ability);
                if let Some(hall) = self.unit_mut(unit) {
                    hall.kind = if ability == AbilityId::MorphOrbitalCommand {
                        UnitKind::OrbitalCommand
                    } else {
                        UnitKind::PlanetaryFortress
                    };
                    hall.orders.clear();
                }
            }
            _ if ability.builds().is_some() => self.attach(unit, ability),
            _ if ability.is_lift_or_land() => self.relocate(unit, ability, target),
            AbilityId::RallyBuilding | AbilityId::RallyWorkers => {}
            AbilityId::CancelLast => {
                if let Some(actor) = self.unit_mut(unit) {
                    let _ = actor.orders.pop();
                }
            }
            _ => {
                if let Some(upgrade) = UPGRADES
                    .into_iter()
                    .find(|upgrade| upgrade.research_ability() == ability)
                {
                    self.pay(ability);
                    self.upgrades.push(upgrade);
                    return;
                }
                match (ability, target) {
                    (AbilityId::Smart, OrderTarget::Unit(resource)) => {
                        let resource = self.refinery_on(resource).unwrap_or(resource);
                        self.order(
                            unit,
                            AbilityId::HarvestGather,
                            OrderTarget::Unit(resource),
                            queued,
                        );
                    }
                    _ => self.order(unit, ability, target, queued),
                }
            }
        }
    }

    /// Refinery standing on the geyser `tag`, if one was built there.
    fn refinery_on(&self, tag: UnitTag) -> Option<UnitTag> {
        let geyser = self
            .units
            .iter()
            .find(|unit| unit.tag == tag && unit.kind.is_geyser())?;
        self.own()
            .find(|unit| unit.kind.is_refinery() && unit.position == geyser.position)
            .map(|refinery| refinery.tag)
    }

    fn order(&mut self, unit: UnitTag, ability: AbilityId, target: OrderTarget, queued: bool) {
        if let Some(actor) = self.unit_mut(unit) {
            if !queued {
                actor.orders.clear();
            }
            actor.orders.push(Order::new(ability, target));
        }
    }

    fn construct(&mut self, ability: AbilityId, target: OrderTarget) {
        let Some(kind) = ability.builds() else {
            return;
        };
        let position = match target {
            OrderTarget::Point(point) => point,
            OrderTarget::Unit(geyser) => match self.units.iter().find(|unit| unit.tag == geyser) {
                Some(geyser) => geyser.position,
                None => return,
            },
            OrderTarget::None => return,
        };

        self.pay(ability);
        let tag = self.spawn(kind, position);
        if kind.is_refinery() {
            if let Some(refinery) = self.unit_mut(tag) {
                refinery.vespene_contents = 2250;
            }
        }
        info!("{kind:?} finished at {position}");
    }

    fn attach(&mut self, building: UnitTag, ability: AbilityId) {
        let Some(kind) = ability.builds() else {
            return;
        };
        let Some(position) = self
            .unit_mut(building)
            .filter(|unit| unit.add_on.is_none())
            .map(|unit| unit.position)
        else {
            return;
        };

        self.pay(ability);
        let add_on = self.spawn(kind, position.offset(2.5, -0.5));
        if let Some(unit) = self.unit_mut(building) {
            unit.add_on = Some(add_on);
            unit.orders.clear();
        }
    }

    fn relocate(&mut self, hall: UnitTag, ability: AbilityId, target: OrderTarget) {
        let Some(unit) = self.unit_mut(hall) else {
            return;
        };
        match (ability, target) {
            (AbilityId::LiftCommandCenter, _) => unit.kind = UnitKind::CommandCenterFlying,
            (AbilityId::LiftOrbitalCommand, _) => unit.kind = UnitKind::OrbitalCommandFlying,
            (AbilityId::LandCommandCenter, OrderTarget::Point(point)) => {
                unit.kind = UnitKind::CommandCenter;
                unit.position = point;
            }
            (AbilityId::LandOrbitalCommand, OrderTarget::Point(point)) => {
                unit.kind = UnitKind::OrbitalCommand;
                unit.position = point;
            }
            _ => return,
        }
        unit.flying = unit.kind.profile().flying;
        unit.orders.clear();
    }

    fn harvest(&mut self, loops: u32) {
        let gathering = |unit: &&UnitSnapshot, refinery: bool| {
            unit.orders.iter().any(|order| {
                order.ability == AbilityId::HarvestGather
                    && matches!(order.target, OrderTarget::Unit(tag)
                        if self.units.iter().any(|target| target.tag == tag && target.kind.is_refinery() == refinery))
            })
        };
        let miners = self.own().filter(|unit| gathering(unit, false)).count();
        let drillers = self.own().filter(|unit| gathering(unit, true)).count();

        self.minerals += miners as f32 * loops as f32 * INCOME_PER_LOOP;
        self.vespene += drillers as f32 * loops as f32 * INCOME_PER_LOOP;
    }
}

fn unit(tag: u64, kind: UnitKind, alliance: Alliance, position: Point) -> UnitSnapshot {
    UnitSnapshot::new(UnitTag::new(tag), kind, alliance, position)
}

fn locations() -> Locations {
    Locations::new(START, ENEMY_START)
        .with_own_expansions(vec![NATURAL])
        .with_enemy_expansions(vec![ENEMY_NATURAL])
}

impl PlacementOracle for OfflineClient {
    fn can_place(&self, ability: AbilityId, position: Point) -> bool {
        FootprintOracle::new(&self.current).can_place(ability, position)
    }
}

impl GameClient for OfflineClient {
    fn observe(&mut self) -> Result<World, ClientError> {
        if self.game_loop >= GAME_LENGTH {
            return Err(ClientError::SessionEnded);
        }
        self.current = self.snapshot();
        Ok(self.current.clone())
    }

    fn submit(&mut self, commands: Vec<Command>) -> Result<(), ClientError> {
        for command in commands {
            match command {
                Command::Ability {
                    unit,
                    ability,
                    target,
                    queued,
                } => self.apply(unit, ability, target, queued),
                Command::Chat { channel, message } => info!("[{channel:?}] {message}"),
            }
        }
        Ok(())
    }

    fn step(&mut self, loops: u32) -> Result<(), ClientError> {
        self.harvest(loops);
        self.game_loop = self.game_loop.saturating_add(loops);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::OfflineClient;
    use vanguard_agent::GameClient;
    use vanguard_core::{AbilityId, Command, OrderTarget, Point, UnitKind, UnitTag};

    #[test]
    fn harvesters_bring_in_minerals() {
        let mut client = OfflineClient::new();
        let before = client.observe().map(|world| world.resources().minerals);
        client.step(100).expect("stepping never fails offline");
        let after = client.observe().map(|world| world.resources().minerals);

        assert_eq!(before, Ok(50));
        assert_eq!(after, Ok(87), "twelve harvesters gather a 32nd per loop each");
    }

    #[test]
    fn ordered_structures_appear_finished() {
        let mut client = OfflineClient::new();
        client
            .submit(vec![Command::Ability {
                unit: UnitTag::new(100),
                ability: AbilityId::BuildSupplyDepot,
                target: OrderTarget::Point(Point::new(30.0, 14.0)),
                queued: false,
            }])
            .expect("submitting never fails offline");

        let world = client.observe().expect("the game is running");
        assert!(world
            .units()
            .iter()
            .any(|unit| unit.kind == UnitKind::SupplyDepot && unit.is_ready()));
        assert_eq!(world.resources().food_cap, 23);
        assert_eq!(world.resources().minerals, 0, "the depot was paid for");
    }
}
