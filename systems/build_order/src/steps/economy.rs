use log::info;
use vanguard_core::{AbilityId, Budget, OrderTarget, Point, UnitKind, UnitSnapshot, UpgradeId};
use vanguard_system_reservations::{Reservations, Role};
use vanguard_world::{query, World};

use super::{count, halls_at_expansion, quantified};
use crate::{expand, BuildStep, TickContext};

const TOWN_HALLS: [UnitKind; 5] = [
    UnitKind::CommandCenter,
    UnitKind::CommandCenterFlying,
    UnitKind::OrbitalCommand,
    UnitKind::OrbitalCommandFlying,
    UnitKind::PlanetaryFortress,
];

/// Researches one upgrade at the first free research structure.
#[derive(Clone, Debug)]
pub struct UpgradeStep {
    name: String,
    upgrade: UpgradeId,
    building: UnitKind,
}

impl UpgradeStep {
    /// Creates a step researching `upgrade` from a `building`.
    #[must_use]
    pub fn new(name: &str, upgrade: UpgradeId, building: UnitKind) -> Self {
        Self {
            name: name.to_owned(),
            upgrade,
            building,
        }
    }

    fn ability(&self) -> AbilityId {
        self.upgrade.research_ability()
    }

    fn researching(&self, world: &World) -> bool {
        let ability = self.ability();
        query::own(world).any(|unit| unit.kind == self.building && unit.is_ordered_to(ability))
    }
}

impl BuildStep for UpgradeStep {
    fn name(&self) -> &str {
        &self.name
    }

    fn predicate(&mut self, ctx: &mut TickContext<'_>) -> bool {
        ctx.budget.can_afford(self.ability())
            && !ctx.world.has_upgrade(self.upgrade)
            && !self.researching(ctx.world)
    }

    fn execute(&mut self, ctx: &mut TickContext<'_>) {
        let Some(building) = query::own(ctx.world)
            .find(|unit| unit.kind == self.building && unit.is_ready() && unit.is_idle())
        else {
            return;
        };

        info!("researching {}", self.name);
        ctx.out
            .issue(building.tag, self.ability(), OrderTarget::None);
        ctx.budget.deduct(self.ability());
    }

    fn advance(&mut self, ctx: &mut TickContext<'_>) -> bool {
        ctx.world.has_upgrade(self.upgrade) || self.researching(ctx.world)
    }
}

/// Trains marines from every free barracks, two at a time with a reactor.
#[derive(Clone, Debug, Default)]
pub struct MarineStep;

impl MarineStep {
    /// Creates the step.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

/// Point past the town hall nearest the enemy, where new marines gather.
fn rally_point(world: &World, reservations: &Reservations) -> Option<Point> {
    let enemy = world.locations().enemy_start();
    let halls = halls_at_expansion(world, reservations);
    let closest = query::closest_to(halls, enemy)?;
    Some(closest.position.towards(enemy, closest.sight_range))
}

/// Reserves the budget for the marines `barracks` can train at once.
fn marines_for(world: &World, budget: &mut Budget, barracks: &UnitSnapshot) -> u32 {
    if !budget.can_afford(AbilityId::TrainMarine) {
        return 0;
    }
    budget.deduct(AbilityId::TrainMarine);

    let has_reactor = barracks
        .add_on
        .and_then(|tag| world.unit(tag))
        .is_some_and(|add_on| add_on.kind == UnitKind::BarracksReactor);
    if !has_reactor || !budget.can_afford(AbilityId::TrainMarine) {
        return 1;
    }
    budget.deduct(AbilityId::TrainMarine);
    2
}

impl BuildStep for MarineStep {
    fn name(&self) -> &str {
        "Train Marine"
    }

    fn predicate(&mut self, ctx: &mut TickContext<'_>) -> bool {
        ctx.budget.can_afford(AbilityId::TrainMarine)
            && ctx.budget.minerals() > ctx.budget.food_used()
    }

    fn execute(&mut self, ctx: &mut TickContext<'_>) {
        let world = ctx.world;
        let reserved = ctx.reservations.reserved(world, Role::AddOn);
        let barracks: Vec<&UnitSnapshot> = query::own_of_kind(world, &[UnitKind::Barracks])
            .filter(|barracks| {
                barracks.is_ready()
                    && !barracks.flying
                    && barracks.is_idle()
                    && reserved != Some(barracks.tag)
            })
            .collect();
        if barracks.is_empty() {
            return;
        }

        let rally = rally_point(world, ctx.reservations);
        for barracks in barracks {
            let amount = marines_for(world, ctx.budget, barracks);
            if amount == 0 {
                break;
            }

            if let Some(rally) = rally {
                ctx.out
                    .issue(barracks.tag, AbilityId::RallyBuilding, OrderTarget::Point(rally));
            }
            for _ in 0..amount {
                ctx.out
                    .queue(barracks.tag, AbilityId::TrainMarine, OrderTarget::None);
            }
            info!("training {amount} marines at {}", barracks.position);
        }
    }

    fn advance(&mut self, _: &mut TickContext<'_>) -> bool {
        true
    }
}

/// Keeps expanding until `quantity` town halls exist.
///
/// A quantity of zero expands whenever the economy asks for it.
#[derive(Clone, Debug)]
pub struct TownHallStep {
    name: String,
    quantity: usize,
}

impl TownHallStep {
    /// Creates a step expanding up to `quantity` town halls.
    #[must_use]
    pub fn new(quantity: usize) -> Self {
        Self {
            name: quantified("Expand", quantity),
            quantity,
        }
    }
}

impl BuildStep for TownHallStep {
    fn name(&self) -> &str {
        &self.name
    }

    fn predicate(&mut self, ctx: &mut TickContext<'_>) -> bool {
        if !ctx.budget.can_afford(AbilityId::BuildCommandCenter) {
            return false;
        }
        self.quantity == 0 || halls_at_expansion(ctx.world, ctx.reservations).len() < self.quantity
    }

    fn execute(&mut self, ctx: &mut TickContext<'_>) {
        expand(ctx);
    }

    fn advance(&mut self, ctx: &mut TickContext<'_>) -> bool {
        self.quantity == 0 || count(ctx.world, &TOWN_HALLS) >= self.quantity
    }
}
