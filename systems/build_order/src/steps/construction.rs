use std::collections::BTreeSet;

use log::{info, warn};
use rand::seq::SliceRandom;
use vanguard_core::{
    build_time, AbilityId, BuildingSize, OrderTarget, Point, UnitKind, UnitSnapshot, UnitTag,
    MAX_SUPPLY, RESOURCE_SPREAD_DISTANCE,
};
use vanguard_system_reservations::Role;
use vanguard_world::{query, World};

use super::{build_at, build_near_base, count, halls_at_expansion, owns_any, quantified};
use crate::{BuildStep, TickContext};

/// Range within which a missile turret covers minerals and structures.
const TURRET_RANGE: f32 = 7.0;

const REFINERIES: [UnitKind; 2] = [UnitKind::Refinery, UnitKind::RefineryRich];
const DEPOTS: [UnitKind; 2] = [UnitKind::SupplyDepot, UnitKind::SupplyDepotLowered];

/// Builds structures of one kind until `quantity` exist or are on their way.
#[derive(Clone, Debug)]
pub struct ConstructionStep {
    name: String,
    kind: UnitKind,
    ability: AbilityId,
    quantity: usize,
    requirements: Vec<UnitKind>,
}

impl ConstructionStep {
    /// Creates a step building `quantity` structures of `kind` once every
    /// kind in `requirements` is owned.
    #[must_use]
    pub fn new(
        name: &str,
        kind: UnitKind,
        ability: AbilityId,
        quantity: usize,
        requirements: &[UnitKind],
    ) -> Self {
        Self {
            name: quantified(name, quantity),
            kind,
            ability,
            quantity,
            requirements: requirements.to_vec(),
        }
    }

    fn planned(&self, world: &World) -> usize {
        query::construction_count(world, &[self.kind], self.ability)
    }
}

impl BuildStep for ConstructionStep {
    fn name(&self) -> &str {
        &self.name
    }

    fn predicate(&mut self, ctx: &mut TickContext<'_>) -> bool {
        self.requirements
            .iter()
            .all(|requirement| owns_any(ctx.world, &[*requirement]))
            && ctx.budget.can_afford(self.ability)
            && self.planned(ctx.world) < self.quantity
    }

    fn execute(&mut self, ctx: &mut TickContext<'_>) {
        // Room for an add-on is kept free next to every building.
        build_near_base(ctx, &self.name, self.kind, self.ability, BuildingSize::S5x3);
    }

    fn advance(&mut self, ctx: &mut TickContext<'_>) -> bool {
        self.planned(ctx.world) >= self.quantity
    }
}

/// Attaches add-ons to production structures until `quantity` exist.
///
/// One structure at a time is reserved for the add-on. Anything else it is
/// doing is cancelled first, and the reservation is dropped once the add-on
/// is ordered or the structure stops qualifying.
#[derive(Clone, Debug)]
pub struct AddOnStep {
    name: String,
    building: UnitKind,
    add_on: UnitKind,
    ability: AbilityId,
    quantity: usize,
}

impl AddOnStep {
    /// Creates a step attaching `quantity` add-ons of kind `add_on` to `building`s.
    #[must_use]
    pub fn new(
        name: &str,
        building: UnitKind,
        add_on: UnitKind,
        ability: AbilityId,
        quantity: usize,
    ) -> Self {
        Self {
            name: quantified(name, quantity),
            building,
            add_on,
            ability,
            quantity,
        }
    }

    fn candidates<'a>(&self, world: &'a World) -> Vec<&'a UnitSnapshot> {
        query::own_of_kind(world, &[self.building])
            .filter(|building| building.is_ready() && !building.flying && building.add_on.is_none())
            .collect()
    }
}

impl BuildStep for AddOnStep {
    fn name(&self) -> &str {
        &self.name
    }

    fn predicate(&mut self, ctx: &mut TickContext<'_>) -> bool {
        !self.candidates(ctx.world).is_empty()
            && ctx.budget.can_afford(self.ability)
            && count(ctx.world, &[self.add_on]) < self.quantity
    }

    fn execute(&mut self, ctx: &mut TickContext<'_>) {
        let world = ctx.world;
        let candidates = self.candidates(world);
        if candidates.is_empty() {
            return;
        }

        let tag = match ctx.reservations.reserved(world, Role::AddOn) {
            Some(tag) => tag,
            None => {
                let Some(pick) = candidates.choose(&mut *ctx.rng) else {
                    return;
                };
                if let Err(error) = ctx.reservations.reserve(world, Role::AddOn, pick.tag) {
                    warn!("cannot reserve {} for an add-on: {error}", pick.tag);
                    return;
                }
                pick.tag
            }
        };

        let Some(reserved) = world
            .unit(tag)
            .filter(|unit| unit.kind == self.building && unit.add_on.is_none())
        else {
            ctx.reservations.release(Role::AddOn);
            return;
        };

        if !reserved.orders.is_empty() && !reserved.is_ordered_to(self.ability) {
            ctx.out
                .issue(reserved.tag, AbilityId::CancelLast, OrderTarget::None);
            return;
        }

        info!("building {} at {}", self.name, reserved.position);
        ctx.out.issue(reserved.tag, self.ability, OrderTarget::None);

        // The engine refuses the add-on when the cells next to the building
        // are taken, so a spot that fits one is queued as a fallback.
        if let Some(elsewhere) = ctx.placement.find_spot(
            world,
            ctx.oracle,
            reserved.position,
            BuildingSize::S5x3,
            self.add_on,
            self.ability,
        ) {
            ctx.out
                .queue(reserved.tag, self.ability, OrderTarget::Point(elsewhere));
        }

        ctx.budget.deduct(self.ability);
        ctx.reservations.release(Role::AddOn);
    }

    fn advance(&mut self, ctx: &mut TickContext<'_>) -> bool {
        count(ctx.world, &[self.add_on]) >= self.quantity
    }
}

/// Claims gas geysers near the town halls.
///
/// A quantity of zero keeps claiming every free geyser without ever
/// blocking the build order.
#[derive(Clone, Debug)]
pub struct RefineryStep {
    name: String,
    quantity: usize,
}

impl RefineryStep {
    /// Creates a step claiming geysers until `quantity` refineries are planned.
    #[must_use]
    pub fn new(quantity: usize) -> Self {
        Self {
            name: quantified("Refinery", quantity),
            quantity,
        }
    }

    fn planned(world: &World) -> usize {
        query::construction_count(world, &REFINERIES, AbilityId::BuildRefinery)
    }
}

impl BuildStep for RefineryStep {
    fn name(&self) -> &str {
        &self.name
    }

    fn predicate(&mut self, ctx: &mut TickContext<'_>) -> bool {
        if !ctx.budget.can_afford(AbilityId::BuildRefinery) {
            return false;
        }
        self.quantity == 0 || Self::planned(ctx.world) < self.quantity
    }

    fn execute(&mut self, ctx: &mut TickContext<'_>) {
        let world = ctx.world;
        let halls = query::town_halls(world);
        if halls.is_empty() {
            return;
        }

        let mut seen: BTreeSet<UnitTag> = BTreeSet::new();
        let mut geysers: Vec<&UnitSnapshot> = Vec::new();
        let mut claimed: Vec<&UnitSnapshot> = Vec::new();
        for hall in &halls {
            geysers.extend(
                query::geysers_near(world, hall)
                    .into_iter()
                    .filter(|geyser| seen.insert(geyser.tag)),
            );
            claimed.extend(query::claimed_geysers_near(world, hall));
        }

        let ordered: Vec<&UnitSnapshot> = query::workers(world)
            .into_iter()
            .filter(|worker| worker.is_ordered_to(AbilityId::BuildRefinery))
            .collect();
        let unplanned: Vec<&UnitSnapshot> = geysers
            .into_iter()
            .filter(|geyser| {
                !claimed
                    .iter()
                    .any(|refinery| refinery.position.is_closer_than(1.0, geyser.position))
            })
            .filter(|geyser| {
                !ordered
                    .iter()
                    .any(|worker| worker.is_ordered_to_unit(AbilityId::BuildRefinery, geyser.tag))
            })
            .collect();

        let Some(geyser) = unplanned.choose(&mut *ctx.rng) else {
            return;
        };
        let Some(worker) =
            query::closest_to(query::idle_or_gathering_workers(world), geyser.position)
        else {
            return;
        };

        info!("building refinery at {}", geyser.position);
        ctx.out.issue(
            worker.tag,
            AbilityId::BuildRefinery,
            OrderTarget::Unit(geyser.tag),
        );
        ctx.out
            .queue(worker.tag, AbilityId::Smart, OrderTarget::Unit(geyser.tag));
        ctx.budget.deduct(AbilityId::BuildRefinery);
        ctx.tracker.assign_gas(worker.tag, geyser.tag);
    }

    fn advance(&mut self, ctx: &mut TickContext<'_>) -> bool {
        self.quantity == 0 || Self::planned(ctx.world) >= self.quantity
    }
}

/// Builds a supply depot when free supply would run out during its construction.
#[derive(Clone, Debug, Default)]
pub struct SupplyDepotStep;

impl SupplyDepotStep {
    /// Creates the step.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Supply consumed by the producers while one depot is built.
    fn usage_during_depot(world: &World) -> Option<u32> {
        let producers = query::town_halls(world).len()
            + query::structures(world)
                .filter(|structure| structure.kind.is_production())
                .count();
        if producers == 0 {
            return None;
        }

        let per_unit = build_time::WORKER / producers as f32;
        Some((build_time::SUPPLY_DEPOT / per_unit).ceil() as u32)
    }
}

impl BuildStep for SupplyDepotStep {
    fn name(&self) -> &str {
        "Supply Depot"
    }

    fn predicate(&mut self, ctx: &mut TickContext<'_>) -> bool {
        if !ctx.budget.can_afford(AbilityId::BuildSupplyDepot) {
            return false;
        }

        let world = ctx.world;
        let resources = world.resources();
        if resources.food_cap >= MAX_SUPPLY {
            return false;
        }

        let Some(usage) = Self::usage_during_depot(world) else {
            return false;
        };
        let supply_left = resources.food_cap.saturating_sub(resources.food_used);

        let ordered = query::workers(world)
            .into_iter()
            .any(|worker| worker.is_ordered_to(AbilityId::BuildSupplyDepot));
        let in_progress = query::own_of_kind(world, &DEPOTS).any(|depot| depot.is_in_progress());

        supply_left <= usage && !ordered && !in_progress
    }

    fn execute(&mut self, ctx: &mut TickContext<'_>) {
        build_near_base(
            ctx,
            "supply depot",
            UnitKind::SupplyDepot,
            AbilityId::BuildSupplyDepot,
            BuildingSize::S2x2,
        );
    }

    fn advance(&mut self, ctx: &mut TickContext<'_>) -> bool {
        let world = ctx.world;
        owns_any(world, &DEPOTS)
            || query::workers(world)
                .into_iter()
                .any(|worker| worker.is_ordered_to(AbilityId::BuildSupplyDepot))
    }
}

/// Covers mineral lines with missile turrets, then every structure once
/// enemy air units have been seen.
#[derive(Clone, Debug, Default)]
pub struct TurretStep;

impl TurretStep {
    /// Creates the step.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    fn build(ctx: &mut TickContext<'_>, anchor: Point, halls: &[&UnitSnapshot]) -> bool {
        let Some(spot) = ctx.placement.find_spot(
            ctx.world,
            ctx.oracle,
            anchor,
            BuildingSize::S2x2,
            UnitKind::MissileTurret,
            AbilityId::BuildMissileTurret,
        ) else {
            return false;
        };
        if query::idle_or_gathering_workers(ctx.world).is_empty() {
            return false;
        }

        build_at(ctx, "missile turret", AbilityId::BuildMissileTurret, spot, halls);
        true
    }
}

fn is_covered(point: Point, turrets: &[&UnitSnapshot]) -> bool {
    turrets
        .iter()
        .any(|turret| point.is_closer_than(TURRET_RANGE, turret.position))
}

impl BuildStep for TurretStep {
    fn name(&self) -> &str {
        "Missile Turret"
    }

    fn predicate(&mut self, ctx: &mut TickContext<'_>) -> bool {
        let world = ctx.world;
        let has_bay = query::own_of_kind(world, &[UnitKind::EngineeringBay])
            .any(|bay| bay.is_ready());
        // Wait until the previous turret is started.
        let pending = query::own(world).any(|unit| unit.is_ordered_to(AbilityId::BuildMissileTurret));

        has_bay && !pending && ctx.budget.can_afford(AbilityId::BuildMissileTurret)
    }

    fn execute(&mut self, ctx: &mut TickContext<'_>) {
        let world = ctx.world;
        let turrets: Vec<&UnitSnapshot> =
            query::own_of_kind(world, &[UnitKind::MissileTurret]).collect();
        let halls = halls_at_expansion(world, ctx.reservations);
        if halls.is_empty() {
            return;
        }

        for hall in &halls {
            let exposed = world.units().iter().filter(|unit| {
                unit.has_minerals()
                    && unit
                        .position
                        .is_closer_than(RESOURCE_SPREAD_DISTANCE, hall.position)
                    && !is_covered(unit.position, &turrets)
            });
            let Some(center) = query::centroid(exposed) else {
                continue;
            };
            if Self::build(ctx, center, &halls) {
                return;
            }
        }

        if !ctx.intel.enemy_air_detected() || turrets.is_empty() {
            return;
        }

        let exposed: Vec<&UnitSnapshot> = query::structures(world)
            .filter(|structure| !is_covered(structure.position, &turrets))
            .collect();
        let Some(pick) = exposed.choose(&mut *ctx.rng) else {
            return;
        };
        let nearby = exposed
            .iter()
            .copied()
            .filter(|structure| structure.position.is_closer_than(TURRET_RANGE, pick.position));
        let Some(center) = query::centroid(nearby) else {
            return;
        };
        let _ = Self::build(ctx, center, &halls);
    }

    fn advance(&mut self, _: &mut TickContext<'_>) -> bool {
        true
    }
}
