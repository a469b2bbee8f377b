//! Step types the standard strategy is assembled from.
//!
//! Each type is constructed once per strategy and keeps whatever state it
//! needs between ticks in its own fields.

use log::info;
use rand::seq::SliceRandom;
use vanguard_core::{AbilityId, BuildingSize, OrderTarget, Point, UnitKind, UnitSnapshot};
use vanguard_system_reservations::Reservations;
use vanguard_world::{query, World};

use crate::TickContext;

mod construction;
mod economy;
mod morph;
mod waves;

pub use construction::{AddOnStep, ConstructionStep, RefineryStep, SupplyDepotStep, TurretStep};
pub use economy::{MarineStep, TownHallStep, UpgradeStep};
pub use morph::{OrbitalStep, PlanetaryStep};
pub use waves::{
    AnnounceStep, DefenseWaveStep, FirstWaveStep, FullSupplyWaveStep, FULL_SUPPLY_WAVE_SIZE,
};

/// Step name with the target quantity appended, unless it is unbounded.
fn quantified(name: &str, quantity: usize) -> String {
    if quantity == 0 {
        return name.to_owned();
    }
    format!("{name} (x{quantity})")
}

/// Town halls standing on the expansion they are committed to.
fn halls_at_expansion<'a>(world: &'a World, reservations: &Reservations) -> Vec<&'a UnitSnapshot> {
    query::town_halls(world)
        .into_iter()
        .filter(|hall| reservations.is_at_expansion(world, hall))
        .collect()
}

/// Sends the nearest free worker to build `kind` near a random base.
///
/// The spot is searched around a random town hall standing on its
/// expansion. Once done, the worker goes back to the resource nearest the
/// new building and its assignment is recorded.
fn build_near_base(
    ctx: &mut TickContext<'_>,
    name: &str,
    kind: UnitKind,
    ability: AbilityId,
    size: BuildingSize,
) {
    if !ctx.budget.can_afford(ability) {
        return;
    }

    let world = ctx.world;
    let halls = halls_at_expansion(world, ctx.reservations);
    let Some(hall) = halls.choose(&mut *ctx.rng) else {
        return;
    };

    let Some(spot) = ctx
        .placement
        .find_spot(world, ctx.oracle, hall.position, size, kind, ability)
    else {
        return;
    };

    build_at(ctx, name, ability, spot, &halls);
}

/// Orders the free worker nearest `spot` to build there, then to go back to work.
fn build_at(
    ctx: &mut TickContext<'_>,
    name: &str,
    ability: AbilityId,
    spot: Point,
    halls: &[&UnitSnapshot],
) {
    let world = ctx.world;
    let Some(builder) = query::closest_to(query::idle_or_gathering_workers(world), spot) else {
        return;
    };

    ctx.out.issue(builder.tag, ability, OrderTarget::Point(spot));
    match query::closest_to(query::resources_near(world, halls), spot) {
        Some(resource) => {
            info!(
                "building {name} at {spot} and returning to {}",
                resource.position
            );
            ctx.out
                .queue(builder.tag, AbilityId::Smart, OrderTarget::Unit(resource.tag));
            if resource.has_minerals() {
                ctx.tracker.assign_mineral(builder.tag, resource.tag);
            } else {
                ctx.tracker.assign_gas(builder.tag, resource.tag);
            }
        }
        None => info!("building {name} at {spot}"),
    }
    ctx.budget.deduct(ability);
}

/// Whether any own unit of `kinds` exists.
fn owns_any(world: &World, kinds: &[UnitKind]) -> bool {
    query::own_of_kind(world, kinds).next().is_some()
}

/// Number of own units of `kinds`.
fn count(world: &World, kinds: &[UnitKind]) -> usize {
    query::own_of_kind(world, kinds).count()
}

#[cfg(test)]
mod tests {
    use super::quantified;

    #[test]
    fn unbounded_steps_keep_their_name() {
        assert_eq!(quantified("Refinery", 0), "Refinery");
        assert_eq!(quantified("Barracks", 3), "Barracks (x3)");
    }
}
