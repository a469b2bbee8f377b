use log::{info, warn};
use rand::seq::SliceRandom;
use vanguard_core::{AbilityId, OrderTarget, UnitKind, UnitSnapshot};
use vanguard_system_reservations::Role;
use vanguard_world::query;

use super::{owns_any, quantified};
use crate::{BuildStep, TickContext};

const MORPHS: [AbilityId; 2] = [
    AbilityId::MorphOrbitalCommand,
    AbilityId::MorphPlanetaryFortress,
];
const ORBITALS: [UnitKind; 2] = [UnitKind::OrbitalCommand, UnitKind::OrbitalCommandFlying];
const COMMAND_CENTERS: [UnitKind; 2] = [UnitKind::CommandCenter, UnitKind::CommandCenterFlying];

/// Reserves a command center for `role` and orders the morph once nothing
/// else occupies it.
fn morph(ctx: &mut TickContext<'_>, role: Role, ability: AbilityId) {
    let world = ctx.world;

    let tag = match ctx.reservations.reserved(world, role) {
        Some(tag) => tag,
        None => {
            let reservations = &*ctx.reservations;
            let candidates: Vec<&UnitSnapshot> =
                query::own_of_kind(world, &[UnitKind::CommandCenter])
                    .filter(|hall| {
                        hall.is_ready()
                            && reservations.is_at_expansion(world, hall)
                            && !hall.is_ordered_to_any(&MORPHS)
                            && reservations.holder_role(hall.tag).is_none()
                    })
                    .collect();
            let Some(pick) = candidates.choose(&mut *ctx.rng) else {
                return;
            };
            if let Err(error) = ctx.reservations.reserve(world, role, pick.tag) {
                warn!("cannot reserve {} for the {role} morph: {error}", pick.tag);
                return;
            }
            pick.tag
        }
    };

    let Some(reserved) = world
        .unit(tag)
        .filter(|unit| unit.is_any(&COMMAND_CENTERS))
    else {
        ctx.reservations.release(role);
        return;
    };

    let morphing = reserved.is_ordered_to(ability);
    if !reserved.orders.is_empty() && !morphing {
        ctx.out
            .issue(reserved.tag, AbilityId::CancelLast, OrderTarget::None);
        return;
    }

    if !morphing {
        info!("morphing {role} at {}", reserved.position);
        ctx.out.issue(reserved.tag, ability, OrderTarget::None);
        ctx.budget.deduct(ability);
        ctx.reservations.release(role);
    }
}

/// Morphs command centers into orbital commands until `quantity` exist.
#[derive(Clone, Debug)]
pub struct OrbitalStep {
    name: String,
    quantity: usize,
}

impl OrbitalStep {
    /// Creates a step morphing up to `quantity` orbital commands.
    #[must_use]
    pub fn new(quantity: usize) -> Self {
        Self {
            name: quantified("Orbital Command", quantity),
            quantity,
        }
    }

    fn planned(ctx: &TickContext<'_>) -> usize {
        let world = ctx.world;
        let morphing = query::own_of_kind(world, &[UnitKind::CommandCenter])
            .filter(|hall| hall.is_ordered_to(AbilityId::MorphOrbitalCommand))
            .count();
        query::own_of_kind(world, &ORBITALS).count() + morphing
    }
}

impl BuildStep for OrbitalStep {
    fn name(&self) -> &str {
        &self.name
    }

    fn predicate(&mut self, ctx: &mut TickContext<'_>) -> bool {
        let world = ctx.world;
        let has_barracks = query::own_of_kind(world, &[UnitKind::Barracks])
            .any(|barracks| barracks.is_ready() && !barracks.flying);
        if !has_barracks || !ctx.budget.can_afford(AbilityId::MorphOrbitalCommand) {
            return false;
        }

        if Self::planned(ctx) >= self.quantity {
            ctx.reservations.release(Role::Orbital);
            return false;
        }
        true
    }

    fn execute(&mut self, ctx: &mut TickContext<'_>) {
        morph(ctx, Role::Orbital, AbilityId::MorphOrbitalCommand);
    }

    fn advance(&mut self, ctx: &mut TickContext<'_>) -> bool {
        Self::planned(ctx) >= self.quantity
    }
}

/// Morphs command centers into planetary fortresses whenever affordable.
#[derive(Clone, Debug, Default)]
pub struct PlanetaryStep;

impl PlanetaryStep {
    /// Creates the step.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl BuildStep for PlanetaryStep {
    fn name(&self) -> &str {
        "Planetary Fortress"
    }

    fn predicate(&mut self, ctx: &mut TickContext<'_>) -> bool {
        let world = ctx.world;
        ctx.budget.can_afford(AbilityId::MorphPlanetaryFortress)
            && query::own_of_kind(world, &[UnitKind::CommandCenter]).any(|hall| hall.is_ready())
            && owns_any(world, &[UnitKind::EngineeringBay])
    }

    fn execute(&mut self, ctx: &mut TickContext<'_>) {
        morph(ctx, Role::Planetary, AbilityId::MorphPlanetaryFortress);
    }

    fn advance(&mut self, _: &mut TickContext<'_>) -> bool {
        true
    }
}
