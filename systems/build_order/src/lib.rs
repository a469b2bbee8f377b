#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Gated sequential build order.
//!
//! A [`Strategy`] is an ordered list of [`BuildStep`]s. Every tick the
//! [`Scheduler`] walks the list from the top: a step whose predicate holds is
//! executed, and the walk stops at the first step that does not let the
//! order advance. Early steps are therefore re-checked every tick while later
//! ones are only reached once everything before them is far enough along.

use std::fmt;

use log::info;
use rand::RngCore;
use vanguard_core::{Budget, CommandBatch, PlacementOracle};
use vanguard_system_attack_waves::{AttackWaves, WaveConfig};
use vanguard_system_mining::{AssignmentTracker, SaturationPolicy};
use vanguard_system_placement::PlacementSearch;
use vanguard_system_reservations::Reservations;
use vanguard_world::World;

mod expansion;
mod intel;
pub mod steps;
mod strategy;

pub use expansion::{
    expand, expansion_locations, free_town_halls, should_expand, FLYING_TOWN_HALL_SPEED,
    WORKER_SPEED,
};
pub use intel::Intel;
pub use strategy::Strategy;

/// Everything a build step may read or change during one tick.
///
/// The snapshot and the tunables are shared; the reservation records, the
/// harvester assignments, the waves, the budget and the command batch are
/// lent mutably for the duration of the tick.
pub struct TickContext<'a> {
    /// Snapshot of the current tick.
    pub world: &'a World,
    /// Engine-side placement legality check.
    pub oracle: &'a dyn PlacementOracle,
    /// Placement search used by construction steps.
    pub placement: &'a PlacementSearch,
    /// Harvester targets used when deciding whether to expand.
    pub saturation: &'a SaturationPolicy,
    /// Distances used when looking for enemies at home.
    pub wave_config: &'a WaveConfig,
    /// Facts latched from earlier ticks.
    pub intel: &'a Intel,
    /// Role and expansion records.
    pub reservations: &'a mut Reservations,
    /// Harvester assignments.
    pub tracker: &'a mut AssignmentTracker,
    /// Live attack waves.
    pub waves: &'a mut AttackWaves,
    /// Currency not yet committed this tick.
    pub budget: &'a mut Budget,
    /// Source of every random pick.
    pub rng: &'a mut dyn RngCore,
    /// Commands gathered this tick.
    pub out: &'a mut CommandBatch,
}

/// One entry of a build order.
pub trait BuildStep {
    /// Human-readable name reported while the step blocks the order.
    fn name(&self) -> &str;

    /// Whether [`BuildStep::execute`] should run this tick.
    fn predicate(&mut self, ctx: &mut TickContext<'_>) -> bool;

    /// Issues the step's commands. Does nothing when the step cannot act.
    fn execute(&mut self, ctx: &mut TickContext<'_>);

    /// Whether the scheduler may move on to the next step.
    fn advance(&mut self, ctx: &mut TickContext<'_>) -> bool;
}

/// Runs a strategy one tick at a time.
#[derive(Debug)]
pub struct Scheduler {
    strategy: Strategy,
    current: Option<String>,
}

impl Scheduler {
    /// Creates a scheduler for the provided strategy.
    #[must_use]
    pub fn new(strategy: Strategy) -> Self {
        Self {
            strategy,
            current: None,
        }
    }

    /// Strategy being followed.
    #[must_use]
    pub fn strategy(&self) -> &Strategy {
        &self.strategy
    }

    /// Step that blocked the order on the last tick.
    #[must_use]
    pub fn current(&self) -> Option<&str> {
        self.current.as_deref()
    }

    /// Walks the build order once and returns the step it stopped at.
    ///
    /// Returns `None` when every step let the order advance.
    pub fn run_tick(&mut self, ctx: &mut TickContext<'_>) -> Option<&str> {
        let mut blocked: Option<String> = None;

        for step in self.strategy.steps_mut() {
            if step.predicate(ctx) {
                step.execute(ctx);
            }

            if !step.advance(ctx) {
                blocked = Some(step.name().to_owned());
                break;
            }
        }

        if blocked != self.current {
            if let Some(name) = &blocked {
                info!("current build step: {name}");
            }
        }
        self.current = blocked;
        self.current.as_deref()
    }
}

impl fmt::Debug for dyn BuildStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("BuildStep").field(&self.name()).finish()
    }
}
