#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Tick driver that owns every piece of mutable agent state.
//!
//! [`Agent::tick`] turns one snapshot into one command batch. Snapshots
//! arriving before enough game loops have passed since the last processed one
//! are dropped wholesale. [`run_session`] wires an agent to a [`GameClient`].

use log::debug;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use vanguard_core::{Budget, CommandBatch, PlacementOracle};
use vanguard_system_attack_waves::{kill_changelings, AttackWaves};
use vanguard_system_build_order::{expand, Intel, Scheduler, Strategy, TickContext};
use vanguard_system_mining::{distribute_idle_workers, train_workers, AssignmentTracker};
use vanguard_system_placement::PlacementSearch;
use vanguard_system_reservations::Reservations;
use vanguard_world::World;

mod config;
mod session;

pub use config::{AgentConfig, ConfigError};
pub use session::{run_session, ClientError, GameClient, SessionSummary};

/// Decision core of the bot.
#[derive(Debug)]
pub struct Agent {
    config: AgentConfig,
    placement: PlacementSearch,
    reservations: Reservations,
    tracker: AssignmentTracker,
    waves: AttackWaves,
    intel: Intel,
    scheduler: Scheduler,
    rng: ChaCha8Rng,
    last_loop: Option<u32>,
    initialized: bool,
}

impl Agent {
    /// Creates an agent following the standard strategy.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] when the configuration is unusable.
    pub fn new(config: AgentConfig) -> Result<Self, ConfigError> {
        Self::with_strategy(config, Strategy::standard())
    }

    /// Creates an agent following `strategy`.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] when the configuration is unusable.
    pub fn with_strategy(config: AgentConfig, strategy: Strategy) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            config,
            placement: PlacementSearch::new(config.placement),
            reservations: Reservations::new(),
            tracker: AssignmentTracker::new(),
            waves: AttackWaves::new(),
            intel: Intel::new(),
            scheduler: Scheduler::new(strategy),
            rng: ChaCha8Rng::seed_from_u64(config.seed),
            last_loop: None,
            initialized: false,
        })
    }

    /// Configuration the agent runs with.
    #[must_use]
    pub const fn config(&self) -> &AgentConfig {
        &self.config
    }

    /// Role and expansion records.
    #[must_use]
    pub const fn reservations(&self) -> &Reservations {
        &self.reservations
    }

    /// Harvester assignments.
    #[must_use]
    pub const fn tracker(&self) -> &AssignmentTracker {
        &self.tracker
    }

    /// Live attack waves.
    #[must_use]
    pub const fn waves(&self) -> &AttackWaves {
        &self.waves
    }

    /// Facts latched about the opponent.
    #[must_use]
    pub const fn intel(&self) -> &Intel {
        &self.intel
    }

    /// Build step that blocked the order on the last processed tick.
    #[must_use]
    pub fn current_step(&self) -> Option<&str> {
        self.scheduler.current()
    }

    /// Game loop of the last processed snapshot.
    #[must_use]
    pub const fn last_loop(&self) -> Option<u32> {
        self.last_loop
    }

    /// Decides this tick's commands.
    ///
    /// Returns `None` when the snapshot is a repeated frame; nothing is
    /// evaluated or changed in that case.
    pub fn tick(&mut self, world: &World, oracle: &dyn PlacementOracle) -> Option<CommandBatch> {
        let game_loop = world.game_loop();
        if let Some(last) = self.last_loop {
            if game_loop < last.saturating_add(self.config.frames_per_order) {
                debug!("skipping repeated frame {game_loop}");
                return None;
            }
        }
        self.last_loop = Some(game_loop);

        if !self.initialized {
            self.reservations.initialize(world);
            self.initialized = true;
        }
        self.intel.observe(world);
        self.tracker.reconcile(world, &self.reservations);

        let mut budget = Budget::from_resources(world.resources());
        let mut out = CommandBatch::new();

        {
            let mut ctx = TickContext {
                world,
                oracle,
                placement: &self.placement,
                saturation: &self.config.saturation,
                wave_config: &self.config.waves,
                intel: &self.intel,
                reservations: &mut self.reservations,
                tracker: &mut self.tracker,
                waves: &mut self.waves,
                budget: &mut budget,
                rng: &mut self.rng,
                out: &mut out,
            };
            let _ = self.scheduler.run_tick(&mut ctx);
        }

        self.waves.handle(
            world,
            &self.reservations,
            &mut self.rng,
            &self.config.waves,
            &mut out,
        );
        kill_changelings(world, &mut out);

        train_workers(
            world,
            &self.tracker,
            &mut self.reservations,
            &self.config.saturation,
            &mut budget,
            &mut out,
        );
        expand(&mut TickContext {
            world,
            oracle,
            placement: &self.placement,
            saturation: &self.config.saturation,
            wave_config: &self.config.waves,
            intel: &self.intel,
            reservations: &mut self.reservations,
            tracker: &mut self.tracker,
            waves: &mut self.waves,
            budget: &mut budget,
            rng: &mut self.rng,
            out: &mut out,
        });

        distribute_idle_workers(world, &mut self.tracker, &self.config.saturation, &mut out);

        debug!(
            "loop {game_loop}: {} commands, {} waves",
            out.len(),
            self.waves.len()
        );
        Some(out)
    }
}
