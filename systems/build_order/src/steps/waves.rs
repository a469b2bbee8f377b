use log::info;
use vanguard_core::{ChatChannel, UnitSnapshot};
use vanguard_system_attack_waves::{enemy_cluster_at_home, AttackWave};
use vanguard_world::query;

use crate::{BuildStep, TickContext};

/// Marines needed before a supply-capped army leaves as one wave.
pub const FULL_SUPPLY_WAVE_SIZE: usize = 30;

/// Sends every free marine to the enemy start, once.
#[derive(Clone, Debug, Default)]
pub struct FirstWaveStep {
    launched: bool,
}

impl FirstWaveStep {
    /// Creates a step that has not launched yet.
    #[must_use]
    pub const fn new() -> Self {
        Self { launched: false }
    }
}

impl BuildStep for FirstWaveStep {
    fn name(&self) -> &str {
        "First Attack Wave"
    }

    fn predicate(&mut self, _: &mut TickContext<'_>) -> bool {
        !self.launched
    }

    fn execute(&mut self, ctx: &mut TickContext<'_>) {
        let world = ctx.world;
        let marines = ctx.waves.available_marines(world);
        if marines.is_empty() {
            return;
        }

        let target = world.locations().enemy_start();
        info!("sending {} marines to the enemy base at {target}", marines.len());
        let _ = ctx
            .waves
            .form(AttackWave::new(marines.iter().map(|marine| marine.tag), target));
        self.launched = true;
    }

    fn advance(&mut self, _: &mut TickContext<'_>) -> bool {
        true
    }
}

/// Groups the free marines into a new wave once supply is capped.
#[derive(Clone, Debug, Default)]
pub struct FullSupplyWaveStep;

impl FullSupplyWaveStep {
    /// Creates the step.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl BuildStep for FullSupplyWaveStep {
    fn name(&self) -> &str {
        "Full Supply Attack Wave"
    }

    fn predicate(&mut self, ctx: &mut TickContext<'_>) -> bool {
        let resources = ctx.world.resources();
        resources.food_used >= resources.food_cap
            && ctx.waves.available_marines(ctx.world).len() >= FULL_SUPPLY_WAVE_SIZE
    }

    fn execute(&mut self, ctx: &mut TickContext<'_>) {
        let world = ctx.world;
        let marines = ctx.waves.available_marines(world);
        let Some(center) = query::centroid(marines.iter().copied()) else {
            return;
        };

        info!("preparing a new attack wave of {} units", marines.len());
        let _ = ctx
            .waves
            .form(AttackWave::new(marines.iter().map(|marine| marine.tag), center));
    }

    fn advance(&mut self, _: &mut TickContext<'_>) -> bool {
        true
    }
}

/// Sends free marines against the enemies inside the most threatened base.
#[derive(Clone, Debug, Default)]
pub struct DefenseWaveStep;

impl DefenseWaveStep {
    /// Creates the step.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl BuildStep for DefenseWaveStep {
    fn name(&self) -> &str {
        "Defense Wave"
    }

    fn predicate(&mut self, _: &mut TickContext<'_>) -> bool {
        true
    }

    fn execute(&mut self, ctx: &mut TickContext<'_>) {
        let world = ctx.world;
        let cluster: Vec<&UnitSnapshot> =
            enemy_cluster_at_home(world, ctx.reservations, ctx.wave_config.detection_radius);
        let Some(target) = query::centroid(cluster.iter().copied()) else {
            return;
        };

        let marines = ctx.waves.available_marines(world);
        if marines.is_empty() {
            return;
        }

        info!(
            "sending {} marines against {} intruders at {target}",
            marines.len(),
            cluster.len()
        );
        let _ = ctx
            .waves
            .form(AttackWave::new(marines.iter().map(|marine| marine.tag), target));
    }

    fn advance(&mut self, _: &mut TickContext<'_>) -> bool {
        true
    }
}

/// Announces the agent's name and version in team chat, once.
#[derive(Clone, Debug)]
pub struct AnnounceStep {
    message: String,
    announced: bool,
}

impl AnnounceStep {
    /// Creates a step sending `message` on its first execution.
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            announced: false,
        }
    }
}

impl BuildStep for AnnounceStep {
    fn name(&self) -> &str {
        "Announce Version"
    }

    fn predicate(&mut self, _: &mut TickContext<'_>) -> bool {
        !self.announced
    }

    fn execute(&mut self, ctx: &mut TickContext<'_>) {
        ctx.out.chat(ChatChannel::Team, self.message.clone());
        self.announced = true;
    }

    fn advance(&mut self, _: &mut TickContext<'_>) -> bool {
        true
    }
}
