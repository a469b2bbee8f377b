use log::info;
use vanguard_world::{query, World};

/// Facts about the opponent that stay true once observed.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Intel {
    enemy_air_detected: bool,
}

impl Intel {
    /// Creates an empty record.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            enemy_air_detected: false,
        }
    }

    /// Latches whatever the snapshot reveals.
    pub fn observe(&mut self, world: &World) {
        if self.enemy_air_detected {
            return;
        }

        if let Some(flyer) = query::enemy_air_army(world).first() {
            info!("enemy air units spotted at {}", flyer.position);
            self.enemy_air_detected = true;
        }
    }

    /// Whether a flying enemy combat unit has ever been seen.
    #[must_use]
    pub const fn enemy_air_detected(&self) -> bool {
        self.enemy_air_detected
    }
}
