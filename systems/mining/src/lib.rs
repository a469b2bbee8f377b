#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Harvester bookkeeping and the worker economy built on top of it.
//!
//! [`AssignmentTracker`] remembers which town hall, mineral patch and gas site
//! every harvester works, so saturation can be read without re-deriving it
//! from raw orders. The functions in this crate turn those counts into
//! gather and train orders.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};
use vanguard_core::{UnitSnapshot, UnitTag};
use vanguard_system_reservations::Reservations;
use vanguard_world::{query, World};

mod economy;

pub use economy::{distribute_idle_workers, train_workers, unsaturated_resources};

/// Harvesters wanted per resource and the worker cap.
///
/// The ratios are asserted rather than derived from harvest rates, so they
/// stay configurable.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SaturationPolicy {
    /// Harvesters per mineral patch before other resources are considered.
    pub per_mineral: u32,
    /// Harvesters per refinery.
    pub per_gas: u32,
    /// Harvesters per mineral patch once every refinery is full.
    pub mineral_overflow: u32,
    /// New harvesters go to gas once `(patches * per_mineral) / (refineries * per_gas)`
    /// reaches this value, using integer division.
    pub gas_switch_threshold: u32,
    /// No harvester is trained beyond this many.
    pub max_workers: u32,
}

impl Default for SaturationPolicy {
    fn default() -> Self {
        Self {
            per_mineral: 2,
            per_gas: 3,
            mineral_overflow: 3,
            gas_switch_threshold: 2,
            max_workers: 80,
        }
    }
}

/// Which resource and town hall each harvester works.
#[derive(Clone, Debug, Default)]
pub struct AssignmentTracker {
    base_of: BTreeMap<UnitTag, UnitTag>,
    mineral_of: BTreeMap<UnitTag, UnitTag>,
    gas_of: BTreeMap<UnitTag, UnitTag>,
    last_seen: BTreeMap<UnitTag, u32>,
}

impl AssignmentTracker {
    /// Creates an empty tracker.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Re-derives assignments from the harvesters' current orders.
    ///
    /// The town hall mapping is rebuilt from scratch. Mineral and gas
    /// assignments are refreshed for every harvester targeting a resource near
    /// a town hall standing on its expansion. Harvesters that were not seen
    /// and are not gathering or returning are forgotten.
    pub fn reconcile(&mut self, world: &World, reservations: &Reservations) {
        let halls: Vec<&UnitSnapshot> = query::town_halls(world)
            .into_iter()
            .filter(|hall| reservations.is_at_expansion(world, hall))
            .collect();
        let miners = query::miners(world);

        self.forget_vanished(world);
        if halls.is_empty() || miners.is_empty() {
            return;
        }

        let game_loop = world.game_loop();
        let mut seen: BTreeSet<UnitTag> = BTreeSet::new();

        self.base_of.clear();
        for hall in &halls {
            let mut targets: Vec<UnitTag> = query::resources_near(world, &[*hall])
                .into_iter()
                .map(|resource| resource.tag)
                .collect();
            targets.push(hall.tag);

            for miner in &miners {
                let maybe_assigned = targets.iter().any(|tag| miner.targets_unit(*tag));
                let working_nearby = miner
                    .position
                    .is_closer_than(hall.sight_range, hall.position)
                    && (miner.is_gathering() || miner.is_returning());

                if maybe_assigned || working_nearby {
                    let _ = self.base_of.insert(miner.tag, hall.tag);
                    let _ = self.last_seen.insert(miner.tag, game_loop);
                    let _ = seen.insert(miner.tag);
                }
            }
        }

        for hall in &halls {
            for field in query::mineral_fields_near(world, hall) {
                for miner in miners.iter().filter(|miner| miner.targets_unit(field.tag)) {
                    self.assign_mineral(miner.tag, field.tag);
                    let _ = self.last_seen.insert(miner.tag, game_loop);
                    let _ = seen.insert(miner.tag);
                }
            }

            for refinery in query::claimed_geysers_near(world, hall) {
                for miner in miners.iter().filter(|miner| miner.targets_unit(refinery.tag)) {
                    self.assign_gas(miner.tag, refinery.tag);
                    let _ = self.last_seen.insert(miner.tag, game_loop);
                    let _ = seen.insert(miner.tag);
                }
            }
        }

        for miner in &miners {
            if seen.contains(&miner.tag) || miner.is_gathering() || miner.is_returning() {
                continue;
            }
            self.forget(miner.tag);
        }
    }

    fn forget_vanished(&mut self, world: &World) {
        let vanished: Vec<UnitTag> = self
            .last_seen
            .keys()
            .chain(self.base_of.keys())
            .chain(self.mineral_of.keys())
            .chain(self.gas_of.keys())
            .copied()
            .filter(|tag| !world.contains(*tag))
            .collect();
        for tag in vanished {
            self.forget(tag);
        }
    }

    /// Records that `worker` mines `mineral`, clearing any gas assignment.
    pub fn assign_mineral(&mut self, worker: UnitTag, mineral: UnitTag) {
        let _ = self.gas_of.remove(&worker);
        let _ = self.mineral_of.insert(worker, mineral);
    }

    /// Records that `worker` harvests `refinery`, clearing any mineral assignment.
    pub fn assign_gas(&mut self, worker: UnitTag, refinery: UnitTag) {
        let _ = self.mineral_of.remove(&worker);
        let _ = self.gas_of.insert(worker, refinery);
    }

    /// Removes `worker` from every mapping.
    pub fn forget(&mut self, worker: UnitTag) {
        let _ = self.base_of.remove(&worker);
        let _ = self.mineral_of.remove(&worker);
        let _ = self.gas_of.remove(&worker);
        let _ = self.last_seen.remove(&worker);
    }

    /// Town hall the worker occupies.
    #[must_use]
    pub fn base_of(&self, worker: UnitTag) -> Option<UnitTag> {
        self.base_of.get(&worker).copied()
    }

    /// Mineral patch the worker mines.
    #[must_use]
    pub fn mineral_of(&self, worker: UnitTag) -> Option<UnitTag> {
        self.mineral_of.get(&worker).copied()
    }

    /// Refinery the worker harvests.
    #[must_use]
    pub fn gas_of(&self, worker: UnitTag) -> Option<UnitTag> {
        self.gas_of.get(&worker).copied()
    }

    /// Game loop at which the worker was last matched to a resource or town hall.
    #[must_use]
    pub fn last_seen(&self, worker: UnitTag) -> Option<u32> {
        self.last_seen.get(&worker).copied()
    }

    /// Harvesters assigned to the mineral patch.
    #[must_use]
    pub fn mineral_saturation(&self, mineral: UnitTag) -> u32 {
        count_assigned(&self.mineral_of, mineral)
    }

    /// Harvesters assigned to the refinery.
    #[must_use]
    pub fn gas_saturation(&self, refinery: UnitTag) -> u32 {
        count_assigned(&self.gas_of, refinery)
    }

    /// Harvesters occupying the town hall.
    #[must_use]
    pub fn base_saturation(&self, hall: UnitTag) -> u32 {
        count_assigned(&self.base_of, hall)
    }
}

fn count_assigned(mapping: &BTreeMap<UnitTag, UnitTag>, resource: UnitTag) -> u32 {
    let count = mapping.values().filter(|tag| **tag == resource).count();
    u32::try_from(count).unwrap_or(u32::MAX)
}

#[cfg(test)]
mod tests {
    use super::{AssignmentTracker, SaturationPolicy};
    use vanguard_core::UnitTag;

    #[test]
    fn mineral_and_gas_assignments_are_exclusive() {
        let mut tracker = AssignmentTracker::new();
        let worker = UnitTag::new(1);
        tracker.assign_mineral(worker, UnitTag::new(10));
        tracker.assign_gas(worker, UnitTag::new(20));

        assert_eq!(tracker.mineral_of(worker), None);
        assert_eq!(tracker.gas_of(worker), Some(UnitTag::new(20)));
        assert_eq!(tracker.gas_saturation(UnitTag::new(20)), 1);

        tracker.assign_mineral(worker, UnitTag::new(10));
        assert_eq!(tracker.gas_of(worker), None);
        assert_eq!(tracker.mineral_saturation(UnitTag::new(10)), 1);
    }

    #[test]
    fn default_policy_matches_standard_ratios() {
        let policy = SaturationPolicy::default();
        assert_eq!((policy.per_mineral, policy.per_gas), (2, 3));
        assert_eq!(policy.gas_switch_threshold, 16 / 6);
    }
}
