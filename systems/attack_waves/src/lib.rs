#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Attack-wave controller that drives groups of combat units toward a target.
//!
//! Every live wave runs trim, recenter, advance and retarget once per tick.
//! Waves are formed by build steps from units not already claimed by another
//! wave, so a unit belongs to at most one wave at a time.

use std::collections::BTreeSet;

use log::{debug, info};
use rand::{seq::SliceRandom, RngCore};
use serde::{Deserialize, Serialize};
use vanguard_core::{
    AbilityId, CommandBatch, OrderTarget, Point, UnitKind, UnitSnapshot, UnitTag,
    DETECTION_RADIUS,
};
use vanguard_system_reservations::Reservations;
use vanguard_world::{query, World};

mod threat;

pub use threat::{cluster_by_sight, enemies_in_bases, enemy_cluster_at_home, most_threatened_base};

/// Distances steering every wave.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WaveConfig {
    /// Radius around the centroid that members are expected to stay in, and the
    /// distance to the target under which the wave looks for a new one.
    pub detection_radius: f32,
    /// Share of the wave allowed outside the detection radius before the
    /// stragglers are pulled back.
    pub dispersion_tolerance: f32,
}

impl Default for WaveConfig {
    fn default() -> Self {
        Self {
            detection_radius: DETECTION_RADIUS,
            dispersion_tolerance: 0.2,
        }
    }
}

/// Group of combat units sharing one target.
#[derive(Clone, Debug, PartialEq)]
pub struct AttackWave {
    members: BTreeSet<UnitTag>,
    target: Point,
}

impl AttackWave {
    /// Creates a wave of `members` heading to `target`.
    #[must_use]
    pub fn new<I>(members: I, target: Point) -> Self
    where
        I: IntoIterator<Item = UnitTag>,
    {
        Self {
            members: members.into_iter().collect(),
            target,
        }
    }

    /// Tags of the members, including ones not trimmed yet.
    #[must_use]
    pub fn members(&self) -> &BTreeSet<UnitTag> {
        &self.members
    }

    /// Point the wave attacks toward.
    #[must_use]
    pub const fn target(&self) -> Point {
        self.target
    }

    /// Members alive in `world`.
    #[must_use]
    pub fn units<'a>(&self, world: &'a World) -> Vec<&'a UnitSnapshot> {
        self.members
            .iter()
            .filter_map(|tag| world.unit(*tag))
            .collect()
    }

    /// Drops members missing from `world`. Returns `false` once nobody is left.
    pub fn trim(&mut self, world: &World) -> bool {
        self.members.retain(|tag| world.contains(*tag));
        !self.members.is_empty()
    }

    /// Pulls stragglers back toward the centroid.
    ///
    /// Members farther than the detection radius from the centroid are
    /// dispersed. When they outnumber the tolerated share, each one is moved
    /// to a point one step from the centroid toward the target. Returns the
    /// members that were pulled back; they skip this tick's advance.
    pub fn recenter(
        &self,
        world: &World,
        config: &WaveConfig,
        out: &mut CommandBatch,
    ) -> BTreeSet<UnitTag> {
        let units = self.units(world);
        let Some(center) = query::centroid(units.iter().copied()) else {
            return BTreeSet::new();
        };

        let dispersed: Vec<&UnitSnapshot> = units
            .iter()
            .copied()
            .filter(|unit| !unit.position.is_closer_than(config.detection_radius, center))
            .collect();
        let tolerated = config.dispersion_tolerance * units.len() as f32;
        if dispersed.is_empty() || dispersed.len() as f32 <= tolerated {
            return BTreeSet::new();
        }

        let rally = center.towards(self.target, 1.0);
        info!(
            "regrouping {} of {} units at {rally}",
            dispersed.len(),
            units.len()
        );
        for unit in &dispersed {
            if !unit.is_ordered_to_point(AbilityId::Move, rally) {
                out.issue(unit.tag, AbilityId::Move, OrderTarget::Point(rally));
            }
        }

        dispersed.into_iter().map(|unit| unit.tag).collect()
    }

    /// Attack-moves every member not in `skip` toward the target.
    ///
    /// Members already attacking the target are left alone.
    pub fn advance(&self, world: &World, skip: &BTreeSet<UnitTag>, out: &mut CommandBatch) {
        for unit in self.units(world) {
            if skip.contains(&unit.tag) || unit.is_ordered_to_point(AbilityId::Attack, self.target)
            {
                continue;
            }
            out.issue(unit.tag, AbilityId::Attack, OrderTarget::Point(self.target));
        }
    }

    /// Picks a new target once the wave has reached the current one.
    ///
    /// The enemy cluster at the most threatened base comes first, then the
    /// nearest enemy structure, then the nearest other enemy, then a random
    /// known enemy expansion.
    pub fn retarget(
        &mut self,
        world: &World,
        reservations: &Reservations,
        rng: &mut dyn RngCore,
        config: &WaveConfig,
    ) {
        let Some(center) = query::centroid(self.units(world)) else {
            return;
        };
        if center.distance(self.target) > config.detection_radius {
            return;
        }

        let target = next_target(world, reservations, rng, config, center);
        if target.distance(self.target) > config.detection_radius {
            info!("wave at {center} retargets from {} to {target}", self.target);
        }
        self.target = target;
    }
}

fn next_target(
    world: &World,
    reservations: &Reservations,
    rng: &mut dyn RngCore,
    config: &WaveConfig,
    center: Point,
) -> Point {
    let home = enemy_cluster_at_home(world, reservations, config.detection_radius);
    if let Some(cluster) = query::centroid(home) {
        return cluster;
    }

    let structures = query::enemies(world).filter(|enemy| enemy.is_structure());
    if let Some(structure) = query::closest_to(structures, center) {
        return structure.position;
    }

    let units = query::enemies(world).filter(|enemy| !enemy.is_structure());
    if let Some(unit) = query::closest_to(units, center) {
        return unit.position;
    }

    let locations = world.locations();
    locations
        .enemy_expansions()
        .choose(rng)
        .copied()
        .unwrap_or_else(|| locations.enemy_start())
}

/// Orders every ready marine to shoot the closest enemy changeling within its
/// sight range, wave members included.
pub fn kill_changelings(world: &World, out: &mut CommandBatch) {
    let changelings: Vec<&UnitSnapshot> = query::enemies(world)
        .filter(|enemy| enemy.kind == UnitKind::Changeling)
        .collect();
    if changelings.is_empty() {
        return;
    }

    for marine in query::own_of_kind(world, &[UnitKind::Marine]).filter(|unit| unit.is_ready()) {
        let in_sight = changelings
            .iter()
            .copied()
            .filter(|changeling| {
                changeling
                    .position
                    .is_closer_than(marine.sight_range, marine.position)
            });
        if let Some(changeling) = query::closest_to(in_sight, marine.position) {
            debug!("marine {} shoots changeling {}", marine.tag, changeling.tag);
            out.issue(marine.tag, AbilityId::Attack, OrderTarget::Unit(changeling.tag));
        }
    }
}

/// Every live wave.
#[derive(Clone, Debug, Default)]
pub struct AttackWaves {
    waves: Vec<AttackWave>,
}

impl AttackWaves {
    /// Creates an empty collection.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a wave. Members already claimed by another wave are left out.
    ///
    /// Returns `false` when nothing is left to form the wave from.
    pub fn form(&mut self, wave: AttackWave) -> bool {
        let claimed = self.claimed();
        let members: BTreeSet<UnitTag> = wave
            .members
            .into_iter()
            .filter(|tag| !claimed.contains(tag))
            .collect();
        if members.is_empty() {
            return false;
        }

        debug!("forming a wave of {} units heading to {}", members.len(), wave.target);
        self.waves.push(AttackWave {
            members,
            target: wave.target,
        });
        true
    }

    /// Number of live waves.
    #[must_use]
    pub fn len(&self) -> usize {
        self.waves.len()
    }

    /// Reports whether no wave is live.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.waves.is_empty()
    }

    /// Live waves in formation order.
    pub fn iter(&self) -> impl Iterator<Item = &AttackWave> {
        self.waves.iter()
    }

    /// Tags of every unit belonging to a wave.
    #[must_use]
    pub fn claimed(&self) -> BTreeSet<UnitTag> {
        self.waves
            .iter()
            .flat_map(|wave| wave.members.iter().copied())
            .collect()
    }

    /// Members of every wave alive in `world`.
    #[must_use]
    pub fn units<'a>(&self, world: &'a World) -> Vec<&'a UnitSnapshot> {
        self.waves
            .iter()
            .flat_map(|wave| wave.units(world))
            .collect()
    }

    /// Ready marines that no wave has claimed.
    #[must_use]
    pub fn available_marines<'a>(&self, world: &'a World) -> Vec<&'a UnitSnapshot> {
        let claimed = self.claimed();
        query::own_of_kind(world, &[UnitKind::Marine])
            .filter(|marine| marine.is_ready() && !claimed.contains(&marine.tag))
            .collect()
    }

    /// Runs every wave for one tick and disbands the ones left without members.
    pub fn handle(
        &mut self,
        world: &World,
        reservations: &Reservations,
        rng: &mut dyn RngCore,
        config: &WaveConfig,
        out: &mut CommandBatch,
    ) {
        self.waves.retain_mut(|wave| {
            if !wave.trim(world) {
                info!("wave heading to {} was wiped out", wave.target);
                return false;
            }

            let regrouping = wave.recenter(world, config, out);
            wave.advance(world, &regrouping, out);
            wave.retarget(world, reservations, rng, config);
            true
        });
    }
}

#[cfg(test)]
mod tests {
    use super::{AttackWave, AttackWaves};
    use vanguard_core::{Point, UnitTag};

    #[test]
    fn forming_skips_claimed_units() {
        let mut waves = AttackWaves::new();
        let first = AttackWave::new([UnitTag::new(1), UnitTag::new(2)], Point::new(5.0, 5.0));
        let second = AttackWave::new([UnitTag::new(2), UnitTag::new(3)], Point::new(9.0, 9.0));

        assert!(waves.form(first));
        assert!(waves.form(second));

        let members: Vec<_> = waves.iter().map(|wave| wave.members().len()).collect();
        assert_eq!(members, vec![2, 1], "a unit belongs to one wave at most");
    }

    #[test]
    fn fully_claimed_wave_is_not_formed() {
        let mut waves = AttackWaves::new();
        assert!(waves.form(AttackWave::new([UnitTag::new(1)], Point::new(5.0, 5.0))));
        assert!(!waves.form(AttackWave::new([UnitTag::new(1)], Point::new(9.0, 9.0))));
        assert_eq!(waves.len(), 1);
    }
}
