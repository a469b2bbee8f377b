#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Building placement search around an anchor point.
//!
//! Candidates are visited in square rings of growing radius. A candidate is
//! accepted once the terrain is clear, it does not block a mining path, it
//! respects the adjacency rule, and the engine agrees it fits.

use std::collections::BTreeSet;

use log::debug;
use serde::{Deserialize, Serialize};
use vanguard_core::{
    AbilityId, BuildingSize, PlacementOracle, Point, UnitKind, UnitSnapshot,
    RESOURCE_SPREAD_DISTANCE,
};
use vanguard_world::{query, World};

/// Tunables of the placement search.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlacementConfig {
    /// Largest ring radius visited, in cells. Roughly the size of a base.
    pub max_distance: u32,
}

impl Default for PlacementConfig {
    fn default() -> Self {
        Self { max_distance: 30 }
    }
}

/// Spiral placement search.
#[derive(Clone, Copy, Debug, Default)]
pub struct PlacementSearch {
    config: PlacementConfig,
}

impl PlacementSearch {
    /// Creates a search bounded by the provided configuration.
    #[must_use]
    pub const fn new(config: PlacementConfig) -> Self {
        Self { config }
    }

    /// Configuration the search runs with.
    #[must_use]
    pub const fn config(&self) -> PlacementConfig {
        self.config
    }

    /// Finds the first valid cell for `kind` starting at `anchor`.
    ///
    /// The anchor rounded down to the grid is tried first, then every ring up
    /// to the configured radius. Returns `None` when nothing fits.
    #[must_use]
    pub fn find_spot(
        &self,
        world: &World,
        oracle: &dyn PlacementOracle,
        anchor: Point,
        size: BuildingSize,
        kind: UnitKind,
        ability: AbilityId,
    ) -> Option<Point> {
        let surroundings = Surroundings::capture(world);
        let start = anchor.floor();

        let found = std::iter::once(start)
            .chain((1..=self.config.max_distance).flat_map(|distance| ring(start, distance)))
            .find(|candidate| {
                surroundings.accepts(world, oracle, *candidate, size, kind, ability)
            });

        if found.is_none() {
            debug!(
                "no spot for {kind:?} within {} cells of {anchor}",
                self.config.max_distance
            );
        }
        found
    }

    /// Whether `kind` may be placed at `candidate`.
    #[must_use]
    pub fn is_valid(
        &self,
        world: &World,
        oracle: &dyn PlacementOracle,
        candidate: Point,
        size: BuildingSize,
        kind: UnitKind,
        ability: AbilityId,
    ) -> bool {
        Surroundings::capture(world).accepts(world, oracle, candidate, size, kind, ability)
    }
}

/// Cells of the square ring `distance` cells away from `origin`, in search order.
///
/// The walk starts at the top-left corner and runs along the top edge left to
/// right, the right edge top to bottom, the bottom edge right to left, and the
/// left edge bottom to top. Each corner is visited once.
#[must_use]
pub fn ring(origin: Point, distance: u32) -> Vec<Point> {
    let d = distance as f32;
    let side = distance.saturating_mul(2);
    let top_left = origin.offset(-d, d);

    let mut cells = Vec::with_capacity(side as usize * 4);
    for step in 0..side {
        cells.push(top_left.offset(step as f32, 0.0));
    }
    for step in 0..side {
        cells.push(top_left.offset(2.0 * d, -(step as f32)));
    }
    for step in 0..side {
        cells.push(top_left.offset(2.0 * d - step as f32, -2.0 * d));
    }
    for step in 0..side {
        cells.push(top_left.offset(0.0, -2.0 * d + step as f32));
    }
    cells
}

/// Structures and resources relevant to placement, gathered once per search.
struct Surroundings<'a> {
    structures: Vec<(&'a UnitSnapshot, BuildingSize)>,
    resources: Vec<&'a UnitSnapshot>,
    town_halls: Vec<&'a UnitSnapshot>,
}

impl<'a> Surroundings<'a> {
    fn capture(world: &'a World) -> Self {
        let structures = query::structures(world)
            .filter_map(|unit| unit.footprint().map(|size| (unit, size)))
            .collect();

        let resources = world
            .units()
            .iter()
            .filter(|unit| {
                unit.has_minerals()
                    || (unit.kind.is_geyser() && unit.has_gas())
                    || (unit.kind.is_refinery() && unit.has_gas() && is_own(unit))
            })
            .collect();

        Self {
            structures,
            resources,
            town_halls: query::town_halls(world),
        }
    }

    fn accepts(
        &self,
        world: &World,
        oracle: &dyn PlacementOracle,
        candidate: Point,
        size: BuildingSize,
        kind: UnitKind,
        ability: AbilityId,
    ) -> bool {
        if !world.terrain().is_clear(&size.cells(candidate)) {
            return false;
        }

        if self.is_between_resource_and_hall(candidate) {
            return false;
        }

        let touching = self.touching_kinds(candidate, size, kind);
        let allowed = if kind.is_touchy() { 1 } else { 0 };
        if touching.len() > allowed {
            return false;
        }

        oracle.can_place(ability, candidate)
    }

    fn is_between_resource_and_hall(&self, candidate: Point) -> bool {
        let nearby = |units: &[&'a UnitSnapshot]| {
            query::closest_to(
                units
                    .iter()
                    .copied()
                    .filter(|unit| unit.position.is_closer_than(RESOURCE_SPREAD_DISTANCE, candidate)),
                candidate,
            )
        };

        let (Some(resource), Some(hall)) = (nearby(&self.resources), nearby(&self.town_halls))
        else {
            return false;
        };

        resource.position.distance(candidate) + hall.position.distance(candidate)
            <= hall.position.distance(resource.position) + 1.0
    }

    fn touching_kinds(
        &self,
        candidate: Point,
        size: BuildingSize,
        kind: UnitKind,
    ) -> BTreeSet<UnitKind> {
        self.structures
            .iter()
            .filter(|(unit, _)| unit.kind != kind)
            .filter(|(unit, existing)| size.touches(candidate, *existing, unit.position))
            .map(|(unit, _)| unit.kind)
            .collect()
    }
}

fn is_own(unit: &UnitSnapshot) -> bool {
    unit.alliance == vanguard_core::Alliance::Own
}

#[cfg(test)]
mod tests {
    use super::ring;
    use vanguard_core::Point;

    #[test]
    fn ring_visits_every_border_cell_once() {
        let cells = ring(Point::new(0.0, 0.0), 2);
        assert_eq!(cells.len(), 16);
        let mut unique = cells.clone();
        unique.sort_by(|a, b| a.x().total_cmp(&b.x()).then(a.y().total_cmp(&b.y())));
        unique.dedup();
        assert_eq!(unique.len(), 16);
        assert!(cells
            .iter()
            .all(|cell| cell.x().abs() == 2.0 || cell.y().abs() == 2.0));
    }
}
