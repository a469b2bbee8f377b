#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Reservation records that commit structures to economic and tactical roles.
//!
//! Every record is keyed by unit tag. Records pointing at units missing from
//! the current snapshot are dropped the next time they are read, so callers
//! never observe a stale tag.

use std::{collections::BTreeMap, fmt};

use log::{debug, warn};
use vanguard_core::{Point, UnitSnapshot, UnitTag};
use vanguard_world::{query, World};

/// Exclusive single-structure roles.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Role {
    /// A town hall about to morph into an orbital command.
    Orbital,
    /// A town hall about to morph into a planetary fortress.
    Planetary,
    /// A production structure about to attach an add-on.
    AddOn,
}

impl Role {
    /// Every role, in slot order.
    pub const ALL: [Role; 3] = [Role::Orbital, Role::Planetary, Role::AddOn];
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Role::Orbital => "orbital",
            Role::Planetary => "planetary",
            Role::AddOn => "add-on",
        };
        f.write_str(name)
    }
}

/// Reasons a role reservation is refused.
#[derive(Clone, Copy, Debug, PartialEq, Eq, thiserror::Error)]
pub enum ReservationError {
    /// Another live structure already holds the role.
    #[error("{role} slot is already held by {holder}")]
    SlotOccupied {
        /// Role that was requested.
        role: Role,
        /// Structure currently holding it.
        holder: UnitTag,
    },
    /// The structure already holds a different role.
    #[error("{tag} is already reserved for the {role} role")]
    AlreadyHeld {
        /// Structure that was offered.
        tag: UnitTag,
        /// Role it holds.
        role: Role,
    },
}

/// Mutable role records owned by the tick driver.
#[derive(Clone, Debug, Default)]
pub struct Reservations {
    expansions: BTreeMap<UnitTag, Point>,
    orbital: Option<UnitTag>,
    planetary: Option<UnitTag>,
    add_on: Option<UnitTag>,
}

impl Reservations {
    /// Creates empty records.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Binds every town hall already standing on one of the agent's bases to that base.
    pub fn initialize(&mut self, world: &World) {
        let halls = query::town_halls(world);
        if halls.is_empty() {
            warn!("cannot bind town halls to expansions: no town halls");
            return;
        }

        for expansion in world.locations().own_bases() {
            let Some(hall) = query::closest_to(halls.iter().copied(), expansion) else {
                continue;
            };
            if hall.position.is_closer_than(1.0, expansion) {
                let _ = self.expansions.insert(hall.tag, expansion);
            }
        }
    }

    fn slot(&mut self, role: Role) -> &mut Option<UnitTag> {
        match role {
            Role::Orbital => &mut self.orbital,
            Role::Planetary => &mut self.planetary,
            Role::AddOn => &mut self.add_on,
        }
    }

    fn purge(&mut self, world: &World) {
        for role in Role::ALL {
            let slot = self.slot(role);
            if let Some(tag) = *slot {
                if !world.contains(tag) {
                    debug!("dropping {role} reservation of vanished {tag}");
                    *slot = None;
                }
            }
        }
        self.expansions.retain(|tag, _| world.contains(*tag));
    }

    /// Structure holding `role`, if it is still alive.
    pub fn reserved(&mut self, world: &World, role: Role) -> Option<UnitTag> {
        self.purge(world);
        *self.slot(role)
    }

    /// Commits `tag` to `role`.
    ///
    /// Reserving the same structure twice for the same role is accepted.
    ///
    /// # Errors
    ///
    /// Returns [`ReservationError::SlotOccupied`] when another live structure
    /// holds the role and [`ReservationError::AlreadyHeld`] when `tag` holds a
    /// different role.
    pub fn reserve(
        &mut self,
        world: &World,
        role: Role,
        tag: UnitTag,
    ) -> Result<(), ReservationError> {
        self.purge(world);

        if let Some(held) = self.holder_role(tag) {
            if held != role {
                return Err(ReservationError::AlreadyHeld { tag, role: held });
            }
        }

        let slot = self.slot(role);
        match *slot {
            Some(holder) if holder != tag => Err(ReservationError::SlotOccupied { role, holder }),
            _ => {
                *slot = Some(tag);
                Ok(())
            }
        }
    }

    /// Clears `role`.
    pub fn release(&mut self, role: Role) {
        *self.slot(role) = None;
    }

    /// Role currently held by `tag`, without checking liveness.
    #[must_use]
    pub fn holder_role(&self, tag: UnitTag) -> Option<Role> {
        [
            (Role::Orbital, self.orbital),
            (Role::Planetary, self.planetary),
            (Role::AddOn, self.add_on),
        ]
        .into_iter()
        .find_map(|(role, holder)| (holder == Some(tag)).then_some(role))
    }

    /// Expansion point the structure is committed to, if it is alive in `world`.
    #[must_use]
    pub fn expansion_of(&self, world: &World, tag: UnitTag) -> Option<Point> {
        if !world.contains(tag) {
            return None;
        }
        self.expansions.get(&tag).copied()
    }

    /// Whether the unit is alive in `world` and stands on the expansion it is
    /// committed to.
    #[must_use]
    pub fn is_at_expansion(&self, world: &World, unit: &UnitSnapshot) -> bool {
        self.expansion_of(world, unit.tag)
            .is_some_and(|expansion| unit.position.is_closer_than(1.0, expansion))
    }

    /// Structures committed to an expansion they are not standing on yet.
    pub fn misplaced(&mut self, world: &World) -> Vec<(UnitTag, Point)> {
        self.purge(world);
        self.expansions
            .iter()
            .filter_map(|(tag, expansion)| {
                let unit = world.unit(*tag)?;
                (!unit.position.is_closer_than(1.0, *expansion)).then_some((*tag, *expansion))
            })
            .collect()
    }

    /// Whether any live structure is committed to `expansion`.
    pub fn is_reserved(&mut self, world: &World, expansion: Point) -> bool {
        self.purge(world);
        self.expansions
            .values()
            .any(|point| point.is_closer_than(1.0, expansion))
    }

    /// Every expansion point a live structure is committed to.
    pub fn reserved_points(&mut self, world: &World) -> Vec<Point> {
        self.purge(world);
        self.expansions.values().copied().collect()
    }

    /// Live structures committed to `expansion`.
    pub fn by_expansion(&mut self, world: &World, expansion: Point) -> Vec<UnitTag> {
        self.purge(world);
        self.expansions
            .iter()
            .filter(|(_, point)| point.is_closer_than(1.0, expansion))
            .map(|(tag, _)| *tag)
            .collect()
    }

    /// Commits `tag` to `expansion`, evicting any other structure committed there.
    pub fn reserve_expansion(&mut self, world: &World, tag: UnitTag, expansion: Point) {
        for evicted in self.by_expansion(world, expansion) {
            if evicted != tag {
                debug!("{evicted} loses expansion {expansion} to {tag}");
            }
            let _ = self.expansions.remove(&evicted);
        }
        let _ = self.expansions.insert(tag, expansion);
    }

    /// Forgets the structure's expansion commitment.
    pub fn release_expansion(&mut self, tag: UnitTag) {
        let _ = self.expansions.remove(&tag);
    }
}

#[cfg(test)]
mod tests {
    use super::Role;

    #[test]
    fn roles_display_readably() {
        assert_eq!(Role::AddOn.to_string(), "add-on");
        assert_eq!(Role::ALL.len(), 3);
    }
}
