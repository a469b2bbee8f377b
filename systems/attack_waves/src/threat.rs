use std::collections::{BTreeMap, BTreeSet};

use vanguard_core::{UnitSnapshot, UnitTag};
use vanguard_system_reservations::Reservations;
use vanguard_world::{query, World};

/// Enemies inside each base, keyed by the base's town hall.
///
/// A base is a town hall standing on its expansion plus every own structure
/// transitively within sight of it. An enemy belongs to the base when it is
/// within the hall's sight range or within `detection_radius` of any
/// structure of the base.
#[must_use]
pub fn enemies_in_bases<'a>(
    world: &'a World,
    reservations: &Reservations,
    detection_radius: f32,
) -> BTreeMap<UnitTag, Vec<&'a UnitSnapshot>> {
    let structures: Vec<&UnitSnapshot> = query::structures(world).collect();
    let enemies: Vec<&UnitSnapshot> = query::enemies(world).collect();

    query::town_halls(world)
        .into_iter()
        .filter(|hall| reservations.is_at_expansion(world, hall))
        .map(|hall| {
            let base = cluster_by_sight(hall, &structures);
            let intruders: Vec<&UnitSnapshot> = enemies
                .iter()
                .copied()
                .filter(|enemy| {
                    enemy.position.is_closer_than(hall.sight_range, hall.position)
                        || base.iter().any(|building| {
                            enemy
                                .position
                                .is_closer_than(detection_radius, building.position)
                        })
                })
                .collect();
            (hall.tag, intruders)
        })
        .collect()
}

/// Base with the most enemies inside it. Ties go to the smallest hall tag.
#[must_use]
pub fn most_threatened_base<'m, 'a>(
    bases: &'m BTreeMap<UnitTag, Vec<&'a UnitSnapshot>>,
) -> Option<(UnitTag, &'m [&'a UnitSnapshot])> {
    let mut best: Option<(UnitTag, &'m [&'a UnitSnapshot])> = None;
    for (hall, enemies) in bases {
        if enemies.is_empty() {
            continue;
        }
        if best.map_or(true, |(_, current)| enemies.len() > current.len()) {
            best = Some((*hall, enemies.as_slice()));
        }
    }
    best
}

/// Grows a cluster from `seed`, breadth first.
///
/// A unit joins when it is strictly within the sight range of any unit
/// already in the cluster. The seed is always the first member.
#[must_use]
pub fn cluster_by_sight<'a>(
    seed: &'a UnitSnapshot,
    units: &[&'a UnitSnapshot],
) -> Vec<&'a UnitSnapshot> {
    let mut cluster = vec![seed];
    let mut included: BTreeSet<UnitTag> = BTreeSet::new();
    let _ = included.insert(seed.tag);

    let mut cursor = 0;
    while let Some(member) = cluster.get(cursor).copied() {
        cursor += 1;
        for candidate in units {
            if included.contains(&candidate.tag) {
                continue;
            }
            if candidate
                .position
                .is_closer_than(member.sight_range, member.position)
            {
                let _ = included.insert(candidate.tag);
                cluster.push(candidate);
            }
        }
    }

    cluster
}

/// Enemy group attacking the most threatened base, if any.
///
/// The cluster is seeded with the enemy nearest that base's town hall and
/// grown by sight among the enemies inside the base.
#[must_use]
pub fn enemy_cluster_at_home<'a>(
    world: &'a World,
    reservations: &Reservations,
    detection_radius: f32,
) -> Vec<&'a UnitSnapshot> {
    let bases = enemies_in_bases(world, reservations, detection_radius);
    let Some((hall, enemies)) = most_threatened_base(&bases) else {
        return Vec::new();
    };
    let Some(hall) = world.unit(hall) else {
        return Vec::new();
    };
    let Some(seed) = query::closest_to(enemies.iter().copied(), hall.position) else {
        return Vec::new();
    };

    cluster_by_sight(seed, enemies)
}
