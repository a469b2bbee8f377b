use log::info;
use vanguard_core::{
    AbilityId, Budget, CommandBatch, OrderTarget, UnitKind, UnitSnapshot, UnitTag,
    RESOURCE_SPREAD_DISTANCE,
};
use vanguard_system_reservations::{Reservations, Role};
use vanguard_world::{query, World};

use crate::{AssignmentTracker, SaturationPolicy};

const TERRAN_TOWN_HALLS: [UnitKind; 3] = [
    UnitKind::CommandCenter,
    UnitKind::OrbitalCommand,
    UnitKind::PlanetaryFortress,
];

/// Resources near the halls still missing harvesters: mineral patches below
/// `per_mineral`, then ready refineries below `per_gas`.
#[must_use]
pub fn unsaturated_resources<'a>(
    world: &'a World,
    halls: &[&UnitSnapshot],
    tracker: &AssignmentTracker,
    policy: &SaturationPolicy,
) -> Vec<&'a UnitSnapshot> {
    let mut minerals = unsaturated_minerals(world, halls, tracker, policy.per_mineral);
    minerals.extend(unsaturated_gas(world, halls, tracker, policy.per_gas));
    minerals
}

fn unsaturated_minerals<'a>(
    world: &'a World,
    halls: &[&UnitSnapshot],
    tracker: &AssignmentTracker,
    cap: u32,
) -> Vec<&'a UnitSnapshot> {
    query::resources_near(world, halls)
        .into_iter()
        .filter(|resource| resource.has_minerals())
        .filter(|field| tracker.mineral_saturation(field.tag) < cap)
        .collect()
}

fn unsaturated_gas<'a>(
    world: &'a World,
    halls: &[&UnitSnapshot],
    tracker: &AssignmentTracker,
    cap: u32,
) -> Vec<&'a UnitSnapshot> {
    query::resources_near(world, halls)
        .into_iter()
        .filter(|resource| resource.kind.is_refinery() && resource.is_ready())
        .filter(|refinery| tracker.gas_saturation(refinery.tag) < cap)
        .collect()
}

/// Sends idle workers back to work.
///
/// Mineral patches are filled up to `per_mineral` first, then refineries up
/// to `per_gas`, then mineral patches up to `mineral_overflow`. Each worker
/// takes the nearest resource still below its cap.
pub fn distribute_idle_workers(
    world: &World,
    tracker: &mut AssignmentTracker,
    policy: &SaturationPolicy,
    out: &mut CommandBatch,
) {
    let mut idle: Vec<&UnitSnapshot> = query::workers(world)
        .into_iter()
        .filter(|worker| worker.is_idle())
        .collect();
    if idle.is_empty() {
        return;
    }

    let halls = query::town_halls(world);
    if halls.is_empty() {
        return;
    }

    info!("sending {} workers back to work", idle.len());

    let minerals = unsaturated_minerals(world, &halls, tracker, policy.mineral_overflow);
    let refineries = unsaturated_gas(world, &halls, tracker, policy.per_gas);

    fill(
        &mut idle,
        &minerals,
        policy.per_mineral,
        tracker,
        AssignmentTracker::mineral_saturation,
        AssignmentTracker::assign_mineral,
        out,
    );
    fill(
        &mut idle,
        &refineries,
        policy.per_gas,
        tracker,
        AssignmentTracker::gas_saturation,
        AssignmentTracker::assign_gas,
        out,
    );
    fill(
        &mut idle,
        &minerals,
        policy.mineral_overflow,
        tracker,
        AssignmentTracker::mineral_saturation,
        AssignmentTracker::assign_mineral,
        out,
    );
}

fn fill(
    idle: &mut Vec<&UnitSnapshot>,
    resources: &[&UnitSnapshot],
    cap: u32,
    tracker: &mut AssignmentTracker,
    saturation: fn(&AssignmentTracker, UnitTag) -> u32,
    assign: fn(&mut AssignmentTracker, UnitTag, UnitTag),
    out: &mut CommandBatch,
) {
    if resources.is_empty() {
        return;
    }

    idle.retain(|worker| {
        let counts: &AssignmentTracker = tracker;
        let open = resources
            .iter()
            .copied()
            .filter(move |resource| saturation(counts, resource.tag) < cap);
        let Some(resource) = query::closest_to(open, worker.position) else {
            return true;
        };

        out.issue(
            worker.tag,
            AbilityId::HarvestGather,
            OrderTarget::Unit(resource.tag),
        );
        assign(tracker, worker.tag, resource.tag);
        false
    });
}

/// Trains one harvester from every ready, idle town hall standing on its expansion.
///
/// Halls reserved for a role-morph are skipped. Each new harvester is rallied
/// to a distinct unsaturated resource near its hall; gas is chosen once the
/// mineral-to-gas slot ratio reaches the policy threshold.
pub fn train_workers(
    world: &World,
    tracker: &AssignmentTracker,
    reservations: &mut Reservations,
    policy: &SaturationPolicy,
    budget: &mut Budget,
    out: &mut CommandBatch,
) {
    let miners = query::miners(world).len();
    if !budget.can_afford(AbilityId::TrainScv)
        || u32::try_from(miners).unwrap_or(u32::MAX) >= policy.max_workers
    {
        return;
    }

    let halls: Vec<&UnitSnapshot> = query::own_of_kind(world, &TERRAN_TOWN_HALLS).collect();
    if halls.is_empty() {
        return;
    }

    let mut resources = unsaturated_resources(world, &halls, tracker, policy);
    if resources.is_empty() {
        return;
    }

    let idle_halls: Vec<&UnitSnapshot> = halls
        .iter()
        .copied()
        .filter(|hall| hall.is_ready() && hall.is_idle() && reservations.is_at_expansion(world, hall))
        .collect();

    for hall in idle_halls {
        if !budget.can_afford(AbilityId::TrainScv) || resources.is_empty() {
            break;
        }

        if is_morph_pending(world, reservations, hall) {
            continue;
        }

        let Some(resource) = pick_resource(&resources, hall, policy) else {
            continue;
        };

        info!("training worker for resource at {}", resource.position);
        out.issue(
            hall.tag,
            AbilityId::RallyWorkers,
            OrderTarget::Unit(resource.tag),
        );
        out.queue(hall.tag, AbilityId::TrainScv, OrderTarget::None);
        budget.deduct(AbilityId::TrainScv);
        resources.retain(|candidate| candidate.tag != resource.tag);
    }
}

fn is_morph_pending(world: &World, reservations: &mut Reservations, hall: &UnitSnapshot) -> bool {
    for (role, morphed) in [
        (Role::Orbital, UnitKind::OrbitalCommand),
        (Role::Planetary, UnitKind::PlanetaryFortress),
    ] {
        if reservations.reserved(world, role) != Some(hall.tag) {
            continue;
        }
        if hall.kind == morphed {
            reservations.release(role);
            return false;
        }
        return true;
    }
    false
}

fn pick_resource<'a>(
    resources: &[&'a UnitSnapshot],
    hall: &UnitSnapshot,
    policy: &SaturationPolicy,
) -> Option<&'a UnitSnapshot> {
    let nearby: Vec<&UnitSnapshot> = resources
        .iter()
        .copied()
        .filter(|resource| {
            resource
                .position
                .is_closer_than(RESOURCE_SPREAD_DISTANCE, hall.position)
        })
        .collect();
    let refineries: Vec<&UnitSnapshot> = nearby
        .iter()
        .copied()
        .filter(|resource| resource.has_gas())
        .collect();
    let fields: Vec<&UnitSnapshot> = nearby
        .iter()
        .copied()
        .filter(|resource| resource.has_minerals())
        .collect();

    if fields.is_empty() || refineries.is_empty() {
        return query::closest_to(resources.iter().copied(), hall.position);
    }

    let mineral_slots = fields.len() as u32 * policy.per_mineral;
    let gas_slots = refineries.len() as u32 * policy.per_gas;
    if gas_slots > 0 && mineral_slots / gas_slots >= policy.gas_switch_threshold {
        query::closest_to(refineries, hall.position)
    } else {
        query::closest_to(fields, hall.position)
    }
}
