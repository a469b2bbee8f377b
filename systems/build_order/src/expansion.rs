use log::{debug, info};
use vanguard_core::{
    build_time, AbilityId, BuildingSize, Budget, Command, OrderTarget, Point, UnitKind,
    UnitSnapshot, DETECTION_RADIUS, RESOURCE_SPREAD_DISTANCE,
};
use vanguard_system_mining::SaturationPolicy;
use vanguard_system_reservations::Reservations;
use vanguard_world::{query, World};

use crate::TickContext;

/// Straight-line speed of a harvester, in world units per second.
pub const WORKER_SPEED: f32 = 3.9375;

/// Speed of a lifted command center, in world units per second.
pub const FLYING_TOWN_HALL_SPEED: f32 = 1.3125;

const LIFTABLE: [UnitKind; 4] = [
    UnitKind::CommandCenter,
    UnitKind::OrbitalCommand,
    UnitKind::CommandCenterFlying,
    UnitKind::OrbitalCommandFlying,
];

const LIFT_AND_LAND: [AbilityId; 4] = [
    AbilityId::LiftCommandCenter,
    AbilityId::LiftOrbitalCommand,
    AbilityId::LandCommandCenter,
    AbilityId::LandOrbitalCommand,
];

/// Own bases still free to take, in map order.
///
/// A base is skipped when a town hall stands within reach of its resources,
/// a structure is committed to it, an enemy combat unit is nearby, or it has
/// been explored and has no minerals left. Unexplored bases report no minerals and are
/// assumed to be full.
pub fn expansion_locations(world: &World, reservations: &mut Reservations) -> Vec<Point> {
    let halls = query::town_halls(world);

    world
        .locations()
        .own_bases()
        .into_iter()
        .filter(|expansion| {
            !halls.iter().any(|hall| {
                hall.position
                    .is_closer_than(RESOURCE_SPREAD_DISTANCE, *expansion)
            })
        })
        .filter(|expansion| !reservations.is_reserved(world, *expansion))
        .filter(|expansion| {
            !query::enemies_near(world, *expansion, DETECTION_RADIUS)
                .any(|enemy| enemy.kind.is_army())
        })
        .filter(|expansion| {
            let mined_out = !world.units().iter().any(|unit| {
                unit.has_minerals()
                    && unit
                        .position
                        .is_closer_than(RESOURCE_SPREAD_DISTANCE, *expansion)
            });
            !(mined_out && world.terrain().is_explored(*expansion))
        })
        .collect()
}

/// Command centers and orbital commands out of resource reach of every base
/// and not already flying to one.
#[must_use]
pub fn free_town_halls<'a>(world: &'a World, reservations: &Reservations) -> Vec<&'a UnitSnapshot> {
    let bases = world.locations().own_bases();

    query::own_of_kind(world, &LIFTABLE)
        .filter(|hall| {
            !bases
                .iter()
                .any(|base| hall.position.is_closer_than(RESOURCE_SPREAD_DISTANCE, *base))
        })
        .filter(|hall| !reservations.is_at_expansion(world, hall))
        .filter(|hall| !hall.is_ordered_to_any(&LIFT_AND_LAND))
        .collect()
}

/// Whether the economy can use another town hall.
///
/// Expanding waits while another town hall is ordered or under
/// construction, and while the current bases still offer more harvesting
/// slots than there are harvesters plus the ones trained during a town hall
/// build.
#[must_use]
pub fn should_expand(world: &World, budget: &Budget, policy: &SaturationPolicy) -> bool {
    if !budget.can_afford(AbilityId::BuildCommandCenter) {
        return false;
    }

    let ordered = query::workers(world)
        .into_iter()
        .any(|worker| worker.is_ordered_to(AbilityId::BuildCommandCenter));
    let in_progress = query::own_of_kind(world, &[UnitKind::CommandCenter])
        .any(|hall| hall.is_in_progress());
    if ordered || in_progress {
        return false;
    }

    let miners = query::miners(world).len();
    if miners == 0 {
        return false;
    }

    let halls = query::town_halls(world);
    let resources = query::resources_near(world, &halls);
    let minerals = resources.iter().filter(|unit| unit.has_minerals()).count();
    let refineries = resources.len() - minerals;
    let slots = minerals * policy.per_mineral as usize + refineries * policy.per_gas as usize;
    let trained_meanwhile = build_time::during(build_time::WORKER, build_time::TOWN_HALL) as usize;

    slots <= miners + trained_meanwhile
}

/// Takes the next free base.
///
/// Town halls standing away from every base are lifted and flown to the
/// next free ones first. Otherwise, when the economy asks for it, the
/// nearest free worker builds a new town hall: directly on the base when
/// walking there is faster, or next to the nearest existing town hall to be
/// flown over later.
pub fn expand(ctx: &mut TickContext<'_>) {
    let world = ctx.world;
    let expansions = expansion_locations(world, ctx.reservations);
    if expansions.is_empty() {
        return;
    }

    let free: Vec<&UnitSnapshot> = free_town_halls(world, ctx.reservations)
        .into_iter()
        .filter(|hall| ctx.out.for_unit(hall.tag).next().is_none())
        .collect();
    if !free.is_empty() {
        for (hall, expansion) in free.into_iter().zip(expansions) {
            relocate(ctx, hall, expansion);
        }
        return;
    }

    let already_ordered = ctx.out.iter().any(|command| {
        matches!(
            command,
            Command::Ability {
                ability: AbilityId::BuildCommandCenter,
                ..
            }
        )
    });
    if already_ordered || !should_expand(world, ctx.budget, ctx.saturation) {
        return;
    }

    let expansion = expansions[0];
    let Some(worker) = query::closest_to(query::idle_or_gathering_workers(world), expansion) else {
        return;
    };

    let halls = query::town_halls(world);
    let Some(nearest) = query::closest_to(halls.iter().copied(), worker.position) else {
        let Some(spot) = ctx.placement.find_spot(
            world,
            ctx.oracle,
            expansion,
            BuildingSize::S5x5,
            UnitKind::CommandCenter,
            AbilityId::BuildCommandCenter,
        ) else {
            return;
        };
        info!("no town hall left, building one at {spot}");
        ctx.out.issue(
            worker.tag,
            AbilityId::BuildCommandCenter,
            OrderTarget::Point(spot),
        );
        ctx.budget.deduct(AbilityId::BuildCommandCenter);
        return;
    };

    let towards = nearest
        .position
        .towards(expansion, nearest.sight_range);
    let home_spot = ctx.placement.find_spot(
        world,
        ctx.oracle,
        towards,
        BuildingSize::S5x5,
        UnitKind::CommandCenter,
        AbilityId::BuildCommandCenter,
    );

    let spot = match home_spot {
        Some(spot) if is_flying_faster(worker, spot, expansion) => {
            info!("building a town hall at {spot} to fly to {expansion}");
            spot
        }
        _ => {
            info!("expanding to {expansion}");
            expansion
        }
    };

    ctx.out.issue(
        worker.tag,
        AbilityId::BuildCommandCenter,
        OrderTarget::Point(spot),
    );
    ctx.budget.deduct(AbilityId::BuildCommandCenter);

    let fields = world.units().iter().filter(|unit| unit.has_minerals());
    if let Some(field) = query::closest_to(fields, expansion) {
        ctx.out
            .queue(worker.tag, AbilityId::Smart, OrderTarget::Unit(field.tag));
    }
}

/// Lifts a grounded town hall or lands a flying one at `expansion`.
fn relocate(ctx: &mut TickContext<'_>, hall: &UnitSnapshot, expansion: Point) {
    if !hall.flying && hall.is_ready() {
        let lift = match hall.kind {
            UnitKind::OrbitalCommand => AbilityId::LiftOrbitalCommand,
            _ => AbilityId::LiftCommandCenter,
        };
        info!("lifting {:?} from {} to {expansion}", hall.kind, hall.position);
        ctx.out.issue(hall.tag, lift, OrderTarget::None);
        ctx.reservations
            .reserve_expansion(ctx.world, hall.tag, expansion);
    }

    if hall.flying && hall.is_idle() {
        let land = match hall.kind {
            UnitKind::OrbitalCommandFlying => AbilityId::LandOrbitalCommand,
            _ => AbilityId::LandCommandCenter,
        };
        ctx.out
            .queue(hall.tag, land, OrderTarget::Point(expansion));
        ctx.reservations
            .reserve_expansion(ctx.world, hall.tag, expansion);
    }
}

/// Whether flying a town hall built at `spot` reaches `expansion` before
/// `worker` walks there. Lift-off and landing times are ignored.
fn is_flying_faster(worker: &UnitSnapshot, spot: Point, expansion: Point) -> bool {
    let fly = spot.distance(expansion) / FLYING_TOWN_HALL_SPEED;
    let walk = worker.position.distance(expansion) / WORKER_SPEED;
    debug!("walking takes {walk:.1}s, flying takes {fly:.1}s");
    fly < walk
}

#[cfg(test)]
mod tests {
    use super::{is_flying_faster, FLYING_TOWN_HALL_SPEED, WORKER_SPEED};
    use vanguard_core::{Alliance, Point, UnitKind, UnitSnapshot, UnitTag};

    #[test]
    fn short_flights_beat_long_walks() {
        let worker = UnitSnapshot::new(
            UnitTag::new(1),
            UnitKind::Scv,
            Alliance::Own,
            Point::new(0.0, 0.0),
        );
        assert!(WORKER_SPEED > FLYING_TOWN_HALL_SPEED);
        assert!(is_flying_faster(
            &worker,
            Point::new(95.0, 0.0),
            Point::new(100.0, 0.0)
        ));
        assert!(!is_flying_faster(
            &worker,
            Point::new(10.0, 0.0),
            Point::new(100.0, 0.0)
        ));
    }
}
