use vanguard_core::{
    AbilityId, Alliance, Budget, Command, CommandBatch, OrderTarget, Point, Resources, UnitKind,
    UnitSnapshot, UnitTag,
};
use vanguard_system_mining::{
    distribute_idle_workers, train_workers, AssignmentTracker, SaturationPolicy,
};
use vanguard_system_reservations::{Reservations, Role};
use vanguard_world::{Locations, TerrainGrid, World, WorldBuilder};

const HALL: UnitTag = UnitTag::new(1);
const REFINERY: UnitTag = UnitTag::new(20);
const START: Point = Point::new(20.5, 20.5);

fn own(tag: u64, kind: UnitKind, x: f32, y: f32) -> UnitSnapshot {
    UnitSnapshot::new(UnitTag::new(tag), kind, Alliance::Own, Point::new(x, y))
}

fn mineral(tag: u64, x: f32) -> UnitSnapshot {
    UnitSnapshot::new(
        UnitTag::new(tag),
        UnitKind::MineralField,
        Alliance::Neutral,
        Point::new(x, 28.5),
    )
    .with_minerals(1500)
}

fn refinery() -> UnitSnapshot {
    own(20, UnitKind::Refinery, 27.5, 23.5).with_vespene(2250)
}

fn base(mineral_count: u64) -> Vec<UnitSnapshot> {
    let mut units = vec![own(1, UnitKind::CommandCenter, START.x(), START.y()), refinery()];
    units.extend((0..mineral_count).map(|index| mineral(10 + index, 17.0 + index as f32)));
    units
}

fn world_with(units: Vec<UnitSnapshot>) -> World {
    WorldBuilder::new(
        TerrainGrid::open(96, 96),
        Locations::new(START, Point::new(80.5, 80.5)),
    )
    .game_loop(448)
    .units(units)
    .build()
}

fn gathering(tag: u64, target: u64) -> UnitSnapshot {
    own(tag, UnitKind::Scv, 22.0, 24.0).with_order(
        AbilityId::HarvestGather,
        OrderTarget::Unit(UnitTag::new(target)),
    )
}

fn budget() -> Budget {
    Budget::from_resources(Resources {
        minerals: 500,
        vespene: 0,
        food_used: 12,
        food_cap: 15,
    })
}

#[test]
fn reconcile_tracks_current_targets() {
    let mut units = base(8);
    units.push(gathering(100, 10));
    units.push(gathering(101, 20));
    units.push(own(102, UnitKind::Scv, 50.0, 50.0));
    let world = world_with(units);

    let mut reservations = Reservations::new();
    reservations.initialize(&world);

    let mut tracker = AssignmentTracker::new();
    tracker.assign_mineral(UnitTag::new(101), UnitTag::new(11));
    tracker.assign_mineral(UnitTag::new(102), UnitTag::new(11));
    tracker.assign_mineral(UnitTag::new(103), UnitTag::new(12));

    tracker.reconcile(&world, &reservations);

    assert_eq!(tracker.mineral_of(UnitTag::new(100)), Some(UnitTag::new(10)));
    assert_eq!(tracker.base_of(UnitTag::new(100)), Some(HALL));
    assert_eq!(tracker.last_seen(UnitTag::new(100)), Some(448));
    assert_eq!(
        tracker.gas_of(UnitTag::new(101)),
        Some(REFINERY),
        "a harvester now on gas moves to the gas mapping"
    );
    assert_eq!(tracker.mineral_of(UnitTag::new(101)), None);
    assert_eq!(
        tracker.mineral_of(UnitTag::new(102)),
        None,
        "an idle harvester away from every base is forgotten"
    );
    assert_eq!(
        tracker.mineral_of(UnitTag::new(103)),
        None,
        "a dead harvester is forgotten"
    );
    assert_eq!(tracker.base_saturation(HALL), 2);
}

#[test]
fn idle_workers_fill_minerals_then_gas_then_overflow() {
    let mut units = base(1);
    units.extend((200..204).map(|tag| own(tag, UnitKind::Scv, 20.0, 25.0)));
    let world = world_with(units);

    let mut tracker = AssignmentTracker::new();
    tracker.assign_mineral(UnitTag::new(300), UnitTag::new(10));
    tracker.assign_mineral(UnitTag::new(301), UnitTag::new(10));

    let mut out = CommandBatch::new();
    distribute_idle_workers(&world, &mut tracker, &SaturationPolicy::default(), &mut out);

    assert_eq!(out.len(), 4, "every idle worker receives an order");
    assert_eq!(tracker.gas_saturation(REFINERY), 3);
    assert_eq!(
        tracker.mineral_saturation(UnitTag::new(10)),
        3,
        "minerals overflow to three once gas is full"
    );
    assert_eq!(tracker.mineral_of(UnitTag::new(203)), Some(UnitTag::new(10)));
}

#[test]
fn new_worker_goes_to_gas_when_minerals_dominate() {
    let world = world_with(base(8));
    let mut reservations = Reservations::new();
    reservations.initialize(&world);
    let tracker = AssignmentTracker::new();
    let mut budget = budget();
    let mut out = CommandBatch::new();

    train_workers(
        &world,
        &tracker,
        &mut reservations,
        &SaturationPolicy::default(),
        &mut budget,
        &mut out,
    );

    let commands = out.into_vec();
    assert_eq!(
        commands,
        vec![
            Command::Ability {
                unit: HALL,
                ability: AbilityId::RallyWorkers,
                target: OrderTarget::Unit(REFINERY),
                queued: false,
            },
            Command::Ability {
                unit: HALL,
                ability: AbilityId::TrainScv,
                target: OrderTarget::None,
                queued: true,
            },
        ],
        "sixteen mineral slots against three gas slots switch to gas"
    );
    assert_eq!(budget.minerals(), 450);
}

#[test]
fn new_worker_stays_on_minerals_below_threshold() {
    let world = world_with(base(2));
    let mut reservations = Reservations::new();
    reservations.initialize(&world);
    let mut out = CommandBatch::new();

    train_workers(
        &world,
        &AssignmentTracker::new(),
        &mut reservations,
        &SaturationPolicy::default(),
        &mut budget(),
        &mut out,
    );

    let rally = out.iter().next().cloned();
    assert!(
        matches!(
            rally,
            Some(Command::Ability {
                ability: AbilityId::RallyWorkers,
                target: OrderTarget::Unit(tag),
                ..
            }) if tag != REFINERY
        ),
        "four mineral slots against three gas slots stay on minerals"
    );
}

#[test]
fn hall_reserved_for_morph_trains_nothing() {
    let world = world_with(base(8));
    let mut reservations = Reservations::new();
    reservations.initialize(&world);
    reservations
        .reserve(&world, Role::Orbital, HALL)
        .expect("slot is free");
    let mut out = CommandBatch::new();

    train_workers(
        &world,
        &AssignmentTracker::new(),
        &mut reservations,
        &SaturationPolicy::default(),
        &mut budget(),
        &mut out,
    );

    assert!(out.is_empty(), "a hall about to morph must stay idle");
}

#[test]
fn worker_cap_stops_training() {
    let mut units = base(8);
    units.extend((200..202).map(|tag| gathering(tag, 10)));
    let world = world_with(units);
    let mut reservations = Reservations::new();
    reservations.initialize(&world);
    let policy = SaturationPolicy {
        max_workers: 2,
        ..SaturationPolicy::default()
    };
    let mut out = CommandBatch::new();

    train_workers(
        &world,
        &AssignmentTracker::new(),
        &mut reservations,
        &policy,
        &mut budget(),
        &mut out,
    );

    assert!(out.is_empty());
}
