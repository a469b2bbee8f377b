use vanguard_core::{Alliance, Point, UnitKind, UnitSnapshot, UnitTag};
use vanguard_system_reservations::{ReservationError, Reservations, Role};
use vanguard_world::{Locations, TerrainGrid, World, WorldBuilder};

const START: Point = Point::new(20.5, 20.5);
const NATURAL: Point = Point::new(40.5, 20.5);

fn hall(tag: u64, position: Point) -> UnitSnapshot {
    UnitSnapshot::new(
        UnitTag::new(tag),
        UnitKind::CommandCenter,
        Alliance::Own,
        position,
    )
}

fn world_with(units: Vec<UnitSnapshot>) -> World {
    WorldBuilder::new(
        TerrainGrid::open(96, 96),
        Locations::new(START, Point::new(80.5, 80.5)).with_own_expansions(vec![NATURAL]),
    )
    .units(units)
    .build()
}

#[test]
fn vanished_holder_is_purged_on_next_read() {
    let mut reservations = Reservations::new();
    let before = world_with(vec![hall(7, START)]);
    reservations
        .reserve(&before, Role::Orbital, UnitTag::new(7))
        .expect("slot is free");

    let after = world_with(Vec::new());
    assert_eq!(
        reservations.reserved(&after, Role::Orbital),
        None,
        "a reservation for a dead structure must read as cleared"
    );
    assert_eq!(reservations.holder_role(UnitTag::new(7)), None);
}

#[test]
fn structure_holds_at_most_one_role() {
    let mut reservations = Reservations::new();
    let world = world_with(vec![hall(7, START), hall(8, NATURAL)]);
    reservations
        .reserve(&world, Role::Orbital, UnitTag::new(7))
        .expect("slot is free");

    assert_eq!(
        reservations.reserve(&world, Role::Planetary, UnitTag::new(7)),
        Err(ReservationError::AlreadyHeld {
            tag: UnitTag::new(7),
            role: Role::Orbital,
        }),
        "a structure mid-morph cannot be committed to a second role"
    );
    assert_eq!(
        reservations.reserve(&world, Role::Orbital, UnitTag::new(8)),
        Err(ReservationError::SlotOccupied {
            role: Role::Orbital,
            holder: UnitTag::new(7),
        }),
        "the orbital slot holds a single structure"
    );
    assert_eq!(
        reservations.reserve(&world, Role::Orbital, UnitTag::new(7)),
        Ok(()),
        "re-reserving for the same role is idempotent"
    );
}

#[test]
fn released_slot_accepts_new_holder() {
    let mut reservations = Reservations::new();
    let world = world_with(vec![hall(7, START), hall(8, NATURAL)]);
    reservations
        .reserve(&world, Role::AddOn, UnitTag::new(7))
        .expect("slot is free");
    reservations.release(Role::AddOn);

    assert!(reservations
        .reserve(&world, Role::AddOn, UnitTag::new(8))
        .is_ok());
    assert_eq!(
        reservations.reserved(&world, Role::AddOn),
        Some(UnitTag::new(8))
    );
}

#[test]
fn initialize_binds_halls_standing_on_bases() {
    let mut reservations = Reservations::new();
    let world = world_with(vec![
        hall(1, START),
        hall(2, Point::new(60.5, 60.5)),
    ]);
    reservations.initialize(&world);

    assert_eq!(reservations.expansion_of(&world, UnitTag::new(1)), Some(START));
    assert_eq!(
        reservations.expansion_of(&world, UnitTag::new(2)),
        None,
        "halls away from every base stay unbound"
    );
    assert!(reservations.is_reserved(&world, START));
    assert!(!reservations.is_reserved(&world, NATURAL));
}

#[test]
fn expansion_reservation_evicts_previous_claim() {
    let mut reservations = Reservations::new();
    let world = world_with(vec![hall(1, START), hall(2, START.offset(0.0, -6.0))]);

    reservations.reserve_expansion(&world, UnitTag::new(1), NATURAL);
    reservations.reserve_expansion(&world, UnitTag::new(2), NATURAL);

    assert_eq!(
        reservations.by_expansion(&world, NATURAL),
        vec![UnitTag::new(2)],
        "only the latest claimant keeps the expansion"
    );
    assert_eq!(
        reservations.misplaced(&world),
        vec![(UnitTag::new(2), NATURAL)],
        "a hall travelling to its expansion is misplaced"
    );
}

#[test]
fn at_expansion_requires_standing_on_point() {
    let mut reservations = Reservations::new();
    let landed = hall(1, NATURAL);
    let flying = hall(2, NATURAL.offset(-10.0, 0.0));
    let world = world_with(vec![landed.clone(), flying.clone()]);

    reservations.reserve_expansion(&world, UnitTag::new(1), NATURAL);
    assert!(reservations.is_at_expansion(&world, &landed));
    assert!(!reservations.is_at_expansion(&world, &flying));

    reservations.release_expansion(UnitTag::new(1));
    assert!(reservations.reserved_points(&world).is_empty());
}

#[test]
fn vanished_hall_no_longer_holds_its_expansion() {
    let mut reservations = Reservations::new();
    let landed = hall(1, NATURAL);
    let before = world_with(vec![landed.clone()]);
    reservations.reserve_expansion(&before, UnitTag::new(1), NATURAL);
    assert_eq!(reservations.expansion_of(&before, UnitTag::new(1)), Some(NATURAL));

    let after = world_with(Vec::new());

    assert_eq!(
        reservations.expansion_of(&after, UnitTag::new(1)),
        None,
        "a destroyed hall is not reported before any purging read"
    );
    assert!(
        !reservations.is_at_expansion(&after, &landed),
        "a stale snapshot of the hall does not count as standing on its base"
    );
    assert!(!reservations.is_reserved(&after, NATURAL));
}
