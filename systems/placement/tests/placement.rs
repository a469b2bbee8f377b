use vanguard_core::{
    AbilityId, Alliance, BuildingSize, Point, UnitKind, UnitSnapshot, UnitTag,
};
use vanguard_system_placement::{PlacementConfig, PlacementSearch};
use vanguard_world::{Locations, TerrainGrid, World, WorldBuilder};

fn world_with(units: Vec<UnitSnapshot>) -> World {
    WorldBuilder::new(
        TerrainGrid::open(96, 96),
        Locations::new(Point::new(20.5, 20.5), Point::new(80.5, 80.5)),
    )
    .units(units)
    .build()
}

fn own(tag: u64, kind: UnitKind, x: f32, y: f32) -> UnitSnapshot {
    UnitSnapshot::new(UnitTag::new(tag), kind, Alliance::Own, Point::new(x, y))
}

fn anywhere(_: AbilityId, _: Point) -> bool {
    true
}

#[test]
fn anchor_is_tried_first() {
    let world = world_with(Vec::new());
    let search = PlacementSearch::default();

    let spot = search.find_spot(
        &world,
        &anywhere,
        Point::new(30.7, 30.2),
        BuildingSize::S2x2,
        UnitKind::SupplyDepot,
        AbilityId::BuildSupplyDepot,
    );

    assert_eq!(
        spot,
        Some(Point::new(30.0, 30.0)),
        "a valid anchor is returned rounded down to the grid"
    );
}

#[test]
fn blocked_anchor_falls_back_to_ring_top_left() {
    let world = world_with(Vec::new());
    let search = PlacementSearch::default();
    let blocked = |_: AbilityId, point: Point| point != Point::new(30.0, 30.0);

    let spot = search.find_spot(
        &world,
        &blocked,
        Point::new(30.0, 30.0),
        BuildingSize::S2x2,
        UnitKind::SupplyDepot,
        AbilityId::BuildSupplyDepot,
    );

    assert_eq!(
        spot,
        Some(Point::new(29.0, 31.0)),
        "the ring-1 top-left neighbour is the first candidate after the anchor"
    );
}

#[test]
fn ring_edges_are_scanned_clockwise_from_top_left() {
    let world = world_with(Vec::new());
    let search = PlacementSearch::default();
    let only_sides = |_: AbilityId, point: Point| {
        point == Point::new(31.0, 30.0) || point == Point::new(29.0, 30.0)
    };

    let spot = search.find_spot(
        &world,
        &only_sides,
        Point::new(30.0, 30.0),
        BuildingSize::S2x2,
        UnitKind::SupplyDepot,
        AbilityId::BuildSupplyDepot,
    );

    assert_eq!(
        spot,
        Some(Point::new(31.0, 30.0)),
        "the right edge is visited before the left edge"
    );
}

#[test]
fn exhausted_search_returns_none() {
    let world = world_with(Vec::new());
    let search = PlacementSearch::new(PlacementConfig { max_distance: 3 });
    let nowhere = |_: AbilityId, _: Point| false;

    assert_eq!(
        search.find_spot(
            &world,
            &nowhere,
            Point::new(30.0, 30.0),
            BuildingSize::S3x3,
            UnitKind::Barracks,
            AbilityId::BuildBarracks,
        ),
        None
    );
}

#[test]
fn ordinary_kind_may_not_touch_foreign_structure() {
    let world = world_with(vec![own(1, UnitKind::Barracks, 20.5, 20.5)]);
    let search = PlacementSearch::default();

    assert!(
        !search.is_valid(
            &world,
            &anywhere,
            Point::new(23.5, 20.5),
            BuildingSize::S3x3,
            UnitKind::EngineeringBay,
            AbilityId::BuildEngineeringBay,
        ),
        "an engineering bay flush against a barracks is rejected"
    );
    assert!(
        search.is_valid(
            &world,
            &anywhere,
            Point::new(24.5, 20.5),
            BuildingSize::S3x3,
            UnitKind::EngineeringBay,
            AbilityId::BuildEngineeringBay,
        ),
        "one free column between the footprints is enough"
    );
}

#[test]
fn touchy_kind_may_touch_a_single_foreign_kind() {
    let world = world_with(vec![
        own(1, UnitKind::Barracks, 20.5, 20.5),
        own(2, UnitKind::SupplyDepot, 23.0, 23.0),
    ]);
    let search = PlacementSearch::default();

    assert!(
        search.is_valid(
            &world,
            &anywhere,
            Point::new(23.0, 20.0),
            BuildingSize::S2x2,
            UnitKind::SupplyDepot,
            AbilityId::BuildSupplyDepot,
        ),
        "a depot may lean on a barracks and on other depots"
    );
}

#[test]
fn touchy_kind_rejects_two_foreign_kinds() {
    let world = world_with(vec![
        own(1, UnitKind::Barracks, 20.5, 20.5),
        own(2, UnitKind::Bunker, 25.5, 20.5),
    ]);
    let search = PlacementSearch::default();

    assert!(
        !search.is_valid(
            &world,
            &anywhere,
            Point::new(23.0, 20.0),
            BuildingSize::S2x2,
            UnitKind::SupplyDepot,
            AbilityId::BuildSupplyDepot,
        ),
        "a depot wedged between a barracks and a bunker is rejected"
    );
}

#[test]
fn mining_path_stays_free() {
    let world = world_with(vec![
        own(1, UnitKind::CommandCenter, 20.5, 20.5),
        UnitSnapshot::new(
            UnitTag::new(2),
            UnitKind::MineralField,
            Alliance::Neutral,
            Point::new(20.5, 28.5),
        )
        .with_minerals(1500),
    ]);
    let search = PlacementSearch::default();

    assert!(
        !search.is_valid(
            &world,
            &anywhere,
            Point::new(20.0, 25.0),
            BuildingSize::S2x2,
            UnitKind::SupplyDepot,
            AbilityId::BuildSupplyDepot,
        ),
        "a depot between the hall and its minerals is rejected"
    );
    assert!(search.is_valid(
        &world,
        &anywhere,
        Point::new(28.0, 20.0),
        BuildingSize::S2x2,
        UnitKind::SupplyDepot,
        AbilityId::BuildSupplyDepot,
    ));
}

#[test]
fn engine_has_final_word() {
    let world = world_with(Vec::new());
    let search = PlacementSearch::default();
    let refuse = |_: AbilityId, _: Point| false;

    assert!(!search.is_valid(
        &world,
        &refuse,
        Point::new(30.0, 30.0),
        BuildingSize::S2x2,
        UnitKind::SupplyDepot,
        AbilityId::BuildSupplyDepot,
    ));
}
