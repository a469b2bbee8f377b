use std::collections::{BTreeMap, BTreeSet};

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use vanguard_core::{
    AbilityId, Alliance, Command, CommandBatch, OrderTarget, Point, UnitKind, UnitSnapshot,
    UnitTag,
};
use vanguard_system_attack_waves::{
    cluster_by_sight, enemies_in_bases, enemy_cluster_at_home, kill_changelings,
    most_threatened_base, AttackWave, AttackWaves, WaveConfig,
};
use vanguard_system_reservations::Reservations;
use vanguard_world::{Locations, TerrainGrid, World, WorldBuilder};

const HALL: UnitTag = UnitTag::new(1);
const START: Point = Point::new(20.5, 20.5);
const ENEMY_START: Point = Point::new(100.5, 100.5);

fn own(tag: u64, kind: UnitKind, x: f32, y: f32) -> UnitSnapshot {
    UnitSnapshot::new(UnitTag::new(tag), kind, Alliance::Own, Point::new(x, y))
}

fn enemy(tag: u64, kind: UnitKind, x: f32, y: f32) -> UnitSnapshot {
    UnitSnapshot::new(UnitTag::new(tag), kind, Alliance::Enemy, Point::new(x, y))
}

fn marine(tag: u64, x: f32, y: f32) -> UnitSnapshot {
    own(tag, UnitKind::Marine, x, y)
}

fn locations() -> Locations {
    Locations::new(START, ENEMY_START).with_enemy_expansions(vec![
        Point::new(90.5, 60.5),
        Point::new(60.5, 90.5),
    ])
}

fn world_with(units: Vec<UnitSnapshot>) -> World {
    WorldBuilder::new(TerrainGrid::open(128, 128), locations())
        .units(units)
        .build()
}

fn home(units: Vec<UnitSnapshot>) -> (World, Reservations) {
    let mut all = vec![own(1, UnitKind::CommandCenter, START.x(), START.y())];
    all.extend(units);
    let world = world_with(all);
    let mut reservations = Reservations::new();
    reservations.initialize(&world);
    (world, reservations)
}

fn tags(values: &[u64]) -> Vec<UnitTag> {
    values.iter().copied().map(UnitTag::new).collect()
}

fn rng() -> ChaCha8Rng {
    ChaCha8Rng::seed_from_u64(7)
}

fn attack_orders(out: &CommandBatch) -> Vec<UnitTag> {
    out.iter()
        .filter_map(|command| match command {
            Command::Ability {
                unit,
                ability: AbilityId::Attack,
                ..
            } => Some(*unit),
            _ => None,
        })
        .collect()
}

#[test]
fn wave_without_survivors_is_disbanded() {
    let (world, reservations) = home(Vec::new());
    let mut waves = AttackWaves::new();
    assert!(waves.form(AttackWave::new(tags(&[10, 11]), ENEMY_START)));

    let mut out = CommandBatch::new();
    waves.handle(
        &world,
        &reservations,
        &mut rng(),
        &WaveConfig::default(),
        &mut out,
    );

    assert!(waves.is_empty(), "a wave whose members all died is removed");
    assert!(waves.units(&world).is_empty());
    assert!(out.is_empty());
}

#[test]
fn trim_keeps_survivors_only() {
    let (world, _) = home(vec![marine(10, 60.0, 60.0)]);
    let mut wave = AttackWave::new(tags(&[10, 11]), ENEMY_START);

    assert!(wave.trim(&world));
    assert_eq!(wave.members().iter().copied().collect::<Vec<_>>(), tags(&[10]));
}

#[test]
fn advance_does_not_repeat_orders() {
    let (world, _) = home(vec![
        marine(10, 60.0, 60.0),
        marine(11, 61.0, 60.0)
            .with_order(AbilityId::Attack, OrderTarget::Point(ENEMY_START)),
    ]);
    let wave = AttackWave::new(tags(&[10, 11]), ENEMY_START);
    let mut out = CommandBatch::new();

    wave.advance(&world, &BTreeSet::new(), &mut out);
    wave.advance(&world, &BTreeSet::new(), &mut out);

    assert_eq!(
        attack_orders(&out),
        tags(&[10]),
        "only the marine not yet attacking the target is ordered, once"
    );
}

#[test]
fn dispersed_members_regroup_instead_of_advancing() {
    let target = Point::new(62.0, 82.0);
    let (world, _) = home(vec![
        marine(10, 50.0, 50.0),
        marine(11, 50.0, 50.0),
        marine(12, 50.0, 50.0),
        marine(13, 80.0, 50.0),
        marine(14, 80.0, 50.0),
    ]);
    let wave = AttackWave::new(tags(&[10, 11, 12, 13, 14]), target);
    let mut out = CommandBatch::new();

    let regrouping = wave.recenter(&world, &WaveConfig::default(), &mut out);
    wave.advance(&world, &regrouping, &mut out);

    assert_eq!(regrouping.into_iter().collect::<Vec<_>>(), tags(&[13, 14]));
    let rally = Point::new(62.0, 51.0);
    for tag in tags(&[13, 14]) {
        let orders: Vec<&Command> = out.for_unit(tag).collect();
        assert_eq!(
            orders,
            vec![&Command::Ability {
                unit: tag,
                ability: AbilityId::Move,
                target: OrderTarget::Point(rally),
                queued: false,
            }],
            "stragglers move to the centroid, one step toward the target"
        );
    }
    assert_eq!(attack_orders(&out), tags(&[10, 11, 12]));
}

#[test]
fn tolerated_dispersion_is_left_alone() {
    let (world, _) = home(vec![
        marine(10, 50.0, 50.0),
        marine(11, 50.0, 50.0),
        marine(12, 50.0, 50.0),
        marine(13, 50.0, 50.0),
        marine(14, 50.0, 50.0),
        marine(15, 90.0, 50.0),
    ]);
    let wave = AttackWave::new(tags(&[10, 11, 12, 13, 14, 15]), ENEMY_START);
    let mut out = CommandBatch::new();

    let regrouping = wave.recenter(&world, &WaveConfig::default(), &mut out);

    assert!(regrouping.is_empty(), "one straggler in six is tolerated");
    assert!(out.is_empty());
}

#[test]
fn home_cluster_outranks_nearer_structure() {
    let (world, reservations) = home(vec![
        marine(10, 60.0, 60.0),
        enemy(50, UnitKind::Zergling, 25.0, 20.0),
        enemy(51, UnitKind::Zergling, 27.0, 20.0),
        enemy(60, UnitKind::Hatchery, 66.0, 66.0),
    ]);
    let mut wave = AttackWave::new(tags(&[10]), Point::new(60.0, 60.0));

    wave.retarget(&world, &reservations, &mut rng(), &WaveConfig::default());

    assert_eq!(
        wave.target(),
        Point::new(26.0, 20.0),
        "the enemy cluster at home is defended before anything else"
    );
}

#[test]
fn nearest_structure_beats_nearest_unit() {
    let (world, reservations) = home(vec![
        marine(10, 60.0, 60.0),
        enemy(50, UnitKind::Zergling, 62.0, 60.0),
        enemy(60, UnitKind::Hatchery, 70.0, 70.0),
        enemy(61, UnitKind::Pylon, 90.0, 90.0),
    ]);
    let mut wave = AttackWave::new(tags(&[10]), Point::new(60.0, 60.0));

    wave.retarget(&world, &reservations, &mut rng(), &WaveConfig::default());

    assert_eq!(wave.target(), Point::new(70.0, 70.0));
}

#[test]
fn empty_map_sends_wave_to_a_known_expansion() {
    let (world, reservations) = home(vec![marine(10, 60.0, 60.0)]);
    let mut wave = AttackWave::new(tags(&[10]), Point::new(60.0, 60.0));

    wave.retarget(&world, &reservations, &mut rng(), &WaveConfig::default());

    assert!(
        locations().enemy_expansions().contains(&wave.target()),
        "with no enemy in sight the wave scouts an enemy expansion, got {}",
        wave.target()
    );
}

#[test]
fn distant_wave_keeps_its_target() {
    let (world, reservations) = home(vec![
        marine(10, 60.0, 60.0),
        enemy(60, UnitKind::Hatchery, 62.0, 62.0),
    ]);
    let mut wave = AttackWave::new(tags(&[10]), ENEMY_START);

    wave.retarget(&world, &reservations, &mut rng(), &WaveConfig::default());

    assert_eq!(wave.target(), ENEMY_START);
}

#[test]
fn sight_cluster_grows_transitively() {
    let units = [
        enemy(1, UnitKind::Zergling, 0.0, 0.0),
        enemy(2, UnitKind::Zergling, 7.0, 0.0),
        enemy(3, UnitKind::Zergling, 14.0, 0.0),
        enemy(4, UnitKind::Zergling, 30.0, 0.0),
    ];
    let refs: Vec<&UnitSnapshot> = units.iter().collect();

    let cluster = cluster_by_sight(refs[0], &refs);

    let members: Vec<UnitTag> = cluster.iter().map(|unit| unit.tag).collect();
    assert_eq!(
        members,
        tags(&[1, 2, 3]),
        "units chained within sight join, the distant one does not"
    );
}

#[test]
fn threat_ties_go_to_smallest_hall() {
    let first = enemy(50, UnitKind::Zergling, 0.0, 0.0);
    let second = enemy(51, UnitKind::Zergling, 0.0, 0.0);
    let mut bases: BTreeMap<UnitTag, Vec<&UnitSnapshot>> = BTreeMap::new();
    let _ = bases.insert(UnitTag::new(9), vec![&second]);
    let _ = bases.insert(UnitTag::new(3), vec![&first]);
    let _ = bases.insert(UnitTag::new(5), Vec::new());

    let (hall, enemies) = most_threatened_base(&bases).expect("a base is threatened");

    assert_eq!(hall, UnitTag::new(3));
    assert_eq!(enemies.len(), 1);
}

#[test]
fn base_extends_to_buildings_in_sight_of_the_hall() {
    let (world, reservations) = home(vec![
        own(2, UnitKind::SupplyDepot, 28.5, 20.5),
        enemy(50, UnitKind::Zergling, 40.0, 20.5),
        enemy(51, UnitKind::Zergling, 60.0, 20.5),
    ]);

    let bases = enemies_in_bases(&world, &reservations, WaveConfig::default().detection_radius);

    let intruders: Vec<UnitTag> = bases
        .get(&HALL)
        .map(|enemies| enemies.iter().map(|enemy| enemy.tag).collect())
        .unwrap_or_default();
    assert_eq!(
        intruders,
        tags(&[50]),
        "an enemy near a depot in sight of the hall threatens the base"
    );
}

#[test]
fn no_home_cluster_without_intruders() {
    let (world, reservations) = home(vec![enemy(50, UnitKind::Zergling, 90.0, 90.0)]);

    assert!(enemy_cluster_at_home(&world, &reservations, 13.0).is_empty());
}

#[test]
fn available_marines_exclude_wave_members_and_unfinished_ones() {
    let (world, _) = home(vec![
        marine(10, 30.0, 30.0),
        marine(11, 30.0, 30.0),
        marine(12, 30.0, 30.0).with_build_progress(0.5),
    ]);
    let mut waves = AttackWaves::new();
    assert!(waves.form(AttackWave::new(tags(&[10]), ENEMY_START)));

    let available: Vec<UnitTag> = waves
        .available_marines(&world)
        .into_iter()
        .map(|marine| marine.tag)
        .collect();

    assert_eq!(available, tags(&[11]));
}

#[test]
fn marines_shoot_changelings_they_can_see() {
    let (world, _) = home(vec![
        marine(10, 40.0, 40.0),
        marine(11, 60.0, 60.0),
        enemy(50, UnitKind::Changeling, 44.0, 40.0),
        enemy(51, UnitKind::Changeling, 42.0, 40.0),
        enemy(52, UnitKind::Zergling, 61.0, 60.0),
    ]);
    let mut out = CommandBatch::new();

    kill_changelings(&world, &mut out);

    let orders: Vec<&Command> = out.iter().collect();
    assert_eq!(
        orders,
        vec![&Command::Ability {
            unit: UnitTag::new(10),
            ability: AbilityId::Attack,
            target: OrderTarget::Unit(UnitTag::new(51)),
            queued: false,
        }],
        "only the marine with a changeling in sight fires, at the closest one"
    );
}
