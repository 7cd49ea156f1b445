use rand::rngs::SmallRng;
use rand::SeedableRng;

use skirmish::dsl::{check, parse_dsl};
use skirmish::engine::battle::BattleMode;
use skirmish::engine::{moves, BattleEngine};
use skirmish::schema::battle::Battle;
use skirmish::schema::mv::{Move, MoveSet};
use skirmish::schema::stats::Buff;
use skirmish::schema::volatile::FighterVolatile;

fn fighter(hp: i32, attack: i32, defense: i32, charge: i32, charge_cap: i32) -> FighterVolatile {
    FighterVolatile::test_stub(hp, attack, defense, charge, charge_cap)
}

fn single_move(json: &str) -> MoveSet {
    let moves: Vec<Move> = serde_json::from_str(json).unwrap();
    MoveSet::try_from(moves).unwrap()
}

#[test]
fn scenario_basic_damage() {
    let catalogue = single_move(
        r#"[{"id":"tackle","type":"none","amount":80,"mult":1.0,"flat":0,"actions":[{"id":"damage"}]}]"#,
    );
    let mut battle = Battle::from_sides(
        "b",
        vec![
            vec![fighter(300, 100, 0, 0, 0)],
            vec![fighter(300, 0, 100, 0, 0)],
        ],
        None,
    )
    .unwrap();
    let mut rng = SmallRng::seed_from_u64(42);
    moves::execute(&mut battle.context, &catalogue, (0, 0), "tackle", (1, 0), None, &mut rng).unwrap();
    assert_eq!(battle.context.sides[1][0].current_stats.hp, 220);
}

#[test]
fn scenario_charge_bonus() {
    let catalogue = single_move(
        r#"[{"id":"tackle","type":"none","amount":80,"mult":1.0,"flat":0,"actions":[{"id":"damage"}]}]"#,
    );
    let mut battle = Battle::from_sides(
        "b",
        vec![
            vec![fighter(300, 100, 0, 999, 999)],
            vec![fighter(300, 0, 100, 0, 0)],
        ],
        None,
    )
    .unwrap();
    let mut rng = SmallRng::seed_from_u64(42);
    moves::execute(&mut battle.context, &catalogue, (0, 0), "tackle", (1, 0), None, &mut rng).unwrap();
    assert_eq!(battle.context.sides[1][0].current_stats.hp, 180);
}

#[test]
fn scenario_buff_expiry_after_full_turn() {
    let mut engine = BattleEngine::new(
        Battle::from_sides("b", vec![vec![fighter(300, 100, 10, 0, 0)], vec![fighter(300, 100, 10, 0, 0)]], None)
            .unwrap(),
        BattleMode::Auto,
    );
    engine
        .battle
        .context
        .sides[0][0]
        .apply_buff(Buff::new("attack", 50.0, 1));
    assert_eq!(engine.battle.context.sides[0][0].buffed_max_stats.attack, 150);

    // one full turn: every fighter across both sides acts once.
    engine.advance_active_fighter();
    engine.advance_active_fighter();

    assert!(engine.battle.context.sides[0][0].current_buffs.is_empty());
    assert_eq!(engine.battle.context.sides[0][0].buffed_max_stats.attack, 100);
}

#[test]
fn scenario_proportional_rebalance() {
    let mut f = fighter(300, 100, 10, 0, 0);
    f.current_stats.hp = 150;
    f.apply_buff(Buff::new("hp", 100.0, -1));
    assert_eq!(f.buffed_max_stats.hp, 400);
    assert_eq!(f.current_stats.hp, 200);

    // an infinite (-1) buff never expires via tick_buffs; removing it
    // explicitly (e.g. a dispel) is the "removing the buff" step below.
    f.remove_buffs_on("hp");
    assert_eq!(f.buffed_max_stats.hp, 300);
    assert_eq!(f.current_stats.hp, 200);
}

#[test]
fn scenario_max_turns_ends_battle() {
    let mut engine = BattleEngine::new(
        Battle::from_sides(
            "b",
            vec![vec![fighter(300, 10, 10, 0, 0)], vec![fighter(300, 10, 10, 0, 0)]],
            Some(2),
        )
        .unwrap(),
        BattleMode::Auto,
    );
    assert!(!engine.battle.is_battle_over());
    for _ in 0..4 {
        engine.advance_active_fighter();
    }
    assert_eq!(engine.battle.context.turn, 2);
    assert!(engine.battle.is_battle_over());
}

#[test]
fn scenario_random_dsl_check() {
    let x = parse_dsl("r[0,10]").unwrap();
    let domain = x.domain();
    check(&[("x", &domain)], |vars| {
        let v = vars["x"].as_f64().unwrap();
        (0.0..=10.0).contains(&v)
    })
    .unwrap();

    let y = parse_dsl("r[20,30]").unwrap();
    let domain = y.domain();
    let result = check(&[("x", &domain)], |vars| vars["x"].as_f64().unwrap() < 10.0);
    assert!(result.is_err());
}

#[test]
fn boundary_piercing_one_ignores_defense() {
    let catalogue = single_move(
        r#"[{"id":"pierce","type":"none","amount":80,"actions":[{"id":"damage","piercing":1.0}]}]"#,
    );
    let mut battle = Battle::from_sides(
        "b",
        vec![vec![fighter(300, 100, 0, 0, 0)], vec![fighter(300, 0, 999, 0, 0)]],
        None,
    )
    .unwrap();
    let mut rng = SmallRng::seed_from_u64(1);
    moves::execute(&mut battle.context, &catalogue, (0, 0), "pierce", (1, 0), None, &mut rng).unwrap();
    // with defense fully pierced, damage should equal the undefended case.
    assert!(battle.context.sides[1][0].current_stats.hp < 300);
}

#[test]
fn boundary_zero_chance_move_never_executes() {
    let catalogue = single_move(
        r#"[{"id":"never","type":"none","amount":80,"chance":0.0,"actions":[{"id":"damage"}]}]"#,
    );
    let mut battle = Battle::from_sides(
        "b",
        vec![vec![fighter(300, 100, 0, 0, 0)], vec![fighter(300, 0, 100, 0, 0)]],
        None,
    )
    .unwrap();
    let mut rng = SmallRng::seed_from_u64(9);
    let hit = moves::execute(&mut battle.context, &catalogue, (0, 0), "never", (1, 0), None, &mut rng).unwrap();
    assert!(!hit);
    assert_eq!(battle.context.sides[1][0].current_stats.hp, 300);
}

#[test]
fn boundary_weighted_single_entry_always_resolves() {
    let r = parse_dsl("wl[(7,1)]").unwrap();
    for _ in 0..20 {
        assert_eq!(r.resolve_i64(), Some(7));
    }
}
