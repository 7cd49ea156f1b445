//! Interactive demo binary: loads a small sample move/fighter catalogue and
//! drives a battle between two fighters, either interactively or in full
//! `--auto` mode.

use clap::Parser;
use colored::Colorize;
use dialoguer::Select;
use rand::rngs::SmallRng;
use rand::SeedableRng;

use skirmish::engine::{BattleEngine, BattleMode};
use skirmish::registry::Registry;
use skirmish::schema::battle::Battle;
use skirmish::schema::fighter::FighterSet;
use skirmish::schema::mv::MoveSet;
use skirmish::schema::volatile::FighterVolatile;

#[derive(Parser)]
#[command(name = "skirmish-demo", about = "Drive a sample combat encounter")]
struct Args {
    /// Directory containing moves.json / fighters.json
    #[arg(long, default_value = "demos/data")]
    data_dir: String,

    /// Seed for the RNG; omit for a time-derived seed.
    #[arg(long)]
    seed: Option<u64>,

    /// Run to completion without prompting, choosing moves uniformly at random.
    #[arg(long)]
    auto: bool,

    /// Fighter id for the left side.
    #[arg(long)]
    left: Option<String>,

    /// Fighter id for the right side.
    #[arg(long)]
    right: Option<String>,
}

fn build_volatile(fighter: &skirmish::schema::fighter::Fighter) -> FighterVolatile {
    FighterVolatile::new(
        fighter.id.clone(),
        fighter.r#type.clone(),
        fighter.starting_stats,
        fighter.stats,
        fighter.resolve_starting_buffs(),
        fighter.starting_status.clone(),
    )
}

fn pick_target(engine: &BattleEngine, category: &str, user_side: usize) -> (usize, usize) {
    if category == "support" {
        (user_side, engine.battle.context.active_fighter_index)
    } else {
        engine
            .default_target(user_side)
            .unwrap_or((user_side, engine.battle.context.active_fighter_index))
    }
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let args = Args::parse();

    let registry = Registry::new(&args.data_dir);
    registry.add_spec::<MoveSet, _, MoveSet>("moves", "moves.json", |m, _| Ok(m))?;
    registry.add_spec::<FighterSet, _, FighterSet>("fighters", "fighters.json", |f, _| Ok(f))?;

    let catalogue = registry.get::<MoveSet>("moves")?;
    let fighters = registry.get::<FighterSet>("fighters")?;

    let left_id = args.left.unwrap_or_else(|| "debugger".to_string());
    let right_id = args.right.unwrap_or_else(|| "optimizer".to_string());
    let left = fighters
        .get(&left_id)
        .ok_or_else(|| anyhow::anyhow!("unknown fighter: {left_id}"))?;
    let right = fighters
        .get(&right_id)
        .ok_or_else(|| anyhow::anyhow!("unknown fighter: {right_id}"))?;

    println!("{}", format!("{} vs {}", left.name, right.name).bold());

    let battle = Battle::from_sides(
        "demo",
        vec![vec![build_volatile(left)], vec![build_volatile(right)]],
        Some(30),
    )?;
    let mut engine = BattleEngine::new(battle, BattleMode::Auto);
    let seed = args.seed.unwrap_or_else(|| rand::Rng::random(&mut rand::rng()));
    let mut rng = SmallRng::seed_from_u64(seed);

    let move_ids: Vec<Vec<String>> = vec![left.moves.clone(), right.moves.clone()];
    let names: Vec<&str> = vec![&left.id, &right.id];

    while !engine.battle.is_battle_over() {
        let side = engine.battle.context.active_side;
        let fighter_name = names[side];
        let available = engine.available_moves(&catalogue, &move_ids[side], (side, 0), &mut rng);
        if available.is_empty() {
            println!("{} has no usable moves, passing.", fighter_name);
            engine.advance_active_fighter();
            continue;
        }

        // `--auto` leaves move AND target selection entirely to the engine;
        // interactive mode still lets the player pick a move, but otherwise
        // relies on the same default targeting.
        let (chosen_id, target) = if args.auto {
            (None, None)
        } else {
            let selection = Select::new()
                .with_prompt(format!("{fighter_name}'s turn"))
                .items(&available)
                .default(0)
                .interact()?;
            let chosen_id = available[selection].to_string();
            let mv = catalogue
                .get(&chosen_id)
                .ok_or_else(|| anyhow::anyhow!("move disappeared from catalogue: {chosen_id}"))?;
            (Some(chosen_id), Some(pick_target(&engine, &mv.category, side)))
        };
        let hit = engine.step(
            &catalogue,
            &move_ids[side],
            chosen_id.as_deref(),
            target,
            None,
            &mut rng,
        )?;

        for line in engine.battle.context.get_next_logs() {
            if hit {
                println!("{}", line.green());
            } else {
                println!("{}", line.yellow());
            }
        }
    }

    let survivors: Vec<&str> = engine
        .battle
        .context
        .sides
        .iter()
        .enumerate()
        .filter(|(_, side)| side.iter().any(FighterVolatile::alive))
        .map(|(idx, _)| names[idx])
        .collect();

    match survivors.as_slice() {
        [winner] => println!("{}", format!("{winner} wins!").bold().green()),
        _ => println!("{}", "Draw — max turns reached.".bold().red()),
    }

    Ok(())
}
