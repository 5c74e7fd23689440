//! Headless demo: builds a small level, walks the player across it and
//! prints the action log. Pass a JSON config path as the first argument to
//! override the defaults.

use anyhow::{Context, Result};
use tracing_subscriber::EnvFilter;

use dungeon_crawl::dungeon::GridMap;
use dungeon_crawl::ecs::{ECSWorld, GameConfig, InteractionMode};
use dungeon_crawl::entity_factory::EntityFactory;
use dungeon_crawl::inventory;
use dungeon_crawl::items::{Item, ItemEffect};
use dungeon_crawl::turn_system::TurnScheduler;

const DEMO_LEVEL: [&str; 9] = [
    "####################",
    "#..........#.......#",
    "#..........#.......#",
    "#..~~~.....#.......#",
    "#..~~~.............#",
    "#..........#.......#",
    "#..........#.......#",
    "#..........#.......#",
    "####################",
];

const MAX_TURNS: u32 = 40;

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .compact()
        .init();
}

fn load_config() -> Result<GameConfig> {
    match std::env::args().nth(1) {
        Some(path) => GameConfig::load(&path).with_context(|| format!("loading config from {path}")),
        None => Ok(GameConfig::default()),
    }
}

fn main() -> Result<()> {
    init_tracing();
    let config = load_config()?;
    let mut ecs = ECSWorld::new(GridMap::from_ascii(&DEMO_LEVEL), config);

    let factory = EntityFactory::new();
    let player = factory.create_player(&mut ecs, 2, 2);
    let spear = factory.create_loose_item(&mut ecs, Item::weapon("Spear", 3));
    inventory::add_item(&mut ecs.world, &mut ecs.resources, player, spear)?;
    factory.create_item(
        &mut ecs,
        Item::consumable("Chilli").with_effect(ItemEffect::RaiseHealth, 5),
        6,
        6,
    );

    factory.create_monster(&mut ecs, 16, 2, "goblin");
    let archer = factory.create_monster(&mut ecs, 16, 6, "archer");
    let bow = factory.create_loose_item(&mut ecs, Item::launcher("Bow", 2, "arrow"));
    inventory::add_item(&mut ecs.world, &mut ecs.resources, archer, bow)?;
    for _ in 0..3 {
        let arrow = factory.create_loose_item(
            &mut ecs,
            Item::ammunition("Arrow", "arrow").with_effect(ItemEffect::HitDamage, 1),
        );
        inventory::add_item(&mut ecs.world, &mut ecs.resources, archer, arrow)?;
    }

    let mut scheduler = TurnScheduler::new(ecs);
    scheduler.walk_to(14, 4).context("planning the walk")?;

    for _ in 0..MAX_TURNS {
        scheduler.tick()?;
        if scheduler.is_player_dead()? {
            println!("You died on turn {}.", scheduler.turn());
            break;
        }
        if scheduler.mode() == InteractionMode::Playing && scheduler.turn() % 10 == 0 {
            // idle for a while, then head back west
            scheduler.walk_to(2, 6)?;
        }
    }

    for line in scheduler.ecs.resources.log.entries() {
        println!("{line}");
    }
    println!("-- {} turns, mode {}", scheduler.turn(), scheduler.mode());
    Ok(())
}
