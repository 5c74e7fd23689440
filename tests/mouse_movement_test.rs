/// Walk-to requests: path planning, one step per tick, mode bookkeeping.
mod helpers;

use dungeon_crawl::ecs::*;
use dungeon_crawl::items::Item;
use helpers::TestWorldBuilder;
use pretty_assertions::assert_eq;

const CORRIDOR: [&str; 3] = ["#########", "#.......#", "#########"];

#[test]
fn test_walk_follows_path_and_returns_to_playing() {
    let mut world = TestWorldBuilder::new(&CORRIDOR).with_player(1, 1).build();
    let player = world.player;

    assert!(world.scheduler.walk_to(4, 1).unwrap());
    assert_eq!(world.scheduler.mode(), InteractionMode::Moving);
    assert!(world.has::<MouseMovement>(player));

    world.tick();
    assert_eq!(world.pos(player), (2, 1));
    assert_eq!(world.scheduler.mode(), InteractionMode::Moving);
    world.tick();
    assert_eq!(world.pos(player), (3, 1));
    world.tick();
    assert_eq!(world.pos(player), (4, 1));

    assert_eq!(world.scheduler.mode(), InteractionMode::Playing);
    assert!(!world.has::<MouseMovement>(player));
    assert!(world.scheduler.ecs.resources.looking_path.is_empty());
}

#[test]
fn test_blocked_step_abandons_the_walk() {
    let mut world = TestWorldBuilder::new(&CORRIDOR).with_player(1, 1).build();
    let player = world.player;
    assert!(world.scheduler.walk_to(6, 1).unwrap());

    // Something lands in the corridor after the path was planned.
    dungeon_crawl::entity_factory::EntityFactory::new().create_item(
        world.ecs(),
        Item::consumable("Barrel"),
        3,
        1,
    );

    world.tick();
    assert_eq!(world.pos(player), (2, 1));
    world.tick(); // bumps into the barrel
    assert_eq!(world.pos(player), (2, 1));
    assert_eq!(world.scheduler.mode(), InteractionMode::Moving);

    world.tick();
    assert_eq!(world.scheduler.mode(), InteractionMode::Playing);
    assert!(!world.has::<MouseMovement>(player));
    assert_eq!(world.pos(player), (2, 1));
}

#[test]
fn test_slow_walker_waits_for_energy_instead_of_giving_up() {
    let mut world = TestWorldBuilder::new(&CORRIDOR).with_player(1, 1).build();
    let player = world.player;
    world.edit_attrs(player, |a| a.speed = 50);
    assert!(world.scheduler.walk_to(6, 1).unwrap());

    world.tick_n(2);
    assert_eq!(world.pos(player), (2, 1));
    assert_eq!(world.scheduler.mode(), InteractionMode::Moving);
    assert!(world.has::<MouseMovement>(player));

    world.tick_n(10);
    assert_eq!(world.pos(player), (6, 1));
    assert_eq!(world.scheduler.mode(), InteractionMode::Playing);
    assert!(!world.has::<MouseMovement>(player));
}

#[test]
fn test_unreachable_goal_keeps_playing() {
    let rows = ["#######", "#..#..#", "#######"];
    let mut world = TestWorldBuilder::new(&rows).with_player(1, 1).build();
    assert!(!world.scheduler.walk_to(5, 1).unwrap());
    assert_eq!(world.scheduler.mode(), InteractionMode::Playing);
    assert!(!world.has::<MouseMovement>(world.player));
}

#[test]
fn test_cancel_stops_a_walk_in_progress() {
    let mut world = TestWorldBuilder::new(&CORRIDOR).with_player(1, 1).build();
    let player = world.player;
    world.scheduler.walk_to(7, 1).unwrap();
    world.tick();
    world.scheduler.cancel().unwrap();
    world.tick();

    assert_eq!(world.pos(player), (2, 1));
    assert_eq!(world.scheduler.mode(), InteractionMode::Playing);
}

#[test]
fn test_walk_from_looking_mode() {
    let mut world = TestWorldBuilder::new(&CORRIDOR).with_player(1, 1).build();
    world.scheduler.open_looking().unwrap();
    assert_eq!(world.scheduler.mode(), InteractionMode::Looking);
    assert!(world.scheduler.walk_to(2, 1).unwrap());
    world.tick();
    assert_eq!(world.pos(world.player), (2, 1));
    assert_eq!(world.scheduler.mode(), InteractionMode::Playing);
}
