/// Inventory and equipment behaviour seen through a full world.
mod helpers;

use dungeon_crawl::ecs::*;
use dungeon_crawl::inventory;
use dungeon_crawl::items::{EquipmentSlot, Item};
use helpers::TestWorldBuilder;
use pretty_assertions::assert_eq;

#[test]
fn test_eleventh_item_is_rejected() {
    let mut builder = TestWorldBuilder::open(20, 3).with_player(0, 0);
    let player = builder.player();
    let mut stones = Vec::new();
    for x in 1..=11 {
        let (next, stone) = builder.with_item(Item::consumable("Stone"), x, 1);
        builder = next;
        stones.push(stone);
    }
    let mut world = builder.build();
    let ecs = world.ecs();

    for (i, stone) in stones.iter().enumerate() {
        let added = inventory::add_item(&mut ecs.world, &mut ecs.resources, player, *stone).unwrap();
        assert_eq!(added, i < 10, "item #{}", i + 1);
    }

    let bag = ecs.component::<Inventory>(player).unwrap();
    assert_eq!(bag.items, &stones[..10]);
    // The rejected stone is still on the floor.
    assert_eq!(world.pos(stones[10]), (11, 1));
}

#[test]
fn test_first_weapon_is_auto_held_only_when_hand_is_empty() {
    let builder = TestWorldBuilder::open(6, 6).with_player(1, 1);
    let player = builder.player();
    let (builder, axe) = builder.with_carried(player, Item::weapon("Axe", 4));
    let (builder, sword) = builder.with_carried(player, Item::weapon("Sword", 5));
    let world = builder.build();

    let equipment = world.scheduler.ecs.component::<Equipment>(player).unwrap();
    assert_eq!(equipment.get(EquipmentSlot::RightHand), Some(axe));
    assert_eq!(equipment.slot_of(sword), None);
    assert!(world.log().contains("You are now holding a Axe"));
    assert!(!world.log().contains("You are now holding a Sword"));
}

#[test]
fn test_drop_then_pick_up_restores_inventory_and_slot() {
    let builder = TestWorldBuilder::open(6, 6).with_player(2, 2);
    let player = builder.player();
    let (builder, mace) = builder.with_carried(player, Item::weapon("Mace", 3));
    let mut world = builder.build();
    let before_bag = world.scheduler.ecs.component::<Inventory>(player).unwrap();
    let before_gear = world.scheduler.ecs.component::<Equipment>(player).unwrap();

    let ecs = world.ecs();
    assert!(inventory::drop_item(&mut ecs.world, &mut ecs.resources, player, mace, None).unwrap());
    assert!(!inventory::is_equipped(&ecs.world, player, mace));
    assert_eq!(world.pos(mace), (2, 2));

    let ecs = world.ecs();
    let picked = inventory::pick_up_at(&mut ecs.world, &mut ecs.resources, player, 2, 2).unwrap();
    assert_eq!(picked, Some(mace));
    assert_eq!(ecs.component::<Inventory>(player).unwrap(), before_bag);
    assert_eq!(ecs.component::<Equipment>(player).unwrap(), before_gear);
    assert!(ecs.world.get::<&Position>(mace).is_err());
}

#[test]
fn test_drop_at_chosen_cell_blocks_movement_there() {
    let builder = TestWorldBuilder::open(6, 6).with_player(2, 2);
    let player = builder.player();
    let (builder, sack) = builder.with_carried(player, Item::consumable("Sack"));
    let mut world = builder.build();

    let ecs = world.ecs();
    inventory::drop_item(&mut ecs.world, &mut ecs.resources, player, sack, Some((3, 2))).unwrap();
    world.push(player, Intent::Move { x: 3, y: 2 });
    world.tick();

    assert_eq!(world.pos(player), (2, 2));
    assert_eq!(
        world.scheduler.ecs.resources.intents.resolved()[0].resolution,
        Resolution::Rejected
    );
}

#[test]
fn test_pick_up_on_empty_cell_returns_none() {
    let mut world = TestWorldBuilder::open(4, 4).with_player(1, 1).build();
    let player = world.player;
    let ecs = world.ecs();
    assert_eq!(
        inventory::pick_up_at(&mut ecs.world, &mut ecs.resources, player, 1, 1).unwrap(),
        None
    );
}
