//! Inventory and equipment helpers.
//!
//! Failed actions (full bag, item not owned) are not errors: the helpers
//! return `false`/`None` and leave the world untouched. A missing
//! `Inventory` on the acting entity is an invariant violation and is
//! reported as [`GameError::MissingComponent`].

use error::{GameError, GameResult};
use hecs::{Entity, World};
use items::{EquipmentSlot, Item, ItemEffect};

use crate::ecs::{Attributes, Equipment, Inventory, Player, Position, Resources};
use crate::spatial::Spatial;

fn is_player(world: &World, entity: Entity) -> bool {
    world.get::<&Player>(entity).is_ok()
}

fn item_name(world: &World, item: Entity) -> GameResult<String> {
    world
        .get::<&Item>(item)
        .map(|i| i.name.clone())
        .map_err(|_| GameError::missing::<Item>(item))
}

fn owns(world: &World, entity: Entity, item: Entity) -> GameResult<bool> {
    world
        .get::<&Inventory>(entity)
        .map(|inv| inv.contains(item))
        .map_err(|_| GameError::missing::<Inventory>(entity))
}

/// Puts `item` into `entity`'s inventory.
///
/// Returns `false` when the inventory is full or already holds the item.
/// The first weapon picked up while the right hand is empty is held
/// automatically.
pub fn add_item(
    world: &mut World,
    resources: &mut Resources,
    entity: Entity,
    item: Entity,
) -> GameResult<bool> {
    let name = item_name(world, item)?;
    let is_weapon = world.get::<&Item>(item).map(|i| i.is_weapon()).unwrap_or(false);
    {
        let mut inventory = world
            .get::<&mut Inventory>(entity)
            .map_err(|_| GameError::missing::<Inventory>(entity))?;
        if inventory.is_full() || inventory.contains(item) {
            tracing::debug!(?entity, item = %name, "item not added");
            return Ok(false);
        }
        inventory.items.push(item);
    }
    // No longer on the floor.
    let _ = world.remove_one::<Position>(item);

    let player = is_player(world, entity);
    if player {
        resources.log.add(format!("You picked up a {name}"));
    }

    let hand_free = world
        .get::<&Equipment>(entity)
        .map(|eq| eq.get(EquipmentSlot::RightHand).is_none())
        .unwrap_or(false);
    if is_weapon && hand_free {
        hold_item(world, entity, item)?;
        if player {
            resources.log.add(format!("You are now holding a {name}"));
        }
    }
    Ok(true)
}

/// Picks up the first item lying on (x, y) on `entity`'s level.
pub fn pick_up_at(
    world: &mut World,
    resources: &mut Resources,
    entity: Entity,
    x: i32,
    y: i32,
) -> GameResult<Option<Entity>> {
    let level = world
        .get::<&Position>(entity)
        .map(|p| p.z)
        .map_err(|_| GameError::missing::<Position>(entity))?;
    let found = Spatial::new(world, resources.dungeon.current_level(), level)
        .items_at(x, y)
        .into_iter()
        .find(|item| *item != entity);

    match found {
        Some(item) if add_item(world, resources, entity, item)? => Ok(Some(item)),
        _ => Ok(None),
    }
}

/// Drops `item` on `position`, or at the entity's feet when `None`.
/// Unequips it first.
pub fn drop_item(
    world: &mut World,
    resources: &mut Resources,
    entity: Entity,
    item: Entity,
    position: Option<(i32, i32)>,
) -> GameResult<bool> {
    if !owns(world, entity, item)? {
        return Ok(false);
    }
    let here = world
        .get::<&Position>(entity)
        .map(|p| (*p).clone())
        .map_err(|_| GameError::missing::<Position>(entity))?;
    let (x, y) = position.unwrap_or(here.xy());
    release_item(world, entity, item, Position::new(x, y, here.z))?;

    if is_player(world, entity) {
        let name = item_name(world, item)?;
        resources.log.add(format!("You dropped a {name}"));
    }
    Ok(true)
}

/// Takes `item` out of the inventory and destroys it.
pub fn remove_item(world: &mut World, entity: Entity, item: Entity) -> GameResult<bool> {
    if !owns(world, entity, item)? {
        return Ok(false);
    }
    unequip(world, entity, item)?;
    take_out(world, entity, item)?;
    let _ = world.despawn(item);
    Ok(true)
}

/// Applies the item's `RaiseHealth`/`RaiseStrength` effects to the eater,
/// then destroys it.
pub fn eat_item(
    world: &mut World,
    resources: &mut Resources,
    entity: Entity,
    item: Entity,
) -> GameResult<bool> {
    if !owns(world, entity, item)? {
        return Ok(false);
    }
    let (name, health, strength) = {
        let details = world
            .get::<&Item>(item)
            .map_err(|_| GameError::missing::<Item>(item))?;
        (
            details.name.clone(),
            details.effect(ItemEffect::RaiseHealth).unwrap_or(0),
            details.effect(ItemEffect::RaiseStrength).unwrap_or(0),
        )
    };
    {
        let mut attrs = world
            .get::<&mut Attributes>(entity)
            .map_err(|_| GameError::missing::<Attributes>(entity))?;
        attrs.health = attrs
            .health
            .saturating_add_signed(health)
            .min(attrs.max_health);
        attrs.strength = attrs.strength.saturating_add_signed(strength);
    }
    if is_player(world, entity) {
        resources.log.add(format!("You ate a {name}"));
    }
    remove_item(world, entity, item)
}

/// Moves an owned item out of the inventory onto the floor without any
/// log line. Used for drops, projectiles and loot.
pub(crate) fn release_item(
    world: &mut World,
    entity: Entity,
    item: Entity,
    at: Position,
) -> GameResult<()> {
    unequip(world, entity, item)?;
    take_out(world, entity, item)?;
    if let Ok(mut details) = world.get::<&mut Item>(item) {
        details.throwing = false;
    }
    world
        .insert_one(item, at)
        .map_err(|_| GameError::missing::<Item>(item))
}

fn take_out(world: &mut World, entity: Entity, item: Entity) -> GameResult<()> {
    let mut inventory = world
        .get::<&mut Inventory>(entity)
        .map_err(|_| GameError::missing::<Inventory>(entity))?;
    inventory.items.retain(|i| *i != item);
    Ok(())
}

/// Places an owned item in the right hand, replacing whatever was there.
pub fn hold_item(world: &mut World, entity: Entity, item: Entity) -> GameResult<bool> {
    if !owns(world, entity, item)? {
        return Ok(false);
    }
    let mut equipment = world
        .get::<&mut Equipment>(entity)
        .map_err(|_| GameError::missing::<Equipment>(entity))?;
    for held in equipment.slots.values_mut() {
        if *held == Some(item) {
            *held = None;
        }
    }
    equipment.slots.insert(EquipmentSlot::RightHand, Some(item));
    Ok(true)
}

pub fn is_equipped(world: &World, entity: Entity, item: Entity) -> bool {
    world
        .get::<&Equipment>(entity)
        .map(|eq| eq.slot_of(item).is_some())
        .unwrap_or(false)
}

/// Clears whichever slot holds `item`. Entities without equipment have
/// nothing to unequip.
pub fn unequip(world: &mut World, entity: Entity, item: Entity) -> GameResult<()> {
    if let Ok(mut equipment) = world.get::<&mut Equipment>(entity) {
        if let Some(slot) = equipment.slot_of(item) {
            equipment.slots.insert(slot, None);
        }
    }
    Ok(())
}

/// The weapon in the right hand, if any.
pub fn held_weapon(world: &World, entity: Entity) -> Option<Entity> {
    let held = world.get::<&Equipment>(entity).ok()?.get(EquipmentSlot::RightHand)?;
    world
        .get::<&Item>(held)
        .ok()
        .filter(|item| item.is_weapon())
        .map(|_| held)
}

fn inventory_items(world: &World, entity: Entity) -> Vec<Entity> {
    world
        .get::<&Inventory>(entity)
        .map(|inv| inv.items.clone())
        .unwrap_or_default()
}

/// The item flagged for throwing, if any.
pub fn throwing_item(world: &World, entity: Entity) -> Option<Entity> {
    inventory_items(world, entity)
        .into_iter()
        .find(|item| world.get::<&Item>(*item).is_ok_and(|i| i.throwing))
}

/// Flags `item` for throwing and clears the flag on everything else the
/// entity carries.
pub fn set_throwing(world: &mut World, entity: Entity, item: Entity) -> GameResult<bool> {
    if !owns(world, entity, item)? {
        return Ok(false);
    }
    for owned in inventory_items(world, entity) {
        if let Ok(mut details) = world.get::<&mut Item>(owned) {
            details.throwing = owned == item;
        }
    }
    Ok(true)
}

pub fn has_ammunition_of_type(world: &World, entity: Entity, ammunition: &str) -> bool {
    ammunition_of_type(world, entity, ammunition).is_some()
}

/// First carried ammunition of the given type, in inventory order.
pub fn ammunition_of_type(world: &World, entity: Entity, ammunition: &str) -> Option<Entity> {
    inventory_items(world, entity)
        .into_iter()
        .find(|item| world.get::<&Item>(*item).is_ok_and(|i| i.is_ammunition_of(ammunition)))
}

/// Ammunition that fits the held launcher, if the entity holds one.
pub fn ammunition_for_held_weapon(world: &World, entity: Entity) -> Option<Entity> {
    let weapon = held_weapon(world, entity)?;
    let ammunition = world.get::<&Item>(weapon).ok()?.ammunition.clone()?;
    ammunition_of_type(world, entity, &ammunition)
}
