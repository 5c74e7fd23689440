use crate::ecs::{
    Actor, Attributes, Brain, ECSWorld, Equipment, Faction, Inventory, Player, Position,
};
use hecs::Entity;
use items::Item;

/// 实体工厂，用于创建各种游戏实体
///
/// Everything is spawned on the current level of `ecs`.
pub struct EntityFactory;

impl EntityFactory {
    pub fn new() -> Self {
        Self
    }

    /// 创建玩家实体，并记录到 `Resources::player`
    pub fn create_player(&self, ecs: &mut ECSWorld, x: i32, y: i32) -> Entity {
        let capacity = ecs.resources.config.inventory_capacity;
        let z = ecs.resources.level();
        let player = ecs.world.spawn((
            Position::new(x, y, z),
            Actor {
                name: "Player".to_string(),
                faction: Faction::Player,
            },
            Player,
            Attributes {
                health: 30,
                max_health: 30,
                strength: 5,
                toughness: 3,
                agility: 12,
                ..Attributes::default()
            },
            Inventory::new(capacity),
            Equipment::default(),
        ));
        ecs.resources.player = Some(player);
        player
    }

    /// 创建怪物实体
    pub fn create_monster(&self, ecs: &mut ECSWorld, x: i32, y: i32, monster_type: &str) -> Entity {
        let (name, health, strength, toughness, agility, speed) = match monster_type {
            "rat" => ("Rat", 6, 2, 0, 14, 100),
            "bat" => ("Bat", 4, 1, 0, 16, 100),
            "goblin" => ("Goblin", 15, 4, 1, 10, 100),
            "archer" => ("Goblin Archer", 12, 3, 1, 12, 100),
            "ogre" => ("Ogre", 40, 8, 4, 6, 50),
            _ => ("Monster", 10, 3, 1, 10, 100),
        };
        let faction = match monster_type {
            "bat" => Faction::Neutral,
            _ => Faction::Enemy,
        };
        let capacity = ecs.resources.config.inventory_capacity;
        let z = ecs.resources.level();

        ecs.world.spawn((
            Position::new(x, y, z),
            Actor {
                name: name.to_string(),
                faction,
            },
            Attributes {
                health,
                max_health: health,
                strength,
                toughness,
                agility,
                speed,
                ..Attributes::default()
            },
            Brain::default(),
            Inventory::new(capacity),
            Equipment::default(),
        ))
    }

    /// 创建地面上的物品
    pub fn create_item(&self, ecs: &mut ECSWorld, item: Item, x: i32, y: i32) -> Entity {
        let z = ecs.resources.level();
        ecs.world.spawn((item, Position::new(x, y, z)))
    }

    /// An item that exists only inside someone's inventory.
    pub fn create_loose_item(&self, ecs: &mut ECSWorld, item: Item) -> Entity {
        ecs.world.spawn((item,))
    }
}

impl Default for EntityFactory {
    fn default() -> Self {
        Self::new()
    }
}
