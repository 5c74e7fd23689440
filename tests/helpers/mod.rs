#![allow(dead_code)]

//! Test helpers and builders for creating simulation worlds with scripted
//! turn sequences.
//!
//! This module provides utilities for setting up deterministic scenarios
//! across multiple systems (movement, combat, AI, status effects, etc.).

use dungeon_crawl::dungeon::{GridMap, TerrainType};
use dungeon_crawl::ecs::*;
use dungeon_crawl::entity_factory::EntityFactory;
use dungeon_crawl::inventory;
use dungeon_crawl::items::Item;
use dungeon_crawl::turn_system::TurnScheduler;
use hecs::Entity;
use rand::SeedableRng;
use rand_pcg::Pcg64;

/// Builder for creating test worlds with deterministic setups
pub struct TestWorldBuilder {
    ecs: ECSWorld,
    factory: EntityFactory,
}

impl TestWorldBuilder {
    /// Start from ASCII rows (`#` wall, `.` floor, `~` deep water)
    pub fn new(rows: &[&str]) -> Self {
        Self::from_map(GridMap::from_ascii(rows), GameConfig::default())
    }

    /// Start from an open `width x height` floor
    pub fn open(width: i32, height: i32) -> Self {
        Self::from_map(GridMap::new(width, height, TerrainType::Floor), GameConfig::default())
    }

    pub fn from_map(map: GridMap, config: GameConfig) -> Self {
        Self {
            ecs: ECSWorld::new(map, config),
            factory: EntityFactory::new(),
        }
    }

    /// Reseed the shared RNG
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.ecs.resources.rng = Pcg64::seed_from_u64(seed);
        self
    }

    /// Add the player entity at the specified position
    pub fn with_player(mut self, x: i32, y: i32) -> Self {
        self.factory.create_player(&mut self.ecs, x, y);
        self
    }

    /// Add a monster at the specified position
    pub fn with_monster(mut self, kind: &str, x: i32, y: i32) -> (Self, Entity) {
        let monster = self.factory.create_monster(&mut self.ecs, x, y, kind);
        (self, monster)
    }

    /// A monster that neither regenerates nor acts unless a test gives it energy
    pub fn with_frozen_monster(self, kind: &str, x: i32, y: i32) -> (Self, Entity) {
        let (mut builder, monster) = self.with_monster(kind, x, y);
        if let Ok(mut attrs) = builder.ecs.world.get::<&mut Attributes>(monster) {
            attrs.energy = 0;
            attrs.speed = 0;
        }
        (builder, monster)
    }

    /// Add an item lying on the floor
    pub fn with_item(mut self, item: Item, x: i32, y: i32) -> (Self, Entity) {
        let entity = self.factory.create_item(&mut self.ecs, item, x, y);
        (self, entity)
    }

    /// Add an item straight into `owner`'s inventory
    pub fn with_carried(mut self, owner: Entity, item: Item) -> (Self, Entity) {
        let entity = self.factory.create_loose_item(&mut self.ecs, item);
        inventory::add_item(&mut self.ecs.world, &mut self.ecs.resources, owner, entity)
            .expect("owner has an inventory");
        (self, entity)
    }

    pub fn player(&self) -> Entity {
        self.ecs.player().expect("with_player was called")
    }

    /// Build the test world
    pub fn build(self) -> TestWorld {
        let player = self.ecs.player().expect("with_player was called");
        TestWorld {
            scheduler: TurnScheduler::new(self.ecs),
            player,
        }
    }
}

/// A built world plus shortcuts for the assertions tests keep making
pub struct TestWorld {
    pub scheduler: TurnScheduler,
    pub player: Entity,
}

impl TestWorld {
    pub fn ecs(&mut self) -> &mut ECSWorld {
        &mut self.scheduler.ecs
    }

    pub fn tick(&mut self) {
        self.scheduler.tick().expect("tick succeeds");
    }

    pub fn tick_n(&mut self, n: usize) {
        for _ in 0..n {
            self.tick();
        }
    }

    pub fn push(&mut self, actor: Entity, intent: Intent) {
        self.scheduler.ecs.resources.intents.push(actor, intent);
    }

    pub fn pos(&self, entity: Entity) -> (i32, i32) {
        self.scheduler
            .ecs
            .component::<Position>(entity)
            .expect("entity has a position")
            .xy()
    }

    /// Teleport an entity on its current level
    pub fn place(&mut self, entity: Entity, x: i32, y: i32) {
        let mut pos = self
            .scheduler
            .ecs
            .world
            .get::<&mut Position>(entity)
            .expect("entity has a position");
        pos.x = x;
        pos.y = y;
    }

    pub fn attrs(&self, entity: Entity) -> Attributes {
        self.scheduler
            .ecs
            .component::<Attributes>(entity)
            .expect("entity has attributes")
    }

    pub fn edit_attrs(&mut self, entity: Entity, edit: impl FnOnce(&mut Attributes)) {
        let mut attrs = self
            .scheduler
            .ecs
            .world
            .get::<&mut Attributes>(entity)
            .expect("entity has attributes");
        edit(&mut *attrs);
    }

    pub fn has<T: hecs::Component>(&self, entity: Entity) -> bool {
        self.scheduler.ecs.world.get::<&T>(entity).is_ok()
    }

    pub fn log(&self) -> &ActionLog {
        &self.scheduler.ecs.resources.log
    }
}
