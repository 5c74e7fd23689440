//! ECS (Entity Component System) store and shared resources for the simulation.
//!
//! Entities live in a [`hecs::World`]; everything that is not per-entity
//! (map, clock, intent queue, action log, RNG, configuration) lives in
//! [`Resources`]. The two together form [`ECSWorld`], the context every
//! behavior system receives.

use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;

use dungeon::{Dungeon, GridMap};
use error::{GameError, GameResult};
use hecs::{Entity, World};
use items::EquipmentSlot;
use rand::SeedableRng;
use rand_pcg::Pcg64;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, IntoEnumIterator};

use crate::turn_system::energy_costs;

/// Main ECS world container
pub struct ECSWorld {
    pub world: World,
    pub resources: Resources,
}

impl ECSWorld {
    pub fn new(map: GridMap, config: GameConfig) -> Self {
        Self {
            world: World::new(),
            resources: Resources::new(map, config),
        }
    }

    /// The player entity, or [`GameError::NoPlayer`] if it was never spawned
    /// or has been removed.
    pub fn player(&self) -> GameResult<Entity> {
        self.resources
            .player
            .filter(|p| self.world.contains(*p))
            .ok_or(GameError::NoPlayer)
    }

    pub fn current_map(&self) -> &GridMap {
        self.resources.dungeon.current_level()
    }

    pub fn turn(&self) -> u64 {
        self.resources.clock.turn_count
    }

    /// Returns a clone of component `T` on `entity`.
    pub fn component<T: hecs::Component + Clone>(&self, entity: Entity) -> GameResult<T> {
        self.world
            .get::<&T>(entity)
            .map(|c| (*c).clone())
            .map_err(|_| GameError::missing::<T>(entity))
    }
}

/// Global resources that are shared across systems
pub struct Resources {
    /// Turn bookkeeping
    pub clock: GameClock,

    /// Current interaction mode of the player-facing loop
    pub mode: InteractionMode,

    /// Action requests waiting for their system
    pub intents: IntentQueue,

    /// Human-readable messages for the UI
    pub log: ActionLog,

    /// Game configuration
    pub config: GameConfig,

    /// Deterministic RNG shared by every rule that rolls dice
    pub rng: Pcg64,

    /// All levels and the current one
    pub dungeon: Dungeon,

    /// Remaining steps of a walk-to request, head first
    pub looking_path: Vec<(i32, i32)>,

    /// Cell the player should be on if the last walk step succeeded
    pub walk_step: Option<(i32, i32)>,

    /// Player entity handle
    pub player: Option<Entity>,
}

impl Resources {
    pub fn new(map: GridMap, config: GameConfig) -> Self {
        Self {
            clock: GameClock::default(),
            mode: InteractionMode::default(),
            intents: IntentQueue::default(),
            log: ActionLog::default(),
            rng: Pcg64::seed_from_u64(config.seed),
            config,
            dungeon: Dungeon::new(map),
            looking_path: Vec::new(),
            walk_step: None,
            player: None,
        }
    }

    /// Index of the level the player is on.
    pub fn level(&self) -> i32 {
        self.dungeon.depth as i32
    }
}

#[derive(Clone, Debug, Default)]
pub struct GameClock {
    pub turn_count: u64,
}

/// Interaction modes of the player-facing loop.
#[derive(Clone, Copy, Debug, Default, Display, EnumIter, PartialEq, Eq, Hash)]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum InteractionMode {
    #[default]
    Playing,
    Targeting,
    Looking,
    Moving,
    GoingDown,
    GoingUp,
    Focused,
}

/// Game configuration.
///
/// Every field has a default, so a JSON file only needs to name what it
/// overrides.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    pub seed: u64,
    pub inventory_capacity: usize,
    pub movement_cost: u32,
    pub melee_cost: u32,
    pub range_cost: u32,
    pub random_open_attempts: u32,
    pub swim_oxygen_cost: u32,
    pub bleeding_damage: u32,
    pub bleeding_turns: u32,
    pub crippled_turns: u32,
    pub crippled_energy_penalty: u32,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            seed: 12345,
            inventory_capacity: 10,
            movement_cost: energy_costs::FULL_ACTION,
            melee_cost: energy_costs::FULL_ACTION,
            range_cost: energy_costs::FULL_ACTION,
            random_open_attempts: 1000,
            swim_oxygen_cost: 2,
            bleeding_damage: 1,
            bleeding_turns: 5,
            crippled_turns: 5,
            crippled_energy_penalty: 50,
        }
    }
}

impl GameConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_json_str(json: &str) -> GameResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn load(path: impl AsRef<Path>) -> GameResult<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }
}

/// Append-only message log consumed by the UI. Every entry is mirrored to
/// `tracing` under the `action_log` target.
#[derive(Clone, Debug, Default)]
pub struct ActionLog {
    entries: Vec<String>,
}

impl ActionLog {
    pub fn add(&mut self, message: impl Into<String>) {
        let message = message.into();
        tracing::info!(target: "action_log", "{message}");
        self.entries.push(message);
    }

    pub fn entries(&self) -> &[String] {
        &self.entries
    }

    pub fn last(&self) -> Option<&str> {
        self.entries.last().map(String::as_str)
    }

    pub fn contains(&self, needle: &str) -> bool {
        self.entries.iter().any(|e| e.contains(needle))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// An action request. Each kind is consumed by exactly one system.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Intent {
    /// Step onto an adjacent cell.
    Move { x: i32, y: i32 },
    /// Hit an adjacent entity.
    Melee { target: Entity },
    /// Throw or fire `item` at a cell.
    Range { x: i32, y: i32, item: Entity },
}

#[derive(Clone, Copy, Debug, Display, PartialEq, Eq, Hash)]
pub enum IntentKind {
    Move,
    Melee,
    Range,
}

impl Intent {
    pub fn kind(&self) -> IntentKind {
        match self {
            Intent::Move { .. } => IntentKind::Move,
            Intent::Melee { .. } => IntentKind::Melee,
            Intent::Range { .. } => IntentKind::Range,
        }
    }
}

/// What became of a consumed intent.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Resolution {
    Performed,
    /// Illegal this tick (blocked cell, no target, no ammunition...).
    Rejected,
    /// The actor did not have enough energy.
    Exhausted,
    /// Still pending when the tick ended.
    Expired,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ResolvedIntent {
    pub actor: Entity,
    pub intent: Intent,
    pub resolution: Resolution,
}

/// Per-tick command queue. Input and AI systems push, resolution systems
/// take their own kind in push order, and every consumption is recorded
/// for the current tick.
#[derive(Clone, Debug, Default)]
pub struct IntentQueue {
    pending: Vec<(Entity, Intent)>,
    resolved: Vec<ResolvedIntent>,
}

impl IntentQueue {
    pub fn push(&mut self, actor: Entity, intent: Intent) {
        self.pending.push((actor, intent));
    }

    /// Removes and returns all pending intents of `kind`, in push order.
    pub fn take(&mut self, kind: IntentKind) -> Vec<(Entity, Intent)> {
        let (taken, rest) = std::mem::take(&mut self.pending)
            .into_iter()
            .partition(|(_, intent)| intent.kind() == kind);
        self.pending = rest;
        taken
    }

    pub fn has_pending(&self, actor: Entity, kind: IntentKind) -> bool {
        self.pending
            .iter()
            .any(|(a, intent)| *a == actor && intent.kind() == kind)
    }

    pub fn pending(&self) -> &[(Entity, Intent)] {
        &self.pending
    }

    pub fn record(&mut self, actor: Entity, intent: Intent, resolution: Resolution) {
        if resolution != Resolution::Performed {
            tracing::debug!(?actor, ?intent, ?resolution, "intent dropped");
        }
        self.resolved.push(ResolvedIntent {
            actor,
            intent,
            resolution,
        });
    }

    /// Intents consumed during the most recent tick.
    pub fn resolved(&self) -> &[ResolvedIntent] {
        &self.resolved
    }

    /// Starts a new tick's audit trail.
    pub fn begin_tick(&mut self) {
        self.resolved.clear();
    }

    /// Expires anything nobody consumed this tick.
    pub fn end_tick(&mut self) {
        for (actor, intent) in std::mem::take(&mut self.pending) {
            self.record(actor, intent, Resolution::Expired);
        }
    }
}

// Player marker component
#[derive(Clone, Copy, Debug)]
pub struct Player;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Position {
    pub x: i32,
    pub y: i32,
    pub z: i32, // dungeon level
}

impl Position {
    pub fn new(x: i32, y: i32, z: i32) -> Self {
        Self { x, y, z }
    }

    pub fn xy(&self) -> (i32, i32) {
        (self.x, self.y)
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})@{}", self.x, self.y, self.z)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
    pub name: String,
    pub faction: Faction,
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub enum Faction {
    Player,
    Enemy,
    Neutral,
}

/// Numeric stats. `speed` is the energy regained per tick, `vision` the
/// field-of-view radius.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attributes {
    pub health: u32,
    pub max_health: u32,
    pub strength: u32,
    pub toughness: u32,
    pub agility: u32,
    pub oxygen: u32,
    pub max_oxygen: u32,
    pub energy: u32,
    pub max_energy: u32,
    pub speed: u32,
    pub vision: i32,
}

impl Default for Attributes {
    fn default() -> Self {
        Self {
            health: 20,
            max_health: 20,
            strength: 4,
            toughness: 2,
            agility: 10,
            oxygen: 20,
            max_oxygen: 20,
            energy: 100,
            max_energy: 100,
            speed: 100,
            vision: 8,
        }
    }
}

impl Attributes {
    pub fn is_alive(&self) -> bool {
        self.health > 0
    }
}

/// Owned item entities, in pickup order.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Inventory {
    pub items: Vec<Entity>,
    pub capacity: usize,
}

impl Inventory {
    pub fn new(capacity: usize) -> Self {
        Self {
            items: Vec::new(),
            capacity,
        }
    }

    pub fn is_full(&self) -> bool {
        self.items.len() >= self.capacity
    }

    pub fn contains(&self, item: Entity) -> bool {
        self.items.contains(&item)
    }
}

/// Slot → item back-references into the owner's [`Inventory`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Equipment {
    pub slots: BTreeMap<EquipmentSlot, Option<Entity>>,
}

impl Default for Equipment {
    fn default() -> Self {
        Self {
            slots: EquipmentSlot::iter().map(|slot| (slot, None)).collect(),
        }
    }
}

impl Equipment {
    pub fn get(&self, slot: EquipmentSlot) -> Option<Entity> {
        self.slots.get(&slot).copied().flatten()
    }

    pub fn slot_of(&self, item: Entity) -> Option<EquipmentSlot> {
        self.slots
            .iter()
            .find(|(_, held)| **held == Some(item))
            .map(|(slot, _)| *slot)
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum BrainState {
    #[default]
    Idle,
    Hostile,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Brain {
    pub state: BrainState,
}

/// Last known player position, remembered while hostile.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Target {
    pub x: i32,
    pub y: i32,
}

/// Follow `Resources::looking_path` one step per tick.
#[derive(Clone, Copy, Debug)]
pub struct MouseMovement;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Bleeding {
    pub remaining: u32,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Crippled {
    pub remaining: u32,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Drowning;
