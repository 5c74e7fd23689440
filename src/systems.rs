//! Behavior systems. Each runs once per tick, in the order returned by
//! [`default_pipeline`].

use combat::{AttackKind, AttackOutcome, Combat};
use dungeon::chebyshev;
use error::{GameError, GameResult};
use hecs::{CommandBuffer, Entity, World};
use items::{Item, ItemEffect};
use rand::Rng;

use crate::ecs::{
    Actor, Attributes, Bleeding, Brain, BrainState, Crippled, Drowning, Faction, Intent,
    IntentKind, InteractionMode, Inventory, MouseMovement, Player, Position, Resolution, Resources, Target,
};
use crate::inventory;
use crate::spatial::Spatial;

use self::combat_helpers::{apply_damage, combat_view, display_name, item_damage};

pub type SystemResult = GameResult<()>;

pub trait System: Send {
    fn name(&self) -> &str;
    fn run(&mut self, world: &mut World, resources: &mut Resources) -> SystemResult;
}

/// All systems in registration order.
pub fn default_pipeline() -> Vec<Box<dyn System>> {
    vec![
        Box::new(AttributesSystem),
        Box::new(MouseMovementSystem),
        Box::new(BrainSystem),
        Box::new(WanderSystem),
        Box::new(TargetSystem),
        Box::new(MovementSystem),
        Box::new(MeleeSystem),
        Box::new(RangeSystem),
        Box::new(CrippledSystem),
        Box::new(BleedingSystem),
        Box::new(SwimmingSystem),
    ]
}

const NEIGHBOURS: [(i32, i32); 8] = [
    (0, -1),
    (1, -1),
    (1, 0),
    (1, 1),
    (0, 1),
    (-1, 1),
    (-1, 0),
    (-1, -1),
];

fn position(world: &World, entity: Entity) -> GameResult<Position> {
    world
        .get::<&Position>(entity)
        .map(|p| (*p).clone())
        .map_err(|_| GameError::missing::<Position>(entity))
}

fn attributes(world: &World, entity: Entity) -> GameResult<Attributes> {
    world
        .get::<&Attributes>(entity)
        .map(|a| (*a).clone())
        .map_err(|_| GameError::missing::<Attributes>(entity))
}

/// Deducts `cost` energy. Returns `false`, leaving energy untouched, when
/// the entity cannot afford it.
fn spend_energy(world: &mut World, entity: Entity, cost: u32) -> GameResult<bool> {
    let mut attrs = world
        .get::<&mut Attributes>(entity)
        .map_err(|_| GameError::missing::<Attributes>(entity))?;
    if attrs.energy < cost {
        return Ok(false);
    }
    attrs.energy -= cost;
    Ok(true)
}

fn player_position(world: &World, resources: &Resources) -> GameResult<(Entity, Position)> {
    let player = resources
        .player
        .filter(|p| world.contains(*p))
        .ok_or(GameError::NoPlayer)?;
    Ok((player, position(world, player)?))
}

/// Monsters (Brain, not Player) on the current level.
fn monsters(world: &World, level: i32) -> Vec<(Entity, Position, Attributes, BrainState)> {
    world
        .query::<(&Brain, &Position, &Attributes)>()
        .without::<&Player>()
        .iter()
        .filter(|(_, (_, pos, _))| pos.z == level)
        .map(|(e, (brain, pos, attrs))| (e, pos.clone(), attrs.clone(), brain.state))
        .collect()
}

/// 能量恢复：每回合为所有实体增加 `speed` 点能量，残废时减去惩罚
pub struct AttributesSystem;

impl System for AttributesSystem {
    fn name(&self) -> &str {
        "AttributesSystem"
    }

    fn run(&mut self, world: &mut World, resources: &mut Resources) -> SystemResult {
        let penalty = resources.config.crippled_energy_penalty;
        for (_, (attrs, crippled)) in world.query_mut::<(&mut Attributes, Option<&Crippled>)>() {
            let gain = match crippled {
                Some(_) => attrs.speed.saturating_sub(penalty),
                None => attrs.speed,
            };
            attrs.energy = attrs.energy.saturating_add(gain).min(attrs.max_energy);
        }
        Ok(())
    }
}

/// Feeds the walk-to path to the player one step per tick.
pub struct MouseMovementSystem;

impl MouseMovementSystem {
    fn finish(world: &mut World, resources: &mut Resources, player: Entity) {
        let _ = world.remove_one::<MouseMovement>(player);
        resources.looking_path.clear();
        resources.walk_step = None;
        resources.mode = InteractionMode::Playing;
    }
}

impl System for MouseMovementSystem {
    fn name(&self) -> &str {
        "MouseMovementSystem"
    }

    fn run(&mut self, world: &mut World, resources: &mut Resources) -> SystemResult {
        let (player, pos) = player_position(world, resources)?;
        if world.get::<&MouseMovement>(player).is_err() {
            return Ok(());
        }

        // 能量不足时原地等待，路径保留到下一回合
        if attributes(world, player)?.energy < resources.config.movement_cost {
            return Ok(());
        }

        // 上一步被挡住则放弃剩余路径
        if let Some(expected) = resources.walk_step.take() {
            if pos.xy() != expected {
                tracing::debug!(?expected, at = ?pos.xy(), "walk interrupted");
                Self::finish(world, resources, player);
                return Ok(());
            }
        }

        if resources.looking_path.is_empty() {
            Self::finish(world, resources, player);
            return Ok(());
        }

        let (x, y) = resources.looking_path.remove(0);
        resources.intents.push(player, Intent::Move { x, y });
        if resources.looking_path.is_empty() {
            Self::finish(world, resources, player);
        } else {
            resources.walk_step = Some((x, y));
        }
        Ok(())
    }
}

/// 感知：看见玩家则敌对并记住其位置，失去目标后恢复空闲
pub struct BrainSystem;

impl System for BrainSystem {
    fn name(&self) -> &str {
        "BrainSystem"
    }

    fn run(&mut self, world: &mut World, resources: &mut Resources) -> SystemResult {
        let (_, player_pos) = player_position(world, resources)?;
        let level = resources.level();
        let spatial = Spatial::new(world, resources.dungeon.current_level(), level);

        let mut cmd = CommandBuffer::new();
        for (entity, pos, attrs, state) in monsters(world, level) {
            let neutral = world
                .get::<&Actor>(entity)
                .is_ok_and(|a| a.faction == Faction::Neutral);
            if neutral {
                continue;
            }
            let sees = player_pos.z == level
                && spatial.can_see(pos.xy(), player_pos.xy(), attrs.vision);
            if sees {
                cmd.insert(
                    entity,
                    (
                        Brain {
                            state: BrainState::Hostile,
                        },
                        Target {
                            x: player_pos.x,
                            y: player_pos.y,
                        },
                    ),
                );
                continue;
            }
            if state == BrainState::Hostile {
                let reached = world
                    .get::<&Target>(entity)
                    .map(|t| (t.x, t.y) == pos.xy())
                    .unwrap_or(true);
                if reached {
                    cmd.insert_one(entity, Brain::default());
                    cmd.remove_one::<Target>(entity);
                }
            }
        }
        cmd.run_on(world);
        Ok(())
    }
}

/// 空闲怪物随机游荡
pub struct WanderSystem;

impl System for WanderSystem {
    fn name(&self) -> &str {
        "WanderSystem"
    }

    fn run(&mut self, world: &mut World, resources: &mut Resources) -> SystemResult {
        let level = resources.level();
        let cost = resources.config.movement_cost;
        let spatial = Spatial::new(world, resources.dungeon.current_level(), level);

        for (entity, pos, attrs, state) in monsters(world, level) {
            if state != BrainState::Idle || attrs.energy < cost {
                continue;
            }
            let options: Vec<(i32, i32)> = NEIGHBOURS
                .iter()
                .map(|(dx, dy)| (pos.x + dx, pos.y + dy))
                .filter(|&to| spatial.is_legal_step(pos.xy(), to))
                .collect();
            if options.is_empty() {
                continue;
            }
            let (x, y) = options[resources.rng.random_range(0..options.len())];
            resources.intents.push(entity, Intent::Move { x, y });
        }
        Ok(())
    }
}

/// 敌对怪物选择行动：近战、远程或沿路径接近
pub struct TargetSystem;

impl TargetSystem {
    /// Something the monster can shoot or throw.
    fn ranged_option(world: &World, entity: Entity) -> Option<Entity> {
        inventory::ammunition_for_held_weapon(world, entity)
            .or_else(|| inventory::throwing_item(world, entity))
    }
}

impl System for TargetSystem {
    fn name(&self) -> &str {
        "TargetSystem"
    }

    fn run(&mut self, world: &mut World, resources: &mut Resources) -> SystemResult {
        let (player, player_pos) = player_position(world, resources)?;
        let level = resources.level();
        let config = &resources.config;
        let spatial = Spatial::new(world, resources.dungeon.current_level(), level);

        for (entity, pos, attrs, state) in monsters(world, level) {
            if state != BrainState::Hostile {
                continue;
            }
            let Ok(target) = world.get::<&Target>(entity).map(|t| *t) else {
                continue;
            };
            let same_level = player_pos.z == level;

            if same_level && chebyshev(pos.xy(), player_pos.xy()) == 1 {
                if attrs.energy >= config.melee_cost {
                    resources.intents.push(entity, Intent::Melee { target: player });
                }
                continue;
            }

            if same_level && spatial.can_see(pos.xy(), player_pos.xy(), attrs.vision) {
                if let Some(item) = Self::ranged_option(world, entity) {
                    if attrs.energy >= config.range_cost {
                        resources.intents.push(
                            entity,
                            Intent::Range {
                                x: player_pos.x,
                                y: player_pos.y,
                                item,
                            },
                        );
                    }
                    continue;
                }
            }

            if attrs.energy < config.movement_cost {
                continue;
            }
            if let Some(&(x, y)) = spatial.find_path(pos.xy(), (target.x, target.y)).first() {
                resources.intents.push(entity, Intent::Move { x, y });
            }
        }
        Ok(())
    }
}

/// 移动：目标格必须相邻且可通行
pub struct MovementSystem;

impl System for MovementSystem {
    fn name(&self) -> &str {
        "MovementSystem"
    }

    fn run(&mut self, world: &mut World, resources: &mut Resources) -> SystemResult {
        let cost = resources.config.movement_cost;
        let level = resources.level();

        for (actor, intent) in resources.intents.take(IntentKind::Move) {
            let Intent::Move { x, y } = intent else {
                continue;
            };
            let pos = position(world, actor)?;
            let attrs = attributes(world, actor)?;
            if attrs.energy < cost {
                resources.intents.record(actor, intent, Resolution::Exhausted);
                continue;
            }

            let legal = attrs.is_alive()
                && pos.z == level
                && Spatial::new(world, resources.dungeon.current_level(), level)
                    .is_legal_step(pos.xy(), (x, y));
            if !legal {
                resources.intents.record(actor, intent, Resolution::Rejected);
                continue;
            }

            spend_energy(world, actor, cost)?;
            if let Ok(mut p) = world.get::<&mut Position>(actor) {
                p.x = x;
                p.y = y;
            }
            resources.intents.record(actor, intent, Resolution::Performed);
        }
        Ok(())
    }
}

/// 近战攻击
pub struct MeleeSystem;

impl System for MeleeSystem {
    fn name(&self) -> &str {
        "MeleeSystem"
    }

    fn run(&mut self, world: &mut World, resources: &mut Resources) -> SystemResult {
        let cost = resources.config.melee_cost;

        for (actor, intent) in resources.intents.take(IntentKind::Melee) {
            let Intent::Melee { target } = intent else {
                continue;
            };
            let pos = position(world, actor)?;
            let attrs = attributes(world, actor)?;
            if attrs.energy < cost {
                resources.intents.record(actor, intent, Resolution::Exhausted);
                continue;
            }

            let reachable = match (
                world.get::<&Position>(target),
                world.get::<&Attributes>(target),
            ) {
                (Ok(tp), Ok(ta)) => {
                    tp.z == pos.z && chebyshev(pos.xy(), tp.xy()) == 1 && ta.is_alive()
                }
                _ => false,
            };
            if !attrs.is_alive() || target == actor || !reachable {
                resources.intents.record(actor, intent, Resolution::Rejected);
                continue;
            }

            spend_energy(world, actor, cost)?;
            let weapon = inventory::held_weapon(world, actor);
            let attacker = combat_view(world, actor, item_damage(world, weapon, ItemEffect::HitDamage))?;
            let defender = combat_view(world, target, 0)?;
            let outcome = Combat::resolve(&attacker, &defender, AttackKind::Melee, &mut resources.rng);

            log_attack(resources, &attacker.name, None, &defender.name, outcome);
            if let AttackOutcome::Hit { damage, critical } = outcome {
                apply_damage(world, target, damage)?;
                if critical && weapon.is_some() {
                    let remaining = resources.config.bleeding_turns;
                    world
                        .insert_one(target, Bleeding { remaining })
                        .map_err(|_| GameError::missing::<Attributes>(target))?;
                }
            }
            resources.intents.record(actor, intent, Resolution::Performed);
        }
        Ok(())
    }
}

fn log_attack(
    resources: &mut Resources,
    attacker: &str,
    projectile: Option<&str>,
    defender: &str,
    outcome: AttackOutcome,
) {
    let subject = match projectile {
        Some(item) => format!("{attacker}'s {item}"),
        None => attacker.to_string(),
    };
    let line = match outcome {
        AttackOutcome::Miss => format!("{subject} misses {defender}"),
        hit => format!("{subject} {} {defender} for {} damage", hit.verb(), hit.damage()),
    };
    resources.log.add(line);
}

/// 远程攻击：投掷或发射
pub struct RangeSystem;

impl RangeSystem {
    /// How `item` would leave the actor's hands, if it can at all.
    fn attack_kind(world: &World, actor: Entity, item: Entity) -> Option<AttackKind> {
        let owned = world
            .get::<&Inventory>(actor)
            .is_ok_and(|inv| inv.contains(item));
        if !owned {
            return None;
        }
        let details = world.get::<&Item>(item).ok()?;
        let fits_launcher = inventory::held_weapon(world, actor)
            .and_then(|w| world.get::<&Item>(w).ok()?.ammunition.clone())
            .is_some_and(|ammo| details.is_ammunition_of(&ammo));
        if fits_launcher {
            Some(AttackKind::Fired)
        } else if details.throwing {
            Some(AttackKind::Thrown)
        } else {
            None
        }
    }
}

impl System for RangeSystem {
    fn name(&self) -> &str {
        "RangeSystem"
    }

    fn run(&mut self, world: &mut World, resources: &mut Resources) -> SystemResult {
        let cost = resources.config.range_cost;
        let level = resources.level();

        for (actor, intent) in resources.intents.take(IntentKind::Range) {
            let Intent::Range { x, y, item } = intent else {
                continue;
            };
            let pos = position(world, actor)?;
            let attrs = attributes(world, actor)?;
            if attrs.energy < cost {
                resources.intents.record(actor, intent, Resolution::Exhausted);
                continue;
            }

            let spatial = Spatial::new(world, resources.dungeon.current_level(), level);
            let kind = Self::attack_kind(world, actor, item);
            let visible = pos.z == level
                && spatial.map.in_bounds(x, y)
                && !spatial.map.is_wall(x, y)
                && spatial.can_see(pos.xy(), (x, y), attrs.vision);
            let (Some(kind), true, true) = (kind, visible, attrs.is_alive()) else {
                resources.intents.record(actor, intent, Resolution::Rejected);
                continue;
            };
            let victim = spatial.actor_at(x, y).filter(|v| *v != actor);

            spend_energy(world, actor, cost)?;
            let damage = match kind {
                AttackKind::Thrown => item_damage(world, Some(item), ItemEffect::ThrowDamage),
                _ => item_damage(world, inventory::held_weapon(world, actor), ItemEffect::HitDamage),
            };
            let projectile = display_name(world, item);
            inventory::release_item(world, actor, item, Position::new(x, y, pos.z))?;

            if let Some(victim) = victim {
                let attacker = combat_view(world, actor, damage)?;
                let defender = combat_view(world, victim, 0)?;
                let outcome = Combat::resolve(&attacker, &defender, kind, &mut resources.rng);
                log_attack(resources, &attacker.name, Some(&projectile), &defender.name, outcome);
                if let AttackOutcome::Hit { damage, critical } = outcome {
                    apply_damage(world, victim, damage)?;
                    if critical {
                        let remaining = resources.config.crippled_turns;
                        world
                            .insert_one(victim, Crippled { remaining })
                            .map_err(|_| GameError::missing::<Attributes>(victim))?;
                    }
                }
            } else {
                tracing::debug!(?actor, x, y, "projectile hit the floor");
            }
            resources.intents.record(actor, intent, Resolution::Performed);
        }
        Ok(())
    }
}

/// 残废：倒计时，惩罚在能量恢复时生效
pub struct CrippledSystem;

impl System for CrippledSystem {
    fn name(&self) -> &str {
        "CrippledSystem"
    }

    fn run(&mut self, world: &mut World, _resources: &mut Resources) -> SystemResult {
        let mut cmd = CommandBuffer::new();
        for (entity, crippled) in world.query_mut::<&mut Crippled>() {
            crippled.remaining = crippled.remaining.saturating_sub(1);
            if crippled.remaining == 0 {
                cmd.remove_one::<Crippled>(entity);
            }
        }
        cmd.run_on(world);
        Ok(())
    }
}

/// 流血：每回合损失生命
pub struct BleedingSystem;

impl System for BleedingSystem {
    fn name(&self) -> &str {
        "BleedingSystem"
    }

    fn run(&mut self, world: &mut World, resources: &mut Resources) -> SystemResult {
        let damage = resources.config.bleeding_damage;
        let mut cmd = CommandBuffer::new();
        for (entity, (bleeding, attrs)) in world.query_mut::<(&mut Bleeding, &mut Attributes)>() {
            attrs.health = attrs.health.saturating_sub(damage);
            bleeding.remaining = bleeding.remaining.saturating_sub(1);
            if bleeding.remaining == 0 {
                cmd.remove_one::<Bleeding>(entity);
            }
        }
        cmd.run_on(world);
        Ok(())
    }
}

/// 游泳：深水中消耗氧气，耗尽则溺水
pub struct SwimmingSystem;

impl System for SwimmingSystem {
    fn name(&self) -> &str {
        "SwimmingSystem"
    }

    fn run(&mut self, world: &mut World, resources: &mut Resources) -> SystemResult {
        let cost = resources.config.swim_oxygen_cost;
        let level = resources.level();
        let map = resources.dungeon.current_level();
        let mut cmd = CommandBuffer::new();

        for (entity, (pos, attrs, drowning)) in
            world.query_mut::<(&Position, &mut Attributes, Option<&Drowning>)>()
        {
            if pos.z != level {
                continue;
            }
            if map.is_deep_water(pos.x, pos.y) {
                attrs.oxygen = attrs.oxygen.saturating_sub(cost);
                if attrs.oxygen == 0 && drowning.is_none() {
                    cmd.insert_one(entity, Drowning);
                }
            } else {
                attrs.oxygen = attrs.max_oxygen;
                if drowning.is_some() {
                    cmd.remove_one::<Drowning>(entity);
                }
            }
        }
        cmd.run_on(world);
        Ok(())
    }
}

/// End-of-tick cleanup: monsters at zero health drop what they carry and
/// are despawned. The player is left in place for the game-over handling.
/// Returns the despawned entities.
pub fn reap_the_dead(world: &mut World, resources: &mut Resources) -> GameResult<Vec<Entity>> {
    let dead: Vec<(Entity, Position, Vec<Entity>)> = world
        .query::<(&Attributes, &Position, Option<&Inventory>)>()
        .without::<&Player>()
        .iter()
        .filter(|(_, (attrs, _, _))| !attrs.is_alive())
        .map(|(e, (_, pos, inv))| {
            let items = inv.map(|i| i.items.clone()).unwrap_or_default();
            (e, pos.clone(), items)
        })
        .collect();

    let mut despawned = Vec::with_capacity(dead.len());
    for (entity, pos, items) in dead {
        for item in items {
            inventory::release_item(world, entity, item, pos.clone())?;
        }
        let name = display_name(world, entity);
        resources.log.add(format!("{name} dies"));
        world
            .despawn(entity)
            .map_err(|_| GameError::missing::<Position>(entity))?;
        despawned.push(entity);
    }
    Ok(despawned)
}

/// Glue between the world and the stateless rules in the `combat` crate.
pub mod combat_helpers {
    use super::*;
    use combat::Combatant;

    /// Snapshot of an entity for one attack roll.
    #[derive(Clone, Debug)]
    pub struct CombatView {
        pub name: String,
        pub strength: u32,
        pub toughness: u32,
        pub agility: u32,
        pub weapon_damage: u32,
    }

    impl Combatant for CombatView {
        fn name(&self) -> &str {
            &self.name
        }

        fn strength(&self) -> u32 {
            self.strength
        }

        fn toughness(&self) -> u32 {
            self.toughness
        }

        fn agility(&self) -> u32 {
            self.agility
        }

        fn weapon_damage(&self) -> u32 {
            self.weapon_damage
        }
    }

    pub fn display_name(world: &World, entity: Entity) -> String {
        if let Ok(actor) = world.get::<&Actor>(entity) {
            return actor.name.clone();
        }
        world
            .get::<&Item>(entity)
            .map(|i| i.name.clone())
            .unwrap_or_else(|_| "something".to_string())
    }

    pub fn combat_view(world: &World, entity: Entity, weapon_damage: u32) -> GameResult<CombatView> {
        let attrs = attributes(world, entity)?;
        Ok(CombatView {
            name: display_name(world, entity),
            strength: attrs.strength,
            toughness: attrs.toughness,
            agility: attrs.agility,
            weapon_damage,
        })
    }

    /// Non-negative value of `effect` on `item`, 0 when absent.
    pub fn item_damage(world: &World, item: Option<Entity>, effect: ItemEffect) -> u32 {
        item.and_then(|i| world.get::<&Item>(i).ok().and_then(|d| d.effect(effect)))
            .map(|v| v.max(0) as u32)
            .unwrap_or(0)
    }

    /// Returns the health left.
    pub fn apply_damage(world: &mut World, target: Entity, damage: u32) -> GameResult<u32> {
        let mut attrs = world
            .get::<&mut Attributes>(target)
            .map_err(|_| GameError::missing::<Attributes>(target))?;
        attrs.health = attrs.health.saturating_sub(damage);
        Ok(attrs.health)
    }
}
