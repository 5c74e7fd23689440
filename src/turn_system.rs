//! Energy-driven turn scheduler.
//!
//! `TurnScheduler::tick` runs every behavior system once, in registration
//! order, then removes the dead and advances the turn counter by one. Between
//! ticks the UI drives the interaction-mode state machine through the
//! methods here and queues player intents on `Resources::intents`.

use dungeon::LevelSource;
use error::{GameError, GameResult};

use crate::ecs::{Attributes, ECSWorld, Intent, InteractionMode, MouseMovement, Position};
use crate::inventory;
use crate::spatial::Spatial;
use crate::systems::{self, System};

/// Energy cost constants consumed by the scheduler.
pub mod energy_costs {
    /// Full action energy cost (movement, melee, ranged attack)
    pub const FULL_ACTION: u32 = 100;
}

/// Owns the world and the ordered system pipeline.
pub struct TurnScheduler {
    pub ecs: ECSWorld,
    systems: Vec<Box<dyn System>>,
}

impl TurnScheduler {
    pub fn new(ecs: ECSWorld) -> Self {
        Self {
            ecs,
            systems: systems::default_pipeline(),
        }
    }

    pub fn system_names(&self) -> Vec<&str> {
        self.systems.iter().map(|s| s.name()).collect()
    }

    pub fn mode(&self) -> InteractionMode {
        self.ecs.resources.mode
    }

    pub fn turn(&self) -> u64 {
        self.ecs.turn()
    }

    /// Advances the world by exactly one turn.
    pub fn tick(&mut self) -> GameResult<()> {
        let ECSWorld { world, resources } = &mut self.ecs;
        resources.intents.begin_tick();
        for system in self.systems.iter_mut() {
            system.run(world, resources)?;
        }
        systems::reap_the_dead(world, resources)?;
        resources.intents.end_tick();
        resources.clock.turn_count += 1;
        tracing::trace!(turn = resources.clock.turn_count, "tick");
        Ok(())
    }

    /// True once the player's health has reached zero.
    pub fn is_player_dead(&self) -> GameResult<bool> {
        let player = self.ecs.player()?;
        Ok(!self.ecs.component::<Attributes>(player)?.is_alive())
    }

    fn require(&self, action: &'static str, allowed: &[InteractionMode]) -> GameResult<()> {
        let mode = self.mode();
        if allowed.contains(&mode) {
            Ok(())
        } else {
            Err(GameError::InvalidModeTransition {
                action,
                mode: mode.to_string(),
            })
        }
    }

    /// Coordinates handed in by the UI must lie on the current map.
    fn check_bounds(&self, x: i32, y: i32) -> GameResult<()> {
        let map = self.ecs.current_map();
        if map.in_bounds(x, y) {
            Ok(())
        } else {
            Err(GameError::OutOfBounds {
                x,
                y,
                width: map.width(),
                height: map.height(),
            })
        }
    }

    /// Something the player could shoot or throw right now.
    fn projectile(&self) -> GameResult<Option<hecs::Entity>> {
        let player = self.ecs.player()?;
        let world = &self.ecs.world;
        Ok(inventory::ammunition_for_held_weapon(world, player)
            .or_else(|| inventory::throwing_item(world, player)))
    }

    /// PLAYING → TARGETING. Stays in PLAYING and returns `false` when the
    /// player has nothing to throw or fire.
    pub fn open_targeting(&mut self) -> GameResult<bool> {
        self.require("open_targeting", &[InteractionMode::Playing])?;
        if self.projectile()?.is_none() {
            self.ecs.resources.log.add("You have nothing to throw");
            return Ok(false);
        }
        self.ecs.resources.mode = InteractionMode::Targeting;
        Ok(true)
    }

    /// PLAYING → LOOKING.
    pub fn open_looking(&mut self) -> GameResult<()> {
        self.require("open_looking", &[InteractionMode::Playing])?;
        self.ecs.resources.mode = InteractionMode::Looking;
        Ok(())
    }

    /// TARGETING → FOCUSED.
    pub fn open_focused(&mut self) -> GameResult<()> {
        self.require("open_focused", &[InteractionMode::Targeting])?;
        self.ecs.resources.mode = InteractionMode::Focused;
        Ok(())
    }

    /// Plans a path to `(x, y)` and starts walking it, one step per tick.
    /// Returns `false` (mode PLAYING) when there is no route.
    pub fn walk_to(&mut self, x: i32, y: i32) -> GameResult<bool> {
        self.require("walk_to", &[InteractionMode::Playing, InteractionMode::Looking])?;
        self.check_bounds(x, y)?;
        let player = self.ecs.player()?;
        let start = self.ecs.component::<Position>(player)?.xy();
        let path = Spatial::current(&self.ecs.world, &self.ecs.resources).find_path(start, (x, y));

        let resources = &mut self.ecs.resources;
        resources.walk_step = None;
        if path.is_empty() {
            tracing::debug!(goal = ?(x, y), "no path");
            resources.looking_path.clear();
            resources.mode = InteractionMode::Playing;
            return Ok(false);
        }
        resources.looking_path = path;
        resources.mode = InteractionMode::Moving;
        self.ecs
            .world
            .insert_one(player, MouseMovement)
            .map_err(|_| GameError::NoPlayer)?;
        Ok(true)
    }

    /// Back to PLAYING from anywhere, abandoning any walk in progress.
    pub fn cancel(&mut self) -> GameResult<()> {
        let player = self.ecs.player()?;
        let _ = self.ecs.world.remove_one::<MouseMovement>(player);
        let resources = &mut self.ecs.resources;
        resources.looking_path.clear();
        resources.walk_step = None;
        resources.mode = InteractionMode::Playing;
        Ok(())
    }

    /// TARGETING/FOCUSED → PLAYING, queueing a ranged attack at `(x, y)`.
    pub fn fire_at(&mut self, x: i32, y: i32) -> GameResult<bool> {
        self.require(
            "fire_at",
            &[InteractionMode::Targeting, InteractionMode::Focused],
        )?;
        self.check_bounds(x, y)?;
        let player = self.ecs.player()?;
        let projectile = self.projectile()?;
        self.ecs.resources.mode = InteractionMode::Playing;
        match projectile {
            Some(item) => {
                self.ecs
                    .resources
                    .intents
                    .push(player, Intent::Range { x, y, item });
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// PLAYING → GOING_DOWN.
    pub fn begin_descent(&mut self) -> GameResult<()> {
        self.require("begin_descent", &[InteractionMode::Playing])?;
        self.ecs.resources.mode = InteractionMode::GoingDown;
        Ok(())
    }

    /// PLAYING → GOING_UP. Returns `false` on the top level.
    pub fn begin_ascent(&mut self) -> GameResult<bool> {
        self.require("begin_ascent", &[InteractionMode::Playing])?;
        if self.ecs.resources.dungeon.depth == 0 {
            return Ok(false);
        }
        self.ecs.resources.mode = InteractionMode::GoingUp;
        Ok(true)
    }

    /// Completes a GOING_DOWN/GOING_UP request: switches level (asking
    /// `source` for a new one on first visit), puts the player on the
    /// level's start position and returns to PLAYING. Returns the new depth.
    pub fn finish_level_transition<S: LevelSource>(&mut self, source: &mut S) -> GameResult<usize> {
        self.require(
            "finish_level_transition",
            &[InteractionMode::GoingDown, InteractionMode::GoingUp],
        )?;
        let player = self.ecs.player()?;
        let dungeon = &mut self.ecs.resources.dungeon;
        let depth = match self.ecs.resources.mode {
            InteractionMode::GoingUp => dungeon
                .ascend()
                .ok_or_else(|| anyhow::anyhow!("already on the top level"))?,
            _ => dungeon.descend(source),
        };

        // Move the player off the old level before scanning the new one.
        let _ = self.ecs.world.remove_one::<Position>(player);
        let start = Spatial::current(&self.ecs.world, &self.ecs.resources)
            .player_start_position()
            .ok_or_else(|| anyhow::anyhow!("level {depth} has no open cell"))?;
        self.ecs
            .world
            .insert_one(player, Position::new(start.0, start.1, depth as i32))
            .map_err(|_| GameError::NoPlayer)?;

        self.cancel()?;
        self.ecs.resources.intents.end_tick();
        self.ecs
            .resources
            .log
            .add(format!("You arrive on level {}", depth + 1));
        Ok(depth)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ecs::GameConfig;
    use crate::entity_factory::EntityFactory;
    use dungeon::{GridMap, TerrainType};
    use items::Item;

    fn scheduler() -> TurnScheduler {
        let mut ecs = ECSWorld::new(GridMap::new(10, 10, TerrainType::Floor), GameConfig::new());
        EntityFactory::new().create_player(&mut ecs, 5, 5);
        TurnScheduler::new(ecs)
    }

    #[test]
    fn tick_advances_turn_by_one() {
        let mut s = scheduler();
        assert_eq!(s.turn(), 0);
        s.tick().unwrap();
        s.tick().unwrap();
        assert_eq!(s.turn(), 2);
    }

    #[test]
    fn tick_without_player_fails_fast() {
        let ecs = ECSWorld::new(GridMap::new(4, 4, TerrainType::Floor), GameConfig::new());
        let mut s = TurnScheduler::new(ecs);
        assert!(matches!(s.tick(), Err(GameError::NoPlayer)));
    }

    #[test]
    fn targeting_requires_something_to_throw() {
        let mut s = scheduler();
        assert!(!s.open_targeting().unwrap());
        assert_eq!(s.mode(), InteractionMode::Playing);

        let player = s.ecs.player().unwrap();
        let rock = EntityFactory::new().create_loose_item(&mut s.ecs, Item::consumable("Rock"));
        inventory::add_item(&mut s.ecs.world, &mut s.ecs.resources, player, rock).unwrap();
        inventory::set_throwing(&mut s.ecs.world, player, rock).unwrap();

        assert!(s.open_targeting().unwrap());
        s.open_focused().unwrap();
        assert_eq!(s.mode(), InteractionMode::Focused);
        assert!(s.fire_at(7, 5).unwrap());
        assert_eq!(s.mode(), InteractionMode::Playing);
        assert_eq!(
            s.ecs.resources.intents.pending(),
            [(player, Intent::Range { x: 7, y: 5, item: rock })]
        );
    }

    #[test]
    fn illegal_transitions_are_errors() {
        let mut s = scheduler();
        assert!(matches!(
            s.open_focused(),
            Err(GameError::InvalidModeTransition { action: "open_focused", .. })
        ));
        s.open_looking().unwrap();
        assert!(s.begin_descent().is_err());
        s.cancel().unwrap();
        assert_eq!(s.mode(), InteractionMode::Playing);
        assert!(!s.begin_ascent().unwrap());
        assert!(matches!(
            s.walk_to(40, 2),
            Err(GameError::OutOfBounds { x: 40, y: 2, width: 10, height: 10 })
        ));
    }

    #[test]
    fn descending_generates_and_places_player() {
        let mut s = scheduler();
        let mut levels = vec![GridMap::from_ascii(&["###", "#.#", "###"])];
        s.begin_descent().unwrap();
        assert_eq!(s.mode(), InteractionMode::GoingDown);
        assert_eq!(s.finish_level_transition(&mut levels).unwrap(), 1);

        let player = s.ecs.player().unwrap();
        assert_eq!(s.ecs.component::<Position>(player).unwrap(), Position::new(1, 1, 1));
        assert_eq!(s.mode(), InteractionMode::Playing);

        assert!(s.begin_ascent().unwrap());
        assert_eq!(s.finish_level_transition(&mut levels).unwrap(), 0);
        assert_eq!(s.ecs.component::<Position>(player).unwrap().z, 0);
    }
}
