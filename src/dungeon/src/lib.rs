//src/dungeon/src/lib.rs
//! Grid map, visibility and pathfinding for the simulation core.
//!
//! Everything in this crate is entity-agnostic: occupancy is supplied by the
//! caller as a predicate or as a walkability snapshot.

use error::{GameError, GameResult};
use serde::{Deserialize, Serialize};

pub mod fov;
pub mod map;
pub mod path;

pub use crate::fov::{can_see, field_of_view};
pub use crate::map::{chebyshev, is_legal_step, is_near, Cell, Grid, GridMap, TerrainType};
pub use crate::path::find_path;

/// External level generator. The core only asks it for a finished map.
pub trait LevelSource {
    /// Produces the map for level `depth` (0-based).
    fn generate(&mut self, depth: usize) -> GridMap;
}

/// Hands out pre-built maps in order; handy for tests and scripted runs.
impl LevelSource for Vec<GridMap> {
    fn generate(&mut self, depth: usize) -> GridMap {
        if self.is_empty() {
            tracing::warn!(depth, "level source exhausted, generating an empty room");
            return GridMap::new(10, 10, TerrainType::Floor);
        }
        self.remove(0)
    }
}

/// All generated levels plus the one the player is on.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Dungeon {
    pub depth: usize, // 当前层索引(0-based)
    pub levels: Vec<GridMap>,
}

impl Dungeon {
    pub fn new(first: GridMap) -> Self {
        Self {
            depth: 0,
            levels: vec![first],
        }
    }

    pub fn current_level(&self) -> &GridMap {
        &self.levels[self.depth]
    }

    pub fn current_level_mut(&mut self) -> &mut GridMap {
        &mut self.levels[self.depth]
    }

    pub fn level(&self, index: usize) -> GameResult<&GridMap> {
        self.levels.get(index).ok_or(GameError::NoSuchLevel(index))
    }

    /// Moves one level down, generating it through `source` on first visit.
    pub fn descend<S: LevelSource + ?Sized>(&mut self, source: &mut S) -> usize {
        let next = self.depth + 1;
        if next >= self.levels.len() {
            let map = source.generate(next);
            self.levels.push(map);
        }
        self.depth = next;
        self.depth
    }

    /// Moves one level up; `None` when already on the top level.
    pub fn ascend(&mut self) -> Option<usize> {
        self.depth = self.depth.checked_sub(1)?;
        Some(self.depth)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn descend_generates_once_then_reuses() {
        let mut dungeon = Dungeon::new(GridMap::new(3, 3, TerrainType::Floor));
        let mut source = vec![
            GridMap::new(4, 4, TerrainType::Floor),
            GridMap::new(5, 5, TerrainType::Floor),
        ];

        assert_eq!(dungeon.descend(&mut source), 1);
        assert_eq!(dungeon.current_level().width(), 4);
        assert_eq!(dungeon.ascend(), Some(0));
        assert_eq!(dungeon.descend(&mut source), 1);
        // still the first generated map; the source was not consulted again
        assert_eq!(dungeon.current_level().width(), 4);
        assert_eq!(source.len(), 1);
    }

    #[test]
    fn ascend_from_top_fails() {
        let mut dungeon = Dungeon::new(GridMap::new(3, 3, TerrainType::Floor));
        assert_eq!(dungeon.ascend(), None);
        assert!(matches!(dungeon.level(3), Err(GameError::NoSuchLevel(3))));
    }
}
