//! Queries that need both the terrain of the current level and the
//! entities standing on it.

use std::collections::HashSet;

use dungeon::{Grid, GridMap};
use hecs::{Entity, World};
use items::Item;
use rand::Rng;

use crate::ecs::{Attributes, Position, Resources};

pub use dungeon::is_near;

/// East, west, south, north.
const NEAR_OFFSETS: [(i32, i32); 4] = [(1, 0), (-1, 0), (0, 1), (0, -1)];

/// Read-only view over one level: its map plus the entities whose
/// `Position.z` matches it.
#[derive(Clone, Copy)]
pub struct Spatial<'a> {
    pub world: &'a World,
    pub map: &'a GridMap,
    pub level: i32,
}

impl<'a> Spatial<'a> {
    pub fn new(world: &'a World, map: &'a GridMap, level: i32) -> Self {
        Self { world, map, level }
    }

    /// View of the level the player is currently on.
    pub fn current(world: &'a World, resources: &'a Resources) -> Self {
        Self::new(world, resources.dungeon.current_level(), resources.level())
    }

    /// Cells occupied by any entity on this level.
    pub fn occupied(&self) -> HashSet<(i32, i32)> {
        self.world
            .query::<&Position>()
            .iter()
            .filter(|(_, pos)| pos.z == self.level)
            .map(|(_, pos)| pos.xy())
            .collect()
    }

    /// First entity standing on the cell, if any.
    pub fn entity_at(&self, x: i32, y: i32) -> Option<Entity> {
        self.world
            .query::<&Position>()
            .iter()
            .find(|(_, pos)| pos.z == self.level && pos.x == x && pos.y == y)
            .map(|(entity, _)| entity)
    }

    /// A living entity (one with Attributes) on the cell.
    pub fn actor_at(&self, x: i32, y: i32) -> Option<Entity> {
        self.world
            .query::<(&Position, &Attributes)>()
            .iter()
            .find(|(_, (pos, _))| pos.z == self.level && pos.x == x && pos.y == y)
            .map(|(entity, _)| entity)
    }

    /// Items lying on the cell, in no particular order.
    pub fn items_at(&self, x: i32, y: i32) -> Vec<Entity> {
        self.world
            .query::<(&Position, &Item)>()
            .iter()
            .filter(|(_, (pos, _))| pos.z == self.level && pos.x == x && pos.y == y)
            .map(|(entity, _)| entity)
            .collect()
    }

    /// In bounds, not a wall, and nobody on this level stands there.
    pub fn is_walkable(&self, x: i32, y: i32) -> bool {
        self.map.in_bounds(x, y) && !self.map.is_wall(x, y) && self.entity_at(x, y).is_none()
    }

    /// A single move an actor standing on `from` may take onto `to`.
    pub fn is_legal_step(&self, from: (i32, i32), to: (i32, i32)) -> bool {
        dungeon::is_legal_step(from, to, |x, y| self.is_walkable(x, y))
    }

    pub fn random_open_position<R: Rng>(&self, rng: &mut R, attempts: u32) -> Option<(i32, i32)> {
        let occupied = self.occupied();
        self.map.random_open_position(rng, attempts, |x, y| {
            !self.map.is_wall(x, y) && !occupied.contains(&(x, y))
        })
    }

    /// First walkable cell in row-major order.
    pub fn player_start_position(&self) -> Option<(i32, i32)> {
        let occupied = self.occupied();
        self.map
            .first_open_position(|x, y| !self.map.is_wall(x, y) && !occupied.contains(&(x, y)))
    }

    /// First walkable orthogonal neighbour, checked east, west, south, north.
    pub fn open_position_near(&self, x: i32, y: i32) -> Option<(i32, i32)> {
        NEAR_OFFSETS
            .iter()
            .map(|(dx, dy)| (x + dx, y + dy))
            .find(|&(nx, ny)| self.is_walkable(nx, ny))
    }

    /// Walkability snapshot for one path request. `start` and `goal` are
    /// forced walkable so a mover can route from its own cell to an
    /// occupied one.
    pub fn walkability(&self, start: (i32, i32), goal: (i32, i32)) -> Grid<bool> {
        let occupied = self.occupied();
        let mut grid = Grid::new(self.map.width(), self.map.height(), false);
        for ((x, y), cell) in self.map.cells().iter() {
            grid.set(x, y, !cell.is_wall() && !occupied.contains(&(x, y)));
        }
        for (x, y) in [start, goal] {
            if !self.map.is_wall(x, y) {
                grid.set(x, y, true);
            }
        }
        grid
    }

    /// Route from `start` (exclusive) to `goal` (inclusive); empty when
    /// there is none.
    pub fn find_path(&self, start: (i32, i32), goal: (i32, i32)) -> Vec<(i32, i32)> {
        dungeon::find_path(&self.walkability(start, goal), start, goal)
    }

    /// True when `target` is lit in the field of view from `observer`.
    pub fn can_see(&self, observer: (i32, i32), target: (i32, i32), radius: i32) -> bool {
        dungeon::can_see(observer, target, self.map.resistance_map(), radius)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ecs::GameConfig;
    use dungeon::TerrainType;
    use rand::SeedableRng;
    use rand_pcg::Pcg64;

    fn room() -> GridMap {
        GridMap::from_ascii(&[
            "#######",
            "#.....#",
            "#.....#",
            "#.....#",
            "#######",
        ])
    }

    #[test]
    fn walkable_means_floor_and_unoccupied() {
        let map = room();
        let mut world = World::new();
        world.spawn((Position::new(2, 2, 0),));
        world.spawn((Position::new(3, 3, 1),)); // different level
        let spatial = Spatial::new(&world, &map, 0);

        assert!(!spatial.is_walkable(0, 0));
        assert!(!spatial.is_walkable(2, 2));
        assert!(spatial.is_walkable(3, 3));
        assert!(!spatial.is_walkable(-1, 2));
        assert!(spatial.entity_at(2, 2).is_some());
        assert!(spatial.entity_at(3, 3).is_none());
    }

    #[test]
    fn occupants_close_a_diagonal_gap_like_walls() {
        let map = room();
        let mut world = World::new();
        world.spawn((Position::new(2, 1, 0),));
        let spatial = Spatial::new(&world, &map, 0);
        assert!(spatial.is_legal_step((1, 1), (2, 2)));

        world.spawn((Position::new(1, 2, 0),));
        let spatial = Spatial::new(&world, &map, 0);
        assert!(!spatial.is_legal_step((1, 1), (2, 2)));
        assert!(!spatial.is_legal_step((1, 1), (2, 1)));
    }

    #[test]
    fn player_start_is_first_open_cell_row_major() {
        let map = room();
        let mut world = World::new();
        world.spawn((Position::new(1, 1, 0),));
        let spatial = Spatial::new(&world, &map, 0);
        assert_eq!(spatial.player_start_position(), Some((2, 1)));
    }

    #[test]
    fn open_position_near_prefers_east_then_west() {
        let map = room();
        let mut world = World::new();
        world.spawn((Position::new(3, 2, 0),));
        let spatial = Spatial::new(&world, &map, 0);
        assert_eq!(spatial.open_position_near(2, 2), Some((1, 2)));
        assert_eq!(spatial.open_position_near(1, 2), Some((2, 2)));

        let closet = GridMap::from_ascii(&["###", "#.#", "###"]);
        let spatial = Spatial::new(&world, &closet, 0);
        assert_eq!(spatial.open_position_near(1, 1), None);
    }

    #[test]
    fn path_may_end_on_an_occupied_goal() {
        let map = room();
        let mut world = World::new();
        world.spawn((Position::new(1, 1, 0),));
        world.spawn((Position::new(5, 1, 0),));
        let spatial = Spatial::new(&world, &map, 0);
        let path = spatial.find_path((1, 1), (5, 1));
        assert_eq!(path.len(), 4);
        assert_eq!(path.last(), Some(&(5, 1)));
    }

    #[test]
    fn random_open_position_skips_occupants() {
        let map = GridMap::from_ascii(&["####", "#..#", "####"]);
        let mut world = World::new();
        world.spawn((Position::new(1, 1, 0),));
        let spatial = Spatial::new(&world, &map, 0);
        let mut rng = Pcg64::seed_from_u64(GameConfig::default().seed);
        for _ in 0..20 {
            assert_eq!(spatial.random_open_position(&mut rng, 100), Some((2, 1)));
        }
    }
}
