// src/dungeon/src/path.rs
//! A* over an 8-connected walkability grid.
//!
//! Every step costs 1, diagonal or not, so the heuristic is Chebyshev
//! distance and an unobstructed path is exactly `chebyshev(start, goal)`
//! steps long. A diagonal step is refused when both orthogonal cells it
//! slips between are blocked.

use std::cmp::Reverse;
use std::collections::BinaryHeap;

use crate::map::{chebyshev, is_legal_step, Grid};

const NEIGHBOURS: [(i32, i32); 8] = [
    (0, -1),
    (1, 0),
    (0, 1),
    (-1, 0),
    (1, -1),
    (1, 1),
    (-1, 1),
    (-1, -1),
];

/// Open-list ordering: f, then h, then y, then x, then insertion order.
/// The tail of the key makes tie-breaking deterministic on symmetric maps.
type OpenKey = (u32, u32, i32, i32, u64);

fn walkable(grid: &Grid<bool>, x: i32, y: i32) -> bool {
    grid.get(x, y).copied().unwrap_or(false)
}

/// Finds a route from `start` to `goal`.
///
/// Returns the cells from `start` (exclusive) to `goal` (inclusive). The
/// result is empty when the goal is unreachable, either endpoint is out of
/// bounds, the goal is not walkable in the snapshot, or `start == goal`.
/// The start cell itself does not need to be walkable: it is usually
/// occupied by the mover.
pub fn find_path(grid: &Grid<bool>, start: (i32, i32), goal: (i32, i32)) -> Vec<(i32, i32)> {
    if !grid.in_bounds(start.0, start.1) || !walkable(grid, goal.0, goal.1) || start == goal {
        return Vec::new();
    }

    let width = grid.width();
    let index = |(x, y): (i32, i32)| (y * width + x) as usize;
    let node_count = (grid.width() * grid.height()) as usize;

    let mut best_g = vec![u32::MAX; node_count];
    let mut parent: Vec<Option<(i32, i32)>> = vec![None; node_count];
    let mut closed = vec![false; node_count];
    let mut open: BinaryHeap<Reverse<OpenKey>> = BinaryHeap::new();
    let mut insertion = 0u64;

    let h0 = chebyshev(start, goal) as u32;
    best_g[index(start)] = 0;
    open.push(Reverse((h0, h0, start.1, start.0, insertion)));

    while let Some(Reverse((_, _, y, x, _))) = open.pop() {
        let current = (x, y);
        let current_index = index(current);
        if closed[current_index] {
            continue;
        }
        closed[current_index] = true;

        if current == goal {
            return reconstruct(&parent, index, start, goal);
        }

        let g = best_g[current_index];
        for (dx, dy) in NEIGHBOURS {
            let next = (x + dx, y + dy);
            if !is_legal_step(current, next, |x, y| walkable(grid, x, y)) {
                continue;
            }
            let next_index = index(next);
            if closed[next_index] {
                continue;
            }
            let tentative = g.saturating_add(1);
            if tentative >= best_g[next_index] {
                continue;
            }
            best_g[next_index] = tentative;
            parent[next_index] = Some(current);

            let h = chebyshev(next, goal) as u32;
            insertion += 1;
            open.push(Reverse((tentative + h, h, next.1, next.0, insertion)));
        }
    }

    Vec::new()
}

fn reconstruct<F>(
    parent: &[Option<(i32, i32)>],
    index: F,
    start: (i32, i32),
    goal: (i32, i32),
) -> Vec<(i32, i32)>
where
    F: Fn((i32, i32)) -> usize,
{
    let mut path = vec![goal];
    let mut cursor = goal;
    while let Some(prev) = parent[index(cursor)] {
        if prev == start {
            break;
        }
        path.push(prev);
        cursor = prev;
    }
    path.reverse();
    path
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::map::GridMap;
    use proptest::prelude::*;

    fn snapshot(map: &GridMap) -> Grid<bool> {
        let mut grid = Grid::new(map.width(), map.height(), false);
        for ((x, y), cell) in map.cells().iter() {
            grid.set(x, y, !cell.is_wall());
        }
        grid
    }

    fn assert_contiguous(start: (i32, i32), path: &[(i32, i32)]) {
        let mut prev = start;
        for &step in path {
            assert_eq!(chebyshev(prev, step), 1, "{prev:?} -> {step:?}");
            prev = step;
        }
    }

    #[test]
    fn straight_line_excludes_start_includes_goal() {
        let map = GridMap::new(10, 3, crate::map::TerrainType::Floor);
        let path = find_path(&snapshot(&map), (1, 1), (5, 1));
        assert_eq!(path, vec![(2, 1), (3, 1), (4, 1), (5, 1)]);
    }

    #[test]
    fn routes_around_walls() {
        let map = GridMap::from_ascii(&[
            "#######",
            "#..#..#",
            "#..#..#",
            "#.....#",
            "#######",
        ]);
        let path = find_path(&snapshot(&map), (1, 1), (5, 1));
        assert_eq!(path.last(), Some(&(5, 1)));
        assert!(path.iter().all(|&(x, y)| !map.is_wall(x, y)));
        assert_contiguous((1, 1), &path);
        assert!(path.contains(&(3, 3)));
    }

    #[test]
    fn unreachable_goal_yields_empty_path() {
        let map = GridMap::from_ascii(&["#####", "#.#.#", "#####"]);
        assert!(find_path(&snapshot(&map), (1, 1), (3, 1)).is_empty());
        // goal is a wall
        assert!(find_path(&snapshot(&map), (1, 1), (2, 1)).is_empty());
        // out of bounds
        assert!(find_path(&snapshot(&map), (1, 1), (30, 1)).is_empty());
        assert!(find_path(&snapshot(&map), (1, 1), (1, 1)).is_empty());
    }

    #[test]
    fn no_diagonal_squeeze_between_two_walls() {
        let map = GridMap::from_ascii(&["####", "#.##", "##.#", "####"]);
        assert!(find_path(&snapshot(&map), (1, 1), (2, 2)).is_empty());
    }

    #[test]
    fn start_cell_may_be_blocked() {
        let map = GridMap::new(5, 5, crate::map::TerrainType::Floor);
        let mut grid = snapshot(&map);
        grid.set(0, 0, false);
        assert_eq!(find_path(&grid, (0, 0), (2, 2)), vec![(1, 1), (2, 2)]);
    }

    proptest! {
        #[test]
        fn corridor_path_length_is_chebyshev(
            sx in 0i32..30, sy in 0i32..5, gx in 0i32..30, gy in 0i32..5
        ) {
            prop_assume!((sx, sy) != (gx, gy));
            let map = GridMap::new(30, 5, crate::map::TerrainType::Floor);
            let path = find_path(&snapshot(&map), (sx, sy), (gx, gy));
            prop_assert_eq!(path.len() as i32, chebyshev((sx, sy), (gx, gy)));
            prop_assert_eq!(path.last().copied(), Some((gx, gy)));
        }
    }
}
