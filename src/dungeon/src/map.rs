// src/dungeon/src/map.rs
use rand::Rng;
use serde::{Deserialize, Serialize};
use strum::Display;

/// Dense row-major 2D buffer used for terrain, light and walkability grids.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Grid<T> {
    width: i32,
    height: i32,
    cells: Vec<T>,
}

impl<T: Clone> Grid<T> {
    pub fn new(width: i32, height: i32, fill: T) -> Self {
        let width = width.max(0);
        let height = height.max(0);
        Self {
            width,
            height,
            cells: vec![fill; (width * height) as usize],
        }
    }
}

impl<T> Grid<T> {
    pub fn width(&self) -> i32 {
        self.width
    }

    pub fn height(&self) -> i32 {
        self.height
    }

    pub fn in_bounds(&self, x: i32, y: i32) -> bool {
        x >= 0 && y >= 0 && x < self.width && y < self.height
    }

    fn index_of(&self, x: i32, y: i32) -> Option<usize> {
        self.in_bounds(x, y)
            .then(|| (y * self.width + x) as usize)
    }

    pub fn get(&self, x: i32, y: i32) -> Option<&T> {
        self.index_of(x, y).map(|i| &self.cells[i])
    }

    pub fn get_mut(&mut self, x: i32, y: i32) -> Option<&mut T> {
        self.index_of(x, y).map(move |i| &mut self.cells[i])
    }

    /// Returns `false` when the coordinate is out of bounds.
    pub fn set(&mut self, x: i32, y: i32, value: T) -> bool {
        match self.get_mut(x, y) {
            Some(slot) => {
                *slot = value;
                true
            }
            None => false,
        }
    }

    /// Iterates cells in row-major order together with their coordinates.
    pub fn iter(&self) -> impl Iterator<Item = ((i32, i32), &T)> + '_ {
        let width = self.width;
        self.cells
            .iter()
            .enumerate()
            .map(move |(i, cell)| (((i as i32) % width, (i as i32) / width), cell))
    }
}

/// 地形类型
#[derive(Clone, Copy, Debug, Default, Display, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TerrainType {
    #[default]
    Floor,
    Wall,
    DeepWater,
    ShallowWater,
    Other,
}

impl TerrainType {
    fn from_glyph(glyph: char) -> Self {
        match glyph {
            '#' => TerrainType::Wall,
            '.' => TerrainType::Floor,
            '~' => TerrainType::DeepWater,
            ',' => TerrainType::ShallowWater,
            _ => TerrainType::Other,
        }
    }
}

/// 表示地图中的一个格子
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cell {
    pub terrain: TerrainType,
}

impl Cell {
    pub fn new(terrain: TerrainType) -> Self {
        Self { terrain }
    }

    pub fn is_wall(&self) -> bool {
        self.terrain == TerrainType::Wall
    }

    pub fn is_deep_water(&self) -> bool {
        self.terrain == TerrainType::DeepWater
    }

    pub fn is_shallow_water(&self) -> bool {
        self.terrain == TerrainType::ShallowWater
    }
}

/// A generated level: terrain cells plus the cached resistance map fed to FOV.
///
/// The map knows nothing about entities. Queries that have to account for
/// occupancy take an `is_open` predicate supplied by the caller.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GridMap {
    cells: Grid<Cell>,
    resistance: Grid<f32>,
}

impl GridMap {
    pub fn new(width: i32, height: i32, terrain: TerrainType) -> Self {
        let cells = Grid::new(width, height, Cell::new(terrain));
        let resistance = Self::resistance_of(&cells);
        Self { cells, resistance }
    }

    /// Builds a map from ASCII rows: `#` wall, `.` floor, `~` deep water,
    /// `,` shallow water, anything else `Other`. Short rows are padded with walls.
    pub fn from_ascii(rows: &[&str]) -> Self {
        let height = rows.len() as i32;
        let width = rows.iter().map(|r| r.chars().count()).max().unwrap_or(0) as i32;
        let mut cells = Grid::new(width, height, Cell::new(TerrainType::Wall));
        for (y, row) in rows.iter().enumerate() {
            for (x, glyph) in row.chars().enumerate() {
                cells.set(x as i32, y as i32, Cell::new(TerrainType::from_glyph(glyph)));
            }
        }
        let resistance = Self::resistance_of(&cells);
        Self { cells, resistance }
    }

    fn resistance_of(cells: &Grid<Cell>) -> Grid<f32> {
        let mut resistance = Grid::new(cells.width(), cells.height(), 0.0);
        for ((x, y), cell) in cells.iter() {
            if cell.is_wall() {
                resistance.set(x, y, 1.0);
            }
        }
        resistance
    }

    pub fn width(&self) -> i32 {
        self.cells.width()
    }

    pub fn height(&self) -> i32 {
        self.cells.height()
    }

    pub fn in_bounds(&self, x: i32, y: i32) -> bool {
        self.cells.in_bounds(x, y)
    }

    pub fn cell(&self, x: i32, y: i32) -> Option<&Cell> {
        self.cells.get(x, y)
    }

    /// Generator-side mutation; keeps the resistance cache in sync.
    pub fn set_terrain(&mut self, x: i32, y: i32, terrain: TerrainType) -> bool {
        if !self.cells.set(x, y, Cell::new(terrain)) {
            return false;
        }
        let opacity = if terrain == TerrainType::Wall { 1.0 } else { 0.0 };
        self.resistance.set(x, y, opacity)
    }

    /// Out-of-bounds counts as wall.
    pub fn is_wall(&self, x: i32, y: i32) -> bool {
        self.cell(x, y).is_none_or(Cell::is_wall)
    }

    pub fn is_deep_water(&self, x: i32, y: i32) -> bool {
        self.cell(x, y).is_some_and(Cell::is_deep_water)
    }

    /// 1.0 opaque, 0.0 transparent.
    pub fn resistance_map(&self) -> &Grid<f32> {
        &self.resistance
    }

    pub fn cells(&self) -> &Grid<Cell> {
        &self.cells
    }

    /// First open cell in row-major scan order.
    pub fn first_open_position<F>(&self, is_open: F) -> Option<(i32, i32)>
    where
        F: Fn(i32, i32) -> bool,
    {
        (0..self.height())
            .flat_map(|y| (0..self.width()).map(move |x| (x, y)))
            .find(|&(x, y)| is_open(x, y))
    }

    /// Rejection-samples up to `attempts` cells, then falls back to a
    /// row-major scan. `None` only when no cell is open at all.
    pub fn random_open_position<R, F>(
        &self,
        rng: &mut R,
        attempts: u32,
        is_open: F,
    ) -> Option<(i32, i32)>
    where
        R: Rng,
        F: Fn(i32, i32) -> bool,
    {
        if self.width() == 0 || self.height() == 0 {
            return None;
        }
        for _ in 0..attempts {
            let x = rng.random_range(0..self.width());
            let y = rng.random_range(0..self.height());
            if is_open(x, y) {
                return Some((x, y));
            }
        }
        tracing::warn!(attempts, "random open cell sampling exhausted, scanning map");
        self.first_open_position(is_open)
    }
}

/// Chebyshev distance: the number of king moves between two cells.
pub fn chebyshev(a: (i32, i32), b: (i32, i32)) -> i32 {
    (a.0 - b.0).abs().max((a.1 - b.1).abs())
}

/// True when `b` is `a` itself or one of its eight neighbours.
pub fn is_near(a: (i32, i32), b: (i32, i32)) -> bool {
    chebyshev(a, b) <= 1
}

/// One king move from `from` onto an open `to`. A diagonal move may not
/// slip between two blocked orthogonal cells.
pub fn is_legal_step<F>(from: (i32, i32), to: (i32, i32), open: F) -> bool
where
    F: Fn(i32, i32) -> bool,
{
    if chebyshev(from, to) != 1 || !open(to.0, to.1) {
        return false;
    }
    from.0 == to.0 || from.1 == to.1 || open(to.0, from.1) || open(from.0, to.1)
}
