// src/dungeon/src/fov.rs
//! Recursive shadow casting over a resistance map.
//!
//! Visibility is observer-centric. Running the algorithm from A and from B
//! can disagree about whether they see each other near wall corners; callers
//! that need "can the monster see the player" must always cast from the
//! monster, and must not assume the answer is mutual.

use crate::map::Grid;

/// Octant transforms: (xx, xy, yx, yy) for each of the eight octants.
const OCTANTS: [(i32, i32, i32, i32); 8] = [
    (1, 0, 0, 1),
    (0, 1, 1, 0),
    (0, -1, 1, 0),
    (-1, 0, 0, 1),
    (-1, 0, 0, -1),
    (0, -1, -1, 0),
    (0, 1, -1, 0),
    (1, 0, 0, -1),
];

struct Caster<'a> {
    resistance: &'a Grid<f32>,
    light: Grid<f32>,
    origin: (i32, i32),
    radius: i32,
}

impl Caster<'_> {
    fn opaque(&self, x: i32, y: i32) -> bool {
        self.resistance.get(x, y).is_none_or(|r| *r >= 1.0)
    }

    fn illuminate(&mut self, x: i32, y: i32, dx: i32, dy: i32) {
        let distance = ((dx * dx + dy * dy) as f32).sqrt();
        if distance <= self.radius as f32 {
            let brightness = 1.0 - distance / (self.radius as f32 + 1.0);
            if let Some(cell) = self.light.get_mut(x, y) {
                *cell = cell.max(brightness);
            }
        }
    }

    fn cast(&mut self, row: i32, mut start: f32, end: f32, octant: (i32, i32, i32, i32)) {
        if start < end {
            return;
        }
        let (xx, xy, yx, yy) = octant;
        let mut new_start = 0.0;

        for distance in row..=self.radius {
            let dy = -distance;
            let mut blocked = false;

            for dx in -distance..=0 {
                let map_x = self.origin.0 + dx * xx + dy * xy;
                let map_y = self.origin.1 + dx * yx + dy * yy;
                let left_slope = (dx as f32 - 0.5) / (dy as f32 + 0.5);
                let right_slope = (dx as f32 + 0.5) / (dy as f32 - 0.5);

                if start < right_slope {
                    continue;
                } else if end > left_slope {
                    break;
                }

                self.illuminate(map_x, map_y, dx, dy);

                let opaque = self.opaque(map_x, map_y);
                if blocked {
                    if opaque {
                        new_start = right_slope;
                    } else {
                        blocked = false;
                        start = new_start;
                    }
                } else if opaque && distance < self.radius {
                    blocked = true;
                    self.cast(distance + 1, start, left_slope, octant);
                    new_start = right_slope;
                }
            }

            if blocked {
                break;
            }
        }
    }
}

/// Computes per-cell illumination from `(origin_x, origin_y)`.
///
/// The origin gets 1.0; a visible cell at Euclidean distance `d <= radius`
/// gets `1 - d / (radius + 1)`, which is always positive. Occluded and
/// out-of-range cells stay 0. Opaque cells are lit when reached but hide
/// whatever lies behind them.
pub fn field_of_view(origin_x: i32, origin_y: i32, resistance: &Grid<f32>, radius: i32) -> Grid<f32> {
    let mut caster = Caster {
        resistance,
        light: Grid::new(resistance.width(), resistance.height(), 0.0),
        origin: (origin_x, origin_y),
        radius: radius.max(0),
    };
    if !resistance.in_bounds(origin_x, origin_y) {
        return caster.light;
    }
    caster.light.set(origin_x, origin_y, 1.0);
    for octant in OCTANTS {
        caster.cast(1, 1.0, 0.0, octant);
    }
    caster.light
}

/// True iff `target` receives positive light when casting from `observer`.
pub fn can_see(observer: (i32, i32), target: (i32, i32), resistance: &Grid<f32>, radius: i32) -> bool {
    field_of_view(observer.0, observer.1, resistance, radius)
        .get(target.0, target.1)
        .is_some_and(|light| *light > 0.0)
}
