//! Map coordinates and the toroidal extent they live in.

use crate::grid::GridError;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::HashSet;

/// Integer cell coordinate. Only meaningful together with the extent of the
/// grid it indexes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Point {
    pub x: u32,
    pub y: u32,
}

impl Point {
    pub const fn new(x: u32, y: u32) -> Self {
        Self { x, y }
    }
}

/// Row-major: sorting points yields the same order as a grid's linear storage.
impl Ord for Point {
    fn cmp(&self, other: &Self) -> Ordering {
        (self.y, self.x).cmp(&(other.y, other.x))
    }
}

impl PartialOrd for Point {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

const OFFSETS_4: [(i32, i32); 4] = [(-1, 0), (1, 0), (0, -1), (0, 1)];
const OFFSETS_8: [(i32, i32); 8] = [
    (-1, -1),
    (0, -1),
    (1, -1),
    (-1, 0),
    (1, 0),
    (-1, 1),
    (0, 1),
    (1, 1),
];

/// Width and height of a wrap-around map.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MapExtent {
    width: u32,
    height: u32,
}

impl MapExtent {
    pub const MAX_CELLS: usize = 1 << 24;

    pub fn new(width: u32, height: u32) -> Self {
        Self::try_new(width, height).unwrap_or_else(|e| panic!("{e}"))
    }

    pub fn try_new(width: u32, height: u32) -> Result<Self, GridError> {
        if width == 0 || height == 0 {
            return Err(GridError::EmptyExtent { width, height });
        }
        let cells = (width as usize)
            .checked_mul(height as usize)
            .filter(|&cells| cells <= Self::MAX_CELLS);
        if cells.is_none() {
            return Err(GridError::TooLarge {
                width,
                height,
                max: Self::MAX_CELLS,
            });
        }
        Ok(Self { width, height })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Number of cells.
    pub fn size(&self) -> usize {
        self.width as usize * self.height as usize
    }

    pub fn contains(&self, point: Point) -> bool {
        point.x < self.width && point.y < self.height
    }

    /// Linear (row-major) index of `point`. Panics when the point lies outside.
    pub fn index_of(&self, point: Point) -> usize {
        assert!(
            self.contains(point),
            "point ({}, {}) outside {}x{} map",
            point.x,
            point.y,
            self.width,
            self.height
        );
        point.y as usize * self.width as usize + point.x as usize
    }

    /// Inverse of [`MapExtent::index_of`].
    pub fn point_at(&self, index: usize) -> Point {
        assert!(
            index < self.size(),
            "index {index} outside map of {} cells",
            self.size()
        );
        let width = self.width as usize;
        Point::new((index % width) as u32, (index / width) as u32)
    }

    /// Every point of the map in row-major order.
    pub fn points(&self) -> impl Iterator<Item = Point> {
        let (width, height) = (self.width, self.height);
        (0..height).flat_map(move |y| (0..width).map(move |x| Point::new(x, y)))
    }

    /// Offsets `point` by `(dx, dy)` with toroidal wrapping on both axes.
    pub fn wrap(&self, point: Point, dx: i32, dy: i32) -> Point {
        let x = (point.x as i64 + dx as i64).rem_euclid(self.width as i64);
        let y = (point.y as i64 + dy as i64).rem_euclid(self.height as i64);
        Point::new(x as u32, y as u32)
    }

    /// West, east, north, south.
    pub fn neighbors4(&self, point: Point) -> [Point; 4] {
        OFFSETS_4.map(|(dx, dy)| self.wrap(point, dx, dy))
    }

    /// The eight surrounding cells, row by row.
    pub fn neighbors8(&self, point: Point) -> [Point; 8] {
        OFFSETS_8.map(|(dx, dy)| self.wrap(point, dx, dy))
    }

    /// Points whose wrapped Chebyshev distance to `center` is at most `radius`,
    /// ordered by ring (center first), each ring row by row. A cell reached
    /// twice because the radius spans the whole map is listed once.
    pub fn points_within(&self, center: Point, radius: u32) -> Vec<Point> {
        let max_radius = radius.min(self.width.max(self.height));
        let span = 2 * u64::from(max_radius) + 1;
        // Only a ring wider or taller than the map can revisit a cell.
        let wraps = span > u64::from(self.width) || span > u64::from(self.height);
        let mut seen = wraps.then(HashSet::new);
        let mut out = Vec::with_capacity(span.pow(2).min(self.size() as u64) as usize);
        let mut push = |p: Point| {
            if seen.as_mut().map_or(true, |seen| seen.insert(p)) {
                out.push(p);
            }
        };
        push(self.wrap(center, 0, 0));
        let max_radius = max_radius as i32;
        for r in 1..=max_radius {
            for dy in -r..=r {
                for dx in -r..=r {
                    if dx.abs() != r && dy.abs() != r {
                        continue;
                    }
                    push(self.wrap(center, dx, dy));
                }
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ordering_is_row_major() {
        let mut pts = vec![Point::new(2, 0), Point::new(0, 1), Point::new(1, 0)];
        pts.sort();
        assert_eq!(
            pts,
            vec![Point::new(1, 0), Point::new(2, 0), Point::new(0, 1)]
        );
    }

    #[test]
    fn points_iterate_in_linear_order() {
        let extent = MapExtent::new(3, 2);
        for (idx, p) in extent.points().enumerate() {
            assert_eq!(extent.index_of(p), idx);
            assert_eq!(extent.point_at(idx), p);
        }
        assert_eq!(extent.points().count(), 6);
    }

    #[test]
    fn empty_extent_is_rejected() {
        assert_eq!(
            MapExtent::try_new(0, 4),
            Err(GridError::EmptyExtent {
                width: 0,
                height: 4
            })
        );
        assert!(matches!(
            MapExtent::try_new(u32::MAX, u32::MAX),
            Err(GridError::TooLarge { .. })
        ));
    }

    #[test]
    #[should_panic(expected = "outside")]
    fn index_of_out_of_bounds_panics() {
        MapExtent::new(4, 4).index_of(Point::new(4, 0));
    }

    #[test]
    fn wrap_is_toroidal() {
        let extent = MapExtent::new(5, 3);
        assert_eq!(extent.wrap(Point::new(0, 0), -1, -1), Point::new(4, 2));
        assert_eq!(extent.wrap(Point::new(4, 2), 1, 1), Point::new(0, 0));
        assert_eq!(extent.wrap(Point::new(2, 1), 12, -7), Point::new(4, 0));
    }

    #[test]
    fn corner_neighbors_wrap_around() {
        let extent = MapExtent::new(4, 4);
        assert_eq!(
            extent.neighbors4(Point::new(0, 0)),
            [
                Point::new(3, 0),
                Point::new(1, 0),
                Point::new(0, 3),
                Point::new(0, 1)
            ]
        );
        let n8 = extent.neighbors8(Point::new(3, 3));
        assert_eq!(n8[0], Point::new(2, 2));
        assert_eq!(n8[7], Point::new(0, 0));
    }

    #[test]
    fn points_within_orders_by_ring() {
        let extent = MapExtent::new(10, 10);
        let pts = extent.points_within(Point::new(5, 5), 1);
        assert_eq!(pts.len(), 9);
        assert_eq!(pts[0], Point::new(5, 5));
        assert_eq!(pts[1], Point::new(4, 4));
        assert_eq!(pts[8], Point::new(6, 6));

        let pts = extent.points_within(Point::new(0, 0), 2);
        assert_eq!(pts.len(), 25);
        assert!(pts.contains(&Point::new(8, 8)));
    }

    #[test]
    fn points_within_deduplicates_on_small_maps() {
        let extent = MapExtent::new(3, 2);
        let pts = extent.points_within(Point::new(1, 1), 5);
        assert_eq!(pts.len(), extent.size());
        assert_eq!(pts[0], Point::new(1, 1));
    }

    #[test]
    fn points_within_keeps_every_cell_of_a_fitting_ring() {
        let extent = MapExtent::new(5, 5);
        let pts = extent.points_within(Point::new(2, 2), 2);
        assert_eq!(pts.len(), 25);
        let mut sorted = pts.clone();
        sorted.sort();
        sorted.dedup();
        assert_eq!(sorted.len(), 25);

        // Wide enough horizontally, too short vertically.
        let strip = MapExtent::new(20, 4);
        let pts = strip.points_within(Point::new(10, 0), 2);
        let mut sorted = pts.clone();
        sorted.sort();
        sorted.dedup();
        assert_eq!(pts.len(), 20);
        assert_eq!(sorted.len(), 20);
    }
}
