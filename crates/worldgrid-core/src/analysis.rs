//! Statistical reductions over grids: extrema, value ranges, range-to-index
//! bucketing and predicate selection.
//!
//! Every extremum follows the same tie rule: the first candidate in iteration
//! order wins. Whole-grid variants iterate row-major through [`Grid::reduce`];
//! area variants iterate the area in the order it is given. Incomparable values
//! (NaN) never become or replace the candidate; a grid or area made only of
//! them panics.

use crate::grid::Grid;
use crate::point::{MapExtent, Point};
use serde::Serialize;
use std::ops::Sub;

/// Numeric cell types that can be placed on a linear scale.
pub trait GridScalar: Copy + PartialOrd {
    fn to_f64(self) -> f64;
}

macro_rules! impl_grid_scalar {
    ($($t:ty),* $(,)?) => {
        $(
            impl GridScalar for $t {
                #[inline]
                fn to_f64(self) -> f64 {
                    self as f64
                }
            }
        )*
    };
}

impl_grid_scalar!(u8, u16, u32, u64, usize, i8, i16, i32, i64, f32, f64);

/// Observed minimum and maximum. `maximum >= minimum` always holds.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct ValueRange<V> {
    minimum: V,
    maximum: V,
}

impl<V: Copy + PartialOrd> ValueRange<V> {
    pub fn new(minimum: V, maximum: V) -> Self {
        assert!(
            maximum >= minimum,
            "range maximum must not be below minimum"
        );
        Self { minimum, maximum }
    }

    pub fn minimum(&self) -> V {
        self.minimum
    }

    pub fn maximum(&self) -> V {
        self.maximum
    }

    pub fn contains(&self, value: V) -> bool {
        value >= self.minimum && value <= self.maximum
    }
}

impl<V: Copy + Sub<Output = V>> ValueRange<V> {
    pub fn difference(&self) -> V {
        self.maximum - self.minimum
    }
}

/// Maps `value` to an index into a container of `size` slots such that
/// `(value - min) / (max - min) ≈ index / (size - 1)`: the minimum lands on 0,
/// the maximum on `size - 1`.
///
/// A zero-width range maps everything to 0. `value` must lie within `range`;
/// values outside produce indices outside `0..size`. Panics if `size == 0`.
pub fn map_value_to_index<V: GridScalar>(value: V, range: &ValueRange<V>, size: usize) -> usize {
    assert!(size > 0, "cannot map a value into an empty index space");
    let minimum = range.minimum.to_f64();
    let difference = range.maximum.to_f64() - minimum;
    if difference == 0.0 {
        return 0;
    }
    let slope = (size - 1) as f64 / difference;
    (slope * (value.to_f64() - minimum)).round() as usize
}

/// Skips leading incomparable (NaN) items so they cannot seed a fold.
fn first_comparable<K, V: PartialOrd>(
    items: &mut impl Iterator<Item = (K, V)>,
) -> Option<(K, V)> {
    items.find(|(_, v)| v.partial_cmp(v).is_some())
}

fn first_max<K: Copy, V: Copy + PartialOrd>(
    mut items: impl Iterator<Item = (K, V)>,
) -> Option<(K, V)> {
    let first = first_comparable(&mut items)?;
    Some(items.fold(first, |best, item| {
        if item.1 > best.1 {
            item
        } else {
            best
        }
    }))
}

fn first_min_max<K: Copy, V: Copy + PartialOrd>(
    mut items: impl Iterator<Item = (K, V)>,
) -> Option<(V, V)> {
    let (_, first) = first_comparable(&mut items)?;
    Some(items.fold((first, first), |(min, max), (_, v)| {
        (if v < min { v } else { min }, if v > max { v } else { max })
    }))
}

/// Overwrites every listed point with `value`.
pub fn set_values<V: Copy>(
    grid: &mut Grid<V>,
    points: impl IntoIterator<Item = Point>,
    value: V,
) {
    for point in points {
        grid.set(point, value);
    }
}

/// Greatest value among `area`. Panics if `area` holds no comparable value.
pub fn maximum_in<V: Copy + PartialOrd>(
    grid: &Grid<V>,
    area: impl IntoIterator<Item = Point>,
) -> V {
    first_max(area.into_iter().map(|p| (p, grid.get(p))))
        .map(|(_, v)| v)
        .expect("maximum of an area without comparable values")
}

/// Greatest value on the whole grid.
pub fn maximum<V: Copy + PartialOrd>(grid: &Grid<V>) -> V {
    grid.reduce(|cells| first_max(cells.iter().copied().enumerate()))
        .map(|(_, v)| v)
        .expect("grid holds no comparable value")
}

/// Point of the first (row-major) cell holding the whole-grid maximum.
pub fn maximum_point<V: Copy + PartialOrd>(grid: &Grid<V>) -> Point {
    let extent = grid.extent();
    grid.reduce(|cells| first_max(cells.iter().copied().enumerate()))
        .map(|(idx, _)| extent.point_at(idx))
        .expect("grid holds no comparable value")
}

/// Range of values among `area`. Panics if `area` holds no comparable value.
pub fn range_in<V: Copy + PartialOrd>(
    grid: &Grid<V>,
    area: impl IntoIterator<Item = Point>,
) -> ValueRange<V> {
    let (min, max) = first_min_max(area.into_iter().map(|p| (p, grid.get(p))))
        .expect("range of an area without comparable values");
    ValueRange::new(min, max)
}

/// Range of values on the whole grid.
pub fn range<V: Copy + PartialOrd>(grid: &Grid<V>) -> ValueRange<V> {
    let (min, max) = grid
        .reduce(|cells| first_min_max(cells.iter().copied().enumerate()))
        .expect("grid holds no comparable value");
    ValueRange::new(min, max)
}

/// Every point of `extent` satisfying `predicate`, row-major.
pub fn select_points(extent: MapExtent, mut predicate: impl FnMut(Point) -> bool) -> Vec<Point> {
    extent.points().filter(|&p| predicate(p)).collect()
}

/// Counts cells per bucket after mapping each value through
/// [`map_value_to_index`] with the grid's own range. NaN cells land in bucket 0.
pub fn histogram<V: GridScalar>(grid: &Grid<V>, buckets: usize) -> Vec<usize> {
    let range = range(grid);
    let mut counts = vec![0usize; buckets];
    grid.reduce(|cells| {
        for &v in cells {
            counts[map_value_to_index(v, &range, buckets)] += 1;
        }
    });
    counts
}
