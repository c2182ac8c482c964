//! Dense wrap-around 2D grid. Each cell holds one value of type `V`, stored
//! row-major (`y * width + x`).

use crate::point::{MapExtent, Point};
use rayon::prelude::*;
use std::ops::{Index, IndexMut};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GridError {
    #[error("map extent must be non-empty (got {width}x{height})")]
    EmptyExtent { width: u32, height: u32 },
    #[error("map extent {width}x{height} exceeds supported maximum of {max} cells")]
    TooLarge { width: u32, height: u32, max: usize },
    #[error("grid needs {expected} values but {actual} were supplied")]
    LengthMismatch { expected: usize, actual: usize },
}

#[derive(Clone, Debug, PartialEq)]
pub struct Grid<V> {
    extent: MapExtent,
    data: Vec<V>,
}

impl<V: Clone> Grid<V> {
    pub fn new(extent: MapExtent, initial_value: V) -> Self {
        Self {
            extent,
            data: vec![initial_value; extent.size()],
        }
    }
}

impl<V> Grid<V> {
    pub fn from_fn(extent: MapExtent, f: impl FnMut(Point) -> V) -> Self {
        let data = extent.points().map(f).collect();
        Self { extent, data }
    }

    pub fn from_vec(extent: MapExtent, data: Vec<V>) -> Result<Self, GridError> {
        if data.len() != extent.size() {
            return Err(GridError::LengthMismatch {
                expected: extent.size(),
                actual: data.len(),
            });
        }
        Ok(Self { extent, data })
    }

    pub fn extent(&self) -> MapExtent {
        self.extent
    }

    pub fn width(&self) -> u32 {
        self.extent.width()
    }

    pub fn height(&self) -> u32 {
        self.extent.height()
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Applies `f` to the linear cell sequence. Every whole-grid reduction goes
    /// through here so the iteration order is defined in exactly one place.
    pub fn reduce<R>(&self, f: impl FnOnce(&[V]) -> R) -> R {
        f(&self.data)
    }

    pub fn fold<A>(&self, init: A, mut f: impl FnMut(A, &V) -> A) -> A {
        self.reduce(|cells| cells.iter().fold(init, |acc, v| f(acc, v)))
    }

    /// Cells with their points, row-major.
    pub fn iter(&self) -> impl Iterator<Item = (Point, &V)> {
        let extent = self.extent;
        self.data
            .iter()
            .enumerate()
            .map(move |(idx, v)| (extent.point_at(idx), v))
    }
}

impl<V: Send> Grid<V> {
    /// Parallel counterpart of [`Grid::from_fn`]. `f` sees only the point it is
    /// filling, so the result does not depend on scheduling.
    pub fn par_from_fn(extent: MapExtent, f: impl Fn(Point) -> V + Sync) -> Self {
        let data = (0..extent.size())
            .into_par_iter()
            .map(|idx| f(extent.point_at(idx)))
            .collect();
        Self { extent, data }
    }
}

impl<V: Copy> Grid<V> {
    pub fn get(&self, point: Point) -> V {
        self.data[self.extent.index_of(point)]
    }

    pub fn set(&mut self, point: Point, value: V) {
        let idx = self.extent.index_of(point);
        self.data[idx] = value;
    }
}

impl<V> Index<Point> for Grid<V> {
    type Output = V;

    fn index(&self, point: Point) -> &V {
        &self.data[self.extent.index_of(point)]
    }
}

impl<V> IndexMut<Point> for Grid<V> {
    fn index_mut(&mut self, point: Point) -> &mut V {
        let idx = self.extent.index_of(point);
        &mut self.data[idx]
    }
}
