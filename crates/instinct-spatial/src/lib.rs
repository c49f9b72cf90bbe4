//! Proximity database for agent sensing: a uniform-grid nearest-neighbour
//! index over proxied entities, filtered by entity category.
//!
//! The index is deliberately decoupled from the sensor graph. Callers insert
//! a proxy per entity, move proxies as entities move, and ask for the nearest
//! proxy of a given category within a bounded search radius.

use std::collections::HashMap;
use std::hash::Hash;
use std::ops::{BitOr, BitOrAssign};

use glam::Vec2;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors emitted when constructing a proximity index.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum GridError {
    /// Configuration values that cannot be used (e.g., zero grid cells).
    #[error("invalid configuration: {0}")]
    InvalidConfig(&'static str),
}

/// Bit-flag set identifying entity categories.
///
/// Sensors use a mask to say which categories they respond to; proximity
/// queries use the same mask to filter candidates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct KindMask(pub u32);

impl KindMask {
    /// The empty set: matches nothing.
    pub const EMPTY: Self = Self(0);

    /// Construct a mask from raw bits.
    pub const fn from_bits(bits: u32) -> Self {
        Self(bits)
    }

    /// Raw bit representation.
    pub const fn bits(self) -> u32 {
        self.0
    }

    /// True if the two masks share at least one category.
    pub const fn intersects(self, other: Self) -> bool {
        self.0 & other.0 != 0
    }

    /// True if no category bit is set.
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }
}

impl BitOr for KindMask {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl BitOrAssign for KindMask {
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}

#[derive(Debug, Clone, Copy)]
struct Proxy {
    position: Vec2,
    mask: KindMask,
    cell: usize,
}

/// Uniform-grid nearest-neighbour database.
///
/// The world rectangle `[min, max]` is cut into `cols x rows` cells; each
/// proxy lives in the bucket of the cell containing it. Positions outside the
/// bounds are clamped into the border cells, so wrap-around worlds stay
/// indexed.
#[derive(Debug, Clone)]
pub struct UniformGrid<K> {
    min: Vec2,
    max: Vec2,
    cols: usize,
    rows: usize,
    cell_size: Vec2,
    cells: Vec<Vec<K>>,
    proxies: HashMap<K, Proxy>,
}

impl<K: Copy + Eq + Hash> UniformGrid<K> {
    /// Create a grid over `[min, max]` with the given cell resolution.
    pub fn new(min: Vec2, max: Vec2, cols: usize, rows: usize) -> Result<Self, GridError> {
        if cols == 0 || rows == 0 {
            return Err(GridError::InvalidConfig(
                "grid needs at least one cell per axis",
            ));
        }
        if max.x <= min.x || max.y <= min.y {
            return Err(GridError::InvalidConfig("bounds must have positive extent"));
        }
        let extent = max - min;
        Ok(Self {
            min,
            max,
            cols,
            rows,
            cell_size: Vec2::new(extent.x / cols as f32, extent.y / rows as f32),
            cells: vec![Vec::new(); cols * rows],
            proxies: HashMap::new(),
        })
    }

    /// Number of proxies currently tracked.
    pub fn len(&self) -> usize {
        self.proxies.len()
    }

    /// True if no proxies are tracked.
    pub fn is_empty(&self) -> bool {
        self.proxies.is_empty()
    }

    fn col_of(&self, x: f32) -> usize {
        let clamped = x.clamp(self.min.x, self.max.x);
        (((clamped - self.min.x) / self.cell_size.x) as usize).min(self.cols - 1)
    }

    fn row_of(&self, y: f32) -> usize {
        let clamped = y.clamp(self.min.y, self.max.y);
        (((clamped - self.min.y) / self.cell_size.y) as usize).min(self.rows - 1)
    }

    fn cell_of(&self, position: Vec2) -> usize {
        self.row_of(position.y) * self.cols + self.col_of(position.x)
    }

    fn detach(&mut self, key: K, cell: usize) {
        let bucket = &mut self.cells[cell];
        if let Some(slot) = bucket.iter().position(|k| *k == key) {
            bucket.swap_remove(slot);
        }
    }

    /// Insert a proxy, replacing any previous entry for the same key.
    pub fn add_proxy(&mut self, key: K, position: Vec2, mask: KindMask) {
        if let Some(previous) = self.proxies.remove(&key) {
            self.detach(key, previous.cell);
        }
        let cell = self.cell_of(position);
        self.cells[cell].push(key);
        self.proxies.insert(
            key,
            Proxy {
                position,
                mask,
                cell,
            },
        );
    }

    /// Move an existing proxy. Unknown keys are ignored.
    pub fn update_proxy(&mut self, key: K, position: Vec2) {
        let cell = self.cell_of(position);
        let Some(proxy) = self.proxies.get_mut(&key) else {
            return;
        };
        let previous = proxy.cell;
        proxy.position = position;
        proxy.cell = cell;
        if previous != cell {
            self.detach(key, previous);
            self.cells[cell].push(key);
        }
    }

    /// Drop a proxy. Returns whether it was present.
    pub fn remove_proxy(&mut self, key: K) -> bool {
        match self.proxies.remove(&key) {
            Some(proxy) => {
                self.detach(key, proxy.cell);
                true
            }
            None => false,
        }
    }

    /// Nearest proxy to `position` within `radius` whose mask intersects
    /// `filter`, skipping `exclude`. Ties keep the first candidate seen.
    pub fn find_nearest(
        &self,
        position: Vec2,
        radius: f32,
        filter: KindMask,
        exclude: Option<K>,
    ) -> Option<K> {
        let col_lo = self.col_of(position.x - radius);
        let col_hi = self.col_of(position.x + radius);
        let row_lo = self.row_of(position.y - radius);
        let row_hi = self.row_of(position.y + radius);

        let radius_sq = radius * radius;
        let mut best: Option<(K, f32)> = None;

        for row in row_lo..=row_hi {
            for col in col_lo..=col_hi {
                for key in &self.cells[row * self.cols + col] {
                    if exclude == Some(*key) {
                        continue;
                    }
                    let proxy = &self.proxies[key];
                    if !proxy.mask.intersects(filter) {
                        continue;
                    }
                    let dist_sq = proxy.position.distance_squared(position);
                    if dist_sq > radius_sq {
                        continue;
                    }
                    if best.map_or(true, |(_, seen)| dist_sq < seen) {
                        best = Some((*key, dist_sq));
                    }
                }
            }
        }

        best.map(|(key, _)| key)
    }

    /// Position of a tracked proxy.
    pub fn position_of(&self, key: K) -> Option<Vec2> {
        self.proxies.get(&key).map(|proxy| proxy.position)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const LIGHT: KindMask = KindMask(1);
    const VEHICLE: KindMask = KindMask(2);

    fn grid() -> UniformGrid<u32> {
        UniformGrid::new(Vec2::ZERO, Vec2::new(100.0, 100.0), 10, 10).unwrap()
    }

    #[test]
    fn rejects_degenerate_configuration() {
        let empty = UniformGrid::<u32>::new(Vec2::ZERO, Vec2::new(100.0, 100.0), 0, 10);
        assert!(matches!(empty, Err(GridError::InvalidConfig(_))));

        let inverted = UniformGrid::<u32>::new(Vec2::new(5.0, 5.0), Vec2::ZERO, 10, 10);
        assert!(matches!(inverted, Err(GridError::InvalidConfig(_))));
    }

    #[test]
    fn finds_nearest_matching_proxy() {
        let mut grid = grid();
        grid.add_proxy(1, Vec2::new(10.0, 10.0), VEHICLE);
        grid.add_proxy(2, Vec2::new(35.0, 10.0), VEHICLE);
        grid.add_proxy(3, Vec2::new(18.0, 10.0), LIGHT);

        let found = grid.find_nearest(Vec2::new(20.0, 10.0), 50.0, VEHICLE, None);
        assert_eq!(found, Some(1));
    }

    #[test]
    fn filters_by_kind_mask() {
        let mut grid = grid();
        grid.add_proxy(1, Vec2::new(10.0, 10.0), VEHICLE);
        grid.add_proxy(2, Vec2::new(50.0, 50.0), LIGHT);

        let found = grid.find_nearest(Vec2::new(10.0, 10.0), 100.0, LIGHT, None);
        assert_eq!(found, Some(2));
    }

    #[test]
    fn excludes_the_querying_proxy() {
        let mut grid = grid();
        grid.add_proxy(1, Vec2::new(10.0, 10.0), VEHICLE);
        grid.add_proxy(2, Vec2::new(40.0, 40.0), VEHICLE);

        let found = grid.find_nearest(Vec2::new(10.0, 10.0), 100.0, VEHICLE, Some(1));
        assert_eq!(found, Some(2));
    }

    #[test]
    fn respects_the_search_radius() {
        let mut grid = grid();
        grid.add_proxy(1, Vec2::new(90.0, 90.0), VEHICLE);

        let found = grid.find_nearest(Vec2::new(10.0, 10.0), 20.0, VEHICLE, None);
        assert_eq!(found, None);
    }

    #[test]
    fn update_moves_a_proxy_between_cells() {
        let mut grid = grid();
        grid.add_proxy(1, Vec2::new(5.0, 5.0), VEHICLE);
        grid.update_proxy(1, Vec2::new(95.0, 95.0));

        let near_origin = grid.find_nearest(Vec2::new(5.0, 5.0), 15.0, VEHICLE, None);
        assert_eq!(near_origin, None);

        let near_corner = grid.find_nearest(Vec2::new(90.0, 90.0), 15.0, VEHICLE, None);
        assert_eq!(near_corner, Some(1));
        assert_eq!(grid.position_of(1), Some(Vec2::new(95.0, 95.0)));
    }

    #[test]
    fn remove_forgets_the_proxy() {
        let mut grid = grid();
        grid.add_proxy(1, Vec2::new(5.0, 5.0), VEHICLE);
        assert!(grid.remove_proxy(1));
        assert!(!grid.remove_proxy(1));
        assert!(grid.is_empty());
        assert_eq!(grid.find_nearest(Vec2::new(5.0, 5.0), 50.0, VEHICLE, None), None);
    }

    #[test]
    fn clamps_out_of_bounds_positions_into_border_cells() {
        let mut grid = grid();
        grid.add_proxy(1, Vec2::new(120.0, -10.0), VEHICLE);

        let found = grid.find_nearest(Vec2::new(99.0, 1.0), 30.0, VEHICLE, None);
        assert_eq!(found, Some(1));
    }
}
