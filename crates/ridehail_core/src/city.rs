//! Toroidal grid city: locations, compass directions and wraparound distances.
//!
//! The city is an `N x N` grid whose edges wrap, so every location has four
//! neighbours and the distance between two points is the Manhattan distance
//! taken the short way around each axis.

use bevy_ecs::prelude::Resource;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, ConfigResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Location {
    pub x: u32,
    pub y: u32,
}

impl Location {
    pub const fn new(x: u32, y: u32) -> Self {
        Self { x, y }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    North,
    East,
    South,
    West,
}

impl Direction {
    pub const ALL: [Direction; 4] = [
        Direction::North,
        Direction::East,
        Direction::South,
        Direction::West,
    ];

    pub fn reverse(self) -> Self {
        match self {
            Direction::North => Direction::South,
            Direction::East => Direction::West,
            Direction::South => Direction::North,
            Direction::West => Direction::East,
        }
    }

    /// The three directions that do not double back on `self`, in a fixed order.
    pub fn forward_choices(self) -> [Direction; 3] {
        match self {
            Direction::North => [Direction::West, Direction::North, Direction::East],
            Direction::East => [Direction::North, Direction::East, Direction::South],
            Direction::South => [Direction::East, Direction::South, Direction::West],
            Direction::West => [Direction::South, Direction::West, Direction::North],
        }
    }

    pub fn random<R: Rng>(rng: &mut R) -> Self {
        Self::ALL[rng.gen_range(0..Self::ALL.len())]
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Resource)]
pub struct City {
    size: u32,
}

impl City {
    pub fn new(size: u32) -> ConfigResult<Self> {
        if size == 0 {
            return Err(ConfigError::ZeroCitySize);
        }
        Ok(Self { size })
    }

    pub fn size(&self) -> u32 {
        self.size
    }

    /// Largest wraparound distance between any two locations.
    pub fn max_distance(&self) -> u32 {
        2 * (self.size / 2)
    }

    pub fn contains(&self, location: Location) -> bool {
        location.x < self.size && location.y < self.size
    }

    fn axis_distance(&self, a: u32, b: u32) -> u32 {
        let d = a.abs_diff(b);
        d.min(self.size - d)
    }

    /// Manhattan distance with wraparound on both axes.
    pub fn distance(&self, a: Location, b: Location) -> u32 {
        self.axis_distance(a.x, b.x) + self.axis_distance(a.y, b.y)
    }

    /// Moves one unit in `direction`, wrapping at the edges.
    pub fn step(&self, from: Location, direction: Direction) -> Location {
        let n = self.size;
        match direction {
            Direction::North => Location::new(from.x, (from.y + 1) % n),
            Direction::East => Location::new((from.x + 1) % n, from.y),
            Direction::South => Location::new(from.x, (from.y + n - 1) % n),
            Direction::West => Location::new((from.x + n - 1) % n, from.y),
        }
    }

    /// Signed shortest displacement from `from` to `to` along one axis.
    /// An exact half-city gap resolves in the positive direction.
    fn axis_offset(&self, from: u32, to: u32) -> i64 {
        let n = i64::from(self.size);
        let forward = (i64::from(to) - i64::from(from)).rem_euclid(n);
        if forward * 2 <= n {
            forward
        } else {
            forward - n
        }
    }

    /// First leg of the direct route from `from` to `to`: close the x gap, then y.
    /// Returns `None` when already there.
    pub fn heading(&self, from: Location, to: Location) -> Option<Direction> {
        let dx = self.axis_offset(from.x, to.x);
        if dx > 0 {
            return Some(Direction::East);
        }
        if dx < 0 {
            return Some(Direction::West);
        }
        let dy = self.axis_offset(from.y, to.y);
        match dy.signum() {
            1 => Some(Direction::North),
            -1 => Some(Direction::South),
            _ => None,
        }
    }

    /// Wraps an arbitrary signed offset from `origin` back onto the grid.
    pub fn offset(&self, origin: Location, dx: i64, dy: i64) -> Location {
        let n = i64::from(self.size);
        let x = (i64::from(origin.x) + dx).rem_euclid(n);
        let y = (i64::from(origin.y) + dy).rem_euclid(n);
        Location::new(x as u32, y as u32)
    }

    pub fn random_location<R: Rng>(&self, rng: &mut R) -> Location {
        Location::new(rng.gen_range(0..self.size), rng.gen_range(0..self.size))
    }

    /// Uniform location in the central square `[N/4, 3N/4)` on both axes.
    /// Small cities without a proper centre fall back to the whole grid.
    pub fn random_central_location<R: Rng>(&self, rng: &mut R) -> Location {
        let lo = self.size / 4;
        let hi = self.size - self.size / 4;
        if hi <= lo {
            return self.random_location(rng);
        }
        Location::new(rng.gen_range(lo..hi), rng.gen_range(lo..hi))
    }
}
