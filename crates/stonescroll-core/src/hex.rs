//! Axial hex coordinates and the six neighbor directions.
//!
//! This module provides the pure geometry every other module builds on:
//! - `HexCoord`: Identifies an individual hex cell on the board
//! - `Direction`: The six fixed neighbor offsets
//! - Pixel conversion for a pointy-top layout, with cube rounding
//!
//! Axial coordinates keep neighbor and rotation math to a couple of additions,
//! which is all the pattern matcher and the path search need.

use serde::{Deserialize, Serialize};

/// Default unit size (hex radius in pixels) used by the rendering collaborator
pub const DEFAULT_HEX_SIZE: f64 = 30.0;

/// Two pixel positions closer than this are the same hex
pub const SAME_HEX_EPSILON: f64 = 5.0;

/// Direction of a neighbor relative to a hex
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    /// East (right)
    East,
    /// Southeast (bottom-right)
    SouthEast,
    /// Southwest (bottom-left)
    SouthWest,
    /// West (left)
    West,
    /// Northwest (top-left)
    NorthWest,
    /// Northeast (top-right)
    NorthEast,
}

impl Direction {
    /// All directions in clockwise order starting from East
    pub const ALL: [Direction; 6] = [
        Direction::East,
        Direction::SouthEast,
        Direction::SouthWest,
        Direction::West,
        Direction::NorthWest,
        Direction::NorthEast,
    ];

    /// Unit offset for this direction
    pub const fn offset(self) -> HexCoord {
        match self {
            Direction::East => HexCoord::new(1, 0),
            Direction::SouthEast => HexCoord::new(0, 1),
            Direction::SouthWest => HexCoord::new(-1, 1),
            Direction::West => HexCoord::new(-1, 0),
            Direction::NorthWest => HexCoord::new(0, -1),
            Direction::NorthEast => HexCoord::new(1, -1),
        }
    }
}

/// A board cell in axial form. East is +q, south-east is +r, and the cube
/// coordinate `s` is derived from the other two.
///
/// Pattern offsets reuse this type, so it also supports addition.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default,
)]
pub struct HexCoord {
    pub q: i32,
    pub r: i32,
}

impl HexCoord {
    /// The origin hex
    pub const ORIGIN: HexCoord = HexCoord::new(0, 0);

    pub const fn new(q: i32, r: i32) -> Self {
        Self { q, r }
    }

    /// Cube coordinate, always `-q - r`
    pub const fn s(&self) -> i32 {
        -self.q - self.r
    }

    /// Neighbors in `Direction::ALL` order
    pub fn neighbors(&self) -> [HexCoord; 6] {
        Direction::ALL.map(|dir| self.neighbor(dir))
    }

    pub fn neighbor(&self, direction: Direction) -> HexCoord {
        *self + direction.offset()
    }

    /// Whether `other` is one of the six neighbors
    pub fn is_adjacent(&self, other: &HexCoord) -> bool {
        self.distance_to(other) == 1
    }

    /// Steps between two cells, saturating at `u32::MAX` for cells at the
    /// far ends of the coordinate range
    pub fn distance_to(&self, other: &HexCoord) -> u32 {
        let dq = i64::from(self.q) - i64::from(other.q);
        let dr = i64::from(self.r) - i64::from(other.r);
        let distance = dq.abs().max(dr.abs()).max((dq + dr).abs());
        u32::try_from(distance).unwrap_or(u32::MAX)
    }

    /// Rotate around the origin by `steps` × 60° clockwise.
    ///
    /// Negative steps rotate counterclockwise; steps wrap modulo 6.
    pub fn rotate(&self, steps: i32) -> HexCoord {
        let mut hex = *self;
        for _ in 0..steps.rem_euclid(6) {
            hex = HexCoord::new(-hex.r, hex.q + hex.r);
        }
        hex
    }

    /// All hexes at exactly `radius` steps, clockwise starting from the
    /// East-most corner
    pub fn ring(&self, radius: u32) -> Vec<HexCoord> {
        if radius == 0 {
            return vec![*self];
        }

        let mut results = Vec::with_capacity(6 * radius as usize);
        let radius = radius as i32;
        let mut hex = *self + Direction::East.offset().scale(radius);
        // Walking SouthWest from the East corner keeps the ring clockwise
        for dir in [
            Direction::SouthWest,
            Direction::West,
            Direction::NorthWest,
            Direction::NorthEast,
            Direction::East,
            Direction::SouthEast,
        ] {
            for _ in 0..radius {
                results.push(hex);
                hex = hex.neighbor(dir);
            }
        }
        results
    }

    /// This hex plus every ring up to `radius`
    pub fn spiral(&self, radius: u32) -> Vec<HexCoord> {
        (0..=radius).flat_map(|ring| self.ring(ring)).collect()
    }

    /// Multiply both components (used for tile spacing and ring walks)
    pub const fn scale(&self, factor: i32) -> HexCoord {
        HexCoord::new(self.q * factor, self.r * factor)
    }

    /// Pixel center of this cell, pointy-top, `hex_size` being the radius
    pub fn to_pixel(&self, hex_size: f64) -> (f64, f64) {
        let x = hex_size * (3.0_f64.sqrt() * self.q as f64 + 3.0_f64.sqrt() / 2.0 * self.r as f64);
        let y = hex_size * (3.0 / 2.0 * self.r as f64);
        (x, y)
    }

    /// Cell containing a pixel position
    pub fn from_pixel(x: f64, y: f64, hex_size: f64) -> Self {
        let q = (3.0_f64.sqrt() / 3.0 * x - 1.0 / 3.0 * y) / hex_size;
        let r = (2.0 / 3.0 * y) / hex_size;
        Self::axial_round(q, r)
    }

    /// Whether a pixel position lies on this hex's center, within `epsilon`
    pub fn same_pixel_hex(&self, x: f64, y: f64, hex_size: f64, epsilon: f64) -> bool {
        let (cx, cy) = self.to_pixel(hex_size);
        ((cx - x).powi(2) + (cy - y).powi(2)).sqrt() < epsilon
    }

    /// Cube rounding: fix up whichever component rounded furthest
    fn axial_round(q: f64, r: f64) -> Self {
        let s = -q - r;

        let mut rq = q.round();
        let mut rr = r.round();
        let rs = s.round();

        let q_diff = (rq - q).abs();
        let r_diff = (rr - r).abs();
        let s_diff = (rs - s).abs();

        if q_diff > r_diff && q_diff > s_diff {
            rq = -rr - rs;
        } else if r_diff > s_diff {
            rr = -rq - rs;
        }

        Self::new(rq as i32, rr as i32)
    }
}

impl std::ops::Add for HexCoord {
    type Output = HexCoord;

    fn add(self, other: HexCoord) -> HexCoord {
        HexCoord::new(self.q + other.q, self.r + other.r)
    }
}

impl std::ops::Sub for HexCoord {
    type Output = HexCoord;

    fn sub(self, other: HexCoord) -> HexCoord {
        HexCoord::new(self.q - other.q, self.r - other.r)
    }
}

impl std::fmt::Display for HexCoord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {})", self.q, self.r)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_neighbors_follow_direction_order() {
        let hex = HexCoord::new(2, -3);
        let neighbors = hex.neighbors();
        assert_eq!(neighbors[0], HexCoord::new(3, -3));
        assert_eq!(neighbors[3], HexCoord::new(1, -3));

        for (dir, neighbor) in Direction::ALL.iter().zip(neighbors) {
            assert_eq!(hex.neighbor(*dir), neighbor);
            assert!(hex.is_adjacent(&neighbor));
        }
        assert!(!hex.is_adjacent(&hex));
    }

    #[test]
    fn test_distance_is_max_cube_component() {
        let origin = HexCoord::ORIGIN;
        assert_eq!(origin.distance_to(&HexCoord::new(4, 0)), 4);
        assert_eq!(origin.distance_to(&HexCoord::new(1, 1)), 2);
        assert_eq!(HexCoord::new(-2, 3).distance_to(&HexCoord::new(2, -1)), 4);
        assert_eq!(HexCoord::new(5, -5).s(), 0);
    }

    #[test]
    fn test_distance_at_coordinate_extremes() {
        let low = HexCoord::new(i32::MIN, 0);
        let high = HexCoord::new(i32::MAX, i32::MAX);
        assert_eq!(HexCoord::ORIGIN.distance_to(&low), 1 << 31);
        assert_eq!(low.distance_to(&high), u32::MAX);
        assert!(!HexCoord::ORIGIN.is_adjacent(&low));
    }

    #[test]
    fn test_pixel_round_trip() {
        for q in -6..=6 {
            for r in -6..=6 {
                let hex = HexCoord::new(q, r);
                let (x, y) = hex.to_pixel(DEFAULT_HEX_SIZE);
                assert_eq!(HexCoord::from_pixel(x, y, DEFAULT_HEX_SIZE), hex);
            }
        }
    }

    #[test]
    fn test_from_pixel_rounds_to_nearest() {
        let hex = HexCoord::new(2, -1);
        let (x, y) = hex.to_pixel(DEFAULT_HEX_SIZE);
        assert_eq!(HexCoord::from_pixel(x + 4.0, y - 3.0, DEFAULT_HEX_SIZE), hex);
    }

    #[test]
    fn test_same_pixel_hex() {
        let hex = HexCoord::new(1, 1);
        let (x, y) = hex.to_pixel(DEFAULT_HEX_SIZE);
        assert!(hex.same_pixel_hex(x + 3.0, y, DEFAULT_HEX_SIZE, SAME_HEX_EPSILON));
        assert!(!hex.same_pixel_hex(x + 6.0, y, DEFAULT_HEX_SIZE, SAME_HEX_EPSILON));
    }

    #[test]
    fn test_rotate_steps() {
        let east = HexCoord::new(1, 0);
        assert_eq!(east.rotate(1), Direction::SouthEast.offset());
        assert_eq!(east.rotate(2), Direction::SouthWest.offset());
        assert_eq!(east.rotate(6), east);
        assert_eq!(east.rotate(-1), Direction::NorthEast.offset());

        // Rotation preserves distance from the origin
        let far = HexCoord::new(2, -1);
        for steps in 0..6 {
            assert_eq!(far.rotate(steps).distance_to(&HexCoord::ORIGIN), 2);
        }
    }

    #[test]
    fn test_ring_and_spiral_sizes() {
        let center = HexCoord::new(3, -2);
        assert_eq!(center.ring(0), vec![center]);
        assert_eq!(center.ring(1).len(), 6);
        assert_eq!(center.ring(2).len(), 12);
        assert_eq!(center.spiral(2).len(), 19);

        for hex in center.ring(2) {
            assert_eq!(center.distance_to(&hex), 2);
        }
    }
}
