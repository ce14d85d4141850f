//! Hex board geometry with axial coordinates

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

/// Number of hex rows on the board
pub const BOARD_ROWS: i16 = 9;

/// Hexes in an even row; odd rows hold one fewer and are shifted half a hex right
pub const BOARD_COLUMNS: i16 = 13;

/// Axial hex coordinates.
///
/// Identity is by value: two coordinates with the same `(q, r)` are equal and
/// hash the same, and [`HexCoord::key`] packs both into a single integer for
/// callers that want a dense key.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct HexCoord {
    pub q: i16,
    pub r: i16,
}

impl PartialOrd for HexCoord {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for HexCoord {
    fn cmp(&self, other: &Self) -> Ordering {
        // Row-major so iteration sweeps the board north to south
        (self.r, self.q).cmp(&(other.r, other.q))
    }
}

impl HexCoord {
    pub const fn new(q: i16, r: i16) -> Self {
        Self { q, r }
    }

    /// Build from offset (column, row) board coordinates
    pub const fn from_offset(column: i16, row: i16) -> Self {
        Self::new(column - (row - (row & 1)) / 2, row)
    }

    /// Packed integer key, unique per `(q, r)` pair
    pub fn key(&self) -> u32 {
        ((self.q as u16 as u32) << 16) | (self.r as u16 as u32)
    }

    pub fn from_key(key: u32) -> Self {
        Self::new((key >> 16) as u16 as i16, key as u16 as i16)
    }

    /// Offset column of this hex (0-based, odd rows shifted right)
    pub fn column(&self) -> i16 {
        self.q + (self.r - (self.r & 1)) / 2
    }

    /// Column in half-hex units; even rows give even values, odd rows odd ones
    pub fn doubled_column(&self) -> i16 {
        2 * self.column() + (self.r & 1)
    }

    /// Check if this hex is on the board
    pub fn is_on_board(&self) -> bool {
        if self.r < 0 || self.r >= BOARD_ROWS {
            return false;
        }
        let width = if self.r & 1 == 0 { BOARD_COLUMNS } else { BOARD_COLUMNS - 1 };
        let column = self.column();
        column >= 0 && column < width
    }

    /// Distance between two hexes
    pub fn distance_to(&self, other: HexCoord) -> u8 {
        let dq = (self.q - other.q).abs();
        let dr = (self.r - other.r).abs();
        let ds = ((self.q + self.r) - (other.q + other.r)).abs();
        ((dq + dr + ds) / 2) as u8
    }

    pub fn is_adjacent(&self, other: HexCoord) -> bool {
        self.distance_to(other) == 1
    }

    /// Get neighbor in a direction
    pub fn neighbor(&self, direction: Direction) -> HexCoord {
        let (dq, dr) = direction.vector();
        HexCoord::new(self.q + dq, self.r + dr)
    }

    /// All six neighbors, in [`Direction::ALL`] order (may be off board)
    pub fn neighbors(&self) -> [HexCoord; 6] {
        Direction::ALL.map(|d| self.neighbor(d))
    }

    pub fn offset_by(&self, dq: i16, dr: i16) -> HexCoord {
        HexCoord::new(self.q + dq, self.r + dr)
    }
}

impl fmt::Display for HexCoord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({},{})", self.q, self.r)
    }
}

// ============================================================================
// DIRECTIONS
// ============================================================================

/// Neighbor directions on a pointy-top board (north is decreasing `r`)
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    East,
    NorthEast,
    NorthWest,
    West,
    SouthWest,
    SouthEast,
}

impl Direction {
    pub const ALL: [Direction; 6] = [
        Direction::East,
        Direction::NorthEast,
        Direction::NorthWest,
        Direction::West,
        Direction::SouthWest,
        Direction::SouthEast,
    ];

    /// Axial (dq, dr) step
    pub const fn vector(self) -> (i16, i16) {
        match self {
            Direction::East => (1, 0),
            Direction::NorthEast => (1, -1),
            Direction::NorthWest => (0, -1),
            Direction::West => (-1, 0),
            Direction::SouthWest => (-1, 1),
            Direction::SouthEast => (0, 1),
        }
    }
}

/// Board edge a side starts from and retreats toward
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Baseline {
    North,
    South,
}

impl Baseline {
    /// The two directions a retreating unit may step in
    pub const fn retreat_directions(self) -> [Direction; 2] {
        match self {
            Baseline::North => [Direction::NorthWest, Direction::NorthEast],
            Baseline::South => [Direction::SouthWest, Direction::SouthEast],
        }
    }
}

// ============================================================================
// FLANKS
// ============================================================================

/// Board section, named from the point of view of the commanding player
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Flank {
    Left,
    Center,
    Right,
}

impl Flank {
    pub const fn index(self) -> usize {
        match self {
            Flank::Left => 0,
            Flank::Center => 1,
            Flank::Right => 2,
        }
    }

    const fn mirrored(self) -> Flank {
        match self {
            Flank::Left => Flank::Right,
            Flank::Center => Flank::Center,
            Flank::Right => Flank::Left,
        }
    }
}

/// Flanks a hex belongs to for a player sitting at `viewer`.
///
/// Hexes cut by a section line belong to both neighbouring flanks.
pub fn flanks_of(hex: HexCoord, viewer: Baseline) -> Vec<Flank> {
    let x2 = hex.doubled_column();
    let south_view: &[Flank] = match x2 {
        x if x < 8 => &[Flank::Left],
        8 => &[Flank::Left, Flank::Center],
        x if x < 16 => &[Flank::Center],
        16 => &[Flank::Center, Flank::Right],
        _ => &[Flank::Right],
    };
    match viewer {
        Baseline::South => south_view.to_vec(),
        Baseline::North => south_view.iter().map(|f| f.mirrored()).collect(),
    }
}

/// Every hex on the board, row-major
pub fn all_hexes() -> impl Iterator<Item = HexCoord> {
    (0..BOARD_ROWS).flat_map(|row| {
        let width = if row & 1 == 0 { BOARD_COLUMNS } else { BOARD_COLUMNS - 1 };
        (0..width).map(move |column| HexCoord::from_offset(column, row))
    })
}

// ============================================================================
// LINE OF SIGHT
// ============================================================================

/// Offsets whose straight line runs exactly along a shared hex edge, with the
/// two hexes bordering that edge: north, northwest, southwest and inverses.
const EDGE_STRADDLES: [((i16, i16), (i16, i16), (i16, i16)); 6] = [
    ((1, -2), (0, -1), (1, -1)),
    ((-1, 2), (0, 1), (-1, 1)),
    ((-1, -1), (-1, 0), (0, -1)),
    ((1, 1), (1, 0), (0, 1)),
    ((-2, 1), (-1, 0), (-1, 1)),
    ((2, -1), (1, 0), (1, -1)),
];

/// Check whether `from` can see `to`.
///
/// Endpoints never block. Lines running along a hex edge are blocked only when
/// both hexes bordering the edge are obstacles; every other line is sampled
/// at each step and blocked by any obstacle hex it passes through.
pub fn line_of_sight<F>(from: HexCoord, to: HexCoord, is_obstacle: F) -> bool
where
    F: Fn(HexCoord) -> bool,
{
    let distance = from.distance_to(to) as i16;
    if distance <= 1 {
        return true;
    }

    let dq = to.q - from.q;
    let dr = to.r - from.r;

    let straddles = distance / 2;
    for &((vq, vr), (aq, ar), (bq, br)) in &EDGE_STRADDLES {
        if distance % 2 != 0 || dq != vq * straddles || dr != vr * straddles {
            continue;
        }
        // Walk the edge one straddle at a time, testing the centres in between
        for i in 0..straddles {
            let base = from.offset_by(vq * i, vr * i);
            if i > 0 && is_obstacle(base) {
                return false;
            }
            if is_obstacle(base.offset_by(aq, ar)) && is_obstacle(base.offset_by(bq, br)) {
                return false;
            }
        }
        return true;
    }

    for step in 1..distance {
        let t = step as f64 / distance as f64;
        let q = from.q as f64 + dq as f64 * t;
        let r = from.r as f64 + dr as f64 * t;
        if is_obstacle(cube_round(q, r)) {
            return false;
        }
    }
    true
}

/// Round fractional axial coordinates to the containing hex
fn cube_round(q: f64, r: f64) -> HexCoord {
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
    HexCoord::new(rq as i16, rr as i16)
}
