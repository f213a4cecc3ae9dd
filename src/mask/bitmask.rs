//! Property bit masks.
//!
//! Bit `i` set means "the property at ordering position `i` changed". Masks are
//! 64 bits wide; positions at or beyond [`BitMask::WIDTH`] are never set.

use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BitMask(u64);

impl BitMask {
    pub const WIDTH: usize = 64;

    /// Sentinel meaning "treat every property as changed".
    pub const ALL: BitMask = BitMask(u64::MAX);

    pub const EMPTY: BitMask = BitMask(0);

    pub const fn from_bits(bits: u64) -> Self {
        BitMask(bits)
    }

    pub const fn bits(self) -> u64 {
        self.0
    }

    pub fn from_positions<I: IntoIterator<Item = usize>>(positions: I) -> Self {
        positions.into_iter().fold(Self::EMPTY, |mask, pos| mask.set(pos))
    }

    pub const fn is_all(self) -> bool {
        self.0 == u64::MAX
    }

    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    pub fn is_set(self, pos: usize) -> bool {
        pos < Self::WIDTH && self.0 & (1u64 << pos) != 0
    }

    #[must_use]
    pub fn set(self, pos: usize) -> Self {
        if pos < Self::WIDTH {
            BitMask(self.0 | (1u64 << pos))
        } else {
            self
        }
    }

    pub fn intersects(self, other: BitMask) -> bool {
        self.0 & other.0 != 0
    }

    /// Set positions in ascending order.
    pub fn positions(self) -> impl Iterator<Item = usize> {
        (0..Self::WIDTH).filter(move |&pos| self.is_set(pos))
    }
}

impl Default for BitMask {
    fn default() -> Self {
        Self::ALL
    }
}

impl fmt::Debug for BitMask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_all() {
            write!(f, "BitMask(ALL)")
        } else {
            write!(f, "BitMask({:#b})", self.0)
        }
    }
}

impl fmt::Display for BitMask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_all() {
            write!(f, "ALL")
        } else {
            write!(f, "{:#018x}", self.0)
        }
    }
}
