//! Axis-aligned rectangular sub-windows of a raster grid.

use serde::Serialize;

/// Half-open rectangle `[x0, x0 + width) × [y0, y0 + height)`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct Region {
    pub x0: usize,
    pub y0: usize,
    pub width: usize,
    pub height: usize,
}

impl Region {
    pub fn new(x0: usize, y0: usize, width: usize, height: usize) -> Self {
        Self {
            x0,
            y0,
            width,
            height,
        }
    }

    #[inline]
    pub fn x1(&self) -> usize {
        self.x0 + self.width
    }

    #[inline]
    pub fn y1(&self) -> usize {
        self.y0 + self.height
    }

    #[inline]
    pub fn area(&self) -> usize {
        self.width * self.height
    }
}

/// Inclusive integer interval, used for disparity ranges and search windows.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct Span {
    pub lo: i32,
    pub hi: i32,
}

impl Span {
    pub fn new(lo: i32, hi: i32) -> Self {
        Self { lo, hi }
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.lo > self.hi
    }

    #[inline]
    pub fn contains(&self, v: i32) -> bool {
        v >= self.lo && v <= self.hi
    }

    #[inline]
    pub fn is_degenerate(&self) -> bool {
        self.lo == self.hi
    }

    /// Intersection; may be empty (`lo > hi`).
    #[inline]
    pub fn clip(&self, other: Span) -> Span {
        Span::new(self.lo.max(other.lo), self.hi.min(other.hi))
    }

    /// Window of half-width `radius` around `center`.
    #[inline]
    pub fn around(center: i32, radius: i32) -> Span {
        Span::new(center.saturating_sub(radius), center.saturating_add(radius))
    }
}
