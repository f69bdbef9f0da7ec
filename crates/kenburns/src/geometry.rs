use std::fmt;
use std::str::FromStr;

use anyhow::{Context, anyhow};
use rand::Rng;
use rand::seq::index;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Size {
    pub width: f64,
    pub height: f64,
}

impl Size {
    pub const fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    /// Height over width, or `None` when the size cannot describe an image yet
    /// (zero or non-finite width, as reported for images that have not loaded).
    pub fn aspect_ratio(&self) -> Option<f64> {
        if !self.width.is_finite() || !self.height.is_finite() {
            return None;
        }
        if self.width <= 0.0 || self.height <= 0.0 {
            return None;
        }
        Some(self.height / self.width)
    }

    pub fn area(&self) -> f64 {
        self.width * self.height
    }
}

impl fmt::Display for Size {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

impl FromStr for Size {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (w, h) = s
            .trim()
            .split_once(['x', 'X'])
            .ok_or_else(|| anyhow!("expected WIDTHxHEIGHT, got {s:?}"))?;
        let width: f64 = w.trim().parse().with_context(|| format!("bad width in {s:?}"))?;
        let height: f64 = h.trim().parse().with_context(|| format!("bad height in {s:?}"))?;
        if !width.is_finite() || !height.is_finite() || width < 0.0 || height < 0.0 {
            return Err(anyhow!("dimensions must be finite and non-negative: {s:?}"));
        }
        Ok(Self { width, height })
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    pub left: f64,
    pub top: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub fn area(&self) -> f64 {
        self.width * self.height
    }
}

/// Alignment of the image against the container, as (horizontal, vertical) flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Corner {
    TopLeft,
    TopRight,
    BottomLeft,
    BottomRight,
}

impl Corner {
    pub const ALL: [Corner; 4] = [
        Corner::TopLeft,
        Corner::TopRight,
        Corner::BottomLeft,
        Corner::BottomRight,
    ];

    /// 0 = left/top, 1 = right/bottom.
    pub const fn flags(self) -> (f64, f64) {
        match self {
            Corner::TopLeft => (0.0, 0.0),
            Corner::TopRight => (1.0, 0.0),
            Corner::BottomLeft => (0.0, 1.0),
            Corner::BottomRight => (1.0, 1.0),
        }
    }
}

/// Start and end placement of one pan. Derived per cycle, never stored.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CornerPair {
    pub start: Corner,
    pub end: Corner,
    pub start_x: f64,
    pub start_y: f64,
    pub end_x: f64,
    pub end_y: f64,
    pub image_width: f64,
    pub image_height: f64,
    pub scale: f64,
}

impl CornerPair {
    /// Oversized rectangle the pan starts from.
    pub fn start_rect(&self) -> Rect {
        Rect {
            left: self.start_x,
            top: self.start_y,
            width: self.image_width * self.scale,
            height: self.image_height * self.scale,
        }
    }

    /// Container-fit rectangle the pan ends on.
    pub fn end_rect(&self) -> Rect {
        Rect {
            left: self.end_x,
            top: self.end_y,
            width: self.image_width,
            height: self.image_height,
        }
    }

    pub fn image_size(&self) -> Size {
        Size::new(self.image_width, self.image_height)
    }
}

/// Picks two distinct corners of `container` and computes the pan between them for an
/// image of the given aspect ratio zoomed by `scale`.
///
/// The image is sized to `floor(W / S) x floor(W * R / S)`; the start placement is
/// measured against the scaled image and the end placement against the unscaled one.
pub fn choose_corner<R: Rng + ?Sized>(
    container: Size,
    aspect_ratio: f64,
    scale: f64,
    rng: &mut R,
) -> CornerPair {
    let sw = (container.width / scale).floor();
    let sh = (container.width * aspect_ratio / scale).floor();

    let picks = index::sample(rng, Corner::ALL.len(), 2);
    let start = Corner::ALL[picks.index(0)];
    let end = Corner::ALL[picks.index(1)];

    let (sx, sy) = start.flags();
    let (ex, ey) = end.flags();

    CornerPair {
        start,
        end,
        start_x: sx * (container.width - sw * scale),
        start_y: sy * (container.height - sh * scale),
        end_x: ex * (container.width - sw),
        end_y: ey * (container.height - sh),
        image_width: sw,
        image_height: sh,
        scale,
    }
}
