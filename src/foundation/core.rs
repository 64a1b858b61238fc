use crate::foundation::error::{ShelfError, ShelfResult};

pub use kurbo::{BezPath, Point};

/// Largest canvas edge accepted for a run.
pub const MAX_CANVAS_DIM: u32 = 16_384;

#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Canvas {
    pub width: u32,
    pub height: u32,
}

impl Canvas {
    pub fn new(width: u32, height: u32) -> ShelfResult<Self> {
        let canvas = Self { width, height };
        canvas.validate()?;
        Ok(canvas)
    }

    pub fn validate(self) -> ShelfResult<()> {
        if self.width == 0 || self.height == 0 {
            return Err(ShelfError::validation("canvas width and height must be > 0"));
        }
        if self.width > MAX_CANVAS_DIM || self.height > MAX_CANVAS_DIM {
            return Err(ShelfError::validation(format!(
                "canvas {}x{} exceeds {MAX_CANVAS_DIM}x{MAX_CANVAS_DIM}",
                self.width, self.height
            )));
        }
        Ok(())
    }

    pub fn bounds(self) -> PixelRect {
        PixelRect::new(0, 0, self.width, self.height)
    }
}

/// Integer pixel rectangle, origin top-left.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct PixelRect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl PixelRect {
    pub fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Exclusive right edge.
    pub fn right(self) -> u64 {
        u64::from(self.x) + u64::from(self.width)
    }

    /// Exclusive bottom edge.
    pub fn bottom(self) -> u64 {
        u64::from(self.y) + u64::from(self.height)
    }

    pub fn is_empty(self) -> bool {
        self.width == 0 || self.height == 0
    }

    pub fn contains_rect(self, other: PixelRect) -> bool {
        other.x >= self.x
            && other.y >= self.y
            && other.right() <= self.right()
            && other.bottom() <= self.bottom()
    }

    pub fn intersects(self, other: PixelRect) -> bool {
        if self.is_empty() || other.is_empty() {
            return false;
        }
        u64::from(self.x) < other.right()
            && u64::from(other.x) < self.right()
            && u64::from(self.y) < other.bottom()
            && u64::from(other.y) < self.bottom()
    }
}

/// Straight (non-premultiplied) RGBA8 color.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct Rgba8 {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Rgba8 {
    pub const fn opaque(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    /// Build a color from a CSS-style alpha in `0.0..=1.0`.
    pub fn with_alpha(r: u8, g: u8, b: u8, alpha: f32) -> Self {
        let a = (alpha.clamp(0.0, 1.0) * 255.0).round() as u8;
        Self { r, g, b, a }
    }

    pub fn premul(self) -> Rgba8Premul {
        Rgba8Premul::from_straight_rgba(self.r, self.g, self.b, self.a)
    }
}

/// Premultiplied RGBA8 (r,g,b already multiplied by a).
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Rgba8Premul {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Rgba8Premul {
    pub fn transparent() -> Self {
        Self {
            r: 0,
            g: 0,
            b: 0,
            a: 0,
        }
    }

    pub fn from_straight_rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        fn premul(c: u8, a: u8) -> u8 {
            let c = u16::from(c);
            let a = u16::from(a);
            (((c * a) + 127) / 255) as u8
        }

        Self {
            r: premul(r, a),
            g: premul(g, a),
            b: premul(b, a),
            a,
        }
    }

    pub fn to_array(self) -> [u8; 4] {
        [self.r, self.g, self.b, self.a]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn canvas_rejects_zero_and_oversized() {
        assert!(Canvas::new(0, 10).is_err());
        assert!(Canvas::new(10, 0).is_err());
        assert!(Canvas::new(MAX_CANVAS_DIM + 1, 10).is_err());
        assert!(Canvas::new(800, 400).is_ok());
    }

    #[test]
    fn rect_intersection_is_exclusive_at_edges() {
        let a = PixelRect::new(0, 0, 10, 10);
        let b = PixelRect::new(10, 0, 10, 10);
        let c = PixelRect::new(9, 9, 2, 2);
        assert!(!a.intersects(b));
        assert!(a.intersects(c));
        assert!(!a.intersects(PixelRect::new(2, 2, 0, 5)));
    }

    #[test]
    fn rect_containment() {
        let outer = PixelRect::new(0, 0, 100, 50);
        assert!(outer.contains_rect(PixelRect::new(10, 10, 90, 40)));
        assert!(!outer.contains_rect(PixelRect::new(10, 10, 91, 40)));
    }

    #[test]
    fn css_alpha_maps_to_u8() {
        assert_eq!(Rgba8::with_alpha(1, 2, 3, 0.0).a, 0);
        assert_eq!(Rgba8::with_alpha(1, 2, 3, 1.0).a, 255);
        assert_eq!(Rgba8::with_alpha(1, 2, 3, 0.2).a, 51);
    }

    #[test]
    fn premul_rounds_half_up() {
        let p = Rgba8::with_alpha(255, 128, 0, 0.5).premul();
        assert_eq!(p.a, 128);
        assert_eq!(p.r, 128);
        assert_eq!(p.g, 64);
        assert_eq!(p.b, 0);
    }
}
