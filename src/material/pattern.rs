//! Procedural material textures as plain data.
//!
//! A [`MaterialPattern`] is built in cell-local coordinates from a caller-provided random
//! source and rasterized later by [`crate::paint_pattern`]. Keeping the two apart lets
//! tests check the structure of a texture without looking at pixels.

use rand::Rng;

use crate::{
    foundation::core::{BezPath, Point, Rgba8},
    material::kind::Material,
};

const WOOD_GRAIN_LINES: usize = 6;
const MARBLE_VEINS: usize = 7;
const GLASS_STREAKS: usize = 2;
const METAL_LINES: usize = 10;

/// Base layer of a pattern.
#[derive(Clone, Debug, PartialEq)]
pub enum Fill {
    Solid(Rgba8),
    /// Linear gradient between two points, colors interpolated in straight RGBA.
    LinearGradient {
        start: Point,
        end: Point,
        from: Rgba8,
        to: Rgba8,
    },
}

#[derive(Clone, Debug, PartialEq)]
pub struct StrokeSpec {
    pub path: BezPath,
    pub color: Rgba8,
    pub width: f64,
}

#[derive(Clone, Debug, PartialEq)]
pub struct MaterialPattern {
    pub material: Material,
    pub width: u32,
    pub height: u32,
    /// Painted in order, each over the previous.
    pub fills: Vec<Fill>,
    /// Painted after all fills.
    pub strokes: Vec<StrokeSpec>,
}

impl MaterialPattern {
    /// Bounding box of all stroke geometry, if any.
    pub fn stroke_bounds(&self) -> Option<kurbo::Rect> {
        use kurbo::Shape;

        self.strokes
            .iter()
            .map(|s| s.path.bounding_box())
            .reduce(|a, b| a.union(b))
    }
}

/// Build the texture for a `width` x `height` cell.
pub fn material_pattern<R: Rng>(
    material: Material,
    width: u32,
    height: u32,
    rng: &mut R,
) -> MaterialPattern {
    let w = f64::from(width);
    let h = f64::from(height);

    let (fills, strokes) = match material {
        Material::Wood => wood(w, h, rng),
        Material::Marble => marble(w, h, rng),
        Material::Glass => glass(w, h, rng),
        Material::Metal => metal(w, h, rng),
    };

    MaterialPattern {
        material,
        width,
        height,
        fills,
        strokes,
    }
}

fn wood<R: Rng>(w: f64, h: f64, rng: &mut R) -> (Vec<Fill>, Vec<StrokeSpec>) {
    let fills = vec![Fill::LinearGradient {
        start: Point::new(0.0, 0.0),
        end: Point::new(w, h),
        from: Rgba8::opaque(0x5d, 0x3f, 0x2e),
        to: Rgba8::opaque(0x3b, 0x26, 0x1b),
    }];

    let grain = Rgba8::with_alpha(255, 255, 255, 0.06);
    let mut jitter = || rng.gen_range(-2.0..=2.0);
    let strokes = (0..WOOD_GRAIN_LINES)
        .map(|i| {
            let y = (i as f64 + 1.0) * (h / 7.0);
            let mut path = BezPath::new();
            path.move_to((0.0, y));
            path.curve_to(
                (w * 0.3, clamp_y(y - 5.0 + jitter(), h)),
                (w * 0.6, clamp_y(y + 6.0 + jitter(), h)),
                (w, clamp_y(y - 3.0 + jitter(), h)),
            );
            StrokeSpec {
                path,
                color: grain,
                width: 1.0,
            }
        })
        .collect();

    (fills, strokes)
}

fn marble<R: Rng>(w: f64, h: f64, rng: &mut R) -> (Vec<Fill>, Vec<StrokeSpec>) {
    let fills = vec![Fill::Solid(Rgba8::opaque(0xf2, 0xf2, 0xf4))];

    let vein = Rgba8::with_alpha(110, 110, 130, 0.18);
    let strokes = (0..MARBLE_VEINS)
        .map(|_| {
            let mut path = BezPath::new();
            path.move_to((rng.gen_range(0.0..=w), 0.0));
            path.line_to((rng.gen_range(0.0..=w), h));
            StrokeSpec {
                path,
                color: vein,
                width: 1.0,
            }
        })
        .collect();

    (fills, strokes)
}

fn glass<R: Rng>(w: f64, h: f64, rng: &mut R) -> (Vec<Fill>, Vec<StrokeSpec>) {
    let fills = vec![
        Fill::Solid(Rgba8::with_alpha(200, 230, 255, 0.22)),
        Fill::LinearGradient {
            start: Point::new(0.0, 0.0),
            end: Point::new(0.0, h),
            from: Rgba8::with_alpha(255, 255, 255, 0.35),
            to: Rgba8::with_alpha(255, 255, 255, 0.05),
        },
    ];

    // Reflection streaks run from the top edge down-left; the slant is a quarter of the
    // cell width so both ends stay inside the cell.
    let highlight = Rgba8::with_alpha(255, 255, 255, 0.12);
    let slant = w * 0.25;
    let strokes = (0..GLASS_STREAKS)
        .map(|_| {
            let x0 = rng.gen_range(slant..=w);
            let mut path = BezPath::new();
            path.move_to((x0, 0.0));
            path.line_to((x0 - slant, h));
            StrokeSpec {
                path,
                color: highlight,
                width: 2.0,
            }
        })
        .collect();

    (fills, strokes)
}

fn metal<R: Rng>(w: f64, h: f64, rng: &mut R) -> (Vec<Fill>, Vec<StrokeSpec>) {
    let fills = vec![Fill::Solid(Rgba8::opaque(0xb4, 0xb9, 0xc1))];

    let brushed = Rgba8::with_alpha(60, 70, 85, 0.2);
    let strokes = (0..METAL_LINES)
        .map(|i| {
            let y = (i as f64 / (METAL_LINES - 1) as f64) * h;
            let drift = (i as f64).sin() * 2.0 + rng.gen_range(-0.75..=0.75);
            let mut path = BezPath::new();
            path.move_to((0.0, y));
            path.line_to((w, clamp_y(y + drift, h)));
            StrokeSpec {
                path,
                color: brushed,
                width: 1.0,
            }
        })
        .collect();

    (fills, strokes)
}

fn clamp_y(y: f64, h: f64) -> f64 {
    y.clamp(0.0, h)
}
