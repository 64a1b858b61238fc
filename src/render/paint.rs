use std::sync::Arc;

use crate::{
    foundation::core::{BezPath, PixelRect, Point, Rgba8},
    foundation::error::{ShelfError, ShelfResult},
    material::pattern::{Fill, MaterialPattern},
    render::raster::Raster,
};

/// Rasterize `pattern` and blend it over `raster` inside `rect`.
///
/// The pattern is painted in cell-local coordinates, so its size must match `rect`.
pub fn paint_pattern(
    raster: &mut Raster,
    rect: PixelRect,
    pattern: &MaterialPattern,
) -> ShelfResult<()> {
    if pattern.width != rect.width || pattern.height != rect.height {
        return Err(ShelfError::render(format!(
            "pattern {}x{} does not fit cell {}x{}",
            pattern.width, pattern.height, rect.width, rect.height
        )));
    }
    let layer = rasterize_pattern(pattern)?;
    raster.draw_over(rect.x, rect.y, &layer)
}

/// Rasterize a pattern into its own cell-sized layer.
pub fn rasterize_pattern(pattern: &MaterialPattern) -> ShelfResult<Raster> {
    let (w, h) = (pattern.width, pattern.height);
    let mut ctx = new_context(w, h)?;
    let cell = vello_cpu::kurbo::Rect::new(0.0, 0.0, f64::from(w), f64::from(h));

    for fill in &pattern.fills {
        match fill {
            Fill::Solid(c) => ctx.set_paint(color_to_cpu(*c)),
            Fill::LinearGradient {
                start,
                end,
                from,
                to,
            } => ctx.set_paint(gradient_image(*start, *end, *from, *to, w, h)?),
        }
        ctx.fill_rect(&cell);
    }

    for stroke in &pattern.strokes {
        ctx.set_stroke(vello_cpu::kurbo::Stroke::new(stroke.width));
        ctx.set_paint(color_to_cpu(stroke.color));
        ctx.stroke_path(&bezpath_to_cpu(&stroke.path));
    }

    finish(ctx, w, h)
}

/// Stroke an outline of `width` px centered on the edge of `rect`.
///
/// Half of the line lands outside the cell, so it survives an opaque foreground composed
/// into the cell later. The outer half is clipped at the raster edges.
pub fn stroke_border(
    raster: &mut Raster,
    rect: PixelRect,
    color: Rgba8,
    width: f64,
) -> ShelfResult<()> {
    let pad = (width / 2.0).ceil().max(0.0) as u32;
    let (left, top) = (pad.min(rect.x), pad.min(rect.y));
    let layer_w = left + rect.width + pad;
    let layer_h = top + rect.height + pad;
    let mut ctx = new_context(layer_w, layer_h)?;

    let (x0, y0) = (f64::from(left), f64::from(top));
    let (x1, y1) = (x0 + f64::from(rect.width), y0 + f64::from(rect.height));
    let mut outline = BezPath::new();
    outline.move_to((x0, y0));
    outline.line_to((x1, y0));
    outline.line_to((x1, y1));
    outline.line_to((x0, y1));
    outline.close_path();

    ctx.set_stroke(vello_cpu::kurbo::Stroke::new(width));
    ctx.set_paint(color_to_cpu(color));
    ctx.stroke_path(&bezpath_to_cpu(&outline));

    let layer = finish(ctx, layer_w, layer_h)?;
    raster.draw_over(rect.x - left, rect.y - top, &layer)
}

fn new_context(width: u32, height: u32) -> ShelfResult<vello_cpu::RenderContext> {
    let (w, h) = dims_u16(width, height)?;
    let mut ctx = vello_cpu::RenderContext::new(w, h);
    ctx.set_transform(vello_cpu::kurbo::Affine::IDENTITY);
    ctx.set_paint_transform(vello_cpu::kurbo::Affine::IDENTITY);
    Ok(ctx)
}

fn finish(mut ctx: vello_cpu::RenderContext, width: u32, height: u32) -> ShelfResult<Raster> {
    let (w, h) = dims_u16(width, height)?;
    let mut pixmap = vello_cpu::Pixmap::new(w, h);
    ctx.flush();
    ctx.render_to_pixmap(&mut pixmap);
    Raster::from_premul_rgba8(width, height, pixmap.data_as_u8_slice().to_vec())
}

fn dims_u16(width: u32, height: u32) -> ShelfResult<(u16, u16)> {
    let w: u16 = width
        .try_into()
        .map_err(|_| ShelfError::render("layer width exceeds u16"))?;
    let h: u16 = height
        .try_into()
        .map_err(|_| ShelfError::render("layer height exceeds u16"))?;
    Ok((w, h))
}

fn color_to_cpu(c: Rgba8) -> vello_cpu::peniko::Color {
    vello_cpu::peniko::Color::from_rgba8(c.r, c.g, c.b, c.a)
}

fn point_to_cpu(p: Point) -> vello_cpu::kurbo::Point {
    vello_cpu::kurbo::Point::new(p.x, p.y)
}

fn bezpath_to_cpu(path: &BezPath) -> vello_cpu::kurbo::BezPath {
    use kurbo::PathEl;

    let mut out = vello_cpu::kurbo::BezPath::new();
    for &el in path.elements() {
        match el {
            PathEl::MoveTo(p) => out.move_to(point_to_cpu(p)),
            PathEl::LineTo(p) => out.line_to(point_to_cpu(p)),
            PathEl::QuadTo(p1, p2) => out.quad_to(point_to_cpu(p1), point_to_cpu(p2)),
            PathEl::CurveTo(p1, p2, p3) => {
                out.curve_to(point_to_cpu(p1), point_to_cpu(p2), point_to_cpu(p3));
            }
            PathEl::ClosePath => out.close_path(),
        }
    }
    out
}

/// Linear gradient baked into an image paint, sampled at pixel centers.
fn gradient_image(
    start: Point,
    end: Point,
    from: Rgba8,
    to: Rgba8,
    width: u32,
    height: u32,
) -> ShelfResult<vello_cpu::Image> {
    let d = end - start;
    let len2 = d.hypot2();

    let mut bytes = vec![0u8; width as usize * height as usize * 4];
    for y in 0..height {
        for x in 0..width {
            let p = Point::new(f64::from(x) + 0.5, f64::from(y) + 0.5);
            let t = if len2 <= f64::EPSILON {
                0.0
            } else {
                ((p - start).dot(d) / len2).clamp(0.0, 1.0)
            };
            let lerp = |a: u8, b: u8| -> u8 {
                let af = f64::from(a);
                (af + (f64::from(b) - af) * t).round().clamp(0.0, 255.0) as u8
            };
            let c = Rgba8 {
                r: lerp(from.r, to.r),
                g: lerp(from.g, to.g),
                b: lerp(from.b, to.b),
                a: lerp(from.a, to.a),
            }
            .premul();
            let idx = (y as usize * width as usize + x as usize) * 4;
            bytes[idx..idx + 4].copy_from_slice(&c.to_array());
        }
    }

    let pixmap = premul_bytes_to_pixmap(&bytes, width, height)?;
    Ok(vello_cpu::Image {
        image: vello_cpu::ImageSource::Pixmap(Arc::new(pixmap)),
        sampler: vello_cpu::peniko::ImageSampler::default(),
    })
}

fn premul_bytes_to_pixmap(
    rgba8_premul: &[u8],
    width: u32,
    height: u32,
) -> ShelfResult<vello_cpu::Pixmap> {
    let (w, h) = dims_u16(width, height)?;
    if rgba8_premul.len() != width as usize * height as usize * 4 {
        return Err(ShelfError::render("gradient byte length mismatch"));
    }

    let mut may_have_opacities = false;
    let mut pixels = Vec::with_capacity(width as usize * height as usize);
    for px in rgba8_premul.chunks_exact(4) {
        let a = px[3];
        may_have_opacities |= a != 255;
        pixels.push(vello_cpu::peniko::color::PremulRgba8 {
            r: px[0],
            g: px[1],
            b: px[2],
            a,
        });
    }

    Ok(vello_cpu::Pixmap::from_parts_with_opacity(
        pixels,
        w,
        h,
        may_have_opacities,
    ))
}

#[cfg(test)]
mod tests {
    use rand::{SeedableRng, rngs::StdRng};

    use super::*;
    use crate::material::{kind::Material, pattern::material_pattern};

    fn opaque_black(w: u32, h: u32) -> Raster {
        let mut r = Raster::new(w, h).unwrap();
        r.clear(Rgba8::opaque(0, 0, 0));
        r
    }

    #[test]
    fn solid_material_covers_its_cell_only() {
        let mut raster = opaque_black(40, 30);
        let rect = PixelRect::new(5, 5, 20, 10);
        let mut rng = StdRng::seed_from_u64(3);
        let pattern = material_pattern(Material::Marble, 20, 10, &mut rng);
        paint_pattern(&mut raster, rect, &pattern).unwrap();

        let inside = raster.pixel(6, 6).unwrap();
        assert!(inside[0] > 150, "marble base should be light: {inside:?}");
        assert_eq!(raster.pixel(2, 2), Some([0, 0, 0, 255]));
        assert_eq!(raster.pixel(30, 20), Some([0, 0, 0, 255]));
    }

    #[test]
    fn wood_gradient_darkens_along_the_diagonal() {
        let mut rng = StdRng::seed_from_u64(9);
        let pattern = material_pattern(Material::Wood, 64, 64, &mut rng);
        let layer = rasterize_pattern(&pattern).unwrap();
        let top_left = layer.pixel(0, 0).unwrap();
        let bottom_right = layer.pixel(63, 63).unwrap();
        assert_eq!(top_left[3], 255);
        assert!(top_left[0] > bottom_right[0]);
    }

    #[test]
    fn glass_is_translucent() {
        let mut rng = StdRng::seed_from_u64(1);
        let pattern = material_pattern(Material::Glass, 16, 16, &mut rng);
        let layer = rasterize_pattern(&pattern).unwrap();
        let px = layer.pixel(0, 15).unwrap();
        assert!(px[3] > 0 && px[3] < 255, "{px:?}");
    }

    #[test]
    fn mismatched_pattern_is_rejected() {
        let mut raster = opaque_black(10, 10);
        let mut rng = StdRng::seed_from_u64(1);
        let pattern = material_pattern(Material::Metal, 4, 4, &mut rng);
        assert!(paint_pattern(&mut raster, PixelRect::new(0, 0, 5, 4), &pattern).is_err());
    }

    #[test]
    fn border_straddles_rect_edge() {
        let mut raster = Raster::new(20, 20).unwrap();
        stroke_border(
            &mut raster,
            PixelRect::new(5, 5, 10, 10),
            Rgba8::opaque(255, 255, 255),
            3.0,
        )
        .unwrap();
        // Outer half sits in the surrounding gutter.
        assert!(raster.pixel(4, 10).unwrap()[3] > 240);
        assert!(raster.pixel(15, 10).unwrap()[3] > 240);
        assert!(raster.pixel(10, 4).unwrap()[3] > 240);
        // Inner half inside the cell.
        assert!(raster.pixel(5, 10).unwrap()[3] > 240);
        assert_eq!(raster.pixel(1, 10), Some([0, 0, 0, 0]));
        assert_eq!(raster.pixel(18, 10), Some([0, 0, 0, 0]));
        assert_eq!(raster.pixel(10, 10), Some([0, 0, 0, 0]));
    }

    #[test]
    fn border_at_raster_origin_is_clipped() {
        let mut raster = Raster::new(12, 12).unwrap();
        stroke_border(
            &mut raster,
            PixelRect::new(0, 0, 10, 10),
            Rgba8::opaque(255, 0, 0),
            3.0,
        )
        .unwrap();
        assert!(raster.pixel(0, 5).unwrap()[3] > 240);
        assert!(raster.pixel(10, 5).unwrap()[3] > 240);
        assert_eq!(raster.pixel(5, 5), Some([0, 0, 0, 0]));
    }
}
