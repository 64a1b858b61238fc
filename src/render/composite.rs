use crate::foundation::error::{ShelfError, ShelfResult};

pub type PremulRgba8 = [u8; 4];

/// Source-over for one premultiplied pixel.
pub fn over(dst: PremulRgba8, src: PremulRgba8) -> PremulRgba8 {
    let sa = src[3];
    if sa == 0 {
        return dst;
    }
    if sa == 255 {
        return src;
    }

    let inv = 255u16 - u16::from(sa);
    let mut out = [0u8; 4];
    for i in 0..4 {
        let dc = mul_div255(u16::from(dst[i]), inv);
        out[i] = src[i].saturating_add(dc);
    }
    out
}

/// Blend `src` (a `src_w` x `src_h` premultiplied buffer) over `dst` at `(x, y)`.
///
/// Pixels falling outside `dst` are dropped.
pub fn over_region(
    dst: &mut [u8],
    dst_w: u32,
    dst_h: u32,
    src: &[u8],
    src_w: u32,
    src_h: u32,
    x: u32,
    y: u32,
) -> ShelfResult<()> {
    if dst.len() != dst_w as usize * dst_h as usize * 4 {
        return Err(ShelfError::render(
            "over_region destination length does not match its size",
        ));
    }
    if src.len() != src_w as usize * src_h as usize * 4 {
        return Err(ShelfError::render(
            "over_region source length does not match its size",
        ));
    }

    let copy_w = src_w.min(dst_w.saturating_sub(x)) as usize;
    let copy_h = src_h.min(dst_h.saturating_sub(y)) as usize;
    if copy_w == 0 || copy_h == 0 {
        return Ok(());
    }

    for row in 0..copy_h {
        let s0 = row * src_w as usize * 4;
        let d0 = ((y as usize + row) * dst_w as usize + x as usize) * 4;
        let s_row = &src[s0..s0 + copy_w * 4];
        let d_row = &mut dst[d0..d0 + copy_w * 4];
        for (d, s) in d_row.chunks_exact_mut(4).zip(s_row.chunks_exact(4)) {
            let out = over([d[0], d[1], d[2], d[3]], [s[0], s[1], s[2], s[3]]);
            d.copy_from_slice(&out);
        }
    }
    Ok(())
}

pub fn premultiply_rgba8_in_place(rgba: &mut [u8]) {
    for px in rgba.chunks_exact_mut(4) {
        let a = px[3] as u16;
        if a == 0 {
            px[0] = 0;
            px[1] = 0;
            px[2] = 0;
            continue;
        }
        px[0] = ((px[0] as u16 * a + 127) / 255) as u8;
        px[1] = ((px[1] as u16 * a + 127) / 255) as u8;
        px[2] = ((px[2] as u16 * a + 127) / 255) as u8;
    }
}

pub fn unpremultiply_rgba8_in_place(rgba: &mut [u8]) {
    for px in rgba.chunks_exact_mut(4) {
        let a = u32::from(px[3]);
        if a == 0 || a == 255 {
            continue;
        }
        for c in &mut px[..3] {
            *c = ((u32::from(*c) * 255 + a / 2) / a).min(255) as u8;
        }
    }
}

fn mul_div255(x: u16, y: u16) -> u8 {
    (((u32::from(x) * u32::from(y)) + 127) / 255) as u8
}
