use std::io::Cursor;

use anyhow::Context as _;

use crate::{
    foundation::core::{MAX_CANVAS_DIM, PixelRect, Rgba8},
    foundation::error::{ShelfError, ShelfResult},
    render::composite::{
        over_region, premultiply_rgba8_in_place, unpremultiply_rgba8_in_place,
    },
};

/// Premultiplied RGBA8 pixel surface.
///
/// A run owns exactly one canvas-sized raster; crops and decoded foregrounds are
/// short-lived rasters of cell size.
#[derive(Clone, PartialEq, Eq)]
pub struct Raster {
    width: u32,
    height: u32,
    data: Vec<u8>,
}

impl std::fmt::Debug for Raster {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Raster")
            .field("width", &self.width)
            .field("height", &self.height)
            .finish_non_exhaustive()
    }
}

impl Raster {
    /// Transparent raster.
    pub fn new(width: u32, height: u32) -> ShelfResult<Self> {
        check_dims(width, height)?;
        Ok(Self {
            width,
            height,
            data: vec![0u8; width as usize * height as usize * 4],
        })
    }

    pub fn from_premul_rgba8(width: u32, height: u32, data: Vec<u8>) -> ShelfResult<Self> {
        check_dims(width, height)?;
        if data.len() != width as usize * height as usize * 4 {
            return Err(ShelfError::render(format!(
                "raster byte length {} does not match {width}x{height}",
                data.len()
            )));
        }
        Ok(Self {
            width,
            height,
            data,
        })
    }

    pub fn from_rgba_image(img: image::RgbaImage) -> ShelfResult<Self> {
        let (width, height) = img.dimensions();
        let mut data = img.into_raw();
        premultiply_rgba8_in_place(&mut data);
        Self::from_premul_rgba8(width, height, data)
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn bounds(&self) -> PixelRect {
        PixelRect::new(0, 0, self.width, self.height)
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Premultiplied pixel at `(x, y)`.
    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let i = (y as usize * self.width as usize + x as usize) * 4;
        Some([
            self.data[i],
            self.data[i + 1],
            self.data[i + 2],
            self.data[i + 3],
        ])
    }

    /// Replace every pixel with `color`.
    pub fn clear(&mut self, color: Rgba8) {
        let premul = color.premul().to_array();
        for px in self.data.chunks_exact_mut(4) {
            px.copy_from_slice(&premul);
        }
    }

    /// Copy a region into a standalone raster. The region must lie inside the raster.
    pub fn crop(&self, rect: PixelRect) -> ShelfResult<Raster> {
        if rect.is_empty() || !self.bounds().contains_rect(rect) {
            return Err(ShelfError::render(format!(
                "crop {rect:?} outside raster {}x{}",
                self.width, self.height
            )));
        }

        let row_bytes = rect.width as usize * 4;
        let mut data = Vec::with_capacity(row_bytes * rect.height as usize);
        for y in rect.y..rect.y + rect.height {
            let start = (y as usize * self.width as usize + rect.x as usize) * 4;
            data.extend_from_slice(&self.data[start..start + row_bytes]);
        }
        Raster::from_premul_rgba8(rect.width, rect.height, data)
    }

    /// Source-over `src` with its top-left corner at `(x, y)`; overflow is clipped.
    pub fn draw_over(&mut self, x: u32, y: u32, src: &Raster) -> ShelfResult<()> {
        over_region(
            &mut self.data,
            self.width,
            self.height,
            &src.data,
            src.width,
            src.height,
            x,
            y,
        )
    }

    /// Resample to exactly `width` x `height`.
    pub fn resized(&self, width: u32, height: u32) -> ShelfResult<Raster> {
        check_dims(width, height)?;
        if width == self.width && height == self.height {
            return Ok(self.clone());
        }
        // Filtering premultiplied channels keeps transparent edges free of dark fringes.
        let buf = image::RgbaImage::from_raw(self.width, self.height, self.data.clone())
            .ok_or_else(|| ShelfError::render("raster buffer does not match its size"))?;
        let scaled =
            image::imageops::resize(&buf, width, height, image::imageops::FilterType::Triangle);
        Raster::from_premul_rgba8(width, height, scaled.into_raw())
    }

    /// Straight-alpha copy for encoders.
    pub fn to_rgba_image(&self) -> ShelfResult<image::RgbaImage> {
        let mut straight = self.data.clone();
        unpremultiply_rgba8_in_place(&mut straight);
        image::RgbaImage::from_raw(self.width, self.height, straight)
            .ok_or_else(|| ShelfError::render("raster buffer does not match its size"))
    }

    pub fn encode_png(&self) -> ShelfResult<Vec<u8>> {
        let img = self.to_rgba_image()?;
        let mut buf = Vec::new();
        image::DynamicImage::ImageRgba8(img)
            .write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)
            .context("encode raster as png")?;
        Ok(buf)
    }
}

fn check_dims(width: u32, height: u32) -> ShelfResult<()> {
    if width == 0 || height == 0 {
        return Err(ShelfError::render("raster width and height must be > 0"));
    }
    if width > MAX_CANVAS_DIM || height > MAX_CANVAS_DIM {
        return Err(ShelfError::render(format!(
            "raster size too large: {width}x{height} (max {MAX_CANVAS_DIM}x{MAX_CANVAS_DIM})"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clear_fills_premultiplied() {
        let mut r = Raster::new(2, 2).unwrap();
        r.clear(Rgba8::with_alpha(255, 0, 0, 0.5));
        assert_eq!(r.pixel(1, 1), Some([128, 0, 0, 128]));
        assert_eq!(r.pixel(2, 0), None);
    }

    #[test]
    fn crop_copies_the_region() {
        let mut r = Raster::new(4, 4).unwrap();
        r.clear(Rgba8::opaque(0, 0, 0));
        let mut patch = Raster::new(2, 2).unwrap();
        patch.clear(Rgba8::opaque(9, 9, 9));
        r.draw_over(1, 1, &patch).unwrap();

        let c = r.crop(PixelRect::new(1, 1, 2, 2)).unwrap();
        assert_eq!(c.width(), 2);
        assert!(c.data().chunks_exact(4).all(|p| p == [9, 9, 9, 255]));

        assert!(r.crop(PixelRect::new(3, 3, 2, 2)).is_err());
        assert!(r.crop(PixelRect::new(0, 0, 0, 2)).is_err());
    }

    #[test]
    fn resized_hits_exact_size() {
        let mut r = Raster::new(10, 4).unwrap();
        r.clear(Rgba8::opaque(20, 40, 60));
        let s = r.resized(33, 7).unwrap();
        assert_eq!((s.width(), s.height()), (33, 7));
        assert_eq!(s.pixel(16, 3), Some([20, 40, 60, 255]));
    }

    #[test]
    fn png_roundtrip_preserves_size() {
        let mut r = Raster::new(5, 3).unwrap();
        r.clear(Rgba8::opaque(1, 2, 3));
        let png = r.encode_png().unwrap();
        let back = image::load_from_memory(&png).unwrap();
        assert_eq!((back.width(), back.height()), (5, 3));
    }

    #[test]
    fn rejects_zero_and_mismatched() {
        assert!(Raster::new(0, 1).is_err());
        assert!(Raster::from_premul_rgba8(2, 2, vec![0; 3]).is_err());
    }
}
