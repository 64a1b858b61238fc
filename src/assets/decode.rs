use std::io::Cursor;
use std::sync::{Arc, OnceLock};

use crate::{
    assets::data_url::DataUrl,
    foundation::error::{ShelfError, ShelfResult},
    render::raster::Raster,
};

/// Decode a PNG/JPEG/WebP/... byte stream into a premultiplied raster.
pub fn decode_image(bytes: &[u8]) -> ShelfResult<Raster> {
    let dyn_img = image::load_from_memory(bytes)
        .map_err(|e| ShelfError::decode(format!("decode image from memory: {e}")))?;
    Raster::from_rgba_image(dyn_img.to_rgba8())
}

/// Width and height from the image header, without decoding pixels.
pub fn image_dimensions(bytes: &[u8]) -> Option<(u32, u32)> {
    image::ImageReader::new(Cursor::new(bytes))
        .with_guessed_format()
        .ok()?
        .into_dimensions()
        .ok()
}

pub fn parse_svg(bytes: &[u8]) -> ShelfResult<usvg::Tree> {
    let opts = usvg::Options {
        fontdb: svg_fontdb(),
        ..Default::default()
    };
    usvg::Tree::from_data(bytes, &opts)
        .map_err(|e| ShelfError::decode(format!("parse svg tree: {e}")))
}

/// Render `tree` stretched to exactly `width` x `height`.
pub fn rasterize_svg(tree: &usvg::Tree, width: u32, height: u32) -> ShelfResult<Raster> {
    let size = tree.size();
    if !size.width().is_finite() || size.width() <= 0.0 || size.height() <= 0.0 {
        return Err(ShelfError::decode("svg has invalid width/height"));
    }

    let mut pixmap = resvg::tiny_skia::Pixmap::new(width, height)
        .ok_or_else(|| ShelfError::render("failed to allocate svg pixmap"))?;

    let sx = (width as f32) / size.width();
    let sy = (height as f32) / size.height();
    let xform = resvg::tiny_skia::Transform::from_scale(sx, sy);

    resvg::render(tree, xform, &mut pixmap.as_mut());
    Raster::from_premul_rgba8(width, height, pixmap.data().to_vec())
}

/// Decode a data URL into a raster of exactly `width` x `height`.
///
/// Vector payloads are rendered at the target size; raster payloads are decoded at
/// their native size and resampled.
pub fn decode_data_url(url: &DataUrl, width: u32, height: u32) -> ShelfResult<Raster> {
    if url.is_svg() {
        let tree = parse_svg(url.bytes())?;
        return rasterize_svg(&tree, width, height);
    }
    decode_image(url.bytes())?.resized(width, height)
}

/// Encode a raster as a PNG data URL.
pub fn encode_png_data_url(raster: &Raster) -> ShelfResult<DataUrl> {
    Ok(DataUrl::png(raster.encode_png()?))
}

fn svg_fontdb() -> Arc<usvg::fontdb::Database> {
    static FONTDB: OnceLock<Arc<usvg::fontdb::Database>> = OnceLock::new();
    FONTDB
        .get_or_init(|| {
            let mut db = usvg::fontdb::Database::new();
            db.load_system_fonts();
            tracing::debug!(faces = db.len(), "loaded system fonts for svg text");
            Arc::new(db)
        })
        .clone()
}
