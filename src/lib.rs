#![forbid(unsafe_code)]
//! `shelfgrid` lays a variable number of "shelf" cells out on a canvas, paints each cell
//! with a procedural material texture, and replaces every cell with a generated subject
//! image composed over that exact background crop.
//!
//! The pipeline is:
//! - [`plan_grid`] / [`layout_cells`]: near-square grid partitioning
//! - [`GridCompositor`]: canvas ownership, material background pass, per-cell compose
//! - [`GridRun`]: sequential per-cell request/compose with progress events
//! - [`Adapter`]: server-side generation with a deterministic SVG fallback
//! - [`Server`]: blocking HTTP front end for the adapter plus static files
//!
//! All rasters are premultiplied RGBA8. Drawing goes through `vello_cpu`; SVG payloads are
//! rasterized with `resvg`.

pub mod assets;
pub mod foundation;
pub mod generate;
pub mod grid;
pub mod layout;
pub mod material;
pub mod render;
pub mod run;
pub mod service;

pub use assets::{
    data_url::DataUrl,
    decode::{decode_data_url, decode_image, encode_png_data_url, image_dimensions},
};
pub use foundation::core::{Canvas, MAX_CANVAS_DIM, PixelRect, Rgba8, Rgba8Premul};
pub use foundation::error::{ShelfError, ShelfResult};
pub use generate::{
    catalog::{Catalog, Orientation, VINTAGE_CAMERAS},
    client::{CellGenerator, GENERATE_PATH, HttpGenerator},
    request::{ErrorBody, GenerateCameraBody, GenerationRequest, GenerationResult, Mode},
};
pub use grid::compositor::GridCompositor;
pub use layout::grid::{Cell, GridLayout, GridSpec, gutter_for, layout_cells, plan_grid};
pub use material::{
    kind::Material,
    pattern::{MaterialPattern, material_pattern},
};
pub use render::{
    paint::{paint_pattern, stroke_border},
    raster::Raster,
};
pub use run::pipeline::{
    CellReport, CellStatus, GridRun, RunEvent, RunObserver, RunReport, RunState,
};
pub use service::{
    adapter::Adapter,
    capability::{ImageCapability, ImageEdit, OpenAiImageEdits, build_instruction},
    config::{AdapterConfig, ServerConfig, TimeoutPolicy},
    fallback::fallback_svg,
    server::{Server, route},
};
