use rand::Rng;

use crate::{
    assets::{data_url::DataUrl, decode::encode_png_data_url},
    foundation::core::Rgba8,
    foundation::error::{ShelfError, ShelfResult},
    layout::grid::{Cell, GridLayout, GridSpec, layout_cells},
    material::{kind::Material, pattern::material_pattern},
    render::{
        paint::{paint_pattern, stroke_border},
        raster::Raster,
    },
};

pub const BACKGROUND: Rgba8 = Rgba8::opaque(0x12, 0x13, 0x17);
pub const CELL_BORDER_WIDTH: f64 = 3.0;

pub fn cell_border_color() -> Rgba8 {
    Rgba8::with_alpha(30, 30, 35, 0.55)
}

/// Owns the shared canvas raster for one run. Single writer; no locking.
#[derive(Clone, Debug)]
pub struct GridCompositor {
    spec: GridSpec,
    material: Material,
    layout: GridLayout,
    raster: Raster,
}

impl GridCompositor {
    /// Background pass: clear the canvas, then paint every cell's material and border.
    #[tracing::instrument(skip_all, fields(
        width = spec.canvas.width,
        height = spec.canvas.height,
        cells = spec.cell_count,
    ))]
    pub fn lay_out<R: Rng>(spec: &GridSpec, rng: &mut R) -> ShelfResult<(Self, Vec<Cell>)> {
        let (layout, cells) = layout_cells(spec)?;
        let material = Material::classify(&spec.material);

        let mut raster = Raster::new(spec.canvas.width, spec.canvas.height)?;
        raster.clear(BACKGROUND);

        for cell in &cells {
            let pattern = material_pattern(material, cell.rect.width, cell.rect.height, rng);
            paint_pattern(&mut raster, cell.rect, &pattern)?;
            stroke_border(&mut raster, cell.rect, cell_border_color(), CELL_BORDER_WIDTH)?;
        }

        tracing::debug!(
            columns = layout.columns,
            rows = layout.rows,
            material = %material,
            "background laid out"
        );
        Ok((
            Self {
                spec: spec.clone(),
                material,
                layout,
                raster,
            },
            cells,
        ))
    }

    pub fn spec(&self) -> &GridSpec {
        &self.spec
    }

    pub fn material(&self) -> Material {
        self.material
    }

    pub fn layout(&self) -> GridLayout {
        self.layout
    }

    pub fn raster(&self) -> &Raster {
        &self.raster
    }

    /// Current pixels of `cell`.
    pub fn crop_cell(&self, cell: &Cell) -> ShelfResult<Raster> {
        self.raster.crop(cell.rect)
    }

    pub fn crop_cell_data_url(&self, cell: &Cell) -> ShelfResult<DataUrl> {
        encode_png_data_url(&self.crop_cell(cell)?)
    }

    /// Scale `foreground` to the cell and draw it source-over at the cell position.
    pub fn compose(&mut self, cell: &Cell, foreground: &Raster) -> ShelfResult<()> {
        if !self.raster.bounds().contains_rect(cell.rect) || cell.rect.is_empty() {
            return Err(ShelfError::render(format!(
                "cell {} at {:?} is outside the canvas",
                cell.index, cell.rect
            )));
        }
        let scaled = foreground.resized(cell.rect.width, cell.rect.height)?;
        self.raster.draw_over(cell.rect.x, cell.rect.y, &scaled)
    }

    pub fn encode_png(&self) -> ShelfResult<Vec<u8>> {
        self.raster.encode_png()
    }
}
