use crate::{
    foundation::core::{Canvas, PixelRect},
    foundation::error::{ShelfError, ShelfResult},
};

/// Smallest gutter between cells and around the canvas edge.
pub const MIN_GUTTER_PX: u32 = 8;

/// Inputs of one run. Immutable once the run starts.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct GridSpec {
    pub canvas: Canvas,
    pub cell_count: u32,
    pub material: String,
}

impl GridSpec {
    pub fn new(
        width: u32,
        height: u32,
        cell_count: u32,
        material: impl Into<String>,
    ) -> ShelfResult<Self> {
        let spec = Self {
            canvas: Canvas { width, height },
            cell_count,
            material: material.into(),
        };
        spec.validate()?;
        Ok(spec)
    }

    /// A spec is valid when every planned cell gets at least one pixel in each direction.
    pub fn validate(&self) -> ShelfResult<()> {
        self.canvas.validate()?;
        if self.cell_count == 0 {
            return Err(ShelfError::validation("cell count must be > 0"));
        }
        let layout = plan_grid(self.cell_count, self.canvas.width, self.canvas.height);
        let (cell_w, cell_h) = cell_size(self.canvas, layout);
        if cell_w == 0 || cell_h == 0 {
            return Err(ShelfError::validation(format!(
                "canvas {}x{} is too small for {} cells ({}x{} grid)",
                self.canvas.width,
                self.canvas.height,
                self.cell_count,
                layout.columns,
                layout.rows
            )));
        }
        Ok(())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct GridLayout {
    pub columns: u32,
    pub rows: u32,
}

impl GridLayout {
    pub fn slots(self) -> u64 {
        u64::from(self.columns) * u64::from(self.rows)
    }
}

/// One slot of the grid. `index` is the row-major draw order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Cell {
    pub index: u32,
    pub rect: PixelRect,
}

/// Near-square grid for `count` cells on a `width` x `height` canvas.
///
/// Wide canvases get proportionally more columns so cells stay close to square.
/// `count`, `width` and `height` are clamped to at least 1.
pub fn plan_grid(count: u32, width: u32, height: u32) -> GridLayout {
    let count = count.max(1);
    let aspect = f64::from(width.max(1)) / f64::from(height.max(1));

    let columns = ((f64::from(count) * aspect).sqrt().ceil() as u32).max(1);
    let rows = count.div_ceil(columns).max(1);
    GridLayout { columns, rows }
}

/// Gutter in pixels: scales with the smaller canvas edge, never below [`MIN_GUTTER_PX`].
pub fn gutter_for(canvas: Canvas) -> u32 {
    let short = canvas.width.min(canvas.height);
    MIN_GUTTER_PX.max((f64::from(short) * 0.008).floor() as u32)
}

fn cell_size(canvas: Canvas, layout: GridLayout) -> (u32, u32) {
    let gutter = i64::from(gutter_for(canvas));
    let span = |total: u32, n: u32| -> u32 {
        let free = i64::from(total) - gutter * (i64::from(n) + 1);
        if free <= 0 {
            return 0;
        }
        (free / i64::from(n)) as u32
    };
    (
        span(canvas.width, layout.columns),
        span(canvas.height, layout.rows),
    )
}

/// Plan the grid and place `spec.cell_count` cells in row-major order.
///
/// Slots beyond the cell count stay empty.
pub fn layout_cells(spec: &GridSpec) -> ShelfResult<(GridLayout, Vec<Cell>)> {
    spec.validate()?;

    let layout = plan_grid(spec.cell_count, spec.canvas.width, spec.canvas.height);
    let gutter = gutter_for(spec.canvas);
    let (cell_w, cell_h) = cell_size(spec.canvas, layout);

    let mut cells = Vec::with_capacity(spec.cell_count as usize);
    'rows: for row in 0..layout.rows {
        for col in 0..layout.columns {
            let index = cells.len() as u32;
            if index >= spec.cell_count {
                break 'rows;
            }
            cells.push(Cell {
                index,
                rect: PixelRect::new(
                    gutter + col * (cell_w + gutter),
                    gutter + row * (cell_h + gutter),
                    cell_w,
                    cell_h,
                ),
            });
        }
    }
    Ok((layout, cells))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn six_cells_on_wide_canvas() {
        let layout = plan_grid(6, 800, 400);
        assert_eq!(layout, GridLayout { columns: 4, rows: 2 });

        let spec = GridSpec::new(800, 400, 6, "oak").unwrap();
        let (layout, cells) = layout_cells(&spec).unwrap();
        assert_eq!(cells.len(), 6);
        assert_eq!(layout.slots() - cells.len() as u64, 2);
    }

    #[test]
    fn plan_covers_count_for_many_shapes() {
        for count in 1..=64u32 {
            for &(w, h) in &[(1, 1), (800, 400), (400, 800), (1920, 1080), (3, 997), (997, 3)] {
                let l = plan_grid(count, w, h);
                assert!(l.columns >= 1 && l.rows >= 1);
                assert!(
                    l.slots() >= u64::from(count),
                    "count={count} w={w} h={h} -> {l:?}"
                );
            }
        }
    }

    #[test]
    fn square_canvas_uses_square_grid() {
        assert_eq!(plan_grid(9, 600, 600), GridLayout { columns: 3, rows: 3 });
        assert_eq!(plan_grid(1, 600, 600), GridLayout { columns: 1, rows: 1 });
    }

    #[test]
    fn gutter_has_floor_and_scales() {
        assert_eq!(gutter_for(Canvas { width: 100, height: 100 }), 8);
        assert_eq!(gutter_for(Canvas { width: 4000, height: 2000 }), 16);
    }

    #[test]
    fn cells_are_row_major_and_inside_canvas() {
        let spec = GridSpec::new(1200, 700, 11, "marble").unwrap();
        let (layout, cells) = layout_cells(&spec).unwrap();
        let bounds = spec.canvas.bounds();

        for (i, cell) in cells.iter().enumerate() {
            assert_eq!(cell.index as usize, i);
            assert!(bounds.contains_rect(cell.rect), "{cell:?}");
            let row = i as u32 / layout.columns;
            let col = i as u32 % layout.columns;
            if col > 0 {
                assert!(cell.rect.x > cells[i - 1].rect.x);
            }
            if row > 0 {
                let above = &cells[i - layout.columns as usize];
                assert!(cell.rect.y > above.rect.y);
            }
        }

        for a in &cells {
            for b in &cells {
                if a.index != b.index {
                    assert!(!a.rect.intersects(b.rect), "{a:?} overlaps {b:?}");
                }
            }
        }
    }

    #[test]
    fn too_small_canvas_is_rejected() {
        let err = GridSpec::new(20, 20, 50, "wood").unwrap_err();
        assert!(err.to_string().contains("too small"));
    }

    #[test]
    fn zero_count_is_rejected() {
        assert!(GridSpec::new(100, 100, 0, "wood").is_err());
    }
}
