use rand::Rng;

use crate::{
    assets::decode::decode_data_url,
    foundation::error::{ShelfError, ShelfResult},
    generate::{
        catalog::{Catalog, Orientation},
        client::CellGenerator,
        request::{GenerationRequest, Mode},
    },
    grid::compositor::GridCompositor,
    layout::grid::{Cell, GridSpec},
    render::raster::Raster,
};

/// Where a run currently is. Indices are cell indices.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RunState {
    Idle,
    LayingOut,
    Requesting(u32),
    Composing(u32),
    Done,
}

/// Progress notification emitted during [`GridRun::execute`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RunEvent {
    Started { total: u32 },
    CellRendered { index: u32, total: u32, mode: Mode },
    CellFailed { index: u32, total: u32, message: String },
    Finished { total: u32 },
}

impl RunEvent {
    /// One-line human status for this event.
    pub fn status_line(&self) -> String {
        match self {
            Self::Started { total } => format!("Generating {total} cameras..."),
            Self::CellRendered { index, total, mode } => {
                format!("Rendered {}/{total} cameras ({mode} mode)", index + 1)
            }
            Self::CellFailed { index, .. } => format!("Error while rendering cell {}.", index + 1),
            Self::Finished { total } => format!("Done. Rendered {total} cameras."),
        }
    }
}

/// Receives progress events and, optionally, every state transition of a run.
pub trait RunObserver {
    fn on_event(&mut self, event: &RunEvent);

    /// Called each time the run enters a new [`RunState`].
    fn on_state(&mut self, _state: RunState) {}
}

impl<F: FnMut(&RunEvent)> RunObserver for F {
    fn on_event(&mut self, event: &RunEvent) {
        self(event)
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CellStatus {
    Rendered(Mode),
    Failed(String),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CellReport {
    pub index: u32,
    pub subject: String,
    pub orientation: Orientation,
    pub status: CellStatus,
}

/// Outcome of one run, one entry per cell in draw order.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RunReport {
    pub total: u32,
    pub cells: Vec<CellReport>,
}

impl RunReport {
    pub fn rendered(&self) -> usize {
        self.cells
            .iter()
            .filter(|c| matches!(c.status, CellStatus::Rendered(_)))
            .count()
    }

    pub fn failed(&self) -> usize {
        self.cells.len() - self.rendered()
    }

    /// Always reports the total cell count, failed cells included.
    pub fn status_line(&self) -> String {
        RunEvent::Finished { total: self.total }.status_line()
    }
}

/// Drives one grid from layout to the last composed cell.
///
/// Cells are generated strictly one after another. A failed cell is recorded and skipped;
/// it never aborts the run and is never retried.
#[derive(Debug)]
pub struct GridRun {
    spec: GridSpec,
    catalog: Catalog,
    state: RunState,
    compositor: Option<GridCompositor>,
}

impl GridRun {
    pub fn new(spec: GridSpec) -> Self {
        Self::with_catalog(spec, Catalog::default())
    }

    pub fn with_catalog(spec: GridSpec, catalog: Catalog) -> Self {
        Self {
            spec,
            catalog,
            state: RunState::Idle,
            compositor: None,
        }
    }

    pub fn spec(&self) -> &GridSpec {
        &self.spec
    }

    pub fn state(&self) -> RunState {
        self.state
    }

    /// Canvas of the most recent run, if any.
    pub fn raster(&self) -> Option<&Raster> {
        self.compositor.as_ref().map(GridCompositor::raster)
    }

    pub fn encode_png(&self) -> ShelfResult<Vec<u8>> {
        self.compositor
            .as_ref()
            .ok_or_else(|| ShelfError::render("nothing rendered yet"))?
            .encode_png()
    }

    /// Lay out the grid, then request and compose every cell in index order.
    ///
    /// Only layout problems are returned as errors; per-cell failures land in the report.
    #[tracing::instrument(skip_all, fields(
        cells = self.spec.cell_count,
        material = %self.spec.material,
    ))]
    pub fn execute<G, R, O>(
        &mut self,
        generator: &G,
        rng: &mut R,
        observer: &mut O,
    ) -> ShelfResult<RunReport>
    where
        G: CellGenerator + ?Sized,
        R: Rng,
        O: RunObserver + ?Sized,
    {
        enter(&mut self.state, RunState::Idle, observer);
        self.compositor = None;

        let total = self.spec.cell_count;
        enter(&mut self.state, RunState::LayingOut, observer);
        let (mut compositor, cells) = match GridCompositor::lay_out(&self.spec, rng) {
            Ok(v) => v,
            Err(e) => {
                enter(&mut self.state, RunState::Idle, observer);
                return Err(e);
            }
        };
        observer.on_event(&RunEvent::Started { total });

        let mut reports = Vec::with_capacity(cells.len());
        for cell in &cells {
            let subject = self.catalog.subject_for(cell.index).to_string();
            let orientation = self.catalog.orientation_for(cell.index);

            let outcome = render_cell(
                &mut self.state,
                observer,
                &mut compositor,
                generator,
                cell,
                &subject,
                orientation,
                &self.spec.material,
            );

            let (event, status) = match outcome {
                Ok(mode) => {
                    tracing::info!(index = cell.index, %subject, %mode, "cell rendered");
                    (
                        RunEvent::CellRendered {
                            index: cell.index,
                            total,
                            mode,
                        },
                        CellStatus::Rendered(mode),
                    )
                }
                Err(e) => {
                    tracing::warn!(index = cell.index, %subject, error = %e, "cell failed");
                    (
                        RunEvent::CellFailed {
                            index: cell.index,
                            total,
                            message: e.to_string(),
                        },
                        CellStatus::Failed(e.to_string()),
                    )
                }
            };
            observer.on_event(&event);
            reports.push(CellReport {
                index: cell.index,
                subject,
                orientation,
                status,
            });
        }

        self.compositor = Some(compositor);
        enter(&mut self.state, RunState::Done, observer);
        observer.on_event(&RunEvent::Finished { total });

        Ok(RunReport {
            total,
            cells: reports,
        })
    }
}

/// Move to `next`, telling the observer only when the state actually changes.
fn enter<O: RunObserver + ?Sized>(state: &mut RunState, next: RunState, observer: &mut O) {
    if *state != next {
        *state = next;
        observer.on_state(next);
    }
}

fn render_cell<G, O>(
    state: &mut RunState,
    observer: &mut O,
    compositor: &mut GridCompositor,
    generator: &G,
    cell: &Cell,
    subject: &str,
    orientation: Orientation,
    material: &str,
) -> ShelfResult<Mode>
where
    G: CellGenerator + ?Sized,
    O: RunObserver + ?Sized,
{
    enter(state, RunState::Requesting(cell.index), observer);
    let request = GenerationRequest {
        background: compositor.crop_cell_data_url(cell)?,
        subject_label: subject.to_string(),
        orientation_label: orientation.as_str().to_string(),
        material_label: material.to_string(),
        target_width: cell.rect.width,
        target_height: cell.rect.height,
    };
    let result = generator.generate(&request)?;

    // Decode completely before touching the canvas.
    let foreground = decode_data_url(&result.image, cell.rect.width, cell.rect.height)?;

    enter(state, RunState::Composing(cell.index), observer);
    compositor.compose(cell, &foreground)?;
    Ok(result.mode)
}
