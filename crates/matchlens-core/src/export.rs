// CSV export of rendered views for an external plotting tool.

use std::fs;
use std::path::{Path, PathBuf};

use serde::Serialize;
use thiserror::Error;
use tracing::info;

use crate::dashboard::ViewOutput;
use crate::views::PlayerTouches;

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("failed to create export directory {path}: {source}")]
    CreateDir {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to write {path}: {source}")]
    Write { path: PathBuf, source: csv::Error },
}

/// Write `rows` as a CSV file with a header row taken from the field names.
pub fn write_rows<T, I>(path: &Path, rows: I) -> Result<(), ExportError>
where
    T: Serialize,
    I: IntoIterator<Item = T>,
{
    let to_err = |source| ExportError::Write {
        path: path.to_path_buf(),
        source,
    };
    let mut writer = csv::Writer::from_path(path).map_err(to_err)?;
    for row in rows {
        writer.serialize(row).map_err(to_err)?;
    }
    writer.flush().map_err(|e| to_err(e.into()))?;
    Ok(())
}

#[derive(Serialize)]
struct TouchRow<'a> {
    player: &'a str,
    x: f64,
    y: f64,
}

fn touch_rows(touches: &PlayerTouches) -> impl Iterator<Item = TouchRow<'_>> {
    touches.touches.iter().map(move |p| TouchRow {
        player: &touches.player,
        x: p.x,
        y: p.y,
    })
}

#[derive(Serialize)]
struct HeatmapCell {
    column: usize,
    row: usize,
    x_min: f64,
    y_min: f64,
    count: usize,
}

#[derive(Serialize)]
struct ProgressionRow<'a> {
    kind: &'static str,
    player: &'a str,
    count: usize,
}

/// Write every table of a rendered view under `dir`. Returns the files written.
pub fn export_view(dir: &Path, output: &ViewOutput) -> Result<Vec<PathBuf>, ExportError> {
    fs::create_dir_all(dir).map_err(|source| ExportError::CreateDir {
        path: dir.to_path_buf(),
        source,
    })?;

    let mut written = Vec::new();
    let mut file = |name: &str| {
        let path = dir.join(name);
        written.push(path.clone());
        path
    };

    match output {
        ViewOutput::Progressions(view) => {
            let passes = view.passes.iter().map(|c| ProgressionRow {
                kind: "pass",
                player: &c.player,
                count: c.count,
            });
            let carries = view.carries.iter().map(|c| ProgressionRow {
                kind: "carry",
                player: &c.player,
                count: c.count,
            });
            write_rows(&file("progressions.csv"), passes.chain(carries))?;
        }
        ViewOutput::TouchComparison(view) => {
            write_rows(
                &file("touches.csv"),
                touch_rows(&view.first).chain(touch_rows(&view.second)),
            )?;
        }
        ViewOutput::ShotMap(view) => {
            write_rows(&file("shots.csv"), view.shots.iter())?;
            write_rows(&file("xg_by_player.csv"), view.xg_by_player.iter())?;
        }
        ViewOutput::TouchHeatmap(view) => {
            let grid = &view.grid;
            let cells = grid.counts.iter().enumerate().flat_map(|(row, cells)| {
                cells.iter().enumerate().map(move |(column, &count)| HeatmapCell {
                    column,
                    row,
                    x_min: column as f64 * grid.cell_length,
                    y_min: row as f64 * grid.cell_width,
                    count,
                })
            });
            write_rows(&file("heatmap.csv"), cells)?;
        }
        ViewOutput::PassingNetwork(view) => {
            write_rows(&file("network_nodes.csv"), view.nodes.iter())?;
            write_rows(&file("network_edges.csv"), view.edges.iter())?;
        }
        ViewOutput::ReportCard(view) => {
            write_rows(&file("report_card.csv"), view.metrics.iter())?;
        }
    }

    info!("exported {} file(s) to {}", written.len(), dir.display());
    Ok(written)
}
