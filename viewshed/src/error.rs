use nasadem::NasademError;
use std::path::PathBuf;
use thiserror::Error;

/// Errors from constructing or indexing an elevation grid.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GridError {
    #[error("cell ({row}, {col}) is outside the {rows}x{cols} grid")]
    OutOfBounds {
        row: isize,
        col: isize,
        rows: usize,
        cols: usize,
    },

    #[error("resolution must be a positive number of meters, got {0}")]
    Resolution(f64),

    #[error("elevation grid has no samples")]
    Empty,

    #[error("row {row} has {len} samples, expected {expected}")]
    Ragged {
        row: usize,
        len: usize,
        expected: usize,
    },

    #[error("expected {expected} samples, got {len}")]
    Len { len: usize, expected: usize },

    #[error("non-finite elevation at cell ({row}, {col})")]
    Sample { row: usize, col: usize },

    #[error("grid extent reaches latitude {0}")]
    Extent(f64),

    #[error("{rows}x{cols} grid exceeds the cell limit")]
    TooLarge { rows: usize, cols: usize },

    #[error("coordinate ({lat}, {lon}) is not a finite position")]
    Coord { lat: f64, lon: f64 },
}

/// Errors from an elevation source.
#[derive(Error, Debug)]
pub enum SourceError {
    #[error("{0}")]
    Io(#[from] std::io::Error),

    #[error("no height files in {0}")]
    Path(PathBuf),

    #[error("missing elevation tile {0}")]
    MissingTile(PathBuf),

    #[error("no elevation sample at lat {lat}, lon {lon}")]
    Void { lat: f64, lon: f64 },

    #[error("{0}")]
    Nasadem(#[from] NasademError),

    #[error("{0}")]
    Grid(#[from] GridError),
}

#[derive(Error, Debug)]
pub enum ViewshedError {
    #[error("invalid {field} {value}")]
    Validation { field: &'static str, value: f64 },

    #[error("viewpoint ({lat}, {lon}) lies outside the elevation grid")]
    ViewpointOutside { lat: f64, lon: f64 },

    #[error("{0}")]
    Grid(#[from] GridError),

    #[error("{0}")]
    Source(#[from] SourceError),
}
