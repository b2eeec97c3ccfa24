use std::{io, path::PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum RenderError {
    #[error("visibility grid is {vis_rows}x{vis_cols}, elevation grid is {rows}x{cols}")]
    Shape {
        rows: usize,
        cols: usize,
        vis_rows: usize,
        vis_cols: usize,
    },

    #[error("creating {}: {source}", .path.display())]
    Io { path: PathBuf, source: io::Error },

    #[error("writing {}: {msg}", .path.display())]
    Encode { path: PathBuf, msg: String },

    #[error("{0}x{1} image is too large")]
    Size(usize, usize),
}
