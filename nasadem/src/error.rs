use std::{io, path::PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum NasademError {
    #[error("{0}")]
    Io(#[from] io::Error),

    #[error("{} is not named like N44W072.hgt", .0.display())]
    HgtName(PathBuf),

    #[error("{} is {} bytes, expected a 1 or 3 arcsecond tile", .1.display(), .0)]
    HgtLen(u64, PathBuf),
}
