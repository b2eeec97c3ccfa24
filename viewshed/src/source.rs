use crate::{ElevationGrid, GridGeometry, SourceError};

/// Something that can supply elevation samples for a grid.
///
/// Sources are consulted once, before any visibility analysis runs;
/// a failure aborts the analysis.
pub trait ElevationSource {
    /// Returns an elevation grid sampled at every cell of `geometry`.
    fn fetch(&self, geometry: &GridGeometry) -> Result<ElevationGrid, SourceError>;
}

impl<S: ElevationSource + ?Sized> ElevationSource for &S {
    fn fetch(&self, geometry: &GridGeometry) -> Result<ElevationGrid, SourceError> {
        (**self).fetch(geometry)
    }
}
