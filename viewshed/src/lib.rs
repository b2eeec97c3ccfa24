//! Terrain line-of-sight analysis.
//!
//! Given an [`ElevationGrid`] and a [`Viewpoint`] on it,
//! [`VisibilityGrid::builder`] computes which cells an observer can
//! see inside their field of view.

mod error;
mod grid;
pub mod math;
mod ray;
mod source;
mod tiles;
mod viewpoint;
mod visibility;

pub use crate::{
    error::{GridError, SourceError, ViewshedError},
    grid::{ElevationGrid, GridGeometry, Interpolation, MAX_CELLS},
    math::Curvature,
    ray::{Ray, RayStep, RaySteps},
    source::ElevationSource,
    tiles::{TileMode, Tiles},
    viewpoint::{validate, Sector, Viewpoint},
    visibility::{VisibilityBuilder, VisibilityGrid, DEFAULT_REFRACTION},
};
pub use geo;
