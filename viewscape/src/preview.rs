use textplots::{Chart, Plot, Shape};
use viewshed::VisibilityGrid;

/// Draws the visible cells to the terminal, north up.
#[allow(clippy::cast_precision_loss)]
pub fn preview(visibility: &VisibilityGrid) {
    let (rows, cols) = visibility.dimensions();
    let points: Vec<(f32, f32)> = visibility
        .visible_cells()
        .map(|(row, col)| (col as f32, (rows - row) as f32))
        .collect();
    Chart::new(200, 100, 0.0, cols as f32)
        .lineplot(&Shape::Points(&points))
        .display();
}
