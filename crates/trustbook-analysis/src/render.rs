//! Histogram image output.
//!
//! [`HistogramRenderer`] is the seam between binning and pixels; [`BitmapRenderer`]
//! draws figures with `plotters` and encodes them by file extension.

use std::path::Path;

use plotters::prelude::*;
use thiserror::Error;

use crate::histogram::HistogramFigure;

#[derive(Error, Debug)]
pub enum PlotError {
    #[error("failed to create drawing area: {0}")]
    DrawingArea(String),

    #[error("failed to configure chart: {0}")]
    ChartConfig(String),

    #[error("failed to draw chart elements: {0}")]
    Drawing(String),

    #[error("failed to write plot file: {0}")]
    Io(#[from] std::io::Error),
}

pub trait HistogramRenderer {
    fn render(&mut self, figure: &HistogramFigure, path: &Path) -> Result<(), PlotError>;
}

/// Renders side-by-side bar histograms into a bitmap file.
#[derive(Clone, Copy, Debug, Default)]
pub struct BitmapRenderer;

impl HistogramRenderer for BitmapRenderer {
    fn render(&mut self, figure: &HistogramFigure, path: &Path) -> Result<(), PlotError> {
        let root = BitMapBackend::new(path, figure.size).into_drawing_area();
        root.fill(&WHITE)
            .map_err(|e| PlotError::DrawingArea(e.to_string()))?;

        // Shared y-axis: both panels use the tallest bar of the figure.
        let y_max = figure.max_count() + 1;
        let (x_min, x_max) = figure.x_range;
        // One label per bin edge.
        let x_labels = figure.x_ticks().len();

        let areas = root.split_evenly((1, 2));
        for (area, panel) in areas.iter().zip(&figure.panels) {
            let mut chart = ChartBuilder::on(area)
                .caption(&panel.title, ("sans-serif", 22))
                .margin(10)
                .x_label_area_size(30)
                .y_label_area_size(40)
                .build_cartesian_2d(x_min..x_max, 0u32..y_max)
                .map_err(|e| PlotError::ChartConfig(e.to_string()))?;

            chart
                .configure_mesh()
                .disable_x_mesh()
                .x_labels(x_labels)
                .x_label_formatter(&|x| format!("{x:.1}"))
                .y_labels((y_max as usize + 1).min(10))
                .y_label_formatter(&|y| y.to_string())
                .draw()
                .map_err(|e| PlotError::Drawing(e.to_string()))?;

            chart
                .draw_series(panel.histogram.bins.iter().map(|bin| {
                    let (r, g, b) = bin.severity.rgb();
                    Rectangle::new([(bin.lo, 0), (bin.hi, bin.count)], RGBColor(r, g, b).filled())
                }))
                .map_err(|e| PlotError::Drawing(e.to_string()))?;
        }

        root.present()
            .map_err(|e| PlotError::Drawing(e.to_string()))?;
        log::debug!("rendered `{}`", path.display());
        Ok(())
    }
}
