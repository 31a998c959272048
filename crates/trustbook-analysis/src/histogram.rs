//! Binning of difference columns for the per-measure histogram figures.

use serde::Serialize;

use crate::config::HistogramConfig;
use crate::schema::{DiffColumn, ReferenceMeasure, TrustValue};

/// Bar color of a bin, by how far the bin sits from the outer edges of the range.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BinSeverity {
    Red,
    Orange,
    Yellow,
    Green,
}

impl BinSeverity {
    /// Severity of bin `index` out of `bins`: outermost red, then orange, yellow, and green inside.
    pub fn for_bin(index: usize, bins: usize) -> Self {
        let from_edge = index.min(bins.saturating_sub(1).saturating_sub(index));
        match from_edge {
            0 => BinSeverity::Red,
            1 => BinSeverity::Orange,
            2 => BinSeverity::Yellow,
            _ => BinSeverity::Green,
        }
    }

    pub const fn rgb(self) -> (u8, u8, u8) {
        match self {
            BinSeverity::Red => (255, 0, 0),
            BinSeverity::Orange => (255, 165, 0),
            BinSeverity::Yellow => (255, 255, 0),
            BinSeverity::Green => (0, 128, 0),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct Bin {
    pub lo: f64,
    pub hi: f64,
    pub count: u32,
    pub severity: BinSeverity,
}

/// Equal-width bins over `[min, max]`.
///
/// Bins are half-open `[lo, hi)` except the last, which also includes `max`.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Histogram {
    pub bins: Vec<Bin>,
    /// Present values outside `[min, max]`.
    pub out_of_range: usize,
    pub missing: usize,
}

impl Histogram {
    pub fn from_values(values: impl IntoIterator<Item = TrustValue>, config: &HistogramConfig) -> Self {
        let n = config.bins;
        let width = config.bin_width();
        let mut bins: Vec<Bin> = (0..n)
            .map(|i| Bin {
                lo: config.min + width * i as f64,
                hi: if i + 1 == n {
                    config.max
                } else {
                    config.min + width * (i + 1) as f64
                },
                count: 0,
                severity: BinSeverity::for_bin(i, n),
            })
            .collect();

        let mut out_of_range = 0;
        let mut missing = 0;
        for value in values {
            let Some(v) = value.as_f64() else {
                missing += 1;
                continue;
            };
            match bin_index(v, config) {
                Some(i) => bins[i].count += 1,
                None => out_of_range += 1,
            }
        }

        Self {
            bins,
            out_of_range,
            missing,
        }
    }

    pub fn max_count(&self) -> u32 {
        self.bins.iter().map(|b| b.count).max().unwrap_or(0)
    }

    pub fn total(&self) -> u32 {
        self.bins.iter().map(|b| b.count).sum()
    }
}

fn bin_index(v: f64, config: &HistogramConfig) -> Option<usize> {
    if !(config.min..=config.max).contains(&v) {
        return None;
    }
    let last = config.bins.checked_sub(1)?;
    let raw = ((v - config.min) / config.bin_width()).floor();
    // `v == max` lands one past the end; float error can do the same just below it.
    Some((raw as usize).min(last))
}

/// One side of a figure: the histogram of a single difference column.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct HistogramPanel {
    pub column: DiffColumn,
    pub title: String,
    pub histogram: Histogram,
}

/// Two panels (fTi and fTa differences) against one reference measure, sharing a y-axis.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct HistogramFigure {
    pub measure: ReferenceMeasure,
    pub panels: [HistogramPanel; 2],
    pub x_range: (f64, f64),
    /// Tick spacing on the x-axis (one bin).
    pub x_step: f64,
    pub size: (u32, u32),
}

impl HistogramFigure {
    pub fn file_name(&self) -> String {
        format!("hist_{}.jpg", self.measure.key())
    }

    /// Tallest bar across both panels.
    pub fn max_count(&self) -> u32 {
        self.panels
            .iter()
            .map(|p| p.histogram.max_count())
            .max()
            .unwrap_or(0)
    }

    /// x-axis tick positions, one per bin edge.
    pub fn x_ticks(&self) -> Vec<f64> {
        let (min, max) = self.x_range;
        let steps = ((max - min) / self.x_step).round() as usize;
        (0..=steps).map(|i| min + self.x_step * i as f64).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use TrustValue::{Missing, Present};

    #[test]
    fn severity_is_symmetric_around_the_center() {
        let severities: Vec<BinSeverity> = (0..8).map(|i| BinSeverity::for_bin(i, 8)).collect();
        use BinSeverity::*;
        assert_eq!(
            severities,
            [Red, Orange, Yellow, Green, Green, Yellow, Orange, Red]
        );
        assert_eq!(BinSeverity::for_bin(0, 1), Red);
    }

    #[test]
    fn edges_are_half_open_except_the_last() {
        let config = HistogramConfig::default();
        let hist = Histogram::from_values(
            [
                Present(-2.0),
                Present(-1.5),
                Present(0.0),
                Present(1.49),
                Present(2.0),
                Present(2.01),
                Present(-7.0),
                Missing,
            ],
            &config,
        );
        let counts: Vec<u32> = hist.bins.iter().map(|b| b.count).collect();
        assert_eq!(counts, [1, 1, 0, 0, 1, 0, 1, 1]);
        assert_eq!(hist.out_of_range, 2);
        assert_eq!(hist.missing, 1);
        assert_eq!(hist.total(), 5);
        assert_eq!((hist.bins[0].lo, hist.bins[0].hi), (-2.0, -1.5));
        assert_eq!((hist.bins[7].lo, hist.bins[7].hi), (1.5, 2.0));
    }

    #[test]
    fn zero_bins_count_everything_as_out_of_range() {
        let config = HistogramConfig {
            bins: 0,
            ..HistogramConfig::default()
        };
        let hist = Histogram::from_values([Present(0.0), Present(2.0), Missing], &config);
        assert!(hist.bins.is_empty());
        assert_eq!(hist.out_of_range, 2);
        assert_eq!(hist.missing, 1);
    }

    #[test]
    fn ticks_fall_on_every_bin_edge() {
        let config = HistogramConfig::default();
        let empty = Histogram::from_values(Vec::<TrustValue>::new(), &config);
        let column = DiffColumn::new(crate::schema::TrustSource::Initial, ReferenceMeasure::B);
        let panel = HistogramPanel {
            column,
            title: column.header(),
            histogram: empty,
        };
        let figure = HistogramFigure {
            measure: ReferenceMeasure::B,
            panels: [panel.clone(), panel],
            x_range: (config.min, config.max),
            x_step: config.bin_width(),
            size: (config.width, config.height),
        };
        assert_eq!(
            figure.x_ticks(),
            [-2.0, -1.5, -1.0, -0.5, 0.0, 0.5, 1.0, 1.5, 2.0]
        );
        assert_eq!(figure.file_name(), "hist_b.jpg");
        assert_eq!(figure.max_count(), 0);
    }
}
