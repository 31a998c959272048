use serde::Serialize;

use crate::schema::TrustValue;

/// Statistic rows of the summary block, top to bottom.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StatKind {
    Mean,
    Variance,
    StdDev,
}

impl StatKind {
    pub const ALL: [StatKind; 3] = [StatKind::Mean, StatKind::Variance, StatKind::StdDev];

    pub const fn index(self) -> u32 {
        match self {
            StatKind::Mean => 0,
            StatKind::Variance => 1,
            StatKind::StdDev => 2,
        }
    }

    /// Label written in the summary block's label column.
    pub const fn label(self) -> &'static str {
        match self {
            StatKind::Mean => "Mean of |fT_ - F(mode)|",
            StatKind::Variance => "Variance of |fT_ - F(mode)|",
            StatKind::StdDev => "Standard deviation of |fT_ - F(mode)|",
        }
    }
}

/// Population statistics of `|d|` over the present differences of one column.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct AbsDiffSummary {
    /// Number of present values the statistics cover.
    pub count: usize,
    pub mean: f64,
    pub variance: f64,
    pub std_dev: f64,
}

impl AbsDiffSummary {
    pub fn get(&self, kind: StatKind) -> f64 {
        match kind {
            StatKind::Mean => self.mean,
            StatKind::Variance => self.variance,
            StatKind::StdDev => self.std_dev,
        }
    }
}

/// Summarize absolute differences, skipping missing values.
///
/// Returns `None` when no value is present.
pub fn summarize_abs(values: impl IntoIterator<Item = TrustValue>) -> Option<AbsDiffSummary> {
    let abs: Vec<f64> = values
        .into_iter()
        .filter_map(TrustValue::as_f64)
        .map(f64::abs)
        .collect();
    if abs.is_empty() {
        return None;
    }

    let n = abs.len() as f64;
    let mean = abs.iter().sum::<f64>() / n;
    let variance = abs.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
    Some(AbsDiffSummary {
        count: abs.len(),
        mean,
        variance,
        std_dev: variance.sqrt(),
    })
}
