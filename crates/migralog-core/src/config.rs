//! Tunables for the statistical pipeline

use serde::{Deserialize, Serialize};

use crate::{CoreError, CoreResult};

/// How the per-year monthly average is divided
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AverageDivisor {
    /// Always divide by 12, even for a truncated final year
    #[default]
    Constant,
    /// Divide by the number of month buckets present for the year
    PresentMonths,
}

/// What to do when a chi-square table has a cell at or below the minimum count
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ValidityPolicy {
    /// Return `CoreError::InsufficientData`
    #[default]
    Strict,
    /// Run the chi-square test anyway and flag the result as low confidence
    Warn,
    /// Use a two-sided Fisher exact p-value instead, flagged as low confidence
    ExactFallback,
}

/// Exact test used for the month comparison
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ExactMethod {
    /// Unconditional test ordered by the Fisher p-value
    #[default]
    Boschloo,
    /// Conditional hypergeometric test
    Fisher,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Month (1-12) every other month is compared against
    pub baseline_month: u32,
    /// Significance level
    pub alpha: f64,
    /// Every chi-square cell must be strictly greater than this
    pub min_cell_count: u64,
    pub validity: ValidityPolicy,
    pub average_divisor: AverageDivisor,
    /// Day-over-day pressure change that counts as a swing
    pub pressure_delta: f64,
    pub exact_method: ExactMethod,
    /// Apply Yates' continuity correction to 2x2 chi-square tests
    pub yates_correction: bool,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            baseline_month: 11,
            alpha: 0.05,
            min_cell_count: 5,
            validity: ValidityPolicy::Strict,
            average_divisor: AverageDivisor::Constant,
            pressure_delta: 10.0,
            exact_method: ExactMethod::Boschloo,
            yates_correction: true,
        }
    }
}

impl AnalysisConfig {
    pub fn validate(&self) -> CoreResult<()> {
        if !(1..=12).contains(&self.baseline_month) {
            return Err(CoreError::InvalidMonth(self.baseline_month));
        }
        Ok(())
    }
}
