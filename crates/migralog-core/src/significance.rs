//! Exact and asymptotic tests on 2x2 tables

use serde::Serialize;
use tracing::{debug, warn};

use crate::stats::{binomial_pmf, chi_square_sf, hypergeometric_pmf};
use crate::{AnalysisConfig, ContingencyTable, CoreError, CoreResult, ExactMethod, ValidityPolicy};

/// Nuisance-parameter grid resolution for the unconditional exact test
const NUISANCE_GRID_POINTS: u32 = 2000;

/// Relative slack when comparing p-values computed along different paths
const P_VALUE_TOLERANCE: f64 = 1e-7;

/// Outcome of a single hypothesis test
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TestResult {
    pub statistic: f64,
    pub p_value: f64,
    pub significant: bool,
    /// Cross-product ratio of the tested table, if defined
    pub odds_ratio: Option<f64>,
    /// Set when the chi-square validity precondition did not hold
    pub low_confidence: bool,
}

impl TestResult {
    fn new(statistic: f64, p_value: f64, table: &ContingencyTable, alpha: f64) -> Self {
        let p_value = p_value.clamp(0.0, 1.0);
        Self {
            statistic,
            p_value,
            significant: p_value < alpha,
            odds_ratio: table.odds_ratio(),
            low_confidence: false,
        }
    }
}

/// Pearson chi-square statistic and p-value with one degree of freedom.
///
/// With `yates` set, each observed count is moved up to 0.5 towards its
/// expected count before squaring.
pub fn chi_square(table: &ContingencyTable, yates: bool) -> CoreResult<(f64, f64)> {
    let total = table.total() as f64;
    let cells = table.cells();
    let mut statistic = 0.0;

    for (row, row_cells) in cells.iter().enumerate() {
        for (column, observed) in row_cells.iter().enumerate() {
            let expected =
                table.row_total(row) as f64 * table.column_total(column) as f64 / total;
            if !(expected > 0.0) {
                return Err(CoreError::DegenerateContingency(format!(
                    "expected frequency is zero for cell ({row}, {column})"
                )));
            }

            let mut observed = *observed as f64;
            if yates {
                let diff = expected - observed;
                observed += diff.signum() * diff.abs().min(0.5);
            }
            statistic += (observed - expected).powi(2) / expected;
        }
    }

    Ok((statistic, chi_square_sf(statistic, 1)))
}

/// Conditional probability that row 1 holds at least `c` of the column-0
/// total, given the margins.
///
/// For the month layout this is the one-sided Fisher p-value for "the target
/// month lands above average more often than the baseline month".
pub fn fisher_exact_greater(table: &ContingencyTable) -> f64 {
    let population = table.total();
    let successes = table.column_total(0);
    let draws = table.row_total(1);
    let upper = successes.min(draws);

    (table.c()..=upper)
        .map(|k| hypergeometric_pmf(k, population, successes, draws))
        .sum::<f64>()
        .clamp(0.0, 1.0)
}

/// Two-sided Fisher p-value: total probability of tables no more likely
/// than the observed one
pub fn fisher_exact_two_sided(table: &ContingencyTable) -> f64 {
    let population = table.total();
    let successes = table.column_total(0);
    let draws = table.row_total(1);
    let lower = draws.saturating_sub(population - successes);
    let upper = successes.min(draws);

    let observed = hypergeometric_pmf(table.c(), population, successes, draws);
    (lower..=upper)
        .map(|k| hypergeometric_pmf(k, population, successes, draws))
        .filter(|p| *p <= observed * (1.0 + P_VALUE_TOLERANCE))
        .sum::<f64>()
        .clamp(0.0, 1.0)
}

/// Boschloo's unconditional test, one-sided in the same direction as
/// [`fisher_exact_greater`].
///
/// Rows are treated as independent binomial samples. Every table with the
/// same row totals whose Fisher p-value is no larger than the observed one
/// counts towards the p-value, which is then maximised over the shared
/// success probability. Returns `(fisher_statistic, p_value)`.
pub fn boschloo_exact_greater(table: &ContingencyTable) -> (f64, f64) {
    let statistic = fisher_exact_greater(table);
    let n0 = table.row_total(0);
    let n1 = table.row_total(1);

    let mut extreme: Vec<(u64, u64)> = Vec::new();
    for x0 in 0..=n0 {
        for x1 in 0..=n1 {
            let candidate = ContingencyTable::new(x0, n0 - x0, x1, n1 - x1);
            if fisher_exact_greater(&candidate) <= statistic * (1.0 + P_VALUE_TOLERANCE) {
                extreme.push((x0, x1));
            }
        }
    }

    let p_value = (0..=NUISANCE_GRID_POINTS)
        .map(|i| {
            let pi = f64::from(i) / f64::from(NUISANCE_GRID_POINTS);
            extreme
                .iter()
                .map(|(x0, x1)| binomial_pmf(*x0, n0, pi) * binomial_pmf(*x1, n1, pi))
                .sum::<f64>()
        })
        .fold(0.0, f64::max);

    (statistic, p_value.clamp(0.0, 1.0))
}

/// Exact test for the month comparison table
pub fn exact_test(table: &ContingencyTable, method: ExactMethod, alpha: f64) -> TestResult {
    let (statistic, p_value) = match method {
        ExactMethod::Boschloo => boschloo_exact_greater(table),
        ExactMethod::Fisher => {
            let p = fisher_exact_greater(table);
            (p, p)
        }
    };
    TestResult::new(statistic, p_value, table, alpha)
}

/// Chi-square test on a weather table, subject to the validity policy.
///
/// Every cell must be strictly greater than `min_cell_count` for the
/// asymptotic approximation to hold.
pub fn association_test(
    table: &ContingencyTable,
    config: &AnalysisConfig,
) -> CoreResult<TestResult> {
    let smallest = table.min_cell();
    let valid = smallest > config.min_cell_count;

    if !valid {
        match config.validity {
            ValidityPolicy::Strict => {
                return Err(CoreError::InsufficientData {
                    smallest,
                    required: config.min_cell_count,
                });
            }
            ValidityPolicy::Warn => {
                warn!(
                    smallest,
                    required = config.min_cell_count,
                    "chi-square cell below minimum, result is low confidence"
                );
            }
            ValidityPolicy::ExactFallback => {
                debug!(smallest, "falling back to two-sided Fisher exact test");
                let observed = hypergeometric_pmf(
                    table.c(),
                    table.total(),
                    table.column_total(0),
                    table.row_total(1),
                );
                let mut result = TestResult::new(
                    observed,
                    fisher_exact_two_sided(table),
                    table,
                    config.alpha,
                );
                result.low_confidence = true;
                return Ok(result);
            }
        }
    }

    let (statistic, p_value) = chi_square(table, config.yates_correction)?;
    let mut result = TestResult::new(statistic, p_value, table, config.alpha);
    result.low_confidence = !valid;
    Ok(result)
}
