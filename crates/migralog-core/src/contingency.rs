//! 2x2 contingency tables

use serde::Serialize;

use crate::{DayLabel, Level, LevelTally};

/// `[[a, b], [c, d]]` table of non-negative counts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(transparent)]
pub struct ContingencyTable {
    cells: [[u64; 2]; 2],
}

impl ContingencyTable {
    pub fn new(a: u64, b: u64, c: u64, d: u64) -> Self {
        Self {
            cells: [[a, b], [c, d]],
        }
    }

    /// Month layout: row 0 is the baseline month, row 1 the target month;
    /// columns are above / below average
    pub fn from_tallies(baseline: LevelTally, target: LevelTally) -> Self {
        Self::new(baseline.above, baseline.below, target.above, target.below)
    }

    pub fn cells(&self) -> [[u64; 2]; 2] {
        self.cells
    }

    pub fn a(&self) -> u64 {
        self.cells[0][0]
    }

    pub fn b(&self) -> u64 {
        self.cells[0][1]
    }

    pub fn c(&self) -> u64 {
        self.cells[1][0]
    }

    pub fn d(&self) -> u64 {
        self.cells[1][1]
    }

    /// Totals of row 0 and row 1
    pub fn row_totals(&self) -> [u64; 2] {
        [self.row_total(0), self.row_total(1)]
    }

    /// Totals of column 0 and column 1
    pub fn column_totals(&self) -> [u64; 2] {
        [self.column_total(0), self.column_total(1)]
    }

    /// Same table with its rows exchanged
    pub fn swap_rows(&self) -> Self {
        Self {
            cells: [self.cells[1], self.cells[0]],
        }
    }

    pub(crate) fn row_total(&self, row: usize) -> u64 {
        self.cells[row].iter().sum()
    }

    pub(crate) fn column_total(&self, column: usize) -> u64 {
        self.cells[0][column] + self.cells[1][column]
    }

    pub fn total(&self) -> u64 {
        self.row_total(0) + self.row_total(1)
    }

    pub fn min_cell(&self) -> u64 {
        self.cells.iter().flatten().copied().min().unwrap_or(0)
    }

    /// Cross-product ratio `(a * d) / (b * c)`; `None` when `b` or `c` is zero
    pub fn odds_ratio(&self) -> Option<f64> {
        let denominator = self.b() as f64 * self.c() as f64;
        if denominator == 0.0 {
            return None;
        }
        Some(self.a() as f64 * self.d() as f64 / denominator)
    }
}

/// One observation for [`build`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Observation {
    /// Row selector: `true` lands in row 0
    pub category: bool,
    /// Column selector: `true` lands in column 0
    pub event_present: bool,
}

impl From<&DayLabel> for Observation {
    fn from(label: &DayLabel) -> Self {
        Self {
            category: label.level == Level::Above,
            event_present: label.event,
        }
    }
}

/// Cross-tabulate observations. Cells always sum to the number of inputs.
pub fn build<I>(observations: I) -> ContingencyTable
where
    I: IntoIterator<Item = Observation>,
{
    let mut cells = [[0u64; 2]; 2];
    for obs in observations {
        let row = usize::from(!obs.category);
        let column = usize::from(!obs.event_present);
        cells[row][column] += 1;
    }
    ContingencyTable { cells }
}

/// Weather layout: row 0 above threshold, row 1 below; column 0 event days,
/// column 1 event-free days
pub fn build_from_labels(labels: &[DayLabel]) -> ContingencyTable {
    build(labels.iter().map(Observation::from))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn test_build_cells_sum_to_inputs() {
        let obs = [
            (true, true),
            (true, false),
            (true, false),
            (false, true),
            (false, false),
            (false, false),
            (false, false),
        ]
        .map(|(category, event_present)| Observation {
            category,
            event_present,
        });

        let table = build(obs);
        assert_eq!(table.cells(), [[1, 2], [1, 3]]);
        assert_eq!(table.total(), obs.len() as u64);
        assert_eq!(build(Vec::new()).total(), 0);
    }

    #[test]
    fn test_odds_ratio_cross_product() {
        let table = ContingencyTable::new(10, 5, 3, 12);
        assert_eq!(table.odds_ratio(), Some(8.0));
        assert_eq!(table.min_cell(), 3);
        assert_eq!(table.row_totals(), [15, 15]);
        assert_eq!(table.column_totals(), [13, 17]);
    }

    #[test]
    fn test_swap_rows_inverts_odds_ratio() {
        let swapped = ContingencyTable::new(10, 5, 3, 12).swap_rows();
        assert_eq!(swapped, ContingencyTable::new(3, 12, 10, 5));
        assert_eq!(swapped.odds_ratio(), Some(0.125));
    }

    #[test]
    fn test_odds_ratio_undefined_on_zero_denominator() {
        assert_eq!(ContingencyTable::new(4, 0, 3, 2).odds_ratio(), None);
        assert_eq!(ContingencyTable::new(4, 1, 0, 2).odds_ratio(), None);
        assert_eq!(ContingencyTable::new(0, 1, 1, 2).odds_ratio(), Some(0.0));
    }

    #[test]
    fn test_from_labels_layout() {
        let day = NaiveDate::from_ymd_opt(2020, 1, 1).unwrap();
        let labels = [
            DayLabel {
                date: day,
                level: Level::Above,
                event: true,
            },
            DayLabel {
                date: day,
                level: Level::Below,
                event: false,
            },
        ];
        assert_eq!(build_from_labels(&labels).cells(), [[1, 0], [0, 1]]);
    }

    #[test]
    fn test_from_tallies_layout() {
        let table = ContingencyTable::from_tallies(
            LevelTally { above: 1, below: 4 },
            LevelTally { above: 5, below: 0 },
        );
        assert_eq!(table.cells(), [[1, 4], [5, 0]]);
    }

    #[test]
    fn test_serializes_as_nested_array() {
        let json = serde_json::to_string(&ContingencyTable::new(1, 2, 3, 4)).unwrap();
        assert_eq!(json, "[[1,2],[3,4]]");
    }
}
