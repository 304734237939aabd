//! Per-group comparison tables and column statistics.

use std::collections::BTreeMap;
use std::fmt::{Display, Formatter};

use serde::{Deserialize, Serialize};

use crate::model::{AggregateRow, AggregateTable, ColumnSummary, DerivedRow, DerivedTable};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Stat {
    Sum,
    Mean,
}

impl Display for Stat {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Sum => f.write_str("Sum"),
            Self::Mean => f.write_str("Mean"),
        }
    }
}

/// Which columns a template's comparison table reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AggregatePlan {
    pub sums: &'static [&'static str],
    pub means: &'static [&'static str],
    /// Aggregate ranked in descending order.
    pub rank_by: (&'static str, Stat),
    /// Aggregate reported as a difference from the mean across groups.
    pub delta_of: (&'static str, Stat),
}

#[must_use]
pub fn stat_column(column: &str, stat: Stat) -> String {
    format!("{column} {stat}")
}

fn group_rows<'a>(table: &'a DerivedTable, group_by: &str) -> BTreeMap<String, Vec<&'a DerivedRow>> {
    let mut groups: BTreeMap<String, Vec<&DerivedRow>> = BTreeMap::new();
    for row in &table.rows {
        let key = row.text(group_by).unwrap_or_default().to_string();
        groups.entry(key).or_default().push(row);
    }
    groups
}

fn sum_of(rows: &[&DerivedRow], column: &str) -> f64 {
    rows.iter().map(|row| row.number(column)).sum()
}

#[allow(clippy::cast_precision_loss)]
fn mean_of(rows: &[&DerivedRow], column: &str) -> f64 {
    if rows.is_empty() {
        return 0.0;
    }
    sum_of(rows, column) / rows.len() as f64
}

/// Groups rows by the text value of `group_by` and computes the template's
/// comparison columns. Groups are ordered by key.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn aggregate(table: &DerivedTable, group_by: &str) -> AggregateTable {
    let plan = table.template.aggregate_plan();
    let rank_column = format!("{} Rank", stat_column(plan.rank_by.0, plan.rank_by.1));
    let delta_source = stat_column(plan.delta_of.0, plan.delta_of.1);
    let delta_column = format!("{delta_source} vs Avg");

    let mut columns = plan
        .sums
        .iter()
        .map(|column| stat_column(column, Stat::Sum))
        .chain(plan.means.iter().map(|column| stat_column(column, Stat::Mean)))
        .collect::<Vec<_>>();

    let mut rows = group_rows(table, group_by)
        .into_iter()
        .map(|(key, members)| {
            let mut values = BTreeMap::new();
            for column in plan.sums {
                values.insert(stat_column(column, Stat::Sum), sum_of(&members, column));
            }
            for column in plan.means {
                values.insert(stat_column(column, Stat::Mean), mean_of(&members, column));
            }
            for (column, stat) in [plan.rank_by, plan.delta_of] {
                let value = match stat {
                    Stat::Sum => sum_of(&members, column),
                    Stat::Mean => mean_of(&members, column),
                };
                values.entry(stat_column(column, stat)).or_insert(value);
            }
            AggregateRow {
                key,
                reports: members.len(),
                values,
                rank: 0,
            }
        })
        .collect::<Vec<_>>();

    let rank_source = stat_column(plan.rank_by.0, plan.rank_by.1);
    let ranked = rows
        .iter()
        .map(|row| row.values.get(&rank_source).copied().unwrap_or(0.0))
        .collect::<Vec<_>>();
    for (row, value) in rows.iter_mut().zip(&ranked) {
        row.rank = 1 + ranked.iter().filter(|other| *other > value).count();
    }

    if !rows.is_empty() {
        let sources = rows
            .iter()
            .map(|row| row.values.get(&delta_source).copied().unwrap_or(0.0))
            .collect::<Vec<_>>();
        let overall = sources.iter().sum::<f64>() / sources.len() as f64;
        for (row, value) in rows.iter_mut().zip(sources) {
            row.values.insert(delta_column.clone(), value - overall);
        }
    }

    for extra in [&rank_source, &delta_source] {
        if !columns.contains(extra) {
            columns.push(extra.clone());
        }
    }
    columns.push(delta_column);

    AggregateTable {
        group_by: group_by.to_string(),
        columns,
        rank_column,
        rows,
    }
}

fn quantile(sorted: &[f64], q: f64) -> Option<f64> {
    let last = sorted.len().checked_sub(1)?;
    #[allow(clippy::cast_precision_loss)]
    let position = q * last as f64;
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let lower = position.floor() as usize;
    let upper = (lower + 1).min(last);
    let weight = position - position.floor();
    Some(sorted[lower] + (sorted[upper] - sorted[lower]) * weight)
}

#[allow(clippy::cast_precision_loss)]
fn summarize_values(column: &str, values: &[f64]) -> ColumnSummary {
    let count = values.len();
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);

    let mean = (count > 0).then(|| values.iter().sum::<f64>() / count as f64);
    let std = mean.filter(|_| count > 1).map(|mean| {
        let squares = values.iter().map(|value| (value - mean).powi(2)).sum::<f64>();
        (squares / (count - 1) as f64).sqrt()
    });

    ColumnSummary {
        column: column.to_string(),
        count,
        mean,
        std,
        min: sorted.first().copied(),
        p25: quantile(&sorted, 0.25),
        p50: quantile(&sorted, 0.5),
        p75: quantile(&sorted, 0.75),
        max: sorted.last().copied(),
    }
}

/// Descriptive statistics for each named numeric column.
#[must_use]
pub fn summarize(table: &DerivedTable, columns: &[&str]) -> Vec<ColumnSummary> {
    columns
        .iter()
        .map(|column| summarize_values(column, &table.column_values(column)))
        .collect()
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::{aggregate, summarize};
    use crate::derive::columns;
    use crate::model::{Cell, DerivedRow, DerivedTable};
    use crate::template::{Template, fields};

    fn row(well: &str, rop: f64, dilution: f64) -> DerivedRow {
        let mut cells = BTreeMap::new();
        cells.insert(fields::WELL_NAME.to_string(), Cell::Text(well.to_string()));
        cells.insert(columns::ROP.to_string(), Cell::Number(rop));
        cells.insert(columns::TOTAL_DILUTION.to_string(), Cell::Number(dilution));
        DerivedRow {
            document: format!("{well}.pdf"),
            date: None,
            cells,
            defaulted: Vec::new(),
            unparsed: Vec::new(),
        }
    }

    fn table(rows: Vec<DerivedRow>) -> DerivedTable {
        DerivedTable {
            template: Template::SolidsControl,
            columns: Vec::new(),
            rows,
        }
    }

    #[test]
    fn mean_rop_per_well() {
        let table = table(vec![row("A", 50.0, 10.0), row("B", 30.0, 5.0), row("A", 70.0, 20.0)]);
        let aggregate = aggregate(&table, fields::WELL_NAME);

        let well_a = aggregate.row("A").expect("group A should exist");
        assert_eq!(well_a.reports, 2);
        assert_eq!(well_a.values["ROP Mean"], 60.0);
        assert_eq!(well_a.values["Total Dilution Sum"], 30.0);

        let keys = aggregate.rows.iter().map(|row| row.key.as_str()).collect::<Vec<_>>();
        assert_eq!(keys, vec!["A", "B"]);
    }

    #[test]
    fn ranks_descending_and_reports_delta_from_mean() {
        let table = table(vec![
            row("A", 50.0, 10.0),
            row("B", 30.0, 40.0),
            row("C", 70.0, 10.0),
        ]);
        let aggregate = aggregate(&table, fields::WELL_NAME);

        let ranks = aggregate.rows.iter().map(|row| row.rank).collect::<Vec<_>>();
        assert_eq!(ranks, vec![2, 1, 2]);
        assert_eq!(aggregate.rank_column, "Total Dilution Sum Rank");

        let deltas = aggregate
            .rows
            .iter()
            .map(|row| row.values["ROP Mean vs Avg"])
            .collect::<Vec<_>>();
        assert_eq!(deltas, vec![0.0, -20.0, 20.0]);
        assert_eq!(aggregate.columns.last().map(String::as_str), Some("ROP Mean vs Avg"));
    }

    #[test]
    fn empty_table_aggregates_to_no_groups() {
        let aggregate = aggregate(&table(Vec::new()), fields::RIG);
        assert!(aggregate.rows.is_empty());
        assert_eq!(aggregate.group_by, "Rig");
    }

    #[test]
    fn summary_matches_describe_statistics() {
        let table = table(vec![
            row("A", 10.0, 0.0),
            row("A", 20.0, 0.0),
            row("A", 30.0, 0.0),
            row("A", 40.0, 0.0),
        ]);
        let summary = summarize(&table, &[columns::ROP]);
        let rop = &summary[0];
        assert_eq!(rop.count, 4);
        assert_eq!(rop.mean, Some(25.0));
        assert_eq!(rop.min, Some(10.0));
        assert_eq!(rop.p25, Some(17.5));
        assert_eq!(rop.p50, Some(25.0));
        assert_eq!(rop.p75, Some(32.5));
        assert_eq!(rop.max, Some(40.0));
        let std = rop.std.expect("std defined for four values");
        assert!((std - 12.909_944_487_358_056).abs() < 1e-9);
    }

    #[test]
    fn summary_of_single_value_has_no_std() {
        let summary = summarize(&table(vec![row("A", 5.0, 0.0)]), &[columns::ROP]);
        assert_eq!(summary[0].std, None);
        assert_eq!(summary[0].p75, Some(5.0));
    }
}
