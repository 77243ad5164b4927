//! Reshaping into chart tables
//!
//! Two independent transforms turn filtered wide rows into long-format tables:
//!
//! - [`daily_series`]: one point per (row, activity) from the daily
//!   production columns, for the time-series chart.
//! - [`period_summary`]: per project, the last row of each month, melted into
//!   one bar per (activity, actual/planned) for the comparison chart.
//!
//! Melting never drops rows: empty cells are carried as `None` values, so a
//! long table always has `rows × melted columns` entries.

use chrono::NaiveDate;
use serde::Serialize;
use std::collections::BTreeMap;

use crate::filter::{filter, FilteredRow};
use crate::{
    Activity, ActivityCatalog, DailyRecord, DataContext, Metric, Month, ProjectDataset,
    ProjectId, Selection,
};

// ============================================================================
// Daily time series
// ============================================================================

/// One point of the daily production chart
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct DailyPoint {
    pub date: NaiveDate,
    pub project: ProjectId,
    pub activity: Activity,
    pub activity_label: String,
    /// Line the point belongs to; keeps projects apart when several are shown
    pub series: String,
    /// `None` for an empty cell, drawn as a gap
    pub value: Option<f64>,
}

/// Long-format table behind the daily production chart
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct DailySeriesTable {
    pub points: Vec<DailyPoint>,
}

impl DailySeriesTable {
    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Distinct series keys in first-appearance order
    pub fn series_keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = Vec::new();
        for point in &self.points {
            if !keys.contains(&point.series) {
                keys.push(point.series.clone());
            }
        }
        keys
    }

    /// Points of one series, in date order
    pub fn series(&self, key: &str) -> Vec<&DailyPoint> {
        let mut points: Vec<&DailyPoint> =
            self.points.iter().filter(|p| p.series == key).collect();
        points.sort_by_key(|p| p.date);
        points
    }

    /// Earliest and latest dates present
    pub fn date_range(&self) -> Option<(NaiveDate, NaiveDate)> {
        let first = self.points.iter().map(|p| p.date).min()?;
        let last = self.points.iter().map(|p| p.date).max()?;
        Some((first, last))
    }
}

/// Melt the daily-production columns of `activities` into long form.
///
/// With `per_project_series` the series key is "Obra <id> - <activity>", so
/// lines from different projects never merge; otherwise it is the activity
/// label alone. Output is ordered by project, activity, then date.
pub fn melt_daily(
    rows: &[FilteredRow<'_>],
    activities: &[Activity],
    catalog: &ActivityCatalog,
    per_project_series: bool,
) -> DailySeriesTable {
    let mut points = Vec::with_capacity(rows.len() * activities.len());

    for row in rows {
        for &activity in activities {
            let activity_label = catalog.label(activity).to_string();
            let series = if per_project_series {
                format!("{} - {}", row.project.label(), activity_label)
            } else {
                activity_label.clone()
            };
            points.push(DailyPoint {
                date: row.record.date,
                project: row.project.clone(),
                activity,
                activity_label,
                series,
                value: row.record.value(Metric::DailyProduction, activity),
            });
        }
    }

    points.sort_by(|a, b| {
        (&a.project, a.activity, a.date).cmp(&(&b.project, b.activity, b.date))
    });

    DailySeriesTable { points }
}

/// Time-series table for the current selection
pub fn daily_series(ctx: &DataContext, selection: &Selection) -> DailySeriesTable {
    let rows = filter(ctx, selection);
    if rows.is_empty() {
        return DailySeriesTable::default();
    }
    melt_daily(
        &rows,
        &selection.activities(),
        ctx.catalog(),
        selection.project.is_all(),
    )
}

// ============================================================================
// Period summary (actual vs planned)
// ============================================================================

/// Whether a cumulative figure is realized or planned
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum Category {
    Actual,
    Planned,
}

impl Category {
    pub const ALL: [Category; 2] = [Category::Actual, Category::Planned];

    pub fn label(self) -> &'static str {
        match self {
            Category::Actual => "Realizado Acumulado",
            Category::Planned => "Produção Prevista",
        }
    }

    fn metric(self) -> Metric {
        match self {
            Category::Actual => Metric::CumulativeActual,
            Category::Planned => Metric::CumulativePlanned,
        }
    }
}

/// One bar of the actual-vs-planned comparison chart
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct SummaryBar {
    pub project: ProjectId,
    pub month: Month,
    /// Date of the row the figure was taken from (last day recorded in the month)
    pub date: NaiveDate,
    pub activity: Activity,
    pub activity_label: String,
    pub category: Category,
    pub value: Option<f64>,
}

/// Long-format table behind the comparison chart
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct PeriodSummaryTable {
    pub month: Option<Month>,
    pub bars: Vec<SummaryBar>,
}

impl PeriodSummaryTable {
    pub fn len(&self) -> usize {
        self.bars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    /// Projects present, in table order
    pub fn projects(&self) -> Vec<&ProjectId> {
        let mut projects: Vec<&ProjectId> = Vec::new();
        for bar in &self.bars {
            if !projects.contains(&&bar.project) {
                projects.push(&bar.project);
            }
        }
        projects
    }

    /// The bar for a given project, activity and category
    pub fn bar(
        &self,
        project: &ProjectId,
        activity: Activity,
        category: Category,
    ) -> Option<&SummaryBar> {
        self.bars
            .iter()
            .find(|b| &b.project == project && b.activity == activity && b.category == category)
    }
}

/// Reduce a dataset to one row per month: the row with the latest date.
///
/// Row order in the file does not matter; the chronologically last date of
/// each month wins.
pub fn monthly_last(dataset: &ProjectDataset) -> BTreeMap<Month, &DailyRecord> {
    let mut last: BTreeMap<Month, &DailyRecord> = BTreeMap::new();
    for record in dataset.records() {
        last.entry(record.month())
            .and_modify(|current| {
                if record.date > current.date {
                    *current = record;
                }
            })
            .or_insert(record);
    }
    last
}

/// Melt the ten cumulative columns of one record into bars
pub fn melt_summary(
    project: &ProjectId,
    record: &DailyRecord,
    catalog: &ActivityCatalog,
) -> Vec<SummaryBar> {
    let mut bars = Vec::with_capacity(Activity::COUNT * Category::ALL.len());
    for category in Category::ALL {
        for (activity, label) in catalog.labels() {
            bars.push(SummaryBar {
                project: project.clone(),
                month: record.month(),
                date: record.date,
                activity,
                activity_label: label.to_string(),
                category,
                value: record.value(category.metric(), activity),
            });
        }
    }
    bars
}

/// Actual-vs-planned table for the selected month.
///
/// Applies the project and month selectors only: the comparison always covers
/// the whole month and all five activities.
pub fn period_summary(ctx: &DataContext, selection: &Selection) -> PeriodSummaryTable {
    let Some(month) = selection.month else {
        return PeriodSummaryTable::default();
    };

    let bars = ctx
        .scope(&selection.project)
        .into_iter()
        .filter_map(|dataset| {
            monthly_last(dataset)
                .remove(&month)
                .map(|record| melt_summary(dataset.id(), record, ctx.catalog()))
        })
        .flatten()
        .collect();

    PeriodSummaryTable {
        month: Some(month),
        bars,
    }
}
