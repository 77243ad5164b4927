//! # pavdash-core
//!
//! Core domain model for the pavdash production dashboard.
//!
//! This crate provides:
//! - Domain types: `ProjectId`, `Activity`, `DailyRecord`, `ProjectDataset`, `DataContext`
//! - Typed periods: `Month`, `Week` (see [`period`])
//! - Selector state: `Choice`, `Selection` (see [`selection`])
//! - The filter engine, reshaping into chart tables, and cascading selector options
//! - The `Renderer` trait and error types
//!
//! ## Example
//!
//! ```rust
//! use chrono::NaiveDate;
//! use pavdash_core::{Activity, ActivityCatalog, DailyRecord, DataContext, ProjectDataset};
//! use pavdash_core::reshape::daily_series;
//! use pavdash_core::{Month, Selection};
//!
//! let a1 = Activity::new(1).unwrap();
//! let day = NaiveDate::from_ymd_opt(2024, 3, 4).unwrap();
//! let dataset = ProjectDataset::new(
//!     "12",
//!     vec![DailyRecord::new(day).daily(a1, 120.0).actual(a1, 120.0).planned(a1, 150.0)],
//! )
//! .unwrap();
//! let ctx = DataContext::new(vec![dataset], ActivityCatalog::default()).unwrap();
//!
//! let selection = Selection::default().with_month(Month::new(2024, 3).unwrap());
//! let table = daily_series(&ctx, &selection);
//! assert_eq!(table.len(), 5);
//! assert!(table.series_keys().contains(&"Obra 12 - Atividade 1".to_string()));
//! ```

pub mod filter;
pub mod options;
pub mod period;
pub mod reshape;
pub mod selection;

pub use period::{Month, Week};
pub use selection::{Choice, Selection, SelectionError};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashSet};
use thiserror::Error;

// ============================================================================
// Project identity
// ============================================================================

/// Identifier of a tracked construction site (obra), taken from the file name
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProjectId(String);

impl ProjectId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Display label used in selectors and chart legends ("Obra 12")
    pub fn label(&self) -> String {
        format!("Obra {}", self.0)
    }
}

impl std::fmt::Display for ProjectId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ProjectId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for ProjectId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl std::str::FromStr for ProjectId {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(s.to_string()))
    }
}

// ============================================================================
// Activities and metrics
// ============================================================================

/// One of the five tracked paving activities, identified by its column index (1..=5)
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct Activity(u8);

impl Activity {
    /// Number of activities carried by every production spreadsheet
    pub const COUNT: usize = 5;

    pub fn new(index: u8) -> Option<Self> {
        (1..=Self::COUNT as u8).contains(&index).then_some(Self(index))
    }

    /// All activities in column order
    pub fn all() -> impl Iterator<Item = Activity> {
        (1..=Self::COUNT as u8).map(Self)
    }

    pub fn index(self) -> u8 {
        self.0
    }

    /// Zero-based position in per-activity arrays
    fn slot(self) -> usize {
        usize::from(self.0 - 1)
    }
}

impl std::fmt::Display for Activity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<u8> for Activity {
    type Error = SelectionError;

    fn try_from(index: u8) -> Result<Self, Self::Error> {
        Self::new(index).ok_or_else(|| SelectionError::InvalidActivity(index.to_string()))
    }
}

impl From<Activity> for u8 {
    fn from(activity: Activity) -> Self {
        activity.0
    }
}

impl std::str::FromStr for Activity {
    type Err = SelectionError;

    /// Accepts a bare index ("3") or a daily-production column name ("prod diaria 3")
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let digits = trimmed
            .strip_prefix(Metric::DailyProduction.column_prefix())
            .unwrap_or(trimmed)
            .trim();
        digits
            .parse::<u8>()
            .ok()
            .and_then(Self::new)
            .ok_or_else(|| SelectionError::InvalidActivity(s.to_string()))
    }
}

/// The three per-activity measurements recorded each day
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Metric {
    /// Quantity produced on that day ("prod diaria N")
    DailyProduction,
    /// Realized cumulative total to date ("prod acum N")
    CumulativeActual,
    /// Planned cumulative total to date ("prev acum N")
    CumulativePlanned,
}

impl Metric {
    pub const ALL: [Metric; 3] = [
        Metric::DailyProduction,
        Metric::CumulativeActual,
        Metric::CumulativePlanned,
    ];

    /// Spreadsheet header prefix; the activity index follows after a space
    pub fn column_prefix(self) -> &'static str {
        match self {
            Metric::DailyProduction => "prod diaria",
            Metric::CumulativeActual => "prod acum",
            Metric::CumulativePlanned => "prev acum",
        }
    }

    /// Exact spreadsheet header for this metric and activity
    pub fn column_name(self, activity: Activity) -> String {
        format!("{} {}", self.column_prefix(), activity.index())
    }
}

/// Human-readable labels for the five activities
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ActivityCatalog {
    labels: Vec<String>,
}

impl Default for ActivityCatalog {
    fn default() -> Self {
        Self {
            labels: Activity::all().map(|a| format!("Atividade {}", a)).collect(),
        }
    }
}

impl ActivityCatalog {
    /// Build a catalog from exactly five distinct non-empty labels, in column order
    pub fn new<I, S>(labels: I) -> Result<Self, CatalogError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let labels: Vec<String> = labels.into_iter().map(|l| l.into().trim().to_string()).collect();
        if labels.len() != Activity::COUNT {
            return Err(CatalogError::WrongCount(labels.len()));
        }
        if let Some(pos) = labels.iter().position(|l| l.is_empty()) {
            return Err(CatalogError::EmptyLabel(pos + 1));
        }
        // Labels key the chart series
        if let Some(pos) = (1..labels.len()).find(|&i| labels[..i].contains(&labels[i])) {
            return Err(CatalogError::DuplicateLabel(pos + 1));
        }
        Ok(Self { labels })
    }

    pub fn label(&self, activity: Activity) -> &str {
        &self.labels[activity.slot()]
    }

    pub fn labels(&self) -> impl Iterator<Item = (Activity, &str)> {
        Activity::all().map(move |a| (a, self.label(a)))
    }
}

// ============================================================================
// Daily records
// ============================================================================

/// One spreadsheet row: a date and the fifteen per-activity measurements
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DailyRecord {
    pub date: NaiveDate,
    /// Daily production per activity
    pub daily: [Option<f64>; Activity::COUNT],
    /// Cumulative realized production per activity
    pub actual: [Option<f64>; Activity::COUNT],
    /// Cumulative planned production per activity
    pub planned: [Option<f64>; Activity::COUNT],
}

impl DailyRecord {
    /// Create a record with every measurement empty
    pub fn new(date: NaiveDate) -> Self {
        Self {
            date,
            daily: [None; Activity::COUNT],
            actual: [None; Activity::COUNT],
            planned: [None; Activity::COUNT],
        }
    }

    /// Set the daily production for an activity
    pub fn daily(mut self, activity: Activity, value: f64) -> Self {
        self.daily[activity.slot()] = Some(value);
        self
    }

    /// Set the cumulative realized production for an activity
    pub fn actual(mut self, activity: Activity, value: f64) -> Self {
        self.actual[activity.slot()] = Some(value);
        self
    }

    /// Set the cumulative planned production for an activity
    pub fn planned(mut self, activity: Activity, value: f64) -> Self {
        self.planned[activity.slot()] = Some(value);
        self
    }

    pub fn set(&mut self, metric: Metric, activity: Activity, value: Option<f64>) {
        let slot = activity.slot();
        match metric {
            Metric::DailyProduction => self.daily[slot] = value,
            Metric::CumulativeActual => self.actual[slot] = value,
            Metric::CumulativePlanned => self.planned[slot] = value,
        }
    }

    pub fn value(&self, metric: Metric, activity: Activity) -> Option<f64> {
        let slot = activity.slot();
        match metric {
            Metric::DailyProduction => self.daily[slot],
            Metric::CumulativeActual => self.actual[slot],
            Metric::CumulativePlanned => self.planned[slot],
        }
    }

    /// Calendar month this row belongs to (derived from the date)
    pub fn month(&self) -> Month {
        Month::from_date(self.date)
    }

    /// Monday-to-Sunday week this row belongs to (derived from the date)
    pub fn week(&self) -> Week {
        Week::from_date(self.date)
    }
}

// ============================================================================
// Project datasets
// ============================================================================

/// All daily rows of one project, in file order
#[derive(Clone, Debug, Serialize)]
pub struct ProjectDataset {
    id: ProjectId,
    records: Vec<DailyRecord>,
}

impl ProjectDataset {
    /// Create a dataset, rejecting duplicate dates
    pub fn new(id: impl Into<ProjectId>, records: Vec<DailyRecord>) -> Result<Self, DatasetError> {
        let id = id.into();
        let mut seen = HashSet::with_capacity(records.len());
        for record in &records {
            if !seen.insert(record.date) {
                return Err(DatasetError::DuplicateDate {
                    project: id,
                    date: record.date,
                });
            }
        }
        Ok(Self { id, records })
    }

    pub fn id(&self) -> &ProjectId {
        &self.id
    }

    pub fn label(&self) -> String {
        self.id.label()
    }

    pub fn records(&self) -> &[DailyRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Earliest and latest dates present
    pub fn date_range(&self) -> Option<(NaiveDate, NaiveDate)> {
        let first = self.records.iter().map(|r| r.date).min()?;
        let last = self.records.iter().map(|r| r.date).max()?;
        Some((first, last))
    }

    /// Distinct months present, chronologically ordered
    pub fn months(&self) -> BTreeSet<Month> {
        self.records.iter().map(DailyRecord::month).collect()
    }
}

// ============================================================================
// Data context
// ============================================================================

/// Immutable collection of every loaded project plus the activity labels.
///
/// Built once at startup and passed by reference into filtering, reshaping
/// and option derivation.
#[derive(Clone, Debug, Default)]
pub struct DataContext {
    projects: BTreeMap<ProjectId, ProjectDataset>,
    catalog: ActivityCatalog,
}

impl DataContext {
    pub fn new(
        datasets: impl IntoIterator<Item = ProjectDataset>,
        catalog: ActivityCatalog,
    ) -> Result<Self, DatasetError> {
        let mut projects = BTreeMap::new();
        for dataset in datasets {
            let id = dataset.id.clone();
            if projects.insert(id.clone(), dataset).is_some() {
                return Err(DatasetError::DuplicateProject(id));
            }
        }
        Ok(Self { projects, catalog })
    }

    pub fn catalog(&self) -> &ActivityCatalog {
        &self.catalog
    }

    pub fn project(&self, id: &ProjectId) -> Option<&ProjectDataset> {
        self.projects.get(id)
    }

    /// Projects ordered by id
    pub fn projects(&self) -> impl Iterator<Item = &ProjectDataset> {
        self.projects.values()
    }

    pub fn len(&self) -> usize {
        self.projects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.projects.is_empty()
    }

    /// Datasets covered by a project selector value.
    ///
    /// An unknown project id yields an empty scope.
    pub fn scope(&self, project: &Choice<ProjectId>) -> Vec<&ProjectDataset> {
        match project {
            Choice::All => self.projects.values().collect(),
            Choice::Only(id) => self.projects.get(id).into_iter().collect(),
        }
    }
}

// ============================================================================
// Traits
// ============================================================================

/// Output rendering of a chart table
pub trait Renderer<T: ?Sized> {
    type Output;

    /// Render the table; empty tables must still produce output
    fn render(&self, table: &T) -> Result<Self::Output, RenderError>;
}

// ============================================================================
// Errors
// ============================================================================

/// Dataset invariant violation
#[derive(Debug, Error)]
pub enum DatasetError {
    #[error("Duplicate date {date} in project {project}")]
    DuplicateDate { project: ProjectId, date: NaiveDate },

    #[error("Project {0} was loaded more than once")]
    DuplicateProject(ProjectId),
}

/// Invalid activity label configuration
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CatalogError {
    #[error("Expected {expected} activity labels, got {0}", expected = Activity::COUNT)]
    WrongCount(usize),

    #[error("Activity {0} has an empty label")]
    EmptyLabel(usize),

    #[error("Activity {0} repeats the label of an earlier activity")]
    DuplicateLabel(usize),
}

/// Rendering error
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("Format error: {0}")]
    Format(String),
}

// ============================================================================
// Tests
// ============================================================================
