//! # pavdash-loader
//!
//! Loads the daily production spreadsheets of every paving site into a
//! [`DataContext`].
//!
//! Each site keeps one workbook named `Produção_Diária_Obra_<id>.xlsx`. The first
//! worksheet has a header row followed by one row per day:
//!
//! | Dias | prod diaria 1..5 | prod acum 1..5 | prev acum 1..5 |
//! |------|------------------|----------------|----------------|
//!
//! Loading is all-or-nothing: a malformed workbook aborts the load with an error
//! naming the file, row and column.
//!
//! ## Example
//!
//! ```rust,no_run
//! use pavdash_core::ActivityCatalog;
//! use pavdash_loader::{load_directory, LoaderOptions};
//!
//! let ctx = load_directory("dados/", &LoaderOptions::default(), ActivityCatalog::default())?;
//! for project in ctx.projects() {
//!     println!("{}: {} rows", project.label(), project.len());
//! }
//! # Ok::<(), pavdash_loader::LoadError>(())
//! ```

mod cells;
pub mod discover;

pub use discover::{discover_files, project_id_from_file_name, SourceFile, DEFAULT_FILE_PREFIX};

use calamine::{open_workbook, Data, Range, Reader, Xlsx, XlsxError};
use pavdash_core::{
    Activity, ActivityCatalog, DailyRecord, DataContext, DatasetError, Metric, ProjectDataset,
    ProjectId,
};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info, warn};

/// Header of the date column
pub const DATE_COLUMN: &str = "Dias";

// ============================================================================
// Errors
// ============================================================================

/// Error loading production spreadsheets
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("Cannot read data directory {dir}: {source}", dir = .path.display())]
    Directory {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Cannot open workbook {file}: {source}", file = .path.display())]
    Workbook {
        path: PathBuf,
        #[source]
        source: XlsxError,
    },

    #[error("{file}: workbook has no worksheets", file = .path.display())]
    NoWorksheet { path: PathBuf },

    #[error("{file}: missing required column '{column}'", file = .path.display())]
    MissingColumn { path: PathBuf, column: String },

    #[error("{file}: row {row}: invalid date '{value}' in column 'Dias'", file = .path.display())]
    InvalidDate {
        path: PathBuf,
        row: u32,
        value: String,
    },

    #[error("{file}: row {row}: invalid number '{value}' in column '{column}'", file = .path.display())]
    InvalidNumber {
        path: PathBuf,
        row: u32,
        column: String,
        value: String,
    },

    #[error("{file}: {source}", file = .path.display())]
    Dataset {
        path: PathBuf,
        #[source]
        source: DatasetError,
    },

    #[error(
        "Project {id} is provided by both {a} and {b}",
        a = .first.display(),
        b = .second.display()
    )]
    DuplicateProject {
        id: ProjectId,
        first: PathBuf,
        second: PathBuf,
    },

    #[error("Invalid file prefix: {0}")]
    Pattern(#[from] regex::Error),
}

// ============================================================================
// Options
// ============================================================================

/// How production files are recognised
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoaderOptions {
    pub file_prefix: String,
}

impl Default for LoaderOptions {
    fn default() -> Self {
        Self {
            file_prefix: DEFAULT_FILE_PREFIX.to_string(),
        }
    }
}

impl LoaderOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn file_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.file_prefix = prefix.into();
        self
    }
}

// ============================================================================
// Loading
// ============================================================================

/// Load every production file in `dir`.
///
/// A missing directory yields an empty context (and a warning) so the dashboard
/// can still start; any unreadable or malformed file is an error.
pub fn load_directory(
    dir: impl AsRef<Path>,
    options: &LoaderOptions,
    catalog: ActivityCatalog,
) -> Result<DataContext, LoadError> {
    let dir = dir.as_ref();
    if !dir.exists() {
        warn!(dir = %dir.display(), "Data directory not found, no projects loaded");
        return context(dir, Vec::new(), catalog);
    }

    let files = discover_files(dir, &options.file_prefix)?;
    if files.is_empty() {
        warn!(
            dir = %dir.display(),
            prefix = %options.file_prefix,
            "No production files found"
        );
    }

    let mut seen: HashMap<&ProjectId, &Path> = HashMap::new();
    for file in &files {
        if let Some(first) = seen.insert(&file.project, &file.path) {
            return Err(LoadError::DuplicateProject {
                id: file.project.clone(),
                first: first.to_path_buf(),
                second: file.path.clone(),
            });
        }
    }

    let datasets = files
        .iter()
        .map(|file| load_project_file(&file.path, file.project.clone()))
        .collect::<Result<Vec<_>, _>>()?;

    context(dir, datasets, catalog)
}

fn context(
    dir: &Path,
    datasets: Vec<ProjectDataset>,
    catalog: ActivityCatalog,
) -> Result<DataContext, LoadError> {
    DataContext::new(datasets, catalog).map_err(|source| LoadError::Dataset {
        path: dir.to_path_buf(),
        source,
    })
}

/// Load one production workbook as the dataset of project `id`
pub fn load_project_file(path: &Path, id: ProjectId) -> Result<ProjectDataset, LoadError> {
    let mut workbook: Xlsx<_> = open_workbook(path).map_err(|source| LoadError::Workbook {
        path: path.to_path_buf(),
        source,
    })?;

    let sheet = workbook
        .sheet_names()
        .first()
        .cloned()
        .ok_or_else(|| LoadError::NoWorksheet {
            path: path.to_path_buf(),
        })?;
    let range = workbook
        .worksheet_range(&sheet)
        .map_err(|source| LoadError::Workbook {
            path: path.to_path_buf(),
            source,
        })?;

    let records = read_records(&range, path)?;
    let dataset = ProjectDataset::new(id, records).map_err(|source| LoadError::Dataset {
        path: path.to_path_buf(),
        source,
    })?;

    info!(
        project = %dataset.id(),
        rows = dataset.len(),
        file = %path.display(),
        "Loaded production file"
    );
    Ok(dataset)
}

// ============================================================================
// Sheet parsing
// ============================================================================

/// Column positions of the required headers
struct ColumnMap {
    date: usize,
    measurements: Vec<(Metric, Activity, usize)>,
}

impl ColumnMap {
    fn from_header(header: &[Data], path: &Path) -> Result<Self, LoadError> {
        let mut positions: HashMap<&str, usize> = HashMap::new();
        for (index, cell) in header.iter().enumerate() {
            if let Some(name) = cells::header_text(cell) {
                positions.entry(name).or_insert(index);
            }
        }

        let find = |column: &str| {
            positions
                .get(column)
                .copied()
                .ok_or_else(|| LoadError::MissingColumn {
                    path: path.to_path_buf(),
                    column: column.to_string(),
                })
        };

        let date = find(DATE_COLUMN)?;
        let mut measurements = Vec::with_capacity(Metric::ALL.len() * Activity::COUNT);
        for metric in Metric::ALL {
            for activity in Activity::all() {
                let index = find(&metric.column_name(activity))?;
                measurements.push((metric, activity, index));
            }
        }

        Ok(Self { date, measurements })
    }
}

/// Parse the data rows of a production sheet. The first row is the header.
fn read_records(range: &Range<Data>, path: &Path) -> Result<Vec<DailyRecord>, LoadError> {
    let mut rows = range.rows();
    let header = rows.next().unwrap_or(&[]);
    let columns = ColumnMap::from_header(header, path)?;

    // Spreadsheet row numbers (1-based) for error messages
    let first_row = range.start().map_or(0, |(row, _)| row) + 1;

    let mut records = Vec::new();
    let mut blank = 0usize;
    let mut error_cells = 0usize;
    for (offset, row) in rows.enumerate() {
        let row_number = first_row + 1 + offset as u32;
        let cell = |index: usize| row.get(index).unwrap_or(&Data::Empty);

        let date = cells::date_cell(cell(columns.date)).map_err(|value| LoadError::InvalidDate {
            path: path.to_path_buf(),
            row: row_number,
            value,
        })?;
        let Some(date) = date else {
            blank += 1;
            continue;
        };

        let mut record = DailyRecord::new(date);
        for &(metric, activity, index) in &columns.measurements {
            let raw = cell(index);
            if matches!(raw, Data::Error(_)) {
                error_cells += 1;
            }
            let value = cells::number_cell(raw).map_err(|value| LoadError::InvalidNumber {
                path: path.to_path_buf(),
                row: row_number,
                column: metric.column_name(activity),
                value,
            })?;
            record.set(metric, activity, value);
        }
        records.push(record);
    }

    if blank > 0 {
        debug!(file = %path.display(), rows = blank, "Skipped rows without a date");
    }
    if error_cells > 0 {
        warn!(
            file = %path.display(),
            cells = error_cells,
            "Excel error values read as empty"
        );
    }
    Ok(records)
}
