//! Filter engine
//!
//! Narrows the loaded projects to the rows a [`Selection`] asks for:
//! project scope first, then exact month, then exact week (unless "all").
//! Nothing matching is a normal outcome and yields an empty result.

use serde::Serialize;

use crate::{DailyRecord, DataContext, ProjectDataset, ProjectId, Selection};

/// A row that passed the filter, tagged with the project it came from
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct FilteredRow<'a> {
    pub project: &'a ProjectId,
    pub record: &'a DailyRecord,
}

/// Rows matching a selection, in project order then file order
pub fn filter<'a>(ctx: &'a DataContext, selection: &Selection) -> Vec<FilteredRow<'a>> {
    let Some(month) = selection.month else {
        return Vec::new();
    };

    ctx.scope(&selection.project)
        .into_iter()
        .flat_map(rows_of)
        .filter(|row| row.record.month() == month)
        .filter(|row| selection.week.matches(&row.record.week()))
        .collect()
}

fn rows_of(dataset: &ProjectDataset) -> impl Iterator<Item = FilteredRow<'_>> {
    dataset.records().iter().map(move |record| FilteredRow {
        project: dataset.id(),
        record,
    })
}
