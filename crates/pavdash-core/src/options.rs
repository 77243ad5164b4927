//! Cascading selector options
//!
//! Month options depend on the project selector; week options depend on the
//! project and month selectors. Everything here is recomputed from the
//! [`DataContext`] for each selection rather than kept up to date in place.

use serde::Serialize;
use std::collections::BTreeSet;

use crate::selection::ALL_KEY;
use crate::{Choice, DataContext, Month, ProjectId, Selection, Week};

/// One dropdown entry
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct SelectOption {
    pub label: String,
    pub value: String,
}

impl SelectOption {
    fn new(label: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            value: value.into(),
        }
    }

    fn all(label: &str) -> Self {
        Self::new(label, ALL_KEY)
    }
}

/// Options for all four selectors under the current selection
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct SelectorOptions {
    pub activity: Vec<SelectOption>,
    pub project: Vec<SelectOption>,
    pub month: Vec<SelectOption>,
    pub week: Vec<SelectOption>,
}

/// Months present in the project scope, de-duplicated and chronological
pub fn month_options(ctx: &DataContext, project: &Choice<ProjectId>) -> Vec<Month> {
    let months: BTreeSet<Month> = ctx
        .scope(project)
        .into_iter()
        .flat_map(|dataset| dataset.months())
        .collect();
    months.into_iter().collect()
}

/// Weeks with data in the project scope and month, chronological.
///
/// Only weeks that actually hold rows of the month are offered, so a week
/// straddling two months shows up under both.
pub fn week_options(
    ctx: &DataContext,
    project: &Choice<ProjectId>,
    month: Option<Month>,
) -> Vec<Week> {
    let Some(month) = month else {
        return Vec::new();
    };
    let weeks: BTreeSet<Week> = ctx
        .scope(project)
        .into_iter()
        .flat_map(|dataset| dataset.records())
        .filter(|record| record.month() == month)
        .map(|record| record.week())
        .collect();
    weeks.into_iter().collect()
}

/// Most recent month in the project scope, used as the initial month choice
pub fn latest_month(ctx: &DataContext, project: &Choice<ProjectId>) -> Option<Month> {
    month_options(ctx, project).pop()
}

/// Derive every selector's options from the current selection
pub fn options(ctx: &DataContext, selection: &Selection) -> SelectorOptions {
    let activity = ctx
        .catalog()
        .labels()
        .map(|(activity, label)| SelectOption::new(label, activity.to_string()))
        .chain(std::iter::once(SelectOption::all("Todas as Atividades")))
        .collect();

    let project = ctx
        .projects()
        .map(|dataset| SelectOption::new(dataset.label(), dataset.id().as_str()))
        .chain(std::iter::once(SelectOption::all("Todas as Obras")))
        .collect();

    let month = month_options(ctx, &selection.project)
        .into_iter()
        .map(|m| SelectOption::new(m.to_string(), m.to_string()))
        .collect();

    let week = std::iter::once(SelectOption::all("Todas as Semanas"))
        .chain(
            week_options(ctx, &selection.project, selection.month)
                .into_iter()
                .map(|w| SelectOption::new(w.to_string(), w.to_string())),
        )
        .collect();

    SelectorOptions {
        activity,
        project,
        month,
        week,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{ActivityCatalog, DailyRecord, ProjectDataset};
    use chrono::NaiveDate;
    use pretty_assertions::assert_eq;

    fn date(year: i32, month: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(year, month, day).unwrap()
    }

    fn dataset(id: &str, dates: &[NaiveDate]) -> ProjectDataset {
        ProjectDataset::new(id, dates.iter().map(|d| DailyRecord::new(*d)).collect()).unwrap()
    }

    fn context() -> DataContext {
        DataContext::new(
            vec![
                dataset("1", &[date(2024, 2, 20), date(2024, 1, 10), date(2024, 2, 1)]),
                dataset("2", &[date(2024, 3, 4), date(2024, 2, 28), date(2024, 2, 27)]),
            ],
            ActivityCatalog::default(),
        )
        .unwrap()
    }

    fn m(year: i32, month: u32) -> Month {
        Month::new(year, month).unwrap()
    }

    #[test]
    fn months_union_for_all_projects() {
        let ctx = context();
        assert_eq!(
            month_options(&ctx, &Choice::All),
            vec![m(2024, 1), m(2024, 2), m(2024, 3)]
        );
    }

    #[test]
    fn months_for_single_project() {
        let ctx = context();
        assert_eq!(
            month_options(&ctx, &Choice::Only(ProjectId::from("2"))),
            vec![m(2024, 2), m(2024, 3)]
        );
        assert!(month_options(&ctx, &Choice::Only(ProjectId::from("x"))).is_empty());
    }

    #[test]
    fn weeks_depend_on_project_and_month() {
        let ctx = context();
        let weeks = week_options(&ctx, &Choice::All, Some(m(2024, 2)));
        let labels: Vec<String> = weeks.iter().map(|w| w.to_string()).collect();
        assert_eq!(
            labels,
            vec![
                "2024-01-29/2024-02-04".to_string(),
                "2024-02-19/2024-02-25".to_string(),
                "2024-02-26/2024-03-03".to_string(),
            ]
        );

        let only_two = week_options(&ctx, &Choice::Only(ProjectId::from("2")), Some(m(2024, 2)));
        assert_eq!(only_two.len(), 1);
        assert!(week_options(&ctx, &Choice::All, None).is_empty());
    }

    #[test]
    fn latest_month_follows_project() {
        let ctx = context();
        assert_eq!(latest_month(&ctx, &Choice::All), Some(m(2024, 3)));
        assert_eq!(
            latest_month(&ctx, &Choice::Only(ProjectId::from("1"))),
            Some(m(2024, 2))
        );
    }

    #[test]
    fn full_option_sets() {
        let ctx = context();
        let selection = Selection::default().with_project("1").with_month(m(2024, 1));
        let opts = options(&ctx, &selection);

        assert_eq!(opts.activity.len(), 6);
        assert_eq!(opts.activity[0], SelectOption::new("Atividade 1", "1"));
        assert_eq!(opts.activity[5].value, "all");

        assert_eq!(
            opts.project,
            vec![
                SelectOption::new("Obra 1", "1"),
                SelectOption::new("Obra 2", "2"),
                SelectOption::new("Todas as Obras", "all"),
            ]
        );

        assert_eq!(
            opts.month,
            vec![
                SelectOption::new("2024-01", "2024-01"),
                SelectOption::new("2024-02", "2024-02"),
            ]
        );

        assert_eq!(opts.week[0], SelectOption::new("Todas as Semanas", "all"));
        assert_eq!(opts.week.len(), 2);
    }
}
