//! Selector state
//!
//! A [`Selection`] holds the four dashboard selector values. It is plain data
//! supplied with every request; nothing here is persisted.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use crate::period::PeriodParseError;
use crate::{Activity, Month, ProjectId, Week};

/// Query value meaning "no narrowing" for a selector
pub const ALL_KEY: &str = "all";

/// Whether a raw selector value is the "all" sentinel (empty, "all" or "todas")
pub fn is_all_key(raw: &str) -> bool {
    let trimmed = raw.trim();
    trimmed.is_empty()
        || trimmed.eq_ignore_ascii_case(ALL_KEY)
        || trimmed.eq_ignore_ascii_case("todas")
}

/// Error turning raw selector values into a [`Selection`]
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SelectionError {
    #[error("Invalid activity '{0}', expected 1-5 or 'all'")]
    InvalidActivity(String),

    #[error(transparent)]
    InvalidPeriod(#[from] PeriodParseError),
}

/// A selector value: the "all" sentinel or one specific key
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Choice<T> {
    All,
    Only(T),
}

impl<T> Default for Choice<T> {
    fn default() -> Self {
        Choice::All
    }
}

impl<T> Choice<T> {
    pub fn is_all(&self) -> bool {
        matches!(self, Choice::All)
    }

    pub fn as_only(&self) -> Option<&T> {
        match self {
            Choice::All => None,
            Choice::Only(value) => Some(value),
        }
    }
}

impl<T: PartialEq> Choice<T> {
    /// Whether a value passes this selector
    pub fn matches(&self, value: &T) -> bool {
        match self {
            Choice::All => true,
            Choice::Only(selected) => selected == value,
        }
    }
}

impl<T: FromStr> Choice<T> {
    /// Parse a selector value; empty, "all" and "todas" mean [`Choice::All`]
    pub fn parse(raw: &str) -> Result<Self, T::Err> {
        if is_all_key(raw) {
            return Ok(Choice::All);
        }
        raw.trim().parse().map(Choice::Only)
    }
}

impl<T: fmt::Display> fmt::Display for Choice<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Choice::All => f.write_str(ALL_KEY),
            Choice::Only(value) => value.fmt(f),
        }
    }
}

/// Current values of the four dashboard selectors
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Selection {
    pub activity: Choice<Activity>,
    pub project: Choice<ProjectId>,
    /// Month has no "all" option; `None` means nothing chosen yet
    pub month: Option<Month>,
    pub week: Choice<Week>,
}

impl Selection {
    /// Build a selection from raw selector strings (e.g. URL query values).
    ///
    /// Missing values default to "all" (no month for the month selector).
    pub fn from_raw(
        activity: Option<&str>,
        project: Option<&str>,
        month: Option<&str>,
        week: Option<&str>,
    ) -> Result<Self, SelectionError> {
        let activity = activity.map_or(Ok(Choice::All), Choice::<Activity>::parse)?;
        let project = match project.map(Choice::<ProjectId>::parse) {
            Some(Ok(choice)) => choice,
            Some(Err(never)) => match never {},
            None => Choice::All,
        };
        let month = match month.map(str::trim).filter(|m| !m.is_empty()) {
            Some(raw) => Some(raw.parse::<Month>()?),
            None => None,
        };
        let week = week
            .map_or(Ok(Choice::All), Choice::<Week>::parse)
            .map_err(SelectionError::from)?;

        Ok(Self {
            activity,
            project,
            month,
            week,
        })
    }

    pub fn with_activity(mut self, activity: Activity) -> Self {
        self.activity = Choice::Only(activity);
        self
    }

    pub fn with_project(mut self, project: impl Into<ProjectId>) -> Self {
        self.project = Choice::Only(project.into());
        self
    }

    pub fn with_month(mut self, month: Month) -> Self {
        self.month = Some(month);
        self
    }

    pub fn with_week(mut self, week: Week) -> Self {
        self.week = Choice::Only(week);
        self
    }

    /// Activities whose columns are charted for this selection, in column order
    pub fn activities(&self) -> Vec<Activity> {
        match self.activity {
            Choice::All => Activity::all().collect(),
            Choice::Only(activity) => vec![activity],
        }
    }
}
