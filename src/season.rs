use chrono::{Datelike, Utc};
use serde::{Deserialize, Serialize};

use crate::error::MetricsError;

pub const FIRST_TRACKED_SEASON: i32 = 1946;

/// Valid season range. `last` is pinned only in tests and replays; otherwise
/// the current calendar year is the upper bound.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeasonBounds {
    pub first: i32,
    #[serde(default)]
    pub last: Option<i32>,
}

impl Default for SeasonBounds {
    fn default() -> Self {
        Self {
            first: FIRST_TRACKED_SEASON,
            last: None,
        }
    }
}

impl SeasonBounds {
    pub fn starting_at(first: i32) -> Self {
        Self { first, last: None }
    }

    pub fn pinned(first: i32, last: i32) -> Self {
        Self {
            first,
            last: Some(last),
        }
    }

    pub fn last_season(&self) -> i32 {
        self.last.unwrap_or_else(current_year)
    }

    pub fn contains(&self, season: i32) -> bool {
        season >= self.first && season <= self.last_season()
    }

    pub fn check(&self, season: Option<i32>) -> Result<Option<i32>, MetricsError> {
        match season {
            Some(year) if !self.contains(year) => Err(MetricsError::InvalidSeason {
                season: year,
                first: self.first,
                last: self.last_season(),
            }),
            other => Ok(other),
        }
    }
}

pub fn current_year() -> i32 {
    Utc::now().year()
}

pub fn season_label(season: &Option<i32>) -> String {
    match season {
        Some(year) => format!("season {year}"),
        None => "career".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_bounds_cover_history() {
        let bounds = SeasonBounds::default();
        assert!(bounds.check(Some(1946)).is_ok());
        assert!(bounds.check(Some(current_year())).is_ok());
        assert!(bounds.check(None).unwrap().is_none());
    }

    #[test]
    fn out_of_range_seasons_are_rejected() {
        let bounds = SeasonBounds::pinned(1946, 2024);
        let err = bounds.check(Some(1945)).unwrap_err();
        assert!(matches!(
            err,
            MetricsError::InvalidSeason {
                season: 1945,
                first: 1946,
                last: 2024
            }
        ));
        assert!(bounds.check(Some(2025)).is_err());
    }

    #[test]
    fn first_season_is_configurable() {
        let bounds = SeasonBounds::starting_at(1979);
        assert!(bounds.check(Some(1978)).is_err());
        assert!(bounds.check(Some(1979)).is_ok());
    }
}
