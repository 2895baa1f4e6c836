use thiserror::Error;

use crate::season::season_label;
use crate::stat::StatName;
use crate::subject::{Perspective, SubjectKind, SubjectRef};

#[derive(Error, Debug)]
pub enum MetricsError {
    #[error("invalid season {season}: expected {first}..={last}")]
    InvalidSeason { season: i32, first: i32, last: i32 },

    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error("{metric} is not defined for {kind} subjects")]
    UnsupportedSubject {
        metric: &'static str,
        kind: SubjectKind,
    },

    #[error("unknown subject: {0}")]
    UnknownSubject(SubjectRef),

    #[error("no {stat} average for {subject} ({perspective}, {})", season_label(.season))]
    MissingStatistic {
        stat: StatName,
        subject: SubjectRef,
        perspective: Perspective,
        season: Option<i32>,
    },

    /// A formula denominator was zero (or, where the formula requires it,
    /// not positive). Never surfaced as NaN or infinity.
    #[error("{formula} is undefined for {subject}: {term} = {value}")]
    DivisionByZero {
        formula: &'static str,
        term: &'static str,
        value: f64,
        subject: SubjectRef,
    },

    #[error("{metric} failed in {step}: {source}")]
    Step {
        metric: &'static str,
        step: &'static str,
        source: Box<MetricsError>,
    },

    #[error("storage error: {0}")]
    Storage(#[from] rusqlite::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

impl MetricsError {
    pub fn within(self, metric: &'static str, step: &'static str) -> Self {
        Self::Step {
            metric,
            step,
            source: Box::new(self),
        }
    }

    /// The innermost error, looking through any `Step` annotations.
    pub fn root(&self) -> &MetricsError {
        let mut current = self;
        while let Self::Step { source, .. } = current {
            current = source;
        }
        current
    }
}

pub type Result<T> = std::result::Result<T, MetricsError>;
