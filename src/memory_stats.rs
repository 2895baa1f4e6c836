use std::collections::{HashMap, HashSet};
use std::sync::{Mutex, MutexGuard};

use crate::error::{MetricsError, Result};
use crate::provider::StatsProvider;
use crate::season::SeasonBounds;
use crate::stat::StatName;
use crate::subject::{Perspective, SubjectKind, SubjectRef};

type Key = (StatName, SubjectRef, Perspective, Option<i32>);

#[derive(Debug, Clone, PartialEq)]
pub struct StatCall {
    pub stat: StatName,
    pub subject: SubjectRef,
    pub perspective: Perspective,
    pub season: Option<i32>,
}

/// Provider over averages that are already known, e.g. loaded from an export
/// or built by hand in tests. Every request is logged.
#[derive(Debug, Default)]
pub struct MemoryStats {
    bounds: SeasonBounds,
    subjects: HashSet<SubjectRef>,
    values: HashMap<Key, f64>,
    calls: Mutex<Vec<StatCall>>,
}

impl MemoryStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_bounds(bounds: SeasonBounds) -> Self {
        Self {
            bounds,
            ..Self::default()
        }
    }

    pub fn insert(
        &mut self,
        subject: &SubjectRef,
        perspective: Perspective,
        season: Option<i32>,
        stat: StatName,
        value: f64,
    ) {
        self.subjects.insert(subject.clone());
        self.values
            .insert((stat, subject.clone(), perspective, season), value);
    }

    pub fn with(
        mut self,
        subject: &SubjectRef,
        season: Option<i32>,
        stats: &[(StatName, f64)],
    ) -> Self {
        for (stat, value) in stats {
            self.insert(subject, Perspective::Own, season, *stat, *value);
        }
        self
    }

    pub fn with_opponent(
        mut self,
        subject: &SubjectRef,
        season: Option<i32>,
        stats: &[(StatName, f64)],
    ) -> Self {
        for (stat, value) in stats {
            self.insert(subject, Perspective::Opponent, season, *stat, *value);
        }
        self
    }

    pub fn remove(
        &mut self,
        subject: &SubjectRef,
        perspective: Perspective,
        season: Option<i32>,
        stat: StatName,
    ) {
        self.values.remove(&(stat, subject.clone(), perspective, season));
    }

    pub fn calls(&self) -> Vec<StatCall> {
        self.call_log().clone()
    }

    pub fn clear_calls(&self) {
        self.call_log().clear();
    }

    fn call_log(&self) -> MutexGuard<'_, Vec<StatCall>> {
        self.calls
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl StatsProvider for MemoryStats {
    fn average(
        &self,
        stat: StatName,
        subject: &SubjectRef,
        perspective: Perspective,
        season: Option<i32>,
    ) -> Result<Option<f64>> {
        self.call_log().push(StatCall {
            stat,
            subject: subject.clone(),
            perspective,
            season,
        });

        let season = self.bounds.check(season)?;
        if !self.subjects.contains(subject) {
            return Err(MetricsError::UnknownSubject(subject.clone()));
        }
        if perspective == Perspective::Opponent && subject.kind() == SubjectKind::Player {
            return Err(MetricsError::UnsupportedSubject {
                metric: "opponent averages",
                kind: SubjectKind::Player,
            });
        }
        Ok(self
            .values
            .get(&(stat, subject.clone(), perspective, season))
            .copied())
    }
}
