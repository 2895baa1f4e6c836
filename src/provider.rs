use crate::error::{MetricsError, Result};
use crate::stat::{AverageStatline, StatName};
use crate::subject::{Perspective, SubjectRef};

/// Source of per-subject base-stat averages.
///
/// Averages are taken only over the statlines that carry the requested stat;
/// `Ok(None)` means no such statline exists and is not an error.
/// Implementations reject seasons outside their bounds with
/// [`MetricsError::InvalidSeason`] and unresolvable subjects with
/// [`MetricsError::UnknownSubject`].
pub trait StatsProvider: Sync {
    fn average(
        &self,
        stat: StatName,
        subject: &SubjectRef,
        perspective: Perspective,
        season: Option<i32>,
    ) -> Result<Option<f64>>;

    /// Batch form of [`StatsProvider::average`]; the result is ordered like
    /// `stats`. Providers backed by a database should answer it in one query.
    fn averages(
        &self,
        stats: &[StatName],
        subject: &SubjectRef,
        perspective: Perspective,
        season: Option<i32>,
    ) -> Result<Vec<Option<f64>>> {
        stats
            .iter()
            .map(|stat| self.average(*stat, subject, perspective, season))
            .collect()
    }

    fn statline_average(
        &self,
        subject: &SubjectRef,
        perspective: Perspective,
        season: Option<i32>,
    ) -> Result<AverageStatline> {
        let values = self.averages(&StatName::ALL, subject, perspective, season)?;
        AverageStatline::from_values(subject.clone(), perspective, season, &values)
    }
}

impl<P: StatsProvider + ?Sized> StatsProvider for &P {
    fn average(
        &self,
        stat: StatName,
        subject: &SubjectRef,
        perspective: Perspective,
        season: Option<i32>,
    ) -> Result<Option<f64>> {
        (**self).average(stat, subject, perspective, season)
    }

    fn averages(
        &self,
        stats: &[StatName],
        subject: &SubjectRef,
        perspective: Perspective,
        season: Option<i32>,
    ) -> Result<Vec<Option<f64>>> {
        (**self).averages(stats, subject, perspective, season)
    }
}

pub fn require<P, const N: usize>(
    provider: &P,
    stats: [StatName; N],
    subject: &SubjectRef,
    perspective: Perspective,
    season: Option<i32>,
) -> Result<[f64; N]>
where
    P: StatsProvider + ?Sized,
{
    let values = provider.averages(&stats, subject, perspective, season)?;
    if values.len() != N {
        return Err(MetricsError::InvalidRequest(format!(
            "provider returned {} averages for {N} requested stats",
            values.len()
        )));
    }

    let mut out = [0.0; N];
    for (slot, (stat, value)) in out.iter_mut().zip(stats.iter().zip(values)) {
        *slot = value.ok_or_else(|| MetricsError::MissingStatistic {
            stat: *stat,
            subject: subject.clone(),
            perspective,
            season,
        })?;
    }
    Ok(out)
}
