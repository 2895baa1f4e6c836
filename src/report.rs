use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::engine::MetricsEngine;
use crate::error::{MetricsError, Result};
use crate::formulas::ReboundKind;
use crate::provider::StatsProvider;
use crate::subject::{SubjectKind, SubjectRef};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UperContext {
    pub team: SubjectRef,
    pub league: SubjectRef,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MetricKind {
    AstToRatio,
    Vop,
    Rbp,
    Drbp,
    Orbp,
    Possessions,
    Uper,
}

impl MetricKind {
    pub fn label(self) -> &'static str {
        match self {
            Self::AstToRatio => "AST/TO",
            Self::Vop => "VOP",
            Self::Rbp => "RBP",
            Self::Drbp => "DRBP",
            Self::Orbp => "ORBP",
            Self::Possessions => "POSS",
            Self::Uper => "uPER",
        }
    }

    pub fn applicable(kind: SubjectKind, with_uper: bool) -> Vec<MetricKind> {
        let mut out = vec![Self::AstToRatio, Self::Vop, Self::Rbp, Self::Drbp, Self::Orbp];
        match kind {
            SubjectKind::Player => {
                if with_uper {
                    out.push(Self::Uper);
                }
            }
            SubjectKind::Team | SubjectKind::League => out.push(Self::Possessions),
        }
        out
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricEntry {
    pub metric: MetricKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricReport {
    pub subject: SubjectRef,
    pub season: Option<i32>,
    pub metrics: Vec<MetricEntry>,
}

impl MetricReport {
    pub fn value(&self, metric: MetricKind) -> Option<f64> {
        self.metrics
            .iter()
            .find(|entry| entry.metric == metric)
            .and_then(|entry| entry.value)
    }

    pub fn undefined(&self) -> impl Iterator<Item = &MetricEntry> {
        self.metrics.iter().filter(|entry| entry.error.is_some())
    }
}

impl<P: StatsProvider> MetricsEngine<P> {
    /// Every metric applicable to `subject`. The season is validated up front;
    /// after that a metric that cannot be computed is recorded with its error
    /// and the rest still run.
    pub fn report(
        &self,
        subject: &SubjectRef,
        uper_context: Option<&UperContext>,
        season: Option<i32>,
    ) -> Result<MetricReport> {
        let season = self.seasons().check(season)?;
        let kinds = MetricKind::applicable(subject.kind(), uper_context.is_some());

        let metrics = kinds
            .par_iter()
            .map(|metric| {
                let outcome = match metric {
                    MetricKind::AstToRatio => self.ast_to_ratio(subject, season),
                    MetricKind::Vop => self.vop(subject, season),
                    MetricKind::Rbp => self.rebound_pct(subject, ReboundKind::Total, season),
                    MetricKind::Drbp => self.rebound_pct(subject, ReboundKind::Defensive, season),
                    MetricKind::Orbp => self.rebound_pct(subject, ReboundKind::Offensive, season),
                    MetricKind::Possessions => self.possessions(subject, season),
                    MetricKind::Uper => match uper_context {
                        Some(ctx) => self.uper(subject, &ctx.team, &ctx.league, season),
                        None => Err(MetricsError::InvalidRequest(
                            "uPER needs a team and league context".to_string(),
                        )),
                    },
                };
                match outcome {
                    Ok(value) => MetricEntry {
                        metric: *metric,
                        value: Some(value),
                        error: None,
                    },
                    Err(err) => {
                        warn!(%subject, metric = metric.label(), error = %err, "metric undefined");
                        MetricEntry {
                            metric: *metric,
                            value: None,
                            error: Some(err.to_string()),
                        }
                    }
                }
            })
            .collect();

        Ok(MetricReport {
            subject: subject.clone(),
            season,
            metrics,
        })
    }
}
