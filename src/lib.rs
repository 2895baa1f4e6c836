pub mod cli;
pub mod config;
pub mod engine;
pub mod error;
pub mod formulas;
pub mod memory_stats;
pub mod provider;
pub mod report;
pub mod season;
pub mod stat;
pub mod stats_db;
pub mod subject;

pub use engine::MetricsEngine;
pub use error::{MetricsError, Result};
pub use formulas::ReboundKind;
pub use memory_stats::MemoryStats;
pub use provider::StatsProvider;
pub use season::SeasonBounds;
pub use stat::StatName;
pub use stats_db::StatsDb;
pub use subject::{LeagueCode, Perspective, SubjectKind, SubjectRef};
