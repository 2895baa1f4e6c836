use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::MetricsError;

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct LeagueCode(String);

impl LeagueCode {
    pub fn new(raw: &str) -> Result<Self, MetricsError> {
        let code = raw.trim().to_ascii_uppercase();
        if code.is_empty() {
            return Err(MetricsError::InvalidRequest(
                "league code must not be empty".to_string(),
            ));
        }
        if code.chars().any(char::is_whitespace) {
            return Err(MetricsError::InvalidRequest(format!(
                "league code {raw:?} contains whitespace"
            )));
        }
        Ok(Self(code))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for LeagueCode {
    type Error = MetricsError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(&value)
    }
}

impl From<LeagueCode> for String {
    fn from(value: LeagueCode) -> Self {
        value.0
    }
}

impl fmt::Display for LeagueCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Who a statistic is about. Resolved once at the boundary; formula code
/// only ever matches on the variant.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "snake_case")]
pub enum SubjectRef {
    Player(u32),
    Team(u32),
    League(LeagueCode),
}

impl SubjectRef {
    pub fn league(code: &str) -> Result<Self, MetricsError> {
        LeagueCode::new(code).map(Self::League)
    }

    pub fn kind(&self) -> SubjectKind {
        match self {
            Self::Player(_) => SubjectKind::Player,
            Self::Team(_) => SubjectKind::Team,
            Self::League(_) => SubjectKind::League,
        }
    }
}

impl fmt::Display for SubjectRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Player(id) => write!(f, "player {id}"),
            Self::Team(id) => write!(f, "team {id}"),
            Self::League(code) => write!(f, "league {code}"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubjectKind {
    Player,
    Team,
    League,
}

impl fmt::Display for SubjectKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Player => "player",
            Self::Team => "team",
            Self::League => "league",
        })
    }
}

/// Whose statlines are averaged: the subject's own, or the ones its
/// opponents put up against it ("allowed" stats).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Perspective {
    #[default]
    Own,
    Opponent,
}

impl fmt::Display for Perspective {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Own => "own",
            Self::Opponent => "opponent",
        })
    }
}

impl FromStr for Perspective {
    type Err = MetricsError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "own" => Ok(Self::Own),
            "opponent" | "opp" | "allowed" => Ok(Self::Opponent),
            other => Err(MetricsError::InvalidRequest(format!(
                "unknown perspective {other:?}"
            ))),
        }
    }
}
