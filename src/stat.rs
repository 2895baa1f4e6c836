use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::MetricsError;
use crate::subject::{Perspective, SubjectRef};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum StatName {
    #[serde(rename = "pts")]
    Points,
    #[serde(rename = "ast")]
    Assists,
    #[serde(rename = "dreb")]
    DefensiveRebounds,
    #[serde(rename = "oreb")]
    OffensiveRebounds,
    #[serde(rename = "treb")]
    TotalRebounds,
    #[serde(rename = "stl")]
    Steals,
    #[serde(rename = "blk")]
    Blocks,
    #[serde(rename = "tov")]
    Turnovers,
    #[serde(rename = "fgm")]
    FieldGoalsMade,
    #[serde(rename = "fga")]
    FieldGoalsAttempted,
    #[serde(rename = "ftm")]
    FreeThrowsMade,
    #[serde(rename = "fta")]
    FreeThrowsAttempted,
    #[serde(rename = "3pm")]
    ThreesMade,
    #[serde(rename = "3pa")]
    ThreesAttempted,
    #[serde(rename = "pf")]
    PersonalFouls,
    #[serde(rename = "mp")]
    MinutesPlayed,
}

impl StatName {
    pub const ALL: [StatName; 16] = [
        StatName::Points,
        StatName::Assists,
        StatName::DefensiveRebounds,
        StatName::OffensiveRebounds,
        StatName::TotalRebounds,
        StatName::Steals,
        StatName::Blocks,
        StatName::Turnovers,
        StatName::FieldGoalsMade,
        StatName::FieldGoalsAttempted,
        StatName::FreeThrowsMade,
        StatName::FreeThrowsAttempted,
        StatName::ThreesMade,
        StatName::ThreesAttempted,
        StatName::PersonalFouls,
        StatName::MinutesPlayed,
    ];

    pub fn code(self) -> &'static str {
        match self {
            Self::Points => "pts",
            Self::Assists => "ast",
            Self::DefensiveRebounds => "dreb",
            Self::OffensiveRebounds => "oreb",
            Self::TotalRebounds => "treb",
            Self::Steals => "stl",
            Self::Blocks => "blk",
            Self::Turnovers => "tov",
            Self::FieldGoalsMade => "fgm",
            Self::FieldGoalsAttempted => "fga",
            Self::FreeThrowsMade => "ftm",
            Self::FreeThrowsAttempted => "fta",
            Self::ThreesMade => "3pm",
            Self::ThreesAttempted => "3pa",
            Self::PersonalFouls => "pf",
            Self::MinutesPlayed => "mp",
        }
    }

    /// SQL column name in the `statlines` table. Identifiers cannot start
    /// with a digit, so the three-point columns differ from `code()`.
    pub fn column(self) -> &'static str {
        match self {
            Self::ThreesMade => "tpm",
            Self::ThreesAttempted => "tpa",
            other => other.code(),
        }
    }

    pub fn from_code(raw: &str) -> Option<Self> {
        let needle = raw.trim().to_ascii_lowercase();
        let needle = match needle.as_str() {
            "to" => "tov",
            "tpm" => "3pm",
            "tpa" => "3pa",
            "reb" => "treb",
            other => other,
        };
        Self::ALL.into_iter().find(|stat| stat.code() == needle)
    }
}

impl fmt::Display for StatName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.code().to_ascii_uppercase())
    }
}

impl FromStr for StatName {
    type Err = MetricsError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        Self::from_code(raw)
            .ok_or_else(|| MetricsError::InvalidRequest(format!("unknown statistic {raw:?}")))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AverageStatline {
    pub subject: SubjectRef,
    pub perspective: Perspective,
    pub season: Option<i32>,
    pub pts: Option<f64>,
    pub ast: Option<f64>,
    pub dreb: Option<f64>,
    pub oreb: Option<f64>,
    pub treb: Option<f64>,
    pub stl: Option<f64>,
    pub blk: Option<f64>,
    pub tov: Option<f64>,
    pub fgm: Option<f64>,
    pub fga: Option<f64>,
    pub ftm: Option<f64>,
    pub fta: Option<f64>,
    #[serde(rename = "3pm")]
    pub tpm: Option<f64>,
    #[serde(rename = "3pa")]
    pub tpa: Option<f64>,
    pub pf: Option<f64>,
    pub mp: Option<f64>,
}

impl AverageStatline {
    /// Builds the statline from values ordered like [`StatName::ALL`].
    pub fn from_values(
        subject: SubjectRef,
        perspective: Perspective,
        season: Option<i32>,
        values: &[Option<f64>],
    ) -> Result<Self, MetricsError> {
        if values.len() != StatName::ALL.len() {
            return Err(MetricsError::InvalidRequest(format!(
                "expected {} averages, got {}",
                StatName::ALL.len(),
                values.len()
            )));
        }
        let v = |stat: StatName| values[stat as usize];
        Ok(Self {
            subject,
            perspective,
            season,
            pts: v(StatName::Points),
            ast: v(StatName::Assists),
            dreb: v(StatName::DefensiveRebounds),
            oreb: v(StatName::OffensiveRebounds),
            treb: v(StatName::TotalRebounds),
            stl: v(StatName::Steals),
            blk: v(StatName::Blocks),
            tov: v(StatName::Turnovers),
            fgm: v(StatName::FieldGoalsMade),
            fga: v(StatName::FieldGoalsAttempted),
            ftm: v(StatName::FreeThrowsMade),
            fta: v(StatName::FreeThrowsAttempted),
            tpm: v(StatName::ThreesMade),
            tpa: v(StatName::ThreesAttempted),
            pf: v(StatName::PersonalFouls),
            mp: v(StatName::MinutesPlayed),
        })
    }

    pub fn get(&self, stat: StatName) -> Option<f64> {
        match stat {
            StatName::Points => self.pts,
            StatName::Assists => self.ast,
            StatName::DefensiveRebounds => self.dreb,
            StatName::OffensiveRebounds => self.oreb,
            StatName::TotalRebounds => self.treb,
            StatName::Steals => self.stl,
            StatName::Blocks => self.blk,
            StatName::Turnovers => self.tov,
            StatName::FieldGoalsMade => self.fgm,
            StatName::FieldGoalsAttempted => self.fga,
            StatName::FreeThrowsMade => self.ftm,
            StatName::FreeThrowsAttempted => self.fta,
            StatName::ThreesMade => self.tpm,
            StatName::ThreesAttempted => self.tpa,
            StatName::PersonalFouls => self.pf,
            StatName::MinutesPlayed => self.mp,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn all_is_in_declaration_order() {
        for (idx, stat) in StatName::ALL.iter().enumerate() {
            assert_eq!(*stat as usize, idx);
        }
    }

    #[test]
    fn codes_parse_back() {
        for stat in StatName::ALL {
            assert_eq!(StatName::from_code(stat.code()), Some(stat));
        }
        assert_eq!(StatName::from_code("TO"), Some(StatName::Turnovers));
        assert_eq!("3PM".parse::<StatName>().unwrap(), StatName::ThreesMade);
        assert!("xyz".parse::<StatName>().is_err());
    }

    #[test]
    fn statline_rejects_short_batches() {
        let err = AverageStatline::from_values(
            SubjectRef::Player(1),
            Perspective::Own,
            None,
            &[Some(1.0)],
        )
        .unwrap_err();
        assert!(matches!(err, MetricsError::InvalidRequest(_)));
    }
}
