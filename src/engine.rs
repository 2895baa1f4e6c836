use tracing::debug;

use crate::error::{MetricsError, Result};
use crate::formulas::{
    self, PossessionInputs, ReboundKind, UperLeague, UperPlayer, UperTeam, VopInputs,
};
use crate::provider::{StatsProvider, require};
use crate::season::SeasonBounds;
use crate::stat::StatName::{self, *};
use crate::subject::{Perspective, SubjectKind, SubjectRef};

const UPER_PLAYER_STATS: [StatName; 13] = [
    MinutesPlayed,
    ThreesMade,
    Assists,
    FieldGoalsMade,
    FieldGoalsAttempted,
    FreeThrowsMade,
    FreeThrowsAttempted,
    Turnovers,
    TotalRebounds,
    OffensiveRebounds,
    Steals,
    Blocks,
    PersonalFouls,
];

const UPER_LEAGUE_STATS: [StatName; 5] = [
    Assists,
    FieldGoalsMade,
    FreeThrowsMade,
    FreeThrowsAttempted,
    PersonalFouls,
];

#[derive(Debug)]
pub struct MetricsEngine<P> {
    provider: P,
    seasons: SeasonBounds,
}

impl<P: StatsProvider> MetricsEngine<P> {
    pub fn new(provider: P) -> Self {
        Self::with_seasons(provider, SeasonBounds::default())
    }

    pub fn with_seasons(provider: P, seasons: SeasonBounds) -> Self {
        Self { provider, seasons }
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }

    pub fn seasons(&self) -> SeasonBounds {
        self.seasons
    }

    pub fn ast_to_ratio(&self, subject: &SubjectRef, season: Option<i32>) -> Result<f64> {
        let season = self.seasons.check(season)?;
        let [ast, tov] = require(
            &self.provider,
            [Assists, Turnovers],
            subject,
            Perspective::Own,
            season,
        )?;
        let value = formulas::ast_to_ratio(ast, tov).map_err(|u| u.into_error(subject))?;
        debug!(%subject, ?season, value, "ast_to_ratio");
        Ok(value)
    }

    pub fn vop(&self, subject: &SubjectRef, season: Option<i32>) -> Result<f64> {
        let season = self.seasons.check(season)?;
        let [pts, fga, oreb, tov, fta] = require(
            &self.provider,
            [
                Points,
                FieldGoalsAttempted,
                OffensiveRebounds,
                Turnovers,
                FreeThrowsAttempted,
            ],
            subject,
            Perspective::Own,
            season,
        )?;
        let value = formulas::vop(&VopInputs {
            pts,
            fga,
            oreb,
            tov,
            fta,
        })
        .map_err(|u| u.into_error(subject))?;
        debug!(%subject, ?season, value, "vop");
        Ok(value)
    }

    pub fn rebound_pct(
        &self,
        subject: &SubjectRef,
        kind: ReboundKind,
        season: Option<i32>,
    ) -> Result<f64> {
        let season = self.seasons.check(season)?;
        let outcome = match kind {
            ReboundKind::Total => return Ok(1.0),
            ReboundKind::Defensive => {
                let [treb, oreb] = require(
                    &self.provider,
                    [TotalRebounds, OffensiveRebounds],
                    subject,
                    Perspective::Own,
                    season,
                )?;
                formulas::defensive_rebound_pct(treb, oreb)
            }
            ReboundKind::Offensive => {
                let [treb, dreb] = require(
                    &self.provider,
                    [TotalRebounds, DefensiveRebounds],
                    subject,
                    Perspective::Own,
                    season,
                )?;
                formulas::offensive_rebound_pct(treb, dreb)
            }
        };
        let value = outcome.map_err(|u| u.into_error(subject))?;
        debug!(%subject, ?season, %kind, value, "rebound_pct");
        Ok(value)
    }

    /// Team and league subjects only. The opponents' defensive rebounds come
    /// from the opponent perspective of the same subject.
    pub fn possessions(&self, subject: &SubjectRef, season: Option<i32>) -> Result<f64> {
        if subject.kind() == SubjectKind::Player {
            return Err(MetricsError::UnsupportedSubject {
                metric: "possessions",
                kind: SubjectKind::Player,
            });
        }
        let season = self.seasons.check(season)?;

        let (own, opponent) = rayon::join(
            || {
                require(
                    &self.provider,
                    [
                        FieldGoalsAttempted,
                        FieldGoalsMade,
                        FreeThrowsAttempted,
                        OffensiveRebounds,
                        Turnovers,
                    ],
                    subject,
                    Perspective::Own,
                    season,
                )
            },
            || {
                require(
                    &self.provider,
                    [DefensiveRebounds],
                    subject,
                    Perspective::Opponent,
                    season,
                )
            },
        );
        let [fga, fgm, fta, oreb, tov] = own?;
        let [opp_dreb] = opponent?;

        let value = formulas::possessions(&PossessionInputs {
            fga,
            fgm,
            fta,
            oreb,
            tov,
            opp_dreb,
        })
        .map_err(|u| u.into_error(subject))?;
        debug!(%subject, ?season, value, "possessions");
        Ok(value)
    }

    /// Unadjusted PER for `player`, in the context of `team` and `league`.
    /// Every average, including the league VOP and DRBP, is taken for the
    /// same `season`.
    pub fn uper(
        &self,
        player: &SubjectRef,
        team: &SubjectRef,
        league: &SubjectRef,
        season: Option<i32>,
    ) -> Result<f64> {
        expect_kind("uper", player, SubjectKind::Player)?;
        expect_kind("uper", team, SubjectKind::Team)?;
        expect_kind("uper", league, SubjectKind::League)?;
        let season = self.seasons.check(season)?;

        let ((player_avgs, team_avgs), (league_avgs, (lg_vop, lg_drbp))) = rayon::join(
            || {
                rayon::join(
                    || {
                        require(
                            &self.provider,
                            UPER_PLAYER_STATS,
                            player,
                            Perspective::Own,
                            season,
                        )
                    },
                    || {
                        require(
                            &self.provider,
                            [Assists, FieldGoalsMade],
                            team,
                            Perspective::Own,
                            season,
                        )
                    },
                )
            },
            || {
                rayon::join(
                    || {
                        require(
                            &self.provider,
                            UPER_LEAGUE_STATS,
                            league,
                            Perspective::Own,
                            season,
                        )
                    },
                    || {
                        rayon::join(
                            || {
                                self.vop(league, season)
                                    .map_err(|err| err.within("uper", "league vop"))
                            },
                            || {
                                self.rebound_pct(league, ReboundKind::Defensive, season)
                                    .map_err(|err| {
                                        err.within("uper", "league defensive rebound pct")
                                    })
                            },
                        )
                    },
                )
            },
        );

        let [mp, tpm, ast, fgm, fga, ftm, fta, tov, treb, oreb, stl, blk, pf] = player_avgs?;
        let [team_ast, team_fgm] = team_avgs?;
        let [lg_ast, lg_fgm, lg_ftm, lg_fta, lg_pf] = league_avgs?;
        let lg_vop = lg_vop?;
        let lg_drbp = lg_drbp?;

        let value = formulas::uper(
            &UperPlayer {
                mp,
                tpm,
                ast,
                fgm,
                fga,
                ftm,
                fta,
                tov,
                treb,
                oreb,
                stl,
                blk,
                pf,
            },
            &UperTeam {
                ast: team_ast,
                fgm: team_fgm,
            },
            &UperLeague {
                ast: lg_ast,
                fgm: lg_fgm,
                ftm: lg_ftm,
                fta: lg_fta,
                pf: lg_pf,
                vop: lg_vop,
                drbp: lg_drbp,
            },
        )
        .map_err(|u| u.into_error(player))?;
        debug!(%player, %team, %league, ?season, value, "uper");
        Ok(value)
    }
}

fn expect_kind(metric: &'static str, subject: &SubjectRef, kind: SubjectKind) -> Result<()> {
    if subject.kind() == kind {
        Ok(())
    } else {
        Err(MetricsError::UnsupportedSubject {
            metric,
            kind: subject.kind(),
        })
    }
}
