use std::path::PathBuf;

use anyhow::{Context, Result, anyhow, bail};

use hoops_metrics::cli::{Arg, Args};
use hoops_metrics::config::{AppConfig, init_tracing};
use hoops_metrics::report::UperContext;
use hoops_metrics::{MetricsEngine, Perspective, ReboundKind, StatsDb, StatsProvider, SubjectRef};

const USAGE: &str = "usage: hoops_metrics <ast-to|vop|rbp|possessions|uper|report|averages|register-season> \
[--player ID] [--team ID] [--league CODE] [--season YEAR] [--kind total|defensive|offensive] \
[--perspective own|opponent] [--db PATH] [--json]";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Command {
    AstTo,
    Vop,
    Rbp,
    Possessions,
    Uper,
    Report,
    Averages,
    RegisterSeason,
}

impl Command {
    fn parse(raw: &str) -> Option<Self> {
        Some(match raw {
            "ast-to" | "ast_to" | "ast-to-ratio" => Self::AstTo,
            "vop" => Self::Vop,
            "rbp" | "rebound-pct" => Self::Rbp,
            "possessions" | "poss" => Self::Possessions,
            "uper" => Self::Uper,
            "report" => Self::Report,
            "averages" | "avg" => Self::Averages,
            "register-season" => Self::RegisterSeason,
            _ => return None,
        })
    }
}

#[derive(Debug, Default)]
struct CliArgs {
    command: Option<String>,
    player: Option<u32>,
    team: Option<u32>,
    league: Option<String>,
    season: Option<i32>,
    kind: Option<String>,
    db: Option<PathBuf>,
    perspective: Perspective,
    json: bool,
}

impl CliArgs {
    fn parse(raw: &[String]) -> Result<Self> {
        let mut out = CliArgs::default();
        let mut args = Args::new(raw);
        while let Some(arg) = args.next() {
            let (flag, inline) = match arg {
                Arg::Flag(flag, inline) => (flag, inline),
                Arg::Positional(other) => {
                    if out.command.is_some() {
                        bail!("unexpected argument {other}\n{USAGE}");
                    }
                    out.command = Some(other.to_string());
                    continue;
                }
            };
            match flag {
                "--json" => out.json = true,
                "--player" => {
                    out.player = Some(args.value(flag, inline)?.trim().parse().context("--player")?)
                }
                "--team" => {
                    out.team = Some(args.value(flag, inline)?.trim().parse().context("--team")?)
                }
                "--league" => out.league = Some(args.value(flag, inline)?.to_string()),
                "--season" => {
                    out.season = Some(args.value(flag, inline)?.trim().parse().context("--season")?)
                }
                "--kind" => out.kind = Some(args.value(flag, inline)?.to_string()),
                "--perspective" => out.perspective = args.value(flag, inline)?.parse()?,
                "--db" => out.db = Some(PathBuf::from(args.value(flag, inline)?)),
                other => bail!("unknown flag {other}\n{USAGE}"),
            }
        }
        Ok(out)
    }

    fn league_subject(&self) -> Result<Option<SubjectRef>> {
        self.league
            .as_deref()
            .map(SubjectRef::league)
            .transpose()
            .context("--league")
    }

    fn subject(&self) -> Result<SubjectRef> {
        let league = self.league_subject()?;
        let mut found = Vec::new();
        if let Some(id) = self.player {
            found.push(SubjectRef::Player(id));
        }
        if let Some(id) = self.team {
            found.push(SubjectRef::Team(id));
        }
        found.extend(league);
        match found.len() {
            1 => Ok(found.remove(0)),
            0 => bail!("pass one of --player, --team or --league"),
            _ => bail!("pass only one of --player, --team or --league"),
        }
    }

    fn uper_subjects(&self) -> Result<(SubjectRef, SubjectRef, SubjectRef)> {
        let player = self.player.context("uper needs --player")?;
        let team = self.team.context("uper needs --team")?;
        let league = self.league_subject()?.context("uper needs --league")?;
        Ok((SubjectRef::Player(player), SubjectRef::Team(team), league))
    }
}

fn main() -> Result<()> {
    let config = AppConfig::load();
    init_tracing();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let cli = CliArgs::parse(&args)?;
    let command = cli
        .command
        .as_deref()
        .and_then(Command::parse)
        .ok_or_else(|| anyhow!(USAGE))?;

    let db_path = cli
        .db
        .clone()
        .or_else(|| config.db_path.clone())
        .context("unable to resolve sqlite path")?;
    let bounds = config.season_bounds();
    let db = StatsDb::open(&db_path, config.pool_size, bounds)
        .with_context(|| format!("open stats db {}", db_path.display()))?;

    let engine = MetricsEngine::with_seasons(db, bounds);
    let season = cli.season;

    match command {
        Command::RegisterSeason => {
            let inserted = match season {
                Some(season) => engine.provider().register_season(season)?,
                None => engine.provider().register_current_season()?,
            };
            println!(
                "{}",
                if inserted {
                    "season registered"
                } else {
                    "season already known"
                }
            );
        }
        Command::Report => print_report(&engine, &cli)?,
        Command::Averages => {
            let statline = engine
                .provider()
                .statline_average(&cli.subject()?, cli.perspective, season)?;
            println!("{}", serde_json::to_string_pretty(&statline)?);
        }
        Command::AstTo => print_value(&cli, engine.ast_to_ratio(&cli.subject()?, season)?),
        Command::Vop => print_value(&cli, engine.vop(&cli.subject()?, season)?),
        Command::Rbp => {
            let kind = cli
                .kind
                .as_deref()
                .unwrap_or("total")
                .parse::<ReboundKind>()?;
            print_value(&cli, engine.rebound_pct(&cli.subject()?, kind, season)?);
        }
        Command::Possessions => print_value(&cli, engine.possessions(&cli.subject()?, season)?),
        Command::Uper => {
            let (player, team, league) = cli.uper_subjects()?;
            print_value(&cli, engine.uper(&player, &team, &league, season)?);
        }
    }

    Ok(())
}

fn print_report(engine: &MetricsEngine<StatsDb>, cli: &CliArgs) -> Result<()> {
    let subject = cli.subject().or_else(|_| {
        cli.player
            .map(SubjectRef::Player)
            .context("report needs a subject")
    })?;
    let context = match (&subject, cli.team, cli.league_subject()?) {
        (SubjectRef::Player(_), Some(team), Some(league)) => Some(UperContext {
            team: SubjectRef::Team(team),
            league,
        }),
        _ => None,
    };
    let report = engine.report(&subject, context.as_ref(), cli.season)?;
    if cli.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }
    println!("{} ({})", report.subject, season_text(cli.season));
    for entry in &report.metrics {
        match (entry.value, entry.error.as_deref()) {
            (Some(value), _) => println!("  {:<6} {value:.4}", entry.metric.label()),
            (None, Some(err)) => println!("  {:<6} n/a ({err})", entry.metric.label()),
            (None, None) => println!("  {:<6} n/a", entry.metric.label()),
        }
    }
    Ok(())
}

fn print_value(cli: &CliArgs, value: f64) {
    if cli.json {
        println!("{}", serde_json::json!({ "value": value, "season": cli.season }));
    } else {
        println!("{value:.4}");
    }
}

fn season_text(season: Option<i32>) -> String {
    season.map_or_else(|| "career".to_string(), |s| format!("season {s}"))
}
