use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, anyhow, bail};

use hoops_metrics::StatsDb;
use hoops_metrics::cli::{Arg, Args};
use hoops_metrics::config::{AppConfig, init_tracing};
use hoops_metrics::stats_db::IngestRecord;

const USAGE: &str = "usage: stat_ingest <records.jsonl> [--db PATH]";

fn main() -> Result<()> {
    let config = AppConfig::load();
    init_tracing();

    let raw = std::env::args().skip(1).collect::<Vec<_>>();
    let args = parse_args(&raw)?;
    let input = args.input.ok_or_else(|| anyhow!(USAGE))?;
    let db_path = args
        .db
        .or_else(|| config.db_path.clone())
        .context("unable to resolve sqlite path")?;

    let records = read_records(&input)?;
    let db = StatsDb::open(&db_path, 1, config.season_bounds())
        .with_context(|| format!("open stats db {}", db_path.display()))?;
    let summary = db
        .apply_records(&records)
        .with_context(|| format!("ingest {}", input.display()))?;

    println!("Statline ingest complete");
    println!("DB: {}", db_path.display());
    println!(
        "Leagues: {}  Teams: {}  Players: {}",
        summary.leagues, summary.teams, summary.players
    );
    println!("Statlines upserted: {}", summary.statlines);
    if !summary.seasons.is_empty() {
        let seasons = summary
            .seasons
            .iter()
            .map(|s| s.to_string())
            .collect::<Vec<_>>()
            .join(", ");
        println!("Seasons: {seasons}");
    }

    Ok(())
}

fn read_records(path: &Path) -> Result<Vec<IngestRecord>> {
    let file = File::open(path).with_context(|| format!("open {}", path.display()))?;
    let mut out = Vec::new();
    for (idx, line) in BufReader::new(file).lines().enumerate() {
        let line = line.with_context(|| format!("read line {}", idx + 1))?;
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }
        let record = serde_json::from_str::<IngestRecord>(trimmed)
            .with_context(|| format!("invalid record on line {}", idx + 1))?;
        out.push(record);
    }
    Ok(out)
}

#[derive(Debug, Default, PartialEq)]
struct IngestArgs {
    input: Option<PathBuf>,
    db: Option<PathBuf>,
}

fn parse_args(raw: &[String]) -> Result<IngestArgs> {
    let mut out = IngestArgs::default();
    let mut args = Args::new(raw);
    while let Some(arg) = args.next() {
        match arg {
            Arg::Flag("--db", inline) => {
                out.db = Some(PathBuf::from(args.value("--db", inline)?.trim()))
            }
            Arg::Flag(other, _) => bail!("unknown flag {other}\n{USAGE}"),
            Arg::Positional(path) if out.input.is_none() => out.input = Some(PathBuf::from(path)),
            Arg::Positional(other) => bail!("unexpected argument {other}\n{USAGE}"),
        }
    }
    Ok(out)
}
