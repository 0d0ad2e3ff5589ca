use anyhow::Context;
use clap::{Parser, Subcommand};
use crashmon::analysis;
use crashmon::cluster::{Association, MatchPolicy};
use crashmon::config::MonitorConfig;
use crashmon::ingest;
use crashmon::store::{JsonFileStore, PersistentIndex};
use crashmon::table;
use std::io::{self, Read};
use std::path::{Path, PathBuf};

#[derive(Parser, Debug)]
#[command(name = "crashmon", version, about = "Scheduler dump parsing and command clustering for node crashes")]
struct Cli {
    /// JSON config file; defaults apply to anything it leaves out
    #[arg(long = "config", global = true)]
    config: Option<PathBuf>,

    /// Override the scheduler table delimiter
    #[arg(long = "delimiter", global = true)]
    delimiter: Option<char>,

    /// Override the clustering threshold
    #[arg(long = "threshold", global = true)]
    threshold: Option<f64>,

    /// Match the nearest representative instead of the last qualifying one
    #[arg(long = "nearest", global = true, default_value_t = false)]
    nearest: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Parse a scheduler dump and print its rows as JSON
    Parse {
        /// Dump file (`-` or absent for stdin)
        input: Option<String>,
    },
    /// Parse a dump, cluster its commands and record them against a crash.
    ///
    /// The store is read once at start and rewritten whole on each change, so
    /// concurrent ingest runs against one store lose each other's updates.
    /// Run them one at a time.
    Ingest {
        #[arg(long = "crash")]
        crash: String,
        #[arg(long = "store")]
        store: PathBuf,
        input: Option<String>,
    },
    /// List stored representatives
    Clusters {
        #[arg(long = "store")]
        store: PathBuf,
        /// Truncate command text to this many characters
        #[arg(long = "width", default_value_t = 300)]
        width: usize,
    },
    /// Print the scheduler output-format argument
    Format,
    /// Print pairs of stored representatives whose distance lies in a range
    Analyse {
        #[arg(long = "store")]
        store: PathBuf,
        #[arg(long = "lower", default_value_t = 0.0)]
        lower: f64,
        #[arg(long = "upper", default_value_t = 1.0)]
        upper: f64,
    },
}

fn read_input(input: Option<&str>) -> io::Result<String> {
    match input {
        None | Some("-") => {
            let mut s = String::new();
            io::stdin().lock().read_to_string(&mut s)?;
            Ok(s)
        }
        Some(p) => std::fs::read_to_string(p),
    }
}

fn load_config(cli: &Cli) -> anyhow::Result<MonitorConfig> {
    let mut cfg = match &cli.config {
        Some(p) => MonitorConfig::load(p).with_context(|| format!("loading config {}", p.display()))?,
        None => MonitorConfig::default(),
    };
    if let Some(d) = cli.delimiter {
        cfg.scheduler.delimiter = d;
    }
    if let Some(t) = cli.threshold {
        cfg.clustering.threshold = t;
    }
    if cli.nearest {
        cfg.clustering.policy = MatchPolicy::Nearest;
    }
    cfg.validate()?;
    Ok(cfg)
}

fn open_index(
    path: &Path,
    cfg: &MonitorConfig,
) -> anyhow::Result<PersistentIndex<JsonFileStore<Association>, Association>> {
    let store = JsonFileStore::open(path).with_context(|| format!("opening store {}", path.display()))?;
    Ok(PersistentIndex::load(store, cfg.clustering.threshold, cfg.clustering.policy)?)
}

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();
    let cfg = load_config(&cli)?;

    match &cli.command {
        Command::Parse { input } => {
            let raw = read_input(input.as_deref()).context("reading scheduler dump")?;
            let parsed = table::parse_block(&raw, cfg.scheduler.delimiter, cfg.scheduler.fields.len())?;
            let rows: Vec<serde_json::Value> = parsed
                .records()
                .into_iter()
                .map(|rec| {
                    let obj: serde_json::Map<String, serde_json::Value> = rec
                        .into_iter()
                        .map(|(k, v)| (k.to_string(), serde_json::Value::String(v.to_string())))
                        .collect();
                    serde_json::Value::Object(obj)
                })
                .collect();
            let out = serde_json::json!({ "columns": parsed.header.columns, "rows": rows });
            println!("{}", serde_json::to_string_pretty(&out)?);
        }
        Command::Ingest { crash, store, input } => {
            let raw = read_input(input.as_deref()).context("reading scheduler dump")?;
            let mut index = open_index(store, &cfg)?;
            match ingest::ingest_dump(&raw, crash, &cfg.scheduler, &mut index) {
                Ok(report) => println!("{}", serde_json::to_string_pretty(&report)?),
                Err(ingest::IngestError::Table(table::TableError::NoDataAvailable)) => {
                    log::warn!("no scheduler data for crash {crash}, nothing recorded");
                }
                Err(e) => return Err(e.into()),
            }
        }
        Command::Clusters { store, width } => {
            let index = open_index(store, &cfg)?;
            for r in index.index().representatives() {
                let crashes = r.associations().iter().filter(|a| matches!(a, Association::Crash(_))).count();
                let users = r.associations().len() - crashes;
                println!(
                    "{}",
                    serde_json::json!({
                        "id": r.id(),
                        "text": r.short_text(*width),
                        "crashes": crashes,
                        "users": users,
                    })
                );
            }
        }
        Command::Format => {
            println!("{}", cfg.scheduler.output_format());
        }
        Command::Analyse { store, lower, upper } => {
            let index = open_index(store, &cfg)?;
            let dists: Vec<_> = index.index().representatives().iter().map(|r| r.distribution().clone()).collect();
            for (i, j, d) in analysis::pairs_within(&dists, *lower, *upper) {
                println!("{i} {j} {d:.4}");
            }
        }
    }
    Ok(())
}
