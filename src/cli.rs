// Command-line interface
// Generates beatmaps from feature files and browses the local catalog

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

use clap::{Args, Parser, Subcommand};
use serde::Serialize;
use uuid::Uuid;

use crate::beatmap::{Beatmap, BeatmapSummary};
use crate::config::{Difficulty, GenerationMode, PipelineConfig};
use crate::features::FeatureInput;
use crate::pipeline::{run_batch, Pipeline, TraceWriter};
use crate::state::{self, BeatmapRecord, BeatmapStore};

#[derive(Parser, Debug)]
#[command(name = "beatlane", author, version, about)]
pub struct Cli {
    /// Enable debug logging (RUST_LOG takes precedence)
    #[arg(long, short, global = true)]
    pub verbose: bool,

    /// Root for stored beatmaps and the catalog (defaults to the app data dir)
    #[arg(long, global = true, value_name = "DIR")]
    pub data_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Generate beatmaps from feature JSON files
    Generate(GenerateArgs),

    /// List catalogued beatmaps, newest first
    List,

    /// Print a stored beatmap with its catalog record and summary
    Show {
        /// Beatmap id
        id: String,
    },
}

#[derive(Args, Debug)]
pub struct GenerateArgs {
    /// Feature files to convert
    #[arg(required = true, value_name = "INPUT.json")]
    pub inputs: Vec<PathBuf>,

    /// Pipeline config TOML
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Directory for `<stem>.beatmap.json` outputs
    #[arg(long, value_name = "DIR")]
    pub out: Option<PathBuf>,

    /// Also store and catalog every beatmap
    #[arg(long)]
    pub store: bool,

    /// Append a JSONL stage trace to this file
    #[arg(long, value_name = "FILE")]
    pub trace: Option<PathBuf>,

    /// Lane count (overrides config)
    #[arg(long)]
    pub lanes: Option<usize>,

    /// easy, normal, hard or expert (overrides config)
    #[arg(long)]
    pub difficulty: Option<String>,

    /// Use seeded probabilistic generation with this seed
    #[arg(long)]
    pub seed: Option<u64>,
}

#[derive(Debug)]
pub struct CliError {
    message: String,
}

impl CliError {
    pub fn new(message: impl Into<String>) -> Self {
        CliError {
            message: message.into(),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl<E: std::fmt::Display> From<E> for CliError {
    fn from(error: E) -> Self {
        CliError {
            message: error.to_string(),
        }
    }
}

pub type CliResult<T> = Result<T, CliError>;

/// Run a parsed command to completion
pub fn execute(cli: Cli) -> CliResult<()> {
    match cli.command {
        Command::Generate(args) => {
            let runtime = tokio::runtime::Builder::new_multi_thread().enable_all().build()?;
            runtime.block_on(generate(args, cli.data_dir))
        }
        Command::List => list(cli.data_dir),
        Command::Show { id } => show(&id, cli.data_dir),
    }
}

/// Config file values with command-line overrides applied
fn resolve_config(args: &GenerateArgs) -> CliResult<PipelineConfig> {
    let mut config = match &args.config {
        Some(path) => PipelineConfig::load_or_default(path)?,
        None => PipelineConfig::default(),
    };

    if let Some(lanes) = args.lanes {
        config.lanes = lanes;
    }
    if let Some(name) = &args.difficulty {
        config.difficulty = Difficulty::parse(name)
            .ok_or_else(|| CliError::new(format!("Unknown difficulty '{}'", name)))?;
    }
    if let Some(seed) = args.seed {
        config.mode = GenerationMode::Seeded(seed);
    }

    Ok(config)
}

/// Catalog under `data_dir`, or the app data directory when none is given
fn open_catalog(data_dir: Option<&Path>) -> CliResult<state::DbConnection> {
    match data_dir {
        Some(dir) => Ok(state::open_db(&dir.join("beatlane.db"))?),
        None => Ok(state::init_db()?),
    }
}

fn open_store(data_dir: Option<&Path>) -> CliResult<BeatmapStore> {
    match data_dir {
        Some(dir) => Ok(BeatmapStore::new(dir)),
        None => Ok(BeatmapStore::open_default()?),
    }
}

fn read_input(path: &Path) -> CliResult<FeatureInput> {
    let bytes = fs::read(path).map_err(|e| CliError::new(format!("Failed to read {}: {}", path.display(), e)))?;
    FeatureInput::from_json_bytes(&bytes)
        .map_err(|e| CliError::new(format!("Failed to parse {}: {}", path.display(), e)))
}

/// `song.json` -> `song.beatmap.json`
fn output_name(input: &Path) -> String {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "beatmap".to_string());
    format!("{}.beatmap.json", stem)
}

/// Where a beatmap is written; `None` means stdout
///
/// `--out` always wins. Without it a lone input prints to stdout and
/// several inputs each get a file next to their input.
fn output_target(input: &Path, out: Option<&Path>, single: bool) -> Option<PathBuf> {
    match out {
        Some(dir) => Some(dir.join(output_name(input))),
        None if single => None,
        None => Some(input.with_file_name(output_name(input))),
    }
}

async fn generate(args: GenerateArgs, data_dir: Option<PathBuf>) -> CliResult<()> {
    let config = resolve_config(&args)?;
    let difficulty = config.difficulty;
    let mut pipeline = Pipeline::new(config)?;
    if let Some(trace_path) = &args.trace {
        pipeline = pipeline.with_trace(TraceWriter::new(trace_path.clone()));
    }

    let catalog = if args.store {
        let data_dir = data_dir.as_deref();
        Some((open_store(data_dir)?, open_catalog(data_dir)?))
    } else {
        None
    };

    if let Some(out) = &args.out {
        fs::create_dir_all(out)?;
    }

    let single = args.inputs.len() == 1;
    let mut failures = 0;

    let mut paths = Vec::with_capacity(args.inputs.len());
    let mut inputs = Vec::with_capacity(args.inputs.len());
    for path in &args.inputs {
        match read_input(path) {
            Ok(input) => {
                paths.push(path.as_path());
                inputs.push(input);
            }
            Err(e) => {
                log::error!("{}", e.message());
                failures += 1;
            }
        }
    }

    let results = run_batch(&pipeline, inputs, Arc::new(AtomicBool::new(false))).await;

    for (path, result) in paths.into_iter().zip(results) {
        let beatmap = match result {
            Ok(beatmap) => beatmap,
            Err(e) => {
                log::error!("{}: {}", path.display(), e);
                failures += 1;
                continue;
            }
        };

        let target = output_target(path, args.out.as_deref(), single);
        if let Err(e) = write_output(&beatmap, target.as_deref()) {
            log::error!("{}: {}", path.display(), e.message());
            failures += 1;
            continue;
        }

        if let Some((store, db)) = &catalog {
            match store_output(store, db, path, difficulty, &beatmap) {
                Ok(record) => log::info!("Stored {} as {}", path.display(), record.id),
                Err(e) => {
                    log::error!("{}: {}", path.display(), e.message());
                    failures += 1;
                    continue;
                }
            }
        }

        log_summary(path, &beatmap);
    }

    if failures > 0 {
        return Err(CliError::new(format!(
            "{} of {} inputs failed",
            failures,
            args.inputs.len()
        )));
    }
    Ok(())
}

fn write_output(beatmap: &Beatmap, target: Option<&Path>) -> CliResult<()> {
    let json = beatmap.to_json_pretty()?;
    match target {
        Some(target) => {
            fs::write(target, &json)
                .map_err(|e| CliError::new(format!("Failed to write {}: {}", target.display(), e)))?;
            log::info!("Wrote {}", target.display());
        }
        None => println!("{}", json),
    }
    Ok(())
}

fn store_output(
    store: &BeatmapStore,
    db: &state::DbConnection,
    path: &Path,
    difficulty: Difficulty,
    beatmap: &Beatmap,
) -> CliResult<BeatmapRecord> {
    let stored = store.save(beatmap)?;
    let source_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    Ok(state::create_beatmap(db, source_name, difficulty, beatmap, &stored)?)
}

fn log_summary(path: &Path, beatmap: &Beatmap) {
    let summary = BeatmapSummary::from_beatmap(beatmap);
    log::info!(
        "{}: {} notes ({} strong, {} normal, {} hold) over {:.1}s, rating {:.1}",
        path.display(),
        summary.note_count,
        summary.strong_count,
        summary.normal_count,
        summary.hold_count,
        summary.span_seconds,
        summary.difficulty_rating
    );
}

fn list(data_dir: Option<PathBuf>) -> CliResult<()> {
    let db = open_catalog(data_dir.as_deref())?;
    let records = state::list_beatmaps(&db)?;

    if records.is_empty() {
        log::info!("No beatmaps catalogued yet");
    }
    for record in records {
        println!(
            "{}  {}  {:<24}  {:<6}  {:>5} events  {:>6.1} bpm",
            record.id,
            record.created_at.format("%Y-%m-%d %H:%M"),
            record.source_name,
            record.difficulty.as_str(),
            record.event_count,
            record.tempo
        );
    }
    Ok(())
}

#[derive(Serialize)]
struct ShowOutput<'a> {
    record: &'a BeatmapRecord,
    summary: BeatmapSummary,
    beatmap: &'a Beatmap,
}

fn show(id: &str, data_dir: Option<PathBuf>) -> CliResult<()> {
    let id = Uuid::parse_str(id)?;
    let db = open_catalog(data_dir.as_deref())?;
    let record = state::get_beatmap(&db, &id)?
        .ok_or_else(|| CliError::new(format!("No beatmap with id {}", id)))?;

    let bytes = fs::read(&record.path)?;
    if state::calculate_sha256(&bytes) != record.sha256 {
        log::warn!("Stored document for {} no longer matches its catalog hash", id);
    }
    let beatmap = Beatmap::from_json_bytes(&bytes)?;

    let output = ShowOutput {
        record: &record,
        summary: BeatmapSummary::from_beatmap(&beatmap),
        beatmap: &beatmap,
    };
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}
