use crate::{
    component,
    config::Config,
    decode,
    engine::{
        onnx::{self, OnnxConditionModel, OnnxLabelClassifier},
        ConditionModel, LabelClassifier,
    },
    pipeline::{AnalysisOutcome, Pipeline, Upload},
    scorer::DamageScorer,
    server::{self, AppState},
    util::ensure_dir,
    validator::HouseValidator,
};
use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

#[derive(Parser, Debug)]
#[command(name = "graminscore")]
#[command(about = "House exterior photo triage, condition scoring and PDF reporting")]
pub struct Args {
    #[command(subcommand)]
    pub cmd: Command,

    /// Path to config TOML. If omitted, uses ./graminscore.toml if present.
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Override log level (trace/debug/info/warn/error).
    #[arg(long)]
    pub log_level: Option<String>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Check that the configured models load.
    Doctor {},
    /// Print top labels, house decision and component bucket for one image.
    Classify {
        #[arg(long)]
        input: PathBuf,
    },
    /// Run a batch of images from disk and write a report.
    Analyze {
        #[arg(long, required = true, num_args = 1..)]
        input: Vec<PathBuf>,
        #[arg(long)]
        out_dir: Option<PathBuf>,
    },
    /// Start the web interface.
    Serve {
        #[arg(long)]
        bind: Option<String>,
    },
}

pub fn dispatch(args: Args) -> Result<()> {
    let cfg = load_config(args.config.as_deref())?;
    let _guard = init_logging(&args, &cfg, resolve_log_path(&cfg).as_deref())?;

    match &args.cmd {
        Command::Doctor {} => doctor(&cfg),
        Command::Classify { input } => classify(&cfg, input),
        Command::Analyze { input, out_dir } => analyze(&cfg, input, out_dir.as_deref()),
        Command::Serve { bind } => serve(&cfg, bind.as_deref()),
    }
}

fn load_config(user: Option<&Path>) -> Result<Config> {
    if let Some(p) = user {
        return Config::load(p);
    }
    for candidate in ["graminscore.toml", "graminscore.example.toml"] {
        let path = PathBuf::from(candidate);
        if path.exists() {
            return Config::load(&path);
        }
    }
    Ok(Config::default())
}

fn init_logging(args: &Args, cfg: &Config, file_path: Option<&Path>) -> Result<Option<WorkerGuard>> {
    let level = args
        .log_level
        .as_deref()
        .unwrap_or(cfg.logging.level.as_str());

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let stdout_layer = if cfg.logging.json {
        tracing_subscriber::fmt::layer()
            .json()
            .with_target(true)
            .boxed()
    } else {
        tracing_subscriber::fmt::layer()
            .with_target(true)
            .boxed()
    };

    let (file_layer, guard) = if let Some(path) = file_path {
        let parent = path.parent().unwrap_or_else(|| Path::new("."));
        ensure_dir(parent)?;
        let file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .with_context(|| format!("open log file: {}", path.display()))?;
        let (non_blocking, guard) = tracing_appender::non_blocking(file);
        let layer = tracing_subscriber::fmt::layer()
            .with_writer(non_blocking)
            .with_ansi(false)
            .with_target(true)
            .boxed();
        (Some(layer), Some(guard))
    } else {
        (None, None)
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(stdout_layer)
        .with(file_layer)
        .try_init()
        .map_err(|e| anyhow!("failed to init logging: {e}"))?;

    Ok(guard)
}

fn resolve_log_path(cfg: &Config) -> Option<PathBuf> {
    if !cfg.logging.write_to_file {
        return None;
    }
    if !cfg.logging.file_path.is_empty() {
        return Some(PathBuf::from(&cfg.logging.file_path));
    }
    Some(PathBuf::from(&cfg.paths.out_dir).join("graminscore.log"))
}

/// Loads both models once. The label classifier is required; the condition
/// model is optional and its absence puts scoring in degraded mode.
pub fn build_pipeline(cfg: &Config) -> Result<Pipeline> {
    let classifier: Arc<dyn LabelClassifier> = Arc::new(
        OnnxLabelClassifier::new(cfg).with_context(|| "loading label classifier")?,
    );
    let condition = OnnxConditionModel::try_load(cfg).map(|m| Arc::new(m) as Arc<dyn ConditionModel>);
    Ok(Pipeline::new(
        cfg,
        HouseValidator::new(cfg, classifier),
        DamageScorer::new(condition),
    ))
}

fn doctor(cfg: &Config) -> Result<()> {
    let diag = onnx::doctor(cfg);
    println!("{}", serde_json::to_string_pretty(&diag)?);
    Ok(())
}

fn classify(cfg: &Config, input: &Path) -> Result<()> {
    let upload = Upload::from_path(input)?;
    let img = decode::decode_rgb(&upload.bytes, cfg.uploads.max_file_bytes)
        .with_context(|| format!("decoding {}", input.display()))?;
    let classifier = OnnxLabelClassifier::new(cfg)?;
    let validator = HouseValidator::new(cfg, Arc::new(classifier));
    let result = validator.validate(&img)?;
    let detected = component::detect(&result.decision.labels);
    println!(
        "{}",
        serde_json::to_string_pretty(&serde_json::json!({
            "input": input,
            "predictions": result.predictions,
            "decision": result.decision,
            "detected": detected,
            "component": detected.bucket(),
        }))?
    );
    Ok(())
}

fn analyze(cfg: &Config, inputs: &[PathBuf], out_override: Option<&Path>) -> Result<()> {
    let uploads = inputs
        .iter()
        .map(|p| Upload::from_path(p))
        .collect::<Result<Vec<_>>>()?;

    let out_root = out_override
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(&cfg.paths.out_dir));
    ensure_dir(&out_root)?;

    let pipeline = build_pipeline(cfg)?;
    match pipeline.run_batch(&uploads, &out_root)? {
        AnalysisOutcome::Report {
            job_id,
            aggregate,
            skipped,
            files,
            ..
        } => {
            println!(
                "{}",
                serde_json::to_string_pretty(&serde_json::json!({
                    "job_id": job_id,
                    "status": "ok",
                    "aggregate": aggregate,
                    "skipped": skipped,
                    "files": files,
                }))?
            );
            Ok(())
        }
        AnalysisOutcome::NoValidImages { skipped, .. } => {
            println!(
                "{}",
                serde_json::to_string_pretty(&serde_json::json!({
                    "status": "no_valid_images",
                    "skipped": skipped,
                }))?
            );
            Err(anyhow!("No valid house images found."))
        }
    }
}

fn serve(cfg: &Config, bind_override: Option<&str>) -> Result<()> {
    let bind = bind_override.unwrap_or(cfg.server.bind_addr.as_str());
    let out_root = PathBuf::from(&cfg.paths.out_dir);
    ensure_dir(&out_root)?;

    let pipeline = build_pipeline(cfg)?;
    let state = AppState::new(pipeline, out_root);

    let rt = tokio::runtime::Runtime::new().with_context(|| "starting tokio runtime")?;
    info!("starting server on {bind}");
    rt.block_on(server::serve(state, bind))
}
