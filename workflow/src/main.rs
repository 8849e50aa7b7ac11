//! clusterflow
//!
//! Command line interface of the clustering pipeline. Each stage is a subcommand exchanging JSON
//! payload files, so an external scheduler can run them as separate tasks, and `run` chains all
//! of them in one process.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{Parser, Subcommand};
use clusterflow_workflow::payload::{
    build_save_model_payload, load_data_payload, load_model_elbow_payload, preprocess_payload,
};
use clusterflow_workflow::{
    run_pipeline, FsArtifactStore, ModelSelection, PipelineConfig, ScoreReport,
};
use tracing_subscriber::{fmt, EnvFilter};

/// Offline K-Means clustering pipeline
#[derive(Parser)]
#[command(name = "clusterflow")]
#[command(version)]
#[command(about = "Scale a table, sweep K-Means over cluster counts and score new records")]
struct Cli {
    /// Verbosity level (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// TOML configuration file, defaults are used for anything it leaves out
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Directory of the training and test files
    #[arg(long)]
    data_dir: Option<PathBuf>,

    /// Directory of the committed scaler and model
    #[arg(long)]
    model_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Read the training file into a table payload
    Load {
        #[arg(short, long)]
        output: PathBuf,
    },
    /// Fit and commit the scaler, write the scaled table payload
    Preprocess {
        #[arg(short, long)]
        input: PathBuf,
        #[arg(short, long)]
        output: PathBuf,
    },
    /// Fit K-Means over 1..=max-clusters, commit a model and write the dispersion scores
    Fit {
        #[arg(short, long)]
        input: PathBuf,
        #[arg(short, long)]
        output: PathBuf,
        #[arg(long)]
        max_clusters: Option<usize>,
        /// Which model to commit: "largest" or "elbow"
        #[arg(long)]
        selection: Option<ModelSelection>,
    },
    /// Score the test file with the committed scaler and model
    Score {
        /// Dispersion scores written by `fit`
        #[arg(short, long)]
        scores: PathBuf,
        /// Where to write the score report, it is only printed otherwise
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Run all stages in process
    Run {
        #[arg(long)]
        max_clusters: Option<usize>,
        /// Which model to commit: "largest" or "elbow"
        #[arg(long)]
        selection: Option<ModelSelection>,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = match cli.verbose {
        0 => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };
    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();

    let mut config = match &cli.config {
        Some(path) => PipelineConfig::load(path)
            .with_context(|| format!("loading configuration {}", path.display()))?,
        None => PipelineConfig::default(),
    };
    if let Some(data_dir) = cli.data_dir {
        config.data_dir = data_dir;
    }
    if let Some(model_dir) = cli.model_dir {
        config.model_dir = model_dir;
    }
    let store = FsArtifactStore::new(&config.model_dir);

    match cli.command {
        Commands::Load { output } => {
            let payload = load_data_payload(config.train_path())?;
            write(&output, &payload)?;
        }
        Commands::Preprocess { input, output } => {
            let payload = preprocess_payload(&store, &config.scaler_key, &read(&input)?)?;
            write(&output, &payload)?;
        }
        Commands::Fit {
            input,
            output,
            max_clusters,
            selection,
        } => {
            override_fit(&mut config, max_clusters, selection);
            let payload =
                build_save_model_payload(&store, &read(&input)?, &config.fit, &config.model_key)?;
            write(&output, &payload)?;
        }
        Commands::Score { scores, output } => {
            let payload = load_model_elbow_payload(
                &store,
                &config.model_key,
                &config.scaler_key,
                config.test_path(),
                &read(&scores)?,
            )?;
            report(&serde_json::from_slice(&payload)?);
            if let Some(output) = output {
                write(&output, &payload)?;
            }
        }
        Commands::Run {
            max_clusters,
            selection,
        } => {
            override_fit(&mut config, max_clusters, selection);
            report(&run_pipeline(&config, &store)?);
        }
    }

    Ok(())
}

fn override_fit(
    config: &mut PipelineConfig,
    max_clusters: Option<usize>,
    selection: Option<ModelSelection>,
) {
    if let Some(max_clusters) = max_clusters {
        config.fit = config.fit.clone().max_clusters(max_clusters);
    }
    if let Some(selection) = selection {
        config.fit = config.fit.clone().selection(selection);
    }
}

fn report(report: &ScoreReport) {
    match report.elbow {
        Some(elbow) => println!("Optimal no. of clusters: {}", elbow),
        None => println!("Optimal no. of clusters: None"),
    }
    match report.first() {
        Some(cluster) => println!("First test record belongs to cluster {}", cluster),
        None => println!("No test records"),
    }
}

fn read(path: &Path) -> anyhow::Result<Vec<u8>> {
    fs::read(path).with_context(|| format!("reading payload {}", path.display()))
}

fn write(path: &Path, payload: &[u8]) -> anyhow::Result<()> {
    fs::write(path, payload).with_context(|| format!("writing payload {}", path.display()))
}
