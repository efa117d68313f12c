use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use tracing_subscriber::EnvFilter;

use knn_cf::config::PredictionConfig;
use knn_cf::engine::{self, CellOutcome};
use knn_cf::evaluation::leave_one_out;
use knn_cf::{datasets, loader, Mode, RatingMatrix, TargetCell};

#[derive(Parser)]
#[command(name = "knn-cf")]
#[command(about = "Predict missing ratings from the most similar users or items")]
#[command(version)]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, ValueEnum)]
enum Example {
    /// 6x6 matrix of the user-based walkthrough
    Users,
    /// 5x5 matrix of the item-based walkthrough
    Items,
}

#[derive(Args)]
struct MatrixSource {
    /// Rating matrix file (dense grid, or row,col,rating triplets for .csv)
    #[arg(short, long, conflicts_with = "example")]
    matrix: Option<PathBuf>,

    /// Use one of the embedded example matrices
    #[arg(short, long, value_enum)]
    example: Option<Example>,

    /// Matrix shape for triplet files, as ROWSxCOLS
    #[arg(long, value_parser = parse_shape)]
    shape: Option<(usize, usize)>,
}

#[derive(Subcommand)]
enum Commands {
    /// Predict a single rating
    Predict {
        #[command(flatten)]
        source: MatrixSource,

        /// TOML file with k, mode and target
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Row (user) of the rating to predict
        #[arg(long)]
        row: Option<usize>,

        /// Column (item) of the rating to predict
        #[arg(long)]
        col: Option<usize>,

        /// Number of neighbours to aggregate
        #[arg(short)]
        k: Option<usize>,

        /// Compare users or items (user-based, item-based)
        #[arg(long, value_parser = parse_mode)]
        mode: Option<Mode>,

        /// Print the result as JSON
        #[arg(long)]
        json: bool,
    },

    /// Predict every unrated cell
    Fill {
        #[command(flatten)]
        source: MatrixSource,

        #[arg(short, default_value = "2")]
        k: usize,

        #[arg(long, value_parser = parse_mode, default_value = "user-based")]
        mode: Mode,

        #[arg(long)]
        json: bool,
    },

    /// Leave-one-out RMSE and MAE over the known ratings
    Evaluate {
        #[command(flatten)]
        source: MatrixSource,

        #[arg(short, default_value = "2")]
        k: usize,

        #[arg(long, value_parser = parse_mode, default_value = "user-based")]
        mode: Mode,

        #[arg(long)]
        json: bool,
    },

    /// Run both embedded walkthroughs
    Demo,
}

fn parse_shape(input: &str) -> std::result::Result<(usize, usize), String> {
    let (rows, cols) = input
        .split_once(['x', 'X'])
        .ok_or_else(|| format!("expected ROWSxCOLS, got '{input}'"))?;
    let rows = rows.trim().parse().map_err(|_| format!("invalid row count '{rows}'"))?;
    let cols = cols.trim().parse().map_err(|_| format!("invalid column count '{cols}'"))?;
    Ok((rows, cols))
}

fn parse_mode(input: &str) -> std::result::Result<Mode, String> {
    input.parse().map_err(|e: knn_cf::CfError| e.to_string())
}

fn init_tracing(verbose: u8) {
    let default_level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt().with_env_filter(filter).with_writer(std::io::stderr).init();
}

fn load_matrix(source: &MatrixSource) -> Result<RatingMatrix> {
    match (&source.matrix, source.example) {
        (Some(path), _) => load_file(path, source.shape),
        (None, Some(Example::Users)) => Ok(datasets::user_based_example()),
        (None, Some(Example::Items)) => Ok(datasets::item_based_example()),
        (None, None) => bail!("either --matrix or --example is required"),
    }
}

fn load_file(path: &Path, shape: Option<(usize, usize)>) -> Result<RatingMatrix> {
    loader::load_path(path, shape).with_context(|| format!("failed to load {}", path.display()))
}

#[allow(clippy::too_many_arguments)]
fn cmd_predict(
    source: &MatrixSource,
    config: Option<&Path>,
    row: Option<usize>,
    col: Option<usize>,
    k: Option<usize>,
    mode: Option<Mode>,
    json: bool,
) -> Result<()> {
    let matrix = load_matrix(source)?;

    let mut config = match config {
        Some(path) => PredictionConfig::from_path(path)
            .with_context(|| format!("failed to read config {}", path.display()))?,
        None => match (row, col) {
            (Some(row), Some(col)) => PredictionConfig::new(TargetCell::new(row, col)),
            _ => bail!("--row and --col are required without --config"),
        },
    };
    if let Some(row) = row {
        config.target.row = row;
    }
    if let Some(col) = col {
        config.target.col = col;
    }
    if let Some(k) = k {
        config.k = k;
    }
    if let Some(mode) = mode {
        config.mode = mode;
    }

    let prediction = engine::run(&matrix, &config)?;

    if json {
        println!("{}", prediction.to_json()?);
    } else {
        println!("{prediction}");
    }
    Ok(())
}

fn cmd_fill(source: &MatrixSource, k: usize, mode: Mode, json: bool) -> Result<()> {
    let matrix = load_matrix(source)?;
    let predictions = engine::predict_missing(&matrix, k, mode)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&predictions)?);
        return Ok(());
    }

    for prediction in &predictions {
        match &prediction.outcome {
            CellOutcome::Predicted { rating } => {
                println!("({}, {}) -> {rating:.4}", prediction.row, prediction.col)
            }
            CellOutcome::Failed { stage, reason } => {
                println!("({}, {}) -> no prediction ({stage}: {reason})", prediction.row, prediction.col)
            }
        }
    }
    Ok(())
}

fn cmd_evaluate(source: &MatrixSource, k: usize, mode: Mode, json: bool) -> Result<()> {
    let matrix = load_matrix(source)?;
    let report = leave_one_out(&matrix, k, mode)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("{report}");
    }
    Ok(())
}

fn cmd_demo() -> Result<()> {
    let walkthroughs = [
        ("User-based", datasets::user_based_example(), TargetCell::new(0, 3), Mode::UserBased),
        ("Item-based", datasets::item_based_example(), TargetCell::new(2, 3), Mode::ItemBased),
    ];

    for (title, matrix, target, mode) in walkthroughs {
        println!("{title} collaborative filtering");
        println!("{matrix}");

        let config = PredictionConfig::new(target).with_mode(mode);
        let prediction = engine::run(&matrix, &config)?;
        println!("{prediction}\n");
    }
    Ok(())
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let result = match &cli.command {
        Commands::Predict { source, config, row, col, k, mode, json } => {
            cmd_predict(source, config.as_deref(), *row, *col, *k, *mode, *json)
        }
        Commands::Fill { source, k, mode, json } => cmd_fill(source, *k, *mode, *json),
        Commands::Evaluate { source, k, mode, json } => cmd_evaluate(source, *k, *mode, *json),
        Commands::Demo => cmd_demo(),
    };

    if let Err(e) = result {
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }
}
