use clap::Parser;
use hmatch_cli::hmatch_core::init_thread_pool;
use hmatch_cli::{
    draw_results, format_report, load_gray_image, write_json, BenchConfig, BenchmarkRunner,
    CliResult, Homography, ImagePair,
};
use log::{info, LevelFilter};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "hmatch")]
#[command(about = "Compare feature detector/descriptor pipelines on an image pair with known homography")]
#[command(version)]
struct Cli {
    /// First image; the homography maps it onto the second
    #[arg(long)]
    left: PathBuf,

    /// Second image
    #[arg(long)]
    right: PathBuf,

    /// Ground-truth homography: nine row-major numbers
    #[arg(long)]
    homography: PathBuf,

    /// Pipelines and evaluation settings (.toml or .json)
    #[arg(long)]
    config: Option<PathBuf>,

    /// NNDR ratio applied to every pipeline without its own
    #[arg(long)]
    ratio: Option<f32>,

    /// Inlier reprojection threshold in pixels
    #[arg(long)]
    inlier_threshold: Option<f64>,

    /// Run pipelines one after another
    #[arg(long)]
    sequential: bool,

    /// Worker threads (defaults to the number of CPUs)
    #[arg(long)]
    threads: Option<usize>,

    /// Write results as JSON
    #[arg(long)]
    json: Option<PathBuf>,

    /// Directory for one match visualisation per pipeline
    #[arg(long)]
    draw: Option<PathBuf>,

    /// More log output (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn load_config(cli: &Cli) -> CliResult<BenchConfig> {
    let mut config = match &cli.config {
        Some(path) => BenchConfig::load(path)?,
        None => BenchConfig::default(),
    };
    if let Some(ratio) = cli.ratio {
        config.evaluation.nndr_ratio = ratio;
    }
    if let Some(threshold) = cli.inlier_threshold {
        config.evaluation.inlier_threshold = threshold;
    }
    if cli.sequential {
        config.evaluation.parallel = false;
    }
    if let Some(threads) = cli.threads {
        config.evaluation.n_threads = threads;
    }
    config.validate()?;
    Ok(config)
}

fn main() -> CliResult<()> {
    let cli = Cli::parse();

    let level = match cli.verbose {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        2 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    };
    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .init();

    // every input is checked before any pipeline runs
    let config = load_config(&cli)?;
    let homography = Homography::load(&cli.homography)?;
    let images = ImagePair::new(load_gray_image(&cli.left)?, load_gray_image(&cli.right)?);
    info!(
        "left {}x{}, right {}x{}",
        images.left.width(),
        images.left.height(),
        images.right.width(),
        images.right.height()
    );

    init_thread_pool(config.evaluation.n_threads)?;
    let runner = BenchmarkRunner::from_config(&config)?;
    let results = runner.run(&images, &homography);

    print!("{}", format_report(&results));

    if let Some(path) = &cli.json {
        write_json(path, &results)?;
        println!("Wrote results to {}", path.display());
    }
    if let Some(dir) = &cli.draw {
        for path in draw_results(dir, &images, &results)? {
            println!("Wrote {}", path.display());
        }
    }

    Ok(())
}
