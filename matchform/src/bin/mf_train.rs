use std::env;
use std::error::Error;
use std::path::PathBuf;

use anyhow::bail;
use clap::Parser;
use stanza::renderer::console::Console;
use stanza::renderer::Renderer;
use tracing::{debug, info};

use matchform::file::ReadJsonFile;
use matchform::pipeline::{Config, Pipeline};
use matchform::print;
use matchform::season::SeasonId;

#[derive(Debug, clap::Parser, Clone)]
struct Args {
    /// CSV file of match results
    file: PathBuf,

    /// JSON config file; defaults apply to anything it omits
    #[clap(short = 'c', long)]
    config: Option<PathBuf>,

    /// where to write the model artifact
    #[clap(short = 'o', long, default_value = "model.json")]
    out: PathBuf,

    /// last training season; the following season is used for evaluation
    #[clap(long)]
    cutoff: Option<SeasonId>,

    /// forest seed
    #[clap(long)]
    seed: Option<u64>,

    /// number of cross-validation folds
    #[clap(long)]
    folds: Option<usize>,
}
impl Args {
    fn validate(&self) -> anyhow::Result<()> {
        if self.file == self.out {
            bail!("the artifact would overwrite the input file");
        }
        Ok(())
    }

    fn config(&self) -> anyhow::Result<Config> {
        let mut config = match &self.config {
            None => Config::default(),
            Some(path) => Config::read_json_file(path)?,
        };
        if let Some(cutoff) = self.cutoff {
            config.split.cutoff = Some(cutoff);
        }
        if let Some(seed) = self.seed {
            config.forest.seed = seed;
        }
        if let Some(folds) = self.folds {
            config.grid.folds = folds;
        }
        Ok(config)
    }
}

fn main() -> Result<(), Box<dyn Error>> {
    if env::var("RUST_BACKTRACE").is_err() {
        env::set_var("RUST_BACKTRACE", "full")
    }
    if env::var("RUST_LOG").is_err() {
        env::set_var("RUST_LOG", "info")
    }
    tracing_subscriber::fmt::init();

    let args = Args::parse();
    args.validate()?;
    debug!("args: {args:?}");
    let config = args.config()?;
    debug!("config: {config:?}");
    let pipeline = Pipeline::try_from(config)?;

    let normalised = pipeline.read_csv(&args.file)?;
    if !normalised.rejections.is_empty() {
        let table = print::tabulate_rejections(&normalised.rejection_counts());
        info!("rejected rows:\n{}", Console::default().render(&table));
    }

    let trained = pipeline.train(&normalised.records)?;
    let artifact = &trained.artifact;
    info!(
        "trained on {} rows, tested on {} rows, {} cold starts dropped",
        trained.train_rows, trained.test_rows, trained.cold_starts
    );
    {
        let table = print::tabulate_scores(&artifact.scores, &artifact.config);
        info!("cross-validation:\n{}", Console::default().render(&table));
    }
    if let Some(evaluation) = &artifact.evaluation {
        let table = print::tabulate_confusion(&evaluation.confusion);
        info!(
            "test accuracy {:.4}; predicted across, actual down:\n{}",
            evaluation.accuracy,
            Console::default().render(&table)
        );
    }

    artifact.save(&args.out)?;
    info!("saved model to {}", args.out.display());
    Ok(())
}
