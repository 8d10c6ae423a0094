use std::env;
use std::error::Error;
use std::path::PathBuf;

use anyhow::bail;
use clap::Parser;
use stanza::renderer::console::Console;
use stanza::renderer::Renderer;
use tracing::{debug, info};

use matchform::artifact::ModelArtifact;
use matchform::forest::Forest;
use matchform::predict::{parse_assignment, parse_features, Predictor};
use matchform::print;
use matchform::schema::SparseFeatures;

#[derive(Debug, clap::Parser, Clone)]
struct Args {
    /// model artifact produced by mf_train
    #[clap(short = 'm', long, default_value = "model.json")]
    model: PathBuf,

    /// JSON file holding an object of column to value
    #[clap(short = 'f', long)]
    features: Option<PathBuf>,

    /// a single column=value assignment; may be repeated
    #[clap(short = 's', long = "set")]
    set: Vec<String>,

    /// list the schema's columns and exit
    #[clap(long)]
    columns: bool,
}
impl Args {
    fn validate(&self) -> anyhow::Result<()> {
        if !self.columns && self.features.is_none() && self.set.is_empty() {
            bail!("either the -f or the -s flag must be specified");
        }
        Ok(())
    }

    fn features(&self) -> anyhow::Result<SparseFeatures> {
        let mut features = match &self.features {
            None => SparseFeatures::new(),
            Some(path) => parse_features(&std::fs::read_to_string(path)?)?,
        };
        for assignment in &self.set {
            let (column, value) = parse_assignment(assignment)?;
            features.insert(column, value);
        }
        Ok(features)
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

    let artifact = ModelArtifact::load(&args.model)?;
    info!(
        "loaded {} trained through season {}",
        artifact.config, artifact.cutoff
    );
    let predictor = Predictor::<Forest>::try_from(artifact)?;
    if args.columns {
        for column in predictor.schema().columns() {
            println!("{column}");
        }
        return Ok(());
    }

    let features = args.features()?;
    let prediction = predictor.predict(&features);
    let table = print::tabulate_prediction(&prediction);
    info!("prediction:\n{}", Console::default().render(&table));
    println!("{}", serde_json::to_string_pretty(&prediction)?);
    Ok(())
}
