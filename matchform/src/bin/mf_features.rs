use std::env;
use std::error::Error;
use std::path::PathBuf;

use anyhow::bail;
use clap::Parser;
use tracing::{debug, info};

use matchform::csv::CsvWriter;
use matchform::file::ReadJsonFile;
use matchform::pipeline::{Config, Pipeline};

#[derive(Debug, clap::Parser, Clone)]
struct Args {
    /// CSV file of match results
    file: PathBuf,

    /// JSON config file; defaults apply to anything it omits
    #[clap(short = 'c', long)]
    config: Option<PathBuf>,

    /// where to write the feature table
    #[clap(short = 'o', long, default_value = "features.csv")]
    out: PathBuf,

    /// only write fixtures involving this team
    #[clap(short = 't', long)]
    team: Option<String>,
}
impl Args {
    fn validate(&self) -> anyhow::Result<()> {
        if self.file == self.out {
            bail!("the feature table would overwrite the input file");
        }
        Ok(())
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
    let config = match &args.config {
        None => Config::default(),
        Some(path) => Config::read_json_file(path)?,
    };
    let pipeline = Pipeline::try_from(config)?;

    let normalised = pipeline.read_csv(&args.file)?;
    let dataset = pipeline.features(&normalised.records)?;

    let mut writer = CsvWriter::create(&args.out)?;
    let mut header = vec!["Date", "Season", "Home", "Away", "Outcome"];
    header.extend(dataset.schema.columns().iter().map(String::as_str));
    writer.append(&header)?;

    let mut written = 0;
    for row in &dataset.rows {
        if let Some(team) = &args.team {
            if row.record.side_of(team).is_none() {
                continue;
            }
        }
        let features = dataset.schema.encode(&row.record, &row.numeric());
        let mut cells = vec![
            row.record.date.to_string(),
            row.season().to_string(),
            row.record.home_team.clone(),
            row.record.away_team.clone(),
            row.outcome().to_string(),
        ];
        cells.extend(features.iter().map(ToString::to_string));
        writer.append(&cells)?;
        written += 1;
    }
    writer.flush()?;
    info!(
        "wrote {written} rows of {} columns to {}",
        header.len(),
        args.out.display()
    );
    Ok(())
}
