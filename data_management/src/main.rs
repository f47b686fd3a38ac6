use std::path::PathBuf;

use clap::{Parser, Subcommand};
use data_management::{
    gpx_util::read_gpx,
    replay::{open_session, replay},
};
use distance_tracker_lib::{file_store::FileDistanceStore, status::Locale};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "DistanceCLI")]
#[command(about = "Replay GPX tracks and manage the saved total distance", long_about = None)]
struct Cli {
    /// JSON file holding the running total
    #[arg(long, global = true, default_value = "data/total_distance.json")]
    store: PathBuf,
    /// Language tag for status lines, e.g. zh-TW
    #[arg(long, global = true, default_value = "en")]
    lang: String,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Feed a GPX track through a tracking session and add it to the total
    Replay { gpx_file: PathBuf },
    /// Print the saved total
    Show,
    /// Set the saved total back to zero
    Reset,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| format!("{}=info,distance_tracker_lib=info", env!("CARGO_CRATE_NAME")).into())
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let locale = Locale::from_language_tag(&cli.lang);
    let mut session = open_session(FileDistanceStore::new(&cli.store), locale);

    match &cli.command {
        Commands::Replay { gpx_file } => {
            let segments = read_gpx(gpx_file)?;
            let summary = replay(&mut session, &segments)?;
            let points: usize = segments.iter().map(Vec::len).sum();
            println!("Added {:.3} km over {} points in {} segments", summary.added_km, points, segments.len());
            println!("Total: {:.3} km", summary.total_km);
        }
        Commands::Show => {
            println!("Total: {} km", session.snapshot().distance_label());
        }
        Commands::Reset => {
            session.reset();
        }
    }

    Ok(())
}
