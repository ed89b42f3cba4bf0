extern crate asset_collector;

use asset_collector::{app, cli::Args};
use clap::Parser;

#[tokio::main]
async fn main() {
    dotenv::dotenv().ok();
    let args = Args::parse_from(std::env::args());
    let filter = if args.debug {
        "debug".to_string()
    } else {
        args.log.clone()
    };
    let subscriber = tracing_subscriber::FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_ansi(false)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber).expect("setting default subscriber failed");

    let debug = args.debug;
    if let Err(err) = app::run(args).await {
        if debug {
            eprintln!("Error: {err:?}");
        } else {
            eprintln!("Error: {err:#}");
        }
        std::process::exit(1);
    }
}
