use clap::Parser;
use miette::Result;
use pnmap::Cli;

#[tokio::main]
async fn main() -> Result<()> {
    let args = Cli::parse();

    env_logger::Builder::new()
        .filter_level(args.verbose.log_level_filter())
        .init();

    log::debug!("pnmap {}", pnmap::VERSION);
    pnmap::run(args).await
}
