use anyhow::Result;
use clap::Parser;
use graminscore::{cli, util};
use tracing::error;

fn main() -> Result<()> {
    util::capture_local_offset();
    let args = cli::Args::parse();
    if let Err(err) = cli::dispatch(args) {
        error!("{:#}", err);
        std::process::exit(1);
    }
    Ok(())
}
