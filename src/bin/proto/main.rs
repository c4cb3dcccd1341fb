//! proto - run a built-in patch against the default audio device
//!
//! Run with: cargo run -- --patch vco

mod app;
mod ui;

use std::{fs::File, path::PathBuf};

use clap::Parser;
use color_eyre::eyre::{eyre, Result as EyreResult, WrapErr};
use saavy_proto::patches;

use app::Proto;

#[derive(Debug, Parser)]
#[command(name = "proto", about = "Six-row patch host")]
struct Args {
    /// Built-in patch to load
    #[arg(short, long, default_value = "vco")]
    patch: String,

    /// Override the patch's frame divider
    #[arg(long)]
    frame_divider: Option<u32>,

    /// Override the patch's buffer size
    #[arg(long)]
    buffer_size: Option<usize>,

    /// Feed inputs from the default capture device
    #[arg(long)]
    input: bool,

    /// Write logs here instead of stderr (which the TUI covers)
    #[arg(long)]
    log_file: Option<PathBuf>,
}

fn main() -> EyreResult<()> {
    color_eyre::install()?;
    let args = Args::parse();
    init_logging(args.log_file.as_ref())?;

    let processor = patches::by_name(&args.patch).ok_or_else(|| {
        eyre!(
            "unknown patch '{}' (available: {})",
            args.patch,
            patches::NAMES.join(", ")
        )
    })?;

    Proto::new(processor)
        .frame_divider(args.frame_divider)
        .buffer_size(args.buffer_size)
        .capture_input(args.input)
        .run()
}

fn init_logging(log_file: Option<&PathBuf>) -> EyreResult<()> {
    let mut builder =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn"));
    if let Some(path) = log_file {
        let file = File::create(path)
            .wrap_err_with(|| format!("failed to create log file {}", path.display()))?;
        builder.target(env_logger::Target::Pipe(Box::new(file)));
    }
    builder.init();
    Ok(())
}
