use anyhow::Result;
use clap::Parser;
use std::io::{IsTerminal, Write};

use pyz_cli::args::CliArgs;
use pyz_cli::{driver, tracing_config};

fn main() -> Result<()> {
    // PYZ_LOG / RUST_LOG turn logging on; PYZ_LOG_FORMAT=tree|json|text.
    tracing_config::init_tracing();

    let args = CliArgs::parse();
    let stdout = std::io::stdout();
    let color = driver::color_enabled(&args, stdout.is_terminal());

    let mut out = stdout.lock();
    driver::run(&args, color, &mut out)?;
    out.flush()?;
    Ok(())
}
