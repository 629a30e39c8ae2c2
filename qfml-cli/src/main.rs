#[cfg(not(target_env = "msvc"))]
use tikv_jemallocator::Jemalloc;

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: Jemalloc = Jemalloc;

use std::process::ExitCode;

use atty::Stream;
use clap::Parser;
use cli::Cli;
use human_panic::setup_panic;
use lazy_static::lazy_static;

use crate::logging::init_logging;
use crate::opts::OpenInputError;
use crate::progress_bar::LoadProgressBar;

mod cli;
mod dump;
mod load;
mod logging;
mod opts;
mod progress_bar;

/// Exit status when an input file cannot be opened.
const EXIT_OPEN_FAILURE: u8 = 2;
/// Exit status for every other fatal condition.
const EXIT_FAILURE: u8 = 1;

lazy_static! {
    pub(crate) static ref PROGRESS_BAR: LoadProgressBar = LoadProgressBar::new();
}

fn main() -> ExitCode {
    setup_panic!();

    let cli: Cli = Cli::parse();

    if !cli.no_progress && atty::is(Stream::Stderr) {
        PROGRESS_BAR.show();
    }

    init_logging(cli.verbose.log_level_filter()).expect("Could not initialize logging");

    let result = load::load(&cli);
    PROGRESS_BAR.finish();

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {:?}", e);
            if e.downcast_ref::<OpenInputError>().is_some() {
                ExitCode::from(EXIT_OPEN_FAILURE)
            } else {
                ExitCode::from(EXIT_FAILURE)
            }
        }
    }
}
