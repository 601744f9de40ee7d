use std::{env, fs, io, process::ExitCode, time};

use tracing::info;
use tracing_subscriber::{filter::LevelFilter, fmt::Layer, prelude::*, EnvFilter};
use treelox::rt::{Mode, TreeWalker};

/// EX_USAGE
const USAGE_ERROR: u8 = 64;
/// EX_NOINPUT
const UNREADABLE_SCRIPT: u8 = 66;

fn main() -> ExitCode {
    init_logging();

    // Skip the program name
    let mut args = env::args().skip(1);
    let (Some(file_name), None) = (args.next(), args.next()) else {
        eprintln!("Usage: file <script>");
        return ExitCode::from(USAGE_ERROR);
    };

    let source = match fs::read_to_string(&file_name) {
        Ok(source) => source,
        Err(error) => {
            eprintln!("Failed to read \"{file_name}\": {error}");
            return ExitCode::from(UNREADABLE_SCRIPT);
        }
    };

    let start = time::Instant::now();
    let mut walker = TreeWalker::new(io::stdout().lock(), Mode::Script);
    let result = treelox::run(&source, &mut walker);
    info!(elapsed = ?start.elapsed(), script = %file_name, "finished running");

    match result {
        Ok(_) => ExitCode::SUCCESS,
        Err(error) => {
            eprintln!("{}", error.to_string().trim_end());
            ExitCode::from(error.exit_code())
        }
    }
}

fn init_logging() {
    tracing_subscriber::registry()
        .with(
            Layer::new().with_writer(io::stderr).with_filter(
                EnvFilter::builder()
                    .with_default_directive(LevelFilter::WARN.into())
                    .from_env_lossy(),
            ),
        )
        .init();
}
