use std::io;

use rustyline::error::ReadlineError;
use tracing_subscriber::{filter::LevelFilter, fmt::Layer, prelude::*, EnvFilter};
use treelox::rt::{Mode, TreeWalker};

fn main() -> Result<(), ReadlineError> {
    init_logging();

    let mut rl = rustyline::DefaultEditor::new()?;
    // One session for the whole prompt so globals survive between lines
    let mut walker = TreeWalker::new(io::stdout(), Mode::Interactive);

    loop {
        match rl.readline(">> ") {
            Ok(line) if line.trim() == "exit" => break,
            Ok(line) => {
                rl.add_history_entry(line.as_str())?;

                if let Err(error) = treelox::run(&line, &mut walker) {
                    eprintln!("{}", error.to_string().trim_end());
                }
            }
            Err(ReadlineError::Interrupted | ReadlineError::Eof) => break,
            Err(error) => return Err(error),
        }
    }

    println!("Goodbye!");
    Ok(())
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
