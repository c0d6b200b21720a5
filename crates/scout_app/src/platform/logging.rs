//! Platform logging initialization for scout_app.
//!
//! Logs always go to the terminal; a file sink is added when a path is
//! given. The level can be overridden with the `SCOUT_LOG` environment
//! variable (error/warn/info/debug/trace).

use std::fs::File;
use std::path::Path;

use log::LevelFilter;
use simplelog::{
    ColorChoice, CombinedLogger, ConfigBuilder, SharedLogger, TermLogger, TerminalMode, WriteLogger,
};

pub fn initialize(log_file: Option<&Path>) {
    let level = std::env::var("SCOUT_LOG")
        .ok()
        .and_then(|value| value.parse::<LevelFilter>().ok())
        .unwrap_or(LevelFilter::Info);

    let config = ConfigBuilder::new()
        .set_time_format_rfc3339()
        .set_target_level(LevelFilter::Error)
        .build();

    let mut loggers: Vec<Box<dyn SharedLogger>> = vec![TermLogger::new(
        level,
        config.clone(),
        TerminalMode::Stderr,
        ColorChoice::Auto,
    )];

    if let Some(path) = log_file {
        match File::create(path) {
            Ok(file) => loggers.push(WriteLogger::new(level, config, file)),
            Err(err) => {
                eprintln!("warning: could not create log file at {path:?}: {err}");
            }
        }
    }

    let _ = CombinedLogger::init(loggers);
}
