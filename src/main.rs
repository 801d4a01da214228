use fmt_kindle_notes::app;
use fmt_kindle_notes::config::{Config, ConfigError};
use log::LevelFilter;
use std::io::Write;

fn main() {
    let config = match Config::load() {
        Ok(c) => c,
        Err(ConfigError::Help(msg)) => {
            println!("{}", msg.trim_end());
            std::process::exit(0);
        }
        Err(e) => {
            eprintln!("{}", e);
            std::process::exit(1);
        }
    };

    init_logging(config.verbose);

    if let Err(e) = app::run(&config) {
        eprintln!("{}", e);
        std::process::exit(2);
    }
}

/// Diagnostics go to stdout as "> message", and only with --verbose.
fn init_logging(verbose: bool) {
    let mut builder = env_logger::Builder::new();
    builder
        .target(env_logger::Target::Stdout)
        .format(|buf, record| writeln!(buf, "> {}", record.args()));
    if verbose {
        builder.filter_module("fmt_kindle_notes", LevelFilter::Debug);
    } else {
        builder.filter_level(LevelFilter::Off);
    }
    builder.init();
}
