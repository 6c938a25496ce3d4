use std::process::ExitCode;

use cubeview::{AppConfig, run_with_config};

fn main() -> ExitCode {
    env_logger::init();

    let config = match std::env::args_os().nth(1) {
        Some(path) => match AppConfig::load(&path) {
            Ok(config) => config,
            Err(err) => {
                log::error!("failed to read {}: {err}", path.to_string_lossy());
                return ExitCode::FAILURE;
            }
        },
        None => AppConfig::default(),
    };

    match run_with_config(config) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("cubeview: {err}");
            ExitCode::FAILURE
        }
    }
}
