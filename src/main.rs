use std::process::ExitCode;

use env_logger::Env;

fn main() -> ExitCode {
    // RUST_LOG overrides the default level.
    env_logger::Builder::from_env(Env::default().default_filter_or("warn")).init();

    match dataset_fetch::run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("Error: {err}");
            ExitCode::FAILURE
        }
    }
}
