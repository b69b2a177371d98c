mod app;

use std::env;
use std::process::ExitCode;

use tracing::error;

use app::bootstrap::{self, LaunchArgs};

fn main() -> ExitCode {
    let launch = match bootstrap::parse_args(env::args().skip(1)) {
        Ok(LaunchArgs::Help) => {
            println!("{}", bootstrap::usage_text());
            return ExitCode::SUCCESS;
        }
        Ok(LaunchArgs::Run(launch)) => launch,
        Err(message) => {
            eprintln!("{message}\n\n{}", bootstrap::usage_text());
            return ExitCode::from(2);
        }
    };

    match bootstrap::build_app(launch) {
        Ok(app) => app::loop_runner::run(app),
        Err(err) => {
            error!(error = %err, "startup_failed");
            ExitCode::FAILURE
        }
    }
}
