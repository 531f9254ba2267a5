//! Binary entrypoint for the sourcing HTTP server.

use std::process::ExitCode;

use sourcing_engine::start_sourcing;

fn main() -> ExitCode {
    start_sourcing::run()
}
