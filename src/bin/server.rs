//! undox server binary: streaming proxy, config and wallet endpoints.
//! Run with: cargo run --bin undox-server

use std::process::ExitCode;

use undox::start_undox;

fn main() -> ExitCode {
    start_undox::run()
}
