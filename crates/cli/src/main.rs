use std::process::ExitCode;

fn main() -> ExitCode {
    stafflow_cli::run()
}
