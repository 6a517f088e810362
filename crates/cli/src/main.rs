use std::process::ExitCode;

fn main() -> ExitCode {
    replen_cli::run()
}
