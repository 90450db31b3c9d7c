use std::process::ExitCode;

fn main() -> ExitCode {
    lu::cli::run(std::env::args_os())
}
