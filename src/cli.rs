use crate::config::types::{InvocationRequest, LauncherError, Result};
use crate::exec::executor::LaunchExecutor;
use clap::error::ErrorKind;
use clap::{CommandFactory, Parser};
use std::ffi::OsString;
use std::process::ExitCode;

#[derive(Parser, Debug)]
#[command(
    name = "lu",
    about = "Set the audit login identity and run a command, optionally as that user",
    disable_version_flag = true,
    args_override_self = true
)]
struct Cli {
    /// Username to execute as
    #[arg(short, long, value_name = "USERNAME", allow_hyphen_values = true)]
    user: String,
    /// Set privileges: assume the user's groups, gid and uid before exec
    #[arg(short, long)]
    setprivs: bool,
    /// Trace each launch step on stderr
    #[arg(short, long)]
    verbose: bool,
    /// Command to run, followed by its arguments
    #[arg(required = true, num_args = 1.., trailing_var_arg = true, value_name = "COMMAND")]
    command: Vec<OsString>,
}

/// Outcome of argument parsing.
#[derive(Debug, PartialEq, Eq)]
pub enum Parsed {
    /// `--help` was given; print this and exit 0.
    Help(String),
    Run {
        request: InvocationRequest,
        verbose: bool,
    },
}

pub fn usage() -> String {
    Cli::command().render_help().to_string()
}

/// Parse a full argv (program name first).
pub fn parse_args<I, T>(args: I) -> Result<Parsed>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString>,
{
    let args: Vec<OsString> = args.into_iter().map(Into::into).collect();
    if help_requested(&args) {
        return Ok(Parsed::Help(usage()));
    }

    let cli = match Cli::try_parse_from(&args) {
        Ok(cli) => cli,
        Err(e) if e.kind() == ErrorKind::DisplayHelp => return Ok(Parsed::Help(usage())),
        Err(e) => return Err(LauncherError::Usage(e.render().to_string())),
    };

    let mut command = cli.command.into_iter();
    let program = command
        .next()
        .ok_or_else(|| LauncherError::Usage(format!("must supply command to run\n\n{}", usage())))?;

    Ok(Parsed::Run {
        request: InvocationRequest {
            username: cli.user,
            set_privileges: cli.setprivs,
            command: program,
            args: command.collect(),
        },
        verbose: cli.verbose,
    })
}

/// Scan the option region (everything before the command) for `-h/--help`.
///
/// Runs ahead of clap so help wins over any other option error. A `--help`
/// after the command starts belongs to the command.
fn help_requested(args: &[OsString]) -> bool {
    let mut iter = args.iter().skip(1);
    while let Some(arg) = iter.next() {
        let Some(arg) = arg.to_str() else {
            return false;
        };
        match arg {
            "-h" | "--help" => return true,
            "--" => return false,
            "-u" | "--user" => {
                iter.next();
            }
            long if long.starts_with("--") => {}
            short if short.starts_with('-') && short.len() > 1 => {
                let flags = &short[1..];
                for (idx, flag) in flags.char_indices() {
                    match flag {
                        'h' => return true,
                        'u' => {
                            // Value is the rest of the cluster, or the next argument.
                            if idx + 1 == flags.len() {
                                iter.next();
                            }
                            break;
                        }
                        _ => {}
                    }
                }
            }
            _ => return false,
        }
    }
    false
}

fn init_logging(verbose: bool) {
    let level = if verbose {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Warn
    };

    // Built by hand so no environment variable is consulted.
    let _ = env_logger::Builder::new()
        .filter_level(level)
        .format_timestamp(None)
        .format_target(false)
        .target(env_logger::Target::Stderr)
        .try_init();
}

fn exit_code(err: &LauncherError) -> ExitCode {
    ExitCode::from(u8::try_from(err.exit_code()).unwrap_or(1))
}

pub fn run<I, T>(args: I) -> ExitCode
where
    I: IntoIterator<Item = T>,
    T: Into<OsString>,
{
    let (request, verbose) = match parse_args(args) {
        Ok(Parsed::Help(text)) => {
            print!("{}", text);
            return ExitCode::SUCCESS;
        }
        Ok(Parsed::Run { request, verbose }) => (request, verbose),
        Err(e) => {
            eprint!("{}", e);
            return exit_code(&e);
        }
    };

    init_logging(verbose);

    let err = LaunchExecutor::new().run(request);
    eprintln!("lu: {}", err);
    exit_code(&err)
}
