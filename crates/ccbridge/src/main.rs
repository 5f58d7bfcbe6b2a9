mod exit;
mod logging;

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::PathBuf;

use ccbridge::{BridgeServer, ConsoleProfile, SimulatedConsole};
use clap::Parser;
use tracing::info;

use crate::exit::{profile_error, session_error, CliResult, SUCCESS, USAGE};
use crate::logging::{init_logging, LogFormat, LogLevel};

#[derive(Parser, Debug)]
#[command(
    name = "ccbridge",
    version,
    about = "Serve a console control capability to one controller over TCP"
)]
struct Cli {
    /// TCP port to listen on (1-65535).
    #[arg(value_name = "PORT", value_parser = clap::value_parser!(u16).range(1..))]
    port: u16,

    /// Address to listen on.
    #[arg(long, value_name = "IP", default_value_t = IpAddr::V4(Ipv4Addr::LOCALHOST))]
    bind: IpAddr,

    /// JSON profile describing the simulated console.
    #[arg(long, value_name = "FILE")]
    profile: Option<PathBuf>,

    /// Log output format (stderr).
    #[arg(long, value_name = "FORMAT", default_value = "text")]
    log_format: LogFormat,

    /// Minimum log level (stderr).
    #[arg(long, value_name = "LEVEL", default_value = "info")]
    log_level: LogLevel,
}

fn main() {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) => {
            let _ = err.print();
            let code = if err.use_stderr() { USAGE } else { SUCCESS };
            std::process::exit(code);
        }
    };
    init_logging(cli.log_format, cli.log_level);

    match run(cli) {
        Ok(code) => std::process::exit(code),
        Err(err) => {
            eprintln!("error: {err}");
            std::process::exit(err.code);
        }
    }
}

fn run(cli: Cli) -> CliResult<i32> {
    let profile = match &cli.profile {
        Some(path) => ConsoleProfile::from_file(path).map_err(|err| profile_error(path, err))?,
        None => ConsoleProfile::default(),
    };
    let console = SimulatedConsole::new(profile);

    let server = BridgeServer::bind(SocketAddr::new(cli.bind, cli.port))
        .map_err(|err| session_error("bind failed", err))?;
    info!(addr = %server.local_addr(), "waiting for controller");

    let report = server
        .serve_one(console)
        .map_err(|err| session_error("connection failed", err))?;
    info!(
        peer = %report.peer,
        exit = ?report.exit,
        commands = report.commands,
        "bridge finished"
    );

    Ok(SUCCESS)
}
