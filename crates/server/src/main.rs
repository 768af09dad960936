//! versantd, the Versant server binary.
//!
//! Binds a listener, serves one thread per client connection, and shuts
//! down cleanly on SIGHUP: half-close every client, wait for the service
//! threads to unwind, finalize the store and transaction manager, exit 0.

use std::process;

use clap::{value_parser, Arg, ArgAction, Command};
use signal_hook::consts::SIGHUP;
use signal_hook::iterator::Signals;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use versant_server::Server;

fn build_cli() -> Command {
    Command::new("versantd")
        .about("Concurrent multi-version transactional in-memory key/value store")
        .arg(
            Arg::new("port")
                .short('p')
                .long("port")
                .required(true)
                .value_parser(value_parser!(u16))
                .help("Port to listen on"),
        )
        .arg(
            Arg::new("host")
                .short('H')
                .long("host")
                .default_value("0.0.0.0")
                .help("Address to bind"),
        )
        .arg(
            Arg::new("quiet")
                .short('q')
                .long("quiet")
                .action(ArgAction::SetTrue)
                .help("Log warnings and errors only"),
        )
}

fn init_tracing(quiet: bool) {
    let default = if quiet { "warn" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

/// A panicking service thread means a broken internal contract; the
/// process must not keep running half-dead.
fn install_panic_hook() {
    let default = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        default(info);
        error!("fatal internal error, terminating");
        process::exit(70);
    }));
}

fn main() {
    let matches = build_cli().get_matches();
    init_tracing(matches.get_flag("quiet"));
    install_panic_hook();

    let port = *matches.get_one::<u16>("port").expect("port is required");
    let host = matches
        .get_one::<String>("host")
        .expect("host has a default")
        .clone();

    let server = match Server::bind(&host, port) {
        Ok(server) => server,
        Err(err) => {
            error!(%err, host, port, "failed to bind listener");
            process::exit(1);
        }
    };

    let handle = match server.spawn() {
        Ok(handle) => handle,
        Err(err) => {
            error!(%err, "failed to start accept loop");
            process::exit(1);
        }
    };

    let mut signals = match Signals::new([SIGHUP]) {
        Ok(signals) => signals,
        Err(err) => {
            error!(%err, "failed to install signal handler");
            process::exit(1);
        }
    };

    for signal in signals.forever() {
        if signal == SIGHUP {
            info!("SIGHUP received, starting graceful shutdown");
            handle.shutdown();
            process::exit(0);
        }
    }
}
