use std::io;
use std::process::ExitCode;

use clap::Parser;
use tracing::error;
use tracing_subscriber::EnvFilter;

use ripple_core::{FastRwLock, OptimisticFeed};
use ripple_server::protocol::ResponseWriter;
use ripple_server::runtime::{self, ServerConfig};

/// Concurrent request server over a shared timestamp-sorted feed.
///
/// Reads JSON request records from stdin and writes response records to
/// stdout until a DONE record arrives.
#[derive(Parser)]
#[command(name = "ripple-server", version)]
struct Args {
    /// Number of worker threads; 1 runs the server sequentially
    #[arg(default_value_t = 1)]
    workers: usize,
}

fn main() -> ExitCode {
    // Responses go to stdout; everything else goes to stderr.
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with_writer(io::stderr)
        .init();

    let args = Args::parse();

    let feed: OptimisticFeed<FastRwLock> = OptimisticFeed::new();
    let config = ServerConfig {
        workers: args.workers.max(1),
    };
    let output = ResponseWriter::new(io::stdout());

    match runtime::run(&feed, &config, io::stdin().lock(), &output) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("server terminated: {err}");
            ExitCode::FAILURE
        }
    }
}
