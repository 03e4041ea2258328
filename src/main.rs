//! DLC test requester CLI
//!
//! Entry point for the `dlc-requester` command-line tool.

use clap::{Parser, Subcommand};
use dlc_test_requester::config::REPO_CONFIG_PATH;
use dlc_test_requester::{
    BuildContext, FsObjectStore, JobRequester, RequesterConfig, StatusReply, TicketHandle,
};
use serde_json::{json, Value};
use std::fs;
use std::path::{Path, PathBuf};
use std::process;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "dlc-requester")]
#[command(about = "Submit and track DLC test tickets", version)]
struct Cli {
    /// Path to repo config file (default: .dlc/requester.toml)
    #[arg(long, short = 'c', global = true)]
    config: Option<PathBuf>,

    /// Directory holding the ticket buckets
    #[arg(long, global = true)]
    store_root: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Submit a test request for an image
    Submit {
        /// Image URI to test
        #[arg(long)]
        image: String,

        /// Build context (pr, mainline, nightly, dev)
        #[arg(long, default_value = "pr")]
        context: BuildContext,

        /// Number of instances the test needs
        #[arg(long, default_value_t = 1)]
        instances: u32,

        /// Timeout in seconds (capped at 14400)
        #[arg(long)]
        timeout: Option<u64>,

        /// Write the request handle to this file
        #[arg(long)]
        handle_out: Option<PathBuf>,
    },

    /// Show the status of a submitted request
    Status {
        /// Handle file written by `submit`
        handle: PathBuf,

        /// Number of lookups before giving up
        #[arg(long)]
        attempts: Option<u32>,

        /// Output in JSON format
        #[arg(long)]
        json: bool,
    },

    /// Cancel a request that has not started yet
    Cancel {
        /// Handle file written by `submit`
        handle: PathBuf,

        /// Output in JSON format
        #[arg(long)]
        json: bool,
    },

    /// Print the logs of a finished request
    Logs {
        /// Handle file written by `submit`
        handle: PathBuf,
    },
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let mut overrides = json!({});
    if let Some(ref root) = cli.store_root {
        overrides["store"] = json!({ "root": root.to_string_lossy() });
    }
    match &cli.command {
        Commands::Submit {
            timeout: Some(t), ..
        } => overrides["timeout_seconds"] = json!(t),
        Commands::Status {
            attempts: Some(n), ..
        } => overrides["query"] = json!({ "max_attempts": n }),
        _ => {}
    }

    let config = match load_config(cli.config, overrides) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Error loading config: {}", e);
            process::exit(1);
        }
    };

    let requester = match open_requester(&config) {
        Ok(r) => r,
        Err(e) => {
            eprintln!("Error opening ticket store: {}", e);
            process::exit(1);
        }
    };

    match cli.command {
        Commands::Submit {
            image,
            context,
            instances,
            handle_out,
            ..
        } => run_submit(&requester, &image, context, instances, handle_out),
        Commands::Status { handle, json, .. } => run_status(&requester, &handle, json),
        Commands::Cancel { handle, json } => run_cancel(&requester, &handle, json),
        Commands::Logs { handle } => run_logs(&requester, &handle),
    }
}

fn load_config(repo_path: Option<PathBuf>, overrides: Value) -> Result<RequesterConfig, String> {
    let repo_path = repo_path.unwrap_or_else(|| PathBuf::from(REPO_CONFIG_PATH));
    let host_path = RequesterConfig::default_host_path();
    RequesterConfig::load(host_path.as_deref(), Some(&repo_path), Some(overrides))
        .map_err(|e| e.to_string())
}

fn open_requester(config: &RequesterConfig) -> Result<JobRequester, String> {
    let store = FsObjectStore::open(config.store_root.clone()).map_err(|e| e.to_string())?;
    Ok(JobRequester::new(Arc::new(store), config))
}

fn read_handle(path: &Path) -> TicketHandle {
    let parsed: Result<TicketHandle, String> = fs::read(path)
        .map_err(|e| e.to_string())
        .and_then(|bytes| serde_json::from_slice(&bytes).map_err(|e| e.to_string()));
    match parsed {
        Ok(handle) => handle,
        Err(e) => {
            eprintln!("Error reading handle {}: {}", path.display(), e);
            process::exit(1);
        }
    }
}

fn print_json(value: &impl serde::Serialize) {
    match serde_json::to_string_pretty(value) {
        Ok(json) => println!("{}", json),
        Err(e) => {
            eprintln!("Error serializing output: {}", e);
            process::exit(1);
        }
    }
}

fn run_submit(
    requester: &JobRequester,
    image: &str,
    context: BuildContext,
    instances: u32,
    handle_out: Option<PathBuf>,
) {
    let handle = match requester.submit(image, context, instances) {
        Ok(h) => h,
        Err(e) => {
            eprintln!("Submit failed: {}", e);
            process::exit(1);
        }
    };

    if let Some(path) = handle_out {
        let written = serde_json::to_vec_pretty(&handle)
            .map_err(|e| e.to_string())
            .and_then(|bytes| fs::write(&path, bytes).map_err(|e| e.to_string()));
        if let Err(e) = written {
            eprintln!("Error writing handle to {}: {}", path.display(), e);
            process::exit(1);
        }
    }

    print_json(&handle);
}

fn run_status(requester: &JobRequester, handle_path: &Path, json_output: bool) {
    let handle = read_handle(handle_path);
    let reply = match requester.query(&handle) {
        Ok(r) => r,
        Err(e) => {
            eprintln!("Status lookup failed: {}", e);
            process::exit(1);
        }
    };

    if json_output {
        print_json(&reply);
        return;
    }

    match reply {
        StatusReply::Queuing { queue_num } => {
            println!("{}: queuing (position {})", handle.ticket_name, queue_num)
        }
        StatusReply::Failed { ref reason } | StatusReply::RuntimeError { ref reason } => {
            println!("{}: {} ({})", handle.ticket_name, reply.as_str(), reason)
        }
        _ => println!("{}: {}", handle.ticket_name, reply.as_str()),
    }
}

fn run_cancel(requester: &JobRequester, handle_path: &Path, json_output: bool) {
    let handle = read_handle(handle_path);
    let outcome = match requester.cancel(&handle) {
        Ok(o) => o,
        Err(e) => {
            eprintln!("Cancel failed: {}", e);
            process::exit(1);
        }
    };

    if json_output {
        print_json(&json!({
            "ticket": handle.ticket_name,
            "outcome": outcome.as_str(),
        }));
    } else {
        println!("{}: {}", handle.ticket_name, outcome.as_str());
    }
}

fn run_logs(requester: &JobRequester, handle_path: &Path) {
    let handle = read_handle(handle_path);
    match requester.fetch_logs(&handle) {
        Ok(Some(logs)) => print_json(logs.as_value()),
        Ok(None) => println!("null"),
        Err(e) => {
            eprintln!("Log lookup failed: {}", e);
            process::exit(1);
        }
    }
}
