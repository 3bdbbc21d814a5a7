use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use clap::{Parser, Subcommand};
use reqwest::Method;
use resilient_client::config::{load_config, ClientConfig};
use resilient_client::observability::logging::init_logging;
use resilient_client::{CancellationToken, ResilientClient};

#[derive(Parser)]
#[command(name = "resilient-cli")]
#[command(about = "Send HTTP requests through a circuit breaker with retries", long_about = None)]
struct Cli {
    /// TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Log level used when RUST_LOG is unset
    #[arg(long)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch a URL with retries and circuit breaking
    Fetch {
        url: String,

        #[arg(short = 'X', long, default_value = "GET")]
        method: String,

        /// Extra header as `name: value` (repeatable)
        #[arg(short = 'H', long = "header")]
        headers: Vec<String>,

        /// Request body
        #[arg(short, long)]
        data: Option<String>,

        #[arg(long)]
        attempts: Option<u32>,

        /// Per-attempt timeout
        #[arg(long)]
        timeout_ms: Option<u64>,

        /// Bound on the whole operation including backoff
        #[arg(long)]
        overall_timeout_ms: Option<u64>,

        /// Print the network status snapshot afterwards
        #[arg(long)]
        status: bool,
    },
    /// Probe a health endpoint once
    Health {
        url: String,

        #[arg(long, default_value_t = 5000)]
        timeout_ms: u64,
    },
    /// Watch connectivity and print transitions until Ctrl+C
    Watch {
        /// Health endpoint; falls back to the configured one
        url: Option<String>,

        #[arg(long)]
        interval_secs: Option<u64>,
    },
}

#[tokio::main]
async fn main() -> Result<ExitCode, Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => load_config(path)?,
        None => ClientConfig::default(),
    };
    if let Some(level) = cli.log_level {
        config.observability.log_level = level;
    }
    init_logging(&config.observability)?;

    match cli.command {
        Commands::Fetch {
            url,
            method,
            headers,
            data,
            attempts,
            timeout_ms,
            overall_timeout_ms,
            status,
        } => {
            let client = ResilientClient::from_config(config)?;
            let method = Method::from_bytes(method.to_uppercase().as_bytes())?;

            let mut request = client.request(method, url);
            for header in &headers {
                let (name, value) = header
                    .split_once(':')
                    .ok_or_else(|| format!("header '{}' must look like 'name: value'", header))?;
                request = request.header(name.trim(), value.trim())?;
            }
            if let Some(data) = data {
                request = request.body(data);
            }
            if let Some(ms) = timeout_ms {
                request = request.timeout(Duration::from_millis(ms));
            }

            let cancel = CancellationToken::new();
            let mut options = client.retry_options().with_cancellation(cancel.clone());
            if let Some(attempts) = attempts {
                options = options.with_max_attempts(attempts);
            }
            if let Some(ms) = overall_timeout_ms {
                options = options.with_overall_timeout(Duration::from_millis(ms));
            }

            tokio::spawn(async move {
                if tokio::signal::ctrl_c().await.is_ok() {
                    cancel.cancel();
                }
            });

            let result = client.fetch_with_resilience(&request, options).await;
            let code = match result {
                Ok(response) => {
                    println!("{}", response.status);
                    println!("{}", response.text());
                    ExitCode::SUCCESS
                }
                Err(e) => {
                    eprintln!("Error ({}): {}", e.kind(), e);
                    ExitCode::FAILURE
                }
            };
            if status {
                println!("{}", serde_json::to_string_pretty(&client.network_status())?);
            }
            Ok(code)
        }
        Commands::Health { url, timeout_ms } => {
            let client = ResilientClient::from_config(config)?;
            let healthy = client.health_check(&url, Duration::from_millis(timeout_ms)).await;
            println!("{}", if healthy { "healthy" } else { "unhealthy" });
            Ok(if healthy { ExitCode::SUCCESS } else { ExitCode::FAILURE })
        }
        Commands::Watch { url, interval_secs } => {
            if url.is_some() {
                config.monitor.health_check_url = url;
            }
            if let Some(secs) = interval_secs {
                config.monitor.interval_secs = secs.max(1);
            }
            if config.monitor.health_check_url.is_none() {
                return Err("watch needs a health check URL (argument or config)".into());
            }

            let client = ResilientClient::from_config(config)?;
            client.subscribe(|online| {
                println!("{}", if online { "online" } else { "offline" });
            });
            client.start_monitor();

            tokio::signal::ctrl_c().await?;
            println!("{}", serde_json::to_string_pretty(&client.network_status())?);
            client.destroy();
            Ok(ExitCode::SUCCESS)
        }
    }
}
