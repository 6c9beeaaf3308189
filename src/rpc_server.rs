//! DocsFocus RPC Server: JSON-RPC over stdin/stdout for browser-side hosts.
//!
//! Protocol: one JSON object per line (newline-delimited JSON).
//! Request:  {"id":1, "method":"detect.describe", "params":{"url":"..."}}
//! Response: {"id":1, "result":{...}} or {"id":1, "error":"..."}

use std::time::Instant;

use clap::Parser;
use serde_json::{json, Value};
use tokio::io::{self, AsyncBufReadExt, AsyncWriteExt, BufReader};
use tracing::{error, info, warn};

use docsfocus::app::{init_tracing, App, AppConfig};
use docsfocus::rpc_handler::handle_method;

/// Simple rate limiter: max requests per second.
struct RateLimiter {
    window_start: Instant,
    request_count: u32,
    max_per_second: u32,
}

impl RateLimiter {
    fn new(max_per_second: u32) -> Self {
        Self { window_start: Instant::now(), request_count: 0, max_per_second }
    }

    /// Returns true if the request is allowed, false if rate-limited.
    fn check(&mut self) -> bool {
        let elapsed = self.window_start.elapsed();
        if elapsed.as_secs() >= 1 {
            self.window_start = Instant::now();
            self.request_count = 0;
        }
        self.request_count += 1;
        self.request_count <= self.max_per_second
    }
}

#[derive(Parser)]
#[command(name = "docsfocus-rpc")]
#[command(about = "DocsFocus core over newline-delimited JSON-RPC")]
#[command(version)]
struct Args {
    /// Settings database file
    #[arg(long, env = "DOCSFOCUS_DB")]
    db: Option<std::path::PathBuf>,

    /// Keep settings in memory only
    #[arg(long)]
    in_memory: bool,

    /// Requests accepted per second before replies turn into errors
    #[arg(long, default_value_t = 200)]
    max_rps: u32,
}

async fn write_line(stdout: &mut io::Stdout, value: &Value) -> std::io::Result<()> {
    let mut line = value.to_string();
    line.push('\n');
    stdout.write_all(line.as_bytes()).await?;
    stdout.flush().await
}

#[tokio::main]
async fn main() -> std::io::Result<()> {
    init_tracing();
    let args = Args::parse();

    let config = AppConfig {
        database_path: args.db,
        in_memory: args.in_memory,
    };
    let app = match App::new(&config) {
        Ok(app) => app,
        Err(e) => {
            error!(error = %e, "failed to open settings store");
            return Err(std::io::Error::new(std::io::ErrorKind::Other, e.to_string()));
        }
    };

    let mut stdout = io::stdout();
    // Signal ready
    write_line(&mut stdout, &json!({"event":"ready","version":env!("CARGO_PKG_VERSION")})).await?;
    info!("rpc server ready");

    let mut rate_limiter = RateLimiter::new(args.max_rps);
    let mut lines = BufReader::new(io::stdin()).lines();

    while let Some(line) = lines.next_line().await? {
        if line.trim().is_empty() {
            continue;
        }

        let req: Value = match serde_json::from_str(&line) {
            Ok(v) => v,
            Err(e) => {
                write_line(&mut stdout, &json!({"id":null,"error":format!("parse error: {}", e)})).await?;
                continue;
            }
        };

        let id = req.get("id").cloned().unwrap_or(Value::Null);

        if !rate_limiter.check() {
            warn!(%id, "rate limit exceeded");
            write_line(&mut stdout, &json!({"id": id, "error": "rate limit exceeded"})).await?;
            continue;
        }

        let method = req.get("method").and_then(|v| v.as_str()).unwrap_or("");
        let params = req.get("params").cloned().unwrap_or(json!({}));

        let response = match handle_method(&app, method, &params).await {
            Ok(val) => json!({"id": id, "result": val}),
            Err(err) => json!({"id": id, "error": err}),
        };
        write_line(&mut stdout, &response).await?;
    }

    info!("stdin closed, shutting down");
    Ok(())
}
