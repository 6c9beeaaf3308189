//! DocsFocus command-line front end.
//!
//! Every subcommand maps onto one RPC method, so the CLI and `docsfocus-rpc`
//! share a single code path. Results are printed as pretty JSON on stdout.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use serde_json::{json, Value};
use tracing::error;

use docsfocus::app::{init_tracing, App, AppConfig};
use docsfocus::rpc_handler::handle_method;

#[derive(Parser)]
#[command(name = "docsfocus")]
#[command(about = "Inspect and edit DocsFocus settings, presets and detection", long_about = None)]
#[command(version)]
struct Cli {
    /// Settings database file (defaults to the platform data directory)
    #[arg(long, global = true, env = "DOCSFOCUS_DB")]
    db: Option<PathBuf>,

    /// Use a throwaway in-memory store
    #[arg(long, global = true)]
    in_memory: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Classify a URL as documentation or not
    Detect {
        url: String,
        /// HTML file of the page, for structural signals
        #[arg(long)]
        html: Option<PathBuf>,
        /// Print the full match instead of a yes/no summary
        #[arg(long)]
        verbose: bool,
    },
    /// Show what the popup would show for a URL
    Status {
        url: String,
        #[arg(long)]
        html: Option<PathBuf>,
    },
    /// Turn focus mode on or off, or print it
    Focus {
        #[arg(value_parser = ["on", "off"])]
        state: Option<String>,
    },
    /// Global settings
    #[command(subcommand)]
    Settings(SettingsCommand),
    /// Per-domain settings
    #[command(subcommand)]
    Domain(DomainCommand),
    /// Built-in and custom presets
    #[command(subcommand)]
    Preset(PresetCommand),
    /// Manual allow/block decisions per domain
    #[command(subcommand)]
    Override(OverrideCommand),
}

#[derive(Subcommand)]
enum SettingsCommand {
    /// Print the stored settings
    Get {
        /// Print the effective settings for this domain instead
        #[arg(long)]
        domain: Option<String>,
    },
    /// Store settings from a JSON object
    Set { json: String },
    /// Restore the defaults
    Reset,
}

#[derive(Subcommand)]
enum DomainCommand {
    List,
    Get { domain: String },
    Set { domain: String, json: String },
    Clear { domain: String },
}

#[derive(Subcommand)]
enum PresetCommand {
    /// List the presets offered in the picker
    List,
    /// Save the current global settings as a custom preset
    Save { name: String },
    Delete { name: String },
    /// Apply a preset globally, or to one domain
    Apply {
        name: String,
        #[arg(long)]
        domain: Option<String>,
    },
    /// Hide a built-in preset from the picker
    Hide { name: String },
    /// Show a hidden built-in preset again
    Show { name: String },
}

#[derive(Subcommand)]
enum OverrideCommand {
    List,
    Enable { domain: String },
    Disable { domain: String },
    Clear { domain: String },
}

fn parse_json(raw: &str) -> Result<Value, String> {
    serde_json::from_str(raw).map_err(|e| format!("invalid JSON: {}", e))
}

fn read_html(path: Option<PathBuf>) -> Result<Value, String> {
    match path {
        Some(path) => std::fs::read_to_string(&path)
            .map(Value::String)
            .map_err(|e| format!("cannot read {}: {}", path.display(), e)),
        None => Ok(Value::Null),
    }
}

/// Translates a subcommand into an RPC method and its params.
fn to_call(command: Commands) -> Result<(&'static str, Value), String> {
    let call = match command {
        Commands::Detect { url, html, verbose } => {
            let method = if verbose { "detect.analyze" } else { "detect.describe" };
            (method, json!({"url": url, "html": read_html(html)?}))
        }
        Commands::Status { url, html } => ("site.status", json!({"url": url, "html": read_html(html)?})),
        Commands::Focus { state: None } => ("focus.get", json!({})),
        Commands::Focus { state: Some(state) } => ("focus.set", json!({"enabled": state == "on"})),
        Commands::Settings(cmd) => match cmd {
            SettingsCommand::Get { domain: None } => ("settings.get", json!({})),
            SettingsCommand::Get { domain: Some(domain) } => ("settings.effective", json!({"domain": domain})),
            SettingsCommand::Set { json } => ("settings.set", json!({"settings": parse_json(&json)?})),
            SettingsCommand::Reset => ("settings.reset", json!({})),
        },
        Commands::Domain(cmd) => match cmd {
            DomainCommand::List => ("domain.list", json!({})),
            DomainCommand::Get { domain } => ("domain.get", json!({"domain": domain})),
            DomainCommand::Set { domain, json } => {
                ("domain.set", json!({"domain": domain, "settings": parse_json(&json)?}))
            }
            DomainCommand::Clear { domain } => ("domain.clear", json!({"domain": domain})),
        },
        Commands::Preset(cmd) => match cmd {
            PresetCommand::List => ("preset.list", json!({})),
            PresetCommand::Save { name } => ("preset.save", json!({"name": name})),
            PresetCommand::Delete { name } => ("preset.delete", json!({"name": name})),
            PresetCommand::Apply { name, domain } => ("preset.apply", json!({"name": name, "domain": domain})),
            PresetCommand::Hide { name } => ("preset.visibility.set", json!({"name": name, "visible": false})),
            PresetCommand::Show { name } => ("preset.visibility.set", json!({"name": name, "visible": true})),
        },
        Commands::Override(cmd) => match cmd {
            OverrideCommand::List => ("override.list", json!({})),
            OverrideCommand::Enable { domain } => ("override.set", json!({"domain": domain, "enabled": true})),
            OverrideCommand::Disable { domain } => ("override.set", json!({"domain": domain, "enabled": false})),
            OverrideCommand::Clear { domain } => ("override.set", json!({"domain": domain, "enabled": null})),
        },
    };
    Ok(call)
}

#[tokio::main]
async fn main() -> ExitCode {
    init_tracing();
    let cli = Cli::parse();

    let config = AppConfig {
        database_path: cli.db,
        in_memory: cli.in_memory,
    };
    let app = match App::new(&config) {
        Ok(app) => app,
        Err(e) => {
            error!(error = %e, "failed to open settings store");
            return ExitCode::FAILURE;
        }
    };

    let (method, params) = match to_call(cli.command) {
        Ok(call) => call,
        Err(e) => {
            eprintln!("error: {}", e);
            return ExitCode::from(2);
        }
    };

    match handle_method(&app, method, &params).await {
        Ok(result) => {
            match serde_json::to_string_pretty(&result) {
                Ok(text) => println!("{}", text),
                Err(_) => println!("{}", result),
            }
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("error: {}", e);
            ExitCode::FAILURE
        }
    }
}
