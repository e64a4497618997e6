use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde_json::{json, Value};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use chartforge::config::AppConfig;
use chartforge::hooks::SystemBrowser;
use chartforge::notify::{self, HttpNotifier, Notification, NotificationSink, Severity};
use chartforge::runtime::ChartRenderer;
use chartforge::store;
use chartforge::tools::{builtin, ToolRegistry, ToolResponse};

const DEFAULT_CONFIG: &str = "chartforge.json";

#[derive(Parser, Debug)]
#[command(name = "chartforge")]
#[command(about = "Compile chart specs into interactive HTML charts or PNG images", long_about = None)]
struct Args {
    /// JSON config file (defaults to ./chartforge.json when present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Do not open rendered charts in a viewer
    #[arg(long, global = true)]
    no_open: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Render a chart spec to an HTML document
    Render {
        /// Chart spec as JSON text, or @FILE to read it from a file
        #[arg(long)]
        data: String,
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        x_label: Option<String>,
    },
    /// Draw a bar or line chart as a PNG image
    Legacy {
        /// Comma separated categories
        #[arg(long)]
        x: String,
        /// Comma separated values
        #[arg(long)]
        y: String,
        #[arg(long, default_value = "bar")]
        chart_type: String,
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        x_label: Option<String>,
        #[arg(long)]
        y_label: Option<String>,
        #[arg(long)]
        color: Option<String>,
        #[arg(long)]
        bar_width: Option<f64>,
        #[arg(long)]
        marker: Option<String>,
    },
    /// Print a table from the data store
    Table { name: String },
    /// Open a URL in the default browser
    Open { url: String },
    /// Call a tool by name with JSON arguments
    Call {
        tool: String,
        #[arg(default_value = "{}")]
        args: String,
    },
    /// List tool definitions
    Tools,
    /// Push a message to the configured notification endpoint
    Notify {
        message: String,
        #[arg(long)]
        sender: Option<String>,
        #[arg(long, default_value = "info")]
        severity: Severity,
    },
}

fn main() -> Result<()> {
    let args = Args::parse();

    let config = match &args.config {
        Some(path) => AppConfig::load(path)?,
        None => AppConfig::load_or_default(Some(DEFAULT_CONFIG))?,
    };
    let guard = chartforge::logging::init(&config.logging)?;

    let success = run(args, &config)?;
    drop(guard);
    if !success {
        std::process::exit(1);
    }
    Ok(())
}

/// Dispatch one command; `false` when the tool call failed.
fn run(args: Args, config: &AppConfig) -> Result<bool> {
    let (registry, renderer) = build_registry(config, args.no_open);
    let (tool, tool_args) = match args.command {
        Command::Render { data, title, x_label } => (
            "renderChart",
            json!({"data": read_data_arg(&data)?, "title": title, "x_label": x_label}),
        ),
        Command::Legacy {
            x,
            y,
            chart_type,
            title,
            x_label,
            y_label,
            color,
            bar_width,
            marker,
        } => (
            "drawChart",
            json!({
                "x_str": x,
                "y_str": y,
                "chart_type": chart_type,
                "title": title,
                "x_label": x_label,
                "y_label": y_label,
                "color": color,
                "bar_width": bar_width,
                "marker": marker
            }),
        ),
        Command::Table { name } => ("readTable", json!({"table_name": name})),
        Command::Open { url } => ("openUrl", json!({"url": url})),
        Command::Call { tool, args } => {
            let parsed: Value = serde_json::from_str(&args).context("Tool arguments must be JSON")?;
            let response = registry.call(&tool, parsed);
            renderer.flush_notifications();
            return print_response(&response);
        }
        Command::Tools => {
            let definitions = serde_json::to_string_pretty(&registry.definitions())
                .context("Failed to serialize tool definitions")?;
            println!("{}", definitions);
            return Ok(true);
        }
        Command::Notify {
            message,
            sender,
            severity,
        } => {
            send_notification(config, &message, sender.as_deref(), severity)?;
            return Ok(true);
        }
    };

    let response = registry.call(tool, tool_args);
    // Success notifications are pushed in the background; deliver them before exit
    renderer.flush_notifications();
    print_response(&response)
}

fn build_registry(config: &AppConfig, no_open: bool) -> (ToolRegistry, Arc<ChartRenderer>) {
    let mut config = config.clone();
    if no_open {
        config.charts.open_after_render = false;
    }
    let renderer = Arc::new(ChartRenderer::from_config(&config));

    let registry = builtin::registry(
        Arc::clone(&renderer),
        store::from_config(&config.database),
        Arc::new(SystemBrowser),
    );
    (registry, renderer)
}

/// JSON text, or the contents of a file when prefixed with `@`.
fn read_data_arg(data: &str) -> Result<Value> {
    let text = match data.strip_prefix('@') {
        Some(path) => std::fs::read_to_string(path).with_context(|| format!("Failed to read data file: {}", path))?,
        None => data.to_string(),
    };
    // Anything that is not JSON is passed through as text and rejected downstream
    Ok(serde_json::from_str(&text).unwrap_or(Value::String(text)))
}

fn print_response(response: &ToolResponse) -> Result<bool> {
    let text = serde_json::to_string_pretty(response).context("Failed to serialize tool response")?;
    println!("{}", text);
    Ok(response.success)
}

fn send_notification(config: &AppConfig, message: &str, sender: Option<&str>, severity: Severity) -> Result<()> {
    let sender = sender.unwrap_or(&config.notifications.sender);
    match config.notifications.endpoint.as_deref() {
        Some(endpoint) => {
            let notifier = HttpNotifier::new(endpoint, Duration::from_secs(config.notifications.timeout_secs));
            notifier
                .send_blocking(&Notification::new(message, sender, severity))
                .context("Failed to send notification")?;
            println!("Notification sent to {}", notifier.url());
        }
        None => {
            notify::LogNotifier.notify(message, sender, severity);
            println!("No notification endpoint configured, message logged only");
        }
    }
    Ok(())
}
