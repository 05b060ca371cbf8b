//! strata CLI - inspect layered configuration from the command line
//!
//! Usage:
//!   strata dump --app myapp
//!   strata get database --app myapp --format json
//!   strata find color --app myapp --set color=blue
//!   strata layers --app myapp

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use colored::Colorize;
use strata_core::{Config, StaticArgs, Value};

/// strata - Layered configuration inspection
#[derive(Parser)]
#[command(name = "strata")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Script name the configuration files are discovered under
    #[arg(long, default_value = "strata", global = true)]
    app: String,

    /// Explicit configuration file, fed to the command-line layer
    #[arg(long, global = true)]
    config_file: Option<PathBuf>,

    /// Let the explicit file override every other layer
    #[arg(long, global = true)]
    config_override: bool,

    /// Log level to apply before running (0-5 or a level name)
    #[arg(long, global = true)]
    log_level: Option<String>,

    /// Extra command-line value as KEY=VALUE (repeatable)
    #[arg(long = "set", value_name = "KEY=VALUE", global = true)]
    set: Vec<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the merged configuration view
    Dump {
        /// Output format: yaml, json
        #[arg(short, long, default_value = "yaml")]
        format: String,

        /// Write to file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Print one value resolved through the precedence order
    Get {
        /// Configuration key
        key: String,

        /// Output format: text, yaml, json
        #[arg(short, long, default_value = "text")]
        format: String,
    },

    /// Print the layer a key is resolved from
    Find {
        /// Configuration key
        key: String,
    },

    /// List the layers with their sources
    Layers,
}

/// Run the CLI with the given arguments
pub fn run() -> ExitCode {
    let cli = Cli::parse();

    let mut config = match build_config(&cli) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("{}", e.red());
            return ExitCode::from(2);
        }
    };

    match cli.command {
        Commands::Dump { format, output } => cmd_dump(&mut config, &format, output),
        Commands::Get { key, format } => cmd_get(&mut config, &key, &format),
        Commands::Find { key } => cmd_find(&mut config, &key),
        Commands::Layers => cmd_layers(&mut config),
    }
}

fn build_config(cli: &Cli) -> Result<Config, String> {
    let mut args = StaticArgs::new();
    if let Some(path) = &cli.config_file {
        args.set("config-file", path.display().to_string());
    }
    if cli.config_override {
        args.set("config-override", true);
    }
    if let Some(level) = &cli.log_level {
        args.set("log-level", level.clone());
    }
    for pair in &cli.set {
        let Some((key, value)) = pair.split_once('=') else {
            return Err(format!("Invalid --set value '{}', expected KEY=VALUE", pair));
        };
        args.set(key, parse_scalar(value));
    }

    let mut config = Config::builder(cli.app.as_str())
        .with_app_name("strata")
        .with_app_version(env!("CARGO_PKG_VERSION"))
        .with_command_line(args)
        .build();
    if let Some(level) = &cli.log_level {
        config.set("log-level", level.clone());
    }
    Ok(config)
}

/// Read a literal the way a YAML scalar would be read
fn parse_scalar(text: &str) -> Value {
    match text {
        "" | "~" | "null" => Value::Null,
        "true" => Value::Bool(true),
        "false" => Value::Bool(false),
        _ => {
            if let Ok(n) = text.parse::<i64>() {
                Value::Integer(n)
            } else if let Ok(f) = text.parse::<f64>() {
                Value::Float(f)
            } else {
                Value::String(text.to_string())
            }
        }
    }
}

fn cmd_dump(config: &mut Config, format: &str, output: Option<PathBuf>) -> ExitCode {
    let result = match format {
        "json" => config.to_json(),
        _ => config.to_yaml(),
    };

    match result {
        Ok(content) => {
            if let Some(output_path) = output {
                if let Err(e) = std::fs::write(&output_path, &content) {
                    eprintln!("{}: {}", "Error writing file".red(), e);
                    return ExitCode::from(2);
                }
                eprintln!("{} Wrote to {}", "✓".green(), output_path.display());
            } else {
                print!("{}", content);
            }
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("{}: {}", "Error".red(), e);
            ExitCode::from(1)
        }
    }
}

fn cmd_get(config: &mut Config, key: &str, format: &str) -> ExitCode {
    let Some(value) = config.get(key) else {
        eprintln!(
            "{}: Key '{}' is not defined in any layer",
            "Error".red(),
            key
        );
        return ExitCode::from(1);
    };

    match render_value(&value, format) {
        Ok(text) => {
            print!("{}", text);
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("{}: {}", "Error".red(), e);
            ExitCode::from(1)
        }
    }
}

fn render_value(value: &Value, format: &str) -> Result<String, String> {
    match format {
        "json" => serde_json::to_string_pretty(value)
            .map(|text| text + "\n")
            .map_err(|e| e.to_string()),
        "yaml" => serde_yaml::to_string(value).map_err(|e| e.to_string()),
        _ => match value {
            // Trees read better as YAML
            Value::Sequence(_) | Value::Mapping(_) => {
                serde_yaml::to_string(value).map_err(|e| e.to_string())
            }
            scalar => Ok(format!("{}\n", scalar)),
        },
    }
}

fn cmd_find(config: &mut Config, key: &str) -> ExitCode {
    match config.find_layer(key) {
        Some(layer) => {
            println!("{}", layer);
            ExitCode::SUCCESS
        }
        None => {
            eprintln!(
                "{}: Key '{}' is not defined in any layer",
                "Error".red(),
                key
            );
            ExitCode::from(1)
        }
    }
}

fn cmd_layers(config: &mut Config) -> ExitCode {
    for layer in config.layers().iter() {
        let source = layer.source.as_deref().unwrap_or("no file found");
        match &layer.origin {
            Some(origin) if Some(origin.as_str()) != layer.source.as_deref() => {
                println!(
                    "{}: {} (searched as '{}')",
                    layer.name.bold(),
                    source,
                    origin
                );
            }
            _ => println!("{}: {}", layer.name.bold(), source),
        }
    }
    ExitCode::SUCCESS
}
