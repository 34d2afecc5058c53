use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use brightness_control::config::Config;
use brightness_control::controller::SystemBrightnessController;
use clap::{Parser, Subcommand};

#[macro_use]
extern crate tracing;

/// Control display brightness over DDC/CI and the backlight
#[derive(Parser, Debug)]
#[command(name = "brightness-control", version, about)]
struct Args {
    /// Config file to use instead of ~/.config/brightness-control/config.toml
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the current brightness (0-100)
    Get {
        /// Query the monitor again instead of using the startup value
        #[arg(long)]
        live: bool,
    },
    /// Print the monitor capabilities
    Caps,
    /// Set the brightness of every monitor and the backlight
    Set {
        #[arg(allow_negative_numbers = true)]
        level: i32,
    },
    /// Print brightness levels
    Levels {
        /// Number of evenly spaced levels
        #[arg(long)]
        count: Option<usize>,
        /// Print the fixed presets instead
        #[arg(long, conflicts_with = "count")]
        presets: bool,
    },
    /// Turn the screen off
    Off,
    /// Print brightness changes until interrupted
    Watch,
    /// Print the effective configuration
    Config,
}

fn setup_logs() {
    use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

    let fmt_layer = fmt::layer().with_target(false);
    let filter_layer = EnvFilter::try_from_default_env().unwrap_or(EnvFilter::new(format!(
        "warn,{}=warn",
        env!("CARGO_CRATE_NAME")
    )));

    if let Ok(journal_layer) = tracing_journald::layer() {
        tracing_subscriber::registry()
            .with(filter_layer)
            .with(fmt_layer)
            .with(journal_layer)
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter_layer)
            .with(fmt_layer)
            .init();
    }
}

/// Run a blocking controller call off the async runtime
async fn blocking<T, F>(controller: &Arc<SystemBrightnessController>, f: F) -> Option<T>
where
    F: FnOnce(&SystemBrightnessController) -> T + Send + 'static,
    T: Send + 'static,
{
    let controller = controller.clone();
    match tokio::task::spawn_blocking(move || f(&controller)).await {
        Ok(value) => Some(value),
        Err(err) => {
            error!("Task join error: {}", err);
            None
        }
    }
}

fn print_levels(levels: &[i32]) {
    let levels: Vec<String> = levels.iter().map(i32::to_string).collect();
    println!("{}", levels.join(" "));
}

fn print_config(config: &Config) -> ExitCode {
    match toml::to_string_pretty(config) {
        Ok(text) => {
            print!("{}", text);
            ExitCode::SUCCESS
        }
        Err(err) => {
            error!("failed to serialize config: {}", err);
            ExitCode::FAILURE
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    setup_logs();

    let args = Args::parse();
    let config = Config::load(args.config.as_deref());

    // Printing the configuration needs no monitor access
    if let Command::Config = args.command {
        return print_config(&config);
    }

    let controller = {
        let config = config.clone();
        match tokio::task::spawn_blocking(move || SystemBrightnessController::system(&config)).await
        {
            Ok(controller) => Arc::new(controller),
            Err(err) => {
                error!("Task join error: {}", err);
                return ExitCode::FAILURE;
            }
        }
    };

    match args.command {
        Command::Get { live } => {
            let value = blocking(&controller, move |controller| {
                if live {
                    controller.live_value()
                } else {
                    controller.current_value()
                }
            })
            .await;
            let Some(value) = value else {
                return ExitCode::FAILURE;
            };
            println!("{}", value);
        }
        Command::Caps => {
            let caps = controller.capabilities();
            println!(
                "minimum {} current {} maximum {}",
                caps.minimum, caps.current, caps.maximum
            );
        }
        Command::Set { level } => {
            let applied = blocking(&controller, move |controller| controller.set_brightness(level))
                .await
                .unwrap_or(false);
            if !applied {
                eprintln!("Failed to set brightness to {}", level);
                return ExitCode::FAILURE;
            }
        }
        Command::Levels { count, presets } => {
            if presets {
                print_levels(&controller.default_levels());
            } else {
                match controller.generated_levels(count.unwrap_or(config.level_count)) {
                    Ok(levels) => print_levels(&levels),
                    Err(err) => {
                        eprintln!("{}", err);
                        return ExitCode::FAILURE;
                    }
                }
            }
        }
        Command::Off => controller.turn_off().await,
        Command::Watch => {
            let id = controller.subscribe(|level| println!("{}", level));
            if let Err(err) = tokio::signal::ctrl_c().await {
                error!("Failed to wait for Ctrl-C: {}", err);
            }
            controller.unsubscribe(id);
        }
        Command::Config => return print_config(&config),
    }

    ExitCode::SUCCESS
}
