//! Writes a display-builder screen with one row per configured target.
//!
//! | Env Var            | Default             |
//! |--------------------|---------------------|
//! | `PVWATCH_CONFIG`   | `config.json`       |
//! | `DISPLAY_OUTPUT`   | `main.bob`          |
//! | `DISPLAY_TEMPLATE` | `row_template.bob`  |

use pvwatch_core::config::MonitorConfig;
use pvwatch_core::display::render_display;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

fn main() {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "pvwatch_display=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config_path = env_or("PVWATCH_CONFIG", "config.json");
    let output = env_or("DISPLAY_OUTPUT", "main.bob");
    let template = env_or("DISPLAY_TEMPLATE", "row_template.bob");

    let config = match MonitorConfig::load(&config_path) {
        Ok(config) => config,
        Err(e) => {
            tracing::error!(path = %config_path, error = %e, "Failed to load target list");
            std::process::exit(1);
        }
    };

    let names: Vec<&str> = config.target_names().collect();
    let document = render_display(&names, &template);

    if let Err(e) = std::fs::write(&output, document) {
        tracing::error!(path = %output, error = %e, "Failed to write display");
        std::process::exit(1);
    }

    tracing::info!(path = %output, rows = names.len(), "Display written");
}

fn env_or(name: &str, default: &str) -> String {
    std::env::var(name).unwrap_or_else(|_| default.into())
}
