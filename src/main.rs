use nixon_panel::view::{self, UsageLevel};
use nixon_panel::{App, Config, PanelState};

use anyhow::Result;
use tokio::sync::watch;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    tracing::info!("Starting nixon-panel");

    // Load configuration
    let config = Config::load()?;
    config.validate()?;

    let app = App::new(&config)?;
    tokio::spawn(log_changes(app.store().subscribe()));

    app.run().await?;

    tracing::info!("nixon-panel shutdown complete");
    Ok(())
}

/// Log a status line whenever the panel state changes.
async fn log_changes(mut rx: watch::Receiver<PanelState>) {
    let mut last_line = String::new();
    let mut last_level = UsageLevel::Normal;

    while rx.changed().await.is_ok() {
        let state = rx.borrow_and_update().clone();

        let line = view::summary(&state);
        if line != last_line {
            tracing::info!("{}", line);
            last_line = line;
        }

        let level = UsageLevel::from_percent(state.status.disk_usage_percent);
        if level != last_level {
            match level {
                UsageLevel::Critical => tracing::error!(
                    "Disk usage critical: {:.0}%",
                    state.status.disk_usage_percent
                ),
                UsageLevel::Warning => tracing::warn!(
                    "Disk usage high: {:.0}%",
                    state.status.disk_usage_percent
                ),
                UsageLevel::Normal => tracing::info!("Disk usage back to normal"),
            }
            last_level = level;
        }
    }
}
