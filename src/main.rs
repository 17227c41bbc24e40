use log::{error, info};
use std::io;
use std::sync::Arc;
use story_viewer::config::Config;
use story_viewer::provider::HttpProvider;
use story_viewer::tasks::poller::{Poller, PollerConfig};
use story_viewer::view::terminal::TerminalSurface;
use story_viewer::view::Presenter;

#[tokio::main]
async fn main() {
    // Initialize logging
    dotenvy::dotenv().ok();
    env_logger::init();

    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            error!("Invalid configuration: {}", e);
            return;
        }
    };

    let provider = match HttpProvider::new(&config.base_url, config.request_timeout) {
        Ok(provider) => Arc::new(provider),
        Err(e) => {
            error!("Failed to build HTTP client: {}", e);
            return;
        }
    };

    let poller = Poller::new(provider, PollerConfig::from(&config));
    let mut snapshots = poller.subscribe();
    if let Err(e) = poller.start() {
        error!("Failed to start poller: {}", e);
        return;
    }
    info!("Polling {}", config.base_url);

    let mut presenter = Presenter::new(TerminalSurface::new(io::stdout(), true));
    let interrupted = tokio::signal::ctrl_c();
    tokio::pin!(interrupted);
    loop {
        tokio::select! {
            _ = &mut interrupted => {
                info!("Interrupted, shutting down");
                break;
            }
            changed = snapshots.changed() => {
                if changed.is_err() {
                    break;
                }
                let snapshot = snapshots.borrow_and_update().clone();
                presenter.show(&snapshot);
            }
        }
    }

    poller.stop().await;
}
