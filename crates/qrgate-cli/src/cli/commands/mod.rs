//! CLI command handlers.

pub mod auth;
pub mod config;
pub mod generate;

use anyhow::Result;
use qrgate_core::config::Config;
use qrgate_core::notify::Notifications;
use qrgate_core::session::{GoTrueProvider, SessionGate, SessionStore};

/// Gate over the configured auth server, resolved from the stored session.
async fn open_gate(config: &Config) -> Result<SessionGate<GoTrueProvider>> {
    let provider = GoTrueProvider::from_config(config, SessionStore::default_path())?;
    let mut gate = SessionGate::new(provider);
    let status = gate.resolve().await;
    tracing::debug!(authenticated = status.is_authenticated(), "session resolved");
    Ok(gate)
}

/// Prints success notices; the first error notice becomes the command error.
fn report(notices: &mut Notifications) -> Result<()> {
    for notice in notices.drain() {
        if notice.is_error() {
            anyhow::bail!("{notice}");
        }
        println!("{notice}");
    }
    Ok(())
}
