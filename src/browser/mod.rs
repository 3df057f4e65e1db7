//! Built-in browser automation.

pub mod driver;
pub mod options;

pub use driver::Driver;
pub use options::DriverOptions;

use anyhow::Result;
use serde_json::{json, Value};
use tracing::info;

use crate::config::Config;
use crate::event::TaskEvent;

/// The fixed task: launch a browser from the descriptor's options, open
/// the configured page, read its title back, tear down.
pub async fn run_task(event: &TaskEvent, config: &Config) -> Result<Value> {
    let opts = DriverOptions::from_event(event, config);
    let driver = Driver::launch(&opts).await?;

    // Tear down before surfacing any probe failure.
    let probed = probe(&driver, &config.task_url).await;
    driver.quit().await;
    let title = probed?;

    Ok(json!({
        "status": "ok",
        "message": "Browser is running",
        "text": title,
    }))
}

async fn probe(driver: &Driver, url: &str) -> Result<String> {
    info!(url, "opening page");
    let page = driver.open(url).await?;
    driver.title(&page).await
}
