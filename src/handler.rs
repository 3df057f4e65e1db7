//! Handler entry point.
//!
//! One task descriptor in, one result mapping out. The result always
//! carries a `status` field; every failure is flattened to
//! `{"status": "error", "message": ...}` with no classification and no
//! retry.

use std::time::Instant;

use anyhow::{Context, Result};
use serde_json::Value;
use tracing::{debug, info};

use crate::browser;
use crate::config::Config;
use crate::display::VirtualDisplay;
use crate::event::{error_result, TaskEvent};
use crate::resources;
use crate::scripts::{ScriptEngine, ScriptStore};

pub async fn handle(event: TaskEvent, config: &Config) -> Value {
    debug!(?event, "handling task");

    // Only an explicit headless_mode=false asks for a display.
    let display = if event.headless_mode == Some(false) {
        match VirtualDisplay::start(config.screen_width, config.screen_height) {
            Ok(display) => Some(display),
            Err(e) => return error_result(format!("{e:#}")),
        }
    } else {
        debug!("no virtual display requested");
        None
    };

    let outcome = run(&event, config).await;

    // Stop the display on every path. Drop covers the rest.
    if let Some(display) = display {
        display.stop();
    }

    match outcome {
        Ok(value) => value,
        Err(e) => error_result(format!("{e:#}")),
    }
}

async fn run(event: &TaskEvent, config: &Config) -> Result<Value> {
    if let Some(name) = event.script() {
        let store = ScriptStore::new(config);
        let path = store.fetch_or_reuse(name, event.use_s3).await?;

        let descriptor = serde_json::to_value(event).context("descriptor is not serializable")?;
        let result =
            tokio::task::spawn_blocking(move || ScriptEngine::new().run_file(&path, &descriptor))
                .await
                .context("script task panicked")??;
        return Ok(result);
    }

    info!("running built-in browser task");
    resources::log_resource_usage("before");
    let started = Instant::now();

    let mut results = browser::run_task(event, config).await?;

    let elapsed = started.elapsed().as_secs_f64();
    resources::log_resource_usage("after");

    if let Some(map) = results.as_object_mut() {
        map.insert("elapsed".to_string(), Value::from(elapsed));
    }
    info!(elapsed, "built-in task finished");
    Ok(results)
}
