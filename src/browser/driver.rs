//! Browser launch and teardown over CDP.

use std::path::PathBuf;

use anyhow::{anyhow, Context, Result};
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::cdp::browser_protocol::browser::{
    SetDownloadBehaviorBehavior, SetDownloadBehaviorParams,
};
use chromiumoxide::Page;
use futures_util::StreamExt;
use tempfile::TempDir;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use super::options::DriverOptions;

/// A launched browser plus the resources that must outlive it.
pub struct Driver {
    browser: Browser,
    event_task: JoinHandle<()>,
    /// Profile and download dirs; removed from disk when the driver goes.
    _temp_dirs: Vec<TempDir>,
    download_dir: Option<PathBuf>,
}

impl Driver {
    /// Launch a browser from the flat option set.
    pub async fn launch(opts: &DriverOptions) -> Result<Self> {
        let mut temp_dirs = Vec::new();

        // Fresh profile per launch, like the throwaway profiles the task
        // ran with before.
        let profile = TempDir::new().context("failed to create profile dir")?;
        let mut builder = BrowserConfig::builder()
            .user_data_dir(profile.path())
            .window_size(opts.window.0, opts.window.1)
            .args(opts.chromium_args());
        temp_dirs.push(profile);

        if !opts.headless {
            builder = builder.with_head();
        }

        let download_dir = if opts.needs_download_file {
            match &opts.download_dir {
                Some(dir) => {
                    std::fs::create_dir_all(dir)
                        .with_context(|| format!("failed to create {}", dir.display()))?;
                    Some(dir.clone())
                }
                None => {
                    let dir = TempDir::new().context("failed to create download dir")?;
                    let path = dir.path().to_path_buf();
                    temp_dirs.push(dir);
                    Some(path)
                }
            }
        } else {
            None
        };

        if opts.clean_init {
            info!("launching browser (self-located binary)");
        } else if let Some(binary) = &opts.binary {
            info!(binary = %binary.display(), "launching browser (container binary)");
            builder = builder.chrome_executable(binary);
        }

        let config = builder
            .build()
            .map_err(|e| anyhow!("invalid browser config: {e}"))?;
        let (browser, mut handler) = Browser::launch(config)
            .await
            .context("failed to launch browser")?;

        // CDP messages stop flowing if nobody drains the handler stream.
        let event_task = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if event.is_err() {
                    break;
                }
            }
        });

        Ok(Self {
            browser,
            event_task,
            _temp_dirs: temp_dirs,
            download_dir,
        })
    }

    /// Open `url` in a new page and wait for the navigation to settle.
    pub async fn open(&self, url: &str) -> Result<Page> {
        let page = self
            .browser
            .new_page(url)
            .await
            .with_context(|| format!("failed to open {url}"))?;

        if let Some(dir) = &self.download_dir {
            let params = SetDownloadBehaviorParams::builder()
                .behavior(SetDownloadBehaviorBehavior::Allow)
                .download_path(dir.display().to_string())
                .build()
                .map_err(|e| anyhow!("invalid download behavior: {e}"))?;
            page.execute(params)
                .await
                .context("failed to set download behavior")?;
            debug!(dir = %dir.display(), "downloads routed to disk");
        }

        page.wait_for_navigation()
            .await
            .context("navigation did not settle")?;
        Ok(page)
    }

    /// Read the page title.
    pub async fn title(&self, page: &Page) -> Result<String> {
        let title = page
            .get_title()
            .await
            .context("failed to read title")?
            .unwrap_or_default();
        Ok(title)
    }

    /// Tear the browser down. Temp profile and download dirs are removed
    /// when the driver is dropped.
    pub async fn quit(mut self) {
        if let Err(e) = self.browser.close().await {
            warn!(error = %e, "browser close failed");
        }
        if let Err(e) = self.browser.wait().await {
            warn!(error = %e, "browser did not exit cleanly");
        }
        self.event_task.abort();
        debug!("browser stopped");
    }
}
