//! Named-script cache with download-on-first-use.
//!
//! Lifecycle per script: absent → downloaded-or-reused → present. There is
//! deliberately no versioning or invalidation; delete the file to refresh.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::Duration;

use tracing::{debug, info};
use url::Url;

use crate::config::Config;

const FETCH_TIMEOUT: Duration = Duration::from_secs(30);
const USER_AGENT: &str = concat!("lexbot/", env!("CARGO_PKG_VERSION"));

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("invalid script name '{0}'")]
    InvalidName(String),
    #[error("no script source configured (set scripts_base_url or bucket)")]
    NoRemote,
    #[error("invalid script URL: {0}")]
    Url(#[from] url::ParseError),
    #[error("failed to download script: {0}")]
    Http(#[from] reqwest::Error),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub struct ScriptStore {
    dir: PathBuf,
    base_url: Option<String>,
    bucket: Option<String>,
    region: String,
}

impl ScriptStore {
    pub fn new(config: &Config) -> Self {
        Self {
            dir: config.scripts_dir.clone(),
            base_url: config.scripts_base_url.clone(),
            bucket: config.bucket.clone(),
            region: config.region.clone(),
        }
    }

    /// Path a script of this name is cached at.
    pub fn local_path(&self, name: &str) -> Result<PathBuf, StoreError> {
        Ok(self.dir.join(normalized_name(name)?))
    }

    /// Return the cached script, downloading it first if absent.
    pub async fn fetch_or_reuse(&self, name: &str, use_s3: bool) -> Result<PathBuf, StoreError> {
        let path = self.local_path(name)?;
        if path.exists() {
            debug!(script = name, path = %path.display(), "reusing cached script");
            return Ok(path);
        }

        let url = self.remote_url(name, use_s3)?;
        info!(script = name, url = %url, "downloading script");

        let client = reqwest::Client::builder()
            .timeout(FETCH_TIMEOUT)
            .user_agent(USER_AGENT)
            .build()?;
        let body = client
            .get(url)
            .send()
            .await?
            .error_for_status()?
            .bytes()
            .await?;

        std::fs::create_dir_all(&self.dir)?;
        // Temp file in the same directory, then rename, so a concurrent
        // invocation never sees a partial script.
        let mut tmp = tempfile::NamedTempFile::new_in(&self.dir)?;
        tmp.write_all(&body)?;
        tmp.persist(&path).map_err(|e| StoreError::Io(e.error))?;

        debug!(script = name, bytes = body.len(), path = %path.display(), "script cached");
        Ok(path)
    }

    fn remote_url(&self, name: &str, use_s3: bool) -> Result<Url, StoreError> {
        let name = normalized_name(name)?;
        if use_s3 {
            let bucket = self.bucket.as_deref().ok_or(StoreError::NoRemote)?;
            let url = format!(
                "https://{bucket}.s3.{region}.amazonaws.com/{name}",
                region = self.region
            );
            return Ok(Url::parse(&url)?);
        }

        let mut base = self.base_url.clone().ok_or(StoreError::NoRemote)?;
        if !base.ends_with('/') {
            base.push('/');
        }
        Ok(Url::parse(&base)?.join(&name)?)
    }
}

/// Bare file names only; `.rhai` is appended when the name has no
/// extension.
fn normalized_name(name: &str) -> Result<String, StoreError> {
    if name.is_empty() || name.contains(['/', '\\']) || name.contains("..") {
        return Err(StoreError::InvalidName(name.to_string()));
    }
    if Path::new(name).extension().is_none() {
        Ok(format!("{name}.rhai"))
    } else {
        Ok(name.to_string())
    }
}
