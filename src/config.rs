use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Settings directory
    pub home_dir: PathBuf,
    /// Directory where fetched task scripts are cached
    pub scripts_dir: PathBuf,
    /// Browser binary shipped in the container image
    pub browser_binary: Option<PathBuf>,
    /// Virtual display geometry
    pub screen_width: u32,
    pub screen_height: u32,
    /// Base URL of the script server
    pub scripts_base_url: Option<String>,
    /// Object-store bucket queried when the descriptor asks for it
    pub bucket: Option<String>,
    pub region: String,
    /// URL opened by the built-in browser task
    pub task_url: String,
}

impl Default for Config {
    fn default() -> Self {
        let home_dir = dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".lexbot");
        Self {
            scripts_dir: home_dir.join("scripts"),
            home_dir,
            browser_binary: Some(PathBuf::from("/tmp/chromium/chrome")),
            screen_width: 1920,
            screen_height: 1080,
            scripts_base_url: None,
            bucket: None,
            region: "us-east-1".to_string(),
            task_url: "https://www.google.com/".to_string(),
        }
    }
}

impl Config {
    /// Load configuration from file, then apply environment overrides.
    pub fn load(path: Option<PathBuf>) -> Result<Self> {
        let config_path = if let Some(p) = path {
            p
        } else {
            let home_dir = dirs::home_dir().unwrap_or_else(|| PathBuf::from("."));
            home_dir.join(".lexbot").join("config.toml")
        };

        let mut config = if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)
                .with_context(|| format!("Failed to read {}", config_path.display()))?;
            toml::from_str(&content)
                .with_context(|| format!("Invalid config at {}", config_path.display()))?
        } else {
            Config::default()
        };
        config.apply_env();
        Ok(config)
    }

    /// Save configuration to file
    pub fn save(&self, path: Option<PathBuf>) -> Result<()> {
        let config_path = if let Some(p) = path {
            p
        } else {
            self.home_dir.join("config.toml")
        };

        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)?;
        std::fs::write(&config_path, content)?;
        Ok(())
    }

    /// Environment overrides win over the config file. The screen geometry
    /// keys match what the container images already export.
    fn apply_env(&mut self) {
        if let Some(width) = env_u32("SCREEN_WIDTH") {
            self.screen_width = width;
        }
        if let Some(height) = env_u32("SCREEN_HEIGHT") {
            self.screen_height = height;
        }
        if let Ok(binary) = std::env::var("LEXBOT_BROWSER_BINARY") {
            self.browser_binary = Some(PathBuf::from(binary));
        }
        if let Ok(url) = std::env::var("LEXBOT_SCRIPTS_URL") {
            self.scripts_base_url = Some(url);
        }
        if let Ok(bucket) = std::env::var("AWS_BUCKET") {
            self.bucket = Some(bucket);
        }
        if let Ok(region) = std::env::var("AWS_REGION") {
            self.region = region;
        }
    }

    /// Create the directories the handler expects to exist.
    pub fn ensure_dirs(&self) -> Result<()> {
        std::fs::create_dir_all(&self.scripts_dir)
            .with_context(|| format!("Failed to create {}", self.scripts_dir.display()))?;
        Ok(())
    }
}

fn env_u32(key: &str) -> Option<u32> {
    std::env::var(key).ok().and_then(|v| v.parse().ok())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn default_paths_live_under_home() {
        let config = Config::default();
        assert!(config.scripts_dir.starts_with(&config.home_dir));
        assert_eq!(config.screen_width, 1920);
        assert_eq!(config.screen_height, 1080);
    }

    #[test]
    fn save_then_load_roundtrips() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("config.toml");

        let mut config = Config::default();
        config.scripts_base_url = Some("https://scripts.example.com/".to_string());
        config.screen_width = 1280;
        config.save(Some(path.clone())).unwrap();

        let loaded = Config::load(Some(path)).unwrap();
        assert_eq!(
            loaded.scripts_base_url.as_deref(),
            Some("https://scripts.example.com/")
        );
        assert_eq!(loaded.screen_width, 1280);
    }

    #[test]
    fn missing_file_falls_back_to_defaults() {
        let temp = TempDir::new().unwrap();
        let loaded = Config::load(Some(temp.path().join("nope.toml"))).unwrap();
        assert_eq!(loaded.region, "us-east-1");
    }
}
