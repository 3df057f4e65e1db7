//! Flat driver configuration, mirrored into chromium switches.

use std::path::PathBuf;

use crate::config::Config;
use crate::event::TaskEvent;

/// Applied when the descriptor does not override the user agent.
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) \
     AppleWebKit/537.36 (KHTML, like Gecko) Chrome/113.0.0.0 Safari/537.36";

/// Options one browser launch is built from.
#[derive(Debug, Clone)]
pub struct DriverOptions {
    pub headless: bool,
    pub needs_download_file: bool,
    pub download_dir: Option<PathBuf>,
    pub user_agent: Option<String>,
    /// Browser binary shipped in the container image. Ignored for clean
    /// initialization, where the browser is located automatically.
    pub binary: Option<PathBuf>,
    pub clean_init: bool,
    pub window: (u32, u32),
}

impl DriverOptions {
    pub fn from_event(event: &TaskEvent, config: &Config) -> Self {
        Self {
            headless: event.headless(),
            needs_download_file: event.needs_download_file,
            download_dir: event.download_folder.clone(),
            user_agent: event
                .user_agent
                .clone()
                .or_else(|| Some(DEFAULT_USER_AGENT.to_string())),
            binary: config.browser_binary.clone(),
            clean_init: event.clean_init,
            window: (config.screen_width, config.screen_height),
        }
    }

    /// The flat switch list handed to the browser process.
    pub fn chromium_args(&self) -> Vec<String> {
        let mut args: Vec<String> = [
            // Tasks open result windows; popup blocking stays off.
            "--disable-popup-blocking",
            // Hide the automation surface from the page.
            "--disable-blink-features=AutomationControlled",
            "--disable-extensions",
            "--disable-infobars",
            "--no-first-run",
            "--no-default-browser-check",
            // Container realities: no SUID sandbox, tiny /dev/shm.
            "--no-sandbox",
            "--disable-dev-shm-usage",
        ]
        .iter()
        .map(|s| s.to_string())
        .collect();

        if let Some(ua) = &self.user_agent {
            args.push(format!("--user-agent={ua}"));
        }
        if self.needs_download_file {
            // Downloads must land on disk without prompts or scans.
            args.push("--safebrowsing-disable-download-protection".to_string());
        }
        args
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn descriptor_defaults_produce_a_headless_container_launch() {
        let opts = DriverOptions::from_event(&TaskEvent::default(), &Config::default());
        assert!(opts.headless);
        assert!(!opts.clean_init);
        assert_eq!(opts.binary, Some(PathBuf::from("/tmp/chromium/chrome")));
        assert_eq!(opts.window, (1920, 1080));
    }

    #[test]
    fn default_user_agent_is_applied() {
        let opts = DriverOptions::from_event(&TaskEvent::default(), &Config::default());
        let args = opts.chromium_args();
        assert!(args
            .iter()
            .any(|a| a.starts_with("--user-agent=Mozilla/5.0")));
    }

    #[test]
    fn custom_user_agent_wins() {
        let event = TaskEvent {
            user_agent: Some("FirmBot/2.0".to_string()),
            ..Default::default()
        };
        let opts = DriverOptions::from_event(&event, &Config::default());
        assert!(opts
            .chromium_args()
            .contains(&"--user-agent=FirmBot/2.0".to_string()));
    }

    #[test]
    fn download_support_toggles_the_download_switches() {
        let event = TaskEvent {
            needs_download_file: true,
            ..Default::default()
        };
        let opts = DriverOptions::from_event(&event, &Config::default());
        assert!(opts
            .chromium_args()
            .contains(&"--safebrowsing-disable-download-protection".to_string()));

        let opts = DriverOptions::from_event(&TaskEvent::default(), &Config::default());
        assert!(!opts
            .chromium_args()
            .iter()
            .any(|a| a.contains("safebrowsing")));
    }
}
