//! Virtual display (Xvfb) lifetime management.
//!
//! Non-headless tasks need an X server even inside a container. The guard
//! spawns Xvfb on a free display number, exports `DISPLAY` once the server
//! socket appears, and kills the server on `stop()` or `Drop` so it is gone
//! on every exit path.

use std::path::{Path, PathBuf};
use std::process::{Child, Command, Stdio};
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use sysinfo::{Pid, System};
use tracing::{debug, info, warn};

const SOCKET_DIR: &str = "/tmp/.X11-unix";
const STARTUP_TIMEOUT: Duration = Duration::from_secs(5);

pub struct VirtualDisplay {
    child: Child,
    display: String,
    stopped: bool,
}

impl VirtualDisplay {
    /// Spawn Xvfb and export `DISPLAY` once the server is accepting.
    pub fn start(width: u32, height: u32) -> Result<Self> {
        let number = free_display_number();
        let display = format!(":{number}");

        let mut cmd = Command::new("Xvfb");
        cmd.arg(&display)
            .args(["-screen", "0"])
            .arg(format!("{width}x{height}x24"))
            .args(["-nolisten", "tcp"])
            .stdout(Stdio::null())
            .stderr(Stdio::null());

        let guard = Self::launch(cmd, display, Some(socket_path(number)))?;
        std::env::set_var("DISPLAY", &guard.display);
        info!(display = %guard.display, width, height, "virtual display started");
        Ok(guard)
    }

    fn launch(mut cmd: Command, display: String, wait_for: Option<PathBuf>) -> Result<Self> {
        let mut child = cmd
            .spawn()
            .context("Failed to spawn Xvfb (is it installed in the image?)")?;

        if let Some(socket) = wait_for {
            let deadline = Instant::now() + STARTUP_TIMEOUT;
            while !socket.exists() {
                if let Some(status) = child.try_wait()? {
                    anyhow::bail!("Xvfb exited during startup: {status}");
                }
                if Instant::now() > deadline {
                    let _ = child.kill();
                    let _ = child.wait();
                    anyhow::bail!(
                        "Xvfb did not create {} within {:?}",
                        socket.display(),
                        STARTUP_TIMEOUT
                    );
                }
                std::thread::sleep(Duration::from_millis(50));
            }
        }

        Ok(Self {
            child,
            display,
            stopped: false,
        })
    }

    pub fn display_name(&self) -> &str {
        &self.display
    }

    pub fn pid(&self) -> u32 {
        self.child.id()
    }

    /// Stop the server. Drop does the same, so the display is cleaned up
    /// even when the task errors out.
    pub fn stop(mut self) {
        self.shutdown();
    }

    fn shutdown(&mut self) {
        if self.stopped {
            return;
        }
        self.stopped = true;
        if let Err(e) = self.child.kill() {
            warn!(display = %self.display, error = %e, "failed to kill display server");
        }
        let _ = self.child.wait();
        debug!(display = %self.display, "virtual display stopped");
    }
}

impl Drop for VirtualDisplay {
    fn drop(&mut self) {
        self.shutdown();
    }
}

/// Check whether a process with the given PID is alive.
pub fn is_process_alive(pid: u32) -> bool {
    let mut sys = System::new();
    sys.refresh_processes(
        sysinfo::ProcessesToUpdate::Some(&[Pid::from_u32(pid)]),
        true,
    );
    sys.process(Pid::from_u32(pid)).is_some()
}

fn socket_path(number: u32) -> PathBuf {
    Path::new(SOCKET_DIR).join(format!("X{number}"))
}

/// First display number without an existing X socket, starting at :99.
fn free_display_number() -> u32 {
    (99..199).find(|n| !socket_path(*n).exists()).unwrap_or(99)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fake_server() -> Command {
        let mut cmd = Command::new("sleep");
        cmd.arg("30");
        cmd
    }

    #[test]
    fn stop_kills_the_server_process() {
        let guard = VirtualDisplay::launch(fake_server(), ":999".to_string(), None).unwrap();
        let pid = guard.pid();
        assert!(is_process_alive(pid));

        guard.stop();
        assert!(!is_process_alive(pid));
    }

    #[test]
    fn drop_kills_the_server_process() {
        let pid = {
            let guard = VirtualDisplay::launch(fake_server(), ":998".to_string(), None).unwrap();
            guard.pid()
        };
        assert!(!is_process_alive(pid));
    }

    #[test]
    fn free_display_starts_at_ninety_nine() {
        assert!(free_display_number() >= 99);
    }
}
