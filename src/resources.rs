//! Resource-usage logging around the built-in browser task.

use std::path::Path;

use sysinfo::{Disks, ProcessesToUpdate, System};
use tracing::{debug, warn};

/// Log current process memory and available space on the disk backing /tmp.
/// Failures here never affect the task.
pub fn log_resource_usage(stage: &str) {
    match sysinfo::get_current_pid() {
        Ok(pid) => {
            let mut sys = System::new();
            sys.refresh_processes(ProcessesToUpdate::Some(&[pid]), true);
            if let Some(process) = sys.process(pid) {
                debug!(stage, memory_kb = process.memory() / 1024, "process memory");
            }
        }
        Err(e) => warn!(stage, error = e, "could not resolve current pid"),
    }

    let disks = Disks::new_with_refreshed_list();
    let tmp = Path::new("/tmp");
    // Longest mount-point prefix wins (/, /tmp, ...).
    let backing = disks
        .list()
        .iter()
        .filter(|disk| tmp.starts_with(disk.mount_point()))
        .max_by_key(|disk| disk.mount_point().as_os_str().len());
    if let Some(disk) = backing {
        debug!(
            stage,
            available_kb = disk.available_space() / 1024,
            mount = %disk.mount_point().display(),
            "disk space"
        );
    }
}
