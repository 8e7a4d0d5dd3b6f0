//! Keyboard discovery

use std::path::{Path, PathBuf};

use anyhow::{bail, Result};
use evdev::Device;
use nix::unistd::{access, AccessFlags};

/// Information about an input device
#[derive(Debug)]
pub struct DeviceInfo {
    pub path: PathBuf,
    pub name: String,
}

/// Check if a device is a keyboard
pub fn is_keyboard(device: &Device) -> bool {
    device
        .supported_events()
        .contains(evdev::EventType::KEY)
        && device
            .supported_keys()
            .map(|keys| keys.contains(evdev::Key::KEY_A))
            .unwrap_or(false)
}

/// Whether the current user may read `path`.
pub fn is_readable(path: &Path) -> bool {
    access(path, AccessFlags::R_OK).is_ok()
}

fn event_nodes(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut paths = Vec::new();

    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        let is_event_node = path
            .file_name()
            .and_then(|n| n.to_str())
            .map(|n| n.starts_with("event"))
            .unwrap_or(false);
        if is_event_node {
            paths.push(path);
        }
    }

    paths.sort();
    Ok(paths)
}

/// Open every readable keyboard under /dev/input.
///
/// Fails when no keyboard could be opened; the error says whether the
/// nodes exist but are not readable by this user.
pub fn open_keyboards() -> Result<Vec<(DeviceInfo, Device)>> {
    let mut keyboards = Vec::new();
    let mut unreadable = 0usize;

    for path in event_nodes(Path::new("/dev/input"))? {
        if !is_readable(&path) {
            tracing::debug!("No read access to {}", path.display());
            unreadable += 1;
            continue;
        }

        match Device::open(&path) {
            Ok(device) if is_keyboard(&device) => {
                let name = device.name().unwrap_or("Unknown").to_string();
                tracing::info!("Monitoring keyboard '{}' at {}", name, path.display());
                keyboards.push((DeviceInfo { path, name }, device));
            }
            Ok(_) => {}
            Err(e) => {
                tracing::debug!("Could not open {}: {}", path.display(), e);
            }
        }
    }

    if keyboards.is_empty() {
        if unreadable > 0 {
            bail!(
                "no readable keyboards: {} input device(s) are not accessible, \
                 add this user to the 'input' group",
                unreadable
            );
        }
        bail!("no keyboards found under /dev/input");
    }

    Ok(keyboards)
}
