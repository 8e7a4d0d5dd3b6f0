//! Modifier capture from evdev keyboards
//!
//! Every keyboard's event stream is merged into one and reduced to
//! press/release events of the eight physical modifier keys. Autorepeat
//! and all other keys are dropped here, so the session only wakes for
//! modifier transitions.

use std::path::PathBuf;

use anyhow::{Context, Result};
use evdev::{Device, EventStream, EventType, InputEvent, Key};
use keyhint_core::{ModifierEvent, ModifierKey};
use tokio::sync::mpsc::UnboundedSender;
use tokio::task::JoinHandle;
use tokio_stream::{StreamExt, StreamMap};

use crate::device::DeviceInfo;

const RELEASE: i32 = 0;
const PRESS: i32 = 1;

/// Map an evdev key to the physical modifier it is, if any.
pub fn modifier_key(key: Key) -> Option<ModifierKey> {
    match key {
        Key::KEY_LEFTCTRL => Some(ModifierKey::LeftCtrl),
        Key::KEY_RIGHTCTRL => Some(ModifierKey::RightCtrl),
        Key::KEY_LEFTSHIFT => Some(ModifierKey::LeftShift),
        Key::KEY_RIGHTSHIFT => Some(ModifierKey::RightShift),
        Key::KEY_LEFTALT => Some(ModifierKey::LeftAlt),
        Key::KEY_RIGHTALT => Some(ModifierKey::RightAlt),
        Key::KEY_LEFTMETA => Some(ModifierKey::LeftSuper),
        Key::KEY_RIGHTMETA => Some(ModifierKey::RightSuper),
        _ => None,
    }
}

/// Reduce a raw input event to a modifier event. Repeats (value 2) are
/// not transitions and yield `None`.
pub fn to_modifier_event(event: &InputEvent) -> Option<ModifierEvent> {
    if event.event_type() != EventType::KEY {
        return None;
    }

    let key = modifier_key(Key::new(event.code()))?;
    match event.value() {
        PRESS => Some(ModifierEvent::press(key)),
        RELEASE => Some(ModifierEvent::release(key)),
        _ => None,
    }
}

/// Turn opened keyboards into one keyed stream map.
pub fn event_streams(
    keyboards: Vec<(DeviceInfo, Device)>,
) -> Result<StreamMap<PathBuf, EventStream>> {
    let mut streams = StreamMap::new();

    for (info, device) in keyboards {
        let stream = device.into_event_stream().with_context(|| {
            format!(
                "Failed to create event stream for '{}' at {}",
                info.name,
                info.path.display()
            )
        })?;
        streams.insert(info.path, stream);
    }

    Ok(streams)
}

/// Forward modifier events from every stream until all devices are gone
/// or the receiver is dropped.
///
/// A device that errors (unplugged, revoked) is removed and the others
/// keep going.
pub fn spawn_capture(
    mut streams: StreamMap<PathBuf, EventStream>,
    tx: UnboundedSender<ModifierEvent>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        while let Some((path, result)) = streams.next().await {
            match result {
                Ok(event) => {
                    let Some(event) = to_modifier_event(&event) else {
                        continue;
                    };
                    if tx.send(event).is_err() {
                        tracing::debug!("Session closed, stopping capture");
                        return;
                    }
                }
                Err(e) => {
                    tracing::warn!("Input device {} failed: {}", path.display(), e);
                    streams.remove(&path);
                }
            }
        }

        tracing::warn!("No input devices left to monitor");
    })
}
