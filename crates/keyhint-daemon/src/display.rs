//! Outbound overlay notifications
//!
//! The session never draws anything itself. It pushes filter results and
//! visibility changes through a [`DisplayGateway`]; what happens to them is
//! up to the implementation.

use std::io::Write;

use keyhint_config::PopupSettings;
use keyhint_core::FilterResult;
use serde::Serialize;

/// Receiver of overlay updates.
pub trait DisplayGateway {
    fn on_filter_changed(&mut self, result: &FilterResult);

    fn on_visibility_changed(&mut self, visible: bool);
}

impl<D: DisplayGateway + ?Sized> DisplayGateway for Box<D> {
    fn on_filter_changed(&mut self, result: &FilterResult) {
        (**self).on_filter_changed(result)
    }

    fn on_visibility_changed(&mut self, visible: bool) {
        (**self).on_visibility_changed(visible)
    }
}

/// Writes overlay contents to the log.
#[derive(Debug, Default)]
pub struct LogDisplay {
    visible: bool,
}

impl DisplayGateway for LogDisplay {
    fn on_filter_changed(&mut self, result: &FilterResult) {
        if !self.visible && result.is_empty() {
            return;
        }

        tracing::info!("{} ({} shortcut(s))", result.label, result.len());
        for entry in &result.priority {
            tracing::info!("  {:<28} {}", entry.keycap(), entry.description);
        }
        if result.has_separator() {
            tracing::info!("  ---");
        }
        for entry in &result.secondary {
            tracing::info!("  {:<28} {}", entry.keycap(), entry.description);
        }
    }

    fn on_visibility_changed(&mut self, visible: bool) {
        self.visible = visible;
        if visible {
            tracing::info!("Overlay shown");
        } else {
            tracing::info!("Overlay hidden");
        }
    }
}

#[derive(Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
enum Notification<'a> {
    Filter {
        #[serde(flatten)]
        result: &'a FilterResult,
    },
    Visibility {
        visible: bool,
        popup: &'a PopupSettings,
    },
}

/// Emits one JSON object per line, for an external renderer to consume.
///
/// ```text
/// {"event":"visibility","visible":true,"popup":{"timeout_ms":3000,...}}
/// {"event":"filter","label":"Available Shortcuts (CTRL + ...)","priority":[...],"secondary":[...]}
/// ```
pub struct JsonLinesDisplay<W: Write> {
    writer: W,
    popup: PopupSettings,
}

impl<W: Write> JsonLinesDisplay<W> {
    pub fn new(writer: W, popup: PopupSettings) -> Self {
        Self { writer, popup }
    }

    fn emit(&mut self, notification: &Notification<'_>) {
        let written = serde_json::to_writer(&mut self.writer, notification)
            .map_err(std::io::Error::from)
            .and_then(|_| writeln!(self.writer))
            .and_then(|_| self.writer.flush());
        if let Err(e) = written {
            tracing::warn!("Failed to write overlay notification: {}", e);
        }
    }
}

impl<W: Write> DisplayGateway for JsonLinesDisplay<W> {
    fn on_filter_changed(&mut self, result: &FilterResult) {
        self.emit(&Notification::Filter { result });
    }

    fn on_visibility_changed(&mut self, visible: bool) {
        let popup = self.popup;
        self.emit(&Notification::Visibility {
            visible,
            popup: &popup,
        });
    }
}
