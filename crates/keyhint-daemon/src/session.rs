//! The overlay session
//!
//! One task owns the tracker, registry and auto-hide timer. Modifier events,
//! peek requests and timer expiry are handled strictly one at a time, so
//! notifications go out in the order their causes arrived.

use std::time::Duration;

use keyhint_core::{
    filter, overview, ModifierEvent, ModifierTracker, ShortcutMap, ShortcutRegistry, Visibility,
};
use tokio::sync::mpsc::UnboundedReceiver;
use tokio::time::Instant;

use crate::autohide::AutoHide;
use crate::display::DisplayGateway;

pub struct Session<D> {
    registry: ShortcutRegistry,
    aliases: ShortcutMap,
    tracker: ModifierTracker,
    display: D,
    visible: bool,
    autohide: AutoHide,
    peek_timeout: Duration,
}

impl<D: DisplayGateway> Session<D> {
    pub fn new(
        registry: ShortcutRegistry,
        aliases: ShortcutMap,
        peek_timeout: Duration,
        display: D,
    ) -> Self {
        Self {
            registry,
            aliases,
            tracker: ModifierTracker::new(),
            display,
            visible: false,
            autohide: AutoHide::new(),
            peek_timeout,
        }
    }

    /// Feed one modifier transition through the tracker and filter.
    pub fn handle_event(&mut self, event: ModifierEvent) {
        let Some(change) = self.tracker.handle(event) else {
            return;
        };

        // A peek overview stays as it is until a qualifying modifier takes over
        if self.autohide.is_armed() && !change.state.any_qualifying() {
            tracing::debug!("Keeping peek overview");
            return;
        }

        let result = filter(self.registry.merged(), &self.aliases, &change.state);
        self.display.on_filter_changed(&result);

        match change.visibility {
            Some(Visibility::Show) => {
                self.autohide.cancel();
                self.set_visible(true);
            }
            Some(Visibility::Hide) => self.set_visible(false),
            None => {}
        }
    }

    /// Show every shortcut and hide again after the peek timeout.
    ///
    /// Ignored while held modifiers keep the overlay up.
    pub fn peek(&mut self, now: Instant) {
        if self.tracker.state().any_qualifying() {
            tracing::debug!("Peek ignored, modifiers are held");
            return;
        }

        let result = overview(self.registry.merged(), &self.aliases);
        tracing::debug!("Peek with {} shortcut(s)", result.len());
        if self.autohide.is_armed() {
            tracing::debug!("Replacing pending auto-hide");
        }
        self.display.on_filter_changed(&result);
        self.set_visible(true);
        self.autohide.arm(now + self.peek_timeout);
    }

    /// The auto-hide deadline passed.
    pub fn expire(&mut self) {
        self.autohide.cancel();
        if self.tracker.state().any_qualifying() {
            return;
        }
        self.set_visible(false);
    }

    fn set_visible(&mut self, visible: bool) {
        if self.visible != visible {
            self.visible = visible;
            self.display.on_visibility_changed(visible);
        }
    }

    /// Run until the modifier event channel closes.
    pub async fn run(
        mut self,
        mut events: UnboundedReceiver<ModifierEvent>,
        mut peeks: UnboundedReceiver<()>,
    ) -> Self {
        let mut peeks_open = true;

        loop {
            tokio::select! {
                event = events.recv() => match event {
                    Some(event) => self.handle_event(event),
                    None => break,
                },
                peek = peeks.recv(), if peeks_open => match peek {
                    Some(()) => self.peek(Instant::now()),
                    None => peeks_open = false,
                },
                _ = self.autohide.expired() => self.expire(),
            }
        }

        tracing::debug!("Session stopped");
        self
    }
}
