use serde::Deserialize;
use std::time::Duration;

/// Poll interval, per-step timeouts and settle delays, in milliseconds.
///
/// Defaults are tuned for a slow, server-rendered legacy application.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Timing {
    /// Interval between element lookups while waiting.
    pub poll_interval_ms: u64,

    /// Wait for the optional start button.
    pub start_timeout_ms: u64,
    /// Pause after pressing the start button.
    pub after_start_ms: u64,

    /// Wait for a marker link.
    pub marker_timeout_ms: u64,
    /// Pause after entering a marker, for the list screen to load.
    pub after_marker_ms: u64,
    /// Pause after closing a list screen.
    pub level_close_ms: u64,

    /// Pause after opening an item, for its detail screen to load.
    pub item_open_ms: u64,
    /// Wait for the "more options" link.
    pub more_timeout_ms: u64,
    /// Wait for each follow-up screen (history, add button, form).
    pub screen_timeout_ms: u64,
    /// Pause after the form appears, for its widgets to render.
    pub form_settle_ms: u64,
    /// Wait for the confirm button.
    pub confirm_timeout_ms: u64,
    /// Pause after submitting.
    pub after_submit_ms: u64,
    /// Pause after each closed overlay while unwinding.
    pub layer_close_ms: u64,

    /// Pause after clearing a disabled marker.
    pub enable_settle_ms: u64,
    /// Pause after pointer press and release.
    pub pointer_settle_ms: u64,
    /// Pause after the synthetic click.
    pub click_settle_ms: u64,

    /// Delay between dropdown toggle lookups.
    pub lookup_retry_ms: u64,
    /// Poll interval while waiting for an option menu.
    pub menu_poll_ms: u64,
    /// Wait for an option menu to open.
    pub menu_timeout_ms: u64,
    /// Pause after selecting a list entry.
    pub entry_settle_ms: u64,
}

impl Default for Timing {
    fn default() -> Self {
        Self {
            poll_interval_ms: 500,
            start_timeout_ms: 3000,
            after_start_ms: 2000,
            marker_timeout_ms: 3000,
            after_marker_ms: 3000,
            level_close_ms: 2000,
            item_open_ms: 3000,
            more_timeout_ms: 3000,
            screen_timeout_ms: 5000,
            form_settle_ms: 1000,
            confirm_timeout_ms: 2000,
            after_submit_ms: 2000,
            layer_close_ms: 800,
            enable_settle_ms: 50,
            pointer_settle_ms: 20,
            click_settle_ms: 200,
            lookup_retry_ms: 200,
            menu_poll_ms: 100,
            menu_timeout_ms: 1000,
            entry_settle_ms: 300,
        }
    }
}

impl Timing {
    pub fn poll(&self) -> Duration {
        ms(self.poll_interval_ms)
    }
}

pub(crate) fn ms(value: u64) -> Duration {
    Duration::from_millis(value)
}
