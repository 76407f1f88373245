//! Low-level interactions that have to work on an uncooperative page.

use crate::config::timing::ms;
use crate::page::{ElementRef, Pointer, Query, TargetPage};
use crate::{Error, Result, Timing, Widgets};
use std::time::Duration;
use tokio::time::sleep;
use tracing::debug;

/// How an overlay was dismissed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CloseStrategy {
    /// Clicked a visible close control.
    Control,
    /// No close control was visible; sent Escape.
    Escape,
}

/// Activate an element even if the page has disabled it.
///
/// Clears the disabled marker first (and gives the page's framework a moment
/// to notice), scrolls the element into view, then sends press, release and
/// click. Handlers bound to the press/release pair fire as well as plain
/// click handlers.
pub async fn force_interact<P: TargetPage + ?Sized>(
    page: &P,
    element: &ElementRef,
    timing: &Timing,
) -> Result<()> {
    let current = page
        .inspect(element)
        .await?
        .ok_or_else(|| Error::NotFound(format!("element {} is gone", element)))?;

    if current.disabled {
        debug!("clearing disabled state on {} '{}'", current.tag, current.text);
        page.clear_disabled(element).await?;
        sleep(ms(timing.enable_settle_ms)).await;
    }

    if let Err(e) = page.scroll_into_view(element).await {
        debug!("scroll into view failed, continuing: {}", e);
    }

    page.dispatch(element, Pointer::Press).await?;
    sleep(ms(timing.pointer_settle_ms)).await;
    page.dispatch(element, Pointer::Release).await?;
    sleep(ms(timing.pointer_settle_ms)).await;
    page.dispatch(element, Pointer::Click).await?;
    sleep(ms(timing.click_settle_ms)).await;
    Ok(())
}

/// Dismiss the topmost overlay.
///
/// The last visible close control belongs to the most recently opened layer.
/// Escape is the fallback when no close control is visible. Exactly one layer
/// is closed per call.
pub async fn close_active_overlay<P: TargetPage + ?Sized>(
    page: &P,
    widgets: &Widgets,
) -> Result<CloseStrategy> {
    let controls = page
        .query(None, &Query::css(widgets.close_controls.as_str()))
        .await?;

    if let Some(control) = controls.iter().rev().find(|c| c.visible) {
        debug!("closing overlay via {} {}", control.tag, control.handle);
        page.dispatch(&control.handle, Pointer::Click).await?;
        return Ok(CloseStrategy::Control);
    }

    debug!("no close control visible, sending Escape");
    page.press_escape().await?;
    Ok(CloseStrategy::Escape)
}

/// Close `layers` overlays, pausing after each one.
pub async fn unwind<P: TargetPage + ?Sized>(
    page: &P,
    widgets: &Widgets,
    layers: usize,
    pause: Duration,
) -> Result<()> {
    for _ in 0..layers {
        close_active_overlay(page, widgets).await?;
        sleep(pause).await;
    }
    Ok(())
}
