//! Adapters for the custom widgets on the entry form.
//!
//! Two interactions: picking an option from a custom dropdown found by its
//! label, and moving an entry of a dual list box to the right-hand side.

use crate::config::timing::ms;
use crate::interact::force_interact;
use crate::locate::wait_for;
use crate::page::{Element, ElementRef, Query, TargetPage};
use crate::{Error, Result, Timing, Widgets};
use tokio::time::sleep;
use tracing::{debug, info, warn};

/// Ancestor levels searched above a label for its dropdown toggle.
const TOGGLE_SEARCH_DEPTH: usize = 5;
/// Toggle lookups before giving up; the form renders its widgets late.
const TOGGLE_LOOKUP_ATTEMPTS: usize = 5;
/// Ancestor levels searched above a list box for its move-right control.
const TRANSFER_SEARCH_DEPTH: usize = 6;

/// Find the dropdown toggle that belongs to `label`.
///
/// For each visible element owning text `label`, walks up to five ancestors
/// and takes the first toggle inside that ancestor that comes after the label
/// in document order. The nearest ancestor holding such a toggle wins. The
/// same label text can sit near unrelated controls; following the label in
/// markup order is what ties a toggle to it.
pub async fn find_dropdown_toggle<P: TargetPage + ?Sized>(
    page: &P,
    label: &str,
    widgets: &Widgets,
) -> Result<Option<Element>> {
    let toggle_query = Query::css(widgets.toggle.as_str());
    let labels = page.query(None, &Query::text("*", label)).await?;

    for label_el in labels.iter().filter(|l| l.visible) {
        let mut container = page.parent(&label_el.handle).await?;
        for _ in 0..TOGGLE_SEARCH_DEPTH {
            let Some(scope) = container else { break };
            for toggle in page.query(Some(&scope), &toggle_query).await? {
                if page.follows(&label_el.handle, &toggle.handle).await? {
                    return Ok(Some(toggle));
                }
            }
            container = page.parent(&scope).await?;
        }
    }
    Ok(None)
}

/// Open the dropdown labelled `label` and pick option `index` (0-based).
///
/// If the menu does not open, the toggle is activated once more before
/// giving up. An index past the end closes the menu again and fails with
/// [`Error::OptionOutOfRange`].
pub async fn select_option<P: TargetPage + ?Sized>(
    page: &P,
    label: &str,
    index: usize,
    widgets: &Widgets,
    timing: &Timing,
) -> Result<()> {
    debug!("selecting option {} of '{}'", index, label);

    let mut toggle = None;
    for attempt in 0..TOGGLE_LOOKUP_ATTEMPTS {
        toggle = find_dropdown_toggle(page, label, widgets).await?;
        if toggle.is_some() {
            break;
        }
        if attempt + 1 < TOGGLE_LOOKUP_ATTEMPTS {
            sleep(ms(timing.lookup_retry_ms)).await;
        }
    }
    let toggle = toggle.ok_or_else(|| {
        Error::Ambiguous(format!("no dropdown toggle follows label '{}'", label))
    })?;

    let menu = match open_menu(page, &toggle.handle, widgets, timing).await? {
        Some(menu) => menu,
        None => {
            warn!("menu for '{}' did not open, activating toggle again", label);
            open_menu(page, &toggle.handle, widgets, timing)
                .await?
                .ok_or_else(|| Error::MenuNotOpened(label.to_string()))?
        }
    };

    let options = page
        .query(Some(&menu.handle), &Query::css(widgets.option.as_str()))
        .await?;
    let Some(option) = options.get(index) else {
        // the toggle closes the menu it opened
        force_interact(page, &toggle.handle, timing).await?;
        return Err(Error::OptionOutOfRange {
            label: label.to_string(),
            index,
            available: options.len(),
        });
    };

    debug!("'{}' -> '{}'", label, option.text);
    force_interact(page, &option.handle, timing).await
}

async fn open_menu<P: TargetPage + ?Sized>(
    page: &P,
    toggle: &ElementRef,
    widgets: &Widgets,
    timing: &Timing,
) -> Result<Option<Element>> {
    force_interact(page, toggle, timing).await?;
    let located = wait_for(
        page,
        None,
        &Query::css(widgets.menu.as_str()),
        ms(timing.menu_timeout_ms),
        ms(timing.menu_poll_ms),
    )
    .await?;
    Ok(located.into_element())
}

/// Select the list entry containing `search` and press the move-right
/// control next to its list.
pub async fn move_to_right<P: TargetPage + ?Sized>(
    page: &P,
    search: &str,
    widgets: &Widgets,
    timing: &Timing,
) -> Result<()> {
    debug!("moving '{}' to the right", search);

    let entry = page
        .query(None, &Query::text(widgets.list_entry.as_str(), search))
        .await?
        .into_iter()
        .next()
        .ok_or_else(|| Error::NotFound(format!("list entry '{}'", search)))?;

    page.select_entry(&entry.handle).await?;
    sleep(ms(timing.entry_settle_ms)).await;

    let control = find_transfer_control(page, &entry.handle, widgets)
        .await?
        .ok_or_else(|| Error::NotFound(format!("move-right control near '{}'", search)))?;

    force_interact(page, &control.handle, timing).await?;
    info!("moved '{}' to the right", search);
    Ok(())
}

/// Walk up from the entry's list looking for a visible control labelled
/// with a right-pointing glyph or carrying a right-arrow icon.
async fn find_transfer_control<P: TargetPage + ?Sized>(
    page: &P,
    entry: &ElementRef,
    widgets: &Widgets,
) -> Result<Option<Element>> {
    let list = page.parent(entry).await?;
    let mut container = match list {
        Some(list) => page.parent(&list).await?,
        None => None,
    };
    let controls = Query::css(widgets.transfer_controls.as_str());
    let icons = Query::css(widgets.transfer_icons.join(", "));

    for _ in 0..TRANSFER_SEARCH_DEPTH {
        let Some(scope) = container else { break };
        for control in page.query(Some(&scope), &controls).await? {
            if !control.visible {
                continue;
            }
            if widgets.transfer_glyphs.iter().any(|g| control.text == *g) {
                return Ok(Some(control));
            }
            if !widgets.transfer_icons.is_empty()
                && !page.query(Some(&control.handle), &icons).await?.is_empty()
            {
                return Ok(Some(control));
            }
        }
        container = page.parent(&scope).await?;
    }
    Ok(None)
}
