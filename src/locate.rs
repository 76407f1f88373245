//! Element lookup that waits for the page to catch up.

use crate::page::{Element, ElementRef, Query, TargetPage};
use crate::Result;
use std::time::{Duration, Instant};
use tracing::debug;

/// Outcome of a bounded wait for an element.
#[derive(Debug, Clone)]
pub struct Located {
    /// First visible match, or `None` if the wait timed out.
    pub element: Option<Element>,
    /// Number of lookups performed.
    pub attempts: u32,
    pub elapsed: Duration,
    pub timeout: Duration,
}

impl Located {
    pub fn found(&self) -> bool {
        self.element.is_some()
    }

    pub fn into_element(self) -> Option<Element> {
        self.element
    }
}

/// One lookup: the first visible match in document order.
pub async fn find_visible<P: TargetPage + ?Sized>(
    page: &P,
    scope: Option<&ElementRef>,
    query: &Query,
) -> Result<Option<Element>> {
    Ok(page
        .query(scope, query)
        .await?
        .into_iter()
        .find(|el| el.visible))
}

/// Look up `query` every `poll` until a visible match appears or `timeout`
/// runs out.
///
/// The budget is counted in lookups (`timeout / poll + 1`, at least one), so
/// a page that answers instantly behaves the same under test as in a real
/// browser. A timeout is not an error: it yields `element: None`.
pub async fn wait_for<P: TargetPage + ?Sized>(
    page: &P,
    scope: Option<&ElementRef>,
    query: &Query,
    timeout: Duration,
    poll: Duration,
) -> Result<Located> {
    let start = Instant::now();
    let budget = attempt_budget(timeout, poll);

    for attempt in 1..=budget {
        if let Some(element) = find_visible(page, scope, query).await? {
            debug!("found {} after {} attempt(s)", query, attempt);
            return Ok(Located {
                element: Some(element),
                attempts: attempt,
                elapsed: start.elapsed(),
                timeout,
            });
        }
        if attempt < budget {
            tokio::time::sleep(poll).await;
        }
    }

    debug!("{} not visible within {}ms", query, timeout.as_millis());
    Ok(Located {
        element: None,
        attempts: budget,
        elapsed: start.elapsed(),
        timeout,
    })
}

fn attempt_budget(timeout: Duration, poll: Duration) -> u32 {
    let poll = poll.as_nanos().max(1);
    let extra = (timeout.as_nanos() / poll).min(u32::MAX as u128 - 1) as u32;
    extra + 1
}
