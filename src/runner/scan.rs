//! Reading a list screen and choosing the next item to work on.

use crate::page::{ElementRef, Query, TargetPage};
use crate::tracker::ItemTracker;
use crate::{Result, Workflow};

/// One data row of a list screen.
#[derive(Debug, Clone)]
pub struct ListRow {
    /// Display name of the item (text of the row's first link).
    pub name: String,
    /// The row's checkbox is ticked.
    pub confirmed: bool,
    /// The link that opens the item.
    pub link: ElementRef,
}

/// What a fresh read of the list screen found.
#[derive(Debug, Clone)]
pub enum ListScreen {
    /// No visible table carries all the expected headers.
    Missing,
    /// The table has no data rows, or only the "no data" placeholder.
    Empty,
    Rows(Vec<ListRow>),
}

/// Result of scanning the rows for work.
#[derive(Debug, Clone)]
pub enum ScanOutcome {
    /// The first unconfirmed, eligible row.
    Target(ListRow),
    /// Every named row is confirmed.
    AllConfirmed,
    /// Unconfirmed rows remain but all of them are quarantined or already
    /// handled this run.
    AllQuarantined { pending: usize },
}

/// Read the list screen's table from scratch.
///
/// The table is the first visible one whose text contains every configured
/// header. A row's confirmed state comes from whichever checkbox it holds,
/// not from a fixed column; rows without a link are skipped.
pub async fn read_list<P: TargetPage + ?Sized>(page: &P, workflow: &Workflow) -> Result<ListScreen> {
    let tables = page.query(None, &Query::css("table")).await?;
    let Some(table) = tables.into_iter().find(|t| {
        t.visible && workflow.table_headers.iter().all(|h| t.text.contains(h.as_str()))
    }) else {
        return Ok(ListScreen::Missing);
    };

    let rows = page
        .query(Some(&table.handle), &Query::css("tbody tr"))
        .await?;
    let placeholder = match (rows.as_slice(), workflow.no_data_text.as_deref()) {
        ([only], Some(no_data)) => only.text.contains(no_data),
        _ => false,
    };
    if rows.is_empty() || placeholder {
        return Ok(ListScreen::Empty);
    }

    let link_query = Query::css("a");
    let checkbox_query = Query::css(r#"input[type="checkbox"]"#);
    let mut list = Vec::with_capacity(rows.len());
    for row in &rows {
        let Some(link) = page
            .query(Some(&row.handle), &link_query)
            .await?
            .into_iter()
            .next()
        else {
            continue;
        };
        let name = link.text.trim().to_string();
        if name.is_empty() {
            continue;
        }
        let confirmed = page
            .query(Some(&row.handle), &checkbox_query)
            .await?
            .first()
            .and_then(|c| c.checked)
            .unwrap_or(false);
        list.push(ListRow {
            name,
            confirmed,
            link: link.handle,
        });
    }
    Ok(ListScreen::Rows(list))
}

/// Pick the next row to process.
///
/// Scans top to bottom. Confirmed rows are recorded as completed. The first
/// unconfirmed row that is still eligible is returned and scanning stops
/// there; later rows wait for the next pass.
pub fn select_target(rows: Vec<ListRow>, tracker: &mut ItemTracker) -> ScanOutcome {
    let mut pending = 0;
    for row in rows {
        if row.confirmed {
            tracker.mark_completed(&row.name);
            continue;
        }
        if tracker.is_eligible(&row.name) {
            return ScanOutcome::Target(row);
        }
        pending += 1;
    }
    if pending == 0 {
        ScanOutcome::AllConfirmed
    } else {
        ScanOutcome::AllQuarantined { pending }
    }
}
