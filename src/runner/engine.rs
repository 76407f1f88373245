//! The traversal state machine.

use super::scan::{read_list, select_target, ListRow, ListScreen, ScanOutcome};
use crate::config::timing::ms;
use crate::interact::{force_interact, unwind};
use crate::locate::{wait_for, Located};
use crate::page::{Element, Query, TargetPage};
use crate::tracker::ItemTracker;
use crate::widgets::{move_to_right, select_option};
use crate::{Config, Error, Result};
use std::collections::{HashMap, HashSet};
use tokio::time::sleep;
use tracing::{debug, info, warn};

/// Where the traversal is.
#[derive(Debug, Clone)]
pub enum State {
    /// Looking for the next top-level marker.
    SeekMarker,
    /// Reading the current list screen.
    ScanList,
    /// Working on one item of the current list.
    ProcessItem(ListRow),
    /// No marker left to enter.
    Done,
}

impl State {
    fn name(&self) -> &'static str {
        match self {
            State::SeekMarker => "seek_marker",
            State::ScanList => "scan_list",
            State::ProcessItem(_) => "process_item",
            State::Done => "done",
        }
    }
}

/// Counters and outcomes of one engine run.
#[derive(Debug, Clone, Default)]
pub struct RunReport {
    /// Items confirmed during the run or found already confirmed.
    pub completed: Vec<String>,
    /// Items that failed and were skipped from then on.
    pub failed: Vec<String>,
    /// Markers left alone because their last visit made no progress.
    pub stalled_markers: Vec<String>,
    pub markers_visited: usize,
    pub items_processed: usize,
}

/// A failed item step and how many overlays it left open.
struct ItemFailure {
    layers: usize,
    error: Error,
}

fn at_depth(layers: usize) -> impl Fn(Error) -> ItemFailure {
    move |error| ItemFailure { layers, error }
}

/// The marker currently entered.
struct LevelVisit {
    key: String,
    progressed: bool,
}

/// Walks markers and their list screens, one item at a time.
///
/// Nothing from the page is kept across states except item names in the
/// tracker and marker keys in the stall set. Every state starts from a fresh
/// query.
///
/// A visit that leaves a marker without processing anything stalls it, so it
/// is not entered again. A missing list table is the exception: the marker
/// gets `list_retries` more visits first.
pub struct Engine<'a, P: TargetPage + ?Sized> {
    page: &'a P,
    config: &'a Config,
    tracker: ItemTracker,
    stalled: HashSet<String>,
    missing_lists: HashMap<String, u32>,
    level: Option<LevelVisit>,
    report: RunReport,
}

impl<'a, P: TargetPage + ?Sized> Engine<'a, P> {
    pub fn new(page: &'a P, config: &'a Config) -> Self {
        Self::with_tracker(page, config, ItemTracker::new())
    }

    /// Start from an existing tracker, e.g. to carry quarantine over.
    pub fn with_tracker(page: &'a P, config: &'a Config, tracker: ItemTracker) -> Self {
        Self {
            page,
            config,
            tracker,
            stalled: HashSet::new(),
            missing_lists: HashMap::new(),
            level: None,
            report: RunReport::default(),
        }
    }

    pub fn tracker(&self) -> &ItemTracker {
        &self.tracker
    }

    /// Run until no marker is left.
    ///
    /// Item and level failures are absorbed here; only page driver errors
    /// outside an item end the run early.
    pub async fn run(&mut self) -> Result<RunReport> {
        self.press_start().await?;

        let mut state = State::SeekMarker;
        loop {
            debug!("state: {}", state.name());
            state = match state {
                State::SeekMarker => self.seek_marker().await?,
                State::ScanList => self.scan_list().await?,
                State::ProcessItem(row) => self.process_item(row).await?,
                State::Done => break,
            };
        }

        info!(
            "run finished: {} completed, {} failed, {} marker(s) visited",
            self.tracker.completed_count(),
            self.tracker.failed_count(),
            self.report.markers_visited
        );
        if let Err(e) = self.page.notify(&self.config.workflow.done_message).await {
            warn!("could not show completion notice: {}", e);
        }

        let mut report = self.report.clone();
        report.completed = self.tracker.completed().map(String::from).collect();
        report.failed = self.tracker.failed().map(String::from).collect();
        report.stalled_markers = self.stalled.iter().cloned().collect();
        report.stalled_markers.sort();
        Ok(report)
    }

    async fn wait_text(&self, selector: &str, text: &str, timeout_ms: u64) -> Result<Located> {
        wait_for(
            self.page,
            None,
            &Query::text(selector, text),
            ms(timeout_ms),
            self.config.timing.poll(),
        )
        .await
    }

    async fn press_start(&self) -> Result<()> {
        let Some(label) = self.config.workflow.start_button.as_deref() else {
            return Ok(());
        };
        let timing = &self.config.timing;
        match self
            .wait_text("button", label, timing.start_timeout_ms)
            .await?
            .into_element()
        {
            Some(button) => {
                info!("pressing start button '{}'", label);
                force_interact(self.page, &button.handle, timing).await?;
                sleep(ms(timing.after_start_ms)).await;
            }
            None => debug!("start button '{}' not shown, continuing", label),
        }
        Ok(())
    }

    async fn seek_marker(&mut self) -> Result<State> {
        let wf = &self.config.workflow;
        let timing = &self.config.timing;
        let query = Query::text(wf.marker.selector.as_str(), wf.marker.text.as_str());

        let located = wait_for(
            self.page,
            None,
            &query,
            ms(timing.marker_timeout_ms),
            timing.poll(),
        )
        .await?;
        if !located.found() {
            info!("no marker left on screen");
            return Ok(State::Done);
        }

        let markers: Vec<Element> = self
            .page
            .query(None, &query)
            .await?
            .into_iter()
            .filter(|m| m.visible)
            .collect();
        let mut chosen = None;
        for (position, marker) in markers.iter().enumerate() {
            let key = self.marker_key(marker, position).await?;
            if !self.stalled.contains(&key) {
                chosen = Some((marker, key));
                break;
            }
        }
        let Some((marker, key)) = chosen else {
            warn!(
                "{} marker(s) remain but made no progress on their last visit, stopping",
                markers.len()
            );
            return Ok(State::Done);
        };

        info!("entering marker '{}'", key);
        force_interact(self.page, &marker.handle, timing).await?;
        sleep(ms(timing.after_marker_ms)).await;
        self.report.markers_visited += 1;
        self.level = Some(LevelVisit {
            key,
            progressed: false,
        });
        Ok(State::ScanList)
    }

    /// Identify a marker by the text of its row and its position among the
    /// visible markers.
    async fn marker_key(&self, marker: &Element, position: usize) -> Result<String> {
        let row = self.page.closest(&marker.handle, "tr").await?;
        Ok(match row {
            Some(row) if !row.text.trim().is_empty() => format!(
                "{} #{}",
                row.text.split_whitespace().collect::<Vec<_>>().join(" "),
                position + 1
            ),
            _ => format!("#{}", position + 1),
        })
    }

    async fn scan_list(&mut self) -> Result<State> {
        match read_list(self.page, &self.config.workflow).await? {
            ListScreen::Missing => {
                warn!("list table not found, closing the screen");
                self.leave_level(true).await
            }
            ListScreen::Empty => {
                info!("list screen has no data, going back");
                self.leave_level(false).await
            }
            ListScreen::Rows(rows) => match select_target(rows, &mut self.tracker) {
                ScanOutcome::Target(row) => Ok(State::ProcessItem(row)),
                ScanOutcome::AllConfirmed => {
                    info!("every item on this list is confirmed, going back");
                    self.leave_level(false).await
                }
                ScanOutcome::AllQuarantined { pending } => {
                    warn!(
                        "{} unconfirmed item(s) left, all skipped after earlier failures; going back",
                        pending
                    );
                    self.leave_level(false).await
                }
            },
        }
    }

    /// Close the list screen and go look for the next marker.
    ///
    /// `table_missing` is set when the list table never showed up, which
    /// costs the marker one of its retries instead of stalling it outright.
    async fn leave_level(&mut self, table_missing: bool) -> Result<State> {
        unwind(
            self.page,
            &self.config.widgets,
            1,
            ms(self.config.timing.level_close_ms),
        )
        .await?;
        let Some(level) = self.level.take() else {
            return Ok(State::SeekMarker);
        };
        if level.progressed {
            self.missing_lists.remove(&level.key);
            return Ok(State::SeekMarker);
        }
        if table_missing {
            let misses = self.missing_lists.entry(level.key.clone()).or_insert(0);
            *misses += 1;
            if *misses <= self.config.workflow.list_retries {
                debug!(
                    "list of marker '{}' missing ({} of {} retries), will try again",
                    level.key, misses, self.config.workflow.list_retries
                );
                return Ok(State::SeekMarker);
            }
        }
        debug!("marker '{}' made no progress, not entering it again", level.key);
        self.stalled.insert(level.key);
        Ok(State::SeekMarker)
    }

    async fn process_item(&mut self, row: ListRow) -> Result<State> {
        info!("processing '{}'", row.name);
        self.report.items_processed += 1;
        if let Some(level) = self.level.as_mut() {
            level.progressed = true;
        }

        let pause = ms(self.config.timing.layer_close_ms);
        match self.drive_item(&row).await {
            Ok(()) => {
                self.tracker.mark_completed(&row.name);
                info!("'{}' confirmed", row.name);
                unwind(self.page, &self.config.widgets, 2, pause).await?;
            }
            Err(failure) => {
                if failure.error.is_step_failure() {
                    warn!("'{}' failed: {}", row.name, failure.error);
                } else {
                    warn!("'{}' failed on a page error: {}", row.name, failure.error);
                }
                self.tracker.mark_failed(&row.name);
                self.save_failure_screenshot(&row.name).await;
                unwind(self.page, &self.config.widgets, failure.layers, pause).await?;
            }
        }
        Ok(State::ScanList)
    }

    /// Open → more options → add → fill → submit.
    async fn drive_item(&self, row: &ListRow) -> std::result::Result<(), ItemFailure> {
        let wf = &self.config.workflow;
        let timing = &self.config.timing;

        force_interact(self.page, &row.link, timing)
            .await
            .map_err(at_depth(0))?;
        sleep(ms(timing.item_open_ms)).await;

        self.open_history().await.map_err(at_depth(1))?;

        let add = self
            .wait_text("button", &wf.add_button, timing.screen_timeout_ms)
            .await
            .map_err(at_depth(2))?
            .into_element()
            .ok_or_else(|| Error::NotFound(format!("'{}' button", wf.add_button)))
            .map_err(at_depth(2))?;
        force_interact(self.page, &add.handle, timing)
            .await
            .map_err(at_depth(2))?;

        let form = self
            .wait_text("*", &wf.form_ready_text, timing.screen_timeout_ms)
            .await
            .map_err(at_depth(3))?;
        if !form.found() {
            return Err(ItemFailure {
                layers: 3,
                error: Error::NotFound("entry form".into()),
            });
        }
        sleep(ms(timing.form_settle_ms)).await;

        self.fill_and_submit().await.map_err(at_depth(3))
    }

    /// Find and activate "more options", then wait for the history screen.
    async fn open_history(&self) -> Result<()> {
        let wf = &self.config.workflow;
        let timing = &self.config.timing;

        let mut more = None;
        if let Some(selector) = wf.more.selector.as_deref() {
            more = self
                .page
                .query(None, &Query::css(selector))
                .await?
                .into_iter()
                .next();
        }
        if more.is_none() {
            more = self
                .wait_text("a", &wf.more.text, timing.more_timeout_ms)
                .await?
                .into_element();
        }
        let more = more.ok_or_else(|| Error::NotFound(format!("'{}' link", wf.more.text)))?;

        let mut invoked = false;
        if let Some(method) = wf.more.scope_method.as_deref() {
            invoked = self
                .page
                .invoke_scope_method(&more.handle, method, &wf.more.scope_arg)
                .await?;
            if invoked {
                debug!("called scope method {}() directly", method);
            }
        }
        if !invoked {
            force_interact(self.page, &more.handle, timing).await?;
        }

        let title = &wf.history_title;
        if self.wait_text("*", title, timing.screen_timeout_ms).await?.found() {
            return Ok(());
        }
        debug!("'{}' did not appear, activating '{}' again", title, wf.more.text);
        force_interact(self.page, &more.handle, timing).await?;
        if self.wait_text("*", title, timing.screen_timeout_ms).await?.found() {
            Ok(())
        } else {
            Err(Error::NotFound(format!("'{}' screen", title)))
        }
    }

    async fn fill_and_submit(&self) -> Result<()> {
        let wf = &self.config.workflow;
        let widgets = &self.config.widgets;
        let timing = &self.config.timing;

        for selection in &wf.selections {
            select_option(self.page, &selection.label, selection.index, widgets, timing).await?;
        }
        if let Some(search) = wf.transfer.as_deref() {
            move_to_right(self.page, search, widgets, timing).await?;
        }

        let confirm = self
            .wait_text("button", &wf.confirm_button, timing.confirm_timeout_ms)
            .await?
            .into_element()
            .ok_or_else(|| Error::NotFound(format!("'{}' button", wf.confirm_button)))?;
        force_interact(self.page, &confirm.handle, timing).await?;
        sleep(ms(timing.after_submit_ms)).await;
        Ok(())
    }

    async fn save_failure_screenshot(&self, item: &str) {
        let Some(template) = self
            .config
            .on_failure
            .as_ref()
            .and_then(|f| f.screenshot.as_deref())
        else {
            return;
        };
        let path = screenshot_path(template, item, &chrono::Local::now());
        match self.page.screenshot().await {
            Ok(data) => {
                if let Some(dir) = std::path::Path::new(&path).parent() {
                    if !dir.as_os_str().is_empty() {
                        if let Err(e) = std::fs::create_dir_all(dir) {
                            warn!("failed to create screenshot dir {}: {}", dir.display(), e);
                            return;
                        }
                    }
                }
                match std::fs::write(&path, data) {
                    Ok(()) => info!("saved failure screenshot to {}", path),
                    Err(e) => warn!("failed to save screenshot: {}", e),
                }
            }
            Err(Error::NotSupported(_)) => debug!("page cannot take screenshots"),
            Err(e) => warn!("screenshot failed: {}", e),
        }
    }
}

/// Fill `{timestamp}` and `{item}` into a screenshot path template. Path
/// separators and other awkward characters in the item name become `_`.
fn screenshot_path(template: &str, item: &str, now: &chrono::DateTime<chrono::Local>) -> String {
    let item: String = item
        .chars()
        .map(|c| if c.is_alphanumeric() || c == '-' { c } else { '_' })
        .collect();
    template
        .replace("{timestamp}", &now.format("%Y%m%d-%H%M%S").to_string())
        .replace("{item}", &item)
}
