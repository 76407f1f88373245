mod engine;
pub mod scan;

pub use engine::{Engine, RunReport, State};

use crate::config::timing::ms;
use crate::config::{BrowserConfig, Config};
use crate::locate::wait_for;
use crate::page::{BrowserPage, Query};
use crate::{Error, Result};
use eoka::Browser;
use std::time::Instant;
use tracing::{debug, info};

/// Result of running a config.
#[derive(Debug)]
pub struct RunResult {
    /// Items confirmed (during the run or already confirmed on screen).
    pub completed: Vec<String>,
    /// Items that failed and were skipped.
    pub failed: Vec<String>,
    /// Markers abandoned because a visit made no progress.
    pub stalled_markers: Vec<String>,
    /// Number of marker visits.
    pub markers_visited: usize,
    /// Number of items the engine tried to process.
    pub items_processed: usize,
    /// Total duration in milliseconds.
    pub duration_ms: u64,
}

impl RunResult {
    fn from_report(report: RunReport, started: Instant) -> Self {
        Self {
            completed: report.completed,
            failed: report.failed,
            stalled_markers: report.stalled_markers,
            markers_visited: report.markers_visited,
            items_processed: report.items_processed,
            duration_ms: started.elapsed().as_millis() as u64,
        }
    }
}

/// Runs the workflow in a browser it launches.
pub struct Runner {
    browser: Browser,
    page: BrowserPage,
}

impl Runner {
    /// Create a new runner with browser config.
    pub async fn new(config: &BrowserConfig) -> Result<Self> {
        let stealth = eoka::StealthConfig {
            headless: config.headless,
            proxy: config.proxy.clone(),
            user_agent: config.user_agent.clone(),
            viewport_width: config.viewport.as_ref().map(|v| v.width).unwrap_or(1280),
            viewport_height: config.viewport.as_ref().map(|v| v.height).unwrap_or(720),
            ..Default::default()
        };

        debug!(
            "Launching browser (headless: {}, proxy: {:?})",
            config.headless, config.proxy
        );
        let browser = Browser::launch_with_config(stealth).await?;
        let page = browser.new_page("about:blank").await?;

        Ok(Self {
            browser,
            page: BrowserPage::new(page),
        })
    }

    /// The page the workflow runs on.
    pub fn page(&self) -> &BrowserPage {
        &self.page
    }

    /// Open the target, wait until it is ready, and run the workflow to the
    /// end.
    pub async fn run(&mut self, config: &Config) -> Result<RunResult> {
        let start = Instant::now();

        info!("Navigating to: {}", config.target.url);
        self.page.page().goto(&config.target.url).await?;

        if let Some(ref ready) = config.target.ready_text {
            info!(
                "Waiting up to {}s for '{}'",
                config.target.ready_timeout_ms / 1000,
                ready
            );
            let located = wait_for(
                &self.page,
                None,
                &Query::text("*", ready.as_str()),
                ms(config.target.ready_timeout_ms),
                ms(config.timing.poll_interval_ms.max(1000)),
            )
            .await?;
            if !located.found() {
                return Err(Error::NotFound(format!(
                    "'{}' did not appear within {}ms",
                    ready, config.target.ready_timeout_ms
                )));
            }
        }

        let mut engine = Engine::new(&self.page, config);
        let report = engine.run().await?;
        Ok(RunResult::from_report(report, start))
    }

    /// Close the browser.
    pub async fn close(self) -> Result<()> {
        self.browser.close().await?;
        Ok(())
    }
}
