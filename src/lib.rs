//! # confirm-runner
//!
//! Drives a record-confirmation workflow in a legacy web application. Finds
//! pending items across a two-level hierarchy of list screens, fills the
//! interaction-log form for each, submits it, and keeps going until no work
//! remains.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use confirm_runner::{Config, Runner};
//!
//! # #[tokio::main]
//! # async fn main() -> confirm_runner::Result<()> {
//! let config = Config::load("configs/interaction-log.yaml")?;
//! let mut runner = Runner::new(&config.browser).await?;
//! let result = runner.run(&config).await?;
//! println!("confirmed {} item(s)", result.completed.len());
//! runner.close().await?;
//! # Ok(())
//! # }
//! ```
//!
//! The engine itself only talks to a [`TargetPage`], so it can run against
//! any page implementation. [`BrowserPage`] is the one backed by a real
//! browser.

mod config;
pub mod interact;
pub mod locate;
pub mod page;
mod runner;
pub mod tracker;
pub mod widgets;

pub use config::{
    BrowserConfig, Config, MarkerSpec, MoreOptions, OnFailure, Selection, TargetUrl, Timing,
    Viewport, Widgets, Workflow,
};
pub use page::{BrowserPage, Element, ElementRef, Pointer, Query, TargetPage};
pub use runner::scan::{read_list, select_target, ListRow, ListScreen, ScanOutcome};
pub use runner::{Engine, RunReport, RunResult, Runner, State};
pub use tracker::{ItemStatus, ItemTracker};

/// Result type for confirm-runner operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur during config loading or execution.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("config error: {0}")]
    Config(String),

    #[error("yaml parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("browser error: {0}")]
    Browser(#[from] eoka::Error),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("ambiguous structure: {0}")]
    Ambiguous(String),

    #[error("menu did not open for '{0}'")]
    MenuNotOpened(String),

    #[error("'{label}' offers {available} option(s), index {index} requested")]
    OptionOutOfRange {
        label: String,
        index: usize,
        available: usize,
    },

    #[error("not supported: {0}")]
    NotSupported(&'static str),
}

impl Error {
    /// Whether this is an expected, local failure of one workflow step
    /// (something did not appear or could not be matched) rather than a
    /// problem with the browser or the configuration.
    pub fn is_step_failure(&self) -> bool {
        matches!(
            self,
            Error::NotFound(_)
                | Error::Ambiguous(_)
                | Error::MenuNotOpened(_)
                | Error::OptionOutOfRange { .. }
        )
    }
}
