pub mod schema;
pub mod timing;
pub mod workflow;

pub use schema::{BrowserConfig, Config, OnFailure, TargetUrl, Viewport};
pub use timing::Timing;
pub use workflow::{MarkerSpec, MoreOptions, Selection, Widgets, Workflow};
