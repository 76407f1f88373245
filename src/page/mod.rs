//! The page the workflow runs against.
//!
//! Everything the engine knows about the live document goes through
//! [`TargetPage`]. Element handles are only good for the operation that
//! produced them: the page may destroy and rebuild any subtree between two
//! calls, so callers re-query instead of holding on to handles across waits.

mod browser;

pub use browser::BrowserPage;

use crate::{Error, Result};
use async_trait::async_trait;
use serde::Deserialize;
use std::fmt;

/// Opaque handle to an element in the live page.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Deserialize)]
#[serde(transparent)]
pub struct ElementRef(String);

impl ElementRef {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ElementRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<{}>", self.0)
    }
}

/// Snapshot of an element, taken when it was queried.
#[derive(Debug, Clone, Deserialize)]
pub struct Element {
    pub handle: ElementRef,
    /// Lowercase tag name.
    pub tag: String,
    /// Rendered text, trimmed.
    #[serde(default)]
    pub text: String,
    /// Has a nonzero rendered size or at least one layout rectangle.
    #[serde(default)]
    pub visible: bool,
    /// Carries the `disabled` marker.
    #[serde(default)]
    pub disabled: bool,
    /// Checked state, for checkboxes and radios only.
    #[serde(default)]
    pub checked: Option<bool>,
}

/// What to look for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Query {
    /// Elements matching a CSS selector.
    Css(String),
    /// Elements matching `selector` that directly own a text node containing
    /// `contains`. Script elements never match.
    Text { selector: String, contains: String },
}

impl Query {
    pub fn css(selector: impl Into<String>) -> Self {
        Query::Css(selector.into())
    }

    pub fn text(selector: impl Into<String>, contains: impl Into<String>) -> Self {
        Query::Text {
            selector: selector.into(),
            contains: contains.into(),
        }
    }

    pub fn selector(&self) -> &str {
        match self {
            Query::Css(s) => s,
            Query::Text { selector, .. } => selector,
        }
    }

    pub fn contains(&self) -> Option<&str> {
        match self {
            Query::Css(_) => None,
            Query::Text { contains, .. } => Some(contains),
        }
    }
}

impl fmt::Display for Query {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Query::Css(s) => write!(f, "css '{}'", s),
            Query::Text { selector, contains } => write!(f, "{} with text '{}'", selector, contains),
        }
    }
}

/// Synthetic pointer events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pointer {
    Press,
    Release,
    Click,
}

/// The live document, as seen by the engine.
///
/// Operations on a handle whose element no longer exists fail with
/// [`Error::NotFound`]; structural lookups return `None`/`false` instead.
#[async_trait(?Send)]
pub trait TargetPage {
    /// All matches in document order. `scope` restricts the search to the
    /// descendants of an element.
    async fn query(&self, scope: Option<&ElementRef>, query: &Query) -> Result<Vec<Element>>;

    /// Fresh snapshot of an element, or `None` if it is gone.
    async fn inspect(&self, element: &ElementRef) -> Result<Option<Element>>;

    /// Parent element, if any.
    async fn parent(&self, element: &ElementRef) -> Result<Option<ElementRef>>;

    /// Nearest ancestor-or-self matching `selector`.
    async fn closest(&self, element: &ElementRef, selector: &str) -> Result<Option<Element>>;

    /// Whether `other` comes after `anchor` in document order.
    async fn follows(&self, anchor: &ElementRef, other: &ElementRef) -> Result<bool>;

    /// Remove the disabled attribute, property and styling class.
    async fn clear_disabled(&self, element: &ElementRef) -> Result<()>;

    /// Scroll the element to the viewport center.
    async fn scroll_into_view(&self, element: &ElementRef) -> Result<()>;

    /// Dispatch one synthetic pointer event.
    async fn dispatch(&self, element: &ElementRef, pointer: Pointer) -> Result<()>;

    /// Synthesize an Escape keydown on the document.
    async fn press_escape(&self) -> Result<()>;

    /// Mark a list entry selected and notify its owning list, including the
    /// page framework when one is present.
    async fn select_entry(&self, element: &ElementRef) -> Result<()>;

    /// Call a method on the element's framework scope directly. Returns
    /// `false` when the page has no such capability.
    async fn invoke_scope_method(
        &self,
        _element: &ElementRef,
        _method: &str,
        _arg: &str,
    ) -> Result<bool> {
        Ok(false)
    }

    /// Show a message to whoever is watching the page.
    async fn notify(&self, message: &str) -> Result<()>;

    /// Capture the viewport as PNG.
    async fn screenshot(&self) -> Result<Vec<u8>> {
        Err(Error::NotSupported("screenshot"))
    }
}
