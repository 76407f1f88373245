use serde::Deserialize;

/// The fixed labels and directives of the workflow.
///
/// These are the only application-specific strings the engine knows about.
#[derive(Debug, Clone, Deserialize)]
pub struct Workflow {
    /// Button pressed once before the first marker search (e.g. "Query").
    pub start_button: Option<String>,

    /// Top-level link marking a group with outstanding work.
    #[serde(default)]
    pub marker: MarkerSpec,

    /// Header texts that together identify the list screen's table.
    pub table_headers: Vec<String>,

    /// Text of the single placeholder row shown when a list is empty.
    pub no_data_text: Option<String>,

    /// Extra visits a marker gets when its list table does not show up.
    #[serde(default = "default_list_retries")]
    pub list_retries: u32,

    /// The "more options" affordance on the item detail screen.
    pub more: MoreOptions,

    /// Title of the screen the "more options" affordance opens.
    pub history_title: String,

    /// Button that opens the entry form.
    pub add_button: String,

    /// Text whose presence means the entry form has rendered.
    pub form_ready_text: String,

    /// Dropdown choices applied to the form, in order.
    #[serde(default)]
    pub selections: Vec<Selection>,

    /// Search text of the list entry moved to the right-hand box.
    pub transfer: Option<String>,

    /// Button that submits the form.
    pub confirm_button: String,

    /// Message shown on the page when the run finishes.
    #[serde(default = "default_done_message")]
    pub done_message: String,
}

fn default_list_retries() -> u32 {
    2
}

fn default_done_message() -> String {
    "Confirmation run complete".into()
}

/// How markers are found: links under `selector` whose text contains `text`.
#[derive(Debug, Clone, Deserialize)]
pub struct MarkerSpec {
    #[serde(default = "default_marker_selector")]
    pub selector: String,
    #[serde(default = "default_marker_text")]
    pub text: String,
}

impl Default for MarkerSpec {
    fn default() -> Self {
        Self {
            selector: default_marker_selector(),
            text: default_marker_text(),
        }
    }
}

fn default_marker_selector() -> String {
    "td > a".into()
}

fn default_marker_text() -> String {
    "*".into()
}

/// Lookup and activation of the "more options" link.
#[derive(Debug, Clone, Deserialize)]
pub struct MoreOptions {
    /// Preferred CSS selector, tried before the text lookup.
    pub selector: Option<String>,

    /// Link text used when the selector finds nothing.
    pub text: String,

    /// Scope method to call directly when the page exposes its framework.
    pub scope_method: Option<String>,

    /// Argument passed to `scope_method`.
    #[serde(default)]
    pub scope_arg: String,
}

/// One dropdown choice: pick option `index` (0-based) of the widget
/// labelled `label`.
#[derive(Debug, Clone, Deserialize)]
pub struct Selection {
    pub label: String,
    pub index: usize,
}

/// CSS selectors describing the page's widget library.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Widgets {
    /// Toggle button of a custom dropdown.
    pub toggle: String,
    /// Opened option menu of a custom dropdown.
    pub menu: String,
    /// Options inside an opened menu.
    pub option: String,
    /// Close controls of overlays. The last visible match is the topmost.
    pub close_controls: String,
    /// Selectable entries of a dual list box.
    pub list_entry: String,
    /// Candidate controls for the move-right action.
    pub transfer_controls: String,
    /// Exact labels of a move-right control.
    pub transfer_glyphs: Vec<String>,
    /// Icon selectors that mark a move-right control.
    pub transfer_icons: Vec<String>,
}

impl Default for Widgets {
    fn default() -> Self {
        Self {
            toggle: ".custom-combobox-toggle".into(),
            menu: "ul.ui-autocomplete".into(),
            option: "li.ui-menu-item".into(),
            close_controls:
                r#"button.close, .ngdialog-close, button[title="Close"], span.ui-icon-closethick"#
                    .into(),
            list_entry: "option".into(),
            transfer_controls: "button, a.btn, div.btn".into(),
            transfer_glyphs: vec![">".into(), "›".into()],
            transfer_icons: vec![
                ".ui-icon-triangle-1-e".into(),
                ".glyphicon-chevron-right".into(),
            ],
        }
    }
}
