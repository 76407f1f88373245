//! A scripted model of the confirmation application on top of [`Dom`].
//!
//! Main page: a start button revealing a table of groups, each with a `*`
//! marker while it has unconfirmed clients. A marker opens the client list
//! overlay; a client opens its detail overlay, then history, then the entry
//! form. Submitting the form confirms the client and ticks its checkbox.

use super::{Dom, FakePage, BODY};
use confirm_runner::Config;
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

pub const START: &str = "Query";
pub const MORE: &str = "More";
pub const HISTORY_TITLE: &str = "Interaction history";
pub const ADD: &str = "Add";
pub const CONFIRM: &str = "OK";
pub const NO_DATA: &str = "No data";
pub const OPTIONS: [&str; 3] = ["-- choose --", "Phone", "Visit"];
pub const TRANSFER_ENTRIES: [&str; 2] = ["Annual review", "Quarterly review"];

/// Ways a client's screens can misbehave.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Fault {
    #[default]
    None,
    /// Detail screen has no "More" link.
    NoMoreLink,
    /// History screen has no "Add" button.
    NoAddButton,
    /// "Add" does nothing.
    NoForm,
    /// The "Channel" dropdown has no toggle.
    MissingToggle,
    /// Dropdown menus hold a single option.
    ShortMenu,
    /// "OK" starts out disabled.
    DisabledConfirm,
    /// "OK" does nothing.
    IgnoreSubmit,
}

#[derive(Debug, Clone)]
pub struct Client {
    pub name: String,
    pub confirmed: bool,
    pub fault: Fault,
}

pub fn pending(name: &str) -> Client {
    Client {
        name: name.into(),
        confirmed: false,
        fault: Fault::None,
    }
}

pub fn confirmed(name: &str) -> Client {
    Client {
        confirmed: true,
        ..pending(name)
    }
}

pub fn faulty(name: &str, fault: Fault) -> Client {
    Client {
        fault,
        ..pending(name)
    }
}

#[derive(Debug, Clone)]
pub struct Group {
    pub label: String,
    pub clients: Vec<Client>,
    /// Keep the marker even when nothing is pending.
    pub sticky: bool,
    /// Opens of the list whose table renders only after the first look.
    pub late_renders: u32,
}

/// One submitted entry form.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Submission {
    pub client: String,
    pub choices: Vec<(String, String)>,
    pub transferred: Vec<String>,
}

#[derive(Default)]
pub struct AppState {
    pub groups: Vec<Group>,
    pub submissions: Vec<Submission>,
    /// Times each client's detail screen was opened.
    pub detail_opens: HashMap<String, usize>,
    /// Clicks on the "More" link.
    pub more_clicks: usize,
    /// Direct scope method calls on the "More" link.
    pub scope_calls: usize,
    /// Scope methods are reachable on the "More" link.
    pub framework: bool,
    markers: Vec<Option<usize>>,
    marker_cells: Vec<usize>,
    checkboxes: HashMap<(usize, usize), usize>,
    draft: Submission,
}

impl AppState {
    pub fn opens(&self, name: &str) -> usize {
        self.detail_opens.get(name).copied().unwrap_or(0)
    }

    pub fn submitted(&self) -> Vec<&str> {
        self.submissions.iter().map(|s| s.client.as_str()).collect()
    }
}

pub type Shared = Rc<RefCell<AppState>>;

#[derive(Default)]
pub struct AppBuilder {
    groups: Vec<Group>,
    framework: bool,
}

impl AppBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn group(mut self, label: &str, clients: Vec<Client>) -> Self {
        self.groups.push(Group {
            label: label.into(),
            clients,
            sticky: false,
            late_renders: 0,
        });
        self
    }

    /// A group whose list table renders late on its first `opens` openings.
    pub fn late_group(mut self, label: &str, clients: Vec<Client>, opens: u32) -> Self {
        self.groups.push(Group {
            label: label.into(),
            clients,
            sticky: false,
            late_renders: opens,
        });
        self
    }

    pub fn sticky_group(mut self, label: &str, clients: Vec<Client>) -> Self {
        self.groups.push(Group {
            label: label.into(),
            clients,
            sticky: true,
            late_renders: 0,
        });
        self
    }

    pub fn with_framework(mut self) -> Self {
        self.framework = true;
        self
    }

    pub fn build(self) -> (FakePage, Shared) {
        let app: Shared = Rc::new(RefCell::new(AppState {
            groups: self.groups,
            framework: self.framework,
            ..Default::default()
        }));
        let mut dom = Dom::new();
        render_main(&mut dom, &app);
        (FakePage::new(dom), app)
    }
}

fn render_main(dom: &mut Dom, app: &Shared) {
    let start = dom.add(BODY, "button").text(START).id();
    let table = dom.add(BODY, "table").attr("id", "main").hidden().id();
    let tbody = dom.add(table, "tbody").id();
    let labels: Vec<String> = app.borrow().groups.iter().map(|g| g.label.clone()).collect();
    for label in &labels {
        let tr = dom.add(tbody, "tr").id();
        dom.add(tr, "td").text(label);
        let cell = dom.add(tr, "td").id();
        let mut state = app.borrow_mut();
        state.marker_cells.push(cell);
        state.markers.push(None);
    }
    dom.on_click(start, move |dom| dom.set_hidden(table, false));
    dom.on_escape(close_top_overlay);
    refresh_markers(dom, app);
}

fn refresh_markers(dom: &mut Dom, app: &Shared) {
    let wanted: Vec<bool> = app
        .borrow()
        .groups
        .iter()
        .map(|g| g.sticky || g.clients.iter().any(|c| !c.confirmed))
        .collect();
    for (gi, want) in wanted.into_iter().enumerate() {
        let (current, cell) = {
            let state = app.borrow();
            (state.markers[gi], state.marker_cells[gi])
        };
        match (want, current) {
            (true, None) => {
                let marker = dom.add(cell, "a").text("*").id();
                let a = app.clone();
                dom.on_click(marker, move |dom| open_list(dom, &a, gi));
                app.borrow_mut().markers[gi] = Some(marker);
            }
            (false, Some(marker)) => {
                dom.remove(marker);
                app.borrow_mut().markers[gi] = None;
            }
            _ => {}
        }
    }
}

/// Escape closes the most recently opened overlay through its close button.
fn close_top_overlay(dom: &mut Dom) {
    let Some(overlay) = dom.find_all("div.modal").last().copied() else {
        return;
    };
    let close = dom
        .children_of(overlay)
        .into_iter()
        .find(|&c| dom.has_class(c, "close"));
    if let Some(close) = close {
        dom.click(close);
    }
}

fn open_modal(dom: &mut Dom, on_close: impl Fn(&mut Dom) + 'static) -> usize {
    let overlay = dom.add(BODY, "div").class("modal").id();
    let close = dom.add(overlay, "button").class("close").text("×").id();
    dom.on_click(close, move |dom| {
        dom.remove(overlay);
        on_close(dom);
    });
    overlay
}

fn open_list(dom: &mut Dom, app: &Shared, gi: usize) {
    let a = app.clone();
    let overlay = open_modal(dom, move |dom| refresh_markers(dom, &a));
    let table = dom.add(overlay, "table").id();
    let late = {
        let mut state = app.borrow_mut();
        let group = &mut state.groups[gi];
        let late = group.late_renders > 0;
        group.late_renders = group.late_renders.saturating_sub(1);
        late
    };
    if late {
        dom.reveal_after(table, 2);
    }
    let thead = dom.add(table, "thead").id();
    let head = dom.add(thead, "tr").id();
    dom.add(head, "th").text("Confirmed");
    dom.add(head, "th").text("Client");
    let tbody = dom.add(table, "tbody").id();

    let clients = app.borrow().groups[gi].clients.clone();
    if clients.is_empty() {
        let tr = dom.add(tbody, "tr").id();
        dom.add(tr, "td").text(NO_DATA);
    }
    for (ci, client) in clients.iter().enumerate() {
        let tr = dom.add(tbody, "tr").id();
        let td = dom.add(tr, "td").id();
        let checkbox = dom.add(td, "input").checkbox(client.confirmed).id();
        let td = dom.add(tr, "td").id();
        let link = dom.add(td, "a").text(&client.name).id();
        app.borrow_mut().checkboxes.insert((gi, ci), checkbox);
        let a = app.clone();
        dom.on_click(link, move |dom| open_detail(dom, &a, gi, ci));
    }
}

fn open_detail(dom: &mut Dom, app: &Shared, gi: usize, ci: usize) {
    let (name, fault, framework) = {
        let mut state = app.borrow_mut();
        let client = state.groups[gi].clients[ci].clone();
        *state.detail_opens.entry(client.name.clone()).or_default() += 1;
        (client.name, client.fault, state.framework)
    };
    let overlay = open_modal(dom, |_| {});
    dom.add(overlay, "h3").text(&format!("Client: {}", name));
    if fault == Fault::NoMoreLink {
        return;
    }
    let more = dom
        .add(overlay, "a")
        .text(MORE)
        .attr("ng-click", "openHistory('HISTORY')")
        .id();
    let a = app.clone();
    dom.on_click(more, move |dom| {
        a.borrow_mut().more_clicks += 1;
        open_history(dom, &a, gi, ci);
    });
    if framework {
        let a = app.clone();
        dom.scope_method(more, "openHistory", move |dom| {
            a.borrow_mut().scope_calls += 1;
            open_history(dom, &a, gi, ci);
        });
    }
}

fn open_history(dom: &mut Dom, app: &Shared, gi: usize, ci: usize) {
    let fault = app.borrow().groups[gi].clients[ci].fault;
    let overlay = open_modal(dom, |_| {});
    dom.add(overlay, "h3").text(HISTORY_TITLE);
    if fault == Fault::NoAddButton {
        return;
    }
    let add = dom.add(overlay, "button").text(ADD).id();
    if fault == Fault::NoForm {
        return;
    }
    let a = app.clone();
    dom.on_click(add, move |dom| open_form(dom, &a, gi, ci));
}

fn open_form(dom: &mut Dom, app: &Shared, gi: usize, ci: usize) {
    let (name, fault) = {
        let state = app.borrow();
        let client = &state.groups[gi].clients[ci];
        (client.name.clone(), client.fault)
    };
    app.borrow_mut().draft = Submission {
        client: name,
        ..Default::default()
    };

    let overlay = open_modal(dom, |_| {});
    dom.add(overlay, "h3").text("New interaction");

    for label in ["Source", "Channel"] {
        let row = dom.add(overlay, "div").class("row").id();
        dom.add(row, "label").text(label);
        let span = dom.add(row, "span").id();
        dom.add(span, "input");
        if fault == Fault::MissingToggle && label == "Channel" {
            continue;
        }
        let toggle = dom.add(span, "a").class("custom-combobox-toggle").id();
        let menu = dom.add(overlay, "ul").class("ui-autocomplete").hidden().id();
        let options: &[&str] = if fault == Fault::ShortMenu {
            &OPTIONS[..1]
        } else {
            &OPTIONS
        };
        for text in options {
            let item = dom.add(menu, "li").class("ui-menu-item").id();
            dom.add(item, "a").text(text);
            let a = app.clone();
            let choice = (label.to_string(), text.to_string());
            dom.on_click(item, move |dom| {
                a.borrow_mut().draft.choices.push(choice.clone());
                dom.set_hidden(menu, true);
            });
        }
        dom.on_click(toggle, move |dom| {
            let hidden = dom.is_hidden(menu);
            dom.set_hidden(menu, !hidden);
        });
    }

    let dual = dom.add(overlay, "div").class("dual").id();
    let left = dom.add(dual, "div").class("left").id();
    let source = dom.add(left, "select").attr("multiple", "").id();
    let entries: Vec<usize> = TRANSFER_ENTRIES
        .iter()
        .map(|text| dom.add(source, "option").text(text).id())
        .collect();
    let buttons = dom.add(dual, "div").class("buttons").id();
    let mover = dom.add(buttons, "button").text(">").id();
    let right = dom.add(dual, "div").class("right").id();
    let target = dom.add(right, "select").attr("multiple", "").id();
    let a = app.clone();
    dom.on_click(mover, move |dom| {
        for &entry in &entries {
            if dom.is_selected(entry) && dom.parent_of(entry) == Some(source) {
                let text = dom.own_text(entry).to_string();
                dom.append(target, entry);
                a.borrow_mut().draft.transferred.push(text);
            }
        }
    });

    let mut confirm = dom.add(overlay, "button").text(CONFIRM);
    if fault == Fault::DisabledConfirm {
        confirm = confirm.disabled();
    }
    let confirm = confirm.id();
    let a = app.clone();
    dom.on_click(confirm, move |dom| {
        if fault == Fault::IgnoreSubmit {
            return;
        }
        let checkbox = {
            let mut state = a.borrow_mut();
            let draft = std::mem::take(&mut state.draft);
            state.submissions.push(draft);
            state.groups[gi].clients[ci].confirmed = true;
            state.checkboxes.get(&(gi, ci)).copied()
        };
        if let Some(checkbox) = checkbox {
            dom.set_checked(checkbox, true);
        }
        dom.remove(overlay);
    });
}

/// Config matching the model above, with every delay at zero and every wait
/// a couple of lookups long.
pub fn config() -> Config {
    Config::parse(CONFIG).expect("test config parses")
}

const CONFIG: &str = r#"
name: fake app
target:
  url: "http://app.test/"
workflow:
  start_button: Query
  table_headers: [Client, Confirmed]
  no_data_text: No data
  more:
    selector: "a[ng-click*='openHistory']"
    text: More
    scope_method: openHistory
    scope_arg: HISTORY
  history_title: Interaction history
  add_button: Add
  form_ready_text: Source
  selections:
    - label: Source
      index: 1
    - label: Channel
      index: 2
  transfer: Quarterly review
  confirm_button: OK
  done_message: All done
timing:
  poll_interval_ms: 1
  start_timeout_ms: 2
  after_start_ms: 0
  marker_timeout_ms: 2
  after_marker_ms: 0
  level_close_ms: 0
  item_open_ms: 0
  more_timeout_ms: 2
  screen_timeout_ms: 2
  form_settle_ms: 0
  confirm_timeout_ms: 2
  after_submit_ms: 0
  layer_close_ms: 0
  enable_settle_ms: 0
  pointer_settle_ms: 0
  click_settle_ms: 0
  lookup_retry_ms: 0
  menu_poll_ms: 1
  menu_timeout_ms: 2
  entry_settle_ms: 0
"#;
