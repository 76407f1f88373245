//! [`TargetPage`] over a live browser tab, via injected JavaScript.

use super::{Element, ElementRef, Pointer, Query, TargetPage};
use crate::{Error, Result};
use async_trait::async_trait;
use eoka::Page;

/// Helpers shared by every injected script.
///
/// Handles are stamped onto elements as an attribute. An element rebuilt by
/// the page loses its stamp, so a stale handle resolves to nothing rather
/// than to whatever now sits at the same position.
const PRELUDE: &str = r#"
    const ATTR = 'data-confirm-ref';
    const visible = el => !!(el && (el.offsetWidth || el.offsetHeight || el.getClientRects().length));
    const ref = el => {
        let id = el.getAttribute(ATTR);
        if (!id) {
            window.__confirmSeq = (window.__confirmSeq || 0) + 1;
            id = Math.round(performance.timeOrigin).toString(36) + '-' + window.__confirmSeq;
            el.setAttribute(ATTR, id);
        }
        return id;
    };
    const byRef = id => document.querySelector('[' + ATTR + '="' + CSS.escape(id) + '"]');
    const snap = el => ({
        handle: ref(el),
        tag: el.tagName.toLowerCase(),
        text: (el.innerText ?? el.textContent ?? '').trim(),
        visible: visible(el),
        disabled: el.hasAttribute('disabled'),
        checked: (el.type === 'checkbox' || el.type === 'radio') ? !!el.checked : null,
    });
"#;

const NOTIFY_JS: &str = r#"
    const box = document.createElement('div');
    box.textContent = message;
    box.setAttribute('role', 'status');
    Object.assign(box.style, {
        position: 'fixed', top: '16px', right: '16px', zIndex: 2147483647,
        padding: '12px 18px', background: '#1b5e20', color: '#fff',
        font: '15px sans-serif', borderRadius: '6px', boxShadow: '0 2px 8px rgba(0,0,0,.3)',
    });
    document.body.appendChild(box);
    setTimeout(() => box.remove(), 15000);
    return true;
"#;

fn script(body: &str) -> String {
    format!("(() => {{\n{}\n{}\n}})()", PRELUDE, body)
}

fn js_str(value: &str) -> String {
    serde_json::Value::from(value).to_string()
}

fn js_opt(value: Option<&str>) -> String {
    value.map(js_str).unwrap_or_else(|| "null".into())
}

/// A browser tab driven through the workflow.
pub struct BrowserPage {
    page: Page,
}

impl BrowserPage {
    pub fn new(page: Page) -> Self {
        Self { page }
    }

    /// The underlying eoka page, for navigation and other raw access.
    pub fn page(&self) -> &Page {
        &self.page
    }

    /// Run a script against one element and insist it was still there.
    async fn on_element(&self, element: &ElementRef, body: &str) -> Result<()> {
        let js = script(&format!(
            "const el = byRef({});\nif (!el) return false;\n{}\nreturn true;",
            js_str(element.as_str()),
            body
        ));
        let found: bool = self.page.evaluate(&js).await?;
        if found {
            Ok(())
        } else {
            Err(Error::NotFound(format!("element {} is gone", element)))
        }
    }
}

#[async_trait(?Send)]
impl TargetPage for BrowserPage {
    async fn query(&self, scope: Option<&ElementRef>, query: &Query) -> Result<Vec<Element>> {
        let js = script(&format!(
            r#"
            const scopeId = {scope};
            const root = scopeId === null ? document : byRef(scopeId);
            if (!root) return [];
            const needle = {needle};
            let found = [...root.querySelectorAll({selector})];
            if (needle !== null) {{
                found = found.filter(el => !el.matches('script, style')
                    && [...el.childNodes].some(n => n.nodeType === 3 && n.textContent.includes(needle)));
            }}
            return found.map(snap);
            "#,
            scope = js_opt(scope.map(ElementRef::as_str)),
            needle = js_opt(query.contains()),
            selector = js_str(query.selector()),
        ));
        Ok(self.page.evaluate(&js).await?)
    }

    async fn inspect(&self, element: &ElementRef) -> Result<Option<Element>> {
        let js = script(&format!(
            "const el = byRef({});\nreturn el ? snap(el) : null;",
            js_str(element.as_str())
        ));
        Ok(self.page.evaluate(&js).await?)
    }

    async fn parent(&self, element: &ElementRef) -> Result<Option<ElementRef>> {
        let js = script(&format!(
            "const p = byRef({})?.parentElement;\nreturn p ? ref(p) : null;",
            js_str(element.as_str())
        ));
        Ok(self.page.evaluate(&js).await?)
    }

    async fn closest(&self, element: &ElementRef, selector: &str) -> Result<Option<Element>> {
        let js = script(&format!(
            "const c = byRef({})?.closest({});\nreturn c ? snap(c) : null;",
            js_str(element.as_str()),
            js_str(selector)
        ));
        Ok(self.page.evaluate(&js).await?)
    }

    async fn follows(&self, anchor: &ElementRef, other: &ElementRef) -> Result<bool> {
        let js = script(&format!(
            r#"
            const a = byRef({}), b = byRef({});
            if (!a || !b) return false;
            return !!(a.compareDocumentPosition(b) & Node.DOCUMENT_POSITION_FOLLOWING);
            "#,
            js_str(anchor.as_str()),
            js_str(other.as_str())
        ));
        Ok(self.page.evaluate(&js).await?)
    }

    async fn clear_disabled(&self, element: &ElementRef) -> Result<()> {
        self.on_element(
            element,
            "el.removeAttribute('disabled'); el.classList.remove('disabled'); el.disabled = false;",
        )
        .await
    }

    async fn scroll_into_view(&self, element: &ElementRef) -> Result<()> {
        self.on_element(
            element,
            "try { el.scrollIntoView({ behavior: 'auto', block: 'center' }); } catch (e) {}",
        )
        .await
    }

    async fn dispatch(&self, element: &ElementRef, pointer: Pointer) -> Result<()> {
        let body = match pointer {
            Pointer::Press => "el.dispatchEvent(new MouseEvent('mousedown', { bubbles: true }));",
            Pointer::Release => "el.dispatchEvent(new MouseEvent('mouseup', { bubbles: true }));",
            Pointer::Click => "el.click();",
        };
        self.on_element(element, body).await
    }

    async fn press_escape(&self) -> Result<()> {
        self.page
            .execute(
                "document.dispatchEvent(new KeyboardEvent('keydown', \
                 { keyCode: 27, which: 27, key: 'Escape', bubbles: true }))",
            )
            .await?;
        Ok(())
    }

    async fn select_entry(&self, element: &ElementRef) -> Result<()> {
        self.on_element(
            element,
            r#"
            el.selected = true;
            const list = el.closest('select') || el.parentElement;
            list.dispatchEvent(new Event('change', { bubbles: true }));
            if (typeof angular !== 'undefined') {
                angular.element(list).triggerHandler('change');
            }
            "#,
        )
        .await
    }

    async fn invoke_scope_method(
        &self,
        element: &ElementRef,
        method: &str,
        arg: &str,
    ) -> Result<bool> {
        let js = script(&format!(
            r#"
            const el = byRef({el});
            if (!el || typeof angular === 'undefined') return false;
            try {{
                const scope = angular.element(el).scope();
                const method = {method};
                if (!scope || typeof scope[method] !== 'function') return false;
                scope.$apply(() => scope[method]({arg}));
                return true;
            }} catch (e) {{
                return false;
            }}
            "#,
            el = js_str(element.as_str()),
            method = js_str(method),
            arg = js_str(arg),
        ));
        Ok(self.page.evaluate(&js).await?)
    }

    async fn notify(&self, message: &str) -> Result<()> {
        let js = format!(
            "((message) => {{ {} }})({})",
            NOTIFY_JS,
            js_str(message)
        );
        let _: bool = self.page.evaluate(&js).await?;
        Ok(())
    }

    async fn screenshot(&self) -> Result<Vec<u8>> {
        Ok(self.page.screenshot().await?)
    }
}
