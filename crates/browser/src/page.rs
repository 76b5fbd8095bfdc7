//! Page adapter over the DevTools protocol
//!
//! Elements are held in a per-document registry (`window.__cw`) keyed by
//! the ids handed out as [`ElementId`]. Navigation replaces the document
//! and with it the registry, so stale handles simply stop resolving and
//! report as detached.

use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use tracing::trace;

use cartwheel_core::locator::{Locator, Narrowing};
use cartwheel_core::page::{ElementId, ElementState, Page, PageError, PageResult};

use crate::cdp::CdpClient;
use crate::chrome::ChromeSession;

const REGISTRY_JS: &str = "window.__cw = window.__cw || { els: {}, next: 1 };";

/// One live Chrome page, driven over DevTools.
pub struct CdpPage {
    client: CdpClient,
    session: Option<ChromeSession>,
    base_url: String,
}

impl CdpPage {
    pub fn new(client: CdpClient, session: ChromeSession, base_url: String) -> Self {
        Self {
            client,
            session: Some(session),
            base_url,
        }
    }

    /// Evaluate an expression and decode its by-value result.
    async fn eval<R: DeserializeOwned>(&self, expression: String) -> PageResult<R> {
        #[derive(Serialize)]
        struct Params {
            expression: String,
            #[serde(rename = "returnByValue")]
            return_by_value: bool,
        }

        #[derive(Deserialize)]
        struct Evaluated {
            result: RemoteObject,
            #[serde(rename = "exceptionDetails")]
            exception: Option<ExceptionDetails>,
        }

        #[derive(Deserialize)]
        struct RemoteObject {
            value: Option<serde_json::Value>,
        }

        #[derive(Deserialize)]
        struct ExceptionDetails {
            text: String,
        }

        trace!("evaluate: {}", expression);
        let evaluated: Evaluated = self
            .client
            .execute(
                "Runtime.evaluate",
                Some(Params {
                    expression,
                    return_by_value: true,
                }),
            )
            .await?;

        if let Some(exception) = evaluated.exception {
            return Err(PageError::Evaluation(exception.text));
        }
        serde_json::from_value(evaluated.result.value.unwrap_or(serde_json::Value::Null))
            .map_err(|e| PageError::Evaluation(format!("unexpected result shape: {e}")))
    }

    async fn dispatch_key(&self, event: KeyEventParams) -> PageResult<()> {
        self.client
            .execute_void("Input.dispatchKeyEvent", Some(event))
            .await
    }

    /// Focus the element, erroring when the handle is dangling.
    async fn focus(&self, id: ElementId) -> PageResult<()> {
        let focused: bool = self.eval(focus_snippet(id)).await?;
        if focused {
            Ok(())
        } else {
            Err(PageError::StaleElement(id))
        }
    }
}

#[async_trait]
impl Page for CdpPage {
    async fn navigate(&self, url: &str) -> PageResult<()> {
        #[derive(Serialize)]
        struct Params {
            url: String,
        }

        let url = if url.starts_with("http://") || url.starts_with("https://") {
            url.to_string()
        } else {
            format!(
                "{}/{}",
                self.base_url.trim_end_matches('/'),
                url.trim_start_matches('/')
            )
        };
        self.client
            .execute_void("Page.navigate", Some(Params { url }))
            .await
    }

    async fn current_url(&self) -> PageResult<String> {
        self.eval("window.location.href".to_string()).await
    }

    async fn is_ready(&self) -> PageResult<bool> {
        self.eval("document.readyState === 'complete'".to_string())
            .await
    }

    async fn find(&self, locator: &Locator) -> PageResult<Option<ElementId>> {
        let id: Option<u64> = self.eval(find_one_snippet(locator)).await?;
        Ok(id.map(ElementId))
    }

    async fn find_all(&self, locator: &Locator) -> PageResult<Vec<ElementId>> {
        let ids: Vec<u64> = self.eval(find_all_snippet(locator)).await?;
        Ok(ids.into_iter().map(ElementId).collect())
    }

    async fn find_in(&self, scope: ElementId, locator: &Locator) -> PageResult<Option<ElementId>> {
        let id: Option<u64> = self.eval(find_in_snippet(scope, locator)).await?;
        Ok(id.map(ElementId))
    }

    async fn element_state(&self, id: ElementId) -> PageResult<ElementState> {
        #[derive(Deserialize)]
        struct JsState {
            attached: bool,
            visible: bool,
            enabled: bool,
        }

        let state: JsState = self.eval(state_snippet(id)).await?;
        Ok(ElementState {
            attached: state.attached,
            visible: state.visible,
            enabled: state.enabled,
        })
    }

    async fn click(&self, id: ElementId) -> PageResult<()> {
        #[derive(Deserialize)]
        struct Point {
            x: f64,
            y: f64,
        }

        let center: Option<Point> = self.eval(center_snippet(id)).await?;
        let Some(center) = center else {
            return Err(PageError::StaleElement(id));
        };

        #[derive(Serialize)]
        struct MouseParams {
            #[serde(rename = "type")]
            kind: &'static str,
            x: f64,
            y: f64,
            button: &'static str,
            #[serde(rename = "clickCount")]
            click_count: u32,
        }

        for (kind, button, click_count) in [
            ("mouseMoved", "none", 0),
            ("mousePressed", "left", 1),
            ("mouseReleased", "left", 1),
        ] {
            self.client
                .execute_void(
                    "Input.dispatchMouseEvent",
                    Some(MouseParams {
                        kind,
                        x: center.x,
                        y: center.y,
                        button,
                        click_count,
                    }),
                )
                .await?;
        }
        Ok(())
    }

    async fn clear(&self, id: ElementId) -> PageResult<()> {
        let cleared: bool = self.eval(clear_snippet(id)).await?;
        if cleared {
            Ok(())
        } else {
            Err(PageError::StaleElement(id))
        }
    }

    async fn type_text(&self, id: ElementId, text: &str) -> PageResult<()> {
        self.focus(id).await?;
        for ch in text.chars() {
            self.dispatch_key(KeyEventParams::character(ch)).await?;
        }
        Ok(())
    }

    async fn press_enter(&self, id: ElementId) -> PageResult<()> {
        self.focus(id).await?;
        self.dispatch_key(KeyEventParams::enter("rawKeyDown")).await?;
        self.dispatch_key(KeyEventParams {
            text: Some("\r".to_string()),
            ..KeyEventParams::enter("char")
        })
        .await?;
        self.dispatch_key(KeyEventParams::enter("keyUp")).await
    }

    async fn select_value(&self, id: ElementId, value: &str) -> PageResult<()> {
        let outcome: String = self.eval(select_snippet(id, value)).await?;
        match outcome.as_str() {
            "ok" => Ok(()),
            "missing" => Err(PageError::OptionNotFound {
                value: value.to_string(),
            }),
            _ => Err(PageError::StaleElement(id)),
        }
    }

    async fn submit_form(&self, id: ElementId) -> PageResult<()> {
        let outcome: String = self.eval(submit_snippet(id)).await?;
        match outcome.as_str() {
            "ok" => Ok(()),
            "noform" => Err(PageError::Unsupported(
                "submit on an element without a form".to_string(),
            )),
            _ => Err(PageError::StaleElement(id)),
        }
    }

    async fn text(&self, id: ElementId) -> PageResult<String> {
        let text: Option<String> = self.eval(text_snippet(id)).await?;
        text.ok_or(PageError::StaleElement(id))
    }

    async fn screenshot(&self) -> PageResult<Option<Vec<u8>>> {
        #[derive(Serialize)]
        struct Params {
            format: &'static str,
        }

        #[derive(Deserialize)]
        struct Shot {
            data: String,
        }

        let shot: Shot = self
            .client
            .execute("Page.captureScreenshot", Some(Params { format: "png" }))
            .await?;
        let bytes = BASE64
            .decode(shot.data)
            .map_err(|e| PageError::Protocol(format!("screenshot decode: {e}")))?;
        Ok(Some(bytes))
    }

    async fn close(&mut self) -> PageResult<()> {
        self.client.close().await;
        if let Some(mut session) = self.session.take() {
            let _ = session.stop();
        }
        Ok(())
    }
}

/// Key event parameters for `Input.dispatchKeyEvent`.
#[derive(Serialize)]
struct KeyEventParams {
    #[serde(rename = "type")]
    kind: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    key: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    code: Option<&'static str>,
    #[serde(
        rename = "windowsVirtualKeyCode",
        skip_serializing_if = "Option::is_none"
    )]
    windows_virtual_key_code: Option<u32>,
    #[serde(
        rename = "nativeVirtualKeyCode",
        skip_serializing_if = "Option::is_none"
    )]
    native_virtual_key_code: Option<u32>,
}

impl KeyEventParams {
    fn character(ch: char) -> Self {
        Self {
            kind: "char",
            text: Some(ch.to_string()),
            key: None,
            code: None,
            windows_virtual_key_code: None,
            native_virtual_key_code: None,
        }
    }

    fn enter(kind: &'static str) -> Self {
        Self {
            kind,
            text: None,
            key: Some("Enter"),
            code: Some("Enter"),
            windows_virtual_key_code: Some(13),
            native_virtual_key_code: Some(13),
        }
    }
}

/// A string literal safe to splice into a snippet.
fn js_str(text: &str) -> String {
    serde_json::Value::String(text.to_string()).to_string()
}

fn narrowing_filter(locator: &Locator) -> String {
    match &locator.narrowing {
        Narrowing::None => String::new(),
        Narrowing::Text(text) => format!(
            " matches = matches.filter(function(el) {{ return (el.textContent || '').trim() === {}; }});",
            js_str(text)
        ),
        Narrowing::Attr { name, value } => format!(
            " matches = matches.filter(function(el) {{ return el.getAttribute({}) === {}; }});",
            js_str(name),
            js_str(value)
        ),
    }
}

fn find_one_snippet(locator: &Locator) -> String {
    format!(
        "(function() {{ {REGISTRY_JS} var reg = window.__cw; \
         var matches = Array.prototype.slice.call(document.querySelectorAll({css}));{filter} \
         if (matches.length === 0) return null; \
         var id = reg.next++; reg.els[id] = matches[0]; return id; }})()",
        css = js_str(&locator.css),
        filter = narrowing_filter(locator),
    )
}

fn find_all_snippet(locator: &Locator) -> String {
    format!(
        "(function() {{ {REGISTRY_JS} var reg = window.__cw; \
         var matches = Array.prototype.slice.call(document.querySelectorAll({css}));{filter} \
         return matches.map(function(el) {{ var id = reg.next++; reg.els[id] = el; return id; }}); }})()",
        css = js_str(&locator.css),
        filter = narrowing_filter(locator),
    )
}

fn find_in_snippet(scope: ElementId, locator: &Locator) -> String {
    format!(
        "(function() {{ {REGISTRY_JS} var reg = window.__cw; \
         var scope = reg.els[{sid}]; \
         if (!scope || !scope.isConnected) return null; \
         var matches = Array.prototype.slice.call(scope.querySelectorAll({css}));{filter} \
         if (matches.length === 0) return null; \
         var id = reg.next++; reg.els[id] = matches[0]; return id; }})()",
        sid = scope.0,
        css = js_str(&locator.css),
        filter = narrowing_filter(locator),
    )
}

fn state_snippet(id: ElementId) -> String {
    format!(
        "(function() {{ {REGISTRY_JS} var el = window.__cw.els[{id}]; \
         if (!el || !el.isConnected) return {{ attached: false, visible: false, enabled: false }}; \
         var rect = el.getBoundingClientRect(); \
         var style = window.getComputedStyle(el); \
         var visible = rect.width > 0 && rect.height > 0 && \
           style.display !== 'none' && style.visibility !== 'hidden'; \
         return {{ attached: true, visible: visible, enabled: !el.disabled }}; }})()",
        id = id.0,
    )
}

fn center_snippet(id: ElementId) -> String {
    format!(
        "(function() {{ {REGISTRY_JS} var el = window.__cw.els[{id}]; \
         if (!el || !el.isConnected) return null; \
         el.scrollIntoView({{ block: 'center', inline: 'center' }}); \
         var r = el.getBoundingClientRect(); \
         return {{ x: r.left + r.width / 2, y: r.top + r.height / 2 }}; }})()",
        id = id.0,
    )
}

fn focus_snippet(id: ElementId) -> String {
    format!(
        "(function() {{ {REGISTRY_JS} var el = window.__cw.els[{id}]; \
         if (!el || !el.isConnected) return false; \
         el.focus(); return true; }})()",
        id = id.0,
    )
}

fn clear_snippet(id: ElementId) -> String {
    format!(
        "(function() {{ {REGISTRY_JS} var el = window.__cw.els[{id}]; \
         if (!el || !el.isConnected) return false; \
         el.focus(); el.value = ''; \
         el.dispatchEvent(new Event('input', {{ bubbles: true }})); \
         el.dispatchEvent(new Event('change', {{ bubbles: true }})); \
         return true; }})()",
        id = id.0,
    )
}

fn select_snippet(id: ElementId, value: &str) -> String {
    format!(
        "(function() {{ {REGISTRY_JS} var el = window.__cw.els[{id}]; \
         if (!el || !el.isConnected) return 'stale'; \
         var has = false; \
         for (var i = 0; i < el.options.length; i++) {{ \
           if (el.options[i].value === {value}) {{ has = true; break; }} }} \
         if (!has) return 'missing'; \
         el.value = {value}; \
         el.dispatchEvent(new Event('change', {{ bubbles: true }})); \
         return 'ok'; }})()",
        id = id.0,
        value = js_str(value),
    )
}

fn submit_snippet(id: ElementId) -> String {
    format!(
        "(function() {{ {REGISTRY_JS} var el = window.__cw.els[{id}]; \
         if (!el || !el.isConnected) return 'stale'; \
         var form = el.tagName === 'FORM' ? el : el.form; \
         if (!form) return 'noform'; \
         if (form.requestSubmit) form.requestSubmit(); else form.submit(); \
         return 'ok'; }})()",
        id = id.0,
    )
}

fn text_snippet(id: ElementId) -> String {
    format!(
        "(function() {{ {REGISTRY_JS} var el = window.__cw.els[{id}]; \
         if (!el || !el.isConnected) return null; \
         return (el.textContent || '').trim(); }})()",
        id = id.0,
    )
}
