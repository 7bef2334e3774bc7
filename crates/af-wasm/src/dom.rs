//! `Document`/`DomElement` on top of web-sys

use af_core::{Document, DomElement, DomError, DomEvent, ElementKind};
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::{Event, EventInit, HtmlElement, HtmlInputElement, HtmlTextAreaElement, XPathResult};

use crate::chrome::js_error_message;

fn op_error(err: JsValue) -> DomError {
    DomError::Operation(js_error_message(&err))
}

pub struct WebDocument {
    window: web_sys::Window,
    document: web_sys::Document,
}

impl WebDocument {
    pub fn new(window: web_sys::Window, document: web_sys::Document) -> Self {
        Self { window, document }
    }

    fn evaluate_xpath(&self, expression: &str) -> Result<XPathResult, JsValue> {
        // document.evaluate(expr, document, null, ORDERED_NODE_SNAPSHOT_TYPE, null)
        let evaluate: js_sys::Function =
            js_sys::Reflect::get(&self.document, &"evaluate".into())?.dyn_into()?;
        let args = js_sys::Array::of5(
            &JsValue::from_str(expression),
            &self.document,
            &JsValue::NULL,
            &JsValue::from(XPathResult::ORDERED_NODE_SNAPSHOT_TYPE),
            &JsValue::NULL,
        );
        evaluate.apply(&self.document, &args)?.dyn_into()
    }
}

impl Document for WebDocument {
    type Element = WebElement;

    fn query_css(&self, selector: &str) -> Result<Vec<WebElement>, DomError> {
        // querySelectorAll only throws on syntax errors
        let nodes = self
            .document
            .query_selector_all(selector)
            .map_err(|e| DomError::InvalidSelector(js_error_message(&e)))?;

        let mut elements = Vec::with_capacity(nodes.length() as usize);
        for i in 0..nodes.length() {
            if let Some(element) = nodes.item(i).and_then(|n| n.dyn_into::<web_sys::Element>().ok()) {
                elements.push(WebElement(element));
            }
        }
        Ok(elements)
    }

    fn query_xpath(&self, expression: &str) -> Result<Vec<WebElement>, DomError> {
        let snapshot = self
            .evaluate_xpath(expression)
            .map_err(|e| DomError::InvalidSelector(js_error_message(&e)))?;
        let length = snapshot.snapshot_length().map_err(op_error)?;

        let mut elements = Vec::with_capacity(length as usize);
        for i in 0..length {
            // Text and attribute nodes cannot be filled
            if let Some(element) = snapshot
                .snapshot_item(i)
                .map_err(op_error)?
                .and_then(|n| n.dyn_into::<web_sys::Element>().ok())
            {
                elements.push(WebElement(element));
            }
        }
        Ok(elements)
    }

    fn current_url(&self) -> String {
        self.window.location().href().unwrap_or_default()
    }
}

/// A live page element.
pub struct WebElement(web_sys::Element);

impl WebElement {
    fn html(&self) -> Option<&HtmlElement> {
        self.0.dyn_ref::<HtmlElement>()
    }
}

impl DomElement for WebElement {
    fn kind(&self) -> ElementKind {
        match self.0.tag_name().to_ascii_uppercase().as_str() {
            "INPUT" | "TEXTAREA" => ElementKind::FormControl,
            _ if self.html().map_or(false, HtmlElement::is_content_editable) => ElementKind::Editable,
            _ => ElementKind::Other,
        }
    }

    fn is_visible(&self) -> bool {
        match self.html() {
            Some(html) => {
                html.offset_width() > 0
                    && html.offset_height() > 0
                    && self.0.get_client_rects().length() > 0
            }
            None => false,
        }
    }

    fn focus(&self) -> Result<(), DomError> {
        match self.html() {
            Some(html) => html.focus().map_err(op_error),
            None => Ok(()),
        }
    }

    fn dispatch(&self, event: DomEvent) -> Result<(), DomError> {
        let init = EventInit::new();
        init.set_bubbles(true);
        let event = Event::new_with_event_init_dict(event.name(), &init).map_err(op_error)?;
        self.0.dispatch_event(&event).map(|_| ()).map_err(op_error)
    }

    fn set_value(&self, value: &str) -> Result<(), DomError> {
        if let Some(input) = self.0.dyn_ref::<HtmlInputElement>() {
            input.set_value(value);
            Ok(())
        } else if let Some(area) = self.0.dyn_ref::<HtmlTextAreaElement>() {
            area.set_value(value);
            Ok(())
        } else {
            Err(DomError::Operation(format!(
                "<{}> has no value property",
                self.0.tag_name().to_ascii_lowercase()
            )))
        }
    }

    fn set_text_content(&self, text: &str) -> Result<(), DomError> {
        self.0.set_text_content(Some(text));
        Ok(())
    }

    fn set_value_attribute(&self, value: &str) -> Result<(), DomError> {
        self.0.set_attribute("value", value).map_err(op_error)
    }
}
