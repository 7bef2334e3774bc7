//! DOM surface the engine needs from its host
//!
//! The browser bindings implement these traits on top of `web-sys`; tests use
//! an in-memory document.

use crate::error::DomError;

/// Synthetic events fired while filling an element. All of them bubble.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DomEvent {
    Focus,
    Input,
    Change,
    Blur,
}

impl DomEvent {
    pub fn name(self) -> &'static str {
        match self {
            Self::Focus => "focus",
            Self::Input => "input",
            Self::Change => "change",
            Self::Blur => "blur",
        }
    }
}

/// The element variants the injector knows how to fill.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ElementKind {
    /// `<input>` and `<textarea>`: has a live `value` property
    FormControl,
    /// Element with `contentEditable` on
    Editable,
    /// Anything else; only the `value` attribute is set
    Other,
}

/// A live element handle.
pub trait DomElement {
    fn kind(&self) -> ElementKind;

    /// Non-zero rendered width and height, and at least one client rect.
    fn is_visible(&self) -> bool;

    fn focus(&self) -> Result<(), DomError>;

    fn dispatch(&self, event: DomEvent) -> Result<(), DomError>;

    /// Assign the `value` property of a form control.
    fn set_value(&self, value: &str) -> Result<(), DomError>;

    fn set_text_content(&self, text: &str) -> Result<(), DomError>;

    /// Set the `value` attribute, without touching any property.
    fn set_value_attribute(&self, value: &str) -> Result<(), DomError>;
}

/// The page document.
pub trait Document {
    type Element: DomElement;

    /// All matches of a CSS selector, in document order.
    fn query_css(&self, selector: &str) -> Result<Vec<Self::Element>, DomError>;

    /// All element nodes of an ordered-snapshot XPath evaluation.
    fn query_xpath(&self, expression: &str) -> Result<Vec<Self::Element>, DomError>;

    /// `location.href` of the page.
    fn current_url(&self) -> String;
}
