//! Element locators
//!
//! A locator is a CSS selector plus an optional narrowing, covering the two
//! refinements the storefront needs beyond plain CSS: picking a swatch by its
//! rendered label and picking one by an attribute value.

use std::fmt;

/// How a CSS match set is narrowed to one logical target.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub enum Narrowing {
    #[default]
    None,

    /// Trimmed rendered text equals this value.
    Text(String),

    /// Attribute equals this value.
    Attr { name: String, value: String },
}

/// Locates elements on the live page. Locators never cache element
/// identity; resolution happens at query time, every time.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Locator {
    pub css: String,
    pub narrowing: Narrowing,
}

impl Locator {
    pub fn css(selector: impl Into<String>) -> Self {
        Self {
            css: selector.into(),
            narrowing: Narrowing::None,
        }
    }

    pub fn with_text(selector: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            css: selector.into(),
            narrowing: Narrowing::Text(text.into()),
        }
    }

    pub fn with_attr(
        selector: impl Into<String>,
        name: impl Into<String>,
        value: impl Into<String>,
    ) -> Self {
        Self {
            css: selector.into(),
            narrowing: Narrowing::Attr {
                name: name.into(),
                value: value.into(),
            },
        }
    }
}

impl fmt::Display for Locator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.narrowing {
            Narrowing::None => write!(f, "{}", self.css),
            Narrowing::Text(t) => write!(f, "{}[text={:?}]", self.css, t),
            Narrowing::Attr { name, value } => {
                write!(f, "{}[{}={:?}]", self.css, name, value)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_renders_narrowings() {
        assert_eq!(Locator::css("#qty").to_string(), "#qty");
        assert_eq!(
            Locator::with_text(".swatch-option.text", "XL").to_string(),
            ".swatch-option.text[text=\"XL\"]"
        );
        assert_eq!(
            Locator::with_attr(".swatch-option.color", "option-label", "Orange").to_string(),
            ".swatch-option.color[option-label=\"Orange\"]"
        );
    }
}
