//! Placeholder scanning and classification.
//!
//! A placeholder is `${token}` where `token` matches `[A-Za-z0-9_:.-]+`.
//! Tokens without a `:` name a variable. Tokens with a `:` are references
//! of the form `namespace:name`; the only namespace with content is
//! [`SECTION_NAMESPACE`], anything else resolves to nothing.

use std::sync::OnceLock;

use regex::Regex;

/// Namespace used by `${section:name}` placeholders.
pub const SECTION_NAMESPACE: &str = "section";

/// Parsed form of a placeholder token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Placeholder<'a> {
    /// `${name}` - must resolve to a variable.
    Variable(&'a str),
    /// `${namespace:name}` - resolves to section content or empty text.
    Reference { namespace: &'a str, name: &'a str },
}

impl<'a> Placeholder<'a> {
    /// Classify a raw token (the text between `${` and `}`).
    pub fn parse(token: &'a str) -> Self {
        match token.split_once(':') {
            Some((namespace, name)) => Self::Reference { namespace, name },
            None => Self::Variable(token),
        }
    }

    /// Section name, when this placeholder is `${section:name}`.
    pub fn section_name(&self) -> Option<&'a str> {
        match self {
            Self::Reference { namespace, name } if *namespace == SECTION_NAMESPACE => Some(*name),
            _ => None,
        }
    }
}

/// Compiled `${token}` pattern. Group 1 holds the token.
pub(crate) fn pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"\$\{([A-Za-z0-9_:.\-]+)\}").expect("placeholder pattern is a valid regex")
    })
}
