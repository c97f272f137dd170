use std::fmt;

use serde::{Deserialize, Serialize};

use super::language::LanguageTag;

/// Outcome of one extraction attempt against a page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractionResult {
    pub found: bool,
    pub text: String,
    pub language: LanguageTag,
    pub source_method: String,
    pub diagnostics: Vec<String>,
}

/// Text content of a page element matched by a code-container selector.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ElementText {
    pub tag: String,
    pub text: String,
}

/// A "looks like a code container" selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CodeSelector {
    /// `[attr*="needle"]`
    AttrContains {
        attr: &'static str,
        needle: &'static str,
    },
    /// `ancestor tag`, a descendant combinator over two tag names.
    Descendant {
        ancestor: &'static str,
        tag: &'static str,
    },
    /// `.class`
    Class(&'static str),
}

impl fmt::Display for CodeSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CodeSelector::AttrContains { attr, needle } => {
                write!(f, "[{}*=\"{}\"]", attr, needle)
            }
            CodeSelector::Descendant { ancestor, tag } => write!(f, "{} {}", ancestor, tag),
            CodeSelector::Class(class) => write!(f, ".{}", class),
        }
    }
}
