// dotpush page snapshot
// A serializable capture of the parts of a practice page the extractor reads.
// Page bridges emit this as JSON; the CLI and RPC server feed it to EditorExtractor.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::services::editor_extractor::PageInspector;
use crate::types::errors::InspectError;
use crate::types::extraction::{CodeSelector, ElementText};

/// One element of the captured DOM, in document order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SnapshotElement {
    pub tag: String,
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub classes: Vec<String>,
    #[serde(default)]
    pub attributes: BTreeMap<String, String>,
    /// Tag names of all ancestors, nearest first.
    #[serde(default)]
    pub ancestors: Vec<String>,
    #[serde(default)]
    pub text: String,
}

impl SnapshotElement {
    fn attribute(&self, name: &str) -> Option<String> {
        match name {
            "class" if !self.classes.is_empty() => Some(self.classes.join(" ")),
            "id" => self.id.clone(),
            _ => self.attributes.get(name).cloned(),
        }
    }

    pub fn matches(&self, selector: &CodeSelector) -> bool {
        match selector {
            CodeSelector::AttrContains { attr, needle } => self
                .attribute(attr)
                .map_or(false, |value| value.contains(needle)),
            CodeSelector::Descendant { ancestor, tag } => {
                self.tag.eq_ignore_ascii_case(tag)
                    && self.ancestors.iter().any(|a| a.eq_ignore_ascii_case(ancestor))
            }
            CodeSelector::Class(class) => self.classes.iter().any(|c| c == class),
        }
    }
}

/// Captured page state.
///
/// `monaco_models` and `codemirror_editors` are `None` when the page does not
/// expose that editor at all. A `broken_globals` entry names an editor whose
/// global exists but threw when queried.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PageSnapshot {
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub monaco_models: Option<Vec<String>>,
    #[serde(default)]
    pub codemirror_editors: Option<Vec<Option<String>>>,
    #[serde(default)]
    pub textareas: Vec<String>,
    #[serde(default)]
    pub elements: Vec<SnapshotElement>,
    #[serde(default)]
    pub broken_globals: Vec<String>,
}

impl PageSnapshot {
    pub fn from_json(json: &str) -> Result<Self, InspectError> {
        serde_json::from_str(json)
            .map_err(|e| InspectError::QueryFailed(format!("invalid page snapshot: {}", e)))
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, InspectError> {
        let content = fs::read_to_string(path.as_ref()).map_err(|e| {
            InspectError::QueryFailed(format!(
                "cannot read snapshot {}: {}",
                path.as_ref().display(),
                e
            ))
        })?;
        Self::from_json(&content)
    }

    fn check_global(&self, name: &str) -> Result<(), InspectError> {
        if self.broken_globals.iter().any(|g| g == name) {
            return Err(InspectError::BrokenGlobal(name.to_string()));
        }
        Ok(())
    }
}

impl PageInspector for PageSnapshot {
    fn structured_editor_buffers(&self) -> Result<Option<Vec<String>>, InspectError> {
        self.check_global("monaco")?;
        Ok(self.monaco_models.clone())
    }

    fn alternate_editor_buffers(&self) -> Result<Option<Vec<Option<String>>>, InspectError> {
        self.check_global("codemirror")?;
        Ok(self.codemirror_editors.clone())
    }

    fn text_areas(&self) -> Result<Vec<String>, InspectError> {
        Ok(self.textareas.clone())
    }

    fn code_like_elements(&self, selectors: &[CodeSelector]) -> Result<Vec<ElementText>, InspectError> {
        Ok(self
            .elements
            .iter()
            .filter(|el| selectors.iter().any(|s| el.matches(s)))
            .map(|el| ElementText {
                tag: el.tag.clone(),
                text: el.text.clone(),
            })
            .collect())
    }
}
