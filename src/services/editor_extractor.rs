//! Editor extraction for dotpush.
//!
//! Locates the user's solution in a foreign page by trying several editor
//! technologies in order and keeping the longest plausible buffer. The page is
//! reached only through [`PageInspector`], so the selection logic runs the same
//! against a live page bridge, a captured [`PageSnapshot`] or a test fixture.
//!
//! [`PageSnapshot`]: crate::services::page_snapshot::PageSnapshot

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};

use tracing::{debug, warn};

use crate::services::language_classifier::classify;
use crate::types::errors::InspectError;
use crate::types::extraction::{CodeSelector, ElementText, ExtractionResult};

/// Read-only view of a page the extractor does not control.
///
/// `Ok(None)` means the editor global is absent; `Err` means it is present but
/// unusable. Implementations may also panic; the extractor contains that too.
pub trait PageInspector {
    /// Every model exposed by the primary rich editor (Monaco-style global).
    fn structured_editor_buffers(&self) -> Result<Option<Vec<String>>, InspectError>;

    /// One entry per alternate-editor element (CodeMirror-style); `None` for an
    /// element without an attached editor instance.
    fn alternate_editor_buffers(&self) -> Result<Option<Vec<Option<String>>>, InspectError>;

    /// Values of all plain multi-line text inputs.
    fn text_areas(&self) -> Result<Vec<String>, InspectError>;

    /// Text content of elements matching any of `selectors`, in document order.
    fn code_like_elements(&self, selectors: &[CodeSelector]) -> Result<Vec<ElementText>, InspectError>;
}

/// Selectors of the generic DOM scan.
pub const CODE_CONTAINER_SELECTORS: [CodeSelector; 9] = [
    CodeSelector::AttrContains { attr: "class", needle: "editor" },
    CodeSelector::AttrContains { attr: "id", needle: "editor" },
    CodeSelector::AttrContains { attr: "class", needle: "code" },
    CodeSelector::AttrContains { attr: "id", needle: "code" },
    CodeSelector::Descendant { ancestor: "pre", tag: "code" },
    CodeSelector::Class("monaco-editor"),
    CodeSelector::AttrContains { attr: "class", needle: "codemirror" },
    CodeSelector::AttrContains { attr: "data-cy", needle: "code" },
    CodeSelector::AttrContains { attr: "data-testid", needle: "code" },
];

const CODE_TOKENS: [&str; 4] = ["{", "def ", "func ", "class "];
const DOM_CODE_TOKENS: [&str; 6] = ["{", "def ", "func ", "class ", "function ", "import "];

/// The CSS form of [`CODE_CONTAINER_SELECTORS`], for page bridges that run
/// `querySelectorAll`.
pub fn code_container_query() -> String {
    CODE_CONTAINER_SELECTORS
        .iter()
        .map(|s| s.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

struct Candidate {
    text: String,
    label: String,
}

/// Longest-wins selection shared by all stages. Ties keep the earliest candidate.
fn longest<'a, I>(items: I, min_length: usize, tokens: Option<&[&str]>) -> Option<(usize, &'a str)>
where
    I: IntoIterator<Item = (usize, &'a str)>,
{
    let mut best: Option<(usize, &'a str)> = None;
    for (idx, text) in items {
        if text.trim().len() <= min_length {
            continue;
        }
        if let Some(tokens) = tokens {
            if !tokens.iter().any(|t| text.contains(t)) {
                continue;
            }
        }
        if best.map_or(true, |(_, b)| text.len() > b.len()) {
            best = Some((idx, text));
        }
    }
    best
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "panic".to_string()
    }
}

/// Runs one page query, recording failures instead of propagating them.
fn guarded<T>(
    stage: &str,
    diagnostics: &mut Vec<String>,
    query: impl FnOnce() -> Result<T, InspectError>,
) -> Option<T> {
    match panic::catch_unwind(AssertUnwindSafe(query)) {
        Ok(Ok(value)) => Some(value),
        Ok(Err(e)) => {
            warn!(stage, error = %e, "page query failed");
            diagnostics.push(format!("{} error:{}", stage, e));
            None
        }
        Err(payload) => {
            let msg = panic_message(payload.as_ref());
            warn!(stage, error = %msg, "page query panicked");
            diagnostics.push(format!("{} error:{}", stage, msg));
            None
        }
    }
}

/// Heuristic extractor over the four-stage fallback chain.
pub struct EditorExtractor {
    min_length: usize,
}

impl EditorExtractor {
    pub fn new(min_length: usize) -> Self {
        Self { min_length }
    }

    /// Extracts the most likely solution buffer. Never fails: problems are
    /// reported through `found` and `diagnostics`.
    pub fn extract(&self, page: &dyn PageInspector) -> ExtractionResult {
        let mut diagnostics = Vec::new();

        let mut winner = self.structured_editor_stage(page, &mut diagnostics);
        if winner.is_none() {
            winner = self.alternate_editor_stage(page, &mut diagnostics);
        }
        if winner.is_none() {
            winner = self.text_area_stage(page, &mut diagnostics);
        }
        if winner.is_none() {
            winner = self.dom_scan_stage(page, &mut diagnostics);
        }

        match winner {
            Some(candidate) => {
                let text = candidate.text.trim().to_string();
                debug!(method = %candidate.label, len = text.len(), "extracted code");
                ExtractionResult {
                    found: true,
                    language: classify(&text),
                    text,
                    source_method: candidate.label,
                    diagnostics,
                }
            }
            None => {
                debug!(?diagnostics, "no code found on page");
                ExtractionResult {
                    found: false,
                    text: String::new(),
                    language: classify(""),
                    source_method: String::new(),
                    diagnostics,
                }
            }
        }
    }

    fn structured_editor_stage(
        &self,
        page: &dyn PageInspector,
        diagnostics: &mut Vec<String>,
    ) -> Option<Candidate> {
        let buffers = match guarded("monaco", diagnostics, || page.structured_editor_buffers())? {
            Some(buffers) => buffers,
            None => {
                diagnostics.push("monaco absent".to_string());
                return None;
            }
        };
        diagnostics.push(format!("monaco models:{}", buffers.len()));

        let items = buffers.iter().enumerate().map(|(i, b)| (i, b.as_str()));
        longest(items, self.min_length, None).map(|(idx, text)| Candidate {
            text: text.to_string(),
            label: format!("Monaco Editor, buffer #{}", idx),
        })
    }

    fn alternate_editor_stage(
        &self,
        page: &dyn PageInspector,
        diagnostics: &mut Vec<String>,
    ) -> Option<Candidate> {
        let editors = match guarded("codemirror", diagnostics, || page.alternate_editor_buffers())? {
            Some(editors) => editors,
            None => {
                diagnostics.push("codemirror absent".to_string());
                return None;
            }
        };
        diagnostics.push(format!("codemirror elements:{}", editors.len()));

        let items = editors
            .iter()
            .enumerate()
            .filter_map(|(i, e)| e.as_deref().map(|text| (i, text)));
        longest(items, self.min_length, None).map(|(idx, text)| Candidate {
            text: text.to_string(),
            label: format!("CodeMirror #{}", idx),
        })
    }

    fn text_area_stage(
        &self,
        page: &dyn PageInspector,
        diagnostics: &mut Vec<String>,
    ) -> Option<Candidate> {
        let areas = guarded("textareas", diagnostics, || page.text_areas())?;
        diagnostics.push(format!("textareas:{}", areas.len()));

        let items = areas.iter().enumerate().map(|(i, a)| (i, a.as_str()));
        longest(items, self.min_length, Some(&CODE_TOKENS)).map(|(idx, text)| Candidate {
            text: text.to_string(),
            label: format!("Textarea #{}", idx),
        })
    }

    fn dom_scan_stage(
        &self,
        page: &dyn PageInspector,
        diagnostics: &mut Vec<String>,
    ) -> Option<Candidate> {
        let elements = guarded("code-like elements", diagnostics, || {
            page.code_like_elements(&CODE_CONTAINER_SELECTORS)
        })?;
        diagnostics.push(format!("code-like elements:{}", elements.len()));

        let items = elements.iter().enumerate().map(|(i, e)| (i, e.text.as_str()));
        longest(items, self.min_length, Some(&DOM_CODE_TOKENS)).map(|(idx, text)| Candidate {
            text: text.to_string(),
            label: format!("DOM Element #{} ({})", idx, elements[idx].tag.to_uppercase()),
        })
    }
}

impl Default for EditorExtractor {
    fn default() -> Self {
        Self::new(10)
    }
}
