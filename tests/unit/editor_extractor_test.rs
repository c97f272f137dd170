//! Tests for the four-stage editor extraction chain.

use dotpush::services::editor_extractor::{EditorExtractor, PageInspector};
use dotpush::services::page_snapshot::{PageSnapshot, SnapshotElement};
use dotpush::types::errors::InspectError;
use dotpush::types::extraction::{CodeSelector, ElementText};
use dotpush::types::language::LanguageTag;

const PY_SOLUTION: &str = "class Solution:\n    def twoSum(self, nums, target):\n        return [0, 1]";
const SHORT_PY: &str = "def f(x):\n  return x";

fn element(tag: &str, classes: &[&str], text: &str) -> SnapshotElement {
    SnapshotElement {
        tag: tag.to_string(),
        classes: classes.iter().map(|c| c.to_string()).collect(),
        text: text.to_string(),
        ..Default::default()
    }
}

/// Page whose structured-editor global throws when touched.
struct PanickingPage {
    inner: PageSnapshot,
}

impl PageInspector for PanickingPage {
    fn structured_editor_buffers(&self) -> Result<Option<Vec<String>>, InspectError> {
        panic!("monaco.editor is undefined")
    }

    fn alternate_editor_buffers(&self) -> Result<Option<Vec<Option<String>>>, InspectError> {
        self.inner.alternate_editor_buffers()
    }

    fn text_areas(&self) -> Result<Vec<String>, InspectError> {
        self.inner.text_areas()
    }

    fn code_like_elements(&self, selectors: &[CodeSelector]) -> Result<Vec<ElementText>, InspectError> {
        self.inner.code_like_elements(selectors)
    }
}

#[test]
fn structured_editor_beats_longer_text_area_stage() {
    let page = PageSnapshot {
        monaco_models: Some(vec![PY_SOLUTION.to_string()]),
        textareas: vec![format!("{}\n{}", PY_SOLUTION, PY_SOLUTION)],
        ..Default::default()
    };
    let result = EditorExtractor::default().extract(&page);
    assert!(result.found);
    assert_eq!(result.text, PY_SOLUTION);
    assert_eq!(result.source_method, "Monaco Editor, buffer #0");
    assert_eq!(result.language, LanguageTag::Python);
    assert_eq!(result.diagnostics, vec!["monaco models:1".to_string()]);
}

#[test]
fn longest_structured_buffer_wins() {
    let page = PageSnapshot {
        monaco_models: Some(vec![
            SHORT_PY.to_string(),
            "tiny".to_string(),
            PY_SOLUTION.to_string(),
        ]),
        ..Default::default()
    };
    let result = EditorExtractor::default().extract(&page);
    assert_eq!(result.source_method, "Monaco Editor, buffer #2");
}

#[test]
fn short_structured_buffers_fall_through_to_alternate_editor() {
    let page = PageSnapshot {
        monaco_models: Some(vec!["x = 1".to_string()]),
        codemirror_editors: Some(vec![None, Some("   ".to_string()), Some(PY_SOLUTION.to_string())]),
        ..Default::default()
    };
    let result = EditorExtractor::default().extract(&page);
    assert_eq!(result.source_method, "CodeMirror #2");
    assert_eq!(
        result.diagnostics,
        vec!["monaco models:1".to_string(), "codemirror elements:3".to_string()]
    );
}

#[test]
fn text_area_needs_a_code_token() {
    let page = PageSnapshot {
        textareas: vec![
            "Please describe your approach in plain words here".to_string(),
            format!("   {}   \n", SHORT_PY),
        ],
        ..Default::default()
    };
    let result = EditorExtractor::default().extract(&page);
    assert_eq!(result.source_method, "Textarea #1");
    assert_eq!(result.text, SHORT_PY);
}

#[test]
fn dom_scan_labels_element_with_tag() {
    let page = PageSnapshot {
        elements: vec![
            element("div", &["sidebar"], "not matched at all, no selector hits"),
            element("div", &["code-hint"], "Hint: use a hash map"),
            element("pre", &["code-block"], "import java.util.*;\nclass A {}"),
        ],
        ..Default::default()
    };
    let result = EditorExtractor::default().extract(&page);
    assert!(result.found);
    assert_eq!(result.source_method, "DOM Element #1 (PRE)");
    assert!(result.diagnostics.contains(&"code-like elements:2".to_string()));
}

#[test]
fn empty_page_reports_every_stage() {
    let result = EditorExtractor::default().extract(&PageSnapshot::default());
    assert!(!result.found);
    assert!(result.text.is_empty());
    assert_eq!(
        result.diagnostics,
        vec![
            "monaco absent".to_string(),
            "codemirror absent".to_string(),
            "textareas:0".to_string(),
            "code-like elements:0".to_string(),
        ]
    );
}

#[test]
fn broken_global_is_recorded_and_skipped() {
    let page = PageSnapshot {
        monaco_models: Some(vec![PY_SOLUTION.to_string()]),
        broken_globals: vec!["monaco".to_string()],
        textareas: vec![SHORT_PY.to_string()],
        ..Default::default()
    };
    let result = EditorExtractor::default().extract(&page);
    assert_eq!(result.source_method, "Textarea #0");
    assert_eq!(result.diagnostics[0], "monaco error:broken editor global: monaco");
}

#[test]
fn panicking_inspector_is_contained() {
    let page = PanickingPage {
        inner: PageSnapshot {
            textareas: vec![SHORT_PY.to_string()],
            ..Default::default()
        },
    };
    let result = EditorExtractor::default().extract(&page);
    assert!(result.found);
    assert_eq!(result.source_method, "Textarea #0");
    assert_eq!(result.diagnostics[0], "monaco error:monaco.editor is undefined");
}

#[test]
fn min_length_is_configurable() {
    let page = PageSnapshot {
        monaco_models: Some(vec![SHORT_PY.to_string()]),
        ..Default::default()
    };
    assert!(EditorExtractor::new(10).extract(&page).found);
    assert!(!EditorExtractor::new(100).extract(&page).found);
}

#[test]
fn snapshot_json_drives_extraction() {
    let json = r#"{
        "url": "https://leetcode.com/problems/two-sum/",
        "codemirror_editors": [null, "fn main() { let mut v = Vec::new(); v.push(2); }"],
        "textareas": []
    }"#;
    let page = PageSnapshot::from_json(json).unwrap();
    let result = EditorExtractor::default().extract(&page);
    assert_eq!(result.source_method, "CodeMirror #1");
    assert_eq!(result.language, LanguageTag::Rust);
}
