//! Language classification for extracted solutions.
//!
//! Practice-site snippets carry no reliable language field, so classification
//! works on surface lexical cues. Rules are evaluated top to bottom and the
//! first match wins; the order resolves tokens shared between families, e.g.
//! `class Solution {` in Java, Kotlin and C++.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::types::language::LanguageTag;

/// A single classification rule: every `required` pattern matches and no
/// `forbidden` pattern does.
struct Rule {
    tag: LanguageTag,
    required: Vec<Regex>,
    forbidden: Vec<Regex>,
}

impl Rule {
    fn matches(&self, text: &str) -> bool {
        self.required.iter().all(|re| re.is_match(text))
            && !self.forbidden.iter().any(|re| re.is_match(text))
    }
}

fn rule(tag: LanguageTag, required: &[&str], forbidden: &[&str]) -> Rule {
    let compile = |p: &&str| Regex::new(p).expect("classifier pattern");
    Rule {
        tag,
        required: required.iter().map(compile).collect(),
        forbidden: forbidden.iter().map(compile).collect(),
    }
}

static RULES: Lazy<Vec<Rule>> = Lazy::new(|| {
    use LanguageTag::*;
    vec![
        rule(Cpp, &[r"#include\s*<.*>", r"std::|cout|cin"], &[]),
        rule(Cpp, &[r"class\s+Solution\s*\{", r"#include"], &[]),
        rule(Java, &[r"public\s+class\s+\w+", r"public\s+\w+.*\("], &[]),
        rule(Java, &[r"class\s+Solution\s*\{", r"public\s+"], &[]),
        rule(Csharp, &[r"using\s+System|namespace\s+\w+"], &[]),
        rule(Csharp, &[r"public\s+class\s+\w+", r"Console\."], &[]),
        rule(Javascript, &[r"var\s+\w+\s*=\s*function|function\s+\w+\s*\("], &[]),
        rule(Javascript, &[r"const\s+\w+\s*=\s*\(|=>\s*\{"], &[]),
        rule(Javascript, &[r"let\s+\w+", r"=>"], &[]),
        rule(Typescript, &[r":\s*(number|string|boolean)\s*[,)]"], &[]),
        rule(Typescript, &[r"interface\s+\w+|type\s+\w+\s*="], &[]),
        rule(Php, &[r"<\?php|\$\w+"], &[]),
        rule(Swift, &[r"func\s+\w+\s*\(", r"class\s+Solution|var\s+\w+:\s*"], &[]),
        rule(Swift, &[r"import\s+Foundation|\[\w+\]"], &[]),
        rule(Kotlin, &[r"fun\s+\w+\s*\(", r"class\s+Solution"], &[]),
        rule(Kotlin, &[r"class\s+Solution\s*\{", r"fun\s+"], &[]),
        rule(Dart, &[r"void\s+main\s*\(\s*\)"], &[]),
        rule(Dart, &[r"class\s+\w+\s*\{", r"dart"], &[]),
        rule(Dart, &[r"import\s+'dart:"], &[]),
        rule(Go, &[r"func\s+\w+\s*\(", r"\*\w+"], &[]),
        rule(Go, &[r"package\s+main|func\s+main\s*\(\s*\)"], &[]),
        rule(Go, &[r"import\s+\(|fmt\."], &[]),
        rule(Ruby, &[r"def\s+\w+", r"end"], &[]),
        rule(Scala, &[r"object\s+\w+"], &[]),
        rule(Scala, &[r"def\s+\w+\s*\(", r"scala"], &[]),
        rule(Scala, &[r"import\s+scala\."], &[]),
        rule(Rust, &[r"fn\s+\w+\s*\(", r"impl\s+|struct\s+"], &[]),
        rule(Rust, &[r"use\s+std::|let\s+mut\s+"], &[]),
        rule(Racket, &[r"\(define\s+|\(lambda\s+"], &[]),
        rule(Racket, &[r"#lang\s+racket"], &[]),
        rule(Erlang, &[r"-module\s*\(|-export\s*\("], &[]),
        rule(Erlang, &[r"\w+\s*\(\s*\)\s*->", r"\."], &[]),
        rule(Elixir, &[r"defmodule\s+\w+|def\s+\w+\s*do"], &[]),
        rule(Elixir, &[r"IO\.puts|Enum\."], &[]),
        rule(Python, &[r"class\s+Solution\s*:|def\s+\w+\s*\("], &[]),
        rule(Python, &[r"import\s+\w+|from\s+\w+\s+import"], &[]),
        rule(C, &[r"#include\s*<.*\.h>"], &[r"std::", r"cout"]),
        rule(C, &[r"int\s+main\s*\(\s*(void)?\s*\)"], &[]),
        // Weak markers, tried only after every family rule has missed.
        rule(Python, &[r"def\s+"], &[]),
        rule(Go, &[r"func\s+"], &[r"fun\s+"]),
        rule(Kotlin, &[r"fun\s+"], &[]),
        rule(Java, &[r"public\s+class"], &[]),
        rule(Javascript, &[r"function\s+"], &[]),
    ]
});

/// Classifies source text. Total and deterministic: falls back to
/// [`LanguageTag::DEFAULT`] when no rule matches, including for empty input.
pub fn classify(text: &str) -> LanguageTag {
    RULES
        .iter()
        .find(|r| r.matches(text))
        .map(|r| r.tag)
        .unwrap_or(LanguageTag::DEFAULT)
}
