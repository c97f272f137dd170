use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Programming language of an extracted solution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LanguageTag {
    Python,
    Java,
    Csharp,
    Javascript,
    Typescript,
    Php,
    Swift,
    Kotlin,
    Dart,
    Go,
    Ruby,
    Scala,
    Rust,
    Racket,
    Erlang,
    Elixir,
    C,
    Cpp,
}

impl LanguageTag {
    /// Tag returned when no classification rule matches.
    ///
    /// This is the first family of the enumeration, not an "unknown" marker;
    /// file naming relies on every classification having a real extension.
    pub const DEFAULT: LanguageTag = LanguageTag::Python;

    pub const ALL: [LanguageTag; 18] = [
        LanguageTag::Python,
        LanguageTag::Java,
        LanguageTag::Csharp,
        LanguageTag::Javascript,
        LanguageTag::Typescript,
        LanguageTag::Php,
        LanguageTag::Swift,
        LanguageTag::Kotlin,
        LanguageTag::Dart,
        LanguageTag::Go,
        LanguageTag::Ruby,
        LanguageTag::Scala,
        LanguageTag::Rust,
        LanguageTag::Racket,
        LanguageTag::Erlang,
        LanguageTag::Elixir,
        LanguageTag::C,
        LanguageTag::Cpp,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            LanguageTag::Python => "python",
            LanguageTag::Java => "java",
            LanguageTag::Csharp => "csharp",
            LanguageTag::Javascript => "javascript",
            LanguageTag::Typescript => "typescript",
            LanguageTag::Php => "php",
            LanguageTag::Swift => "swift",
            LanguageTag::Kotlin => "kotlin",
            LanguageTag::Dart => "dart",
            LanguageTag::Go => "go",
            LanguageTag::Ruby => "ruby",
            LanguageTag::Scala => "scala",
            LanguageTag::Rust => "rust",
            LanguageTag::Racket => "racket",
            LanguageTag::Erlang => "erlang",
            LanguageTag::Elixir => "elixir",
            LanguageTag::C => "c",
            LanguageTag::Cpp => "cpp",
        }
    }

    /// File extension used for the pushed solution file.
    pub fn file_extension(&self) -> &'static str {
        match self {
            LanguageTag::Python => "py",
            LanguageTag::Java => "java",
            LanguageTag::Csharp => "cs",
            LanguageTag::Javascript => "js",
            LanguageTag::Typescript => "ts",
            LanguageTag::Php => "php",
            LanguageTag::Swift => "swift",
            LanguageTag::Kotlin => "kt",
            LanguageTag::Dart => "dart",
            LanguageTag::Go => "go",
            LanguageTag::Ruby => "rb",
            LanguageTag::Scala => "scala",
            LanguageTag::Rust => "rs",
            LanguageTag::Racket => "rkt",
            LanguageTag::Erlang => "erl",
            LanguageTag::Elixir => "ex",
            LanguageTag::C => "c",
            LanguageTag::Cpp => "cpp",
        }
    }
}

impl fmt::Display for LanguageTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LanguageTag {
    type Err = String;

    /// Parses a language label, accepting the common aliases editors report.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let tag = match s.trim().to_lowercase().as_str() {
            "python" | "python3" => LanguageTag::Python,
            "java" => LanguageTag::Java,
            "csharp" | "c#" => LanguageTag::Csharp,
            "javascript" => LanguageTag::Javascript,
            "typescript" => LanguageTag::Typescript,
            "php" => LanguageTag::Php,
            "swift" => LanguageTag::Swift,
            "kotlin" => LanguageTag::Kotlin,
            "dart" => LanguageTag::Dart,
            "go" | "golang" => LanguageTag::Go,
            "ruby" => LanguageTag::Ruby,
            "scala" => LanguageTag::Scala,
            "rust" => LanguageTag::Rust,
            "racket" => LanguageTag::Racket,
            "erlang" => LanguageTag::Erlang,
            "elixir" => LanguageTag::Elixir,
            "c" => LanguageTag::C,
            "cpp" | "c++" => LanguageTag::Cpp,
            other => return Err(format!("unrecognized language: {}", other)),
        };
        Ok(tag)
    }
}

/// Maps a free-form language label to a file extension, failing closed to `txt`.
pub fn file_extension_for(label: &str) -> &'static str {
    label
        .parse::<LanguageTag>()
        .map(|tag| tag.file_extension())
        .unwrap_or("txt")
}
