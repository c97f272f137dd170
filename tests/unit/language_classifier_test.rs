//! Tests for language classification and extension mapping.

use dotpush::services::language_classifier::classify;
use dotpush::types::language::{file_extension_for, LanguageTag};
use rstest::rstest;

#[rstest]
#[case::cpp(
    "#include <vector>\nusing namespace std;\nclass Solution {\npublic:\n    int f() { cout << 1; return 0; }\n};",
    LanguageTag::Cpp
)]
#[case::java(
    "class Solution {\n    public int twoSum(int[] nums) {\n        return 0;\n    }\n}",
    LanguageTag::Java
)]
#[case::python(
    "class Solution:\n    def twoSum(self, nums):\n        return []",
    LanguageTag::Python
)]
#[case::go_weak_marker(
    "func twoSum(nums []int, target int) []int {\n    for i := range nums {\n        _ = i\n    }\n    return nil\n}",
    LanguageTag::Go
)]
#[case::go_package("package main\n\nfunc main() {\n}", LanguageTag::Go)]
#[case::rust(
    "impl Solution {\n    pub fn two_sum(nums: Vec<i32>) -> Vec<i32> {\n        let mut seen = Vec::new();\n        seen\n    }\n}",
    LanguageTag::Rust
)]
#[case::javascript(
    "var twoSum = function(nums, target) {\n    return [];\n};",
    LanguageTag::Javascript
)]
#[case::c(
    "#include <stdio.h>\nint main(void) {\n    printf(\"hi\");\n    return 0;\n}",
    LanguageTag::C
)]
#[case::kotlin(
    "class Solution {\n    fun twoSum(nums: IntArray): IntArray {\n        return intArrayOf()\n    }\n}",
    LanguageTag::Kotlin
)]
#[case::php("<?php\nfunction_exists('x');", LanguageTag::Php)]
#[case::racket("#lang racket\n(define (f x) x)", LanguageTag::Racket)]
fn classifies_common_solutions(#[case] source: &str, #[case] expected: LanguageTag) {
    assert_eq!(classify(source), expected);
}

#[test]
fn unmatched_text_falls_back_to_default() {
    assert_eq!(classify(""), LanguageTag::DEFAULT);
    assert_eq!(classify("hello world"), LanguageTag::DEFAULT);
    assert_eq!(LanguageTag::DEFAULT, LanguageTag::Python);
}

#[test]
fn earlier_rule_wins_on_shared_tokens() {
    // Java rules are checked before the C# ones.
    let source = "public class Program {\n    public static void Main() {\n        Console.WriteLine(1);\n    }\n}";
    assert_eq!(classify(source), LanguageTag::Java);

    let with_using = format!("using System;\n{}", source);
    assert_eq!(classify(&with_using), LanguageTag::Java);
}

#[rstest]
#[case("python3", "py")]
#[case("Python", "py")]
#[case("c++", "cpp")]
#[case("golang", "go")]
#[case("C#", "cs")]
#[case("kotlin", "kt")]
#[case("elixir", "ex")]
#[case("cobol", "txt")]
#[case("", "txt")]
fn maps_labels_to_extensions(#[case] label: &str, #[case] ext: &str) {
    assert_eq!(file_extension_for(label), ext);
}

#[test]
fn every_tag_parses_from_its_name() {
    for tag in LanguageTag::ALL {
        assert_eq!(tag.as_str().parse::<LanguageTag>().unwrap(), tag);
    }
}
