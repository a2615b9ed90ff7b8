//! Content heuristics: read time, summaries, hashtags, quality and
//! readability scoring.
//!
//! All functions are pure over the raw markup string. The heuristics are
//! substring-based rather than a full Markdown parse: image references
//! are `![` occurrences, fenced code blocks are paired ```` ``` ````
//! markers, headers are lines starting with `#`.

use std::collections::BTreeSet;
use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

/// Average reading speed in words per minute
const WORDS_PER_MINUTE: u32 = 200;

/// Extra seconds a reader spends per image
const IMAGE_READ_SECONDS: u32 = 12;

/// Extra seconds a reader spends per fenced code block
const CODE_BLOCK_READ_SECONDS: u32 = 30;

/// Extra seconds a reader spends per header line
const HEADER_READ_SECONDS: u32 = 3;

/// Number of whitespace-separated words
pub fn word_count(content: &str) -> usize {
    content.split_whitespace().count()
}

fn count(text: &str, pattern: &str) -> usize {
    text.matches(pattern).count()
}

fn header_line_count(content: &str) -> usize {
    content.lines().filter(|line| line.starts_with('#')).count()
}

fn image_count(content: &str) -> usize {
    count(content, "![")
}

fn code_block_count(content: &str) -> usize {
    // opening and closing fence per block
    count(content, "```") / 2
}

fn external_link_count(content: &str) -> usize {
    count(content, "](http")
}

fn list_item_count(content: &str) -> usize {
    count(content, "\n- ") + count(content, "\n* ")
}

fn paragraph_count(content: &str) -> usize {
    content.split("\n\n").count()
}

fn sentence_count(content: &str) -> usize {
    content
        .split(['.', '!', '?'])
        .filter(|s| !s.trim().is_empty())
        .count()
}

/// Estimated reading time in minutes, floor-bounded at 1.
///
/// Word count at 200 words per minute, plus fixed per-element overhead:
/// 12 s per image, 30 s per code block, 3 s per header line.
pub fn read_time(content: &str) -> u32 {
    if content.trim().is_empty() {
        return 1;
    }

    let words = word_count(content) as u32;
    let base_minutes = (words / WORDS_PER_MINUTE).max(1);

    let extra_seconds = image_count(content) as u32 * IMAGE_READ_SECONDS
        + code_block_count(content) as u32 * CODE_BLOCK_READ_SECONDS
        + header_line_count(content) as u32 * HEADER_READ_SECONDS;

    (base_minutes + extra_seconds / 60).max(1)
}

/// Reading time scaled by content type: technical and tutorial content
/// reads at ×1.5, research and academic at ×2.0, everything else at ×1.0.
pub fn read_time_for_type(content: &str, content_type: &str) -> u32 {
    let base = read_time(content);

    match content_type.to_lowercase().as_str() {
        "technical" | "tutorial" => (base as f64 * 1.5) as u32,
        "research" | "academic" => base * 2,
        _ => base,
    }
}

fn markup_patterns() -> &'static [(Regex, &'static str)] {
    static PATTERNS: OnceLock<Vec<(Regex, &'static str)>> = OnceLock::new();
    PATTERNS.get_or_init(|| {
        [
            // fenced code blocks go first so their contents never leak
            (r"```[\s\S]*?```", ""),
            // images before links: the syntaxes overlap
            (r"!\[[^\]]*\]\([^)]*\)", ""),
            (r"\[([^\]]+)\]\([^)]*\)", "$1"),
            (r"\*\*([^*]+)\*\*", "$1"),
            (r"\*([^*]+)\*", "$1"),
            (r"`([^`]+)`", "$1"),
            (r"(?m)^#+\s*", ""),
        ]
        .into_iter()
        .map(|(pattern, replacement)| {
            (Regex::new(pattern).expect("markup pattern compiles"), replacement)
        })
        .collect()
    })
}

fn strip_markup(content: &str) -> String {
    let mut text = content.to_string();
    for (pattern, replacement) in markup_patterns() {
        text = pattern.replace_all(&text, *replacement).into_owned();
    }
    text
}

/// Extract a plain-text summary: markup stripped, sentences greedily
/// concatenated while the result stays within `max_length`, closed with a
/// trailing period.
pub fn extract_summary(content: &str, max_length: usize) -> String {
    if content.trim().is_empty() {
        return String::new();
    }

    let plain = strip_markup(content);
    let mut summary = String::new();

    for sentence in plain.split(['.', '!', '?']) {
        let sentence = sentence.trim();
        if sentence.is_empty() {
            continue;
        }

        let separator = if summary.is_empty() { 0 } else { 2 };
        if summary.len() + separator + sentence.len() + 1 > max_length {
            break;
        }

        if !summary.is_empty() {
            summary.push_str(". ");
        }
        summary.push_str(sentence);
    }

    if !summary.is_empty() && !summary.ends_with('.') {
        summary.push('.');
    }

    summary
}

/// Collect `#word` hashtags: alphanumeric/underscore runs of at most 50
/// characters, case-folded.
pub fn extract_tags(content: &str) -> BTreeSet<String> {
    static HASHTAG: OnceLock<Regex> = OnceLock::new();
    let hashtag =
        HASHTAG.get_or_init(|| Regex::new(r"#([A-Za-z0-9_]+)").expect("hashtag pattern compiles"));

    hashtag
        .captures_iter(content)
        .filter_map(|captures| captures.get(1))
        .map(|m| m.as_str())
        .filter(|tag| tag.len() <= 50)
        .map(str::to_lowercase)
        .collect()
}

/// Heuristic quality score in [0, 100].
///
/// Weighted sum of capped contributions: words/10 (cap 25), paragraphs×2
/// (cap 15), headers×3 (cap 15), images×2 (cap 10), code blocks×2
/// (cap 10), external links×2 (cap 10), list items (cap 10), bold/italic
/// markers ÷ 2 (cap 5).
pub fn quality_score(content: &str) -> f64 {
    if content.trim().is_empty() {
        return 0.0;
    }

    let mut score = 0.0;
    score += (word_count(content) / 10).min(25) as f64;
    score += (paragraph_count(content) * 2).min(15) as f64;
    score += (header_line_count(content) * 3).min(15) as f64;
    score += (image_count(content) * 2).min(10) as f64;
    score += (code_block_count(content) * 2).min(10) as f64;
    score += (external_link_count(content) * 2).min(10) as f64;
    score += list_item_count(content).min(10) as f64;

    let formatting_markers = count(content, "**") + count(content, "*");
    score += (formatting_markers / 2).min(5) as f64;

    score.min(100.0)
}

/// Readability buckets mapped from the Flesch Reading Ease score
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReadingLevel {
    VeryEasy,
    Easy,
    FairlyEasy,
    Standard,
    FairlyDifficult,
    Difficult,
    VeryDifficult,
    /// Empty or unscorable content
    Unknown,
}

impl ReadingLevel {
    /// Human-readable label
    pub fn as_str(self) -> &'static str {
        match self {
            ReadingLevel::VeryEasy => "Very Easy",
            ReadingLevel::Easy => "Easy",
            ReadingLevel::FairlyEasy => "Fairly Easy",
            ReadingLevel::Standard => "Standard",
            ReadingLevel::FairlyDifficult => "Fairly Difficult",
            ReadingLevel::Difficult => "Difficult",
            ReadingLevel::VeryDifficult => "Very Difficult",
            ReadingLevel::Unknown => "Unknown",
        }
    }
}

impl std::fmt::Display for ReadingLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Syllable approximation: vowel-group transitions over the character
/// stream, minimum 1.
fn count_syllables(text: &str) -> u32 {
    let mut syllables = 0u32;
    let mut prev_vowel = false;

    for c in text.chars().flat_map(char::to_lowercase) {
        let is_vowel = matches!(c, 'a' | 'e' | 'i' | 'o' | 'u' | 'y');
        if is_vowel && !prev_vowel {
            syllables += 1;
        }
        prev_vowel = is_vowel;
    }

    syllables.max(1)
}

/// Classify readability with the Flesch Reading Ease formula:
/// 206.835 − 1.015×(words/sentences) − 84.6×(syllables/words).
pub fn reading_level(content: &str) -> ReadingLevel {
    if content.trim().is_empty() {
        return ReadingLevel::Unknown;
    }

    let sentences = sentence_count(content);
    let words = word_count(content);
    if sentences == 0 || words == 0 {
        return ReadingLevel::Unknown;
    }

    let syllables = count_syllables(content);
    let score = 206.835
        - 1.015 * (words as f64 / sentences as f64)
        - 84.6 * (syllables as f64 / words as f64);

    if score >= 90.0 {
        ReadingLevel::VeryEasy
    } else if score >= 80.0 {
        ReadingLevel::Easy
    } else if score >= 70.0 {
        ReadingLevel::FairlyEasy
    } else if score >= 60.0 {
        ReadingLevel::Standard
    } else if score >= 50.0 {
        ReadingLevel::FairlyDifficult
    } else if score >= 30.0 {
        ReadingLevel::Difficult
    } else {
        ReadingLevel::VeryDifficult
    }
}

/// Abbreviate a view count for display: 999 stays plain, 1000 becomes
/// "1.0K", 1_500_000 becomes "1.5M".
pub fn format_view_count(views: u64) -> String {
    if views < 1_000 {
        views.to_string()
    } else if views < 1_000_000 {
        format!("{:.1}K", views as f64 / 1_000.0)
    } else {
        format!("{:.1}M", views as f64 / 1_000_000.0)
    }
}

/// Structural breakdown of a markup document
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ContentStructure {
    pub word_count: usize,
    pub paragraph_count: usize,
    pub sentence_count: usize,
    pub header_count: usize,
    pub image_count: usize,
    pub code_block_count: usize,
    pub link_count: usize,
    pub list_item_count: usize,
    pub average_words_per_paragraph: f64,
}

/// Count the structural elements of a document in one pass
pub fn content_structure(content: &str) -> ContentStructure {
    if content.trim().is_empty() {
        return ContentStructure::default();
    }

    let words = word_count(content);
    let paragraphs = paragraph_count(content);

    ContentStructure {
        word_count: words,
        paragraph_count: paragraphs,
        sentence_count: sentence_count(content),
        header_count: header_line_count(content),
        image_count: image_count(content),
        code_block_count: code_block_count(content),
        link_count: external_link_count(content),
        list_item_count: list_item_count(content),
        average_words_per_paragraph: words as f64 / paragraphs as f64,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn words(n: usize) -> String {
        vec!["word"; n].join(" ")
    }

    #[test]
    fn test_read_time_thousand_plain_words() {
        assert_eq!(read_time(&words(1000)), 5);
    }

    #[test]
    fn test_read_time_floor_is_one() {
        assert_eq!(read_time(""), 1);
        assert_eq!(read_time("just a few words"), 1);
    }

    #[test]
    fn test_read_time_monotone_in_word_count() {
        let mut last = 0;
        for n in [100, 500, 1000, 2000, 4000] {
            let minutes = read_time(&words(n));
            assert!(minutes >= last);
            last = minutes;
        }
    }

    #[test]
    fn test_read_time_counts_element_overhead() {
        // five images add exactly one minute
        let base = words(1000);
        let with_images = format!("{} {}", base, "![a](u) ".repeat(5));
        assert_eq!(read_time(&with_images), read_time(&base) + 1);

        // two code blocks add one minute
        let with_code = format!("{}\n```\nx\n```\n```\ny\n```", base);
        assert_eq!(read_time(&with_code), read_time(&base) + 1);
    }

    #[test]
    fn test_read_time_scaled_by_content_type() {
        let content = words(1000); // base 5
        assert_eq!(read_time_for_type(&content, "technical"), 7);
        assert_eq!(read_time_for_type(&content, "Tutorial"), 7);
        assert_eq!(read_time_for_type(&content, "research"), 10);
        assert_eq!(read_time_for_type(&content, "blog"), 5);
    }

    #[test]
    fn test_extract_summary_strips_markup() {
        let content = "**Bold** start. A [link](http://x) here! `code` end? Unfinished";
        let summary = extract_summary(content, 200);
        assert_eq!(summary, "Bold start. A link here. code end. Unfinished.");
    }

    #[test]
    fn test_extract_summary_respects_max_length() {
        let content = "First sentence here. Second sentence is considerably longer than the first.";
        let summary = extract_summary(content, 25);
        assert_eq!(summary, "First sentence here.");
        assert!(summary.len() <= 25);
    }

    #[test]
    fn test_extract_summary_empty_content() {
        assert_eq!(extract_summary("", 100), "");
        assert_eq!(extract_summary("   ", 100), "");
    }

    #[test]
    fn test_extract_tags_case_folded() {
        let tags = extract_tags("Learning #Rust and #systems_programming. #Rust again!");
        assert_eq!(
            tags.into_iter().collect::<Vec<_>>(),
            vec!["rust".to_string(), "systems_programming".to_string()]
        );
    }

    #[test]
    fn test_extract_tags_length_bound() {
        let long_tag = format!("#{}", "x".repeat(51));
        assert!(extract_tags(&long_tag).is_empty());
        let ok_tag = format!("#{}", "x".repeat(50));
        assert_eq!(extract_tags(&ok_tag).len(), 1);
    }

    #[test]
    fn test_quality_score_empty_is_zero() {
        assert_eq!(quality_score(""), 0.0);
        assert_eq!(quality_score("  \n "), 0.0);
    }

    #[test]
    fn test_quality_score_plain_paragraph() {
        // 300 words in one paragraph: words/10 capped at 25, plus 2 for
        // the single paragraph
        assert_eq!(quality_score(&words(300)), 27.0);
    }

    #[test]
    fn test_quality_score_capped_at_100() {
        let rich = format!(
            "{}\n\n# H\n\n{}\n{}\n{}\n",
            words(1000),
            "![i](u) [l](http://x) ".repeat(10),
            "\n- item".repeat(15),
            "**b** *i* ".repeat(10),
        );
        assert!(quality_score(&rich) <= 100.0);
    }

    #[test]
    fn test_quality_score_sums_capped_contributions() {
        // 500 words, 2 headers, 1 image, 1 code block, single paragraph
        // block layout kept flat so each contribution is predictable
        let content = format!(
            "# One\n# Two\n![img](url) ```\ncode\n``` {}",
            words(500)
        );
        // words >= 250 -> 25; paragraphs 1 -> 2; headers 2 -> 6;
        // image 1 -> 2; code block 1 -> 2
        assert_eq!(quality_score(&content), 37.0);
    }

    #[test]
    fn test_reading_level_buckets() {
        assert_eq!(reading_level(""), ReadingLevel::Unknown);
        // short monosyllabic sentences score very easy
        assert_eq!(reading_level("The cat sat. The dog ran. It was fun."), ReadingLevel::VeryEasy);
    }

    #[test]
    fn test_reading_level_polysyllabic_is_harder() {
        let simple = reading_level("The cat sat on the mat. It was warm.");
        let dense = reading_level(
            "Institutional heterogeneity necessitates comprehensive organizational reconfiguration initiatives.",
        );
        assert!(dense > simple);
    }

    #[test]
    fn test_format_view_count() {
        assert_eq!(format_view_count(999), "999");
        assert_eq!(format_view_count(1000), "1.0K");
        assert_eq!(format_view_count(1500), "1.5K");
        assert_eq!(format_view_count(1_500_000), "1.5M");
    }

    #[test]
    fn test_content_structure_counts() {
        let content = "# Title\n\nFirst paragraph with words.\n\n- one\n- two\n\n![img](url)";
        let structure = content_structure(content);
        assert_eq!(structure.header_count, 1);
        assert_eq!(structure.paragraph_count, 4);
        assert_eq!(structure.image_count, 1);
        assert_eq!(structure.list_item_count, 2);
    }
}
