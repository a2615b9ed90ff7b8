//! Pure text analysis over raw article markup.
//!
//! Slug derivation and the content heuristics (read time, summaries,
//! hashtag extraction, quality and readability scoring). Everything here
//! is a deterministic function of its input; no component state.

pub mod analysis;
pub mod slug;

pub use analysis::{
    content_structure, extract_summary, extract_tags, format_view_count, quality_score,
    read_time, read_time_for_type, reading_level, word_count, ContentStructure, ReadingLevel,
};
pub use slug::{generate_slug, resolve_unique};
