//! Data structures for the content engine.
//!
//! Read models exchanged with the identity and persistence collaborators:
//! articles and their immutable version snapshots, per-user engagement
//! rows, tag usage counters, user profiles, and paginated result sets.

pub mod article;
pub mod engagement;
pub mod page;
pub mod tag;
pub mod user;

pub use article::{Article, ArticleInput, ArticleVersion};
pub use engagement::{ArticleEngagement, EngagementType, MAX_CLAPS};
pub use page::Page;
pub use tag::Tag;
pub use user::{DigestFrequency, UserProfile};
