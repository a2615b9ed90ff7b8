//! inkpress - content lifecycle and discovery engine
//!
//! The algorithmic core behind a publishing platform: it turns raw
//! author input into versioned, scored, rankable content and serves
//! personalized and trending views back to readers.
//!
//! # Architecture
//!
//! The engine is a request-scoped, stateless library:
//! - Authoring operations flow slug derivation → content analysis →
//!   version snapshot → tag usage tracking
//! - Read operations flow through the feed composer, which merges
//!   candidate sets from persistence and the engagement ledger
//! - Identity and persistence are collaborator seams (`store` traits);
//!   `MemoryStore` is the in-crate reference implementation
//!
//! # Modules
//!
//! - `content`: pure text analysis (slugs, read time, scoring)
//! - `publishing`: authoring lifecycle, drafts, version history
//! - `engagement`: per-user engagement rows with the clap cap
//! - `discovery`: trending, search, and personalized feed composition
//! - `tags`: usage counters behind autocomplete and trending tags
//! - `batch`: per-user loops for recommendations and digests
//! - `store`: collaborator traits and the reference store
//! - `cli`: command-line interface
//!
//! # Usage
//!
//! ```bash
//! # Register an author and publish an article
//! inkpress register ada ada@example.com
//! echo "Body text" | inkpress compose ada "Hello World" --publish
//!
//! # Read it back and see what is trending
//! inkpress read hello-world
//! inkpress trending
//! ```

pub mod batch;
pub mod cli;
pub mod config;
pub mod content;
pub mod discovery;
pub mod domain;
pub mod engagement;
pub mod error;
pub mod publishing;
pub mod store;
pub mod tags;

// Re-export main types at crate root for convenience
pub use batch::{BatchReport, BatchService, Digest, NotificationSink};
pub use discovery::{ArticleStats, DiscoveryService, FeedOptions, SearchQuery};
pub use domain::{
    Article, ArticleEngagement, ArticleInput, ArticleVersion, DigestFrequency, EngagementType,
    Page, Tag, UserProfile, MAX_CLAPS,
};
pub use engagement::EngagementService;
pub use error::{Error, Result};
pub use publishing::ArticleService;
pub use store::{
    ArticleStore, EngagementStore, IdentityStore, MemoryStore, SearchFilter, SortField, SortOrder,
    TagStore, VersionStore,
};
pub use tags::TagService;
