//! Command-line interface for inkpress.
//!
//! A thin stand-in for the platform's controller layer: each command
//! opens the JSON-backed store, runs one engine operation, and persists
//! the snapshot on the way out.

use std::io::{self, Read};
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use uuid::Uuid;

use crate::batch::{BatchService, Digest, NotificationSink};
use crate::config;
use crate::discovery::{DiscoveryService, FeedOptions, SearchQuery};
use crate::domain::{Article, ArticleInput, DigestFrequency, Page, UserProfile};
use crate::engagement::EngagementService;
use crate::publishing::ArticleService;
use crate::store::{ArticleStore, IdentityStore, MemoryStore};
use crate::tags::TagService;

/// inkpress - content lifecycle and discovery engine
#[derive(Parser, Debug)]
#[command(name = "inkpress")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Register a user
    Register {
        username: String,
        email: String,

        /// Digest preference
        #[arg(long, value_enum, default_value = "immediate")]
        digest: DigestArg,
    },

    /// Follow another user
    Follow {
        /// Who follows (username)
        follower: String,

        /// Who is being followed (username)
        followee: String,
    },

    /// Create an article
    Compose {
        /// Author identity (email or username)
        author: String,

        title: String,

        /// Markdown file with the body (reads from stdin if not provided)
        #[arg(short, long)]
        content: Option<PathBuf>,

        #[arg(short, long)]
        summary: Option<String>,

        /// Comma-separated tags
        #[arg(short, long)]
        tags: Option<String>,

        /// Cover image URL
        #[arg(long)]
        cover: Option<String>,

        /// Publish immediately
        #[arg(short, long)]
        publish: bool,
    },

    /// Read a published article by slug (counts a view)
    Read { slug: String },

    /// Publish an article
    Publish { author: String, slug: String },

    /// Unpublish an article
    Unpublish { author: String, slug: String },

    /// List an article's version history
    Versions { slug: String },

    /// Restore an article to a previous version
    Restore {
        author: String,
        slug: String,
        version: u32,
    },

    /// Record an engagement (view/like/bookmark/share/clap)
    Engage {
        /// Engaging user (email or username)
        user: String,
        slug: String,
        kind: String,
    },

    /// Show derived stats for an article
    Stats { slug: String },

    /// Show trending articles
    Trending {
        #[arg(short, long, default_value = "10")]
        limit: usize,
    },

    /// Keyword search over published articles
    Search {
        query: String,

        #[arg(short, long, default_value = "10")]
        limit: usize,
    },

    /// Show a personalized feed
    Feed {
        /// Reader identity (email or username)
        user: String,

        #[arg(short, long, default_value = "10")]
        limit: usize,
    },

    /// Show trending tags
    Tags {
        #[arg(short, long, default_value = "10")]
        limit: usize,
    },

    /// Autocomplete tags by prefix
    CompleteTag { prefix: String },

    /// Build and deliver digests for all users (logged delivery)
    Digests,

    /// Generate recommendations for all users (logged delivery)
    Recommend {
        #[arg(short, long, default_value = "3")]
        limit: usize,
    },

    /// Show resolved configuration (debug)
    Config,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum DigestArg {
    Immediate,
    Daily,
    Weekly,
}

impl From<DigestArg> for DigestFrequency {
    fn from(arg: DigestArg) -> Self {
        match arg {
            DigestArg::Immediate => DigestFrequency::Immediate,
            DigestArg::Daily => DigestFrequency::Daily,
            DigestArg::Weekly => DigestFrequency::Weekly,
        }
    }
}

/// All engine services wired over the snapshot-backed store
struct Engine {
    store: Arc<MemoryStore>,
    articles: ArticleService,
    discovery: DiscoveryService,
    engagement: EngagementService,
    tags: TagService,
    batch: BatchService,
}

impl Engine {
    async fn open() -> Result<Self> {
        let path = config::snapshot_path()?;
        let store = Arc::new(
            MemoryStore::open(&path)
                .await
                .with_context(|| format!("Failed to open store: {}", path.display()))?,
        );

        Ok(Self {
            articles: ArticleService::new(
                store.clone(),
                store.clone(),
                store.clone(),
                store.clone(),
            ),
            discovery: DiscoveryService::new(store.clone(), store.clone(), store.clone()),
            engagement: EngagementService::new(store.clone(), store.clone(), store.clone()),
            tags: TagService::new(store.clone()),
            batch: BatchService::new(store.clone(), store.clone()),
            store,
        })
    }

    async fn persist(&self) -> Result<()> {
        self.store.persist().await.context("Failed to persist store")
    }

    /// Look up an article in any state by slug, for author operations
    async fn article_by_slug(&self, slug: &str) -> Result<Article> {
        self.store
            .find_by_slug(slug)
            .await?
            .with_context(|| format!("No article with slug '{}'", slug))
    }
}

/// Sink that logs batch deliveries to stdout
struct LogSink;

#[async_trait::async_trait]
impl NotificationSink for LogSink {
    async fn recommendations(&self, user: &UserProfile, article_ids: &[Uuid]) -> crate::Result<()> {
        println!("{}: {} recommended article(s)", user.username, article_ids.len());
        Ok(())
    }

    async fn digest(&self, digest: &Digest) -> crate::Result<()> {
        println!(
            "{}: {:?} digest with {} article(s)",
            digest.username,
            digest.frequency,
            digest.articles.len()
        );
        Ok(())
    }
}

fn read_content(path: Option<PathBuf>) -> Result<String> {
    match path {
        Some(path) => std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read content file: {}", path.display())),
        None => {
            let mut buffer = String::new();
            io::stdin()
                .read_to_string(&mut buffer)
                .context("Failed to read content from stdin")?;
            Ok(buffer)
        }
    }
}

fn print_article_line(article: &Article) {
    let status = if article.published { "published" } else { "draft" };
    println!(
        "  {}  [{}]  {} min read, {} views  ({})",
        article.slug, status, article.read_time_minutes, article.view_count, article.id
    );
}

fn print_page(page: &Page<Article>) {
    for article in &page.items {
        print_article_line(article);
    }
    println!("  ({} of {} total)", page.items.len(), page.total);
}

impl Cli {
    pub async fn execute(self) -> Result<()> {
        let engine = Engine::open().await?;

        match self.command {
            Commands::Register {
                username,
                email,
                digest,
            } => {
                let profile =
                    UserProfile::new(&username, &email).with_digest_frequency(digest.into());
                engine.store.register(profile).await?;
                println!("Registered {}", username);
            }

            Commands::Follow { follower, followee } => {
                let follower_profile = engine
                    .store
                    .find_by_username(&follower)
                    .await?
                    .with_context(|| format!("No user '{}'", follower))?;
                let followee_profile = engine
                    .store
                    .find_by_username(&followee)
                    .await?
                    .with_context(|| format!("No user '{}'", followee))?;

                engine
                    .store
                    .follow(follower_profile.id, followee_profile.id)
                    .await?;
                println!("{} now follows {}", follower, followee);
            }

            Commands::Compose {
                author,
                title,
                content,
                summary,
                tags,
                cover,
                publish,
            } => {
                let body = read_content(content)?;
                let mut input = ArticleInput::new(title, body).published(publish);
                if let Some(summary) = summary {
                    input = input.with_summary(summary);
                }
                if let Some(tags) = tags {
                    input = input.with_tags(tags.split(',').map(str::trim));
                }
                if let Some(cover) = cover {
                    input = input.with_cover_image(cover);
                }

                let article = engine.articles.create_article(&author, input).await?;
                println!("Created article '{}' as {}", article.title, article.slug);
            }

            Commands::Read { slug } => {
                let article = engine.articles.get_by_slug(&slug).await?;
                println!("# {}\n", article.title);
                println!("{}\n", article.content);
                println!(
                    "-- {} min read, {} views",
                    article.read_time_minutes, article.view_count
                );
            }

            Commands::Publish { author, slug } => {
                let article = engine.article_by_slug(&slug).await?;
                engine.articles.publish_article(&author, article.id).await?;
                println!("Published {}", slug);
            }

            Commands::Unpublish { author, slug } => {
                let article = engine.article_by_slug(&slug).await?;
                engine.articles.unpublish_article(&author, article.id).await?;
                println!("Unpublished {}", slug);
            }

            Commands::Versions { slug } => {
                let article = engine.article_by_slug(&slug).await?;
                let versions = engine.articles.list_versions(article.id).await?;
                for version in versions {
                    println!(
                        "  v{}  {}  {} ({})",
                        version.version_number,
                        version.created_at.format("%Y-%m-%d %H:%M"),
                        version.change_description,
                        version.editor_email
                    );
                }
            }

            Commands::Restore {
                author,
                slug,
                version,
            } => {
                let article = engine.article_by_slug(&slug).await?;
                engine
                    .articles
                    .restore_version(&author, article.id, version)
                    .await?;
                println!("Restored {} to version {}", slug, version);
            }

            Commands::Engage { user, slug, kind } => {
                let article = engine.article_by_slug(&slug).await?;
                engine.engagement.record_label(&user, article.id, &kind).await?;
                println!("Recorded {} on {}", kind, slug);
            }

            Commands::Stats { slug } => {
                let stats = engine.discovery.article_stats(&slug).await?;
                println!("views:         {}", stats.formatted_view_count);
                println!("read time:     {} min", stats.read_time_minutes);
                println!("total claps:   {}", stats.total_claps);
                println!("engagement:    {:.2}%", stats.engagement_rate);
                println!("quality:       {:.1}/100", stats.quality_score);
                println!("reading level: {}", stats.reading_level);
                for (kind, count) in &stats.engagement {
                    println!("  {:<9} {}", kind.as_str(), count);
                }
            }

            Commands::Trending { limit } => {
                let page = engine.discovery.trending(0, limit).await?;
                print_page(&page);
            }

            Commands::Search { query, limit } => {
                let search = SearchQuery {
                    keywords: Some(query),
                    published_only: true,
                    ..SearchQuery::default()
                };
                let page = engine.discovery.advanced_search(&search, 0, limit).await?;
                print_page(&page);
            }

            Commands::Feed { user, limit } => {
                let page = engine
                    .discovery
                    .personalized_feed(&user, &FeedOptions::default(), 0, limit)
                    .await?;
                print_page(&page);
            }

            Commands::Tags { limit } => {
                for tag in engine.tags.trending(limit).await? {
                    println!("  #{:<20} {} use(s)", tag.name, tag.usage_count);
                }
            }

            Commands::CompleteTag { prefix } => {
                for tag in engine.tags.autocomplete(&prefix).await? {
                    println!("  #{}", tag.name);
                }
            }

            Commands::Digests => {
                let report = engine.batch.run_digests_for_all(&LogSink).await?;
                println!(
                    "digests: {} processed, {} delivered, {} empty, {} failed",
                    report.processed, report.succeeded, report.skipped, report.failed
                );
            }

            Commands::Recommend { limit } => {
                let report = engine
                    .batch
                    .run_recommendations_for_all(&LogSink, limit)
                    .await?;
                println!(
                    "recommendations: {} processed, {} delivered, {} empty, {} failed",
                    report.processed, report.succeeded, report.skipped, report.failed
                );
            }

            Commands::Config => {
                let config = config::config()?;
                println!("home:   {}", config.home.display());
                match &config.config_file {
                    Some(path) => println!("config: {}", path.display()),
                    None => println!("config: (none found)"),
                }
            }
        }

        engine.persist().await
    }
}
