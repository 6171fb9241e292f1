use clap::{Parser, Subcommand};
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;
use thiserror::Error;
use tokio_util::sync::CancellationToken;

use linkthree::model::{ComponentId, ComponentKind, PageId};
use linkthree::writer::{ComponentDraft, PageDraft};
use linkthree::{Aggregation, FjallStore, PageService, ReadConfig, Resolution, StoreError};

#[derive(Error, Debug)]
pub enum AppError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("{0}")]
    Page(#[from] linkthree::Error),

    #[error("Slug not found: {0}")]
    SlugNotFound(String),

    #[error("Page not found: {0}")]
    PageNotFound(String),

    #[error("Either --draft or --title and --author are required")]
    MissingDraft,

    #[error("Aggregation cancelled")]
    Cancelled,
}

#[derive(Parser)]
#[command(name = "linkthree")]
#[command(about = "Resolve, inspect and edit linkthree pages in a local graph store")]
struct Cli {
    /// Store path
    #[arg(long, global = true, default_value = ".linkthree", env = "LINKTHREE_PATH")]
    path: PathBuf,

    /// Ignore records in the legacy namespace
    #[arg(long, global = true)]
    current_only: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Resolve a slug to a page id
    Resolve {
        slug: String,
    },

    /// Show a page with its components
    Show {
        /// Page id, or a slug with --slug
        target: String,

        /// Treat the target as a slug
        #[arg(long)]
        slug: bool,
    },

    /// List pages, newest first
    List {
        /// Only this author's pages, most recently updated first
        #[arg(long)]
        author: Option<String>,
    },

    /// Create or update a page
    Save {
        /// JSON file holding the full editor state
        #[arg(long, conflicts_with_all = ["title", "id"])]
        draft: Option<PathBuf>,

        /// Page to update (a new page is created when absent)
        #[arg(long)]
        id: Option<String>,

        #[arg(long)]
        title: Option<String>,

        #[arg(long)]
        slug: Option<String>,

        #[arg(long)]
        author: Option<String>,

        /// Heading text, added first
        #[arg(long)]
        heading: Option<String>,

        /// Link as `title=url`; may be repeated
        #[arg(long = "link")]
        links: Vec<String>,
    },

    /// Delete a page
    Delete {
        page: String,

        #[arg(long)]
        author: String,
    },

    /// Delete one component of a page
    DeleteComponent {
        page: String,
        component: String,

        #[arg(long)]
        author: String,
    },

    /// Check whether a slug can be claimed
    CheckSlug {
        slug: String,

        /// Page being edited
        #[arg(long)]
        page: Option<String>,
    },
}

fn print_json<T: Serialize>(value: &T) -> Result<(), AppError> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Build a draft from flags; `--link` values split on the first `=`.
fn draft_from_args(
    id: Option<String>,
    title: Option<String>,
    slug: Option<String>,
    author: Option<String>,
    heading: Option<String>,
    links: Vec<String>,
) -> Result<PageDraft, AppError> {
    let (Some(title), Some(author)) = (title, author) else {
        return Err(AppError::MissingDraft);
    };

    let mut components = Vec::new();
    if let Some(heading) = heading {
        components.push(ComponentDraft::new(ComponentKind::Heading).with("content", heading));
    }
    for link in links {
        let (label, url) = link.split_once('=').unwrap_or((link.as_str(), link.as_str()));
        components.push(
            ComponentDraft::new(ComponentKind::Link)
                .with("title", label)
                .with("url", url),
        );
    }

    Ok(PageDraft {
        id: id.map(PageId::from),
        title,
        slug,
        author,
        components,
        removed: Vec::new(),
    })
}

#[tokio::main]
async fn main() -> Result<(), AppError> {
    let cli = Cli::parse();

    let config = ReadConfig {
        legacy_namespace: !cli.current_only,
        ..ReadConfig::default()
    };
    let store = FjallStore::open(&cli.path)?;
    let service = PageService::new(Arc::new(store), config);
    let cancel = CancellationToken::new();

    match cli.command {
        Commands::Resolve { slug } => match service.resolve(&slug).await {
            Resolution::NotFound => Err(AppError::SlugNotFound(slug)),
            found => print_json(&found),
        },
        Commands::Show { target, slug } => {
            let view = if slug {
                service.view_slug(&target, &cancel).await
            } else {
                service.view(&PageId::from(target.as_str()), &cancel).await
            };
            match view {
                Some(view) => print_json(&view),
                None => Err(AppError::PageNotFound(target)),
            }
        }
        Commands::List { author } => {
            let index = match service.index(&cancel).await {
                Aggregation::Committed { value, .. } => value,
                Aggregation::Cancelled => return Err(AppError::Cancelled),
            };
            match author {
                Some(author) => print_json(&index.by_author(&author)),
                None => print_json(&index),
            }
        }
        Commands::Save {
            draft,
            id,
            title,
            slug,
            author,
            heading,
            links,
        } => {
            let draft = match draft {
                Some(path) => serde_json::from_slice(&std::fs::read(&path)?)?,
                None => draft_from_args(id, title, slug, author, heading, links)?,
            };
            let report = service.save(draft).await?;
            if !report.failed.is_empty() {
                eprintln!(
                    "warning: {} write(s) were not acknowledged; save again to retry",
                    report.failed.len()
                );
            }
            print_json(&report)
        }
        Commands::Delete { page, author } => {
            let report = service.delete_page(&PageId::from(page), &author).await?;
            print_json(&report)
        }
        Commands::DeleteComponent {
            page,
            component,
            author,
        } => {
            let report = service
                .delete_component(&PageId::from(page), &ComponentId::from(component), &author)
                .await?;
            print_json(&report)
        }
        Commands::CheckSlug { slug, page } => {
            let current = page.map(PageId::from);
            print_json(&service.check_slug(&slug, current.as_ref()).await)
        }
    }
}
