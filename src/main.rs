use std::sync::Arc;

use anyhow::{anyhow, Result};
use clap::{Parser, Subcommand};
use futures::stream::{self, StreamExt};
use tracing::{info, warn};

use spacetraveling::client::{ContentSource, PrismicClient};
use spacetraveling::config::{Config, Overrides};
use spacetraveling::models::PostSummary;
use spacetraveling::paginator::{LoadOutcome, Paginator};
use spacetraveling::reading_time::estimate_reading_minutes;
use spacetraveling::render::{format_publication_date, render_post};
use spacetraveling::viewer;

/// Posts whose reading time is fetched at the same time in `list`
const CONCURRENT_POST_FETCHES: usize = 4;

#[derive(Parser)]
#[command(name = "spacetraveling")]
#[command(about = "Read the spacetraveling blog from your terminal", long_about = None)]
struct Cli {
    /// Prismic API endpoint, overrides SPACETRAVELING_API_ENDPOINT
    #[arg(long, global = true)]
    endpoint: Option<String>,
    #[arg(long, global = true)]
    page_size: Option<u32>,
    /// Reading speed used for the reading-time estimate
    #[arg(long, global = true)]
    wpm: Option<f64>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List posts, loading more pages on request
    List {
        #[arg(short, long, default_value_t = 0)]
        pages: usize,
        #[arg(short, long)]
        reading_time: bool,
    },
    /// Print the path of every post
    Paths,
    Post {
        #[arg(short, long)]
        uid: String,
    },
    View {
        #[arg(short, long)]
        uid: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt().with_writer(std::io::stderr).init();

    let cli = Cli::parse();
    let config = Config::from_env(Overrides {
        api_endpoint: cli.endpoint,
        page_size: cli.page_size,
        words_per_minute: cli.wpm,
    })?;
    let client = Arc::new(PrismicClient::new(&config)?);

    match cli.command {
        Commands::List { pages, reading_time } => {
            let paginator = Paginator::start(client.clone(), config.page_size).await?;

            for _ in 0..pages {
                match paginator.load_more().await? {
                    LoadOutcome::Appended { added } => info!(added, "loaded more posts"),
                    _ => break,
                }
            }

            let state = paginator.snapshot();
            let minutes = if reading_time {
                reading_times(client.as_ref(), state.items(), config.words_per_minute).await
            } else {
                vec![None; state.len()]
            };

            for (post, minutes) in state.items().iter().zip(minutes) {
                print_summary(post, reading_time.then_some(minutes));
            }

            if state.has_more() {
                println!("More posts available, pass --pages to load them.");
            }
        }
        Commands::Paths => {
            let paginator = Paginator::start(client.clone(), config.page_size).await?;
            let pages = paginator.load_all().await?;
            info!(pages = pages + 1, "listing exhausted");

            for post in paginator.snapshot().items() {
                match &post.uid {
                    Some(uid) => println!("/post/{}", uid),
                    None => warn!(title = %post.title, "post without uid has no path"),
                }
            }
        }
        Commands::Post { uid } => {
            let post = client
                .post_by_uid(&uid)
                .await?
                .ok_or_else(|| anyhow!("Post not found: {}", uid))?;
            let minutes = estimate_reading_minutes(&post.content, config.words_per_minute)?;

            if let Some(banner) = viewer::banner_line(&post) {
                println!("{}\n", banner);
            }
            println!("{}", post.title);
            println!("{}", viewer::byline(&post, minutes));
            println!();
            if !post.subtitle.is_empty() {
                println!("{}\n", textwrap::fill(&post.subtitle, 80));
            }
            println!("{}", render_post(&post).to_plain_text(80));
        }
        Commands::View { uid } => {
            let post = client
                .post_by_uid(&uid)
                .await?
                .ok_or_else(|| {
                    anyhow!("Post not found: {}. Try 'spacetraveling paths' to list posts.", uid)
                })?;
            let minutes = estimate_reading_minutes(&post.content, config.words_per_minute)?;
            viewer::run_viewer(&post, minutes)?;
        }
    }

    Ok(())
}

/// Fetches every listed post and estimates its reading time
/// A post that fails to load gets `None` instead of failing the listing.
async fn reading_times<S: ContentSource>(
    source: &S,
    posts: &[PostSummary],
    words_per_minute: f64,
) -> Vec<Option<u32>> {
    stream::iter(posts)
        .map(|summary| async move {
            let Some(uid) = summary.uid.as_deref() else {
                return None;
            };
            match source.post_by_uid(uid).await {
                Ok(Some(post)) => estimate_reading_minutes(&post.content, words_per_minute).ok(),
                Ok(None) => {
                    warn!(uid, "listed post not found");
                    None
                }
                Err(e) => {
                    warn!(uid, error = %e, "failed to fetch post");
                    None
                }
            }
        })
        .buffered(CONCURRENT_POST_FETCHES)
        .collect()
        .await
}

fn print_summary(post: &PostSummary, minutes: Option<Option<u32>>) {
    println!("{}", post.title);
    if !post.subtitle.is_empty() {
        println!("{}", textwrap::indent(&textwrap::fill(&post.subtitle, 76), "    "));
    }

    let mut meta = vec![match post.first_publication_date {
        Some(date) => format_publication_date(date),
        None => "unpublished".to_string(),
    }];
    if !post.author.is_empty() {
        meta.push(post.author.clone());
    }
    match minutes {
        Some(Some(m)) => meta.push(format!("{} min", m)),
        Some(None) => meta.push("? min".to_string()),
        None => {}
    }
    println!("    {}", meta.join(" · "));
    println!();
}
