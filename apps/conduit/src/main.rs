use std::sync::Arc;

use anyhow::Result;
use clap::{Parser, Subcommand};
use client_core::{
    ArticleListController, ArticleListState, HttpArticleRepository, Navigator, Session,
};
use shared::{
    domain::{FeedType, PostType},
    protocol::ArticleListRequest,
};
use tracing::info;
use tracing_subscriber::EnvFilter;

mod config;

use config::{load_settings, parse_api_url};

#[derive(Parser, Debug)]
#[command(about = "Browse Conduit article lists from the terminal")]
struct Args {
    #[arg(long)]
    api_url: Option<String>,
    #[arg(long)]
    token: Option<String>,
    /// Page size for `global` and `tag`. The feed and profile listings
    /// (`feed`, `author`, `favorited`, `toggle-favorite`) use the server's
    /// default page.
    #[arg(long)]
    limit: Option<u32>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Global public feed.
    Global,
    /// Articles from followed authors (requires a token).
    Feed,
    Tag {
        tag: String,
    },
    Author {
        username: String,
    },
    Favorited {
        username: String,
    },
    /// Loads the default feed for the current login state, then toggles
    /// the favorite flag of the article at INDEX.
    ToggleFavorite {
        index: usize,
    },
}

struct TerminalNavigator;

impl Navigator for TerminalNavigator {
    fn redirect(&self, path: &str) {
        println!("sign in required: {path}");
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();
    let args = Args::parse();

    let mut settings = load_settings();
    if let Some(api_url) = args.api_url {
        settings.api_url = api_url;
    }
    if let Some(token) = args.token {
        settings.token = Some(token);
    }
    if let Some(limit) = args.limit {
        settings.page_limit = limit;
    }
    let api_url = parse_api_url(&settings.api_url)?;

    let session = Arc::new(Session::new());
    let repository = Arc::new(HttpArticleRepository::new(
        api_url.clone(),
        Arc::clone(&session),
    ));
    let controller =
        ArticleListController::new(repository, Arc::clone(&session), Arc::new(TerminalNavigator));
    let watcher = controller.spawn_login_watcher();
    if let Some(token) = settings.token {
        session.login(token).await;
    }
    info!(%api_url, logged_in = session.is_login(), "conduit: session ready");

    let page = ArticleListRequest::default().with_page(settings.page_limit, 0);
    match args.command {
        Command::Global => controller.get_article_list(page).await?,
        Command::Feed => controller.get_article_list_by_feed(FeedType::Your).await?,
        Command::Tag { tag } => {
            controller
                .get_article_list(ArticleListRequest {
                    tag: Some(tag.into()),
                    ..page
                })
                .await?
        }
        Command::Author { username } => {
            controller
                .get_article_list_by_post(username, PostType::Author)
                .await?
        }
        Command::Favorited { username } => {
            controller
                .get_article_list_by_post(username, PostType::Favorited)
                .await?
        }
        Command::ToggleFavorite { index } => {
            let feed_type = if session.is_login() {
                FeedType::Your
            } else {
                FeedType::Global
            };
            controller.get_article_list_by_feed(feed_type).await?;
            controller.fetch_toggle_favorite(index).await?;
        }
    }

    print_state(&controller.state().await);
    watcher.abort();
    Ok(())
}

fn print_state(state: &ArticleListState) {
    for (index, article) in state.article_list.iter().enumerate() {
        let marker = if article.favorited { '*' } else { ' ' };
        println!(
            "{index:>3} {marker} {} ({} favorites)",
            article.slug, article.favorites_count
        );
    }
    println!(
        "showing {} of {} articles (feed: {:?}, posts: {:?})",
        state.article_list.len(),
        state.article_count,
        state.feed_type,
        state.post_type
    );
}
