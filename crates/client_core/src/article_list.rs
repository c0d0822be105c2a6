//! Article list controller: one shared list slice fed by the global feed,
//! the personal feed, tag filters and author/favorited filters.
//!
//! The list and its total count are always replaced together. `feed_type`
//! and `post_type` are only updated after the fetch they belong to has
//! settled, so readers keep seeing the previous mode while a request is in
//! flight. Concurrent loads are not coordinated: whichever response settles
//! last overwrites the slice.

use std::sync::Arc;

use anyhow::Result;
use shared::{
    domain::{Article, FeedType, PostType, Tag, Username},
    protocol::{ArticleListRequest, MultipleArticlesResponse},
};
use tokio::{
    sync::{broadcast, RwLock},
    task::JoinHandle,
};
use tracing::{debug, info, warn};

use crate::{
    error::ArticleListError,
    repository::ArticleRepository,
    session::{Navigator, Session, LOGIN_PATH},
};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ArticleListState {
    pub article_list: Vec<Article>,
    pub article_count: u64,
    pub feed_type: FeedType,
    pub post_type: PostType,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArticleListEvent {
    ListReplaced { articles_count: u64, len: usize },
    ArticleUpdated { index: usize, article: Article },
    FeedTypeChanged(FeedType),
    PostTypeChanged(PostType),
}

pub struct ArticleListController {
    repository: Arc<dyn ArticleRepository>,
    session: Arc<Session>,
    navigator: Arc<dyn Navigator>,
    state: RwLock<ArticleListState>,
    events: broadcast::Sender<ArticleListEvent>,
}

impl ArticleListController {
    pub fn new(
        repository: Arc<dyn ArticleRepository>,
        session: Arc<Session>,
        navigator: Arc<dyn Navigator>,
    ) -> Arc<Self> {
        let (events, _) = broadcast::channel(256);
        Arc::new(Self {
            repository,
            session,
            navigator,
            state: RwLock::new(ArticleListState::default()),
            events,
        })
    }

    /// Consistent snapshot of the current slice.
    pub async fn state(&self) -> ArticleListState {
        self.state.read().await.clone()
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ArticleListEvent> {
        self.events.subscribe()
    }

    pub async fn set_feed_type(&self, feed_type: FeedType) {
        self.state.write().await.feed_type = feed_type;
        let _ = self.events.send(ArticleListEvent::FeedTypeChanged(feed_type));
    }

    pub async fn set_post_type(&self, post_type: PostType) {
        self.state.write().await.post_type = post_type;
        let _ = self.events.send(ArticleListEvent::PostTypeChanged(post_type));
    }

    pub async fn get_article_list(&self, filter: ArticleListRequest) -> Result<()> {
        let response = self.repository.get_article_list(&filter).await?;
        self.replace_list(response).await;
        Ok(())
    }

    pub async fn get_feed_article_list(&self) -> Result<()> {
        let response = self.repository.get_feed_article_list().await?;
        self.replace_list(response).await;
        Ok(())
    }

    pub async fn get_article_list_by_tag(&self, tag: impl Into<Tag>) -> Result<()> {
        self.get_article_list(ArticleListRequest::by_tag(tag)).await
    }

    pub async fn get_article_list_by_feed(&self, feed_type: FeedType) -> Result<()> {
        match feed_type {
            FeedType::Global => self.get_article_list(ArticleListRequest::default()).await?,
            FeedType::Your => self.get_feed_article_list().await?,
        }
        self.set_feed_type(feed_type).await;
        Ok(())
    }

    pub async fn get_article_list_by_post(
        &self,
        user_name: impl Into<Username>,
        post_type: PostType,
    ) -> Result<()> {
        self.get_article_list(ArticleListRequest::by_post(post_type, user_name))
            .await?;
        self.set_post_type(post_type).await;
        Ok(())
    }

    /// Favorites or unfavorites the entry at `article_index`, whichever is
    /// the inverse of its current flag. Anonymous callers are redirected to
    /// the login page instead.
    pub async fn fetch_toggle_favorite(&self, article_index: usize) -> Result<()> {
        if !self.session.is_login() {
            warn!(article_index, "articles: favorite toggle requires login");
            self.navigator.redirect(LOGIN_PATH);
            return Ok(());
        }

        let (slug, favorited) = {
            let guard = self.state.read().await;
            let len = guard.article_list.len();
            let Some(selected) = guard.article_list.get(article_index) else {
                warn!(article_index, len, "articles: favorite toggle index out of range");
                return Err(ArticleListError::IndexOutOfRange {
                    index: article_index,
                    len,
                }
                .into());
            };
            (selected.slug.clone(), selected.favorited)
        };

        let response = if favorited {
            self.repository.un_favorite_article(&slug).await?
        } else {
            self.repository.favorite_article(&slug).await?
        };

        let article = response.article;
        {
            let mut guard = self.state.write().await;
            let Some(slot) = guard.article_list.get_mut(article_index) else {
                // The list shrank while the request was in flight.
                warn!(%slug, article_index, "articles: toggled entry no longer in list");
                return Ok(());
            };
            *slot = article.clone();
        }
        info!(
            %slug,
            favorited = article.favorited,
            favorites_count = article.favorites_count,
            "articles: favorite toggled"
        );
        let _ = self.events.send(ArticleListEvent::ArticleUpdated {
            index: article_index,
            article,
        });
        Ok(())
    }

    /// Default feed follows the auth status: logging in switches to the
    /// personal feed, logging out back to the global one. Nothing is fetched.
    pub async fn on_login_changed(&self, previous: bool, current: bool) {
        match (previous, current) {
            (false, true) => {
                debug!("articles: login detected, switching to personal feed");
                self.set_feed_type(FeedType::Your).await;
            }
            (true, false) => {
                debug!("articles: logout detected, switching to global feed");
                self.set_feed_type(FeedType::Global).await;
            }
            _ => {}
        }
    }

    /// Follows the session's login flag. Stops once the controller is
    /// dropped or the session goes away.
    pub fn spawn_login_watcher(self: &Arc<Self>) -> JoinHandle<()> {
        let mut login = self.session.subscribe();
        let controller = Arc::downgrade(self);
        tokio::spawn(async move {
            let mut previous = *login.borrow_and_update();
            while login.changed().await.is_ok() {
                let current = *login.borrow_and_update();
                let Some(controller) = controller.upgrade() else {
                    break;
                };
                controller.on_login_changed(previous, current).await;
                previous = current;
            }
        })
    }

    async fn replace_list(&self, response: MultipleArticlesResponse) {
        let MultipleArticlesResponse {
            articles,
            articles_count,
        } = response;
        let len = articles.len();
        {
            let mut guard = self.state.write().await;
            guard.article_list = articles;
            guard.article_count = articles_count;
        }
        info!(articles_count, len, "articles: list replaced");
        let _ = self
            .events
            .send(ArticleListEvent::ListReplaced { articles_count, len });
    }
}

#[cfg(test)]
#[path = "tests/article_list_tests.rs"]
mod tests;
