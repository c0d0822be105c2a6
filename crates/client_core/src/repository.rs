use std::sync::Arc;

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use reqwest::{header::AUTHORIZATION, Client, RequestBuilder};
use serde::de::DeserializeOwned;
use shared::{
    domain::Slug,
    error::ApiException,
    protocol::{ArticleListRequest, MultipleArticlesResponse, SingleArticleResponse},
};
use tracing::{debug, warn};
use url::Url;

use crate::session::Session;

/// Article endpoints the list controller consumes.
#[async_trait]
pub trait ArticleRepository: Send + Sync {
    async fn get_article_list(&self, filter: &ArticleListRequest)
        -> Result<MultipleArticlesResponse>;
    async fn get_feed_article_list(&self) -> Result<MultipleArticlesResponse>;
    async fn favorite_article(&self, slug: &Slug) -> Result<SingleArticleResponse>;
    async fn un_favorite_article(&self, slug: &Slug) -> Result<SingleArticleResponse>;
}

/// RealWorld REST adapter. Requests carry `Authorization: Token ..` while
/// the session holds a token.
pub struct HttpArticleRepository {
    http: Client,
    base_url: Url,
    session: Arc<Session>,
}

impl HttpArticleRepository {
    pub fn new(base_url: Url, session: Arc<Session>) -> Self {
        Self::with_client(Client::new(), base_url, session)
    }

    pub fn with_client(http: Client, base_url: Url, session: Arc<Session>) -> Self {
        Self {
            http,
            base_url,
            session,
        }
    }

    fn endpoint(&self, segments: &[&str]) -> Result<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| anyhow!("api url cannot be a base: {}", self.base_url))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    async fn send<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T> {
        let request = match self.session.token().await {
            Some(token) => request.header(AUTHORIZATION, format!("Token {token}")),
            None => request,
        };
        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = match response.text().await {
                Ok(body) => body,
                Err(error) => {
                    warn!(%status, %error, "api: failed to read error response body");
                    String::new()
                }
            };
            return Err(ApiException::from_body(status.as_u16(), &body).into());
        }
        Ok(response.json().await?)
    }
}

#[async_trait]
impl ArticleRepository for HttpArticleRepository {
    async fn get_article_list(
        &self,
        filter: &ArticleListRequest,
    ) -> Result<MultipleArticlesResponse> {
        let url = self.endpoint(&["articles"])?;
        debug!(%url, ?filter, "api: fetching article list");
        self.send(self.http.get(url).query(filter)).await
    }

    async fn get_feed_article_list(&self) -> Result<MultipleArticlesResponse> {
        let url = self.endpoint(&["articles", "feed"])?;
        debug!(%url, "api: fetching feed article list");
        self.send(self.http.get(url)).await
    }

    async fn favorite_article(&self, slug: &Slug) -> Result<SingleArticleResponse> {
        let url = self.endpoint(&["articles", slug.as_str(), "favorite"])?;
        debug!(%url, "api: favoriting article");
        self.send(self.http.post(url)).await
    }

    async fn un_favorite_article(&self, slug: &Slug) -> Result<SingleArticleResponse> {
        let url = self.endpoint(&["articles", slug.as_str(), "favorite"])?;
        debug!(%url, "api: unfavoriting article");
        self.send(self.http.delete(url)).await
    }
}

#[cfg(test)]
#[path = "tests/repository_tests.rs"]
mod tests;
