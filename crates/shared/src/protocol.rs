use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::domain::{Article, PostType, Tag, Username};

/// Filter for the article list endpoint. Unset keys are not sent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArticleListRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tag: Option<Tag>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<Username>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub favorited: Option<Username>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub limit: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub offset: Option<u32>,
}

impl ArticleListRequest {
    pub fn by_tag(tag: impl Into<Tag>) -> Self {
        Self {
            tag: Some(tag.into()),
            ..Self::default()
        }
    }

    /// Filter whose single key is `post_type.filter_key()` mapped to `user_name`.
    pub fn by_post(post_type: PostType, user_name: impl Into<Username>) -> Self {
        let user_name = Some(user_name.into());
        match post_type {
            PostType::Author => Self {
                author: user_name,
                ..Self::default()
            },
            PostType::Favorited => Self {
                favorited: user_name,
                ..Self::default()
            },
        }
    }

    pub fn with_page(mut self, limit: u32, offset: u32) -> Self {
        self.limit = Some(limit);
        self.offset = Some(offset);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MultipleArticlesResponse {
    pub articles: Vec<Article>,
    pub articles_count: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SingleArticleResponse {
    pub article: Article,
}

/// Body of a RealWorld validation failure: `{"errors": {"body": ["can't be empty"]}}`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ErrorResponse {
    #[serde(default)]
    pub errors: BTreeMap<String, Vec<String>>,
}

impl ErrorResponse {
    pub fn summary(&self) -> String {
        self.errors
            .iter()
            .map(|(field, reasons)| format!("{field} {}", reasons.join(", ")))
            .collect::<Vec<_>>()
            .join("; ")
    }
}
