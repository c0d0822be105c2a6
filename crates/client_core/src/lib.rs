//! Client-side composition layer for the Conduit article API: repository
//! calls wired into an observable article list state.

pub mod article_list;
pub mod error;
pub mod repository;
pub mod session;

pub use article_list::{ArticleListController, ArticleListEvent, ArticleListState};
pub use error::ArticleListError;
pub use repository::{ArticleRepository, HttpArticleRepository};
pub use session::{Navigator, Session, LOGIN_PATH};
