use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ArticleListError {
    #[error("article index {index} is out of range for a list of {len}")]
    IndexOutOfRange { index: usize, len: usize },
}
