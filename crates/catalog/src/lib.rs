//! `orderdesk-catalog` — inventory articles.
//!
//! Articles are priced stock items referenced by orders. They are never
//! physically removed: deletion flips a soft-delete flag so historical order
//! references stay resolvable.

pub mod article;
pub mod patch;

pub use article::{Article, ArticleId, ArticlePatch, NewArticle};
pub use patch::Patch;
