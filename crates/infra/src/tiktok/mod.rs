pub mod client;
pub mod page;

pub use client::{CommentSource, FetchError, TiktokClientConfig, TiktokCommentClient};
pub use page::{parse_page, ParsedPage, PAGE_SIZE};
