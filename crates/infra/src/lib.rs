pub mod inference;
pub mod storage;
pub mod tiktok;
