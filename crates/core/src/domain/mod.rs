pub mod comments;
pub mod emotion;
pub mod text;
