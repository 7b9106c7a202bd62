pub mod comment_harvest;
