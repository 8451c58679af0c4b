//! Domain services backed by the JSON API.

mod posts;

pub use posts::{NewPost, Post, PostService};
