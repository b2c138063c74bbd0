//! The content domain: articles, courses, comments, newsletter.

pub mod service;
pub mod slots;
pub mod types;

pub use service::{
  ContentService, SubscribeOutcome, LATEST_COUNT, PAGE_SIZE, POPULAR_COUNT, RELATED_COUNT,
};
pub use slots::ContentSlots;
pub use types::{Article, Comment, CourseSummary, CATEGORIES};
