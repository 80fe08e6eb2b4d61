//! State module for tracking crawl progress
//!
//! `CrawlState` holds everything a single crawl mutates: visited pages,
//! limit counters, accumulated matches and the stop flag.

mod crawl_state;

pub use crawl_state::CrawlState;
