//! Output module for crawl reports
//!
//! Reports print in a short "Matches in ..." layout and can be exported as
//! JSON for further processing.

mod report;

pub use report::{write_json_reports, CrawlReport};
