#![forbid(unsafe_code)]

pub mod cli;
pub mod crawl;
pub mod extract;
pub mod formats;
pub mod logging;
pub mod store;
