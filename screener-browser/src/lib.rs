//! screener-browser - Pooled headless browser sessions for page scraping.
//!
//! Each pipeline worker owns one Chromium session for the whole run. The
//! [`SessionPool`] launches sessions lazily, keeps them bound to their worker
//! and closes all of them at teardown.

#![warn(clippy::all)]
#![allow(clippy::pedantic)]

pub mod browser;
pub mod error;
pub mod extract;

pub use browser::{
    navigate_and_wait, poll_until, BrowserSession, ChromeLauncher, ManagedSession, SessionLauncher, SessionPool,
    WorkerId,
};
pub use error::BrowserError;
pub use extract::{extract_numeric_attribute, extract_numeric_cell, parse_number, select_first};
