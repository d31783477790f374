//! Threat-intelligence feed curation.
//!
//! Pulls security-research blog feeds, tags entries against a keyword
//! vocabulary, filters them by search query and tag, and exports a user's
//! selection to CSV. The pipeline runs one way:
//!
//! [`feed`] registry and fetcher → [`tagging`] → [`filter`] → presentation
//! (the caller) → [`session`] selection → [`export`].
//!
//! [`curator::Curator`] wires the stages together from a [`config::Config`].

pub mod config;
pub mod curator;
pub mod export;
pub mod feed;
pub mod filter;
pub mod session;
pub mod tagging;
pub mod util;

pub use curator::{Curator, CuratorError, SourceView, TabStat};
pub use export::{ExportBuilder, ExportError, SelectedEntry};
pub use filter::Filter;
pub use session::{SessionError, SessionId, SessionStore};
pub use tagging::{TagExtractor, TaggedEntry};
