//! # sift-retrieval
//!
//! Turns raw search results into the ranked, diversified evidence set used
//! by the rest of the pipeline.
//!
//! - `dedupe_and_score` drops duplicate results and scores each by domain
//!   trust and recency.
//! - `diversify` caps results per registrable domain and backfills
//!   foreign-language sources.
//! - `authority` and `recency` expose the tables and date steps the
//!   credibility engine reuses.

pub mod authority;
pub mod diversifier;
pub mod domain;
pub mod recency;

pub use authority::{authority_score, domain_trust_bonus};
pub use diversifier::{dedupe_and_score, diversify, is_foreign};
pub use domain::{contains_cjk, host_of, registrable_domain, top_level_domain};
pub use recency::{age_in_days, parse_published, recency_bonus, time_score};
