//! Static domain authority tables.
//!
//! Two tables share one lookup rule: exact host first, then registrable
//! domain, then top-level domain. The first match wins.
//!
//! - `TRUST_BONUS` is added to a search result's base score by the diversifier.
//! - `AUTHORITY` is the `[0, 1]` authority used by the credibility engine.

use crate::domain::{registrable_domain, top_level_domain};

pub type AuthorityTable = &'static [(&'static str, f64)];

pub const TRUST_BONUS: AuthorityTable = &[
    // wire services and public broadcasters
    ("reuters.com", 0.20),
    ("apnews.com", 0.20),
    ("bbc.com", 0.15),
    ("bbc.co.uk", 0.15),
    ("npr.org", 0.12),
    ("xinhuanet.com", 0.10),
    ("people.com.cn", 0.10),
    // journals and preprints
    ("nature.com", 0.20),
    ("science.org", 0.20),
    ("thelancet.com", 0.20),
    ("nejm.org", 0.20),
    ("arxiv.org", 0.15),
    ("ieee.org", 0.15),
    ("acm.org", 0.15),
    // reference
    ("en.wikipedia.org", 0.10),
    ("wikipedia.org", 0.08),
    ("github.com", 0.05),
    // institutional TLDs
    ("gov", 0.20),
    ("edu", 0.15),
    ("int", 0.15),
    ("gov.cn", 0.20),
    ("edu.cn", 0.15),
];

pub const AUTHORITY: AuthorityTable = &[
    ("nature.com", 0.95),
    ("science.org", 0.95),
    ("thelancet.com", 0.95),
    ("nejm.org", 0.95),
    ("who.int", 0.95),
    ("nih.gov", 0.95),
    ("cdc.gov", 0.95),
    ("reuters.com", 0.90),
    ("apnews.com", 0.90),
    ("bbc.com", 0.85),
    ("bbc.co.uk", 0.85),
    ("nytimes.com", 0.85),
    ("ft.com", 0.85),
    ("economist.com", 0.85),
    ("ieee.org", 0.85),
    ("acm.org", 0.85),
    ("arxiv.org", 0.80),
    ("npr.org", 0.80),
    ("xinhuanet.com", 0.75),
    ("en.wikipedia.org", 0.75),
    ("wikipedia.org", 0.70),
    ("github.com", 0.65),
    ("medium.com", 0.45),
    ("reddit.com", 0.40),
    ("quora.com", 0.35),
    ("gov", 0.90),
    ("int", 0.85),
    ("edu", 0.85),
    ("gov.cn", 0.90),
    ("edu.cn", 0.85),
    ("org", 0.60),
];

/// Look `host` up in `table`: exact host, registrable domain, then TLD.
pub fn lookup(table: AuthorityTable, host: &str) -> Option<f64> {
    let find = |key: &str| table.iter().find(|(k, _)| *k == key).map(|(_, v)| *v);

    let registrable = registrable_domain(host);
    find(host)
        .or_else(|| find(&registrable))
        .or_else(|| {
            // Public suffix such as "gov.cn" before the bare TLD.
            registrable
                .split_once('.')
                .and_then(|(_, suffix)| if suffix.contains('.') { find(suffix) } else { None })
        })
        .or_else(|| find(top_level_domain(host)))
}

/// Score bonus for a search result hosted on `host`. Zero when unknown.
pub fn domain_trust_bonus(host: &str) -> f64 {
    lookup(TRUST_BONUS, host).unwrap_or(0.0)
}

/// Authority in `[0, 1]`, or `None` when the host is not in the table.
pub fn authority_score(host: &str) -> Option<f64> {
    lookup(AUTHORITY, host)
}
