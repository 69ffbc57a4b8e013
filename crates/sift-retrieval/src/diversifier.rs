//! Deduplication, scoring and diversification of raw search results.

use std::collections::{HashMap, HashSet};

use chrono::{DateTime, Utc};
use sift_contracts::source::Source;
use tracing::debug;

use crate::authority::domain_trust_bonus;
use crate::domain::{contains_cjk, domain_key, host_of};
use crate::recency::{age_in_days, recency_bonus};

/// Base score every result starts from before bonuses.
pub const BASE_SCORE: f64 = 0.55;

/// How far the backfill pass may push the result count past `k`.
pub const BACKFILL_OVERFLOW: usize = 3;

fn clamp01(x: f64) -> f64 {
    x.clamp(0.0, 1.0)
}

/// Lower-cased title with punctuation dropped and whitespace collapsed.
fn normalized_title(title: &str) -> String {
    title
        .chars()
        .map(|c| if c.is_alphanumeric() { c.to_lowercase().next().unwrap_or(c) } else { ' ' })
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Dedup key: normalized title (or the URL for untitled results) plus the
/// registrable domain.
fn dedup_key(source: &Source) -> (String, String) {
    let title = source
        .title
        .as_deref()
        .map(normalized_title)
        .filter(|t| !t.is_empty())
        .unwrap_or_else(|| source.url.trim().to_ascii_lowercase());
    (title, domain_key(&source.url))
}

/// True when the source carries no CJK text at all.
pub fn is_foreign(source: &Source) -> bool {
    !contains_cjk(&source.text())
}

/// Score one source: `clamp01(0.55 + trust bonus + recency bonus)`.
pub fn score_source(source: &Source, now: DateTime<Utc>) -> f64 {
    let trust = host_of(&source.url)
        .map(|host| domain_trust_bonus(&host))
        .unwrap_or(0.0);
    let recency = recency_bonus(age_in_days(source.published_date.as_deref(), now));
    clamp01(BASE_SCORE + trust + recency)
}

/// Drop duplicates (first occurrence wins), score what remains and sort it
/// by descending score. Ties keep their original order.
pub fn dedupe_and_score(raw: Vec<Source>, now: DateTime<Utc>) -> Vec<Source> {
    let total = raw.len();
    let mut seen_urls = HashSet::new();
    let mut seen_keys = HashSet::new();

    let mut scored: Vec<Source> = raw
        .into_iter()
        .filter(|s| seen_urls.insert(s.url.trim().to_string()))
        .filter(|s| seen_keys.insert(dedup_key(s)))
        .map(|mut s| {
            s.score = score_source(&s, now);
            s
        })
        .collect();

    scored.sort_by(|a, b| b.score.total_cmp(&a.score));
    debug!(raw = total, kept = scored.len(), "deduplicated search results");
    scored
}

/// Select up to `k` sources with at most `max_per_domain` from any one
/// registrable domain, then backfill foreign-language sources until
/// `min_foreign` are present. The result never exceeds `k + 3`.
///
/// `scored` is expected in descending score order; admission is greedy.
pub fn diversify(
    scored: &[Source],
    k: usize,
    max_per_domain: usize,
    min_foreign: usize,
) -> Vec<Source> {
    let mut per_domain: HashMap<String, usize> = HashMap::new();
    let mut admitted: Vec<usize> = Vec::new();

    let try_admit = |idx: usize, per_domain: &mut HashMap<String, usize>| -> bool {
        let count = per_domain.entry(domain_key(&scored[idx].url)).or_insert(0);
        if *count >= max_per_domain {
            return false;
        }
        *count += 1;
        true
    };

    for idx in 0..scored.len() {
        if admitted.len() >= k {
            break;
        }
        if try_admit(idx, &mut per_domain) {
            admitted.push(idx);
        }
    }

    let mut foreign = admitted.iter().filter(|&&i| is_foreign(&scored[i])).count();
    let ceiling = k + BACKFILL_OVERFLOW;
    let mut backfilled = 0usize;

    if foreign < min_foreign {
        for idx in 0..scored.len() {
            if foreign >= min_foreign || admitted.len() >= ceiling {
                break;
            }
            if admitted.contains(&idx) || !is_foreign(&scored[idx]) {
                continue;
            }
            if try_admit(idx, &mut per_domain) {
                admitted.push(idx);
                foreign += 1;
                backfilled += 1;
            }
        }
    }

    debug!(
        pool = scored.len(),
        k,
        selected = admitted.len(),
        backfilled,
        foreign,
        "diversified sources"
    );
    admitted.into_iter().map(|i| scored[i].clone()).collect()
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, TimeZone, Utc};
    use proptest::prelude::*;
    use sift_contracts::source::Source;

    use super::*;
    use crate::domain::domain_key;

    fn now() -> chrono::DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap()
    }

    fn src(url: &str, title: &str) -> Source {
        Source::new(url).with_title(title)
    }

    // ── dedupe_and_score ─────────────────────────────────────────────────────

    #[test]
    fn duplicates_keep_first_occurrence() {
        let raw = vec![
            src("https://reuters.com/a", "Chip output rises").with_snippet("first"),
            src("https://www.reuters.com/b", "Chip Output Rises!").with_snippet("second"),
            src("https://reuters.com/a", "Other title"),
            src("https://apnews.com/c", "Chip output rises"),
        ];

        let out = dedupe_and_score(raw, now());
        assert_eq!(out.len(), 2);
        let reuters = out.iter().find(|s| s.url.contains("reuters")).unwrap();
        assert_eq!(reuters.snippet.as_deref(), Some("first"));
    }

    #[test]
    fn untitled_results_dedupe_by_url() {
        let raw = vec![
            Source::new("https://example.com/1"),
            Source::new("https://example.com/2"),
        ];
        assert_eq!(dedupe_and_score(raw, now()).len(), 2);
    }

    #[test]
    fn score_combines_trust_and_recency() {
        let fresh = (now() - Duration::days(1)).format("%Y-%m-%d").to_string();
        let raw = vec![
            src("https://randomblog.xyz/p", "Blog post"),
            src("https://reuters.com/x", "Wire story").with_published_date(fresh.clone()),
            src("https://cdc.gov/y", "Guidance").with_published_date("2020-01-01"),
        ];

        let out = dedupe_and_score(raw, now());
        assert_eq!(out[0].url, "https://reuters.com/x");
        assert!((out[0].score - (0.55 + 0.20 + 0.12)).abs() < 1e-9);
        assert!((out[1].score - 0.75).abs() < 1e-9);
        assert!((out[2].score - 0.55).abs() < 1e-9);
    }

    #[test]
    fn equal_scores_keep_input_order() {
        let raw = vec![
            src("https://a.xyz/1", "one"),
            src("https://b.xyz/2", "two"),
            src("https://c.xyz/3", "three"),
        ];
        let urls: Vec<_> = dedupe_and_score(raw, now()).into_iter().map(|s| s.url).collect();
        assert_eq!(urls, vec!["https://a.xyz/1", "https://b.xyz/2", "https://c.xyz/3"]);
    }

    // ── diversify ────────────────────────────────────────────────────────────

    #[test]
    fn per_domain_cap_is_enforced() {
        let pool: Vec<Source> = (0..6)
            .map(|i| src(&format!("https://news{i}.example.com/"), &format!("t{i}")))
            .chain([src("https://other.org/", "other")])
            .collect();

        let out = diversify(&pool, 5, 2, 0);
        assert_eq!(out.len(), 3);
        assert_eq!(out[2].url, "https://other.org/");
    }

    #[test]
    fn backfill_adds_foreign_sources_past_k() {
        let pool = vec![
            src("https://sina.com.cn/1", "人工智能芯片新闻"),
            src("https://qq.com/2", "芯片出货量"),
            src("https://163.com/3", "半导体行业"),
            src("https://reuters.com/4", "AI chip shipments"),
            src("https://bbc.com/5", "Chipmakers expand"),
        ];

        let out = diversify(&pool, 3, 2, 2);
        assert_eq!(out.len(), 5);
        assert_eq!(out.iter().filter(|s| is_foreign(s)).count(), 2);
    }

    #[test]
    fn backfill_stops_at_overflow_limit() {
        let mut pool: Vec<Source> = (0..2)
            .map(|i| src(&format!("https://cn{i}.com.cn/"), "中文标题"))
            .collect();
        pool.extend((0..6).map(|i| src(&format!("https://en{i}.org/"), "english")));

        let out = diversify(&pool, 2, 1, 10);
        assert_eq!(out.len(), 2 + BACKFILL_OVERFLOW);
        assert!(out.iter().filter(|s| is_foreign(s)).count() >= BACKFILL_OVERFLOW);
    }

    #[test]
    fn no_backfill_when_minimum_already_met() {
        let pool = vec![
            src("https://a.org/", "alpha"),
            src("https://b.org/", "beta"),
            src("https://c.org/", "gamma"),
        ];
        assert_eq!(diversify(&pool, 2, 2, 1).len(), 2);
    }

    // ── properties ───────────────────────────────────────────────────────────

    fn arb_pool() -> impl Strategy<Value = Vec<Source>> {
        prop::collection::vec((0usize..5, 0usize..50, any::<bool>()), 0..30).prop_map(|items| {
            items
                .into_iter()
                .enumerate()
                .map(|(i, (domain, path, cjk))| {
                    let title = if cjk { format!("新闻 {i}") } else { format!("story {i}") };
                    src(&format!("https://sub{path}.site{domain}.com/{i}"), &title)
                })
                .collect()
        })
    }

    proptest! {
        #[test]
        fn never_exceeds_domain_cap(pool in arb_pool(), k in 0usize..12, cap in 1usize..4, min_foreign in 0usize..5) {
            let out = diversify(&pool, k, cap, min_foreign);
            let mut counts: HashMap<String, usize> = HashMap::new();
            for s in &out {
                *counts.entry(domain_key(&s.url)).or_default() += 1;
            }
            prop_assert!(counts.values().all(|&c| c <= cap));
            prop_assert!(out.len() <= k + BACKFILL_OVERFLOW);
        }

        #[test]
        fn backfill_returns_every_foreign_source(
            cjk_count in 0usize..10,
            foreign_count in 0usize..=3,
            k in 0usize..8,
        ) {
            let mut pool: Vec<Source> = (0..cjk_count)
                .map(|i| src(&format!("https://cn{i}.com.cn/"), "中文"))
                .collect();
            pool.extend((0..foreign_count).map(|i| src(&format!("https://en{i}.org/"), "english")));

            let out = diversify(&pool, k, 1, foreign_count);
            prop_assert_eq!(out.iter().filter(|s| is_foreign(s)).count(), foreign_count);
            prop_assert!(out.len() <= k + BACKFILL_OVERFLOW);
        }

        #[test]
        fn short_foreign_pool_is_returned_whole(
            cjk_count in 0usize..10,
            foreign_count in 0usize..=3,
            shortfall in 1usize..5,
            k in 0usize..8,
        ) {
            let mut pool: Vec<Source> = (0..cjk_count)
                .map(|i| src(&format!("https://cn{i}.com.cn/"), "中文"))
                .collect();
            pool.extend((0..foreign_count).map(|i| src(&format!("https://en{i}.org/"), "english")));

            let out = diversify(&pool, k, 1, foreign_count + shortfall);
            prop_assert_eq!(out.iter().filter(|s| is_foreign(s)).count(), foreign_count);
            prop_assert!(out.len() <= k + BACKFILL_OVERFLOW);
        }
    }
}
