//! Retrieve: search every planned query, then dedupe, score and diversify.

use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, info, warn};

use sift_contracts::{
    error::SiftResult,
    generation::{SearchDepth, SearchOptions},
    plan::RouterPlan,
    source::Source,
    stage::SpeedMode,
};
use sift_core::cache::cache_key;
use sift_retrieval::{dedupe_and_score, diversify};

use super::StageContext;

/// Search parameters for a run's speed mode.
pub fn search_options(mode: SpeedMode, max_results: usize) -> SearchOptions {
    let depth = match mode {
        SpeedMode::Thorough => SearchDepth::Advanced,
        SpeedMode::Fast | SpeedMode::Balanced => SearchDepth::Basic,
    };
    SearchOptions { depth, max_results }
}

/// Cache key for one search response: query, depth and result count.
pub fn search_cache_key(query: &str, options: &SearchOptions) -> String {
    cache_key(
        &format!("{query}\u{1f}{:?}\u{1f}{}", options.depth, options.max_results),
        &[],
    )
}

pub async fn run(ctx: &StageContext<'_>, plan: &RouterPlan) -> SiftResult<Vec<Source>> {
    let settings = ctx.config.retrieval;
    let options = search_options(ctx.config.speed_mode, settings.max_results);

    // One slot per query so merge order follows the plan, cached or not.
    let mut responses: Vec<Vec<Source>> = vec![Vec::new(); plan.queries.len()];
    let mut misses: Vec<(usize, String)> = Vec::new();

    for (idx, query) in plan.queries.iter().enumerate() {
        let key = search_cache_key(query, &options);
        let cached = ctx
            .search_cache
            .lock()
            .ok()
            .and_then(|cache| cache.get(&key).cloned());

        match cached {
            Some(hits) => {
                debug!(query = %query, hits = hits.len(), "search cache hit");
                responses[idx] = hits;
            }
            None => misses.push((idx, key)),
        }
    }

    let tasks: Vec<_> = misses
        .iter()
        .map(|(idx, _)| {
            let search = Arc::clone(ctx.search);
            let query = plan.queries[*idx].clone();
            async move { search.search(&query, &options).await }
        })
        .collect();
    let results = ctx.executor.process_batch(tasks, ctx.batch_size).await;

    for ((idx, key), result) in misses.into_iter().zip(results) {
        match result {
            Ok(hits) => {
                // Empty responses may mean "unavailable"; do not pin them.
                if !hits.is_empty() {
                    if let Ok(mut cache) = ctx.search_cache.lock() {
                        cache.set(key, hits.clone());
                    }
                }
                responses[idx] = hits;
            }
            Err(err) => warn!(query = %plan.queries[idx], error = %err, "search failed"),
        }
    }

    let raw: Vec<Source> = responses.into_iter().flatten().collect();
    let raw_count = raw.len();
    let scored = dedupe_and_score(raw, Utc::now());
    let sources = diversify(
        &scored,
        settings.top_k,
        settings.max_per_domain,
        settings.min_foreign_sources,
    );

    info!(
        queries = plan.queries.len(),
        raw = raw_count,
        unique = scored.len(),
        kept = sources.len(),
        "sources retrieved"
    );
    Ok(sources)
}
