//! Token accounting for external calls.

use std::sync::atomic::{AtomicU64, Ordering};

use sift_contracts::generation::TokenUsage;

/// Rough token estimate for text whose usage the provider did not report.
///
/// Four characters per token, rounded up.
pub fn estimate_tokens(text: &str) -> u64 {
    (text.chars().count() as u64).div_ceil(4)
}

/// Tallies cost units consumed and produced during one run.
#[derive(Debug, Default)]
pub struct TokenAccountant {
    input: AtomicU64,
    output: AtomicU64,
    calls: AtomicU64,
}

impl TokenAccountant {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add one call's usage. `usage.calls` is ignored; each record is one call.
    pub fn record(&self, usage: TokenUsage) {
        self.input.fetch_add(usage.input, Ordering::Relaxed);
        self.output.fetch_add(usage.output, Ordering::Relaxed);
        self.calls.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a call whose usage must be estimated from the prompt and reply.
    pub fn record_estimated(&self, prompt: &str, reply: &str) {
        self.record(TokenUsage {
            input: estimate_tokens(prompt),
            output: estimate_tokens(reply),
            calls: 1,
        });
    }

    pub fn snapshot(&self) -> TokenUsage {
        TokenUsage {
            input: self.input.load(Ordering::Relaxed),
            output: self.output.load(Ordering::Relaxed),
            calls: self.calls.load(Ordering::Relaxed),
        }
    }
}

#[cfg(test)]
mod tests {
    use sift_contracts::generation::TokenUsage;

    use super::{estimate_tokens, TokenAccountant};

    #[test]
    fn estimate_rounds_up() {
        assert_eq!(estimate_tokens(""), 0);
        assert_eq!(estimate_tokens("abc"), 1);
        assert_eq!(estimate_tokens("abcd"), 1);
        assert_eq!(estimate_tokens("abcde"), 2);
    }

    #[test]
    fn records_accumulate() {
        let accountant = TokenAccountant::new();
        accountant.record(TokenUsage { input: 10, output: 5, calls: 0 });
        accountant.record(TokenUsage { input: 3, output: 7, calls: 0 });
        accountant.record_estimated("12345678", "1234");

        let usage = accountant.snapshot();
        assert_eq!(usage.input, 15);
        assert_eq!(usage.output, 13);
        assert_eq!(usage.calls, 3);
    }
}
