//! Fixed-word-list implementation of `TextClassifier`.

use sift_core::traits::{Sentiment, TextClassifier, TopicBucket};

const TOPIC_WORDS: &[(TopicBucket, &[&str])] = &[
    (
        TopicBucket::Technology,
        &[
            "ai", "artificial intelligence", "software", "hardware", "chip", "semiconductor",
            "computer", "algorithm", "internet", "cloud", "robot", "gpu", "technology", "digital",
            "人工智能", "芯片", "软件", "科技",
        ],
    ),
    (
        TopicBucket::Health,
        &[
            "health", "healthcare", "medical", "medicine", "patient", "disease", "hospital",
            "clinical", "vaccine", "doctor", "treatment", "therapy", "医疗", "健康", "疾病",
        ],
    ),
    (
        TopicBucket::Finance,
        &[
            "market", "stock", "economy", "economic", "finance", "financial", "bank", "investment",
            "inflation", "revenue", "earnings", "price", "经济", "金融", "股市",
        ],
    ),
    (
        TopicBucket::Politics,
        &[
            "government", "election", "policy", "president", "minister", "parliament", "congress",
            "senate", "law", "regulation", "vote", "政府", "政策", "选举",
        ],
    ),
    (
        TopicBucket::Science,
        &[
            "research", "scientist", "experiment", "physics", "chemistry", "biology", "climate",
            "space", "universe", "species", "laboratory", "研究", "科学", "实验",
        ],
    ),
];

const POSITIVE_WORDS: &[&str] = &[
    "improve", "improves", "improved", "improvement", "benefit", "benefits", "better", "gain",
    "gains", "growth", "success", "successful", "effective", "positive", "advance", "advances",
    "breakthrough", "increase", "increases", "boost", "boosts", "progress", "提升", "改善", "增长",
];

const NEGATIVE_WORDS: &[&str] = &[
    "worse", "worsen", "worsens", "decline", "declines", "fail", "fails", "failure", "harm",
    "harms", "harmful", "risk", "risks", "negative", "decrease", "decreases", "drop", "drops",
    "loss", "losses", "ineffective", "no evidence", "debunked", "下降", "失败", "风险",
];

/// Classifies text by counting hits against fixed word lists.
///
/// Single ASCII words only match whole tokens, so "ai" does not fire on
/// "said". Phrases and CJK entries match as substrings.
#[derive(Debug, Default, Clone, Copy)]
pub struct KeywordClassifier;

impl KeywordClassifier {
    pub fn new() -> Self {
        Self
    }

    fn hits(text: &str, tokens: &[String], words: &[&str]) -> usize {
        words
            .iter()
            .filter(|w| {
                if w.is_ascii() && !w.contains(' ') {
                    tokens.iter().any(|t| t == *w)
                } else {
                    text.contains(*w)
                }
            })
            .count()
    }
}

fn tokenize(text: &str) -> Vec<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect()
}

impl TextClassifier for KeywordClassifier {
    /// The bucket with the most hits. Ties go to the earlier bucket; no hits
    /// at all is `General`.
    fn classify_topic(&self, text: &str) -> TopicBucket {
        let lower = text.to_lowercase();
        let tokens = tokenize(&lower);

        let mut best = (TopicBucket::General, 0usize);
        for (bucket, words) in TOPIC_WORDS {
            let hits = Self::hits(&lower, &tokens, words);
            if hits > best.1 {
                best = (*bucket, hits);
            }
        }
        best.0
    }

    fn classify_sentiment(&self, text: &str) -> Sentiment {
        let lower = text.to_lowercase();
        let tokens = tokenize(&lower);

        let positive = Self::hits(&lower, &tokens, POSITIVE_WORDS);
        let negative = Self::hits(&lower, &tokens, NEGATIVE_WORDS);
        match positive.cmp(&negative) {
            std::cmp::Ordering::Greater => Sentiment::Positive,
            std::cmp::Ordering::Less => Sentiment::Negative,
            std::cmp::Ordering::Equal => Sentiment::Neutral,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_topic_buckets() {
        let c = KeywordClassifier::new();
        assert_eq!(c.classify_topic("New GPU chip doubles AI throughput"), TopicBucket::Technology);
        assert_eq!(c.classify_topic("Hospital patients see faster treatment"), TopicBucket::Health);
        assert_eq!(c.classify_topic("Stock market rallies on earnings"), TopicBucket::Finance);
        assert_eq!(c.classify_topic("Parliament passes election law"), TopicBucket::Politics);
        assert_eq!(c.classify_topic("Physics experiment probes the universe"), TopicBucket::Science);
        assert_eq!(c.classify_topic("A quiet afternoon"), TopicBucket::General);
    }

    /// Short words only count as whole tokens.
    #[test]
    fn test_short_words_need_token_match() {
        let c = KeywordClassifier::new();
        assert_eq!(c.classify_topic("She said it was fine"), TopicBucket::General);
    }

    #[test]
    fn test_sentiment() {
        let c = KeywordClassifier::new();
        assert_eq!(c.classify_sentiment("AI improves healthcare outcomes"), Sentiment::Positive);
        assert_eq!(c.classify_sentiment("Trial fails and harms patients"), Sentiment::Negative);
        assert_eq!(c.classify_sentiment("The report was published"), Sentiment::Neutral);
        assert_eq!(c.classify_sentiment("这项技术改善了诊断"), Sentiment::Positive);
    }
}
