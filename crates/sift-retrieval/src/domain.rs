//! URL and domain helpers.
//!
//! Deliberately small: only what dedup keys, authority lookups and the
//! per-domain cap need. A URL without a scheme or with an invalid host is
//! "unparseable" and yields `None`.

/// Two-label public suffixes under which the registrable domain has three labels.
const SECOND_LEVEL_SUFFIXES: &[&str] = &[
    "ac.jp", "ac.uk", "co.in", "co.jp", "co.kr", "co.uk", "co.nz", "com.au", "com.br", "com.cn",
    "com.hk", "com.sg", "com.tw", "edu.au", "edu.cn", "gov.au", "gov.cn", "gov.uk", "net.cn",
    "org.au", "org.cn", "org.uk",
];

/// Lower-cased host of `url` with any `www.` prefix and port removed.
pub fn host_of(url: &str) -> Option<String> {
    let (scheme, rest) = url.trim().split_once("://")?;
    if scheme.is_empty()
        || !scheme
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'))
    {
        return None;
    }

    let authority = rest.split(['/', '?', '#']).next()?;
    let host_port = authority.rsplit('@').next()?;
    let host = host_port.split(':').next()?.trim_end_matches('.');

    if host.is_empty()
        || !host
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '.'))
        || host.starts_with('.')
        || host.contains("..")
    {
        return None;
    }

    let host = host.to_ascii_lowercase();
    Some(match host.strip_prefix("www.") {
        Some(stripped) if !stripped.is_empty() => stripped.to_string(),
        _ => host,
    })
}

/// The domain a registrant controls, e.g. `news.bbc.co.uk` → `bbc.co.uk`.
pub fn registrable_domain(host: &str) -> String {
    let labels: Vec<&str> = host.split('.').collect();
    if labels.len() <= 2 {
        return host.to_string();
    }

    let last_two = labels[labels.len() - 2..].join(".");
    let keep = if SECOND_LEVEL_SUFFIXES.contains(&last_two.as_str()) {
        3
    } else {
        2
    };
    labels[labels.len() - keep..].join(".")
}

/// Last label of the host, e.g. `gov` for `cdc.gov`.
pub fn top_level_domain(host: &str) -> &str {
    host.rsplit('.').next().unwrap_or(host)
}

/// Grouping key for the per-domain cap and dedup. Falls back to the raw URL
/// when it cannot be parsed, so unparseable sources never share a bucket.
pub fn domain_key(url: &str) -> String {
    match host_of(url) {
        Some(host) => registrable_domain(&host),
        None => url.trim().to_ascii_lowercase(),
    }
}

/// True if `c` is a Chinese, Japanese or Korean script codepoint.
pub fn is_cjk(c: char) -> bool {
    matches!(c as u32,
        0x3040..=0x30FF      // Hiragana, Katakana
        | 0x3400..=0x4DBF    // CJK Extension A
        | 0x4E00..=0x9FFF    // CJK Unified Ideographs
        | 0xAC00..=0xD7AF    // Hangul syllables
        | 0xF900..=0xFAFF    // CJK Compatibility Ideographs
        | 0x20000..=0x2A6DF  // CJK Extension B
    )
}

pub fn contains_cjk(text: &str) -> bool {
    text.chars().any(is_cjk)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn host_strips_scheme_www_port_and_path() {
        assert_eq!(host_of("https://www.Reuters.com/tech/x?y=1").as_deref(), Some("reuters.com"));
        assert_eq!(host_of("http://user@news.bbc.co.uk:8080/a").as_deref(), Some("news.bbc.co.uk"));
        assert_eq!(host_of("https://arxiv.org#frag").as_deref(), Some("arxiv.org"));
    }

    #[test]
    fn unparseable_urls_have_no_host() {
        assert_eq!(host_of("not a url"), None);
        assert_eq!(host_of("reuters.com/article"), None);
        assert_eq!(host_of("https://"), None);
        assert_eq!(host_of("https://bad host.com/"), None);
    }

    #[test]
    fn registrable_domain_handles_two_level_suffixes() {
        assert_eq!(registrable_domain("news.bbc.co.uk"), "bbc.co.uk");
        assert_eq!(registrable_domain("tech.sina.com.cn"), "sina.com.cn");
        assert_eq!(registrable_domain("blog.openai.com"), "openai.com");
        assert_eq!(registrable_domain("nih.gov"), "nih.gov");
    }

    #[test]
    fn tld_is_last_label() {
        assert_eq!(top_level_domain("www.cdc.gov"), "gov");
        assert_eq!(top_level_domain("localhost"), "localhost");
    }

    #[test]
    fn domain_key_groups_subdomains() {
        assert_eq!(domain_key("https://a.example.com/1"), domain_key("https://b.example.com/2"));
        assert_eq!(domain_key("garbage"), "garbage");
    }

    #[test]
    fn cjk_detection() {
        assert!(contains_cjk("人工智能芯片"));
        assert!(contains_cjk("AI チップ"));
        assert!(contains_cjk("반도체"));
        assert!(!contains_cjk("AI hardware — naïve café"));
    }
}
