/// A search query: the raw text as submitted and its lowercase tokens.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Query {
    raw: String,
    prefix: String,
    tokens: Vec<String>,
}

impl Query {
    /// Tokenizes `raw` into lowercase whitespace-separated words.
    pub fn parse(raw: impl Into<String>) -> Self {
        let raw = raw.into();
        let prefix = raw.trim().to_lowercase();
        let tokens = prefix.split_whitespace().map(str::to_string).collect();
        Self {
            raw,
            prefix,
            tokens,
        }
    }

    /// The query exactly as submitted.
    pub fn raw(&self) -> &str {
        &self.raw
    }

    /// Trimmed, lowercased raw query; a name starting with this is a
    /// priority match.
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Lowercase whitespace-split words.
    pub fn tokens(&self) -> &[String] {
        &self.tokens
    }

    /// Number of tokens.
    pub fn token_count(&self) -> usize {
        self.tokens.len()
    }

    /// True when the query holds no tokens (empty or whitespace only).
    pub fn is_blank(&self) -> bool {
        self.tokens.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tokens_are_lowercase_and_whitespace_split() {
        let q = Query::parse("  Organic\tMILK  2% ");
        assert_eq!(q.tokens(), ["organic", "milk", "2%"]);
        assert_eq!(q.token_count(), 3);
    }

    #[test]
    fn test_prefix_is_trimmed_lowercase_raw() {
        let q = Query::parse("  Almond  Milk ");
        assert_eq!(q.prefix(), "almond  milk");
        assert_eq!(q.raw(), "  Almond  Milk ");
    }

    #[test]
    fn test_whitespace_only_is_blank() {
        assert!(Query::parse("   \t ").is_blank());
        assert!(Query::parse("").is_blank());
        assert!(!Query::parse("x").is_blank());
    }
}
