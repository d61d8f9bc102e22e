/// Identifies one issued fetch. Later requests always carry larger tokens.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct RequestToken(u64);

impl RequestToken {
    pub fn value(&self) -> u64 {
        self.0
    }
}

/// Issues monotonically increasing request tokens.
///
/// A consumer keeps the token of the request it is waiting for and drops any
/// response whose token is not the latest one issued, so a slow superseded
/// fetch can never overwrite newer results.
#[derive(Debug, Default)]
pub struct RequestTokens {
    latest: u64,
}

impl RequestTokens {
    pub fn new() -> Self {
        Self::default()
    }

    /// Issue a new token. It supersedes every token issued before it.
    pub fn issue(&mut self) -> RequestToken {
        self.latest += 1;
        RequestToken(self.latest)
    }

    pub fn latest(&self) -> Option<RequestToken> {
        (self.latest > 0).then_some(RequestToken(self.latest))
    }

    pub fn is_latest(&self, token: RequestToken) -> bool {
        token.0 != 0 && token.0 == self.latest
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tokens_increase() {
        let mut tokens = RequestTokens::new();
        let a = tokens.issue();
        let b = tokens.issue();
        assert!(b > a);
    }

    #[test]
    fn test_only_newest_is_latest() {
        let mut tokens = RequestTokens::new();
        let first = tokens.issue();
        assert!(tokens.is_latest(first));

        let second = tokens.issue();
        assert!(!tokens.is_latest(first));
        assert!(tokens.is_latest(second));
        assert_eq!(tokens.latest(), Some(second));
    }

    #[test]
    fn test_default_token_is_never_latest() {
        let tokens = RequestTokens::new();
        assert_eq!(tokens.latest(), None);
        assert!(!tokens.is_latest(RequestToken::default()));
    }
}
