//! Request generation tokens
//!
//! Every play-at-index request mints a fresh token. Only the holder of the
//! latest token may move the controller out of `Loading` or touch the
//! transport; older requests finish their network calls and are discarded.

use serde::Serialize;

/// Opaque, monotonically increasing request identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct RequestToken(u64);

impl RequestToken {
    pub fn value(self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for RequestToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Mints tokens and remembers which one is current
#[derive(Debug, Default)]
pub struct TokenIssuer {
    last: u64,
    active: Option<RequestToken>,
}

impl TokenIssuer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mint a new token, invalidating every earlier one
    pub fn mint(&mut self) -> RequestToken {
        self.last += 1;
        let token = RequestToken(self.last);
        self.active = Some(token);
        token
    }

    /// Whether `token` is still the latest
    pub fn is_current(&self, token: RequestToken) -> bool {
        self.active == Some(token)
    }

    pub fn active(&self) -> Option<RequestToken> {
        self.active
    }
}
