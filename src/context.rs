//! Per-request context
//!
//! The auth token and locale belong to the surrounding application. They are
//! handed to every fetch explicitly instead of being read from global state.

/// Cross-cutting request context
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestContext {
    /// Session token of the signed-in user
    pub token: Option<String>,
    /// User locale, forwarded as `Accept-Language`
    pub locale: Option<String>,
}

impl RequestContext {
    /// Context for an anonymous request
    pub fn anonymous() -> Self {
        Self::default()
    }

    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    pub fn with_locale(mut self, locale: impl Into<String>) -> Self {
        self.locale = Some(locale.into());
        self
    }

    pub fn is_authenticated(&self) -> bool {
        self.token.is_some()
    }
}
