//! Port handing the current bearer token to outbound adapters.

use crate::domain::AccessToken;

/// Source of the bearer token attached to backend requests.
#[cfg_attr(test, mockall::automock)]
pub trait AccessTokenSource: Send + Sync {
    /// Token of the signed-in session, if any.
    fn access_token(&self) -> Option<AccessToken>;
}

/// Token source for unauthenticated or offline use.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoAccessToken;

impl AccessTokenSource for NoAccessToken {
    fn access_token(&self) -> Option<AccessToken> {
        None
    }
}

/// Token source that always hands out one configured token.
///
/// Operator tools act outside any user session and authenticate with a
/// service token instead.
#[derive(Debug, Clone)]
pub struct StaticAccessToken(AccessToken);

impl StaticAccessToken {
    /// Hand out `token` on every request.
    #[must_use]
    pub const fn new(token: AccessToken) -> Self {
        Self(token)
    }
}

impl AccessTokenSource for StaticAccessToken {
    fn access_token(&self) -> Option<AccessToken> {
        Some(self.0.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn static_sources_repeat_their_token() {
        let source = StaticAccessToken::new(AccessToken::new("svc_token_1"));

        let first = source.access_token().expect("token");
        let second = source.access_token().expect("token");

        assert_eq!(first.expose(), "svc_token_1");
        assert_eq!(first, second);
        assert!(NoAccessToken.access_token().is_none());
    }
}
