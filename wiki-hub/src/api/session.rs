//! Cookie transport for session tokens.

use super::AppState;
use axum::{
    extract::FromRequestParts,
    http::{header, request::Parts, HeaderMap},
};
use std::convert::Infallible;
use wiki_hub_core::auth::Session;

pub const SESSION_COOKIE: &str = "session_token";
pub const USER_COOKIE: &str = "session_user";

/// Lifetime and security flags for the two session cookies.
#[derive(Clone, Copy, Debug)]
pub struct CookiePolicy {
    pub secure: bool,
    pub max_age_secs: u64,
    pub remember_me_max_age_secs: u64,
}

impl Default for CookiePolicy {
    fn default() -> Self {
        Self {
            secure: true,
            max_age_secs: 24 * 3600,
            remember_me_max_age_secs: 30 * 24 * 3600,
        }
    }
}

impl CookiePolicy {
    /// Values are percent-encoded so a username can never smuggle in its
    /// own attributes or bytes a header cannot carry.
    fn cookie(&self, name: &str, value: &str, http_only: bool, max_age: u64) -> String {
        let value = urlencoding::encode(value);
        let mut cookie = format!("{name}={value}; Path=/; Max-Age={max_age}; SameSite=Strict");
        if http_only {
            cookie.push_str("; HttpOnly");
        }
        if self.secure {
            cookie.push_str("; Secure");
        }
        cookie
    }

    /// The token cookie is hidden from scripts, the username cookie is not.
    pub fn login_cookies(&self, token: &str, username: &str, remember_me: bool) -> [String; 2] {
        let max_age = if remember_me {
            self.remember_me_max_age_secs
        } else {
            self.max_age_secs
        };
        [
            self.cookie(SESSION_COOKIE, token, true, max_age),
            self.cookie(USER_COOKIE, username, false, max_age),
        ]
    }

    pub fn logout_cookies(&self) -> [String; 2] {
        [
            self.cookie(SESSION_COOKIE, "", true, 0),
            self.cookie(USER_COOKIE, "", false, 0),
        ]
    }
}

/// Value of cookie `name` from the request's `Cookie` headers.
pub fn parse_cookie(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(k, _)| *k == name)
        .map(|(_, v)| v.to_string())
}

/// Session attached to the request, if the token cookie names a live one.
#[derive(Clone, Debug)]
pub struct AuthContext {
    pub token: Option<String>,
    pub session: Option<Session>,
}

impl FromRequestParts<AppState> for AuthContext {
    type Rejection = Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = parse_cookie(&parts.headers, SESSION_COOKIE).filter(|t| !t.is_empty());
        let session = state.gate.session(token.as_deref());
        Ok(Self { token, session })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn parses_cookie_among_others() {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::COOKIE,
            HeaderValue::from_static("theme=dark; session_token=abc; session_user=alice"),
        );
        assert_eq!(parse_cookie(&headers, SESSION_COOKIE).as_deref(), Some("abc"));
        assert_eq!(parse_cookie(&headers, USER_COOKIE).as_deref(), Some("alice"));
        assert_eq!(parse_cookie(&headers, "missing"), None);
    }

    #[test]
    fn login_cookie_flags() {
        let policy = CookiePolicy::default();
        let [token, user] = policy.login_cookies("tok", "alice", false);
        assert_eq!(
            token,
            "session_token=tok; Path=/; Max-Age=86400; SameSite=Strict; HttpOnly; Secure"
        );
        assert_eq!(
            user,
            "session_user=alice; Path=/; Max-Age=86400; SameSite=Strict; Secure"
        );

        let [token, _] = policy.login_cookies("tok", "alice", true);
        assert!(token.contains("Max-Age=2592000"));
    }

    #[test]
    fn username_cookie_is_percent_encoded() {
        let policy = CookiePolicy::default();
        let [_, user] = policy.login_cookies(
            "tok",
            "eve; Domain=evil.example; Max-Age=999999999",
            false,
        );
        assert_eq!(
            user,
            "session_user=eve%3B%20Domain%3Devil.example%3B%20Max-Age%3D999999999; \
             Path=/; Max-Age=86400; SameSite=Strict; Secure"
        );

        let [_, user] = policy.login_cookies("tok", "bad\u{7f}name", false);
        assert!(user.starts_with("session_user=bad%7Fname;"));
        assert!(HeaderValue::from_str(&user).is_ok());
    }

    #[test]
    fn insecure_policy_omits_secure_flag() {
        let policy = CookiePolicy {
            secure: false,
            ..Default::default()
        };
        for cookie in policy.logout_cookies() {
            assert!(cookie.contains("Max-Age=0"));
            assert!(!cookie.contains("Secure"));
        }
    }
}
