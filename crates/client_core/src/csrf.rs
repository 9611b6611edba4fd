//! Anti-forgery token sourcing. The backend issues the token as a cookie and
//! expects it echoed in a header on every mutating request.

use std::sync::RwLock;

pub const DEFAULT_CSRF_COOKIE: &str = "csrftoken";
pub const CSRF_HEADER: &str = "X-CSRFToken";

pub trait CsrfTokenProvider: Send + Sync {
    fn token(&self) -> Option<String>;
}

pub struct StaticCsrfToken(String);

impl StaticCsrfToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }
}

impl CsrfTokenProvider for StaticCsrfToken {
    fn token(&self) -> Option<String> {
        Some(self.0.clone())
    }
}

pub struct MissingCsrfToken;

impl CsrfTokenProvider for MissingCsrfToken {
    fn token(&self) -> Option<String> {
        None
    }
}

/// Reads the token out of a `Cookie` header value, which can be replaced when
/// the session is renewed.
pub struct CookieCsrfToken {
    cookie_name: String,
    cookie_header: RwLock<String>,
}

impl CookieCsrfToken {
    pub fn new(cookie_name: impl Into<String>, cookie_header: impl Into<String>) -> Self {
        Self {
            cookie_name: cookie_name.into(),
            cookie_header: RwLock::new(cookie_header.into()),
        }
    }

    pub fn update_cookie_header(&self, cookie_header: impl Into<String>) {
        if let Ok(mut guard) = self.cookie_header.write() {
            *guard = cookie_header.into();
        }
    }
}

impl CsrfTokenProvider for CookieCsrfToken {
    fn token(&self) -> Option<String> {
        let guard = self.cookie_header.read().ok()?;
        cookie_value(&guard, &self.cookie_name)
    }
}

/// Looks up `name` in a `k=v; k2=v2` cookie string and percent-decodes it.
pub fn cookie_value(cookie_header: &str, name: &str) -> Option<String> {
    cookie_header
        .split(';')
        .map(str::trim)
        .find_map(|pair| {
            let (key, value) = pair.split_once('=')?;
            (key == name).then(|| decode_cookie_value(value))
        })
        .filter(|value| !value.is_empty())
}

fn decode_cookie_value(raw: &str) -> String {
    // form_urlencoded treats '+' as a space and '&' as a separator; neither
    // applies to cookie values.
    let escaped = format!("v={}", raw.replace('+', "%2B").replace('&', "%26"));
    url::form_urlencoded::parse(escaped.as_bytes())
        .next()
        .map(|(_, value)| value.into_owned())
        .unwrap_or_default()
}
