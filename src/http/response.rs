use chrono::{DateTime, Duration, Utc};
use http::{header, HeaderMap, HeaderValue};
use std::collections::HashMap;
use tower_cookies::cookie::time::{Duration as CookieDuration, OffsetDateTime};
use tower_cookies::cookie::SameSite;
use tower_cookies::Cookie;

use crate::models::session::ClientSession;

/// Response-side sink for the session layer's HTTP output: redirects,
/// cookies and the Last-Modified header.
///
/// The session core never calls this; the authentication flow that sits on
/// top uses it to translate a client session identity into cookies.
pub trait ResponseSink {
    /// Sets a redirect to the given URL.
    fn redirect_to_url(&mut self, url: &str);

    /// Sets a persistent cookie which never expires.
    fn set_permanent_cookie(&mut self, cookie_name: &str, cookie_value: &str);

    /// Sets a session cookie which expires after the browser session closes.
    fn set_session_cookie(&mut self, cookie_name: &str, cookie_value: &str);

    /// Sets a persistent cookie which expires after the given time.
    fn set_cookie_for(&mut self, cookie_name: &str, cookie_value: &str, expires_in: Duration);

    /// Sets a persistent cookie with an absolute expiry date.
    fn set_cookie_until(
        &mut self,
        cookie_name: &str,
        cookie_value: &str,
        expires_at: DateTime<Utc>,
    );

    /// Deletes a cookie by setting its value to empty and expiring it
    /// immediately.
    fn delete_cookie(&mut self, cookie_name: &str);

    /// Enumerates the cookies set so far as a flat name→value mapping.
    fn cookies_as_map(&self) -> HashMap<String, String>;

    /// Attaches a Last-Modified header when a timestamp is given.
    fn add_header_last_modified(&mut self, last_modified: Option<DateTime<Utc>>);
}

/// How far in the future a "permanent" cookie expires.
const PERMANENT_COOKIE_YEARS: i64 = 20;

/// Builds a cookie scoped to the whole site, http-only and SameSite=Lax.
fn build_cookie(cookie_name: &str, cookie_value: &str) -> Cookie<'static> {
    let mut cookie = Cookie::new(cookie_name.to_string(), cookie_value.to_string());
    cookie.set_http_only(true);
    cookie.set_same_site(SameSite::Lax);
    cookie.set_path("/");
    cookie
}

fn append_set_cookie(headers: &mut HeaderMap, cookie: Cookie<'static>) {
    match HeaderValue::from_str(&cookie.to_string()) {
        Ok(value) => {
            headers.append(header::SET_COOKIE, value);
        }
        Err(e) => {
            tracing::warn!("Dropping unencodable cookie {}: {}", cookie.name(), e);
        }
    }
}

impl ResponseSink for HeaderMap {
    fn redirect_to_url(&mut self, url: &str) {
        match HeaderValue::from_str(url) {
            Ok(value) => {
                self.insert(header::LOCATION, value);
            }
            Err(e) => {
                tracing::warn!("Dropping unencodable redirect URL: {}", e);
            }
        }
    }

    fn set_permanent_cookie(&mut self, cookie_name: &str, cookie_value: &str) {
        self.set_cookie_until(
            cookie_name,
            cookie_value,
            Utc::now() + Duration::days(365 * PERMANENT_COOKIE_YEARS),
        );
    }

    fn set_session_cookie(&mut self, cookie_name: &str, cookie_value: &str) {
        append_set_cookie(self, build_cookie(cookie_name, cookie_value));
    }

    fn set_cookie_for(&mut self, cookie_name: &str, cookie_value: &str, expires_in: Duration) {
        let mut cookie = build_cookie(cookie_name, cookie_value);
        cookie.set_max_age(CookieDuration::seconds(expires_in.num_seconds()));
        append_set_cookie(self, cookie);
    }

    fn set_cookie_until(
        &mut self,
        cookie_name: &str,
        cookie_value: &str,
        expires_at: DateTime<Utc>,
    ) {
        let mut cookie = build_cookie(cookie_name, cookie_value);
        if let Ok(expires) = OffsetDateTime::from_unix_timestamp(expires_at.timestamp()) {
            cookie.set_expires(expires);
        }
        append_set_cookie(self, cookie);
    }

    fn delete_cookie(&mut self, cookie_name: &str) {
        let mut cookie = Cookie::new(cookie_name.to_string(), "");
        cookie.set_max_age(CookieDuration::seconds(0));
        cookie.set_path("/");
        append_set_cookie(self, cookie);
    }

    fn cookies_as_map(&self) -> HashMap<String, String> {
        let mut map = HashMap::new();
        for value in self.get_all(header::SET_COOKIE) {
            let Ok(raw) = value.to_str() else { continue };
            if let Ok(cookie) = Cookie::parse(raw.to_string()) {
                map.insert(cookie.name().to_string(), cookie.value().to_string());
            }
        }
        map
    }

    fn add_header_last_modified(&mut self, last_modified: Option<DateTime<Utc>>) {
        let Some(last_modified) = last_modified else {
            return;
        };
        let formatted = last_modified.format("%a, %d %b %Y %H:%M:%S GMT").to_string();
        match HeaderValue::from_str(&formatted) {
            Ok(value) => {
                self.insert(header::LAST_MODIFIED, value);
            }
            Err(e) => {
                tracing::warn!("Dropping unencodable Last-Modified header: {}", e);
            }
        }
    }
}

/// Sets the cookie that carries a client session's identity.
pub fn append_session_cookie(
    headers: &mut HeaderMap,
    cookie_name: &str,
    client_session: &ClientSession,
    expires_at: DateTime<Utc>,
) {
    headers.set_cookie_until(
        cookie_name,
        &client_session.session_id.to_string(),
        expires_at,
    );
}
