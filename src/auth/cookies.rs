use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use cookie::time::Duration;

use crate::config;

pub const REFRESH_COOKIE: &str = "refresh_token";
pub const UNIVERSITY_COOKIE: &str = "university";

/// HttpOnly cookie carrying the refresh token; scoped to the auth routes
pub fn refresh_token_cookie(token: &str) -> Cookie<'static> {
    let security = &config::config().security;
    Cookie::build((REFRESH_COOKIE, token.to_string()))
        .path("/api/auth")
        .max_age(Duration::days(security.refresh_token_expiry_days))
        .same_site(SameSite::Strict)
        .http_only(true)
        .secure(security.cookie_secure)
        .build()
}

/// Remembers the selected university between requests. Readable by the dashboard.
pub fn university_cookie(schema: &str) -> Cookie<'static> {
    let security = &config::config().security;
    Cookie::build((UNIVERSITY_COOKIE, schema.to_string()))
        .path("/")
        .max_age(Duration::days(security.refresh_token_expiry_days))
        .same_site(SameSite::Lax)
        .secure(security.cookie_secure)
        .build()
}

/// Removal cookie for the refresh token; path must match the one it was set with
pub fn clear_refresh_token(jar: CookieJar) -> CookieJar {
    jar.remove(Cookie::build(REFRESH_COOKIE).path("/api/auth"))
}

pub fn refresh_token_from(jar: &CookieJar) -> Option<String> {
    jar.get(REFRESH_COOKIE)
        .map(|c| c.value().to_string())
        .filter(|v| !v.is_empty())
}

pub fn university_from(jar: &CookieJar) -> Option<String> {
    jar.get(UNIVERSITY_COOKIE)
        .map(|c| c.value().to_string())
        .filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn refresh_cookie_is_http_only_and_scoped() {
        let cookie = refresh_token_cookie("abc");
        assert_eq!(cookie.name(), REFRESH_COOKIE);
        assert_eq!(cookie.value(), "abc");
        assert_eq!(cookie.http_only(), Some(true));
        assert_eq!(cookie.path(), Some("/api/auth"));
        assert_eq!(cookie.same_site(), Some(SameSite::Strict));
    }

    #[test]
    fn reads_cookies_from_the_jar() {
        let jar = CookieJar::new()
            .add(refresh_token_cookie("tok"))
            .add(university_cookie("uni_abc"));
        assert_eq!(refresh_token_from(&jar).as_deref(), Some("tok"));
        assert_eq!(university_from(&jar).as_deref(), Some("uni_abc"));

        let jar = clear_refresh_token(jar);
        assert!(refresh_token_from(&jar).is_none());
    }
}
