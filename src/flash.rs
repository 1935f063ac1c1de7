//! One-shot messages carried across a redirect.
//!
//! Queued messages are stored as a JSON array in a cookie when a handler
//! redirects, and consumed (and the cookie removed) by the next page render.
//! The cookie jar percent-encodes the value on the wire.

use axum_extra::extract::cookie::{Cookie, CookieJar};

pub const FLASH_COOKIE: &str = "flash";

fn queued(jar: &CookieJar) -> Vec<String> {
    jar.get(FLASH_COOKIE)
        .and_then(|cookie| serde_json::from_str(cookie.value()).ok())
        .unwrap_or_default()
}

/// Queues `message` for the next rendered page
pub fn push(jar: CookieJar, message: &str) -> CookieJar {
    let mut messages = queued(&jar);
    messages.push(message.to_string());

    match serde_json::to_string(&messages) {
        Ok(value) => jar.add(Cookie::build((FLASH_COOKIE, value)).path("/")),
        Err(err) => {
            log::error!("Dropping flash message {:?}: {}", message, err);
            jar
        }
    }
}

/// Removes and returns every queued message
///
/// A cookie that does not hold a JSON string array yields no messages.
pub fn take(jar: CookieJar) -> (CookieJar, Vec<String>) {
    if jar.get(FLASH_COOKIE).is_none() {
        return (jar, Vec::new());
    }

    let messages = queued(&jar);
    (jar.remove(Cookie::build(FLASH_COOKIE).path("/")), messages)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::{HeaderMap, HeaderValue, header};
    use axum::response::IntoResponse;

    /// Sends `jar` as a response and reads the flash cookie back the way the
    /// browser would return it on the next request
    fn round_trip(jar: CookieJar) -> (String, CookieJar) {
        let response = jar.into_response();
        let set_cookie = response
            .headers()
            .get_all(header::SET_COOKIE)
            .iter()
            .filter_map(|value| value.to_str().ok())
            .find(|value| value.starts_with("flash="))
            .and_then(|value| value.split(';').next())
            .unwrap()
            .to_string();

        let mut headers = HeaderMap::new();
        headers.insert(header::COOKIE, HeaderValue::from_str(&set_cookie).unwrap());
        (set_cookie, CookieJar::from_headers(&headers))
    }

    #[test]
    fn pushed_messages_come_back_in_order() {
        let jar = push(CookieJar::new(), "Passwords do not match!");
        let jar = push(jar, "second & last");

        let (jar, messages) = take(jar);
        assert_eq!(messages, vec!["Passwords do not match!", "second & last"]);

        let (_, again) = take(jar);
        assert!(again.is_empty());
    }

    #[test]
    fn cookie_survives_the_wire_encoded_once() {
        let jar = push(CookieJar::new(), "File type not allowed: a&b; c.exe");
        let (header_value, returned) = round_trip(jar);

        assert!(header_value.contains("File%20type%20not%20allowed"));
        assert!(!header_value.contains("%25"));

        let (_, messages) = take(returned);
        assert_eq!(messages, vec!["File type not allowed: a&b; c.exe"]);
    }

    #[test]
    fn garbage_cookie_yields_no_messages() {
        let jar = CookieJar::new().add(Cookie::new(FLASH_COOKIE, "not json"));
        let (_, messages) = take(jar);
        assert!(messages.is_empty());
    }

    #[test]
    fn empty_jar_has_no_messages() {
        let (_, messages) = take(CookieJar::new());
        assert!(messages.is_empty());
    }
}
