//! Read access to the cookies sent with the incoming request.

use std::collections::HashMap;

use axum::http::{header::COOKIE, HeaderMap};
use axum_extra::extract::cookie::{Cookie, CookieJar};

/// Anything that can look up a request cookie's value by name.
///
/// Values are returned decoded, i.e. the way the cookie was before it was
/// percent-encoded for the wire.
pub trait CookieSource {
    fn cookie_value(&self, name: &str) -> Option<String>;
}

impl<T: CookieSource + ?Sized> CookieSource for &T {
    fn cookie_value(&self, name: &str) -> Option<String> {
        (**self).cookie_value(name)
    }
}

/// Raw request headers. Every `Cookie` header is scanned; unparsable pairs
/// are skipped and the first match wins.
impl CookieSource for HeaderMap {
    fn cookie_value(&self, name: &str) -> Option<String> {
        self.get_all(COOKIE)
            .iter()
            .filter_map(|value| value.to_str().ok())
            .flat_map(|header| Cookie::split_parse_encoded(header.to_owned()))
            .filter_map(Result::ok)
            .find(|cookie| cookie.name() == name)
            .map(|cookie| cookie.value().to_string())
    }
}

impl CookieSource for CookieJar {
    fn cookie_value(&self, name: &str) -> Option<String> {
        self.get(name).map(|cookie| cookie.value().to_string())
    }
}

impl CookieSource for HashMap<String, String> {
    fn cookie_value(&self, name: &str) -> Option<String> {
        self.get(name).cloned()
    }
}
