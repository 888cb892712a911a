//! Strategies for staging the store's cookie on the outgoing response.
//!
//! [`JarWriter`] hands the cookie to axum-extra's [`CookieJar`] and lets the
//! framework emit the header. [`HeaderWriter`] edits the `Set-Cookie` values
//! of a raw [`HeaderMap`] directly, replacing only its own entry.

use std::fmt;

use axum::http::{header::SET_COOKIE, HeaderMap, HeaderValue};
use axum_extra::extract::cookie::{Cookie, CookieJar};
use tracing::debug;

use crate::errors::PersistenceError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteStrategy {
    Framework,
    RawHeader,
}

impl fmt::Display for WriteStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WriteStrategy::Framework => f.write_str("framework"),
            WriteStrategy::RawHeader => f.write_str("raw_header"),
        }
    }
}

/// Destination for the store's cookie.
pub trait CookieWriter {
    fn strategy(&self) -> WriteStrategy;

    /// Stage `cookie`, replacing any earlier cookie with the same name.
    fn write_cookie(&mut self, cookie: Cookie<'static>) -> Result<(), PersistenceError>;
}

impl<W: CookieWriter + ?Sized> CookieWriter for &mut W {
    fn strategy(&self) -> WriteStrategy {
        (**self).strategy()
    }

    fn write_cookie(&mut self, cookie: Cookie<'static>) -> Result<(), PersistenceError> {
        (**self).write_cookie(cookie)
    }
}

/// Framework-native strategy: delegates to an axum-extra [`CookieJar`].
///
/// Return [`JarWriter::into_jar`] from the handler so axum appends the
/// jar's changes to the response alongside anything else already staged.
#[derive(Debug, Default, Clone)]
pub struct JarWriter {
    jar: CookieJar,
}

impl JarWriter {
    pub fn new(jar: CookieJar) -> Self { Self { jar } }

    pub fn jar(&self) -> &CookieJar { &self.jar }

    pub fn into_jar(self) -> CookieJar { self.jar }
}

impl CookieWriter for JarWriter {
    fn strategy(&self) -> WriteStrategy {
        WriteStrategy::Framework
    }

    fn write_cookie(&mut self, cookie: Cookie<'static>) -> Result<(), PersistenceError> {
        self.jar = std::mem::take(&mut self.jar).add(cookie);
        Ok(())
    }
}

/// Raw-header strategy over a response's [`HeaderMap`].
pub struct HeaderWriter<'a> {
    headers: &'a mut HeaderMap,
}

impl<'a> HeaderWriter<'a> {
    pub fn new(headers: &'a mut HeaderMap) -> Self { Self { headers } }
}

impl CookieWriter for HeaderWriter<'_> {
    fn strategy(&self) -> WriteStrategy {
        WriteStrategy::RawHeader
    }

    fn write_cookie(&mut self, cookie: Cookie<'static>) -> Result<(), PersistenceError> {
        let line = cookie.encoded().to_string();
        // the encoded name cannot contain '=', so the first one ends it
        let name = line.split_once('=').map_or(line.as_str(), |(name, _)| name);
        let fresh = HeaderValue::from_str(&line)
            .map_err(|e| PersistenceError::InvalidHeader(format!("{name}: {e}")))?;

        let mut staged: Vec<HeaderValue> = self
            .headers
            .get_all(SET_COOKIE)
            .iter()
            .filter(|entry| !is_cookie_named(entry.as_bytes(), name))
            .cloned()
            .collect();
        let kept = staged.len();
        staged.push(fresh);

        self.headers.remove(SET_COOKIE);
        for entry in staged {
            self.headers.append(SET_COOKIE, entry);
        }
        debug!(cookie_name = name, kept_cookies = kept, "set-cookie header rewritten");
        Ok(())
    }
}

/// True when a `Set-Cookie` entry starts with exactly `name=`.
fn is_cookie_named(entry: &[u8], name: &str) -> bool {
    entry
        .strip_prefix(name.as_bytes())
        .map_or(false, |rest| rest.first() == Some(&b'='))
}

/// Strategy picked at runtime from what the caller has available.
pub enum ResponseCookies<'a> {
    Framework(JarWriter),
    Raw(HeaderWriter<'a>),
}

impl<'a> ResponseCookies<'a> {
    /// Prefer the framework jar when one is supplied; otherwise fall back to
    /// editing `headers` directly.
    pub fn select(jar: Option<CookieJar>, headers: &'a mut HeaderMap) -> Self {
        match jar {
            Some(jar) => ResponseCookies::Framework(JarWriter::new(jar)),
            None => ResponseCookies::Raw(HeaderWriter::new(headers)),
        }
    }

    /// The framework jar, if that strategy was selected.
    pub fn into_jar(self) -> Option<CookieJar> {
        match self {
            ResponseCookies::Framework(writer) => Some(writer.into_jar()),
            ResponseCookies::Raw(_) => None,
        }
    }
}

impl CookieWriter for ResponseCookies<'_> {
    fn strategy(&self) -> WriteStrategy {
        match self {
            ResponseCookies::Framework(w) => w.strategy(),
            ResponseCookies::Raw(w) => w.strategy(),
        }
    }

    fn write_cookie(&mut self, cookie: Cookie<'static>) -> Result<(), PersistenceError> {
        match self {
            ResponseCookies::Framework(w) => w.write_cookie(cookie),
            ResponseCookies::Raw(w) => w.write_cookie(cookie),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set_cookies(headers: &HeaderMap) -> Vec<String> {
        headers
            .get_all(SET_COOKIE)
            .iter()
            .map(|v| v.to_str().unwrap().to_string())
            .collect()
    }

    #[test]
    fn header_writer_replaces_only_its_own_entry() {
        let mut headers = HeaderMap::new();
        headers.append(SET_COOKIE, HeaderValue::from_static("dummy=wow"));
        headers.append(SET_COOKIE, HeaderValue::from_static("split=old; Path=/"));
        headers.append(SET_COOKIE, HeaderValue::from_static("splitvariant=blue"));

        let mut writer = HeaderWriter::new(&mut headers);
        writer.write_cookie(Cookie::new("split", "new")).unwrap();

        assert_eq!(set_cookies(&headers), vec!["dummy=wow", "splitvariant=blue", "split=new"]);
    }

    #[test]
    fn header_writer_on_empty_headers() {
        let mut headers = HeaderMap::new();
        HeaderWriter::new(&mut headers).write_cookie(Cookie::new("split", "v")).unwrap();
        assert_eq!(set_cookies(&headers), vec!["split=v"]);
    }

    #[test]
    fn repeated_writes_keep_a_single_entry() {
        let mut headers = HeaderMap::new();
        let mut writer = HeaderWriter::new(&mut headers);
        writer.write_cookie(Cookie::new("split", "1")).unwrap();
        writer.write_cookie(Cookie::new("split", "2")).unwrap();
        assert_eq!(set_cookies(&headers), vec!["split=2"]);
    }

    #[test]
    fn name_prefix_requires_equals_sign() {
        assert!(is_cookie_named(b"split=1", "split"));
        assert!(!is_cookie_named(b"splitvariant=1", "split"));
        assert!(!is_cookie_named(b"spl=1", "split"));
        assert!(!is_cookie_named(b"split", "split"));
    }

    #[test]
    fn jar_writer_replaces_same_name() {
        let mut writer = JarWriter::default();
        writer.write_cookie(Cookie::new("split", "1")).unwrap();
        writer.write_cookie(Cookie::new("split", "2")).unwrap();
        let jar = writer.into_jar();
        assert_eq!(jar.get("split").map(|c| c.value().to_string()).as_deref(), Some("2"));
        assert_eq!(jar.iter().count(), 1);
    }

    #[test]
    fn select_prefers_framework_jar() {
        let mut headers = HeaderMap::new();
        let mut cookies = ResponseCookies::select(Some(CookieJar::new()), &mut headers);
        assert_eq!(cookies.strategy(), WriteStrategy::Framework);
        cookies.write_cookie(Cookie::new("split", "x")).unwrap();
        let jar = cookies.into_jar().expect("framework jar");
        assert!(jar.get("split").is_some());
        assert!(headers.get(SET_COOKIE).is_none());

        let cookies = ResponseCookies::select(None, &mut headers);
        assert_eq!(cookies.strategy(), WriteStrategy::RawHeader);
        assert!(cookies.into_jar().is_none());
    }
}
