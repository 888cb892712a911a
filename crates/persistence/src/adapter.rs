//! Mapping-style store kept in a single cookie.
//!
//! A [`CookieStore`] is built per request. The request cookie is decoded on
//! first access and cached; every `set`/`delete` re-encodes the whole mapping
//! and stages the cookie on the response straight away.

use axum_extra::extract::cookie::Cookie;
use serde_json::Value;
use time::OffsetDateTime;
use tracing::{debug, warn};

use crate::codec::{self, PersistedMapping};
use crate::config::{self, CookieStoreConfig, MAX_COOKIE_LENGTH};
use crate::errors::PersistenceError;
use crate::source::CookieSource;
use crate::writer::CookieWriter;

/// Browsers commonly drop cookies larger than this.
pub const MAX_COOKIE_SIZE: usize = 4096;

/// What experiment logic needs from a persistence backend.
pub trait Persistence {
    fn get(&mut self, key: &str) -> Option<Value>;
    fn set(&mut self, key: &str, value: Value) -> Result<(), PersistenceError>;
    fn delete(&mut self, key: &str) -> Result<(), PersistenceError>;
    fn keys(&mut self) -> Vec<String>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheState {
    /// Request cookie not read yet.
    Unloaded,
    /// Loaded, nothing written.
    Clean,
    /// At least one write has been staged on the response.
    Dirty,
}

pub struct CookieStore<S, W> {
    source: S,
    writer: W,
    config: CookieStoreConfig,
    expires: OffsetDateTime,
    mapping: Option<PersistedMapping>,
    dirty: bool,
}

impl<S: CookieSource, W: CookieWriter> CookieStore<S, W> {
    pub fn new(source: S, writer: W, config: CookieStoreConfig) -> Self {
        Self::new_at(source, writer, config, OffsetDateTime::now_utc())
    }

    /// Build a store whose cookie expires `config.cookie_length` after `now`.
    /// Lifetimes past [`MAX_COOKIE_LENGTH`] are clamped to it.
    pub fn new_at(source: S, writer: W, config: CookieStoreConfig, now: OffsetDateTime) -> Self {
        let expires = expiry_after(now, config.cookie_length);
        Self { source, writer, config, expires, mapping: None, dirty: false }
    }

    /// Build a store from the process-wide default configuration.
    pub fn with_defaults(source: S, writer: W) -> Self {
        Self::new(source, writer, config::current().as_ref().clone())
    }

    pub fn config(&self) -> &CookieStoreConfig { &self.config }

    pub fn expires(&self) -> OffsetDateTime { self.expires }

    pub fn writer(&self) -> &W { &self.writer }

    pub fn into_writer(self) -> W { self.writer }

    pub fn state(&self) -> CacheState {
        match (&self.mapping, self.dirty) {
            (None, _) => CacheState::Unloaded,
            (Some(_), false) => CacheState::Clean,
            (Some(_), true) => CacheState::Dirty,
        }
    }

    fn mapping(&mut self) -> &mut PersistedMapping {
        let Self { source, config, mapping, .. } = self;
        mapping.get_or_insert_with(|| load(&*source, &config.cookie_name))
    }

    fn build_cookie(&self, value: String) -> Cookie<'static> {
        Cookie::build((self.config.cookie_name.clone(), value))
            .path("/")
            .expires(self.expires)
            .build()
    }

    fn persist(&mut self) -> Result<(), PersistenceError> {
        let keys = self.mapping().len();
        let value = codec::encode(self.mapping())?;
        let cookie = self.build_cookie(value);

        let size = cookie.encoded().to_string().len();
        if size > MAX_COOKIE_SIZE {
            warn!(cookie_name = %self.config.cookie_name, size, limit = MAX_COOKIE_SIZE, "cookie exceeds common browser size limit");
        }
        debug!(cookie_name = %self.config.cookie_name, strategy = %self.writer.strategy(), keys, "writing cookie");

        self.writer.write_cookie(cookie)?;
        self.dirty = true;
        Ok(())
    }
}

fn expiry_after(now: OffsetDateTime, length: std::time::Duration) -> OffsetDateTime {
    let length = time::Duration::try_from(length.min(MAX_COOKIE_LENGTH)).unwrap_or(time::Duration::ZERO);
    now.checked_add(length).unwrap_or(now)
}

fn load<S: CookieSource>(source: &S, cookie_name: &str) -> PersistedMapping {
    let Some(raw) = source.cookie_value(cookie_name) else {
        debug!(cookie_name, "no cookie on request");
        return PersistedMapping::new();
    };
    match codec::try_decode(&raw) {
        Ok(mapping) => {
            debug!(cookie_name, keys = mapping.len(), "cookie loaded");
            mapping
        }
        Err(e) => {
            warn!(cookie_name, error = %e, "unreadable cookie, starting empty");
            PersistedMapping::new()
        }
    }
}

impl<S: CookieSource, W: CookieWriter> Persistence for CookieStore<S, W> {
    fn get(&mut self, key: &str) -> Option<Value> {
        self.mapping().get(key).cloned()
    }

    fn set(&mut self, key: &str, value: Value) -> Result<(), PersistenceError> {
        self.mapping().insert(key.to_string(), value);
        self.persist()
    }

    fn delete(&mut self, key: &str) -> Result<(), PersistenceError> {
        self.mapping().shift_remove(key);
        self.persist()
    }

    fn keys(&mut self) -> Vec<String> {
        self.mapping().keys().cloned().collect()
    }
}
