//! Cookie-backed persistence for experiment assignments.
//! - `codec`: mapping <-> compact JSON, tolerant of garbage input.
//! - `adapter`: [`CookieStore`], a get/set/delete/keys view over one cookie.
//! - `writer`: framework-native and raw-header strategies for staging it.
//! - `source`: request-side cookie lookup.
//! - `config`: injected settings plus the process-wide default.

pub mod adapter;
pub mod codec;
pub mod config;
pub mod errors;
pub mod source;
pub mod writer;

pub use adapter::{CacheState, CookieStore, Persistence, MAX_COOKIE_SIZE};
pub use codec::{decode, encode, PersistedMapping};
pub use config::{reset_config, with_config, ConfigOverrides, CookieStoreConfig};
pub use errors::PersistenceError;
pub use source::CookieSource;
pub use writer::{CookieWriter, HeaderWriter, JarWriter, ResponseCookies, WriteStrategy};
