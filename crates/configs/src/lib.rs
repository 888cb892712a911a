use anyhow::Result;
use serde::Deserialize;
use anyhow::anyhow;

pub const DEFAULT_COOKIE_NAME: &str = "split";
/// One year, in seconds.
pub const DEFAULT_COOKIE_LENGTH_SECS: u64 = 31_536_000;
/// Upper bound on the cookie lifetime: one hundred years, in seconds.
pub const MAX_COOKIE_LENGTH_SECS: u64 = 100 * DEFAULT_COOKIE_LENGTH_SECS;

pub const COOKIE_NAME_ENV: &str = "SPLIT_COOKIE_NAME";
pub const COOKIE_LENGTH_ENV: &str = "SPLIT_COOKIE_LENGTH_SECS";

#[derive(Debug, Clone, Deserialize, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub persistence: PersistenceConfig,
}

/// Settings for the cookie that carries experiment assignments.
#[derive(Debug, Clone, Deserialize)]
pub struct PersistenceConfig {
    #[serde(default)]
    pub cookie_name: String,
    #[serde(default)]
    pub cookie_length_secs: Option<u64>,
}

impl Default for PersistenceConfig {
    fn default() -> Self {
        Self {
            cookie_name: DEFAULT_COOKIE_NAME.into(),
            cookie_length_secs: Some(DEFAULT_COOKIE_LENGTH_SECS),
        }
    }
}

pub fn load_default() -> Result<AppConfig> {
    dotenvy::dotenv().ok();
    let path = std::env::var("CONFIG_PATH").unwrap_or_else(|_| "config.toml".to_string());
    load_from_file(&path)
}

pub fn load_from_file(path: &str) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path)?;
    load_from_str(&content)
}

pub fn load_from_str(content: &str) -> Result<AppConfig> {
    let cfg: AppConfig = toml::from_str(content)?;
    Ok(cfg)
}

impl AppConfig {
    pub fn load_and_validate() -> Result<Self> {
        let mut cfg = load_default()?;
        cfg.normalize_and_validate()?;
        Ok(cfg)
    }

    pub fn normalize_and_validate(&mut self) -> Result<()> {
        self.persistence.normalize_with(|key| std::env::var(key).ok());
        self.persistence.validate()
    }
}

impl PersistenceConfig {
    /// Fill values the TOML left out, first from `lookup` (normally the
    /// process environment), then from the built-in defaults.
    pub fn normalize_with<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        self.cookie_name = self.cookie_name.trim().to_string();
        if self.cookie_name.is_empty() {
            self.cookie_name = lookup(COOKIE_NAME_ENV)
                .map(|name| name.trim().to_string())
                .filter(|name| !name.is_empty())
                .unwrap_or_else(|| DEFAULT_COOKIE_NAME.to_string());
        }
        if self.cookie_length_secs.is_none() {
            let from_env = lookup(COOKIE_LENGTH_ENV).and_then(|v| v.trim().parse::<u64>().ok());
            self.cookie_length_secs = Some(from_env.unwrap_or(DEFAULT_COOKIE_LENGTH_SECS));
        }
    }

    pub fn validate(&self) -> Result<()> {
        if !is_valid_cookie_name(&self.cookie_name) {
            return Err(anyhow!(
                "persistence.cookie_name {:?} is not a valid cookie name",
                self.cookie_name
            ));
        }
        match self.cookie_length_secs {
            Some(0) => Err(anyhow!("persistence.cookie_length_secs must be >= 1")),
            Some(secs) if secs > MAX_COOKIE_LENGTH_SECS => Err(anyhow!(
                "persistence.cookie_length_secs must be <= {MAX_COOKIE_LENGTH_SECS}"
            )),
            _ => Ok(()),
        }
    }

    pub fn cookie_length_secs(&self) -> u64 {
        self.cookie_length_secs.unwrap_or(DEFAULT_COOKIE_LENGTH_SECS)
    }
}

/// RFC 6265 `cookie-name`: a non-empty HTTP token.
pub fn is_valid_cookie_name(name: &str) -> bool {
    !name.is_empty()
        && name.bytes().all(|b| {
            b.is_ascii_graphic()
                && !matches!(
                    b,
                    b'(' | b')' | b'<' | b'>' | b'@' | b',' | b';' | b':' | b'\\' | b'"'
                        | b'/' | b'[' | b']' | b'?' | b'=' | b'{' | b'}'
                )
        })
}
