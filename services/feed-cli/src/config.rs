//! Configuration types and loading
//!
//! Config precedence: env vars > config file > defaults.
//! The secret key is loaded from UNSPLASH_SECRET_KEY or secret_key_file,
//! never stored in the TOML directly to avoid leaking secrets.

use common::Secret;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use unsplash_auth::{
    AUTHORIZE_ENDPOINT, DEFAULT_API_BASE, OAuthConfig, REDIRECT_URI, SCOPES, TOKEN_ENDPOINT,
};

/// Root configuration
#[derive(Debug, Deserialize)]
pub struct Config {
    pub oauth: OAuthSection,
    #[serde(default)]
    pub api: ApiSection,
    #[serde(default)]
    pub storage: StorageSection,
}

/// Application credentials registered with the photo service
#[derive(Debug, Deserialize)]
pub struct OAuthSection {
    /// Public "access key"; UNSPLASH_ACCESS_KEY overrides it
    #[serde(default)]
    pub access_key: String,
    #[serde(skip)]
    pub secret_key: Option<Secret<String>>,
    /// Path to a file containing the secret key (alternative to UNSPLASH_SECRET_KEY)
    #[serde(default)]
    pub secret_key_file: Option<PathBuf>,
    #[serde(default = "default_redirect_uri")]
    pub redirect_uri: String,
    #[serde(default = "default_scope")]
    pub scope: String,
}

/// Endpoints; production unless overridden
#[derive(Debug, Deserialize)]
pub struct ApiSection {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_authorize_endpoint")]
    pub authorize_endpoint: String,
    #[serde(default = "default_token_endpoint")]
    pub token_endpoint: String,
}

/// Where the bearer token is persisted
#[derive(Debug, Deserialize)]
pub struct StorageSection {
    #[serde(default = "default_token_path")]
    pub token_path: PathBuf,
}

impl Default for ApiSection {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            authorize_endpoint: default_authorize_endpoint(),
            token_endpoint: default_token_endpoint(),
        }
    }
}

impl Default for StorageSection {
    fn default() -> Self {
        Self {
            token_path: default_token_path(),
        }
    }
}

fn default_redirect_uri() -> String {
    REDIRECT_URI.to_owned()
}

fn default_scope() -> String {
    SCOPES.to_owned()
}

fn default_base_url() -> String {
    DEFAULT_API_BASE.to_owned()
}

fn default_authorize_endpoint() -> String {
    AUTHORIZE_ENDPOINT.to_owned()
}

fn default_token_endpoint() -> String {
    TOKEN_ENDPOINT.to_owned()
}

fn default_token_path() -> PathBuf {
    PathBuf::from(".image-feed/credentials.json")
}

impl Config {
    /// Load configuration from a TOML file, then overlay environment variables.
    ///
    /// Secret key resolution order:
    /// 1. UNSPLASH_SECRET_KEY env var
    /// 2. secret_key_file path from config
    pub fn load(path: &Path) -> common::Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let mut config: Config = toml::from_str(&contents)?;

        if let Ok(key) = std::env::var("UNSPLASH_ACCESS_KEY") {
            config.oauth.access_key = key;
        }

        if let Ok(key) = std::env::var("UNSPLASH_SECRET_KEY") {
            config.oauth.secret_key = Some(Secret::new(key));
        } else if let Some(ref key_file) = config.oauth.secret_key_file {
            let key = std::fs::read_to_string(key_file).map_err(|e| {
                common::Error::Config(format!(
                    "failed to read secret_key_file {}: {e}",
                    key_file.display()
                ))
            })?;
            let key = key.trim().to_owned();
            if !key.is_empty() {
                config.oauth.secret_key = Some(Secret::new(key));
            }
        }

        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> common::Result<()> {
        for (name, url) in [
            ("api.base_url", &self.api.base_url),
            ("api.authorize_endpoint", &self.api.authorize_endpoint),
            ("api.token_endpoint", &self.api.token_endpoint),
        ] {
            if !url.starts_with("http://") && !url.starts_with("https://") {
                return Err(common::Error::Config(format!(
                    "{name} must start with http:// or https://, got: {url}"
                )));
            }
        }

        if self.oauth.access_key.trim().is_empty() {
            return Err(common::Error::Config(
                "oauth.access_key must not be empty (set it in the file or UNSPLASH_ACCESS_KEY)"
                    .into(),
            ));
        }

        match &self.oauth.secret_key {
            Some(key) if !key.expose().is_empty() => Ok(()),
            _ => Err(common::Error::Config(
                "secret key missing: set UNSPLASH_SECRET_KEY or oauth.secret_key_file".into(),
            )),
        }
    }

    /// OAuth client settings for the exchange and the authorization URL.
    pub fn oauth_config(&self) -> common::Result<OAuthConfig> {
        let secret = self
            .oauth
            .secret_key
            .clone()
            .ok_or_else(|| common::Error::Config("secret key not loaded".into()))?;
        let mut config = OAuthConfig::new(self.oauth.access_key.clone(), secret);
        config.redirect_uri = self.oauth.redirect_uri.clone();
        config.scope = self.oauth.scope.clone();
        config.authorize_endpoint = self.api.authorize_endpoint.clone();
        config.token_endpoint = self.api.token_endpoint.clone();
        Ok(config)
    }

    /// Resolve config file path from CLI arg or CONFIG_PATH env var.
    pub fn resolve_path(cli_path: Option<&str>) -> PathBuf {
        if let Some(p) = cli_path {
            return PathBuf::from(p);
        }
        if let Ok(p) = std::env::var("CONFIG_PATH") {
            return PathBuf::from(p);
        }
        PathBuf::from("image-feed.toml")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    /// Serializes tests that mutate environment variables.
    static ENV_MUTEX: Mutex<()> = Mutex::new(());

    /// SAFETY: Callers must hold ENV_MUTEX to prevent concurrent env mutation.
    unsafe fn set_env(key: &str, val: &str) {
        unsafe { std::env::set_var(key, val) };
    }

    unsafe fn remove_env(key: &str) {
        unsafe { std::env::remove_var(key) };
    }

    fn clear_overrides() {
        unsafe {
            remove_env("UNSPLASH_ACCESS_KEY");
            remove_env("UNSPLASH_SECRET_KEY");
        }
    }

    fn write_config(dir: &tempfile::TempDir, contents: &str) -> PathBuf {
        let path = dir.path().join("image-feed.toml");
        std::fs::write(&path, contents).unwrap();
        path
    }

    fn with_key_file(dir: &tempfile::TempDir, key: &str) -> String {
        let key_path = dir.path().join("secret_key");
        std::fs::write(&key_path, key).unwrap();
        format!(
            r#"
[oauth]
access_key = "access-123"
secret_key_file = "{}"
"#,
            key_path.display()
        )
    }

    #[test]
    fn minimal_config_uses_production_defaults() {
        let _lock = ENV_MUTEX.lock().unwrap();
        clear_overrides();
        let dir = tempfile::tempdir().unwrap();
        let path = write_config(&dir, &with_key_file(&dir, "secret-456\n"));

        let config = Config::load(&path).unwrap();
        assert_eq!(config.oauth.access_key, "access-123");
        assert_eq!(config.oauth.secret_key.as_ref().unwrap().expose(), "secret-456");
        assert_eq!(config.oauth.redirect_uri, "urn:ietf:wg:oauth:2.0:oob");
        assert_eq!(config.oauth.scope, "public read_user write_likes");
        assert_eq!(config.api.base_url, "https://api.unsplash.com");
        assert_eq!(config.api.token_endpoint, "https://unsplash.com/oauth/token");
        assert_eq!(
            config.storage.token_path,
            PathBuf::from(".image-feed/credentials.json")
        );
    }

    #[test]
    fn overrides_in_file_are_honored() {
        let _lock = ENV_MUTEX.lock().unwrap();
        clear_overrides();
        let dir = tempfile::tempdir().unwrap();
        let mut contents = with_key_file(&dir, "secret");
        contents.push_str(
            r#"
[api]
base_url = "http://127.0.0.1:9000"
token_endpoint = "http://127.0.0.1:9000/oauth/token"

[storage]
token_path = "/tmp/feed/credentials.json"
"#,
        );
        let path = write_config(&dir, &contents);

        let config = Config::load(&path).unwrap();
        assert_eq!(config.api.base_url, "http://127.0.0.1:9000");
        assert_eq!(
            config.api.authorize_endpoint,
            "https://unsplash.com/oauth/authorize"
        );

        let oauth = config.oauth_config().unwrap();
        assert_eq!(oauth.client_id, "access-123");
        assert_eq!(oauth.token_endpoint, "http://127.0.0.1:9000/oauth/token");
        assert_eq!(oauth.client_secret.expose(), "secret");
    }

    #[test]
    fn env_vars_override_file() {
        let _lock = ENV_MUTEX.lock().unwrap();
        let dir = tempfile::tempdir().unwrap();
        let path = write_config(&dir, &with_key_file(&dir, "from-file"));

        unsafe {
            set_env("UNSPLASH_SECRET_KEY", "from-env");
            set_env("UNSPLASH_ACCESS_KEY", "access-env");
        }
        let config = Config::load(&path);
        clear_overrides();

        let config = config.unwrap();
        assert_eq!(config.oauth.secret_key.as_ref().unwrap().expose(), "from-env");
        assert_eq!(config.oauth.access_key, "access-env");
    }

    #[test]
    fn env_secret_wins_over_missing_file() {
        let _lock = ENV_MUTEX.lock().unwrap();
        let dir = tempfile::tempdir().unwrap();
        let path = write_config(
            &dir,
            r#"
[oauth]
access_key = "access"
secret_key_file = "/nonexistent/secret_key"
"#,
        );

        unsafe { set_env("UNSPLASH_SECRET_KEY", "env-secret") };
        let config = Config::load(&path);
        clear_overrides();
        assert!(config.is_ok(), "got {config:?}");
    }

    #[test]
    fn missing_secret_is_rejected() {
        let _lock = ENV_MUTEX.lock().unwrap();
        clear_overrides();
        let dir = tempfile::tempdir().unwrap();
        let path = write_config(&dir, "[oauth]\naccess_key = \"access\"\n");

        let err = Config::load(&path).unwrap_err().to_string();
        assert!(err.contains("secret key missing"), "got: {err}");
    }

    #[test]
    fn whitespace_only_secret_file_is_rejected() {
        let _lock = ENV_MUTEX.lock().unwrap();
        clear_overrides();
        let dir = tempfile::tempdir().unwrap();
        let path = write_config(&dir, &with_key_file(&dir, "  \n  "));

        assert!(Config::load(&path).is_err());
    }

    #[test]
    fn unreadable_secret_file_is_an_error() {
        let _lock = ENV_MUTEX.lock().unwrap();
        clear_overrides();
        let dir = tempfile::tempdir().unwrap();
        let path = write_config(
            &dir,
            r#"
[oauth]
access_key = "access"
secret_key_file = "/nonexistent/secret_key"
"#,
        );

        let err = Config::load(&path).unwrap_err().to_string();
        assert!(err.contains("secret_key_file"), "got: {err}");
    }

    #[test]
    fn empty_access_key_is_rejected() {
        let _lock = ENV_MUTEX.lock().unwrap();
        clear_overrides();
        let dir = tempfile::tempdir().unwrap();
        let contents = with_key_file(&dir, "secret").replace("access-123", "");
        let path = write_config(&dir, &contents);

        let err = Config::load(&path).unwrap_err().to_string();
        assert!(err.contains("access_key"), "got: {err}");
    }

    #[test]
    fn non_http_url_is_rejected() {
        let _lock = ENV_MUTEX.lock().unwrap();
        clear_overrides();
        let dir = tempfile::tempdir().unwrap();
        let mut contents = with_key_file(&dir, "secret");
        contents.push_str("\n[api]\nbase_url = \"api.unsplash.com\"\n");
        let path = write_config(&dir, &contents);

        let err = Config::load(&path).unwrap_err().to_string();
        assert!(
            err.contains("api.base_url must start with http"),
            "got: {err}"
        );
    }

    #[test]
    fn missing_file_and_bad_toml_fail() {
        assert!(Config::load(Path::new("/nonexistent/image-feed.toml")).is_err());

        let dir = tempfile::tempdir().unwrap();
        let path = write_config(&dir, "not valid {{{{ toml");
        assert!(Config::load(&path).is_err());
    }

    #[test]
    fn resolve_path_prefers_cli_then_env_then_default() {
        let _lock = ENV_MUTEX.lock().unwrap();
        unsafe { set_env("CONFIG_PATH", "/env/path.toml") };
        assert_eq!(
            Config::resolve_path(Some("/cli/wins.toml")),
            PathBuf::from("/cli/wins.toml")
        );
        assert_eq!(Config::resolve_path(None), PathBuf::from("/env/path.toml"));

        unsafe { remove_env("CONFIG_PATH") };
        assert_eq!(Config::resolve_path(None), PathBuf::from("image-feed.toml"));
    }
}
