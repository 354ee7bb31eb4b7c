//! Server Configuration
//!
//! Read from environment variables (after `.env` is loaded). Secrets may be
//! left unset only in debug builds, where random ones are generated.

use std::net::SocketAddr;
use std::time::Duration;

use anyhow::{Context, anyhow, bail};
use auth::{AuthConfig, SigningKeyRing};

const DEFAULT_BIND_ADDR: &str = "0.0.0.0:31113";
const DEFAULT_SESSION_TTL_SECS: u64 = 30 * 24 * 3600;
const DEFAULT_REAPER_INTERVAL_SECS: u64 = 300;
const DEFAULT_FRONTEND_ORIGINS: &str = "http://localhost:40922,http://127.0.0.1:40922";

/// Where sessions and users live
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreBackend {
    Memory,
    Postgres { database_url: String },
}

/// Seed user for the in-memory store
pub struct DevUser {
    pub identifier: String,
    pub password: String,
}

impl std::fmt::Debug for DevUser {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DevUser")
            .field("identifier", &self.identifier)
            .field("password", &"[REDACTED]")
            .finish()
    }
}

#[derive(Debug)]
pub struct ApiConfig {
    pub bind_addr: SocketAddr,
    pub backend: StoreBackend,
    pub auth: AuthConfig,
    pub reaper_interval: Duration,
    pub dev_user: Option<DevUser>,
    pub frontend_origins: Vec<String>,
}

impl ApiConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok(), cfg!(debug_assertions))
    }

    /// Build from any key lookup; `allow_insecure_defaults` permits random
    /// secrets and a non-Secure cookie default
    pub fn from_lookup<F>(lookup: F, allow_insecure_defaults: bool) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let bind_addr = get("BIND_ADDR")
            .unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string())
            .parse()
            .context("BIND_ADDR is not a socket address")?;

        let backend = match get("SESSION_STORE").as_deref().unwrap_or("memory") {
            "memory" => StoreBackend::Memory,
            "postgres" => StoreBackend::Postgres {
                database_url: get("DATABASE_URL")
                    .context("DATABASE_URL must be set when SESSION_STORE=postgres")?,
            },
            other => bail!("SESSION_STORE must be memory or postgres, got {other:?}"),
        };

        let base = if allow_insecure_defaults {
            AuthConfig::development()
        } else {
            AuthConfig::default()
        };

        let session_secret = match get("AUTH_SESSION_SECRET") {
            Some(encoded) => parse_secret(&encoded)?,
            None if allow_insecure_defaults => base.session_secret,
            None => bail!("AUTH_SESSION_SECRET must be set in production"),
        };

        let signing_keys = match get("AUTH_SIGNING_KEYS") {
            Some(entries) => SigningKeyRing::parse(&entries).context("AUTH_SIGNING_KEYS")?,
            None if allow_insecure_defaults => base.signing_keys.clone(),
            None => bail!("AUTH_SIGNING_KEYS must be set in production"),
        };

        let session_ttl = Duration::from_secs(parse_or(
            get("AUTH_SESSION_TTL_SECS"),
            DEFAULT_SESSION_TTL_SECS,
            "AUTH_SESSION_TTL_SECS",
        )?);
        if session_ttl.is_zero() {
            bail!("AUTH_SESSION_TTL_SECS must be positive");
        }

        let cookie_secure = parse_or(
            get("AUTH_COOKIE_SECURE"),
            !allow_insecure_defaults,
            "AUTH_COOKIE_SECURE",
        )?;

        let reaper_interval = Duration::from_secs(parse_or(
            get("AUTH_REAPER_INTERVAL_SECS"),
            DEFAULT_REAPER_INTERVAL_SECS,
            "AUTH_REAPER_INTERVAL_SECS",
        )?);

        let dev_user = get("AUTH_DEV_USER")
            .map(|raw| {
                raw.split_once(':')
                    .map(|(identifier, password)| DevUser {
                        identifier: identifier.to_string(),
                        password: password.to_string(),
                    })
                    .ok_or_else(|| anyhow!("AUTH_DEV_USER must look like identifier:password"))
            })
            .transpose()?;

        let frontend_origins = get("FRONTEND_ORIGINS")
            .unwrap_or_else(|| DEFAULT_FRONTEND_ORIGINS.to_string())
            .split(',')
            .map(str::trim)
            .filter(|origin| !origin.is_empty())
            .map(str::to_string)
            .collect();

        Ok(Self {
            bind_addr,
            backend,
            auth: AuthConfig {
                session_secret,
                session_ttl,
                cookie_secure,
                password_pepper: get("AUTH_PASSWORD_PEPPER").map(String::into_bytes),
                signing_keys,
                login_redirect: get("AUTH_LOGIN_REDIRECT"),
                ..base
            },
            reaper_interval,
            dev_user,
            frontend_origins,
        })
    }
}

fn parse_secret(encoded: &str) -> anyhow::Result<[u8; 32]> {
    let bytes = platform::crypto::from_base64(encoded.trim())
        .context("AUTH_SESSION_SECRET is not valid base64")?;
    bytes
        .try_into()
        .map_err(|_| anyhow!("AUTH_SESSION_SECRET must decode to exactly 32 bytes"))
}

fn parse_or<T>(value: Option<String>, default: T, name: &str) -> anyhow::Result<T>
where
    T: std::str::FromStr,
{
    match value {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|_| anyhow!("{name} has an invalid value: {raw:?}")),
        None => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    fn secret_b64() -> String {
        platform::crypto::to_base64(&[7u8; 32])
    }

    #[test]
    fn test_debug_defaults() {
        let config = ApiConfig::from_lookup(lookup(&[]), true).unwrap();
        assert_eq!(config.bind_addr.port(), 31113);
        assert_eq!(config.backend, StoreBackend::Memory);
        assert_eq!(config.auth.session_ttl, Duration::from_secs(2_592_000));
        assert!(!config.auth.cookie_secure);
        assert_eq!(config.reaper_interval, Duration::from_secs(300));
        assert_eq!(config.frontend_origins.len(), 2);
        assert!(config.dev_user.is_none());
    }

    #[test]
    fn test_production_requires_secrets() {
        assert!(ApiConfig::from_lookup(lookup(&[]), false).is_err());

        let keys = format!("k1:{}", secret_b64());
        let secret = secret_b64();
        let config = ApiConfig::from_lookup(
            lookup(&[
                ("AUTH_SESSION_SECRET", secret.as_str()),
                ("AUTH_SIGNING_KEYS", keys.as_str()),
            ]),
            false,
        )
        .unwrap();
        assert!(config.auth.cookie_secure);
        assert_eq!(config.auth.session_secret, [7u8; 32]);
        assert_eq!(config.auth.signing_keys.current().kid(), "k1");
    }

    #[test]
    fn test_postgres_requires_database_url() {
        assert!(ApiConfig::from_lookup(lookup(&[("SESSION_STORE", "postgres")]), true).is_err());

        let config = ApiConfig::from_lookup(
            lookup(&[
                ("SESSION_STORE", "postgres"),
                ("DATABASE_URL", "postgres://localhost/auth"),
            ]),
            true,
        )
        .unwrap();
        assert_eq!(
            config.backend,
            StoreBackend::Postgres {
                database_url: "postgres://localhost/auth".to_string()
            }
        );
    }

    #[test]
    fn test_rejects_bad_values() {
        for pairs in [
            &[("SESSION_STORE", "redis")][..],
            &[("AUTH_SESSION_SECRET", "c2hvcnQ=")][..],
            &[("AUTH_SESSION_TTL_SECS", "0")][..],
            &[("AUTH_SESSION_TTL_SECS", "soon")][..],
            &[("AUTH_COOKIE_SECURE", "maybe")][..],
            &[("AUTH_DEV_USER", "no-colon")][..],
            &[("BIND_ADDR", "nowhere")][..],
        ] {
            assert!(
                ApiConfig::from_lookup(lookup(pairs), true).is_err(),
                "{pairs:?} was accepted"
            );
        }
    }

    #[test]
    fn test_overrides() {
        let config = ApiConfig::from_lookup(
            lookup(&[
                ("BIND_ADDR", "127.0.0.1:8080"),
                ("AUTH_SESSION_TTL_SECS", "60"),
                ("AUTH_COOKIE_SECURE", "true"),
                ("AUTH_REAPER_INTERVAL_SECS", "0"),
                ("AUTH_LOGIN_REDIRECT", "/login.html"),
                ("AUTH_PASSWORD_PEPPER", "pepper"),
                ("AUTH_DEV_USER", "a@b.com:s3cret:with:colons"),
                ("FRONTEND_ORIGINS", "https://app.example, "),
            ]),
            true,
        )
        .unwrap();

        assert_eq!(config.bind_addr.port(), 8080);
        assert_eq!(config.auth.session_ttl, Duration::from_secs(60));
        assert!(config.auth.cookie_secure);
        assert!(config.reaper_interval.is_zero());
        assert_eq!(config.auth.login_redirect.as_deref(), Some("/login.html"));
        assert_eq!(config.auth.pepper(), Some(&b"pepper"[..]));
        let dev = config.dev_user.unwrap();
        assert_eq!(dev.identifier, "a@b.com");
        assert_eq!(dev.password, "s3cret:with:colons");
        assert_eq!(config.frontend_origins, vec!["https://app.example"]);
    }
}
