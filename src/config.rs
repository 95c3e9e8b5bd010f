use std::time::Duration;

use anyhow::{bail, Context};
use lazy_static::lazy_static;
use regex::Regex;
use serde::Deserialize;

/// Secret used when `JWT_SECRET` is unset. Only tolerated outside production.
pub const INSECURE_DEV_SECRET: &str = "dev_secret_change_me";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    Development,
    Production,
}

impl Environment {
    fn parse(raw: Option<&str>) -> Self {
        match raw.map(|v| v.trim().to_ascii_lowercase()) {
            Some(v) if v == "production" || v == "prod" => Environment::Production,
            _ => Environment::Development,
        }
    }

    pub fn is_production(self) -> bool {
        self == Environment::Production
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct JwtConfig {
    pub secret: String,
    pub ttl: Duration,
    /// True when `secret` is the built-in development fallback.
    pub insecure_default: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct S3Config {
    pub endpoint: String,
    pub bucket: String,
    pub access_key: String,
    pub secret_key: String,
    pub region: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub database_url: String,
    pub environment: Environment,
    pub jwt: JwtConfig,
    /// Argon2 iteration count; `None` keeps the library default.
    pub password_cost: Option<u32>,
    /// Origins allowed to make credentialed requests; empty means permissive CORS.
    pub cors_origins: Vec<String>,
    pub s3: S3Config,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from any key lookup so tests don't have to mutate the
    /// process environment.
    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |key: &str| lookup(key).with_context(|| format!("{key} must be set"));

        let environment = Environment::parse(
            lookup("APP_ENV").or_else(|| lookup("NODE_ENV")).as_deref(),
        );

        let (secret, insecure_default) = match lookup("JWT_SECRET").filter(|s| !s.is_empty()) {
            Some(secret) => (secret, false),
            None if environment.is_production() => {
                bail!("JWT_SECRET must be set when running in production")
            }
            None => (INSECURE_DEV_SECRET.to_string(), true),
        };

        let ttl = match lookup("JWT_EXPIRES_IN") {
            Some(raw) => parse_duration(&raw)
                .with_context(|| format!("invalid JWT_EXPIRES_IN value {raw:?}"))?,
            None => Duration::from_secs(60 * 60),
        };

        let password_cost = match lookup("PASSWORD_HASH_COST") {
            Some(raw) => {
                let cost = raw
                    .trim()
                    .parse::<u32>()
                    .with_context(|| format!("invalid PASSWORD_HASH_COST value {raw:?}"))?;
                if cost == 0 {
                    bail!("PASSWORD_HASH_COST must be at least 1");
                }
                Some(cost)
            }
            None => None,
        };

        let cors_origins = lookup("CORS_ORIGINS")
            .map(|raw| {
                raw.split(',')
                    .map(|o| o.trim().to_string())
                    .filter(|o| !o.is_empty())
                    .collect()
            })
            .unwrap_or_default();

        let s3 = S3Config {
            endpoint: required("S3_ENDPOINT")?,
            bucket: required("S3_BUCKET")?,
            access_key: required("S3_ACCESS_KEY")?,
            secret_key: required("S3_SECRET_KEY")?,
            region: lookup("S3_REGION").unwrap_or_else(|| "us-east-1".into()),
        };

        Ok(Self {
            database_url: required("DATABASE_URL")?,
            environment,
            jwt: JwtConfig {
                secret,
                ttl,
                insecure_default,
            },
            password_cost,
            cors_origins,
            s3,
        })
    }
}

const YEAR_SECS: u64 = 31_557_600;

/// Longest token lifetime `JWT_EXPIRES_IN` may ask for.
pub const MAX_TOKEN_TTL: Duration = Duration::from_secs(10 * YEAR_SECS);

/// Parses a token lifetime written the way JWT tooling spells `expiresIn`: a
/// number with an optional unit (`"3600"`, `"30m"`, `"1.5h"`, `"2 days"`,
/// `"1y"`). A bare number is seconds. The result must lie between one second
/// and `MAX_TOKEN_TTL`.
pub fn parse_duration(raw: &str) -> anyhow::Result<Duration> {
    lazy_static! {
        static ref DURATION_RE: Regex =
            Regex::new(r"^(\d+(?:\.\d+)?|\.\d+)\s*([a-z]*)$").unwrap();
    }
    let raw = raw.trim().to_ascii_lowercase();
    let caps = DURATION_RE
        .captures(&raw)
        .with_context(|| format!("unrecognised duration {raw:?}"))?;
    let amount: f64 = caps[1].parse().context("duration amount out of range")?;
    let unit_ms = match &caps[2] {
        "ms" | "msec" | "msecs" | "millisecond" | "milliseconds" => 1.0,
        "" | "s" | "sec" | "secs" | "second" | "seconds" => 1_000.0,
        "m" | "min" | "mins" | "minute" | "minutes" => 60_000.0,
        "h" | "hr" | "hrs" | "hour" | "hours" => 3_600_000.0,
        "d" | "day" | "days" => 86_400_000.0,
        "w" | "week" | "weeks" => 604_800_000.0,
        "y" | "yr" | "yrs" | "year" | "years" => YEAR_SECS as f64 * 1_000.0,
        other => bail!("unknown duration unit {other:?}"),
    };
    let secs = amount * unit_ms / 1_000.0;
    if secs < 1.0 {
        bail!("duration must be at least one second");
    }
    if secs > MAX_TOKEN_TTL.as_secs_f64() {
        bail!("duration must not exceed {} seconds", MAX_TOKEN_TTL.as_secs());
    }
    Ok(Duration::from_secs_f64(secs))
}
