use std::env;
use std::path::PathBuf;

use chrono::Duration;

/// How a transaction's signed amount is accumulated into a budget item's `spent`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SpentConvention {
    /// `spent` accumulates the raw signed amount, so an outflow of -2500
    /// lowers `spent` by 2500 and raises `available` by the same.
    #[default]
    Signed,
    /// `spent` accumulates the negated amount, so outflows raise `spent`.
    Outflow,
}

impl SpentConvention {
    pub fn as_str(&self) -> &'static str {
        match self {
            SpentConvention::Signed => "signed",
            SpentConvention::Outflow => "outflow",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "signed" => Some(SpentConvention::Signed),
            "outflow" => Some(SpentConvention::Outflow),
            _ => None,
        }
    }

    /// The amount a transaction adds to `spent`, or `None` if negating it
    /// would overflow.
    pub fn contribution(&self, transaction_amount: i64) -> Option<i64> {
        match self {
            SpentConvention::Signed => Some(transaction_amount),
            SpentConvention::Outflow => transaction_amount.checked_neg(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub database_path: PathBuf,
    pub migrations_path: PathBuf,
    pub access_token_ttl: Duration,
    pub refresh_token_ttl: Duration,
    pub spent_convention: SpentConvention,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".into(),
            port: 7070,
            database_path: PathBuf::from("data/envelope.db"),
            migrations_path: PathBuf::from("migrations"),
            access_token_ttl: Duration::minutes(15),
            refresh_token_ttl: Duration::days(7),
            spent_convention: SpentConvention::Signed,
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();

        let defaults = Self::default();

        let spent_convention = match env::var("ENVELOPE_SPENT_CONVENTION") {
            Ok(value) => SpentConvention::parse(&value).unwrap_or_else(|| {
                panic!(
                    "Invalid ENVELOPE_SPENT_CONVENTION '{}': expected 'signed' or 'outflow'",
                    value
                )
            }),
            Err(_) => defaults.spent_convention,
        };

        Self {
            host: env::var("ENVELOPE_HOST").unwrap_or(defaults.host),
            port: env::var("ENVELOPE_PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(defaults.port),
            database_path: env::var("ENVELOPE_DATABASE_URL")
                .map(|v| {
                    PathBuf::from(
                        v.strip_prefix("sqlite://")
                            .or_else(|| v.strip_prefix("sqlite:"))
                            .unwrap_or(&v),
                    )
                })
                .unwrap_or(defaults.database_path),
            migrations_path: env::var("ENVELOPE_MIGRATIONS_PATH")
                .map(PathBuf::from)
                .unwrap_or(defaults.migrations_path),
            access_token_ttl: env::var("ENVELOPE_ACCESS_TOKEN_TTL_MINUTES")
                .ok()
                .and_then(|v| v.parse().ok())
                .map(Duration::minutes)
                .unwrap_or(defaults.access_token_ttl),
            refresh_token_ttl: env::var("ENVELOPE_REFRESH_TOKEN_TTL_DAYS")
                .ok()
                .and_then(|v| v.parse().ok())
                .map(Duration::days)
                .unwrap_or(defaults.refresh_token_ttl),
            spent_convention,
        }
    }

    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
