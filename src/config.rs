use log::warn;
use std::env;
use std::str::FromStr;

const DEFAULT_JWT_SECRET: &str = "secure_jwt_secret_key_12345";

/// Runtime settings, read once from the environment at startup.
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub database_max_connections: u32,
    pub jwt_secret: String,
    pub token_ttl_hours: i64,
    pub bcrypt_cost: u32,
    pub host: String,
    pub port: u16,
    pub cors_allowed_origins: Vec<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database_url: "sqlite://videoflow.db".to_string(),
            database_max_connections: 5,
            jwt_secret: DEFAULT_JWT_SECRET.to_string(),
            token_ttl_hours: 24,
            bcrypt_cost: bcrypt::DEFAULT_COST,
            host: "0.0.0.0".to_string(),
            port: 5050,
            cors_allowed_origins: vec!["http://localhost:3000".to_string()],
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Config::default();

        let jwt_secret = lookup("JWT_SECRET").unwrap_or_else(|| {
            warn!("JWT_SECRET not set, falling back to the development secret");
            defaults.jwt_secret.clone()
        });

        let cors_allowed_origins = lookup("CORS_ALLOWED_ORIGINS")
            .map(|origins| {
                origins
                    .split(',')
                    .map(|origin| origin.trim().to_string())
                    .filter(|origin| !origin.is_empty())
                    .collect()
            })
            .unwrap_or(defaults.cors_allowed_origins);

        Self {
            database_url: lookup("DATABASE_URL").unwrap_or(defaults.database_url),
            database_max_connections: parse_or(
                &lookup,
                "DATABASE_MAX_CONNECTIONS",
                defaults.database_max_connections,
            ),
            jwt_secret,
            token_ttl_hours: parse_or(&lookup, "TOKEN_TTL_HOURS", defaults.token_ttl_hours),
            bcrypt_cost: parse_or(&lookup, "BCRYPT_COST", defaults.bcrypt_cost),
            host: lookup("HOST").unwrap_or(defaults.host),
            port: parse_or(&lookup, "PORT", defaults.port),
            cors_allowed_origins,
        }
    }
}

fn parse_or<F, T>(lookup: &F, key: &str, default: T) -> T
where
    F: Fn(&str) -> Option<String>,
    T: FromStr + std::fmt::Display,
{
    match lookup(key) {
        Some(raw) => raw.trim().parse().unwrap_or_else(|_| {
            warn!("Invalid value {:?} for {}, using {}", raw, key, default);
            default
        }),
        None => default,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn missing_variables_use_defaults() {
        let config = Config::from_lookup(lookup_from(&[]));
        assert_eq!(config.port, 5050);
        assert_eq!(config.token_ttl_hours, 24);
        assert_eq!(config.database_url, "sqlite://videoflow.db");
        assert_eq!(config.cors_allowed_origins, vec!["http://localhost:3000"]);
    }

    #[test]
    fn reads_overrides_and_splits_origins() {
        let config = Config::from_lookup(lookup_from(&[
            ("PORT", "8081"),
            ("BCRYPT_COST", "4"),
            ("JWT_SECRET", "s3cret"),
            ("CORS_ALLOWED_ORIGINS", "http://a.test, http://b.test,"),
        ]));
        assert_eq!(config.port, 8081);
        assert_eq!(config.bcrypt_cost, 4);
        assert_eq!(config.jwt_secret, "s3cret");
        assert_eq!(
            config.cors_allowed_origins,
            vec!["http://a.test", "http://b.test"]
        );
    }

    #[test]
    fn unparseable_numbers_fall_back() {
        let config = Config::from_lookup(lookup_from(&[("PORT", "http"), ("TOKEN_TTL_HOURS", "")]));
        assert_eq!(config.port, 5050);
        assert_eq!(config.token_ttl_hours, 24);
    }
}
