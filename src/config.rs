use std::env;
use std::net::SocketAddr;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid value for {key}: {value}")]
    Invalid { key: &'static str, value: String },
}

/// Runtime settings, read once at startup from the environment.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_path: String,
    pub schema_path: String,
    pub bind_addr: SocketAddr,
    pub max_workers: usize,
    pub erp: ErpConfig,
    pub functions: FunctionsConfig,
}

#[derive(Debug, Clone)]
pub struct ErpConfig {
    pub base_url: String,
    pub api_key: String,
    pub security_key: String,
}

/// Serverless mail/SMS functions of the hosted backend.
#[derive(Debug, Clone)]
pub struct FunctionsConfig {
    pub base_url: String,
    pub api_key: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            database_path: "crm.sqlite3".to_string(),
            schema_path: "sql/schema.sql".to_string(),
            bind_addr: SocketAddr::from(([127, 0, 0, 1], 3000)),
            max_workers: 8,
            erp: ErpConfig {
                base_url: "https://api.extrabat.com".to_string(),
                api_key: String::new(),
                security_key: String::new(),
            },
            functions: FunctionsConfig {
                base_url: "http://localhost:54321/functions/v1".to_string(),
                api_key: String::new(),
            },
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the config from any key lookup; unset keys keep their defaults.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut cfg = Self::default();

        if let Some(v) = lookup("DATABASE_PATH") {
            cfg.database_path = v;
        }
        if let Some(v) = lookup("SCHEMA_PATH") {
            cfg.schema_path = v;
        }
        if let Some(v) = lookup("BIND_ADDR") {
            cfg.bind_addr = v.parse().map_err(|_| ConfigError::Invalid {
                key: "BIND_ADDR",
                value: v.clone(),
            })?;
        }
        if let Some(v) = lookup("MAX_WORKERS") {
            cfg.max_workers = match v.parse::<usize>() {
                Ok(n) if n > 0 => n,
                _ => {
                    return Err(ConfigError::Invalid {
                        key: "MAX_WORKERS",
                        value: v,
                    })
                }
            };
        }
        if let Some(v) = lookup("EXTRABAT_API_URL") {
            cfg.erp.base_url = v.trim_end_matches('/').to_string();
        }
        if let Some(v) = lookup("EXTRABAT_API_KEY") {
            cfg.erp.api_key = v;
        }
        if let Some(v) = lookup("EXTRABAT_SECURITY_KEY") {
            cfg.erp.security_key = v;
        }
        if let Some(v) = lookup("FUNCTIONS_URL") {
            cfg.functions.base_url = v.trim_end_matches('/').to_string();
        }
        if let Some(v) = lookup("FUNCTIONS_KEY") {
            cfg.functions.api_key = v;
        }

        Ok(cfg)
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
    fn defaults_apply_when_nothing_is_set() {
        let cfg = AppConfig::from_lookup(|_| None).unwrap();
        assert_eq!(cfg.database_path, "crm.sqlite3");
        assert_eq!(cfg.max_workers, 8);
        assert_eq!(cfg.bind_addr.port(), 3000);
    }

    #[test]
    fn urls_lose_trailing_slash() {
        let cfg = AppConfig::from_lookup(lookup_from(&[
            ("EXTRABAT_API_URL", "https://erp.example.com/"),
            ("FUNCTIONS_URL", "https://fn.example.com/functions/v1/"),
        ]))
        .unwrap();
        assert_eq!(cfg.erp.base_url, "https://erp.example.com");
        assert_eq!(cfg.functions.base_url, "https://fn.example.com/functions/v1");
    }

    #[test]
    fn bad_worker_count_is_rejected() {
        let err = AppConfig::from_lookup(lookup_from(&[("MAX_WORKERS", "0")])).unwrap_err();
        assert!(err.to_string().contains("MAX_WORKERS"));
    }

    #[test]
    fn bad_bind_addr_is_rejected() {
        assert!(AppConfig::from_lookup(lookup_from(&[("BIND_ADDR", "nowhere")])).is_err());
    }
}
