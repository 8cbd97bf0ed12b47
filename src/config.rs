use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{name} must be {expected}, got {value:?}")]
    Invalid {
        name: &'static str,
        expected: &'static str,
        value: String,
    },
}

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub mongodb_uri: String,
    pub database_name: String,
    pub files_dir: PathBuf,
    pub cors_origin: Option<String>,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the configuration from an arbitrary key lookup. Empty values
    /// count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        let port = match get("PORT") {
            Some(raw) => raw.trim().parse::<u16>().map_err(|_| ConfigError::Invalid {
                name: "PORT",
                expected: "a port number",
                value: raw,
            })?,
            None => 8000,
        };

        Ok(AppConfig {
            host: get("HOST").unwrap_or_else(|| String::from("127.0.0.1")),
            port,
            mongodb_uri: get("MONGODB_URI")
                .unwrap_or_else(|| String::from("mongodb://localhost:27017")),
            database_name: get("MONGODB_DATABASE")
                .unwrap_or_else(|| String::from("control_obras")),
            files_dir: PathBuf::from(get("FILES_DIR").unwrap_or_else(|| String::from("./files"))),
            cors_origin: get("CORS_ORIGIN"),
        })
    }

    pub fn photos_dir(&self) -> PathBuf {
        self.files_dir.join("photos")
    }

    pub fn receipts_dir(&self) -> PathBuf {
        self.files_dir.join("receipts")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_when_nothing_is_set() {
        let config = AppConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config.host, "127.0.0.1");
        assert_eq!(config.port, 8000);
        assert_eq!(config.mongodb_uri, "mongodb://localhost:27017");
        assert_eq!(config.database_name, "control_obras");
        assert_eq!(config.photos_dir(), PathBuf::from("./files/photos"));
        assert!(config.cors_origin.is_none());
    }

    #[test]
    fn reads_overrides() {
        let config = AppConfig::from_lookup(lookup(&[
            ("PORT", "9090"),
            ("FILES_DIR", "/srv/obras"),
            ("CORS_ORIGIN", "https://panel.example.com"),
            ("HOST", "  "),
        ]))
        .unwrap();
        assert_eq!(config.port, 9090);
        assert_eq!(config.host, "127.0.0.1");
        assert_eq!(config.receipts_dir(), PathBuf::from("/srv/obras/receipts"));
        assert_eq!(
            config.cors_origin.as_deref(),
            Some("https://panel.example.com")
        );
    }

    #[test]
    fn rejects_bad_port() {
        let result = AppConfig::from_lookup(lookup(&[("PORT", "eighty")]));
        assert_matches!(result, Err(ConfigError::Invalid { name: "PORT", .. }));
    }
}
