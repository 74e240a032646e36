//! Server configuration

use std::path::PathBuf;

pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

const DEFAULT_GEMINI_MODEL: &str = "gemini-2.0-flash";
const DEFAULT_GEMINI_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

/// AFIP credentials and connection settings
#[derive(Debug, Clone)]
pub struct AfipSettings {
    /// CUIT the certificate was issued to
    pub cuit: u64,
    /// Certificate PEM content (env: AFIP_CERT_PEM) or file path (env: AFIP_CERT_PATH)
    pub cert_pem: Option<String>,
    pub cert_path: PathBuf,
    /// Private key PEM content (env: AFIP_KEY_PEM) or file path (env: AFIP_KEY_PATH)
    pub key_pem: Option<String>,
    pub key_path: PathBuf,
    /// Use the production endpoints instead of homologación
    pub production: bool,
    /// Where access tickets are cached between restarts
    pub ticket_dir: PathBuf,
    pub max_retries: u32,
}

/// Gemini proxy settings
#[derive(Clone)]
pub struct GeminiSettings {
    pub api_key: String,
    pub model: String,
    pub api_url: String,
}

impl std::fmt::Debug for GeminiSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeminiSettings")
            .field("api_key", &"<redacted>")
            .field("model", &self.model)
            .field("api_url", &self.api_url)
            .finish()
    }
}

/// Server configuration
#[derive(Debug, Clone)]
pub struct Config {
    pub http_port: u16,
    /// Directory holding the redb database
    pub data_dir: PathBuf,
    /// Environment: development | staging | production
    pub environment: String,
    /// HS256 secret for bearer tokens
    pub jwt_secret: String,
    /// `None` when AFIP_CUIT is unset; invoice routes answer with a config error
    pub afip: Option<AfipSettings>,
    /// `None` when GEMINI_API_KEY is unset
    pub gemini: Option<GeminiSettings>,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, BoxError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load configuration from an arbitrary variable source
    pub fn from_lookup<F>(var: F) -> Result<Self, BoxError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |name: &str| var(name).filter(|v| !v.trim().is_empty());
        let environment = non_empty("ENVIRONMENT").unwrap_or_else(|| "development".into());
        let data_dir = PathBuf::from(non_empty("DATA_DIR").unwrap_or_else(|| "data".into()));

        let afip = match non_empty("AFIP_CUIT") {
            Some(raw) => {
                let cuit = parse_cuit(&raw)?;
                Some(AfipSettings {
                    cuit,
                    cert_pem: non_empty("AFIP_CERT_PEM"),
                    cert_path: non_empty("AFIP_CERT_PATH")
                        .map(PathBuf::from)
                        .unwrap_or_else(|| data_dir.join("afip/cert.pem")),
                    key_pem: non_empty("AFIP_KEY_PEM"),
                    key_path: non_empty("AFIP_KEY_PATH")
                        .map(PathBuf::from)
                        .unwrap_or_else(|| data_dir.join("afip/key.pem")),
                    production: non_empty("AFIP_PRODUCTION")
                        .map(|v| parse_flag(&v))
                        .unwrap_or(false),
                    ticket_dir: non_empty("AFIP_TICKET_DIR")
                        .map(PathBuf::from)
                        .unwrap_or_else(|| data_dir.join("afip/tickets")),
                    max_retries: non_empty("AFIP_MAX_RETRIES")
                        .and_then(|v| v.parse().ok())
                        .unwrap_or(3),
                })
            }
            None => None,
        };

        let gemini = non_empty("GEMINI_API_KEY").map(|api_key| GeminiSettings {
            api_key,
            model: non_empty("GEMINI_MODEL").unwrap_or_else(|| DEFAULT_GEMINI_MODEL.into()),
            api_url: non_empty("GEMINI_API_URL").unwrap_or_else(|| DEFAULT_GEMINI_URL.into()),
        });

        Ok(Self {
            http_port: non_empty("HTTP_PORT")
                .and_then(|p| p.parse().ok())
                .unwrap_or(8080),
            jwt_secret: require_secret(var("JWT_SECRET"), "JWT_SECRET", &environment)?,
            data_dir,
            environment,
            afip,
            gemini,
        })
    }

    pub fn database_path(&self) -> PathBuf {
        self.data_dir.join("gestion.redb")
    }
}

/// Require a secret: must be set and non-empty outside development.
fn require_secret(value: Option<String>, name: &str, environment: &str) -> Result<String, BoxError> {
    let val = match value {
        Some(v) => v,
        None => {
            if environment != "development" {
                return Err(format!("{name} must be set in {environment} environment").into());
            }
            format!("dev-{name}-not-for-production")
        }
    };
    if val.is_empty() && environment != "development" {
        return Err(format!("{name} must not be empty in {environment} environment").into());
    }
    Ok(val)
}

/// CUIT with or without dashes (`20-12345678-9`)
fn parse_cuit(raw: &str) -> Result<u64, BoxError> {
    let digits: String = raw.chars().filter(|c| *c != '-').collect();
    if digits.len() != 11 || !digits.chars().all(|c| c.is_ascii_digit()) {
        return Err(format!("AFIP_CUIT must be 11 digits, got {raw:?}").into());
    }
    Ok(digits.parse()?)
}

fn parse_flag(raw: &str) -> bool {
    matches!(
        raw.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn load(vars: &[(&str, &str)]) -> Result<Config, BoxError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|name| vars.get(name).cloned())
    }

    #[test]
    fn test_defaults_in_development() {
        let config = load(&[]).unwrap();
        assert_eq!(config.http_port, 8080);
        assert_eq!(config.environment, "development");
        assert_eq!(config.database_path(), PathBuf::from("data/gestion.redb"));
        assert!(config.jwt_secret.starts_with("dev-"));
        assert!(config.afip.is_none());
        assert!(config.gemini.is_none());
    }

    #[test]
    fn test_production_requires_jwt_secret() {
        assert!(load(&[("ENVIRONMENT", "production")]).is_err());
        let config = load(&[("ENVIRONMENT", "production"), ("JWT_SECRET", "s3cret")]).unwrap();
        assert_eq!(config.jwt_secret, "s3cret");
    }

    #[test]
    fn test_afip_settings() {
        let config = load(&[
            ("DATA_DIR", "/var/lib/gestion"),
            ("AFIP_CUIT", "20-12345678-9"),
            ("AFIP_PRODUCTION", "true"),
            ("AFIP_MAX_RETRIES", "5"),
        ])
        .unwrap();
        let afip = config.afip.unwrap();
        assert_eq!(afip.cuit, 20123456789);
        assert!(afip.production);
        assert_eq!(afip.max_retries, 5);
        assert_eq!(afip.cert_path, PathBuf::from("/var/lib/gestion/afip/cert.pem"));
        assert_eq!(afip.ticket_dir, PathBuf::from("/var/lib/gestion/afip/tickets"));
    }

    #[test]
    fn test_bad_cuit_is_rejected() {
        assert!(load(&[("AFIP_CUIT", "2012345678")]).is_err());
        assert!(load(&[("AFIP_CUIT", "20x23456789")]).is_err());
    }

    #[test]
    fn test_gemini_settings() {
        let config = load(&[("GEMINI_API_KEY", "k")]).unwrap();
        let gemini = config.gemini.unwrap();
        assert_eq!(gemini.model, DEFAULT_GEMINI_MODEL);
        assert_eq!(gemini.api_url, DEFAULT_GEMINI_URL);
        assert!(!format!("{gemini:?}").contains("\"k\""));
    }
}
