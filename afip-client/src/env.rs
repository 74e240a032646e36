//! AFIP environments and client settings

use std::time::Duration;

const WSAA_TESTING: &str = "https://wsaahomo.afip.gov.ar/ws/services/LoginCms";
const WSAA_PRODUCTION: &str = "https://wsaa.afip.gov.ar/ws/services/LoginCms";
const WSFE_TESTING: &str = "https://wswhomo.afip.gov.ar/wsfev1/service.asmx";
const WSFE_PRODUCTION: &str = "https://servicios1.afip.gov.ar/wsfev1/service.asmx";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Environment {
    /// Homologation
    #[default]
    Testing,
    Production,
}

impl Environment {
    pub fn from_flag(production: bool) -> Self {
        if production {
            Self::Production
        } else {
            Self::Testing
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Testing => "testing",
            Self::Production => "production",
        }
    }
}

/// Service URLs
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoints {
    pub wsaa: String,
    pub wsfe: String,
}

impl Endpoints {
    pub fn for_env(env: Environment) -> Self {
        match env {
            Environment::Testing => Self {
                wsaa: WSAA_TESTING.to_string(),
                wsfe: WSFE_TESTING.to_string(),
            },
            Environment::Production => Self {
                wsaa: WSAA_PRODUCTION.to_string(),
                wsfe: WSFE_PRODUCTION.to_string(),
            },
        }
    }
}

/// Client settings
#[derive(Debug, Clone)]
pub struct AfipConfig {
    /// Taxpayer CUIT the certificate belongs to
    pub cuit: u64,
    pub environment: Environment,
    pub endpoints: Endpoints,
    /// Extra attempts for idempotent queries on transport failure
    pub max_retries: u32,
    /// Base delay, multiplied by the attempt number
    pub retry_delay: Duration,
    pub timeout: Duration,
    /// A cached ticket closer than this to expiry is renewed
    pub ticket_margin: Duration,
}

impl AfipConfig {
    pub fn new(cuit: u64, environment: Environment) -> Self {
        Self {
            cuit,
            environment,
            endpoints: Endpoints::for_env(environment),
            max_retries: 3,
            retry_delay: Duration::from_secs(2),
            timeout: Duration::from_secs(60),
            ticket_margin: Duration::from_secs(10 * 60),
        }
    }

    pub fn with_endpoints(mut self, endpoints: Endpoints) -> Self {
        self.endpoints = endpoints;
        self
    }

    pub fn with_retries(mut self, max_retries: u32, retry_delay: Duration) -> Self {
        self.max_retries = max_retries;
        self.retry_delay = retry_delay;
        self
    }

    pub(crate) fn http_client(&self) -> crate::Result<reqwest::Client> {
        Ok(reqwest::Client::builder().timeout(self.timeout).build()?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoints_per_environment() {
        let testing = Endpoints::for_env(Environment::Testing);
        assert!(testing.wsaa.contains("wsaahomo"));
        assert!(testing.wsfe.contains("wswhomo"));

        let prod = Endpoints::for_env(Environment::Production);
        assert_eq!(prod.wsaa, "https://wsaa.afip.gov.ar/ws/services/LoginCms");
        assert_eq!(prod.wsfe, "https://servicios1.afip.gov.ar/wsfev1/service.asmx");
    }

    #[test]
    fn test_config_defaults() {
        let config = AfipConfig::new(20123456789, Environment::from_flag(false));
        assert_eq!(config.environment, Environment::Testing);
        assert_eq!(config.max_retries, 3);
        assert_eq!(config.endpoints, Endpoints::for_env(Environment::Testing));
    }
}
