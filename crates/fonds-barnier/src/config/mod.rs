use std::env;
use std::fmt;
use std::net::{IpAddr, SocketAddr};

/// Distinguishes runtime behavior for different stages of the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEnvironment {
    Development,
    Test,
    Production,
}

impl AppEnvironment {
    fn from_str(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "prod" | "production" => Self::Production,
            "test" | "ci" => Self::Test,
            _ => Self::Development,
        }
    }
}

/// Top-level configuration for the application.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub environment: AppEnvironment,
    pub server: ServerConfig,
    pub telemetry: TelemetryConfig,
    pub geocoding: GeocodingConfig,
    pub hazards: HazardConfig,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let environment = AppEnvironment::from_str(
            &env::var("APP_ENV").unwrap_or_else(|_| "development".to_string()),
        );

        let host = env::var("APP_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
        let port = env::var("APP_PORT")
            .unwrap_or_else(|_| "3000".to_string())
            .parse::<u16>()
            .map_err(|_| ConfigError::InvalidPort)?;

        let log_level = env::var("APP_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

        let geocoding = GeocodingConfig {
            base_url: env::var("GEOAPIFY_BASE_URL")
                .unwrap_or_else(|_| "https://api.geoapify.com/v1/geocode".to_string()),
            api_key: env::var("GEOAPIFY_API_KEY").map_err(|_| ConfigError::MissingApiKey)?,
        };

        let hazards = HazardConfig {
            base_url: env::var("GEORISQUES_BASE_URL")
                .unwrap_or_else(|_| "https://georisques.gouv.fr/api/v1".to_string()),
            radius_meters: env::var("HAZARD_RADIUS_METERS")
                .unwrap_or_else(|_| "100".to_string())
                .parse::<u32>()
                .map_err(|_| ConfigError::InvalidRadius)?,
        };

        Ok(Self {
            environment,
            server: ServerConfig { host, port },
            telemetry: TelemetryConfig { log_level },
            geocoding,
            hazards,
        })
    }
}

/// Settings controlling the HTTP server binding.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl ServerConfig {
    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        if self.host.eq_ignore_ascii_case("localhost") {
            return Ok(SocketAddr::new(IpAddr::from([127, 0, 0, 1]), self.port));
        }

        let ip: IpAddr = self
            .host
            .parse()
            .map_err(|source| ConfigError::InvalidHost { source })?;

        Ok(SocketAddr::new(ip, self.port))
    }
}

/// Tracing and metrics controls.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    pub log_level: String,
}

/// Geoapify autocomplete endpoint and credentials.
#[derive(Debug, Clone)]
pub struct GeocodingConfig {
    pub base_url: String,
    pub api_key: String,
}

/// Géorisques registry endpoint and the search radius applied to every
/// zone lookup.
#[derive(Debug, Clone)]
pub struct HazardConfig {
    pub base_url: String,
    pub radius_meters: u32,
}

#[derive(Debug)]
pub enum ConfigError {
    InvalidPort,
    InvalidHost { source: std::net::AddrParseError },
    InvalidRadius,
    MissingApiKey,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::InvalidPort => write!(f, "APP_PORT must be a valid u16"),
            ConfigError::InvalidHost { .. } => {
                write!(f, "APP_HOST must parse to an IPv4 or IPv6 address")
            }
            ConfigError::InvalidRadius => write!(f, "HAZARD_RADIUS_METERS must be a valid u32"),
            ConfigError::MissingApiKey => write!(f, "GEOAPIFY_API_KEY must be set"),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::InvalidPort
            | ConfigError::InvalidRadius
            | ConfigError::MissingApiKey => None,
            ConfigError::InvalidHost { source } => Some(source),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;
    use std::sync::{Mutex, OnceLock};

    fn env_guard() -> &'static Mutex<()> {
        static GUARD: OnceLock<Mutex<()>> = OnceLock::new();
        GUARD.get_or_init(|| Mutex::new(()))
    }

    fn reset_env() {
        env::remove_var("APP_ENV");
        env::remove_var("APP_HOST");
        env::remove_var("APP_PORT");
        env::remove_var("APP_LOG_LEVEL");
        env::remove_var("GEOAPIFY_BASE_URL");
        env::remove_var("GEOAPIFY_API_KEY");
        env::remove_var("GEORISQUES_BASE_URL");
        env::remove_var("HAZARD_RADIUS_METERS");
    }

    #[test]
    fn load_uses_defaults_when_env_missing() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("GEOAPIFY_API_KEY", "test-key");
        let config = AppConfig::load().expect("config loads with defaults");
        assert_eq!(config.environment, AppEnvironment::Development);
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.server.port, 3000);
        assert_eq!(config.telemetry.log_level, "info");
        assert_eq!(config.geocoding.base_url, "https://api.geoapify.com/v1/geocode");
        assert_eq!(config.hazards.radius_meters, 100);
    }

    #[test]
    fn load_requires_the_geoapify_key() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        match AppConfig::load() {
            Err(ConfigError::MissingApiKey) => {}
            other => panic!("expected missing key error, got {other:?}"),
        }
    }

    #[test]
    fn accepts_localhost_host() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("GEOAPIFY_API_KEY", "test-key");
        env::set_var("APP_HOST", "localhost");
        let config = AppConfig::load().expect("config loads");
        let addr = config.server.socket_addr().expect("localhost resolves");
        assert_eq!(addr, SocketAddr::new(IpAddr::from([127, 0, 0, 1]), 3000));
    }

    #[test]
    fn rejects_non_numeric_radius() {
        let _lock = env_guard().lock().expect("env mutex poisoned");
        reset_env();
        env::set_var("GEOAPIFY_API_KEY", "test-key");
        env::set_var("HAZARD_RADIUS_METERS", "nearby");
        match AppConfig::load() {
            Err(ConfigError::InvalidRadius) => {}
            other => panic!("expected invalid radius error, got {other:?}"),
        }
    }
}
