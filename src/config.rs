use std::env;
use std::path::PathBuf;

/// Default cap on request bodies (uploads): 16 MiB
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 16 * 1024 * 1024;

/// Application configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    pub server_host: String,
    pub server_port: u16,
    pub upload_dir: PathBuf,
    pub static_dir: PathBuf,
    pub max_upload_bytes: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server_host: "127.0.0.1".to_string(),
            server_port: 5000,
            upload_dir: PathBuf::from("uploads"),
            static_dir: PathBuf::from("static"),
            max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
        }
    }
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, String> {
        // Load .env file if it exists (development)
        dotenvy::dotenv().ok();

        let defaults = Config::default();

        let server_host = env::var("APP_HOST").unwrap_or(defaults.server_host);
        let server_port = match env::var("APP_PORT") {
            Ok(port) => port.parse().map_err(|_| "Invalid APP_PORT")?,
            Err(_) => defaults.server_port,
        };

        let upload_dir = env::var("UPLOAD_DIR")
            .map(PathBuf::from)
            .unwrap_or(defaults.upload_dir);
        let static_dir = env::var("STATIC_DIR")
            .map(PathBuf::from)
            .unwrap_or(defaults.static_dir);

        let max_upload_bytes = match env::var("MAX_UPLOAD_BYTES") {
            Ok(bytes) => bytes.parse().map_err(|_| "Invalid MAX_UPLOAD_BYTES")?,
            Err(_) => defaults.max_upload_bytes,
        };

        Ok(Config {
            server_host,
            server_port,
            upload_dir,
            static_dir,
            max_upload_bytes,
        })
    }

    /// Get server address as string
    pub fn server_address(&self) -> String {
        format!("{}:{}", self.server_host, self.server_port)
    }

    /// Fixed location of the generated PDF report
    pub fn report_path(&self) -> PathBuf {
        self.upload_dir.join(crate::downloader::REPORT_FILE_NAME)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_local_development_setup() {
        let config = Config::default();
        assert_eq!(config.server_address(), "127.0.0.1:5000");
        assert_eq!(config.upload_dir, PathBuf::from("uploads"));
        assert_eq!(config.report_path(), PathBuf::from("uploads").join("report.pdf"));
    }
}
