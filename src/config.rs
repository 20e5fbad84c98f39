//! Service configuration from CLI arguments and environment variables.

use clap::Parser;
use std::path::PathBuf;

/// Command-line arguments for the research report server.
#[derive(Debug, Parser)]
#[command(name = "researchd", about = "Research report orchestration server")]
pub struct Cli {
    /// Host to bind to
    #[arg(long, default_value = "0.0.0.0", env = "RESEARCHD_HOST")]
    pub host: String,

    /// Port to bind to
    #[arg(long, default_value_t = 8000, env = "RESEARCHD_PORT")]
    pub port: u16,

    /// Directory for persisted reports and transcripts
    /// (defaults to the platform data directory)
    #[arg(long, env = "RESEARCHD_DATA_DIR")]
    pub data_dir: Option<PathBuf>,

    /// Default document workspace directory
    #[arg(long, default_value = "./my-docs", env = "RESEARCHD_DOC_PATH")]
    pub doc_path: PathBuf,

    /// External generation command (program plus leading arguments);
    /// when unset, a built-in static generator is used
    #[arg(long, env = "RESEARCHD_GENERATOR_CMD")]
    pub generator_cmd: Option<String>,

    /// Allowed CORS origins, comma-separated; all origins when unset
    #[arg(long, value_delimiter = ',', env = "RESEARCHD_CORS_ORIGINS")]
    pub cors_origins: Option<Vec<String>>,
}

/// Resolved service configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub data_dir: PathBuf,
    pub doc_path: PathBuf,
    pub generator_cmd: Option<String>,
    pub cors_origins: Option<Vec<String>>,
}

impl ServerConfig {
    pub fn from_cli(cli: Cli) -> Self {
        let data_dir = cli.data_dir.unwrap_or_else(default_data_dir);
        Self {
            host: cli.host,
            port: cli.port,
            data_dir,
            doc_path: cli.doc_path,
            generator_cmd: cli.generator_cmd,
            cors_origins: cli.cors_origins,
        }
    }
}

/// Platform data directory fallback, e.g. `~/.local/share/researchd`.
fn default_data_dir() -> PathBuf {
    dirs::data_dir()
        .map(|dir| dir.join("researchd"))
        .unwrap_or_else(|| PathBuf::from(".researchd"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let cli = Cli::parse_from(["researchd"]);
        assert_eq!(cli.host, "0.0.0.0");
        assert_eq!(cli.port, 8000);
        assert_eq!(cli.doc_path, PathBuf::from("./my-docs"));
        assert!(cli.generator_cmd.is_none());
    }

    #[test]
    fn test_overrides() {
        let cli = Cli::parse_from([
            "researchd",
            "--host",
            "127.0.0.1",
            "--port",
            "9100",
            "--cors-origins",
            "http://a.example,http://b.example",
        ]);
        let config = ServerConfig::from_cli(cli);
        assert_eq!(config.host, "127.0.0.1");
        assert_eq!(config.port, 9100);
        assert_eq!(
            config.cors_origins,
            Some(vec![
                "http://a.example".to_string(),
                "http://b.example".to_string()
            ])
        );
    }
}
