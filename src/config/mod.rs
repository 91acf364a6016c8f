use dotenvy::dotenv;
use serde::Deserialize;
use std::env;

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub media: MediaConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MediaConfig {
    /// Directory where uploaded videos land, namespaced per ticket.
    pub storage_path: String,
    pub allowed_video_extensions: Vec<String>,
    pub max_video_bytes: i64,
}

const DEFAULT_VIDEO_EXTENSIONS: &[&str] = &[".mp4", ".mov", ".avi", ".mkv", ".wmv", ".webm"];
pub const DEFAULT_MAX_VIDEO_BYTES: i64 = 500 * 1024 * 1024;

impl AppConfig {
    pub fn load() -> anyhow::Result<Self> {
        dotenv().ok();

        Ok(Self {
            server: ServerConfig {
                host: env::var("SERVER_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
                port: env::var("SERVER_PORT")
                    .unwrap_or_else(|_| "8080".to_string())
                    .parse()?,
            },
            database: DatabaseConfig {
                url: env::var("DATABASE_URL")?,
                max_connections: env::var("DATABASE_MAX_CONNECTIONS")
                    .unwrap_or_else(|_| "10".to_string())
                    .parse()?,
            },
            media: MediaConfig {
                storage_path: env::var("MEDIA_STORAGE_PATH")
                    .unwrap_or_else(|_| "./media".to_string()),
                allowed_video_extensions: env::var("ALLOWED_VIDEO_EXTENSIONS")
                    .map(|v| v.split(',').map(|s| s.trim().to_lowercase()).collect())
                    .unwrap_or_else(|_| {
                        DEFAULT_VIDEO_EXTENSIONS
                            .iter()
                            .map(|s| s.to_string())
                            .collect()
                    }),
                max_video_bytes: env::var("MAX_VIDEO_FILE_SIZE")
                    .unwrap_or_else(|_| DEFAULT_MAX_VIDEO_BYTES.to_string())
                    .parse()?,
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_extensions_cover_common_video_formats() {
        for ext in [".mp4", ".mkv", ".webm"] {
            assert!(DEFAULT_VIDEO_EXTENSIONS.contains(&ext));
        }
    }
}
