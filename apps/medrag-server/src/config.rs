//! Configuration management for MedRAG Server

use serde::Deserialize;
use std::collections::BTreeSet;
use std::env;
use std::path::PathBuf;

use crate::ocr::OcrProvider;
use crate::processing::DEFAULT_OCR_DPI;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub app_name: String,
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub uploads: UploadConfig,
    pub ocr: OcrConfig,
    pub llm: LlmConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UploadConfig {
    /// Directory where uploaded files are written
    pub folder: PathBuf,
    /// Lowercase extensions without the leading dot
    pub allowed_extensions: BTreeSet<String>,
    /// Maximum request body size in bytes
    pub max_upload_size: usize,
}

#[derive(Debug, Clone, Deserialize)]
pub struct OcrConfig {
    /// Providers in the order they are tried
    pub providers: Vec<OcrProvider>,
    pub language: String,
    /// Rendering resolution for OCR
    pub dpi: u32,
    pub ollama_url: String,
    pub ollama_model: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LlmConfig {
    /// Fallback key when a request does not carry one
    pub api_key: Option<String>,
    pub base_url: String,
    pub model: String,
    pub temperature: f32,
    pub max_tokens: u32,
}

/// Configuration loading errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for {name}: {value}")]
    InvalidValue { name: &'static str, value: String },
}

impl UploadConfig {
    /// Check whether a client-supplied filename carries an allowed extension
    pub fn is_allowed(&self, filename: &str) -> bool {
        match filename.rsplit_once('.') {
            Some((_, ext)) => self.allowed_extensions.contains(&ext.to_lowercase()),
            None => false,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Config {
            app_name: "MedRAG".to_string(),
            server: ServerConfig {
                host: "0.0.0.0".to_string(),
                port: 8000,
            },
            database: DatabaseConfig {
                url: "sqlite:./data/medrag.db".to_string(),
            },
            uploads: UploadConfig {
                folder: PathBuf::from("./data/uploads"),
                allowed_extensions: parse_extensions("pdf"),
                max_upload_size: 10 * 1024 * 1024,
            },
            ocr: OcrConfig {
                providers: vec![OcrProvider::Tesseract],
                language: "eng".to_string(),
                dpi: DEFAULT_OCR_DPI,
                ollama_url: "http://localhost:11434".to_string(),
                ollama_model: "llava".to_string(),
            },
            llm: LlmConfig {
                api_key: None,
                base_url: "https://api.openai.com/v1".to_string(),
                model: "gpt-4o".to_string(),
                temperature: 0.1,
                max_tokens: 4000,
            },
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = Config::default();

        Ok(Config {
            app_name: env::var("APP_NAME").unwrap_or(defaults.app_name),
            server: ServerConfig {
                host: env::var("SERVER_HOST").unwrap_or(defaults.server.host),
                port: parse_var("SERVER_PORT", defaults.server.port)?,
            },
            database: DatabaseConfig {
                url: env::var("DATABASE_URL").unwrap_or(defaults.database.url),
            },
            uploads: UploadConfig {
                folder: env::var("UPLOAD_FOLDER")
                    .map(PathBuf::from)
                    .unwrap_or(defaults.uploads.folder),
                allowed_extensions: env::var("ALLOWED_EXTENSIONS")
                    .map(|v| parse_extensions(&v))
                    .unwrap_or(defaults.uploads.allowed_extensions),
                max_upload_size: parse_var("MAX_UPLOAD_SIZE", defaults.uploads.max_upload_size)?,
            },
            ocr: OcrConfig {
                providers: match env::var("OCR_PROVIDERS") {
                    Ok(v) => parse_providers(&v)?,
                    Err(_) => defaults.ocr.providers,
                },
                language: env::var("OCR_LANGUAGE").unwrap_or(defaults.ocr.language),
                dpi: parse_var("OCR_DPI", defaults.ocr.dpi)?,
                ollama_url: env::var("OLLAMA_URL").unwrap_or(defaults.ocr.ollama_url),
                ollama_model: env::var("OLLAMA_VISION_MODEL").unwrap_or(defaults.ocr.ollama_model),
            },
            llm: LlmConfig {
                api_key: env::var("OPENAI_API_KEY").ok().filter(|k| !k.trim().is_empty()),
                base_url: env::var("OPENAI_BASE_URL").unwrap_or(defaults.llm.base_url),
                model: env::var("OPENAI_MODEL").unwrap_or(defaults.llm.model),
                temperature: parse_var("OPENAI_TEMPERATURE", defaults.llm.temperature)?,
                max_tokens: parse_var("OPENAI_MAX_TOKENS", defaults.llm.max_tokens)?,
            },
        })
    }
}

fn parse_var<T: std::str::FromStr>(name: &'static str, default: T) -> Result<T, ConfigError> {
    match env::var(name) {
        Ok(value) => value
            .trim()
            .parse()
            .map_err(|_| ConfigError::InvalidValue { name, value }),
        Err(_) => Ok(default),
    }
}

/// Parse a comma-separated extension list ("pdf, PDF,.tiff")
pub fn parse_extensions(value: &str) -> BTreeSet<String> {
    value
        .split(',')
        .map(|ext| ext.trim().trim_start_matches('.').to_lowercase())
        .filter(|ext| !ext.is_empty())
        .collect()
}

fn parse_providers(value: &str) -> Result<Vec<OcrProvider>, ConfigError> {
    value
        .split(',')
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .map(|p| match p.to_lowercase().as_str() {
            "tesseract" => Ok(OcrProvider::Tesseract),
            "ollama" => Ok(OcrProvider::Ollama),
            _ => Err(ConfigError::InvalidValue {
                name: "OCR_PROVIDERS",
                value: p.to_string(),
            }),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_extensions_normalizes() {
        let exts = parse_extensions(" PDF,.tiff ,, png");
        assert_eq!(
            exts.into_iter().collect::<Vec<_>>(),
            vec!["pdf".to_string(), "png".to_string(), "tiff".to_string()]
        );
    }

    #[test]
    fn test_allowed_file() {
        let uploads = Config::default().uploads;
        assert!(uploads.is_allowed("report.pdf"));
        assert!(uploads.is_allowed("scan.final.PDF"));
        assert!(!uploads.is_allowed("notes.txt"));
        assert!(!uploads.is_allowed("pdf"));
        assert!(!uploads.is_allowed(""));
    }

    #[test]
    fn test_parse_providers() {
        assert_eq!(
            parse_providers("ollama, tesseract").unwrap(),
            vec![OcrProvider::Ollama, OcrProvider::Tesseract]
        );
        assert!(parse_providers("abbyy").is_err());
    }
}
