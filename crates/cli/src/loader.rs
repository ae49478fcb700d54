//! Raw document loading from URLs and local paths

use apiscope_parser::Syntax;
use reqwest::blocking::Client;
use reqwest::header::{ACCEPT, USER_AGENT};
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

use crate::config::AppConfig;

const ACCEPT_DOCUMENTS: &str = "application/json, application/yaml, text/yaml, */*";

/// Failures while obtaining the raw document text
#[derive(Error, Debug)]
pub enum LoadError {
    #[error("no source given")]
    EmptySource,

    #[error("failed to read {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("request to {url} failed: {message}")]
    Request { url: String, message: String },

    #[error("failed to build HTTP client: {0}")]
    Client(String),

    #[error("{url} answered with HTTP {status}")]
    Status { url: String, status: u16 },
}

/// Source of raw contract text
#[cfg_attr(test, mockall::automock)]
pub trait DocumentLoader {
    /// Load the full text behind `source` (URL or path)
    fn load(&self, source: &str) -> Result<String, LoadError>;
}

/// Loads `http(s)://` sources over the network and everything else from disk
pub struct SourceLoader {
    client: Client,
    user_agent: String,
}

impl SourceLoader {
    pub fn new(config: &AppConfig) -> Result<Self, LoadError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .danger_accept_invalid_certs(!config.verify_tls)
            .build()
            .map_err(|e| LoadError::Client(e.to_string()))?;

        Ok(Self {
            client,
            user_agent: config.user_agent.clone(),
        })
    }

    fn fetch(&self, url: &str) -> Result<String, LoadError> {
        tracing::debug!(url, "fetching document");
        let request_error = |e: reqwest::Error| LoadError::Request {
            url: url.to_string(),
            message: e.to_string(),
        };

        let response = self
            .client
            .get(url)
            .header(ACCEPT, ACCEPT_DOCUMENTS)
            .header(USER_AGENT, &self.user_agent)
            .send()
            .map_err(request_error)?;

        let status = response.status();
        if !status.is_success() {
            return Err(LoadError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        response.text().map_err(request_error)
    }
}

impl DocumentLoader for SourceLoader {
    fn load(&self, source: &str) -> Result<String, LoadError> {
        let source = source.trim();
        if source.is_empty() {
            return Err(LoadError::EmptySource);
        }

        if is_remote(source) {
            return self.fetch(source);
        }

        tracing::debug!(path = source, "reading document");
        std::fs::read_to_string(source).map_err(|e| LoadError::Read {
            path: source.to_string(),
            source: e,
        })
    }
}

fn is_remote(source: &str) -> bool {
    source.starts_with("http://") || source.starts_with("https://")
}

/// Syntax hint from the source's file extension; query strings are ignored
pub fn syntax_hint(source: &str) -> Option<Syntax> {
    let path = source.split(['?', '#']).next().unwrap_or(source);
    let extension = Path::new(path).extension()?.to_str()?.to_ascii_lowercase();

    match extension.as_str() {
        "json" => Some(Syntax::Json),
        "yaml" | "yml" => Some(Syntax::Yaml),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn loader() -> SourceLoader {
        SourceLoader::new(&AppConfig::default()).unwrap()
    }

    #[test]
    fn test_syntax_hint() {
        assert_eq!(syntax_hint("petstore.json"), Some(Syntax::Json));
        assert_eq!(syntax_hint("specs/petstore.YAML"), Some(Syntax::Yaml));
        assert_eq!(syntax_hint("https://x.io/api.yml?ref=main"), Some(Syntax::Yaml));
        assert_eq!(syntax_hint("https://x.io/v2/api-docs"), None);
        assert_eq!(syntax_hint("contract.txt"), None);
    }

    #[test]
    fn test_loads_local_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "openapi: 3.0.0").unwrap();

        let text = loader().load(file.path().to_str().unwrap()).unwrap();
        assert_eq!(text, "openapi: 3.0.0\n");
    }

    #[test]
    fn test_missing_file_is_read_error() {
        let err = loader().load("/definitely/not/here.yaml").unwrap_err();
        assert!(matches!(err, LoadError::Read { .. }));
        assert!(err.to_string().contains("/definitely/not/here.yaml"));
    }

    #[test]
    fn test_empty_source_rejected() {
        assert!(matches!(loader().load("  "), Err(LoadError::EmptySource)));
    }

    #[test]
    fn test_remote_detection() {
        assert!(is_remote("https://petstore.swagger.io/v2/swagger.json"));
        assert!(is_remote("http://localhost:8080/openapi.yaml"));
        assert!(!is_remote("./http-specs/openapi.yaml"));
    }
}
