use crate::{Timetable, TimetableConfig, build_timetable};
use reqwest::blocking::Client;
use std::fmt;
use std::time::Duration;

pub type ApiResult<T> = Result<T, ApiError>;

const USER_AGENT: &str = concat!("wa-timetable/", env!("CARGO_PKG_VERSION"));

#[derive(Debug)]
pub enum ApiError {
    FetchFailed { url: String, reason: String },
    EmptyBody,
    MarkerNotFound { marker: String },
    DecodeFailed(serde_json::Error),
    /// The JSON decoded but had none of the expected shapes.
    SchemaInvalid { path: String, top_level_keys: Vec<String> },
    InvalidConfig(String),
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiError::FetchFailed { url, reason } => write!(f, "Fetch failed for {url}: {reason}"),
            ApiError::EmptyBody => write!(f, "Response body was empty"),
            ApiError::MarkerNotFound { marker } => {
                write!(f, "No <script id=\"{marker}\"> block found in page")
            }
            ApiError::DecodeFailed(e) => write!(f, "Embedded JSON is malformed: {e}"),
            ApiError::SchemaInvalid { path, top_level_keys } => write!(
                f,
                "Unexpected JSON shape: missing {path} (top-level keys: {})",
                top_level_keys.join(", ")
            ),
            ApiError::InvalidConfig(msg) => write!(f, "Invalid configuration: {msg}"),
        }
    }
}

impl std::error::Error for ApiError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ApiError::DecodeFailed(e) => Some(e),
            _ => None,
        }
    }
}

/// Blocking client for the timetable page.
#[derive(Debug, Clone)]
pub struct TimetableApi {
    client: Client,
    retries: u32,
}

impl TimetableApi {
    pub fn new(config: &TimetableConfig) -> ApiResult<Self> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(Duration::from_secs(config.timeout_secs))
            .danger_accept_invalid_certs(config.accept_invalid_certs)
            .build()
            .map_err(|e| ApiError::InvalidConfig(format!("could not build HTTP client: {e}")))?;
        Ok(Self { client, retries: config.retries })
    }

    /// GET `url` and return the body. Timeouts are retried up to the
    /// configured count; any other failure is returned immediately.
    pub fn fetch_page(&self, url: &str) -> ApiResult<String> {
        let mut attempt = 0;
        loop {
            match self.get(url) {
                Err(Attempt::TimedOut(reason)) if attempt < self.retries => {
                    attempt += 1;
                    log::warn!("timed out fetching {url} ({reason}), retry {attempt}/{}", self.retries);
                }
                Err(Attempt::TimedOut(reason)) | Err(Attempt::Failed(reason)) => {
                    return Err(ApiError::FetchFailed { url: url.to_owned(), reason });
                }
                Ok(body) if body.trim().is_empty() => return Err(ApiError::EmptyBody),
                Ok(body) => {
                    log::debug!("fetched {} bytes from {url}", body.len());
                    return Ok(body);
                }
            }
        }
    }

    fn get(&self, url: &str) -> Result<String, Attempt> {
        let response = self.client.get(url).send().map_err(Attempt::from)?;
        let status = response.status();
        if !status.is_success() {
            return Err(Attempt::Failed(format!("HTTP {status}")));
        }
        response.text().map_err(Attempt::from)
    }

    /// Page text from the configured local file, or the configured URL.
    pub fn load_source(&self, config: &TimetableConfig) -> ApiResult<String> {
        match &config.source_file {
            Some(path) => {
                log::info!("reading timetable from {}", path.display());
                let text = std::fs::read_to_string(path).map_err(|e| ApiError::FetchFailed {
                    url: path.display().to_string(),
                    reason: e.to_string(),
                })?;
                if text.trim().is_empty() {
                    return Err(ApiError::EmptyBody);
                }
                Ok(text)
            }
            None => {
                log::info!("fetching timetable from {}", config.url);
                self.fetch_page(&config.url)
            }
        }
    }

    /// Load the source and run it through the whole pipeline.
    pub fn fetch_timetable(&self, config: &TimetableConfig) -> ApiResult<Timetable> {
        let text = self.load_source(config)?;
        build_timetable(&text, config)
    }
}

enum Attempt {
    TimedOut(String),
    Failed(String),
}

impl From<reqwest::Error> for Attempt {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            Attempt::TimedOut(e.to_string())
        } else {
            Attempt::Failed(e.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE: &str = r#"<html><head></head><body>
        <script id="__NEXT_DATA__" type="application/json">
        {"props":{"pageProps":{"phases":[
            {"id":7,"phaseName":"Final","phaseSessionName":"Evening Session",
             "phaseDateAndTime":"2025-09-14T21:20:00+09:00","disciplineName":"100 Metres",
             "sexName":"Women"}
        ]}}}
        </script></body></html>"#;

    fn config_for(url: String) -> TimetableConfig {
        TimetableConfig { url, retries: 0, ..Default::default() }
    }

    #[test]
    fn fetch_page_returns_body_on_success() {
        let mut server = mockito::Server::new();
        let mock = server
            .mock("GET", "/timetable")
            .with_status(200)
            .with_header("content-type", "text/html")
            .with_body(PAGE)
            .create();

        let config = config_for(format!("{}/timetable", server.url()));
        let api = TimetableApi::new(&config).unwrap();
        let body = api.fetch_page(&config.url).unwrap();
        assert!(body.contains("__NEXT_DATA__"));
        mock.assert();
    }

    #[test]
    fn server_error_is_fetch_failed() {
        let mut server = mockito::Server::new();
        server.mock("GET", "/timetable").with_status(500).create();

        let config = config_for(format!("{}/timetable", server.url()));
        let api = TimetableApi::new(&config).unwrap();
        match api.fetch_page(&config.url) {
            Err(ApiError::FetchFailed { url, reason }) => {
                assert_eq!(url, config.url);
                assert!(reason.contains("500"), "reason was {reason}");
            }
            other => panic!("expected FetchFailed, got {other:?}"),
        }
    }

    #[test]
    fn blank_body_is_empty_body() {
        let mut server = mockito::Server::new();
        server.mock("GET", "/timetable").with_status(200).with_body("  \n").create();

        let config = config_for(format!("{}/timetable", server.url()));
        let api = TimetableApi::new(&config).unwrap();
        assert!(matches!(api.fetch_page(&config.url), Err(ApiError::EmptyBody)));
    }

    #[test]
    fn unreachable_host_is_fetch_failed() {
        let config = config_for("http://127.0.0.1:1/timetable".into());
        let api = TimetableApi::new(&config).unwrap();
        assert!(matches!(api.fetch_page(&config.url), Err(ApiError::FetchFailed { .. })));
    }

    #[test]
    fn fetch_timetable_runs_pipeline_on_served_page() {
        let mut server = mockito::Server::new();
        server.mock("GET", "/timetable").with_status(200).with_body(PAGE).create();

        let config = config_for(format!("{}/timetable", server.url()));
        let api = TimetableApi::new(&config).unwrap();
        let timetable = api.fetch_timetable(&config).unwrap();
        assert_eq!(timetable.event_count(), 1);
        // 21:20 Tokyo is 07:20 Jamaica on the same date.
        assert_eq!(timetable.days[0].label, "Day 3 - Sep 14");
        assert_eq!(timetable.days[0].sessions[0].name, "Morning Session");
    }

    #[test]
    fn load_source_prefers_local_file() {
        let path = std::env::temp_dir().join(format!("wa-timetable-{}.html", std::process::id()));
        std::fs::write(&path, PAGE).unwrap();

        let config = TimetableConfig {
            url: "http://127.0.0.1:1/never".into(),
            source_file: Some(path.clone()),
            ..Default::default()
        };
        let api = TimetableApi::new(&config).unwrap();
        let text = api.load_source(&config).unwrap();
        std::fs::remove_file(&path).ok();
        assert_eq!(text, PAGE);
    }

    #[test]
    fn missing_local_file_is_fetch_failed() {
        let config = TimetableConfig {
            source_file: Some("/nonexistent/wa-timetable.html".into()),
            ..Default::default()
        };
        let api = TimetableApi::new(&config).unwrap();
        assert!(matches!(api.load_source(&config), Err(ApiError::FetchFailed { .. })));
    }
}
