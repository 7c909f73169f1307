//! HTTP convergence checks against the live site

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use cms_bench_core::{CheckError, CheckOutcome, ContentCheck, DeployedQuery, NotFoundQuery};

/// Configuration for the HTTP content check
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpCheckConfig {
    /// Request timeout
    #[serde(default = "default_request_timeout")]
    #[serde(with = "humantime_serde")]
    pub request_timeout: Duration,

    /// Connection timeout
    #[serde(default = "default_connect_timeout")]
    #[serde(with = "humantime_serde")]
    pub connect_timeout: Duration,
}

fn default_request_timeout() -> Duration {
    Duration::from_secs(30)
}

fn default_connect_timeout() -> Duration {
    Duration::from_secs(10)
}

impl Default for HttpCheckConfig {
    fn default() -> Self {
        Self {
            request_timeout: default_request_timeout(),
            connect_timeout: default_connect_timeout(),
        }
    }
}

/// Content-check collaborator reading the live site over HTTP.
///
/// A page is fetched as its JSON content export, an object keyed by
/// selector. HTTP error statuses (404 included) are reported as ordinary
/// outcomes; only transport failures surface as errors.
pub struct HttpContentCheck {
    client: reqwest::Client,
}

impl HttpContentCheck {
    /// Create a check collaborator with the given configuration
    pub fn new(config: HttpCheckConfig) -> Result<Self, CheckError> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .connect_timeout(config.connect_timeout)
            .build()
            .map_err(|e| CheckError::Config(e.to_string()))?;

        Ok(Self { client })
    }

    /// Create a check collaborator with default timeouts
    pub fn with_defaults() -> Result<Self, CheckError> {
        Self::new(HttpCheckConfig::default())
    }

    async fn fetch(&self, root_url: &str, page_path: &str) -> Result<reqwest::Response, CheckError> {
        let url = page_url(root_url, page_path);
        tracing::debug!(url = %url, "fetching page");

        self.client
            .get(&url)
            .send()
            .await
            .map_err(|e| CheckError::transport(e.to_string()))
    }
}

/// Join the live-site base URL and a page path
fn page_url(root_url: &str, page_path: &str) -> String {
    format!(
        "{}/{}",
        root_url.trim_end_matches('/'),
        page_path.trim_start_matches('/')
    )
}

#[async_trait]
impl ContentCheck for HttpContentCheck {
    async fn check_deployed(&self, query: &DeployedQuery) -> Result<CheckOutcome, CheckError> {
        let response = self.fetch(&query.root_url, &query.page_path).await?;
        let status_code = response.status().as_u16();

        if status_code != 200 {
            return Ok(CheckOutcome {
                status_code,
                value: None,
            });
        }

        // A page that fails to parse reads as "value not visible yet".
        let value = match response.json::<serde_json::Value>().await {
            Ok(body) => body.get(&query.selector).cloned(),
            Err(e) => {
                tracing::debug!(page_path = %query.page_path, error = %e, "page body not parseable");
                None
            }
        };

        Ok(CheckOutcome { status_code, value })
    }

    async fn check_not_found(&self, query: &NotFoundQuery) -> Result<CheckOutcome, CheckError> {
        let response = self.fetch(&query.root_url, &query.page_path).await?;

        Ok(CheckOutcome {
            status_code: response.status().as_u16(),
            value: None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[test]
    fn test_page_url_joins_slashes() {
        assert_eq!(
            page_url("http://localhost:4503/", "/content/n1.html"),
            "http://localhost:4503/content/n1.html"
        );
        assert_eq!(
            page_url("http://localhost:4503", "content/n1.html"),
            "http://localhost:4503/content/n1.html"
        );
    }

    #[tokio::test]
    async fn test_check_deployed_finds_value() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/content/n1.html"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({"[data-node='n1']": "v1"})),
            )
            .mount(&server)
            .await;

        let check = HttpContentCheck::with_defaults().unwrap();
        let outcome = check
            .check_deployed(&DeployedQuery {
                selector: "[data-node='n1']".into(),
                page_path: "/content/n1.html".into(),
                root_url: server.uri(),
            })
            .await
            .unwrap();

        assert_eq!(outcome.status_code, 200);
        assert!(outcome.matches(&json!("v1")));
    }

    #[tokio::test]
    async fn test_check_deployed_missing_selector_is_a_miss() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/content/n1.html"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"other": "v"})))
            .mount(&server)
            .await;

        let check = HttpContentCheck::with_defaults().unwrap();
        let outcome = check
            .check_deployed(&DeployedQuery {
                selector: "[data-node='n1']".into(),
                page_path: "/content/n1.html".into(),
                root_url: server.uri(),
            })
            .await
            .unwrap();

        assert_eq!(outcome.status_code, 200);
        assert!(outcome.value.is_none());
        assert!(!outcome.matches(&json!("v1")));
    }

    #[tokio::test]
    async fn test_check_deployed_tolerates_error_status() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/content/n1.html"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let check = HttpContentCheck::with_defaults().unwrap();
        let outcome = check
            .check_deployed(&DeployedQuery {
                selector: "[data-node='n1']".into(),
                page_path: "/content/n1.html".into(),
                root_url: server.uri(),
            })
            .await
            .unwrap();

        // An error status is an ordinary outcome, not a failure.
        assert_eq!(outcome.status_code, 503);
        assert!(outcome.value.is_none());
    }

    #[tokio::test]
    async fn test_check_not_found() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/content/gone.html"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let check = HttpContentCheck::with_defaults().unwrap();
        let outcome = check
            .check_not_found(&NotFoundQuery {
                page_path: "/content/gone.html".into(),
                root_url: server.uri(),
            })
            .await
            .unwrap();

        assert!(outcome.is_not_found());
    }

    #[tokio::test]
    async fn test_check_not_found_page_still_live() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/content/n1.html"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
            .mount(&server)
            .await;

        let check = HttpContentCheck::with_defaults().unwrap();
        let outcome = check
            .check_not_found(&NotFoundQuery {
                page_path: "/content/n1.html".into(),
                root_url: server.uri(),
            })
            .await
            .unwrap();

        assert!(!outcome.is_not_found());
        assert_eq!(outcome.status_code, 200);
    }
}
