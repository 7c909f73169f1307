//! REST operator adapter performing create/update/delete against a JSON
//! content API

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use cms_bench_core::{Node, NodeId, NodePayload, Operator, OperatorError};

/// Configuration for the REST operator adapter
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RestOperatorConfig {
    /// Base URL of the content API
    pub api_url: String,

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
    Duration::from_secs(60)
}

fn default_connect_timeout() -> Duration {
    Duration::from_secs(10)
}

impl RestOperatorConfig {
    /// Create a config for the given content API base URL
    pub fn new(api_url: impl Into<String>) -> Self {
        Self {
            api_url: api_url.into(),
            request_timeout: default_request_timeout(),
            connect_timeout: default_connect_timeout(),
        }
    }
}

/// Operator adapter speaking to a content store's node API.
///
/// Create posts a new node, update puts the node's attributes, delete
/// removes it. Create and update decode the store's response into a
/// `NodePayload`; the engine validates it for required fields.
pub struct RestOperator {
    client: reqwest::Client,
    config: RestOperatorConfig,
}

/// Node attributes as sent to the content API
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct NodeBody<'a> {
    id: &'a NodeId,
    page_path: &'a str,
    selector: &'a str,
    value: &'a serde_json::Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    context: Option<&'a serde_json::Value>,
}

impl<'a> From<&'a Node> for NodeBody<'a> {
    fn from(node: &'a Node) -> Self {
        Self {
            id: &node.id,
            page_path: &node.page_path,
            selector: &node.selector,
            value: &node.value,
            context: node.context.as_ref(),
        }
    }
}

impl RestOperator {
    /// Create an adapter with the given configuration
    pub fn new(config: RestOperatorConfig) -> Result<Self, OperatorError> {
        if config.api_url.is_empty() {
            return Err(OperatorError::config("api url must be set"));
        }

        let client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .connect_timeout(config.connect_timeout)
            .build()
            .map_err(|e| OperatorError::config(e.to_string()))?;

        Ok(Self { client, config })
    }

    fn nodes_url(&self) -> String {
        format!("{}/nodes", self.config.api_url.trim_end_matches('/'))
    }

    fn node_url(&self, id: &NodeId) -> String {
        format!("{}/{}", self.nodes_url(), id)
    }

    /// Decode a payload from a successful response; surface error statuses
    /// as operator errors.
    async fn payload_from(response: reqwest::Response) -> Result<NodePayload, OperatorError> {
        let response = Self::checked(response).await?;
        response
            .json::<NodePayload>()
            .await
            .map_err(|e| OperatorError::call(e.to_string()))
    }

    async fn checked(response: reqwest::Response) -> Result<reqwest::Response, OperatorError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let message = response.text().await.unwrap_or_default();
        Err(OperatorError::Server {
            status: status.as_u16(),
            message,
        })
    }
}

#[async_trait]
impl Operator for RestOperator {
    async fn create(&self, node_id: &NodeId) -> Result<NodePayload, OperatorError> {
        tracing::debug!(node = %node_id, "creating node");

        let response = self
            .client
            .post(self.nodes_url())
            .json(&serde_json::json!({ "id": node_id }))
            .send()
            .await
            .map_err(|e| OperatorError::call(e.to_string()))?;

        Self::payload_from(response).await
    }

    async fn update(&self, node: &Node) -> Result<NodePayload, OperatorError> {
        tracing::debug!(node = %node.id, "updating node");

        let response = self
            .client
            .put(self.node_url(&node.id))
            .json(&NodeBody::from(node))
            .send()
            .await
            .map_err(|e| OperatorError::call(e.to_string()))?;

        Self::payload_from(response).await
    }

    async fn delete(&self, node: &Node) -> Result<(), OperatorError> {
        tracing::debug!(node = %node.id, "deleting node");

        let response = self
            .client
            .delete(self.node_url(&node.id))
            .send()
            .await
            .map_err(|e| OperatorError::call(e.to_string()))?;

        Self::checked(response).await.map(|_| ())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn operator(server: &MockServer) -> RestOperator {
        RestOperator::new(RestOperatorConfig::new(server.uri())).unwrap()
    }

    #[test]
    fn test_empty_api_url_rejected() {
        assert!(RestOperator::new(RestOperatorConfig::new("")).is_err());
    }

    #[tokio::test]
    async fn test_create_decodes_payload() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/nodes"))
            .and(body_json(json!({"id": "node-1"})))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!({
                "pagePath": "/content/node-1.html",
                "selector": "[data-node='node-1']",
                "value": "v1"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let payload = operator(&server)
            .create(&NodeId::new("node-1"))
            .await
            .unwrap();

        assert_eq!(payload.page_path.as_deref(), Some("/content/node-1.html"));
        assert_eq!(payload.selector.as_deref(), Some("[data-node='node-1']"));
        assert_eq!(payload.value, Some(json!("v1")));
        assert!(payload.validate().is_ok());
    }

    #[tokio::test]
    async fn test_create_server_error() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/nodes"))
            .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
            .mount(&server)
            .await;

        let result = operator(&server).create(&NodeId::new("node-1")).await;

        match result {
            Err(OperatorError::Server { status, message }) => {
                assert_eq!(status, 500);
                assert_eq!(message, "boom");
            }
            other => panic!("Expected server error, got {:?}", other.map(|_| ())),
        }
    }

    #[tokio::test]
    async fn test_update_puts_node_body() {
        let server = MockServer::start().await;

        Mock::given(method("PUT"))
            .and(path("/nodes/n1"))
            .and(body_json(json!({
                "id": "n1",
                "pagePath": "/content/n1.html",
                "selector": "[data-node='n1']",
                "value": "old"
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "pagePath": "/content/n1.html",
                "selector": "[data-node='n1']",
                "value": "new"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let node = Node::seed("n1", "/content/n1.html", "[data-node='n1']", json!("old"));
        let payload = operator(&server).update(&node).await.unwrap();

        assert_eq!(payload.value, Some(json!("new")));
    }

    #[tokio::test]
    async fn test_delete_expects_no_payload() {
        let server = MockServer::start().await;

        Mock::given(method("DELETE"))
            .and(path("/nodes/n1"))
            .respond_with(ResponseTemplate::new(204))
            .expect(1)
            .mount(&server)
            .await;

        let node = Node::seed("n1", "/content/n1.html", "[data-node='n1']", json!("v"));
        assert!(operator(&server).delete(&node).await.is_ok());
    }

    #[tokio::test]
    async fn test_delete_server_error() {
        let server = MockServer::start().await;

        Mock::given(method("DELETE"))
            .and(path("/nodes/n1"))
            .respond_with(ResponseTemplate::new(403))
            .mount(&server)
            .await;

        let node = Node::seed("n1", "/content/n1.html", "[data-node='n1']", json!("v"));
        let result = operator(&server).delete(&node).await;

        assert!(matches!(
            result,
            Err(OperatorError::Server { status: 403, .. })
        ));
    }
}
