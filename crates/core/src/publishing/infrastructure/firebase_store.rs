use std::time::Duration;

use crate::publishing::domain::decision_store::{DecisionStore, PublishError};
use crate::shared::constants::{DEFAULT_STORE_FIELD, DEFAULT_STORE_NODE};

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FirebaseConfig {
    /// Realtime Database root, e.g. `https://<project>.firebasedatabase.app`.
    pub database_url: String,
    /// Node holding the decision object.
    pub node_path: String,
    /// Field inside the node that carries the decision string.
    pub field: String,
    /// Database secret or ID token, sent as the `auth` query parameter.
    pub auth_token: Option<String>,
    pub timeout: Duration,
}

impl FirebaseConfig {
    pub fn new(database_url: &str) -> Self {
        Self {
            database_url: database_url.to_string(),
            node_path: DEFAULT_STORE_NODE.to_string(),
            field: DEFAULT_STORE_FIELD.to_string(),
            auth_token: None,
            timeout: DEFAULT_TIMEOUT,
        }
    }

    /// REST endpoint for the decision node.
    pub fn endpoint(&self) -> String {
        format!(
            "{}/{}.json",
            self.database_url.trim_end_matches('/'),
            self.node_path.trim_matches('/')
        )
    }
}

/// Firebase Realtime Database over its REST API.
///
/// Each write replaces the whole node with `{"<field>": "<value>"}`.
/// Requests block for at most the configured timeout.
pub struct FirebaseStore {
    client: reqwest::blocking::Client,
    config: FirebaseConfig,
    endpoint: String,
}

impl FirebaseStore {
    pub fn new(config: FirebaseConfig) -> Result<Self, PublishError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(config.timeout)
            .build()?;
        let endpoint = config.endpoint();
        log::info!("Publishing decisions to {endpoint}");
        Ok(Self {
            client,
            config,
            endpoint,
        })
    }
}

impl DecisionStore for FirebaseStore {
    fn write(&mut self, value: &str) -> Result<(), PublishError> {
        let mut body = serde_json::Map::new();
        body.insert(self.config.field.clone(), value.into());

        let mut request = self.client.put(&self.endpoint).json(&body);
        if let Some(token) = &self.config.auth_token {
            request = request.query(&[("auth", token)]);
        }

        let response = request.send()?;
        let status = response.status();
        if status.is_success() {
            return Ok(());
        }
        Err(PublishError::Rejected {
            status: status.as_u16(),
            body: response.text().unwrap_or_default(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_json, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn start_server() -> (tokio::runtime::Runtime, MockServer) {
        let runtime = tokio::runtime::Runtime::new().unwrap();
        let server = runtime.block_on(MockServer::start());
        (runtime, server)
    }

    fn store_for(server: &MockServer, token: Option<&str>) -> FirebaseStore {
        let mut config = FirebaseConfig::new(&server.uri());
        config.auth_token = token.map(str::to_string);
        config.timeout = Duration::from_millis(300);
        FirebaseStore::new(config).unwrap()
    }

    #[test]
    fn test_endpoint_joins_url_and_node() {
        let mut config = FirebaseConfig::new("https://example.firebasedatabase.app/");
        assert_eq!(
            config.endpoint(),
            "https://example.firebasedatabase.app/door_lock.json"
        );
        config.node_path = "/sites/front/".into();
        assert_eq!(
            config.endpoint(),
            "https://example.firebasedatabase.app/sites/front.json"
        );
    }

    #[test]
    fn test_write_puts_field_object() {
        let (runtime, server) = start_server();
        runtime.block_on(
            Mock::given(method("PUT"))
                .and(path("/door_lock.json"))
                .and(body_json(serde_json::json!({ "access": "Yes" })))
                .respond_with(ResponseTemplate::new(200))
                .expect(1)
                .mount(&server),
        );

        store_for(&server, None).write("Yes").unwrap();
    }

    #[test]
    fn test_write_sends_auth_token() {
        let (runtime, server) = start_server();
        runtime.block_on(
            Mock::given(method("PUT"))
                .and(query_param("auth", "s3cret"))
                .respond_with(ResponseTemplate::new(200))
                .expect(1)
                .mount(&server),
        );

        store_for(&server, Some("s3cret")).write("No").unwrap();
    }

    #[test]
    fn test_http_error_is_rejected() {
        let (runtime, server) = start_server();
        runtime.block_on(
            Mock::given(method("PUT"))
                .respond_with(ResponseTemplate::new(401).set_body_string("Permission denied"))
                .mount(&server),
        );

        let err = store_for(&server, None).write("Yes").unwrap_err();
        match err {
            PublishError::Rejected { status, body } => {
                assert_eq!(status, 401);
                assert!(body.contains("Permission denied"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_slow_store_times_out() {
        let (runtime, server) = start_server();
        runtime.block_on(
            Mock::given(method("PUT"))
                .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(2)))
                .mount(&server),
        );

        let err = store_for(&server, None).write("Yes").unwrap_err();
        assert!(matches!(err, PublishError::Transport(_)));
    }

    #[test]
    fn test_unreachable_store_is_transport_error() {
        let mut config = FirebaseConfig::new("http://127.0.0.1:9");
        config.timeout = Duration::from_millis(300);
        let err = FirebaseStore::new(config).unwrap().write("Yes").unwrap_err();
        assert!(matches!(err, PublishError::Transport(_)));
    }
}
