//! HTTP client for the authorization service and the registry.

use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::debug;
use url::Url;

use crate::config::RegistrationConfig;
use crate::domain::entities::{
    ChallengeKey, ChallengeResponse, SignedSubmission, SubmitResponse, SIGNATURE_HEADER,
};
use crate::ports::outbound::{AuthorizationGateway, GatewayError, RegistryGateway};

/// Challenge request body.
#[derive(Debug, Serialize)]
struct ChallengeRequest<'a> {
    #[serde(rename = "coinId")]
    coin_id: &'a str,
}

/// reqwest-backed client implementing both outbound ports.
#[derive(Debug, Clone)]
pub struct HttpRegistryClient {
    client: Client,
    auth_url: Url,
    add_tail_url: String,
}

impl HttpRegistryClient {
    /// Create a client from validated configuration.
    pub fn new(config: &RegistrationConfig) -> Result<Self, GatewayError> {
        let client = Client::builder()
            .timeout(config.request_timeout())
            .connect_timeout(config.connect_timeout())
            .build()
            .map_err(|e| GatewayError::Http(e.to_string()))?;
        let auth_url = Url::parse(&config.auth_url).map_err(|e| {
            GatewayError::Http(format!("Invalid auth URL {}: {e}", config.auth_url))
        })?;

        Ok(Self {
            client,
            auth_url,
            add_tail_url: config.add_tail_url.clone(),
        })
    }

    /// `{auth_url}/{hash}`, with the hash percent-encoded as one path segment.
    pub fn challenge_url(&self, hash: &str) -> Result<Url, GatewayError> {
        let mut url = self.auth_url.clone();
        url.path_segments_mut()
            .map_err(|_| {
                GatewayError::Http(format!("Auth URL {} cannot take a path", self.auth_url))
            })?
            .pop_if_empty()
            .push(hash);
        Ok(url)
    }

    pub fn add_tail_url(&self) -> &str {
        &self.add_tail_url
    }

    fn map_send_error(&self, url: &str, error: reqwest::Error) -> GatewayError {
        if error.is_connect() {
            GatewayError::Connection(format!("Cannot connect to {url}"))
        } else {
            GatewayError::Http(error.to_string())
        }
    }

    async fn read_json<R: DeserializeOwned>(response: Response) -> Result<R, GatewayError> {
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(GatewayError::Status {
                status: status.as_u16(),
                body,
            });
        }
        response
            .json()
            .await
            .map_err(|e| GatewayError::Parse(e.to_string()))
    }
}

#[async_trait::async_trait]
impl AuthorizationGateway for HttpRegistryClient {
    async fn fetch_challenge(&self, key: &ChallengeKey) -> Result<ChallengeResponse, GatewayError> {
        let url = self.challenge_url(key.hash())?;
        debug!(url = %url, "Requesting signing challenge");

        let response = self
            .client
            .post(url.clone())
            .json(&ChallengeRequest {
                coin_id: key.coin_id(),
            })
            .send()
            .await
            .map_err(|e| self.map_send_error(url.as_str(), e))?;

        Self::read_json(response).await
    }
}

#[async_trait::async_trait]
impl RegistryGateway for HttpRegistryClient {
    async fn submit_record(
        &self,
        submission: &SignedSubmission,
    ) -> Result<SubmitResponse, GatewayError> {
        debug!(url = %self.add_tail_url, hash = %submission.record().hash, "Submitting TAIL record");

        let response = self
            .client
            .post(&self.add_tail_url)
            .header(SIGNATURE_HEADER, submission.signature())
            .json(submission.record())
            .send()
            .await
            .map_err(|e| self.map_send_error(&self.add_tail_url, e))?;

        Self::read_json(response).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::{Category, SubmissionRecord};
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;
    use tokio::task::JoinHandle;

    /// Serve one canned HTTP reply and return the raw request.
    async fn serve_once(status: &'static str, body: &'static str) -> (String, JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let base = format!("http://{}", listener.local_addr().unwrap());

        let handle = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut request = Vec::new();
            let mut buf = [0u8; 4096];
            loop {
                let n = socket.read(&mut buf).await.unwrap();
                if n == 0 {
                    break;
                }
                request.extend_from_slice(&buf[..n]);
                if request_complete(&request) {
                    break;
                }
            }
            let reply = format!(
                "HTTP/1.1 {status}\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{body}",
                body.len()
            );
            socket.write_all(reply.as_bytes()).await.unwrap();
            socket.shutdown().await.ok();
            String::from_utf8_lossy(&request).into_owned()
        });

        (base, handle)
    }

    fn request_complete(request: &[u8]) -> bool {
        let text = String::from_utf8_lossy(request);
        let Some(split) = text.find("\r\n\r\n") else {
            return false;
        };
        let content_length = text[..split]
            .lines()
            .find_map(|line| {
                let (name, value) = line.split_once(':')?;
                name.eq_ignore_ascii_case("content-length")
                    .then(|| value.trim().parse::<usize>().ok())
                    .flatten()
            })
            .unwrap_or(0);
        request.len() >= split + 4 + content_length
    }

    fn client_for(base: &str) -> HttpRegistryClient {
        HttpRegistryClient::new(&RegistrationConfig::for_base_url(base)).unwrap()
    }

    fn signed() -> SignedSubmission {
        let record = SubmissionRecord {
            hash: "a".repeat(64),
            name: "Spacebucks".into(),
            code: "SBX".into(),
            category: Category::Meme,
            description: String::new(),
            launcher_id: "00".repeat(32),
            eve_coin_id: "b".repeat(64),
            website_url: Some("https://spacebucks.example".into()),
            twitter_url: None,
            discord_url: None,
        };
        SignedSubmission::new(record, "deadbeef".into())
    }

    #[test]
    fn test_challenge_url() {
        let client = client_for("http://localhost:9000/");
        assert_eq!(
            client.challenge_url("abc").unwrap().as_str(),
            "http://localhost:9000/auth/abc"
        );
        assert_eq!(client.add_tail_url(), "http://localhost:9000/addTail");

        let mut config = RegistrationConfig::for_base_url("http://localhost:9000");
        config.auth_url = "http://localhost:9000/auth/".into();
        let client = HttpRegistryClient::new(&config).unwrap();
        assert_eq!(
            client.challenge_url("abc").unwrap().as_str(),
            "http://localhost:9000/auth/abc"
        );
    }

    #[test]
    fn test_challenge_url_keeps_hash_in_path() {
        let client = client_for("http://localhost:9000");
        let url = client.challenge_url("ab#c?d/e").unwrap();
        assert_eq!(url.as_str(), "http://localhost:9000/auth/ab%23c%3Fd%2Fe");
        assert_eq!(url.query(), None);
        assert_eq!(url.fragment(), None);
    }

    #[tokio::test]
    async fn test_fetch_challenge_posts_coin_id() {
        let (base, server) =
            serve_once("200 OK", r#"{"address":"xch1signer","message":"sign-me"}"#).await;
        let client = client_for(&base);
        let key = ChallengeKey::new("a".repeat(64), "b".repeat(64));

        let response = client.fetch_challenge(&key).await.unwrap();
        assert_eq!(response.address.as_deref(), Some("xch1signer"));
        assert_eq!(response.message.as_deref(), Some("sign-me"));

        let request = server.await.unwrap();
        assert!(request.starts_with(&format!("POST /auth/{} ", "a".repeat(64))));
        assert!(request.contains(&format!(r#"{{"coinId":"{}"}}"#, "b".repeat(64))));
    }

    #[tokio::test]
    async fn test_empty_challenge_reply() {
        let (base, server) = serve_once("200 OK", "{}").await;
        let key = ChallengeKey::new("a".repeat(64), "b".repeat(64));

        let response = client_for(&base).fetch_challenge(&key).await.unwrap();
        assert_eq!(response, ChallengeResponse::default());
        server.await.unwrap();
    }

    #[tokio::test]
    async fn test_submit_sends_signature_header() {
        let (base, server) = serve_once("200 OK", r#"{"tx_id":"0xabc"}"#).await;

        let response = client_for(&base).submit_record(&signed()).await.unwrap();
        assert_eq!(response.tx_id.as_deref(), Some("0xabc"));

        let request = server.await.unwrap();
        let lower = request.to_ascii_lowercase();
        assert!(request.starts_with("POST /addTail "));
        assert!(lower.contains("x-chia-signature: deadbeef"));
        assert!(request.contains(r#""launcherId":"#));
        assert!(request.contains(r#""eveCoinId":"#));
        assert!(request.contains(r#""website_url":"https://spacebucks.example""#));
        assert!(!request.contains("twitter_url"));
        assert!(!request.contains("deadbeef\""));
    }

    #[tokio::test]
    async fn test_error_status_maps_to_status_error() {
        let (base, server) = serve_once("500 Internal Server Error", r#"{"oops":true}"#).await;

        let err = client_for(&base).submit_record(&signed()).await.unwrap_err();
        assert_eq!(
            err,
            GatewayError::Status {
                status: 500,
                body: r#"{"oops":true}"#.into()
            }
        );
        server.await.unwrap();
    }

    #[tokio::test]
    async fn test_malformed_body_is_parse_error() {
        let (base, server) = serve_once("200 OK", "not json").await;
        let key = ChallengeKey::new("a".repeat(64), "b".repeat(64));

        let err = client_for(&base).fetch_challenge(&key).await.unwrap_err();
        assert!(matches!(err, GatewayError::Parse(_)));
        server.await.unwrap();
    }

    #[tokio::test]
    async fn test_refused_connection() {
        // Bind then drop to get a port nothing listens on
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let base = format!("http://{}", listener.local_addr().unwrap());
        drop(listener);

        let key = ChallengeKey::new("a".repeat(64), "b".repeat(64));
        let err = client_for(&base).fetch_challenge(&key).await.unwrap_err();
        assert!(matches!(err, GatewayError::Connection(_)));
    }
}
