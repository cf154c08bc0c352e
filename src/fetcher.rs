use reqwest::StatusCode;
use thiserror::Error;
use tracing::debug;

/// Desktop Chrome identity; the host serves degraded or empty pages to unknown clients.
pub const BROWSER_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) \
    AppleWebKit/537.36 (KHTML, like Gecko) Chrome/92.0.4515.131 Safari/537.36";

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("access forbidden (403) for {url}")]
    Forbidden { url: String },
    #[error("unexpected status {status} for {url}")]
    Status { url: String, status: u16 },
    #[error("request to {url} failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },
}

impl FetchError {
    pub fn is_forbidden(&self) -> bool {
        matches!(self, FetchError::Forbidden { .. })
    }
}

/// Retrieves one page and returns its decoded text.
pub trait PageFetcher {
    async fn fetch(&self, url: &str) -> Result<String, FetchError>;
}

pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    pub fn new() -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(BROWSER_USER_AGENT)
            .build()?;
        Ok(Self { client })
    }
}

impl PageFetcher for HttpFetcher {
    async fn fetch(&self, url: &str) -> Result<String, FetchError> {
        let transport = |source| FetchError::Transport {
            url: url.to_string(),
            source,
        };

        let response = self.client.get(url).send().await.map_err(transport)?;
        match response.status() {
            StatusCode::OK => {}
            StatusCode::FORBIDDEN => {
                return Err(FetchError::Forbidden {
                    url: url.to_string(),
                })
            }
            status => {
                return Err(FetchError::Status {
                    url: url.to_string(),
                    status: status.as_u16(),
                })
            }
        }

        let bytes = response.bytes().await.map_err(transport)?;
        debug!(url, bytes = bytes.len(), "fetched page");
        Ok(decode_body(&bytes))
    }
}

/// Always UTF-8, whatever the server declares; the host mislabels its charset.
pub fn decode_body(bytes: &[u8]) -> String {
    String::from_utf8_lossy(bytes).into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    /// Serve one canned response and hand back the raw request that was received.
    async fn serve_once(response: Vec<u8>) -> (String, tokio::task::JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let handle = tokio::spawn(async move {
            let (mut sock, _) = listener.accept().await.unwrap();
            let mut request = Vec::new();
            let mut buf = [0u8; 1024];
            while !request.windows(4).any(|w| w == b"\r\n\r\n") {
                let n = sock.read(&mut buf).await.unwrap();
                if n == 0 {
                    break;
                }
                request.extend_from_slice(&buf[..n]);
            }
            sock.write_all(&response).await.unwrap();
            sock.shutdown().await.unwrap();
            String::from_utf8_lossy(&request).into_owned()
        });
        (format!("http://{}/story/42", addr), handle)
    }

    fn http_response(status_line: &str, content_type: &str, body: &[u8]) -> Vec<u8> {
        let mut out = format!(
            "HTTP/1.1 {}\r\nContent-Type: {}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
            status_line,
            content_type,
            body.len()
        )
        .into_bytes();
        out.extend_from_slice(body);
        out
    }

    #[test]
    fn decode_replaces_invalid_sequences() {
        assert_eq!(decode_body("você".as_bytes()), "você");
        assert_eq!(decode_body(b"ok \xff end"), "ok \u{fffd} end");
    }

    #[tokio::test]
    async fn sends_browser_user_agent_and_forces_utf8() {
        // Declared latin-1, actually UTF-8: must not be double-decoded.
        let body = "<p>Você está lendo</p>".as_bytes();
        let (url, server) =
            serve_once(http_response("200 OK", "text/html; charset=iso-8859-1", body)).await;

        let text = HttpFetcher::new().unwrap().fetch(&url).await.unwrap();
        assert_eq!(text, "<p>Você está lendo</p>");

        let request = server.await.unwrap().to_lowercase();
        assert!(request.starts_with("get /story/42 "));
        assert!(request.contains(&format!("user-agent: {}", BROWSER_USER_AGENT.to_lowercase())));
    }

    #[tokio::test]
    async fn forbidden_is_distinct() {
        let (url, server) = serve_once(http_response("403 Forbidden", "text/html", b"")).await;
        let err = HttpFetcher::new().unwrap().fetch(&url).await.unwrap_err();
        server.await.unwrap();
        assert!(err.is_forbidden());
        assert!(err.to_string().contains("403"));
    }

    #[tokio::test]
    async fn other_status_is_not_forbidden() {
        let (url, server) =
            serve_once(http_response("404 Not Found", "text/html", b"gone")).await;
        let err = HttpFetcher::new().unwrap().fetch(&url).await.unwrap_err();
        server.await.unwrap();
        assert!(!err.is_forbidden());
        assert!(matches!(err, FetchError::Status { status: 404, .. }));
    }

    #[tokio::test]
    async fn connection_refused_is_transport_error() {
        // Bind then drop to get a port nobody listens on.
        let port = {
            let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
            listener.local_addr().unwrap().port()
        };
        let url = format!("http://127.0.0.1:{}/story", port);
        let err = HttpFetcher::new().unwrap().fetch(&url).await.unwrap_err();
        assert!(matches!(err, FetchError::Transport { .. }));
        assert!(!err.is_forbidden());
    }
}
