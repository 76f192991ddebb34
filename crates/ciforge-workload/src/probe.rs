//! Minimal HTTP/1 GET over a raw TCP connection.
//!
//! Used for platform reachability and for asking an echo service for the
//! caller's outbound address. Everything else in ciforge is synchronous, so
//! [`get_blocking`] runs the request on a throwaway current-thread runtime.

use std::time::Duration;

use http_body_util::BodyExt;
use tracing::debug;

use crate::error::{WorkloadError, WorkloadResult};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeResponse {
    pub status: u16,
    pub body: Vec<u8>,
}

impl ProbeResponse {
    pub fn body_text(&self) -> String {
        String::from_utf8_lossy(&self.body).trim().to_string()
    }
}

/// `GET http://{address}{path}`, bounded by `timeout`.
pub async fn http_get(address: &str, path: &str, timeout: Duration) -> WorkloadResult<ProbeResponse> {
    let uri = format!("http://{address}{path}");
    let host = address.split(':').next().unwrap_or(address);
    let failed = |reason: String| WorkloadError::Http {
        address: address.to_string(),
        reason,
    };

    let result = tokio::time::timeout(timeout, async {
        let stream = tokio::net::TcpStream::connect(address)
            .await
            .map_err(|e| failed(e.to_string()))?;

        let io = hyper_util::rt::TokioIo::new(stream);
        let (mut sender, conn) = hyper::client::conn::http1::handshake(io)
            .await
            .map_err(|e| failed(e.to_string()))?;

        // Drive the connection in the background.
        tokio::spawn(async move {
            let _ = conn.await;
        });

        let req = http::Request::builder()
            .method("GET")
            .uri(path)
            .header("host", host)
            .header("user-agent", concat!("ciforge/", env!("CARGO_PKG_VERSION")))
            .body(http_body_util::Empty::<bytes::Bytes>::new())
            .map_err(|e| failed(e.to_string()))?;

        let resp = sender
            .send_request(req)
            .await
            .map_err(|e| failed(e.to_string()))?;
        let status = resp.status().as_u16();
        let body = resp
            .into_body()
            .collect()
            .await
            .map_err(|e| failed(e.to_string()))?
            .to_bytes()
            .to_vec();

        debug!(%uri, status, bytes = body.len(), "HTTP probe answered");
        Ok::<_, WorkloadError>(ProbeResponse { status, body })
    })
    .await;

    match result {
        Ok(response) => response,
        Err(_) => {
            debug!(%uri, "HTTP probe timed out");
            Err(WorkloadError::Timeout {
                address: address.to_string(),
            })
        }
    }
}

/// Blocking wrapper around [`http_get`].
pub fn get_blocking(address: &str, path: &str, timeout: Duration) -> WorkloadResult<ProbeResponse> {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;
    runtime.block_on(http_get(address, path, timeout))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};

    async fn serve_once(response: &'static [u8]) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap().to_string();
        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut buf = [0u8; 1024];
            let _ = socket.read(&mut buf).await;
            socket.write_all(response).await.unwrap();
            socket.shutdown().await.ok();
        });
        addr
    }

    #[tokio::test]
    async fn reads_status_and_body() {
        let addr = serve_once(b"HTTP/1.1 200 OK\r\ncontent-length: 11\r\n\r\n192.0.2.0\r\n").await;
        let resp = http_get(&addr, "/", Duration::from_secs(2)).await.unwrap();
        assert_eq!(resp.status, 200);
        assert_eq!(resp.body_text(), "192.0.2.0");
    }

    #[tokio::test]
    async fn non_success_status_is_still_a_response() {
        let addr = serve_once(b"HTTP/1.1 401 Unauthorized\r\ncontent-length: 0\r\n\r\n").await;
        let resp = http_get(&addr, "/api/v1/info", Duration::from_secs(2)).await.unwrap();
        assert_eq!(resp.status, 401);
    }

    #[tokio::test]
    async fn refused_connection_is_an_error() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap().to_string();
        drop(listener);
        let err = http_get(&addr, "/", Duration::from_secs(2)).await.unwrap_err();
        assert!(matches!(err, WorkloadError::Http { .. }));
    }

    #[test]
    fn blocking_wrapper_times_out() {
        // A listener that accepts but never answers.
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap().to_string();
        let err = get_blocking(&addr, "/", Duration::from_millis(200)).unwrap_err();
        assert!(matches!(err, WorkloadError::Timeout { .. }));
        drop(listener);
    }
}
