// src/fetch/mod.rs

use futures::future::BoxFuture;
use reqwest::Client;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::debug;
use url::Url;

use crate::error::{DataLoadError, Result};

/// Somewhere the exporter's CSV files can be read from.
pub trait CsvSource: Send + Sync {
    /// Fetch the raw bytes of the resource called `name` (e.g. `data.csv`).
    fn fetch<'a>(&'a self, name: &'a str) -> BoxFuture<'a, Result<Vec<u8>>>;

    /// Human-readable location, used in logs.
    fn describe(&self) -> String;
}

/// Serves files relative to an HTTP(S) base URL.
#[derive(Clone)]
pub struct HttpSource {
    client: Client,
    base: Url,
}

impl HttpSource {
    pub fn new(client: Client, base: &str) -> Result<Self> {
        // `join` drops the last path segment unless the base ends with '/'
        let normalized = if base.ends_with('/') {
            base.to_string()
        } else {
            format!("{}/", base)
        };
        let base = Url::parse(&normalized).map_err(|e| DataLoadError::Request {
            url: base.to_string(),
            message: format!("invalid base URL: {}", e),
        })?;
        Ok(Self { client, base })
    }

    async fn get_bytes(&self, name: &str) -> Result<Vec<u8>> {
        let url = self.base.join(name).map_err(|e| DataLoadError::Request {
            url: format!("{}{}", self.base, name),
            message: e.to_string(),
        })?;
        debug!(%url, "fetching");

        let resp = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(|e| request_error(&url, e))?;

        let status = resp.status();
        if !status.is_success() {
            return Err(DataLoadError::Http {
                url: url.to_string(),
                status: status.as_u16(),
                reason: status.canonical_reason().unwrap_or("").to_string(),
            });
        }

        let body = resp.bytes().await.map_err(|e| request_error(&url, e))?;
        Ok(body.to_vec())
    }
}

impl CsvSource for HttpSource {
    fn fetch<'a>(&'a self, name: &'a str) -> BoxFuture<'a, Result<Vec<u8>>> {
        Box::pin(self.get_bytes(name))
    }

    fn describe(&self) -> String {
        self.base.to_string()
    }
}

fn request_error(url: &Url, e: reqwest::Error) -> DataLoadError {
    DataLoadError::Request {
        url: url.to_string(),
        message: e.to_string(),
    }
}

/// Serves files from a local directory, e.g. the exporter's `public/data`.
#[derive(Clone, Debug)]
pub struct DirSource {
    dir: PathBuf,
}

impl DirSource {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }
}

impl CsvSource for DirSource {
    fn fetch<'a>(&'a self, name: &'a str) -> BoxFuture<'a, Result<Vec<u8>>> {
        Box::pin(async move {
            let path = self.dir.join(name);
            debug!(path = %path.display(), "reading");
            tokio::fs::read(&path).await.map_err(|e| DataLoadError::Io {
                path: path.display().to_string(),
                message: e.to_string(),
            })
        })
    }

    fn describe(&self) -> String {
        self.dir.display().to_string()
    }
}

/// Pick a source for `base`: anything with an http(s) scheme goes over the
/// network, everything else is treated as a directory.
pub fn source_for(base: &str) -> Result<Arc<dyn CsvSource>> {
    match Url::parse(base) {
        Ok(u) if u.scheme() == "http" || u.scheme() == "https" => {
            Ok(Arc::new(HttpSource::new(Client::new(), base)?))
        }
        _ => Ok(Arc::new(DirSource::new(base))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    fn local_client() -> Client {
        Client::builder().no_proxy().build().unwrap()
    }

    /// One-shot HTTP server answering the first request with `response`.
    async fn serve_once(response: &'static [u8]) -> (String, tokio::task::JoinHandle<()>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let handle = tokio::spawn(async move {
            let (mut sock, _) = listener.accept().await.unwrap();
            let mut buf = vec![0u8; 4096];
            let mut read = 0;
            // read until the end of the request head
            while !buf[..read].windows(4).any(|w| w == b"\r\n\r\n") {
                let n = sock.read(&mut buf[read..]).await.unwrap();
                if n == 0 {
                    break;
                }
                read += n;
            }
            sock.write_all(response).await.unwrap();
            sock.shutdown().await.unwrap();
        });
        (format!("http://{}/factbook", addr), handle)
    }

    #[tokio::test]
    async fn http_error_status_is_reported() {
        let (base, server) = serve_once(
            b"HTTP/1.1 503 Service Unavailable\r\ncontent-length: 0\r\nconnection: close\r\n\r\n",
        )
        .await;
        let src = HttpSource::new(local_client(), &base).unwrap();

        let err = src.fetch("data.csv").await.unwrap_err();
        assert_eq!(
            err,
            DataLoadError::Http {
                url: format!("{}/data.csv", base),
                status: 503,
                reason: "Service Unavailable".into(),
            }
        );
        server.await.unwrap();
    }

    #[tokio::test]
    async fn http_success_returns_body() {
        let (base, server) = serve_once(
            b"HTTP/1.1 200 OK\r\ncontent-length: 22\r\nconnection: close\r\n\r\nvector,ref_date,value\n",
        )
        .await;
        let src = HttpSource::new(local_client(), &base).unwrap();

        let bytes = src.fetch("data.csv").await.unwrap();
        assert_eq!(bytes, b"vector,ref_date,value\n");
        server.await.unwrap();
    }

    #[tokio::test]
    async fn refused_connection_is_a_request_error() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let src = HttpSource::new(local_client(), &format!("http://{}/", addr)).unwrap();
        let err = src.fetch("data.csv").await.unwrap_err();
        match err {
            DataLoadError::Request { url, .. } => {
                assert_eq!(url, format!("http://{}/data.csv", addr));
            }
            other => panic!("expected a request error, got {:?}", other),
        }
        assert_eq!(src.fetch("data.csv").await.unwrap_err().status(), None);
    }

    #[tokio::test]
    async fn dir_source_reads_named_file() {
        let dir = tempfile::tempdir().unwrap();
        let mut f = std::fs::File::create(dir.path().join("data.csv")).unwrap();
        f.write_all(b"vector,ref_date,value\n").unwrap();

        let src = DirSource::new(dir.path());
        let bytes = src.fetch("data.csv").await.unwrap();
        assert_eq!(bytes, b"vector,ref_date,value\n");
    }

    #[tokio::test]
    async fn dir_source_missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let src = DirSource::new(dir.path());
        let err = src.fetch("data.csv").await.unwrap_err();
        assert!(matches!(err, DataLoadError::Io { .. }));
    }

    #[test]
    fn source_for_picks_by_scheme() {
        assert!(source_for("https://example.org/data")
            .unwrap()
            .describe()
            .starts_with("https://example.org/data/"));
        assert_eq!(source_for("public/data").unwrap().describe(), "public/data");
    }

    #[test]
    fn http_base_keeps_last_segment() {
        let src = HttpSource::new(Client::new(), "https://example.org/factbook/data").unwrap();
        assert_eq!(
            src.base.join("data.csv").unwrap().as_str(),
            "https://example.org/factbook/data/data.csv"
        );
    }
}
