//! Blocking HTTP implementation of [`HttpFetch`].

use std::time::Duration;

use reqwest::blocking::Client;
use tracing::debug;

use super::HttpFetch;
use crate::error::FetchError;

/// Maximum number of redirects to follow.
const MAX_REDIRECTS: usize = 5;

/// Fetches feeds with one shared client, a bounded timeout and a fixed
/// user agent.
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    pub fn new(timeout: Duration, user_agent: &str) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .timeout(timeout)
            .connect_timeout(timeout)
            .redirect(reqwest::redirect::Policy::limited(MAX_REDIRECTS))
            .user_agent(user_agent)
            .build()?;
        Ok(Self { client })
    }
}

impl HttpFetch for HttpFetcher {
    fn get(&self, url: &url::Url) -> Result<Vec<u8>, FetchError> {
        let response = self.client.get(url.clone()).send()?;
        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status(status.as_u16()));
        }
        let body = response.bytes()?;
        debug!(%url, bytes = body.len(), "fetched");
        Ok(body.to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{BufRead, BufReader, Write};
    use std::net::TcpListener;
    use std::thread;

    /// Serve one connection: read the request head, then run `respond`.
    fn serve_once(respond: impl FnOnce(&mut std::net::TcpStream) + Send + 'static) -> url::Url {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        thread::spawn(move || {
            let (mut stream, _) = listener.accept().unwrap();
            let mut reader = BufReader::new(stream.try_clone().unwrap());
            let mut line = String::new();
            while reader.read_line(&mut line).unwrap_or(0) > 0 && line != "\r\n" {
                line.clear();
            }
            respond(&mut stream);
        });
        url::Url::parse(&format!("http://{addr}/feed")).unwrap()
    }

    fn fetcher(timeout_secs: u64) -> HttpFetcher {
        HttpFetcher::new(Duration::from_secs(timeout_secs), "job-watch-test").unwrap()
    }

    #[test]
    fn returns_body_on_success() {
        let url = serve_once(|stream| {
            let _ = stream.write_all(
                b"HTTP/1.1 200 OK\r\nContent-Length: 6\r\nConnection: close\r\n\r\n<rss/>",
            );
        });
        assert_eq!(fetcher(5).get(&url).unwrap(), b"<rss/>");
    }

    #[test]
    fn non_success_status_is_an_error() {
        let url = serve_once(|stream| {
            let _ = stream.write_all(
                b"HTTP/1.1 503 Service Unavailable\r\nContent-Length: 0\r\nConnection: close\r\n\r\n",
            );
        });
        assert!(matches!(fetcher(5).get(&url), Err(FetchError::Status(503))));
    }

    #[test]
    fn silent_server_times_out() {
        let url = serve_once(|_stream| {
            thread::sleep(Duration::from_secs(3));
        });
        assert!(matches!(fetcher(1).get(&url), Err(FetchError::Http(_))));
    }
}
