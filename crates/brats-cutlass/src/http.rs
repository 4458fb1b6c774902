//! Blocking HTTP probes against deployed applications

use std::collections::BTreeMap;
use std::time::Duration;

use crate::error::{Error, Result};

/// Response of a probe, with every header value kept
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub headers: BTreeMap<String, Vec<String>>,
    pub body: String,
}

impl HttpResponse {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .get(&name.to_ascii_lowercase())
            .and_then(|values| values.first())
            .map(String::as_str)
    }
}

/// Thin wrapper over a blocking `reqwest` client
#[derive(Debug, Clone)]
pub struct HttpClient {
    client: reqwest::blocking::Client,
}

impl HttpClient {
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| Error::Http {
                url: String::new(),
                message: e.to_string(),
            })?;
        Ok(Self { client })
    }

    /// GET `url`. Non-2xx statuses are returned, not treated as errors.
    pub fn get(&self, url: &str, headers: &BTreeMap<String, String>) -> Result<HttpResponse> {
        let mut request = self.client.get(url);
        for (name, value) in headers {
            request = request.header(name.as_str(), value.as_str());
        }

        tracing::debug!(%url, "HTTP GET");
        let response = request.send().map_err(|e| Error::Http {
            url: url.to_string(),
            message: e.to_string(),
        })?;

        let status = response.status().as_u16();
        let mut collected: BTreeMap<String, Vec<String>> = BTreeMap::new();
        for (name, value) in response.headers() {
            collected
                .entry(name.as_str().to_ascii_lowercase())
                .or_default()
                .push(String::from_utf8_lossy(value.as_bytes()).to_string());
        }
        let body = response.text().map_err(|e| Error::Http {
            url: url.to_string(),
            message: e.to_string(),
        })?;

        Ok(HttpResponse {
            status,
            headers: collected,
            body,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_header_lookup_is_case_insensitive() {
        let mut headers = BTreeMap::new();
        headers.insert("content-type".to_string(), vec!["text/plain".to_string()]);
        let response = HttpResponse {
            status: 200,
            headers,
            body: String::new(),
        };
        assert_eq!(response.header("Content-Type"), Some("text/plain"));
        assert_eq!(response.header("X-Missing"), None);
    }

    #[test]
    fn test_connection_refused_is_http_error() {
        let client = HttpClient::new(Duration::from_secs(2)).unwrap();
        let err = client
            .get("http://127.0.0.1:1/version", &BTreeMap::new())
            .unwrap_err();
        assert!(matches!(err, Error::Http { .. }), "got {err:?}");
    }
}
