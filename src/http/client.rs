use std::time::Duration;

use reqwest::header::{HeaderName, HeaderValue};
use tracing::debug;

use super::request::ApiRequest;
use super::response::ApiResponse;

#[derive(Debug, Clone, Default)]
pub struct ClientOptions {
    pub timeout_ms: Option<u64>,
    pub verify_ssl: bool,
}

/// Thin reqwest wrapper that sends pre-rendered requests and hands back
/// the raw reply.
#[derive(Debug, Clone)]
pub struct HttpClient {
    inner: reqwest::Client,
}

impl HttpClient {
    pub fn new(options: &ClientOptions) -> Result<Self, String> {
        let mut builder = reqwest::Client::builder();

        if let Some(ms) = options.timeout_ms {
            if ms > 0 {
                builder = builder.timeout(Duration::from_millis(ms));
            }
        }

        // Scanners ship self-signed certificates.
        if !options.verify_ssl {
            builder = builder.danger_accept_invalid_certs(true);
        }

        let inner = builder
            .build()
            .map_err(|e| format!("Failed to build HTTP client: {e}"))?;
        Ok(Self { inner })
    }

    pub async fn send(&self, base_url: &str, request: &ApiRequest) -> Result<ApiResponse, String> {
        let url = reqwest::Url::parse(base_url)
            .and_then(|base| base.join(&request.uri))
            .map_err(|e| format!("Invalid URL: {e}"))?;

        let mut req_builder = self.inner.request(request.method.into(), url);
        req_builder = apply_headers(req_builder, &request.headers)?;
        if let Some(body) = &request.body {
            req_builder = req_builder.body(body.clone());
        }

        debug!(method = %request.method, uri = %request.uri, "sending request");
        let response = req_builder
            .send()
            .await
            .map_err(|e| format!("Request failed: {e}"))?;

        let status = response.status().as_u16();
        let headers = format_headers(response.headers());
        let bytes = response
            .bytes()
            .await
            .map_err(|e| format!("Failed to read response: {e}"))?;

        Ok(ApiResponse {
            status,
            headers,
            body: String::from_utf8_lossy(&bytes).into_owned(),
        })
    }
}

fn format_headers(headers: &reqwest::header::HeaderMap) -> Vec<String> {
    headers
        .iter()
        .map(|(name, value)| format!("{name}: {}", value.to_str().unwrap_or("<binary>")))
        .collect()
}

fn apply_headers(
    mut req_builder: reqwest::RequestBuilder,
    headers: &[String],
) -> Result<reqwest::RequestBuilder, String> {
    for line in headers {
        let (key, value) = parse_header_line(line)?;
        let header_name =
            HeaderName::from_bytes(key.as_bytes()).map_err(|e| format!("Invalid header key `{key}`: {e}"))?;
        let header_value =
            HeaderValue::from_str(value).map_err(|e| format!("Invalid header value `{value}`: {e}"))?;
        req_builder = req_builder.header(header_name, header_value);
    }

    Ok(req_builder)
}

fn parse_header_line(line: &str) -> Result<(&str, &str), String> {
    let raw = line.trim();
    let (key, value) = raw
        .split_once(':')
        .ok_or_else(|| format!("Invalid header format: {raw}"))?;
    let key = key.trim();
    if key.is_empty() {
        return Err(format!("Header key is empty: {raw}"));
    }
    Ok((key, value.trim()))
}
