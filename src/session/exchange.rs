use crate::device::DeviceInfo;
use crate::http::method::HttpMethod;
use crate::http::request::ApiRequest;
use crate::http::response::ApiResponse;

/// Evidence captured for one API command: what went out and what came back.
///
/// A fresh exchange is used for every command; status `0` means no reply
/// was received.
#[derive(Debug, Clone, Default)]
pub struct Exchange {
    pub device: Option<DeviceInfo>,
    pub method: Option<HttpMethod>,
    pub uri: String,
    pub request_headers: Vec<String>,
    pub request_body: String,
    pub status: u16,
    pub response_headers: Vec<String>,
    pub response_body: String,
    pub error: Option<String>,
}

impl Exchange {
    pub fn new(device: Option<&DeviceInfo>) -> Self {
        Self {
            device: device.cloned(),
            ..Self::default()
        }
    }

    pub fn record_request(&mut self, base_url: &str, request: &ApiRequest) {
        self.method = Some(request.method);
        self.uri = format!("{}{}", base_url.trim_end_matches('/'), request.uri);
        self.request_headers = request.headers.clone();
        self.request_body = request.body.clone().unwrap_or_default();
    }

    pub fn record_response(&mut self, response: ApiResponse) {
        self.status = response.status;
        self.response_headers = response.headers;
        self.response_body = response.body;
    }

    pub fn record_error(&mut self, message: impl Into<String>) {
        self.error = Some(message.into());
    }

    pub fn succeeded(&self) -> bool {
        self.error.is_none() && self.status != 0
    }

    /// Human-readable dump of the exchange, one line per item.
    pub fn transcript(&self) -> Vec<String> {
        let mut lines = Vec::new();
        if let Some(device) = &self.device {
            lines.push(format!("DEVICE {device}").trim_end().to_string());
        }
        let method = self.method.map(|m| m.to_string()).unwrap_or_default();
        lines.push(format!("REQUEST {method} {}", self.uri).trim_end().to_string());
        lines.extend(self.request_headers.iter().cloned());
        if !self.request_body.is_empty() {
            lines.push(self.request_body.clone());
        }
        if self.status != 0 {
            lines.push(format!("RESPONSE {}", self.status));
            lines.extend(self.response_headers.iter().cloned());
            if !self.response_body.is_empty() {
                lines.push(self.response_body.clone());
            }
        }
        if let Some(error) = &self.error {
            lines.push(format!("ERROR {error}"));
        }
        lines
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn records_request_and_response() {
        let mut exchange = Exchange::new(None);
        exchange.record_request(
            "https://10.0.0.5:55555/",
            &ApiRequest {
                method: HttpMethod::Post,
                uri: "/privet/twaindirect/session".into(),
                headers: vec!["X-Privet-Token: abc".into()],
                body: Some("{}".into()),
            },
        );
        exchange.record_response(ApiResponse {
            status: 200,
            headers: vec!["content-type: application/json".into()],
            body: r#"{"results":{"success":true}}"#.into(),
        });

        assert!(exchange.succeeded());
        assert_eq!(exchange.uri, "https://10.0.0.5:55555/privet/twaindirect/session");
        assert_eq!(
            exchange.transcript(),
            vec![
                "REQUEST POST https://10.0.0.5:55555/privet/twaindirect/session".to_string(),
                "X-Privet-Token: abc".to_string(),
                "{}".to_string(),
                "RESPONSE 200".to_string(),
                "content-type: application/json".to_string(),
                r#"{"results":{"success":true}}"#.to_string(),
            ]
        );
    }

    #[test]
    fn transcript_names_the_device() {
        let device = DeviceInfo::from_spec("lab@10.0.0.5").unwrap();
        let mut exchange = Exchange::new(Some(&device));
        exchange.record_error("infoex: no reply");
        assert_eq!(
            exchange.transcript(),
            vec![
                "DEVICE lab 10.0.0.5".to_string(),
                "REQUEST".to_string(),
                "ERROR infoex: no reply".to_string(),
            ]
        );
    }

    #[test]
    fn error_without_reply_is_not_success() {
        let mut exchange = Exchange::new(None);
        exchange.record_error("Request failed: connection refused");
        assert!(!exchange.succeeded());
        assert_eq!(
            exchange.transcript().last().map(String::as_str),
            Some("ERROR Request failed: connection refused")
        );
    }
}
