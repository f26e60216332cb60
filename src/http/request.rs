use super::method::HttpMethod;

/// A request exactly as it goes on the wire.
#[derive(Debug, Clone)]
pub struct ApiRequest {
    pub method: HttpMethod,
    pub uri: String,
    /// `Name: value` lines, in send order.
    pub headers: Vec<String>,
    pub body: Option<String>,
}
