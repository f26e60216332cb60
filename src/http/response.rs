#[derive(Debug, Clone, Default)]
pub struct ApiResponse {
    pub status: u16,
    /// `name: value` lines, in the order the server sent them.
    pub headers: Vec<String>,
    pub body: String,
}
