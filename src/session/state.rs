use std::fmt::{self, Display};

/// Session state as reported by the scanner in `results.session.state`.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum SessionState {
    #[default]
    NoSession,
    Ready,
    Capturing,
    Draining,
    Closed,
    Other(String),
}

impl SessionState {
    pub fn parse(state: &str) -> Self {
        match state {
            "noSession" => SessionState::NoSession,
            "ready" => SessionState::Ready,
            "capturing" => SessionState::Capturing,
            "draining" => SessionState::Draining,
            "closed" => SessionState::Closed,
            other => SessionState::Other(other.to_string()),
        }
    }

    /// Suffix shown in the console prompt, empty when there is no session.
    pub fn prompt_tag(&self) -> String {
        match self {
            SessionState::NoSession => String::new(),
            SessionState::Ready => ".rdy".into(),
            SessionState::Capturing => ".cap".into(),
            SessionState::Draining => ".drn".into(),
            SessionState::Closed => ".cls".into(),
            SessionState::Other(other) => format!(".{other}"),
        }
    }
}

impl Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            SessionState::NoSession => "noSession",
            SessionState::Ready => "ready",
            SessionState::Capturing => "capturing",
            SessionState::Draining => "draining",
            SessionState::Closed => "closed",
            SessionState::Other(other) => other,
        };
        write!(f, "{label}")
    }
}
