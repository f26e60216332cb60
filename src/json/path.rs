use std::fmt::{self, Display};

/// One step of a [`JsonPath`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    Key(String),
    Index(usize),
}

/// A parsed dotted path such as `expects[0].success`.
///
/// Paths are built from segment lists and only rendered back to text for
/// diagnostics, so prefixes can be combined without string surgery.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct JsonPath {
    segments: Vec<Segment>,
}

impl JsonPath {
    pub fn root() -> Self {
        Self::default()
    }

    /// Parse `a.b[2].c`. Empty input (or only dots) yields the root path.
    /// A bracket group that is not a valid index keeps the whole part as a
    /// literal key.
    pub fn parse(path: &str) -> Self {
        let mut segments = Vec::new();
        for part in path.split('.') {
            let part = part.trim();
            if part.is_empty() {
                continue;
            }
            push_part(&mut segments, part);
        }
        Self { segments }
    }

    pub fn key(mut self, key: impl Into<String>) -> Self {
        self.segments.push(Segment::Key(key.into()));
        self
    }

    pub fn index(mut self, index: usize) -> Self {
        self.segments.push(Segment::Index(index));
        self
    }

    pub fn join(&self, other: &JsonPath) -> JsonPath {
        let mut segments = self.segments.clone();
        segments.extend(other.segments.iter().cloned());
        JsonPath { segments }
    }

    pub fn is_root(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }
}

fn push_part(segments: &mut Vec<Segment>, part: &str) {
    let Some(open) = part.find('[') else {
        segments.push(Segment::Key(part.to_string()));
        return;
    };

    let (name, mut rest) = part.split_at(open);
    let mut indices = Vec::new();
    while let Some(stripped) = rest.strip_prefix('[') {
        let Some(close) = stripped.find(']') else {
            break;
        };
        let Ok(index) = stripped[..close].trim().parse::<usize>() else {
            break;
        };
        indices.push(index);
        rest = &stripped[close + 1..];
    }

    if !rest.is_empty() {
        segments.push(Segment::Key(part.to_string()));
        return;
    }
    if !name.is_empty() {
        segments.push(Segment::Key(name.to_string()));
    }
    segments.extend(indices.into_iter().map(Segment::Index));
}

impl Display for JsonPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (position, segment) in self.segments.iter().enumerate() {
            match segment {
                Segment::Key(key) if position == 0 => write!(f, "{key}")?,
                Segment::Key(key) => write!(f, ".{key}")?,
                Segment::Index(index) => write!(f, "[{index}]")?,
            }
        }
        Ok(())
    }
}
