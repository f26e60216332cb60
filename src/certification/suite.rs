use std::fmt::{self, Display};
use std::fs;
use std::path::{Path, PathBuf};

use crate::json::{JsonLookup, JsonPath};

/// Marker between the metadata document and the raw task.
pub const SEPARATOR: &str = "***DATADATADATA***";

/// Problems with the suite root itself; these end the run.
#[derive(Debug, thiserror::Error)]
pub enum SuiteError {
    #[error("cannot find certification folder: {}", .0.display())]
    MissingRoot(PathBuf),
    #[error("cannot read certification folder {}: {message}", .path.display())]
    Unreadable { path: PathBuf, message: String },
    #[error("cannot find any certification categories: {}", .0.display())]
    NoCategories(PathBuf),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequiredField {
    Category,
    Summary,
    Description,
    Expects,
}

impl RequiredField {
    pub const ALL: [RequiredField; 4] = [
        RequiredField::Category,
        RequiredField::Summary,
        RequiredField::Description,
        RequiredField::Expects,
    ];

    fn path(self) -> JsonPath {
        match self {
            RequiredField::Category => JsonPath::parse("category"),
            RequiredField::Summary => JsonPath::parse("summary"),
            RequiredField::Description => JsonPath::parse("description"),
            RequiredField::Expects => JsonPath::parse("expects[0]"),
        }
    }
}

impl Display for RequiredField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            RequiredField::Category => "category",
            RequiredField::Summary => "summary",
            RequiredField::Description => "description",
            RequiredField::Expects => "expects",
        };
        write!(f, "{label}")
    }
}

/// Why a suite file produced no test case. Skips are never failures.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SkipReason {
    #[error("empty file")]
    EmptyFile,
    #[error("unreadable file: {0}")]
    Unreadable(String),
    #[error("data error")]
    DataFormat,
    #[error("json error at byte {0}")]
    Json(usize),
    #[error("missing {0}")]
    MissingField(RequiredField),
}

/// One parsed suite file.
#[derive(Debug, Clone)]
pub struct TestCase {
    pub category: String,
    pub file_id: String,
    pub metadata: JsonLookup,
    pub task: String,
}

impl TestCase {
    pub fn id(&self) -> String {
        test_id(&self.category, &self.file_id)
    }

    pub fn field(&self, name: &str) -> String {
        self.metadata.text(&JsonPath::parse(name)).unwrap_or_default()
    }
}

pub fn test_id(category: &str, file_id: &str) -> String {
    format!("{category}/{file_id}")
}

/// File id: the file name without its extension.
pub fn file_id(path: &Path) -> String {
    path.file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// A category directory and its test files, both in sorted order.
#[derive(Debug, Clone)]
pub struct Category {
    pub name: String,
    pub files: Vec<PathBuf>,
}

/// Enumerate categories (immediate subdirectories) and their files.
pub fn discover(root: &Path) -> Result<Vec<Category>, SuiteError> {
    if !root.is_dir() {
        return Err(SuiteError::MissingRoot(root.to_path_buf()));
    }

    let mut directories = list_dir(root)
        .map_err(|message| SuiteError::Unreadable {
            path: root.to_path_buf(),
            message,
        })?
        .into_iter()
        .filter(|path| path.is_dir())
        .collect::<Vec<_>>();
    if directories.is_empty() {
        return Err(SuiteError::NoCategories(root.to_path_buf()));
    }
    directories.sort();

    let categories = directories
        .into_iter()
        .map(|directory| {
            let name = directory
                .file_name()
                .map(|name| name.to_string_lossy().into_owned())
                .unwrap_or_default();
            let mut files = match list_dir(&directory) {
                Ok(entries) => entries.into_iter().filter(|path| path.is_file()).collect(),
                Err(err) => {
                    tracing::warn!(category = %name, "{err}");
                    Vec::new()
                }
            };
            files.sort();
            Category { name, files }
        })
        .collect();

    Ok(categories)
}

fn list_dir(path: &Path) -> Result<Vec<PathBuf>, String> {
    let entries = fs::read_dir(path)
        .map_err(|e| format!("Failed to read directory `{}`: {e}", path.display()))?;
    let mut paths = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|e| format!("Failed to read directory `{}`: {e}", path.display()))?;
        paths.push(entry.path());
    }
    Ok(paths)
}

pub fn load_test_file(category: &str, path: &Path) -> Result<TestCase, SkipReason> {
    let text = fs::read_to_string(path).map_err(|e| SkipReason::Unreadable(e.to_string()))?;
    parse_test_file(category, &file_id(path), &text)
}

pub fn parse_test_file(category: &str, file_id: &str, text: &str) -> Result<TestCase, SkipReason> {
    if text.is_empty() {
        return Err(SkipReason::EmptyFile);
    }

    let (metadata, task) = split_payload(text).ok_or(SkipReason::DataFormat)?;
    let metadata = JsonLookup::load(metadata).map_err(|err| SkipReason::Json(err.index()))?;

    for field in RequiredField::ALL {
        if !metadata.has(&field.path()) {
            return Err(SkipReason::MissingField(field));
        }
    }

    Ok(TestCase {
        category: category.to_string(),
        file_id: file_id.to_string(),
        metadata,
        task: task.to_string(),
    })
}

/// Split on the separator line (LF or CRLF terminated), dropping empty
/// pieces. Exactly two pieces must remain.
pub fn split_payload(text: &str) -> Option<(&str, &str)> {
    if !text.contains(SEPARATOR) {
        return None;
    }

    let mut parts = Vec::new();
    let mut start = 0;
    let mut cursor = 0;
    while let Some(found) = text[cursor..].find(SEPARATOR) {
        let marker = cursor + found;
        let after = marker + SEPARATOR.len();
        let terminator = if text[after..].starts_with("\r\n") {
            2
        } else if text[after..].starts_with('\n') {
            1
        } else {
            cursor = after;
            continue;
        };
        parts.push(&text[start..marker]);
        start = after + terminator;
        cursor = start;
    }
    parts.push(&text[start..]);

    let parts: Vec<&str> = parts.into_iter().filter(|part| !part.is_empty()).collect();
    match parts.as_slice() {
        [metadata, task] => Some((metadata, task)),
        _ => None,
    }
}
