use serde::{Deserialize, Serialize};

use crate::json::{JsonLookup, JsonPath};

/// How the `expects` list is read from suite metadata.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ExpectsMode {
    /// Stop at the first absent or empty entry (the historic fixture rule).
    #[default]
    Sentinel,
    /// Every array entry is an expectation, empty ones included.
    Sequence,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExpectedSuccess {
    True,
    False,
    Invalid(Option<String>),
}

impl ExpectedSuccess {
    fn parse(value: Option<String>) -> Self {
        match value.as_deref() {
            Some("true") => ExpectedSuccess::True,
            Some("false") => ExpectedSuccess::False,
            _ => ExpectedSuccess::Invalid(value),
        }
    }
}

/// One `expects[i]` entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Expectation {
    pub index: usize,
    /// Prefix into the reply; root when the fixture gives no `path`.
    pub result_path: JsonPath,
    pub success: ExpectedSuccess,
    pub code: Option<String>,
    pub character_offset: Option<String>,
    pub json_key: Option<String>,
}

impl Expectation {
    pub fn from_metadata(metadata: &JsonLookup, index: usize) -> Self {
        let entry = entry_path(index);
        let field = |name: &str| metadata.text(&entry.clone().key(name));

        Self {
            index,
            result_path: field("path").map(|path| JsonPath::parse(&path)).unwrap_or_default(),
            success: ExpectedSuccess::parse(field("success")),
            code: field("code"),
            character_offset: field("characterOffset"),
            json_key: field("jsonKey"),
        }
    }

    /// `expects[i]` or `expects[i].<field>`, for diagnostics.
    pub fn check_name(&self, field: &str) -> String {
        entry_path(self.index).key(field).to_string()
    }

    /// `path` + `results.<name>` inside the reply.
    pub fn result_field(&self, name: &str) -> JsonPath {
        self.result_path.join(&JsonPath::root().key("results").key(name))
    }
}

fn entry_path(index: usize) -> JsonPath {
    JsonPath::root().key("expects").index(index)
}

pub fn collect_expectations(metadata: &JsonLookup, mode: ExpectsMode) -> Vec<Expectation> {
    match mode {
        ExpectsMode::Sentinel => (0..)
            .take_while(|&index| metadata.has(&entry_path(index)))
            .map(|index| Expectation::from_metadata(metadata, index))
            .collect(),
        ExpectsMode::Sequence => {
            let count = metadata
                .get(&JsonPath::root().key("expects"))
                .and_then(|expects| expects.as_array())
                .map_or(0, Vec::len);
            (0..count)
                .map(|index| Expectation::from_metadata(metadata, index))
                .collect()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn metadata(expects: &str) -> JsonLookup {
        JsonLookup::load(&format!(r#"{{"expects":{expects}}}"#)).unwrap()
    }

    #[test]
    fn reads_all_fields() {
        let lookup = metadata(
            r#"[{"success":"false","code":"invalidJson","characterOffset":"5","path":"actions[0]"},
                {"success":"false","code":"invalidValue","jsonKey":"actions[0].action"}]"#,
        );
        let expectations = collect_expectations(&lookup, ExpectsMode::Sentinel);

        assert_eq!(expectations.len(), 2);
        assert_eq!(expectations[0].success, ExpectedSuccess::False);
        assert_eq!(expectations[0].code.as_deref(), Some("invalidJson"));
        assert_eq!(expectations[0].character_offset.as_deref(), Some("5"));
        assert_eq!(
            expectations[0].result_field("success").to_string(),
            "actions[0].results.success"
        );
        assert_eq!(expectations[1].json_key.as_deref(), Some("actions[0].action"));
        assert_eq!(expectations[1].result_field("code").to_string(), "results.code");
        assert_eq!(expectations[1].check_name("jsonKey"), "expects[1].jsonKey");
    }

    #[test]
    fn numeric_and_boolean_fields_read_as_text() {
        let lookup = metadata(r#"[{"success":false,"code":"invalidJson","characterOffset":12}]"#);
        let expectation = &collect_expectations(&lookup, ExpectsMode::Sentinel)[0];
        assert_eq!(expectation.success, ExpectedSuccess::False);
        assert_eq!(expectation.character_offset.as_deref(), Some("12"));
    }

    #[test]
    fn odd_success_values_are_invalid() {
        let lookup = metadata(r#"[{"success":"maybe"},{"code":"invalidTask"}]"#);
        let expectations = collect_expectations(&lookup, ExpectsMode::Sentinel);
        assert_eq!(expectations[0].success, ExpectedSuccess::Invalid(Some("maybe".into())));
        assert_eq!(expectations[1].success, ExpectedSuccess::Invalid(None));
    }

    #[test]
    fn sentinel_stops_at_first_empty_entry() {
        let lookup = metadata(r#"[{"success":"true"},{},{"success":"true"}]"#);
        assert_eq!(collect_expectations(&lookup, ExpectsMode::Sentinel).len(), 1);
        assert_eq!(collect_expectations(&lookup, ExpectsMode::Sequence).len(), 3);
    }

    #[test]
    fn missing_expects_yields_nothing() {
        let lookup = JsonLookup::load(r#"{"summary":"x"}"#).unwrap();
        assert!(collect_expectations(&lookup, ExpectsMode::Sentinel).is_empty());
        assert!(collect_expectations(&lookup, ExpectsMode::Sequence).is_empty());
    }
}
