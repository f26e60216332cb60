//! Decides pass/fail for each expectation against a captured reply.

use serde_json::Value;

use crate::json::{JsonError, JsonLookup, JsonPath};

use super::executor::CapturedExchange;
use super::expectation::{collect_expectations, ExpectedSuccess, Expectation, ExpectsMode};
use super::report::{Finding, Tally};
use super::suite::TestCase;

/// Error codes a fixture may expect, each with its own validator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCode {
    InvalidJson,
    InvalidTask,
    InvalidValue,
}

/// Validates one failing reply. The task offset is where the task value
/// starts in the request body, when the body carried one.
pub type Validator = fn(ErrorCode, &Expectation, &ReplyView<'_>, Option<usize>) -> Verdict;

impl ErrorCode {
    pub const ALL: [ErrorCode; 3] = [ErrorCode::InvalidJson, ErrorCode::InvalidTask, ErrorCode::InvalidValue];

    pub fn name(self) -> &'static str {
        match self {
            ErrorCode::InvalidJson => "invalidJson",
            ErrorCode::InvalidTask => "invalidTask",
            ErrorCode::InvalidValue => "invalidValue",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|code| code.name() == name)
    }

    pub fn validator(self) -> Validator {
        match self {
            ErrorCode::InvalidJson => validate_character_offset,
            ErrorCode::InvalidTask | ErrorCode::InvalidValue => validate_json_key,
        }
    }
}

/// Result of checking one expectation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Verdict {
    pub check: String,
    pub failure: Option<String>,
}

impl Verdict {
    fn pass(check: String) -> Self {
        Self { check, failure: None }
    }

    fn fail(check: String, message: impl Into<String>) -> Self {
        Self {
            check,
            failure: Some(message.into()),
        }
    }

    fn into_finding(self, test: &str) -> Finding {
        match self.failure {
            None => Finding::pass(test, self.check),
            Some(message) => Finding::fail(test, self.check, message),
        }
    }
}

/// The reply document an expectation is checked against.
pub struct ReplyView<'a> {
    reply: &'a JsonLookup,
}

impl ReplyView<'_> {
    fn text(&self, path: &JsonPath) -> Option<String> {
        self.reply.text(path)
    }
}

/// Use the echoed task when the reply carries one in `results.session.task`,
/// whether as a serialized string or as a structured value.
pub fn unwrap_session_task(reply: JsonLookup) -> Result<JsonLookup, JsonError> {
    let nested = match reply.get(&JsonPath::parse("results.session.task")) {
        Some(Value::String(task)) if !task.is_empty() => Some(JsonLookup::load(task)),
        Some(value @ (Value::Object(_) | Value::Array(_))) if has_content(value) => {
            Some(Ok(JsonLookup::from_value(value.clone())))
        }
        _ => None,
    };
    nested.unwrap_or(Ok(reply))
}

fn has_content(value: &Value) -> bool {
    match value {
        Value::Object(map) => !map.is_empty(),
        Value::Array(items) => !items.is_empty(),
        _ => false,
    }
}

/// Evaluate every expectation of `case` against `captured`.
///
/// The first expectation was counted when the file loaded; each later one
/// adds to the total here.
pub fn evaluate(case: &TestCase, captured: &CapturedExchange, mode: ExpectsMode, tally: &mut Tally) {
    let test = case.id();

    let reply = match JsonLookup::load(&captured.response_body) {
        Ok(reply) => reply,
        Err(err) => {
            let message = match &captured.transport_error {
                Some(transport) => format!("no reply: {transport}"),
                None => format!("json error at byte {}", err.index()),
            };
            tally.record(Finding::fail(&test, "reply", message));
            return;
        }
    };
    let reply = match unwrap_session_task(reply) {
        Ok(reply) => reply,
        Err(err) => {
            tally.record(Finding::fail(
                &test,
                "results.session.task",
                format!("json error at byte {}", err.index()),
            ));
            return;
        }
    };

    let view = ReplyView { reply: &reply };
    for expectation in collect_expectations(&case.metadata, mode) {
        if expectation.index > 0 {
            tally.count_assertion();
        }
        let verdict = check_expectation(&expectation, &view, captured.task_byte_offset);
        tally.record(verdict.into_finding(&test));
    }
}

pub fn check_expectation(expectation: &Expectation, view: &ReplyView<'_>, task_offset: Option<usize>) -> Verdict {
    let check = expectation.check_name("success");
    let success_path = expectation.result_field("success");

    let wanted = match &expectation.success {
        ExpectedSuccess::True => "true",
        ExpectedSuccess::False => "false",
        ExpectedSuccess::Invalid(_) => {
            return Verdict::fail(check, "expectedSuccess must be 'true' or 'false'");
        }
    };

    match view.text(&success_path) {
        None => return Verdict::fail(check, format!("missing {success_path}")),
        Some(actual) if actual != wanted => {
            return Verdict::fail(check, format!("expected {success_path} to be '{wanted}'"));
        }
        Some(_) => {}
    }

    if expectation.success == ExpectedSuccess::True {
        return Verdict::pass(check);
    }

    let code_check = expectation.check_name("code");
    let expected_code = expectation.code.clone().unwrap_or_default();
    match ErrorCode::from_name(&expected_code) {
        Some(code) => code.validator()(code, expectation, view, task_offset),
        None => Verdict::fail(code_check, format!("no handler for this code '{expected_code}'")),
    }
}

/// The reply's `results.code` must equal the expected code.
fn check_code(code: ErrorCode, expectation: &Expectation, view: &ReplyView<'_>) -> Result<(), Verdict> {
    let check = expectation.check_name("code");
    let code_path = expectation.result_field("code");
    match view.text(&code_path) {
        None => Err(Verdict::fail(check, format!("missing {code_path}"))),
        Some(actual) if actual != code.name() => {
            let message = format!("{check} wanted:{} got:{actual}", code.name());
            Err(Verdict::fail(check, message))
        }
        Some(_) => Ok(()),
    }
}

/// Device offsets are relative to the whole request body; fixture offsets
/// are relative to the task. Subtracting the task offset lines them up.
fn validate_character_offset(
    code: ErrorCode,
    expectation: &Expectation,
    view: &ReplyView<'_>,
    task_offset: Option<usize>,
) -> Verdict {
    if let Err(verdict) = check_code(code, expectation, view) {
        return verdict;
    }

    let check = expectation.check_name("characterOffset");
    let Some(wanted) = expectation.character_offset.as_deref() else {
        return Verdict::fail(check.clone(), format!("missing {check}"));
    };
    let Ok(wanted) = wanted.trim().parse::<i64>() else {
        return Verdict::fail(check.clone(), format!("{check} is not a number: '{wanted}'"));
    };

    let offset_path = expectation.result_field("characterOffset");
    let Some(reported) = view.text(&offset_path) else {
        return Verdict::fail(check, format!("missing {offset_path}"));
    };
    let Ok(reported) = reported.trim().parse::<i64>() else {
        return Verdict::fail(check, format!("{offset_path} is not a number: '{reported}'"));
    };
    let Some(task_offset) = task_offset else {
        return Verdict::fail(check, "request body has no \"task\": key");
    };

    let got = reported - task_offset as i64;
    if got == wanted {
        Verdict::pass(check)
    } else {
        Verdict::fail(check.clone(), format!("{check} wanted:{wanted} got:{got}"))
    }
}

fn validate_json_key(
    code: ErrorCode,
    expectation: &Expectation,
    view: &ReplyView<'_>,
    _task_offset: Option<usize>,
) -> Verdict {
    if let Err(verdict) = check_code(code, expectation, view) {
        return verdict;
    }

    let check = expectation.check_name("jsonKey");
    let Some(wanted) = expectation.json_key.as_deref() else {
        return Verdict::fail(check.clone(), format!("missing {check}"));
    };

    let got = view.text(&expectation.result_field("jsonKey")).unwrap_or_default();
    if got == wanted {
        Verdict::pass(check)
    } else {
        Verdict::fail(check.clone(), format!("{check} wanted:{wanted} got:{got}"))
    }
}
