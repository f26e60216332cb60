//! # Certification Engine
//!
//! Walks a certification suite (category directories of test files), sends
//! each test's task to the selected scanner and checks the reply against
//! the test's `expects` list.
//!
//! Suite files look like:
//!
//! ```text
//! {"category":"...","summary":"...","description":"...","expects":[...]}
//! ***DATADATADATA***
//! <raw task>
//! ```

pub mod evaluator;
pub mod executor;
pub mod expectation;
pub mod report;
pub mod suite;

use std::path::Path;

use tracing::info;

use crate::device::DeviceInfo;
use crate::session::SessionClient;

pub use expectation::ExpectsMode;
pub use report::{CertificationReport, CheckStatus, Finding, RunCounters, Tally};
pub use suite::SuiteError;

#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    pub expects_mode: ExpectsMode,
    pub device: Option<DeviceInfo>,
}

/// Run every test in the suite, one at a time, in sorted order.
///
/// Only a missing or empty suite root is an error; every per-file or
/// per-expectation problem is a skip or a failure in the report.
pub async fn run_certification<C: SessionClient>(
    suite_root: &Path,
    client: &mut C,
    options: &RunOptions,
) -> Result<CertificationReport, SuiteError> {
    let categories = suite::discover(suite_root)?;
    let mut tally = Tally::default();

    for category in &categories {
        for path in &category.files {
            info!(file = %path.display(), "certification file");
            tally.count_assertion();

            let case = match suite::load_test_file(&category.name, path) {
                Ok(case) => case,
                Err(reason) => {
                    let test = suite::test_id(&category.name, &suite::file_id(path));
                    tally.record(Finding::skip(test, "load", reason.to_string()));
                    continue;
                }
            };

            log_case(&case, options.expects_mode);
            let captured = executor::execute(&case, client, options.device.as_ref()).await;
            evaluator::evaluate(&case, &captured, options.expects_mode, &mut tally);
            tally.attach(captured.into_evidence(case.id()));
        }
    }

    Ok(tally.finish())
}

fn log_case(case: &suite::TestCase, mode: ExpectsMode) {
    let test = case.id();
    info!(test = %test, "summary: {}", case.field("summary"));
    info!(test = %test, "description: {}", case.field("description"));
    for expectation in expectation::collect_expectations(&case.metadata, mode) {
        let mut line = format!("success={:?}", expectation.success);
        if let Some(code) = &expectation.code {
            line.push_str(&format!(" code={code}"));
        }
        if let Some(offset) = &expectation.character_offset {
            line.push_str(&format!(" characterOffset={offset}"));
        }
        if !expectation.result_path.is_root() {
            line.push_str(&format!(" path={}", expectation.result_path));
        }
        if let Some(key) = &expectation.json_key {
            line.push_str(&format!(" jsonKey={key}"));
        }
        info!(test = %test, check = %expectation.check_name("success"), "expects {line}");
    }
}
