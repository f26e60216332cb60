use std::fmt::{self, Display};

use serde::{Deserialize, Serialize};
use tracing::info;

/// Outcome of a single check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckStatus {
    Pass,
    Fail,
    Skip,
}

impl Display for CheckStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            CheckStatus::Pass => "pass",
            CheckStatus::Fail => "fail",
            CheckStatus::Skip => "skip",
        };
        write!(f, "{label}")
    }
}

/// One diagnostic decision: which test, which check, what happened.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Finding {
    pub test: String,
    pub check: String,
    pub status: CheckStatus,
    pub message: String,
}

impl Finding {
    pub fn pass(test: impl Into<String>, check: impl Into<String>) -> Self {
        Self {
            test: test.into(),
            check: check.into(),
            status: CheckStatus::Pass,
            message: String::new(),
        }
    }

    pub fn fail(test: impl Into<String>, check: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            test: test.into(),
            check: check.into(),
            status: CheckStatus::Fail,
            message: message.into(),
        }
    }

    pub fn skip(test: impl Into<String>, check: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            test: test.into(),
            check: check.into(),
            status: CheckStatus::Skip,
            message: message.into(),
        }
    }
}

impl Display for Finding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.message.is_empty() {
            write!(f, "{}", self.status)
        } else {
            write!(f, "{} ({})", self.status, self.message)
        }
    }
}

/// PASS / FAIL / SKIP / TOTAL for one certification run.
///
/// `total` counts logical assertions: one per suite file plus one for every
/// additional expectation beyond the first.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunCounters {
    pub pass: usize,
    pub fail: usize,
    pub skip: usize,
    pub total: usize,
}

impl RunCounters {
    pub fn summary_lines(&self) -> [String; 4] {
        [
            format!("PASS: {}", self.pass),
            format!("FAIL: {}", self.fail),
            format!("SKIP: {}", self.skip),
            format!("TOTAL: {}", self.total),
        ]
    }
}

/// Request and reply captured for one test, kept in the saved report.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Evidence {
    pub test: String,
    pub http_status: u16,
    pub request_headers: Vec<String>,
    pub request_body: String,
    pub task_byte_offset: Option<usize>,
    pub response_headers: Vec<String>,
    pub response_body: String,
    pub transport_error: Option<String>,
}

/// Accumulator threaded through loading and evaluation.
#[derive(Debug, Clone, Default)]
pub struct Tally {
    counters: RunCounters,
    findings: Vec<Finding>,
    evidence: Vec<Evidence>,
}

impl Tally {
    #[cfg(test)]
    pub fn counters(&self) -> RunCounters {
        self.counters
    }

    #[cfg(test)]
    pub fn findings(&self) -> &[Finding] {
        &self.findings
    }

    pub fn attach(&mut self, evidence: Evidence) {
        self.evidence.push(evidence);
    }

    /// Count one more logical assertion.
    pub fn count_assertion(&mut self) {
        self.counters.total += 1;
    }

    /// Log a decision and bump exactly one of pass / fail / skip.
    pub fn record(&mut self, finding: Finding) {
        match finding.status {
            CheckStatus::Pass => self.counters.pass += 1,
            CheckStatus::Fail => self.counters.fail += 1,
            CheckStatus::Skip => self.counters.skip += 1,
        }
        info!(test = %finding.test, check = %finding.check, "status: {finding}");
        self.findings.push(finding);
    }

    pub fn finish(self) -> CertificationReport {
        for line in self.counters.summary_lines() {
            info!("{line}");
        }
        CertificationReport {
            counters: self.counters,
            findings: self.findings,
            evidence: self.evidence,
        }
    }
}

/// Everything a run produced.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CertificationReport {
    pub counters: RunCounters,
    pub findings: Vec<Finding>,
    #[serde(default)]
    pub evidence: Vec<Evidence>,
}

impl CertificationReport {
    pub fn passed(&self) -> bool {
        self.counters.fail == 0
    }

    pub fn failures(&self) -> impl Iterator<Item = &Finding> {
        self.findings.iter().filter(|f| f.status == CheckStatus::Fail)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_bumps_one_counter() {
        let mut tally = Tally::default();
        tally.count_assertion();
        tally.record(Finding::pass("basic/a", "expects[0].success"));
        tally.count_assertion();
        tally.record(Finding::fail("basic/b", "expects[0].success", "missing results.success"));
        tally.count_assertion();
        tally.record(Finding::skip("basic/c", "load", "empty file"));

        let counters = tally.counters();
        assert_eq!(
            counters,
            RunCounters {
                pass: 1,
                fail: 1,
                skip: 1,
                total: 3
            }
        );
        assert_eq!(counters.total, counters.pass + counters.fail + counters.skip);
    }

    #[test]
    fn finding_display() {
        assert_eq!(Finding::pass("t", "c").to_string(), "pass");
        assert_eq!(Finding::skip("t", "load", "data error").to_string(), "skip (data error)");
    }

    #[test]
    fn report_lists_failures() {
        let mut tally = Tally::default();
        tally.record(Finding::pass("t", "a"));
        tally.record(Finding::fail("t", "b", "wanted:5 got:10"));
        let report = tally.finish();

        assert!(!report.passed());
        assert_eq!(report.failures().count(), 1);
        assert_eq!(report.counters.summary_lines()[1], "FAIL: 1");
    }
}
