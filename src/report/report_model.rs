use serde::{Deserialize, Serialize};

use crate::spec::spec_model::TestResult;

/// Aggregated results for a batch of navigation specs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TestSuiteReport {
    pub suite_name: String,

    pub total: usize,

    pub passed: usize,

    pub failed: usize,

    /// Pages reached across every spec
    pub pages_reached: usize,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration_ms: Option<u128>,

    pub test_results: Vec<TestResult>,
}

impl TestSuiteReport {
    pub fn from_results(suite_name: &str, results: Vec<TestResult>) -> Self {
        let total = results.len();
        let passed = results.iter().filter(|r| r.passed).count();
        let pages_reached = results.iter().map(|r| r.pages.len()).sum();
        Self {
            suite_name: suite_name.to_string(),
            total,
            passed,
            failed: total - passed,
            pages_reached,
            duration_ms: None,
            test_results: results,
        }
    }

    pub fn with_duration(mut self, duration_ms: u128) -> Self {
        self.duration_ms = Some(duration_ms);
        self
    }

    pub fn all_passed(&self) -> bool {
        self.failed == 0
    }
}
