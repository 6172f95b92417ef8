use crate::spec::spec_model::AssertionResult;

/// Tracks the execution state and results of a running spec.
#[derive(Debug, Clone, Default)]
pub struct TestContext {
    /// Current step index (0-based)
    pub current_step: usize,

    /// Pages reached so far
    pub pages: Vec<String>,

    pub assertion_results: Vec<AssertionResult>,
}

impl TestContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_page(&mut self, name: String) {
        self.pages.push(name);
    }

    pub fn record_assertions(&mut self, results: Vec<AssertionResult>) {
        self.assertion_results.extend(results);
    }

    pub fn all_passed(&self) -> bool {
        self.assertion_results.iter().all(|r| r.passed)
    }

    pub fn fail_count(&self) -> usize {
        self.assertion_results.iter().filter(|r| !r.passed).count()
    }
}
