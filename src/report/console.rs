use crate::report::report_model::TestSuiteReport;

/// Format a suite report for terminal output.
///
/// ```text
/// === Navigation suite: admin ===
///
/// ✓ PASS  Open account (3 steps) Dashboard -> AccountDetail
/// ✗ FAIL  Broken menu (2 steps)
///     [ERROR] Step 1 failed: no navigation step from Dashboard to Settings; possibilities: [Accounts]
///
/// === Results: 1 passed, 1 failed (2 total, 2 pages reached) ===
/// ```
pub fn format_console_report(report: &TestSuiteReport) -> String {
    let mut out = String::new();

    out.push_str(&format!("=== Navigation suite: {} ===\n\n", report.suite_name));

    for result in &report.test_results {
        let marker = if result.passed {
            "\u{2713} PASS"
        } else {
            "\u{2717} FAIL"
        };

        out.push_str(&format!(
            "{}  {} ({} steps)",
            marker, result.spec_name, result.steps_run
        ));
        if !result.pages.is_empty() {
            out.push_str(&format!(" {}", result.pages.join(" -> ")));
        }
        out.push('\n');

        if let Some(ref error) = result.error {
            out.push_str(&format!("    [ERROR] {}\n", error));
        }

        for ar in result.assertion_results.iter().filter(|ar| !ar.passed) {
            let detail = ar.message.as_deref().unwrap_or("assertion failed");
            out.push_str(&format!(
                "    [FAIL] Step {}: {} \u{2014} {}\n",
                ar.step_index,
                ar.spec.kind(),
                detail
            ));
        }
    }

    out.push_str(&format!(
        "\n=== Results: {} passed, {} failed ({} total, {} pages reached)",
        report.passed, report.failed, report.total, report.pages_reached
    ));

    if let Some(ms) = report.duration_ms {
        out.push_str(&format!(" in {:.1}s", ms as f64 / 1000.0));
    }

    out.push_str(" ===\n");
    out
}
