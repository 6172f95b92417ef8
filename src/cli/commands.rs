use std::path::Path;

use tracing::{debug, info};

use crate::browser::session::BrowserSession;
use crate::cli::config::{AppConfig, build_navigator_config, build_session_options};
use crate::navigation::navigator::Navigator;
use crate::report::console::format_console_report;
use crate::report::report_model::TestSuiteReport;
use crate::site::site_model::SiteMap;
use crate::spec::runner::SpecRunner;
use crate::spec::spec_model::NavSpec;

// ============================================================================
// run subcommand
// ============================================================================

/// Run navigation specs and return whether all passed.
pub fn cmd_run(
    site_path: &str,
    spec_path: &str,
    base_url: Option<&str>,
    output: Option<&str>,
    config: &AppConfig,
) -> Result<bool, Box<dyn std::error::Error>> {
    let site = SiteMap::load(site_path)?;
    let catalog = site.catalog();
    let specs = load_specs(spec_path)?;

    if specs.is_empty() {
        info!(path = spec_path, "no navigation specs found");
        return Ok(true);
    }

    info!(specs = specs.len(), pages = catalog.len(), site = %site.name, "running navigation specs");

    let session = BrowserSession::launch(&build_session_options(config))?;
    let mut navigator = Navigator::with_config(session, build_navigator_config(config, base_url));
    let start = std::time::Instant::now();

    let mut results = Vec::new();
    for spec in &specs {
        debug!(spec = %spec.name, "starting spec");
        results.push(SpecRunner::run(spec, &mut navigator, &catalog));
    }

    let duration = start.elapsed().as_millis();
    navigator.browser_mut().quit()?;

    let report = TestSuiteReport::from_results(&site.name, results).with_duration(duration);
    let content = format_console_report(&report);

    match output.or(config.run.output.as_deref()) {
        Some(path) => std::fs::write(path, &content)?,
        None => print!("{}", content),
    }

    Ok(report.all_passed())
}

/// Load specs from a single YAML file or a directory of YAML files.
pub fn load_specs(path: &str) -> Result<Vec<NavSpec>, Box<dyn std::error::Error>> {
    let metadata = std::fs::metadata(path)?;
    if !metadata.is_dir() {
        return Ok(vec![read_spec(Path::new(path))?]);
    }

    let mut specs = Vec::new();
    for entry in std::fs::read_dir(path)? {
        let p = entry?.path();
        if p.extension().is_some_and(|e| e == "yaml" || e == "yml") {
            specs.push(read_spec(&p)?);
        }
    }
    // Sort by name for deterministic order
    specs.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(specs)
}

fn read_spec(path: &Path) -> Result<NavSpec, Box<dyn std::error::Error>> {
    let content = std::fs::read_to_string(path)?;
    Ok(serde_yaml::from_str(&content)?)
}

// ============================================================================
// graph subcommand
// ============================================================================

pub fn cmd_graph(site_path: &str) -> Result<(), Box<dyn std::error::Error>> {
    let site = SiteMap::load(site_path)?;
    println!("Site map '{}': {} pages", site.name, site.pages.len());
    if !site.menu.is_empty() {
        let links: Vec<&str> = site.menu.iter().map(|m| m.name.as_str()).collect();
        println!("Menu links: {}", links.join(", "));
    }
    print!("{}", site.render_tree());
    Ok(())
}
