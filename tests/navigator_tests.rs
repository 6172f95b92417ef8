use std::error::Error as StdError;

use portal_nav::browser::error::BrowserError;
use portal_nav::navigation::dispatch::{DispatchRule, HrefRule};
use portal_nav::navigation::error::{BindError, NavError};
use portal_nav::navigation::navigator::{Navigator, NavigatorConfig};
use portal_nav::navigation::trace::NavTraceEvent;
use portal_nav::page::catalog::PageCatalog;
use portal_nav::page::page_model::{PageClass, downcast_page};
use portal_nav::page::params::{NavArgs, nav_args};
use serde_json::json;

use crate::common::fake_browser::FakeBrowser;
use crate::common::pages::{
    AccountDetail, Accounts, CycleA, Home, Orphan, Reports, Search, Settings, portal_browser,
};

mod common;

fn none() -> NavArgs {
    NavArgs::new()
}

fn account(id: i64) -> NavArgs {
    nav_args([("account_id", json!(id))])
}

// ============================================================================
// Backtrace and replay
// ============================================================================

#[test]
fn displayed_target_needs_no_steps() {
    let mut nav = Navigator::new(portal_browser("/accounts"));

    nav.navigate_to::<Accounts>(&none()).unwrap();

    assert!(nav.browser().clicks.is_empty());
    assert_eq!(nav.last_path(), ["Accounts"]);
}

#[test]
fn one_hop_from_prerequisite() {
    let mut nav = Navigator::new(portal_browser("/home"));

    nav.navigate_to::<Accounts>(&none()).unwrap();

    assert_eq!(nav.browser().clicks, ["#accounts"]);
    assert_eq!(nav.browser().path(), "/accounts");
    assert_eq!(nav.last_path(), ["Accounts", "Home"]);
}

#[test]
fn two_hops_replay_root_first() {
    let mut nav = Navigator::new(portal_browser("/home").text("#account-name", "Acme"));

    let detail = nav.navigate_to::<AccountDetail>(&account(42)).unwrap();

    assert_eq!(nav.last_path(), ["AccountDetail", "Accounts", "Home"]);
    assert_eq!(nav.browser().path(), "/accounts/42");
    assert_eq!(detail.account_id, "42");
    assert_eq!(detail.title.as_deref(), Some("Acme"), "post_navigate must run");
}

#[test]
fn intermediate_page_displayed_stops_backtrace() {
    let mut nav = Navigator::new(portal_browser("/accounts"));

    nav.navigate_to::<AccountDetail>(&account(7)).unwrap();

    assert_eq!(nav.last_path(), ["AccountDetail", "Accounts"]);
    assert!(nav.browser().clicks.is_empty());
    assert_eq!(nav.browser().path(), "/accounts/7");
}

#[test]
fn steps_receive_only_declared_arguments() {
    let mut nav = Navigator::new(portal_browser("/accounts"));
    let args = nav_args([("account_id", json!(42)), ("unrelated", json!("x"))]);

    nav.navigate_to::<AccountDetail>(&args).unwrap();

    let fills = &nav.browser().fills;
    assert_eq!(
        fills,
        &[
            ("#account_id".to_string(), "42".to_string()),
            ("#tab".to_string(), "overview".to_string()),
        ],
        "undeclared args dropped, defaults filled"
    );
}

#[test]
fn caller_argument_overrides_default() {
    let mut nav = Navigator::new(portal_browser("/accounts"));
    let args = nav_args([("account_id", json!("a-1")), ("tab", json!("history"))]);

    nav.navigate_to::<AccountDetail>(&args).unwrap();

    assert!(
        nav.browser()
            .fills
            .contains(&("#tab".to_string(), "history".to_string()))
    );
}

// ============================================================================
// Dispatch rules
// ============================================================================

#[test]
fn class_step_wins_over_earlier_href_step() {
    // Accounts declares its `menu` href step before the class step.
    let mut nav = Navigator::new(portal_browser("/accounts"));

    nav.navigate_to::<AccountDetail>(&account(3)).unwrap();

    assert!(
        nav.browser().clicks.iter().all(|c| !c.starts_with("a[href=")),
        "href step must not run when a class step matches: {:?}",
        nav.browser().clicks
    );
}

#[test]
fn href_step_reaches_page_without_class_step() {
    let mut nav = Navigator::new(portal_browser("/accounts"));

    nav.navigate_to::<Reports>(&none()).unwrap();

    assert_eq!(nav.browser().clicks, ["a[href='/reports']"]);
    assert_eq!(nav.browser().path(), "/reports");
}

#[test]
fn step_tagged_by_name_matches_class_name() {
    let mut nav = Navigator::new(portal_browser("/home"));

    nav.navigate_to::<Settings>(&none()).unwrap();

    assert_eq!(nav.browser().clicks, ["#settings"]);
}

#[test]
fn custom_rule_set_is_honoured() {
    let rules: Vec<Box<dyn DispatchRule>> = vec![Box::new(HrefRule)];
    let mut nav = Navigator::new(portal_browser("/accounts")).with_rules(rules);

    nav.navigate_to::<AccountDetail>(&account(9)).unwrap();

    assert_eq!(nav.browser().clicks, ["a[href='/accounts/9']"]);
    assert!(nav.browser().fills.is_empty());
}

// ============================================================================
// Failures
// ============================================================================

#[test]
fn unreachable_page_lists_possibilities() {
    let mut nav = Navigator::new(portal_browser("/blank"));
    nav.open_page::<Home>(&none()).unwrap();

    let err = nav.navigate(&PageClass::of::<Orphan>(), &none()).err().unwrap();

    match &err {
        NavError::StepNotFound {
            current,
            dest,
            possibilities,
        } => {
            assert_eq!(current, "Home");
            assert_eq!(dest, "Orphan");
            assert_eq!(possibilities, &["Accounts", "Settings"]);
        }
        other => panic!("expected StepNotFound, got {:?}", other),
    }
    assert!(err.to_string().contains("possibilities: [Accounts, Settings]"));
    assert!(nav.browser().clicks.is_empty());
}

#[test]
fn unreachable_page_without_known_origin() {
    let mut nav = Navigator::new(portal_browser("/blank"));

    let err = nav.navigate_to::<Orphan>(&none()).err().unwrap();

    match err {
        NavError::StepNotFound {
            current,
            possibilities,
            ..
        } => {
            assert_eq!(current, "<none>");
            assert!(possibilities.is_empty());
        }
        other => panic!("expected StepNotFound, got {:?}", other),
    }
}

#[test]
fn unanchored_chain_replays_from_page_still_on_screen() {
    let mut nav = Navigator::new(portal_browser("/blank"));
    nav.open_page::<Accounts>(&none()).unwrap();

    nav.navigate_to::<Orphan>(&none()).unwrap();

    assert_eq!(nav.browser().clicks, ["a[href='/orphan']"]);
    assert_eq!(nav.browser().path(), "/orphan");
    assert_eq!(nav.last_path(), ["Orphan"]);
}

#[test]
fn unanchored_chain_does_not_start_from_a_page_the_browser_left() {
    let mut nav = Navigator::new(portal_browser("/blank"));
    nav.open_page::<Home>(&none()).unwrap();
    nav.browser_mut().url = "https://portal.test/elsewhere".into();

    let err = nav.navigate_to::<Orphan>(&none()).err().unwrap();

    assert!(matches!(err, NavError::StepNotFound { ref current, .. } if current == "<none>"));
    assert!(nav.browser().clicks.is_empty());
}

#[test]
fn reaching_a_page_then_leaving_it_is_not_mistaken_for_arrival() {
    let mut nav = Navigator::new(portal_browser("/orphan"));
    nav.navigate_to::<Orphan>(&none()).unwrap();
    nav.browser_mut().url = "https://portal.test/home".into();

    let err = nav.navigate_to::<Orphan>(&none()).err().unwrap();

    match err {
        NavError::StepNotFound { current, dest, .. } => {
            assert_eq!(current, "<none>");
            assert_eq!(dest, "Orphan");
        }
        other => panic!("expected StepNotFound, got {:?}", other),
    }
    assert_eq!(nav.browser().path(), "/home");
}

#[test]
fn failed_navigation_remembers_the_last_page_reached() {
    let mut nav = Navigator::new(portal_browser("/home"));

    // Accounts is reached, then the Search step lacks its `query` argument.
    let err = nav.navigate_to::<Search>(&none()).err().unwrap();
    assert!(matches!(err, NavError::StepFailed { .. }));
    assert_eq!(nav.browser().path(), "/accounts");

    nav.navigate_to::<Orphan>(&none()).unwrap();

    let browser = nav.into_browser();
    assert_eq!(browser.clicks, ["#accounts", "a[href='/orphan']"]);
    assert_eq!(browser.path(), "/orphan");
}

#[test]
fn missing_required_argument_fails_the_step() {
    let mut nav = Navigator::new(portal_browser("/accounts"));

    let err = nav.navigate_to::<Search>(&none()).err().unwrap();

    match &err {
        NavError::StepFailed { page, step, .. } => {
            assert_eq!(page, "Accounts");
            assert_eq!(step, "search");
        }
        other => panic!("expected StepFailed, got {:?}", other),
    }
    let source = err.source().expect("step failure keeps its cause");
    assert!(matches!(
        source.downcast_ref::<BindError>(),
        Some(BindError::MissingArgument(name)) if name == "query"
    ));
    assert_eq!(nav.browser().path(), "/accounts", "browser must not move");
}

#[test]
fn browser_failure_inside_step_is_chained() {
    let mut nav = Navigator::new(portal_browser("/home").failing("#accounts"));

    let err = nav.navigate_to::<Accounts>(&none()).err().unwrap();

    assert!(matches!(err, NavError::StepFailed { ref step, .. } if step == "to_accounts"));
    let source = err.source().expect("cause");
    assert!(matches!(
        source.downcast_ref::<BrowserError>(),
        Some(BrowserError::Element { .. })
    ));
}

#[test]
fn prerequisite_cycle_is_reported() {
    let mut nav = Navigator::new(FakeBrowser::at("/blank"));

    let err = nav.navigate_to::<CycleA>(&none()).err().unwrap();

    match err {
        NavError::PrerequisiteCycle { chain } => {
            assert_eq!(chain, ["CycleA", "CycleB", "CycleA"]);
        }
        other => panic!("expected PrerequisiteCycle, got {:?}", other),
    }
}

#[test]
fn backtrace_depth_is_limited() {
    let config = NavigatorConfig {
        max_backtrace_depth: 2,
        ..Default::default()
    };
    let mut nav = Navigator::with_config(portal_browser("/blank"), config);

    let err = nav.navigate_to::<AccountDetail>(&account(1)).err().unwrap();

    match err {
        NavError::BacktraceTooDeep { limit, chain } => {
            assert_eq!(limit, 2);
            assert_eq!(chain, ["AccountDetail", "Accounts", "Home"]);
        }
        other => panic!("expected BacktraceTooDeep, got {:?}", other),
    }
}

#[test]
fn page_needing_missing_argument_cannot_be_built() {
    let mut nav = Navigator::new(portal_browser("/home"));

    let err = nav.navigate_to::<AccountDetail>(&none()).err().unwrap();

    assert!(matches!(err, NavError::PageConstruction { ref page, .. } if page == "AccountDetail"));
    assert!(nav.browser().clicks.is_empty());
}

// ============================================================================
// open
// ============================================================================

#[test]
fn open_without_page_or_url_is_rejected() {
    let mut nav = Navigator::new(portal_browser("/home"));

    let err = nav.open(None, None, &none()).err().unwrap();

    assert!(matches!(err, NavError::NothingToOpen));
}

#[test]
fn open_url_only_loads_it() {
    let mut nav = Navigator::new(portal_browser("/home"));

    let opened = nav
        .open(None, Some("https://portal.test/reports"), &none())
        .unwrap();

    assert!(opened.is_none());
    assert_eq!(nav.browser().path(), "/reports");
}

#[test]
fn open_page_loads_its_path_without_steps() {
    let mut nav = Navigator::new(portal_browser("/blank").text("#account-name", "Initech"));

    let detail = nav.open_page::<AccountDetail>(&account(5)).unwrap();

    assert_eq!(nav.browser().path(), "/accounts/5");
    assert!(nav.browser().clicks.is_empty());
    assert_eq!(detail.title.as_deref(), Some("Initech"));
}

#[test]
fn open_page_with_url_keeps_that_url() {
    let mut nav = Navigator::new(portal_browser("/blank"));

    let opened = nav
        .open(
            Some(&PageClass::of::<Home>()),
            Some("https://portal.test/home?welcome=1"),
            &none(),
        )
        .unwrap();

    assert_eq!(opened.map(|p| p.name()).as_deref(), Some("Home"));
    assert_eq!(nav.browser().url, "https://portal.test/home?welcome=1");
}

#[test]
fn open_uses_configured_base_url() {
    let config = NavigatorConfig {
        base_url: Some("https://staging.portal.test/".into()),
        ..Default::default()
    };
    let mut nav = Navigator::with_config(portal_browser("/blank"), config);

    nav.open_page::<Home>(&none()).unwrap();

    assert_eq!(nav.browser().url, "https://staging.portal.test/home");
}

#[test]
fn opening_a_url_forgets_the_displayed_page() {
    let mut nav = Navigator::new(portal_browser("/blank"));
    nav.open_page::<Home>(&none()).unwrap();
    nav.open(None, Some("https://portal.test/blank"), &none())
        .unwrap();

    let err = nav.navigate_to::<Orphan>(&none()).err().unwrap();

    assert!(matches!(err, NavError::StepNotFound { ref current, .. } if current == "<none>"));
}

// ============================================================================
// Lookup by name and typed results
// ============================================================================

#[test]
fn navigate_by_name_resolves_catalog() {
    let mut catalog = PageCatalog::new();
    catalog
        .register_type::<Home>()
        .register_type::<Accounts>()
        .register_type::<AccountDetail>();
    let mut nav = Navigator::new(portal_browser("/home"));

    let page = nav
        .navigate_by_name(&catalog, "AccountDetail", &account(8))
        .unwrap();

    assert_eq!(page.name(), "AccountDetail");
    assert_eq!(page.path(), "/accounts/8");

    let err = nav
        .navigate_by_name(&catalog, "Billing", &none())
        .err()
        .unwrap();
    assert!(matches!(err, NavError::UnknownPage(ref name) if name == "Billing"));
}

#[test]
fn downcast_rejects_other_page_types() {
    let err = downcast_page::<Home>(Box::new(Accounts)).err().unwrap();

    match err {
        NavError::UnexpectedPage { expected, actual } => {
            assert_eq!(expected, "Home");
            assert_eq!(actual, "Accounts");
        }
        other => panic!("expected UnexpectedPage, got {:?}", other),
    }
}

// ============================================================================
// Navigation trace
// ============================================================================

#[test]
fn trace_file_records_backtrace_and_steps() {
    let dir = tempfile::tempdir().unwrap();
    let trace_path = dir.path().join("nav.jsonl");
    let config = NavigatorConfig {
        trace_path: Some(trace_path.to_string_lossy().into_owned()),
        ..Default::default()
    };
    let mut nav = Navigator::with_config(portal_browser("/home"), config);

    nav.navigate_to::<Accounts>(&none()).unwrap();

    let content = std::fs::read_to_string(&trace_path).unwrap();
    let events: Vec<NavTraceEvent> = content
        .lines()
        .map(|line| serde_json::from_str(line).unwrap())
        .collect();

    assert_eq!(events.len(), 3, "two visits and one step: {:?}", events);
    assert_eq!(events[0].event, "backtrace");
    assert_eq!(events[0].page, "Accounts");
    assert_eq!(events[0].displayed, Some(false));
    assert_eq!(events[1].page, "Home");
    assert_eq!(events[1].displayed, Some(true));

    let step = &events[2];
    assert_eq!(step.event, "step");
    assert_eq!(step.page, "Home");
    assert_eq!(step.dest.as_deref(), Some("Accounts"));
    assert_eq!(step.step.as_deref(), Some("to_accounts"));
    assert_eq!(step.rule.as_deref(), Some("class"));
    assert!(events.iter().all(|e| e.navigation == 1));
}
