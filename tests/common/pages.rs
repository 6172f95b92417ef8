//! Typed page graph used by the navigator tests.
//!
//! ```text
//! Home -> Accounts -> AccountDetail {account_id}
//!      |           -> Search (needs `query`)
//!      |           -> Reports (menu link only)
//!      -> Settings (tagged by name)
//! Orphan (no prerequisite, no step leads here)
//! CycleA <-> CycleB
//! ```

use portal_nav::browser::driver::{Browser, SelectorHint, extract_path};
use portal_nav::browser::error::BrowserError;
use portal_nav::navigation::error::NavError;
use portal_nav::navigation::step::StepRegistry;
use portal_nav::page::page_model::{Page, PageClass, PageType};
use portal_nav::page::params::{NavArgs, arg_text, render_template};

fn shown(browser: &mut dyn Browser, path: &str) -> Result<bool, BrowserError> {
    Ok(extract_path(&browser.current_url()?) == path)
}

// ----------------------------------------------------------------------------

pub struct Home;

impl PageType for Home {
    const NAME: &'static str = "Home";

    fn from_args(_args: &NavArgs) -> Result<Self, NavError> {
        Ok(Home)
    }
}

impl Page for Home {
    fn class(&self) -> PageClass {
        PageClass::of::<Self>()
    }

    fn path(&self) -> &str {
        "/home"
    }

    fn is_displayed(&self, browser: &mut dyn Browser) -> Result<bool, BrowserError> {
        shown(browser, self.path())
    }

    fn register_steps<'p>(&'p self, steps: &mut StepRegistry<'p>) {
        steps.to_page::<Accounts>("to_accounts").run(|browser, _| {
            browser.click(&SelectorHint::css("#accounts"))?;
            Ok(())
        });
        steps.to_named("to_settings", "Settings").run(|browser, _| {
            browser.click(&SelectorHint::css("#settings"))?;
            Ok(())
        });
    }
}

// ----------------------------------------------------------------------------

pub struct Accounts;

impl PageType for Accounts {
    const NAME: &'static str = "Accounts";

    fn from_args(_args: &NavArgs) -> Result<Self, NavError> {
        Ok(Accounts)
    }

    fn requires() -> Option<PageClass> {
        Some(PageClass::of::<Home>())
    }
}

impl Page for Accounts {
    fn class(&self) -> PageClass {
        PageClass::of::<Self>()
    }

    fn path(&self) -> &str {
        "/accounts"
    }

    fn is_displayed(&self, browser: &mut dyn Browser) -> Result<bool, BrowserError> {
        shown(browser, self.path())
    }

    fn register_steps<'p>(&'p self, steps: &mut StepRegistry<'p>) {
        steps.href("menu", |browser, path| {
            browser.click(&SelectorHint::link_to(path))?;
            Ok(())
        });
        steps
            .to_page::<AccountDetail>("open_account")
            .param("account_id")
            .param_or("tab", "overview")
            .run(|browser, args| {
                for (name, value) in args {
                    browser.fill(&SelectorHint::css(format!("#{}", name)), &arg_text(value))?;
                }
                browser.set_path(&render_template("/accounts/{account_id}", args)?)?;
                Ok(())
            });
        steps.to_page::<Search>("search").param("query").run(|browser, args| {
            for (name, value) in args {
                browser.fill(&SelectorHint::css(format!("#{}", name)), &arg_text(value))?;
            }
            browser.set_path("/search")?;
            Ok(())
        });
    }
}

// ----------------------------------------------------------------------------

pub struct AccountDetail {
    path: String,
    pub account_id: String,
    pub title: Option<String>,
}

impl PageType for AccountDetail {
    const NAME: &'static str = "AccountDetail";

    fn from_args(args: &NavArgs) -> Result<Self, NavError> {
        let path = render_template("/accounts/{account_id}", args).map_err(|e| {
            NavError::PageConstruction {
                page: Self::NAME.to_string(),
                source: e,
            }
        })?;
        let account_id = args.get("account_id").map(arg_text).unwrap_or_default();
        Ok(AccountDetail {
            path,
            account_id,
            title: None,
        })
    }

    fn requires() -> Option<PageClass> {
        Some(PageClass::of::<Accounts>())
    }
}

impl Page for AccountDetail {
    fn class(&self) -> PageClass {
        PageClass::of::<Self>()
    }

    fn path(&self) -> &str {
        &self.path
    }

    fn is_displayed(&self, browser: &mut dyn Browser) -> Result<bool, BrowserError> {
        shown(browser, &self.path)
    }

    fn post_navigate(&mut self, browser: &mut dyn Browser) -> Result<(), NavError> {
        self.title = browser.text_of("#account-name")?;
        Ok(())
    }
}

// ----------------------------------------------------------------------------

/// Declares `/path`, a prerequisite and no steps.
macro_rules! leaf_page {
    ($name:ident, $path:literal, $requires:expr) => {
        pub struct $name;

        impl PageType for $name {
            const NAME: &'static str = stringify!($name);

            fn from_args(_args: &NavArgs) -> Result<Self, NavError> {
                Ok($name)
            }

            fn requires() -> Option<PageClass> {
                $requires
            }
        }

        impl Page for $name {
            fn class(&self) -> PageClass {
                PageClass::of::<Self>()
            }

            fn path(&self) -> &str {
                $path
            }

            fn is_displayed(&self, browser: &mut dyn Browser) -> Result<bool, BrowserError> {
                shown(browser, self.path())
            }
        }
    };
}

leaf_page!(Search, "/search", Some(PageClass::of::<Accounts>()));
leaf_page!(Reports, "/reports", Some(PageClass::of::<Accounts>()));
leaf_page!(Settings, "/settings", Some(PageClass::of::<Home>()));
leaf_page!(Orphan, "/orphan", None);
leaf_page!(CycleA, "/cycle-a", Some(PageClass::of::<CycleB>()));
leaf_page!(CycleB, "/cycle-b", Some(PageClass::of::<CycleA>()));

/// Browser for the typed graph: link ids wired to their pages.
pub fn portal_browser(path: &str) -> super::fake_browser::FakeBrowser {
    super::fake_browser::FakeBrowser::at(path)
        .link("#accounts", "/accounts")
        .link("#settings", "/settings")
}
