use std::any::{Any, TypeId};
use std::fmt;
use std::sync::Arc;

use crate::browser::driver::Browser;
use crate::browser::error::BrowserError;
use crate::navigation::error::NavError;
use crate::navigation::step::StepRegistry;
use crate::page::params::NavArgs;

// ============================================================================
// Page descriptor contract
// ============================================================================

/// One logical screen of the application under test.
///
/// A page knows how to recognise itself (`is_displayed`), which page must be
/// showing before it can be reached (`prerequisite`), and which transition
/// steps it offers (`register_steps`). The browser is lent to each call; a
/// page never owns it.
pub trait Page: AsAny {
    fn class(&self) -> PageClass;

    /// Rendered path of this page, e.g. `/buyers/accounts/42`.
    fn path(&self) -> &str;

    /// Page that must be current before this one can be reached.
    fn prerequisite(&self) -> Option<PageClass> {
        self.class().fixed_prerequisite()
    }

    /// Side-effect free check against live browser state. Pages that build
    /// on a shared base AND their own checks with the base's.
    fn is_displayed(&self, browser: &mut dyn Browser) -> Result<bool, BrowserError>;

    /// Declare the transition steps this page offers.
    fn register_steps<'p>(&'p self, _steps: &mut StepRegistry<'p>) {}

    /// Runs after a step made this page visible, and after `open`.
    fn post_navigate(&mut self, _browser: &mut dyn Browser) -> Result<(), NavError> {
        Ok(())
    }

    fn name(&self) -> String {
        self.class().name().to_string()
    }
}

/// A page backed by its own Rust type.
pub trait PageType: Page + Sized + 'static {
    const NAME: &'static str;

    fn from_args(args: &NavArgs) -> Result<Self, NavError>;

    /// Class-level prerequisite shared by every instance.
    fn requires() -> Option<PageClass> {
        None
    }
}

/// Downcasting support for `dyn Page`.
pub trait AsAny: Any {
    fn as_any(&self) -> &dyn Any;
    fn into_any(self: Box<Self>) -> Box<dyn Any>;
}

impl<T: Any> AsAny for T {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn into_any(self: Box<Self>) -> Box<dyn Any> {
        self
    }
}

// ============================================================================
// Page classes
// ============================================================================

/// Identity of a page class.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ClassKey {
    /// A Rust page type.
    Type(TypeId),
    /// A page declared at runtime (site maps), identified by name.
    Declared(Arc<str>),
}

type Builder = dyn Fn(&NavArgs) -> Result<Box<dyn Page>, NavError> + Send + Sync;

/// Type-erased handle to a page class: identity, name, and how to build an
/// instance from navigation arguments.
#[derive(Clone)]
pub struct PageClass {
    key: ClassKey,
    name: Arc<str>,
    build: Arc<Builder>,
    requires: fn() -> Option<PageClass>,
}

fn no_prerequisite() -> Option<PageClass> {
    None
}

impl PageClass {
    pub fn of<P: PageType>() -> Self {
        PageClass {
            key: ClassKey::Type(TypeId::of::<P>()),
            name: Arc::from(P::NAME),
            build: Arc::new(|args: &NavArgs| -> Result<Box<dyn Page>, NavError> {
                Ok(Box::new(P::from_args(args)?))
            }),
            requires: P::requires,
        }
    }

    /// A class declared at runtime. Its instances supply their own
    /// prerequisite.
    pub fn declared<F>(name: &str, build: F) -> Self
    where
        F: Fn(&NavArgs) -> Result<Box<dyn Page>, NavError> + Send + Sync + 'static,
    {
        let name: Arc<str> = Arc::from(name);
        PageClass {
            key: ClassKey::Declared(name.clone()),
            name,
            build: Arc::new(build),
            requires: no_prerequisite,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn key(&self) -> &ClassKey {
        &self.key
    }

    pub fn build(&self, args: &NavArgs) -> Result<Box<dyn Page>, NavError> {
        (self.build)(args)
    }

    pub fn fixed_prerequisite(&self) -> Option<PageClass> {
        (self.requires)()
    }

    pub fn is<P: PageType>(&self) -> bool {
        self.key == ClassKey::Type(TypeId::of::<P>())
    }
}

impl PartialEq for PageClass {
    fn eq(&self, other: &Self) -> bool {
        self.key == other.key
    }
}

impl Eq for PageClass {}

impl fmt::Debug for PageClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("PageClass").field(&self.name).finish()
    }
}

impl fmt::Display for PageClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

/// Recover the concrete type of a page returned by the navigator.
pub fn downcast_page<P: PageType>(page: Box<dyn Page>) -> Result<P, NavError> {
    let actual = page.name();
    AsAny::into_any(page)
        .downcast::<P>()
        .map(|p| *p)
        .map_err(|_| NavError::UnexpectedPage {
            expected: P::NAME.to_string(),
            actual,
        })
}
