//! Ambient "error being handled" slot
//!
//! When a `BetterError` is built without an explicit cause, it picks up the
//! innermost error currently being handled on this thread. Handling scopes
//! are entered through [`HandlingGuard`], [`handle`] or [`OrRaise::or_raise`]
//! and nest like `catch` blocks.
//!
//! # Example
//!
//! ```rust
//! use better_error::{OrRaise, Variant};
//!
//! let parse = Variant::root().create("ParseError").build().unwrap();
//!
//! let result: Result<u16, _> = "eighty".parse::<u16>().or_raise(|| {
//!     parse.new_error("port must be numeric").unwrap()
//! });
//!
//! let error = result.unwrap_err();
//! assert_eq!(error.children().len(), 1);
//! assert_eq!(error.root_cause().unwrap().name(), "ParseIntError");
//! ```

use crate::error::chain::{debug_name, short_type_name};
use crate::error::BetterError;
use std::borrow::Cow;
use std::cell::RefCell;
use std::error::Error as StdError;
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

thread_local! {
    static HANDLING: RefCell<Vec<Raised>> = const { RefCell::new(Vec::new()) };
}

/// A shared handle to an error that was raised
///
/// Remembers the concrete type name of the error it was built from, since
/// `dyn Error` can't report it later.
#[derive(Clone)]
pub struct Raised {
    name: Cow<'static, str>,
    error: Arc<dyn StdError + Send + Sync + 'static>,
}

impl Raised {
    pub fn new<E>(error: E) -> Self
    where
        E: StdError + Send + Sync + 'static,
    {
        Self {
            name: Cow::Borrowed(short_type_name::<E>()),
            error: Arc::new(error),
        }
    }

    /// Wrap an already shared error under an explicit name
    pub fn from_shared(
        error: Arc<dyn StdError + Send + Sync + 'static>,
        name: impl Into<String>,
    ) -> Self {
        Self {
            name: Cow::Owned(name.into()),
            error,
        }
    }

    /// Wrap a boxed error, naming it after its `Debug` output
    pub fn from_boxed(error: Box<dyn StdError + Send + Sync + 'static>) -> Self {
        let name = debug_name(&*error);
        Self {
            name: Cow::Owned(name),
            error: Arc::from(error),
        }
    }

    pub fn error(&self) -> &(dyn StdError + 'static) {
        &*self.error
    }

    pub fn shared(&self) -> Arc<dyn StdError + Send + Sync + 'static> {
        self.error.clone()
    }

    /// Variant name for enriched errors, type name otherwise
    pub fn name(&self) -> String {
        match self.error.downcast_ref::<BetterError>() {
            Some(better) => better.variant().name().to_string(),
            None => self.name.to_string(),
        }
    }

    pub fn downcast_ref<T: StdError + 'static>(&self) -> Option<&T> {
        self.error.downcast_ref::<T>()
    }

    /// Whether both handles point at the same error value
    pub fn ptr_eq(&self, other: &Raised) -> bool {
        std::ptr::eq(
            Arc::as_ptr(&self.error) as *const (),
            Arc::as_ptr(&other.error) as *const (),
        )
    }
}

impl<E> From<E> for Raised
where
    E: StdError + Send + Sync + 'static,
{
    fn from(error: E) -> Self {
        Self::new(error)
    }
}

impl fmt::Display for Raised {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&*self.error, f)
    }
}

impl fmt::Debug for Raised {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&*self.error, f)
    }
}

/// RAII guard marking an error as being handled on this thread
///
/// Errors built while the guard is alive take it as their cause unless they
/// are given one explicitly. Dropping the guard leaves the scope.
///
/// # Example
///
/// ```rust
/// use better_error::{handling, HandlingGuard};
///
/// let io = std::io::Error::new(std::io::ErrorKind::Other, "disk on fire");
/// {
///     let _guard = HandlingGuard::enter(io);
///     assert_eq!(handling::current().unwrap().to_string(), "disk on fire");
/// }
/// assert!(handling::current().is_none());
/// ```
pub struct HandlingGuard {
    depth: usize,
    // Tied to the thread whose slot it pushed onto.
    _not_send: PhantomData<*const ()>,
}

impl HandlingGuard {
    pub fn enter(error: impl Into<Raised>) -> Self {
        let raised = error.into();
        tracing::trace!(error = %raised, "Entering handling scope");

        let depth = HANDLING.with(|slot| {
            let mut stack = slot.borrow_mut();
            stack.push(raised);
            stack.len()
        });

        Self {
            depth,
            _not_send: PhantomData,
        }
    }
}

impl Drop for HandlingGuard {
    fn drop(&mut self) {
        HANDLING.with(|slot| slot.borrow_mut().truncate(self.depth - 1));
    }
}

/// Run `f` while `error` is being handled
pub fn handle<R>(error: impl Into<Raised>, f: impl FnOnce() -> R) -> R {
    let _guard = HandlingGuard::enter(error);
    f()
}

/// The innermost error being handled on this thread, if any
pub fn current() -> Option<Raised> {
    HANDLING.with(|slot| slot.borrow().last().cloned())
}

/// Replace a failed result's error with a new one raised while handling it
pub trait OrRaise<T> {
    /// Build the replacement error with the original error in the handling slot
    fn or_raise<E2, F>(self, f: F) -> std::result::Result<T, E2>
    where
        F: FnOnce() -> E2;
}

impl<T, E> OrRaise<T> for std::result::Result<T, E>
where
    E: StdError + Send + Sync + 'static,
{
    fn or_raise<E2, F>(self, f: F) -> std::result::Result<T, E2>
    where
        F: FnOnce() -> E2,
    {
        self.map_err(|error| handle(error, f))
    }
}
