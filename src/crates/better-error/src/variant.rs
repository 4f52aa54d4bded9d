//! Error variants
//!
//! A [`Variant`] is a named kind of error. Variants form a tree rooted at the
//! abstract [`Variant::root`]; each one may carry its own pretty name and id
//! generator; unset properties are resolved by walking up to the nearest
//! ancestor that sets them, at query time.

use crate::error::{BetterError, Details, ErrorBuilder};
use crate::{Result, UsageError};
use once_cell::sync::Lazy;
use parking_lot::RwLock;
use regex::Regex;
use serde_json::Value;
use std::fmt;
use std::sync::Arc;
use uuid::Uuid;

/// Name of the abstract root variant
pub const ROOT_NAME: &str = "BetterError";

static WORD_REGEX: Lazy<Regex> = Lazy::new(|| Regex::new(r"[A-Z][a-z]+").unwrap());

static ROOT: Lazy<Variant> = Lazy::new(|| Variant {
    inner: Arc::new(VariantInner {
        name: ROOT_NAME.to_string(),
        parent: None,
        pretty_name: RwLock::new(None),
        id_generator: RwLock::new(None),
    }),
});

/// Zero-argument callable producing a fresh error identity
pub type IdGenerator = Arc<dyn Fn() -> Value + Send + Sync>;

/// How a variant's pretty name is produced
#[derive(Clone)]
pub enum PrettyName {
    /// A constant name
    Fixed(String),
    /// Invoked on every query, e.g. for localized names
    Dynamic(Arc<dyn Fn() -> String + Send + Sync>),
}

impl PrettyName {
    pub fn fixed(name: impl Into<String>) -> Self {
        Self::Fixed(name.into())
    }

    pub fn dynamic<F>(f: F) -> Self
    where
        F: Fn() -> String + Send + Sync + 'static,
    {
        Self::Dynamic(Arc::new(f))
    }

    fn resolve(&self) -> String {
        match self {
            Self::Fixed(name) => name.clone(),
            Self::Dynamic(f) => f(),
        }
    }
}

impl fmt::Debug for PrettyName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Fixed(name) => f.debug_tuple("Fixed").field(name).finish(),
            Self::Dynamic(_) => f.write_str("Dynamic(..)"),
        }
    }
}

impl From<&str> for PrettyName {
    fn from(name: &str) -> Self {
        Self::fixed(name)
    }
}

impl From<String> for PrettyName {
    fn from(name: String) -> Self {
        Self::Fixed(name)
    }
}

struct VariantInner {
    name: String,
    parent: Option<Variant>,
    pretty_name: RwLock<Option<PrettyName>>,
    id_generator: RwLock<Option<IdGenerator>>,
}

/// A named, creatable kind of error
///
/// Cloning is cheap and clones compare equal: identity is shared.
#[derive(Clone)]
pub struct Variant {
    inner: Arc<VariantInner>,
}

impl Variant {
    /// The abstract root variant every other variant descends from
    pub fn root() -> Self {
        ROOT.clone()
    }

    pub fn name(&self) -> &str {
        &self.inner.name
    }

    pub fn parent(&self) -> Option<&Variant> {
        self.inner.parent.as_ref()
    }

    /// Whether instances of this variant can be built
    pub fn is_abstract(&self) -> bool {
        self.inner.parent.is_none()
    }

    /// Iterate over this variant and its ancestors, nearest first
    pub fn ancestors(&self) -> impl Iterator<Item = &Variant> {
        std::iter::successors(Some(self), |v| v.parent())
    }

    /// Whether this variant is `other` or descends from it
    pub fn is_a(&self, other: &Variant) -> bool {
        self.ancestors().any(|v| v == other)
    }

    /// Resolve the pretty name
    ///
    /// Uses the nearest explicit pretty name on this variant or an ancestor,
    /// and otherwise derives one from this variant's own name.
    pub fn pretty_name(&self) -> String {
        let explicit = self
            .ancestors()
            .find_map(|v| v.inner.pretty_name.read().clone());

        match explicit {
            Some(pretty) => pretty.resolve(),
            None => derive_pretty_name(self.name()),
        }
    }

    /// Resolve the id generator from this variant or its nearest ancestor
    pub fn id_generator(&self) -> IdGenerator {
        self.ancestors()
            .find_map(|v| v.inner.id_generator.read().clone())
            .unwrap_or_else(|| Arc::new(uuid_v4))
    }

    /// Produce a fresh identity with the resolved generator
    pub fn generate_id(&self) -> Value {
        (self.id_generator())()
    }

    /// Override the pretty name for this variant and descendants that don't set one
    pub fn set_pretty_name(&self, pretty_name: impl Into<PrettyName>) {
        *self.inner.pretty_name.write() = Some(pretty_name.into());
    }

    /// Go back to inheriting the pretty name
    pub fn clear_pretty_name(&self) {
        *self.inner.pretty_name.write() = None;
    }

    /// Override the id generator for this variant and descendants that don't set one
    pub fn set_id_generator<F>(&self, generator: F)
    where
        F: Fn() -> Value + Send + Sync + 'static,
    {
        *self.inner.id_generator.write() = Some(Arc::new(generator));
    }

    /// Go back to inheriting the id generator
    pub fn clear_id_generator(&self) {
        *self.inner.id_generator.write() = None;
    }

    /// Start defining a new variant below this one
    ///
    /// # Example
    ///
    /// ```rust
    /// use better_error::Variant;
    /// use serde_json::json;
    ///
    /// let im_an = Variant::root().create("ImAnError").build().unwrap();
    /// let yet_another = im_an
    ///     .create("YetAnotherError")
    ///     .pretty_name("So Pretty")
    ///     .id_generator(|| json!(42))
    ///     .build()
    ///     .unwrap();
    ///
    /// assert!(yet_another.is_a(&im_an));
    /// assert_eq!(yet_another.pretty_name(), "So Pretty");
    /// assert_eq!(yet_another.generate_id(), json!(42));
    /// ```
    pub fn create(&self, name: impl Into<String>) -> VariantBuilder<'_> {
        VariantBuilder {
            receiver: self,
            name: name.into(),
            pretty_name: None,
            id_generator: None,
            base: None,
        }
    }

    /// Start building an instance of this variant
    pub fn error(&self) -> ErrorBuilder {
        ErrorBuilder::new(self.clone())
    }

    /// Build an instance with the given details and nothing else
    pub fn new_error(&self, details: impl Into<Details>) -> Result<BetterError> {
        self.error().details(details).build()
    }
}

impl PartialEq for Variant {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl Eq for Variant {}

impl fmt::Display for Variant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl fmt::Debug for Variant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Variant")
            .field("name", &self.name())
            .field("parent", &self.parent().map(Variant::name))
            .finish()
    }
}

/// Builder returned by [`Variant::create`]
pub struct VariantBuilder<'a> {
    receiver: &'a Variant,
    name: String,
    pretty_name: Option<PrettyName>,
    id_generator: Option<IdGenerator>,
    base: Option<Variant>,
}

impl<'a> VariantBuilder<'a> {
    /// Set a constant pretty name
    pub fn pretty_name(mut self, pretty_name: impl Into<String>) -> Self {
        self.pretty_name = Some(PrettyName::Fixed(pretty_name.into()));
        self
    }

    /// Compute the pretty name on every query
    pub fn pretty_name_with<F>(mut self, f: F) -> Self
    where
        F: Fn() -> String + Send + Sync + 'static,
    {
        self.pretty_name = Some(PrettyName::dynamic(f));
        self
    }

    pub fn id_generator<F>(mut self, generator: F) -> Self
    where
        F: Fn() -> Value + Send + Sync + 'static,
    {
        self.id_generator = Some(Arc::new(generator));
        self
    }

    /// Parent of the new variant; must be the receiver or one of its descendants
    pub fn base(mut self, base: &Variant) -> Self {
        self.base = Some(base.clone());
        self
    }

    pub fn build(self) -> Result<Variant> {
        let base = self.base.unwrap_or_else(|| self.receiver.clone());
        if !base.is_a(self.receiver) {
            return Err(UsageError::UnrelatedBase {
                base: base.name().to_string(),
                variant: self.receiver.name().to_string(),
            });
        }

        tracing::debug!(variant = %self.name, base = %base.name(), "Creating error variant");

        Ok(Variant {
            inner: Arc::new(VariantInner {
                name: self.name,
                parent: Some(base),
                pretty_name: RwLock::new(self.pretty_name),
                id_generator: RwLock::new(self.id_generator),
            }),
        })
    }
}

/// Derive a human name from a variant name
///
/// `ConnectionTimeoutError` becomes `Connection Timeout`. Names that don't end
/// in a separable `Error` word, or have nothing left without it, come back
/// unchanged.
pub fn derive_pretty_name(name: &str) -> String {
    let short = name.rsplit("::").next().unwrap_or(name);
    let mut words: Vec<&str> = WORD_REGEX.find_iter(short).map(|m| m.as_str()).collect();

    if words.pop() != Some("Error") || words.is_empty() {
        return name.to_string();
    }

    words.join(" ")
}

fn uuid_v4() -> Value {
    Value::String(Uuid::new_v4().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn uuid_v4_regex() -> Regex {
        Regex::new(r"(?i)^[0-9A-F]{8}-[0-9A-F]{4}-4[0-9A-F]{3}-[89AB][0-9A-F]{3}-[0-9A-F]{12}$")
            .unwrap()
    }

    #[test]
    fn test_root_is_abstract() {
        let root = Variant::root();
        assert!(root.is_abstract());
        assert_eq!(root.name(), ROOT_NAME);
        assert_eq!(root, Variant::root());
    }

    #[test]
    fn test_derive_pretty_name() {
        assert_eq!(derive_pretty_name("ConnectionTimeoutError"), "Connection Timeout");
        assert_eq!(derive_pretty_name("ImAnError"), "Im An");
        assert_eq!(derive_pretty_name("app::errors::NotFoundError"), "Not Found");
    }

    #[test]
    fn test_derive_pretty_name_fallbacks() {
        assert_eq!(derive_pretty_name("Error"), "Error");
        assert_eq!(derive_pretty_name("Timeout"), "Timeout");
        assert_eq!(derive_pretty_name("HTTPError"), "HTTPError");
        assert_eq!(derive_pretty_name("ErrorProne"), "ErrorProne");
    }

    #[test]
    fn test_default_pretty_name_uses_own_name() {
        let parent = Variant::root().create("StorageError").build().unwrap();
        let child = parent.create("DiskFullError").build().unwrap();
        assert_eq!(parent.pretty_name(), "Storage");
        assert_eq!(child.pretty_name(), "Disk Full");
    }

    #[test]
    fn test_default_id_is_uuid_v4() {
        let variant = Variant::root().create("IdError").build().unwrap();
        let re = uuid_v4_regex();

        for _ in 0..8 {
            let id = variant.generate_id();
            let id = id.as_str().unwrap();
            assert_eq!(id.len(), 36);
            assert!(re.is_match(id), "not a v4 uuid: {}", id);
        }
        assert_ne!(variant.generate_id(), variant.generate_id());
    }

    #[test]
    fn test_create_with_overrides() {
        let parent = Variant::root().create("ImAnError").build().unwrap();
        let child = parent
            .create("YetAnotherError")
            .pretty_name("So Pretty")
            .id_generator(|| json!(42))
            .build()
            .unwrap();

        assert!(child.is_a(&parent));
        assert!(child.is_a(&Variant::root()));
        assert!(!parent.is_a(&child));
        assert_eq!(child.pretty_name(), "So Pretty");
        assert_eq!(child.generate_id(), json!(42));
    }

    #[test]
    fn test_dynamic_pretty_name_is_called_each_time() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        let variant = Variant::root()
            .create("LocalizedError")
            .pretty_name_with(move || format!("call {}", counter.fetch_add(1, Ordering::SeqCst)))
            .build()
            .unwrap();

        assert_eq!(variant.pretty_name(), "call 0");
        assert_eq!(variant.pretty_name(), "call 1");
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_create_with_descendant_base() {
        let parent = Variant::root().create("ParentError").build().unwrap();
        let middle = parent.create("MiddleError").build().unwrap();
        let leaf = parent.create("LeafError").base(&middle).build().unwrap();

        assert_eq!(leaf.parent(), Some(&middle));
        assert!(leaf.is_a(&middle));
        assert!(leaf.is_a(&parent));
    }

    #[test]
    fn test_create_with_unrelated_base_fails() {
        let left = Variant::root().create("LeftError").build().unwrap();
        let right = Variant::root().create("RightError").build().unwrap();

        let err = left.create("OddError").base(&right).build().unwrap_err();
        match err {
            UsageError::UnrelatedBase { base, variant } => {
                assert_eq!(base, "RightError");
                assert_eq!(variant, "LeftError");
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_create_with_ancestor_base_fails() {
        let parent = Variant::root().create("UpperError").build().unwrap();
        let child = parent.create("LowerError").build().unwrap();
        assert!(child.create("SidewaysError").base(&parent).build().is_err());
    }

    #[test]
    fn test_inheritance_is_dynamic() {
        let parent = Variant::root().create("DynamicParentError").build().unwrap();
        let child = parent.create("DynamicChildError").build().unwrap();
        let pinned = parent
            .create("PinnedChildError")
            .id_generator(|| json!("pinned"))
            .build()
            .unwrap();

        parent.set_id_generator(|| json!(7));
        parent.set_pretty_name("Renamed");

        assert_eq!(child.generate_id(), json!(7));
        assert_eq!(child.pretty_name(), "Renamed");
        assert_eq!(pinned.generate_id(), json!("pinned"));

        parent.clear_id_generator();
        parent.clear_pretty_name();
        assert!(child.generate_id().is_string());
        assert_eq!(child.pretty_name(), "Dynamic Child");
    }

    #[test]
    fn test_debug_shows_parent() {
        let variant = Variant::root().create("DebugError").build().unwrap();
        let debug = format!("{:?}", variant);
        assert!(debug.contains("DebugError"));
        assert!(debug.contains(ROOT_NAME));
        assert_eq!(variant.to_string(), "DebugError");
    }

    proptest! {
        #[test]
        fn prop_pretty_name_strips_trailing_error(words in proptest::collection::vec("[A-Z][a-z]{1,6}", 1..4)) {
            let name = format!("{}Error", words.concat());
            prop_assert_eq!(derive_pretty_name(&name), words.join(" "));
        }
    }
}
