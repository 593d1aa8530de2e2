//! Unit tests for attrerr.
//!
//! These tests are in a separate file for organization but remain in the `src/`
//! directory to retain access to `pub(crate)` items like `StoreBuilder`.

use crate::chain;
use crate::store::StoreBuilder;
use crate::{
    Attr, AttrError, Config, Context, Error, Errors, JoinedError, Kind, LookupError, ResultExt,
    Value,
};
use std::fmt;
use std::io;
use std::time::Duration;

use static_assertions::{assert_impl_all, assert_not_impl_any};

#[derive(Debug, Clone, PartialEq, Eq)]
enum TestError {
    NotFound,
    InvalidInput,
}

impl fmt::Display for TestError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TestError::NotFound => write!(f, "not found"),
            TestError::InvalidInput => write!(f, "invalid input"),
        }
    }
}

impl std::error::Error for TestError {}

fn errors() -> Errors {
    Errors::with_config(Config::builder().package_prefix("").sort_by_key().build())
}

fn keys(err: &Error) -> Vec<String> {
    err.flatten().keys().map(str::to_string).collect()
}

// ============================================================================
// Auto traits and layout
// ============================================================================

assert_impl_all!(Error: Send, Sync, Clone);
assert_impl_all!(AttrError: Send, Sync, std::error::Error);
assert_impl_all!(JoinedError: Send, Sync, std::error::Error);
assert_impl_all!(Context: Send, Sync, Clone);
assert_impl_all!(Config: Send, Sync, Clone);
assert_impl_all!(Errors: Send, Sync);
assert_impl_all!(Attr: Send, Sync, Clone);
assert_impl_all!(LookupError: Send, Sync, std::error::Error);
// Keeps `impl<E: std::error::Error> From<E> for Error` coherent.
assert_not_impl_any!(Error: std::error::Error);

#[test]
fn test_sizeof() {
    use std::mem::size_of;

    // A fat Arc pointer, niche-optimized inside Option/Result.
    assert_eq!(size_of::<Error>(), 2 * size_of::<usize>());
    assert_eq!(size_of::<Option<Error>>(), size_of::<Error>());
    assert_eq!(size_of::<Result<(), Error>>(), size_of::<Error>());
}

// ============================================================================
// Node construction
// ============================================================================

#[test]
fn test_builder_priority() {
    let mut b = StoreBuilder::new();
    b.insert(Attr::uint("k", 1));
    b.insert(Attr::uint("k", 2));
    b.insert_if_absent(Attr::uint("k", 3));
    b.insert_if_absent(Attr::uint("", 4));
    let store = b.build();
    assert_eq!(store.len(), 1);
    assert_eq!(store.get("k").map(Attr::value), Some(&Value::Uint(2)));
}

#[test]
fn test_node_is_immutable_view() {
    let errors = errors();
    let err = errors.wrap_attrs(TestError::NotFound, [Attr::uint("a", 1)]);
    let node = err.as_attr_error().unwrap();
    let first: Vec<_> = node.attrs().map(Attr::to_string).collect();
    let second: Vec<_> = node.attrs().map(Attr::to_string).collect();
    assert_eq!(first, second);
    assert_eq!(node.cause().to_string(), "not found");
}

#[test]
fn test_message_is_not_altered_by_node() {
    let errors = errors();
    let err = errors.wrap_attrs(TestError::InvalidInput, [Attr::bool("retry", false)]);
    assert_eq!(err.to_string(), "invalid input");
    assert_eq!(err.as_attr_error().unwrap().to_string(), "invalid input");
}

#[test]
fn test_render_verbose_is_node_local() {
    let errors = Errors::with_config(Config::builder().source_key("").build());
    let inner = errors.wrap_attrs(TestError::NotFound, [Attr::uint("a", 1)]);
    let outer = errors.wrap_attrs(inner, [Attr::uint("b", 2)]);
    let node = outer.as_attr_error().unwrap();
    assert_eq!(node.render_verbose(), "not found{b=2}");
    assert_eq!(format!("{outer:#}"), "not found{b=2,a=1}");
}

#[test]
fn test_render_verbose_without_attrs() {
    let errors = Errors::with_config(Config::builder().source_key("").build());
    let err = errors.wrap(TestError::NotFound);
    assert_eq!(err.as_attr_error().unwrap().render_verbose(), "not found");
}

// ============================================================================
// Location
// ============================================================================

#[test]
fn test_location_recorded_once() {
    let errors = errors();
    let first = errors.wrap(TestError::NotFound);
    let line = line!() - 1;
    let second = errors.wrap_attrs(first, [Attr::uint("k", 1)]);
    let third = errors.wrap_attrs(second, [Attr::uint("j", 1)]);

    let source: String = third.get("source").unwrap();
    assert_eq!(source, format!("src/tests.rs:{line}"));
    let nodes_with_source = third
        .chain()
        .filter_map(|e| e.downcast_ref::<AttrError>())
        .filter(|n| n.store().get("source").is_some())
        .count();
    assert_eq!(nodes_with_source, 1);
}

#[test]
fn test_location_skipped_when_joined_child_is_structured() {
    let errors = errors();
    let a = errors.new("a");
    let joined = crate::join([Some(a), Some(Error::msg("b"))]).unwrap();
    let wrapped = errors.wrap(joined.clone());
    assert!(wrapped.ptr_eq(&joined));
}

#[test]
fn test_prefix_trimming() {
    let errors = Errors::with_config(Config::builder().package_prefix("src/").build());
    let err = errors.new("x");
    let source: String = err.get("source").unwrap();
    assert!(source.starts_with("tests.rs:"), "got {source}");
}

// ============================================================================
// Flatten
// ============================================================================

#[test]
fn test_flatten_foreign_error_is_empty() {
    let err = Error::from(io::Error::other("plain"));
    assert!(err.flatten().is_empty());
}

#[test]
fn test_flatten_head_wins() {
    let errors = errors();
    let inner = errors.wrap_attrs(TestError::NotFound, [Attr::uint("k", 1), Attr::uint("a", 1)]);
    let outer = errors.wrap_attrs(inner, [Attr::uint("k", 2)]);
    assert_eq!(outer.get::<u64>("k"), Ok(2));
    assert_eq!(outer.get::<u64>("a"), Ok(1));
}

#[test]
fn test_flatten_through_foreign_layer() {
    #[derive(Debug)]
    struct Layer(Error);
    impl fmt::Display for Layer {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            f.write_str("layer")
        }
    }
    impl std::error::Error for Layer {
        fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
            Some(self.0.as_dyn())
        }
    }

    let errors = errors();
    let inner = errors.wrap_attrs(TestError::NotFound, [Attr::uint("deep", 1)]);
    let outer = Error::from(Layer(inner));
    assert_eq!(outer.get::<u64>("deep"), Ok(1));
}

#[test]
fn test_joined_siblings_later_wins_but_head_still_wins() {
    let errors = errors();
    let a = errors.wrap_attrs(TestError::NotFound, [Attr::uint("k", 1), Attr::uint("a", 1)]);
    let b = errors.wrap_attrs(TestError::InvalidInput, [Attr::uint("k", 2)]);
    let joined = crate::join([Some(a), Some(b)]).unwrap();
    assert_eq!(joined.get::<u64>("k"), Ok(2));

    let head = errors.wrap_attrs(joined, [Attr::uint("k", 3)]);
    assert_eq!(head.get::<u64>("k"), Ok(3));
    assert_eq!(head.get::<u64>("a"), Ok(1));
}

#[test]
fn test_flatten_no_duplicates() {
    let errors = errors();
    let mut err = errors.wrap_attrs(TestError::NotFound, [Attr::uint("k", 0)]);
    for i in 1..10 {
        err = errors.wrap_attrs(err, [Attr::uint("k", i), Attr::uint(format!("k{i}"), i)]);
    }
    let map = err.flatten();
    assert_eq!(map.len(), 1 + 9 + 1);
    assert_eq!(map.get_as::<u64>("k"), Ok(9));
}

#[test]
fn test_contains_attr_error_descends_joins() {
    let errors = errors();
    let plain = Error::msg("plain");
    assert!(!chain::contains_attr_error(plain.as_std()));
    let joined = crate::join([Some(plain), Some(errors.new("x"))]).unwrap();
    assert!(chain::contains_attr_error(joined.as_std()));
}

// ============================================================================
// Lookup
// ============================================================================

#[test]
fn test_typed_lookup() {
    let errors = errors();
    let err = errors.wrap_attrs(
        TestError::NotFound,
        [
            Attr::int("delta", -3),
            Attr::float("ratio", 0.5),
            Attr::duration("waited", Duration::from_millis(20)),
        ],
    );
    assert_eq!(err.get::<i64>("delta"), Ok(-3));
    assert_eq!(err.get::<f64>("ratio"), Ok(0.5));
    assert_eq!(err.get::<Duration>("waited"), Ok(Duration::from_millis(20)));
    assert_eq!(
        err.get::<bool>("delta"),
        Err(LookupError::WrongType {
            key: "delta".into(),
            expected: Kind::Bool,
            found: Kind::Int,
        })
    );
    assert_eq!(
        err.get::<bool>("missing"),
        Err(LookupError::NotFound { key: "missing".into() })
    );
}

// ============================================================================
// Chain predicates
// ============================================================================

#[test]
fn test_find_survives_wrapping() {
    let errors = errors();
    let err = errors.wrapf(errors.wrap(TestError::InvalidInput), "validating");
    assert_eq!(crate::into::<TestError>(&err), Some(&TestError::InvalidInput));
    assert!(crate::is(&err, &TestError::InvalidInput));
    assert!(!crate::is(&err, &TestError::NotFound));
}

#[test]
fn test_find_in_joined_children() {
    let joined = crate::join([
        Some(Error::from(io::Error::other("io"))),
        Some(Error::from(TestError::NotFound)),
    ])
    .unwrap();
    assert!(crate::is(&joined, &TestError::NotFound));
    assert!(crate::unwrap(&joined).is_none());
}

#[test]
fn test_unwrap_single_step() {
    let errors = errors();
    let err = errors.wrap(TestError::NotFound);
    let cause = crate::unwrap(&err).unwrap();
    assert!(cause.is::<TestError>());
    assert!(err.cause().is_some());
}

#[test]
fn test_contains_by_identity() {
    let errors = errors();
    let base = Error::from(TestError::NotFound);
    let err = errors.wrap_attrs(base.clone(), [Attr::uint("k", 1)]);
    assert!(err.contains(&base));
    assert!(!err.contains(&Error::from(TestError::NotFound)));
}

// ============================================================================
// Log value
// ============================================================================

#[test]
fn test_log_value_order() {
    let errors = errors();
    let err = errors.wrap_attrs(TestError::NotFound, [Attr::uint("z", 1), Attr::uint("a", 2)]);
    let keys: Vec<_> = err.log_value().attrs().iter().map(|a| a.key().to_string()).collect();
    assert_eq!(keys, ["msg", "a", "z", "source"]);
}

#[test]
fn test_log_value_uses_node_config() {
    let errors = Errors::with_config(Config::builder().message_key("message").source_key("at").build());
    let err = errors.new("x");
    let log = err.log_value();
    assert_eq!(log.attrs()[0].key(), "message");
    assert_eq!(log.attrs().last().map(Attr::key), Some("at"));
}

#[test]
fn test_alternate_display_omits_message_key() {
    let errors = errors();
    let err = errors.wrap_attrs(TestError::NotFound, [Attr::string("msg", "shadow"), Attr::uint("k", 1)]);
    let rendered = format!("{err:#}");
    assert!(rendered.starts_with("not found{k=1,source=src/tests.rs:"), "got {rendered}");
}

#[test]
fn test_debug_is_alternate_display() {
    let errors = Errors::with_config(Config::builder().source_key("").build());
    let err = errors.wrap_attrs(TestError::NotFound, [Attr::uint("k", 1)]);
    assert_eq!(format!("{err:?}"), "not found{k=1}");
}

// ============================================================================
// Extension traits and context
// ============================================================================

#[test]
fn test_result_ext_uses_default_factory() {
    let r: Result<(), TestError> = Err(TestError::NotFound);
    let err = r.wrap().unwrap_err();
    let node = err.as_attr_error().unwrap();
    assert!(std::ptr::eq(node.config(), crate::default_errors().config()));
}

#[test]
fn test_context_attrs_merged_once() {
    let errors = errors();
    let ctx = Context::background().attach([Attr::uint("req", 1)]);
    let mut slot: Result<(), Error> = Err(TestError::NotFound.into());
    errors.wrap_after(Some(&ctx), &mut slot, None);
    errors.wrap_after(Some(&ctx), &mut slot, None);
    let err = slot.unwrap_err();
    assert_eq!(keys(&err), ["req", "source"]);
}

#[test]
fn test_boxed_interop() {
    let errors = errors();
    let err = errors.wrap_attrs(TestError::NotFound, [Attr::uint("k", 1)]);
    let boxed: Box<dyn std::error::Error + Send + Sync> = err.clone().into();
    assert_eq!(boxed.to_string(), "not found");
    let back = Error::from_boxed(boxed);
    assert_eq!(back.get::<u64>("k"), Ok(1));
}
