//! Configuration for an [`Errors`](crate::Errors) factory.
//!
//! There is no process-wide mutable state: each factory owns its `Config`,
//! and every error it creates keeps a shared reference to it so rendering
//! uses the same keys and ordering the error was built with.

use std::borrow::Cow;
use std::cmp::Ordering;

use crate::value::Attr;

/// Default key for the `<file>:<line>` location attribute.
pub const DEFAULT_SOURCE_KEY: &str = "source";

/// Default key for the message in a rendered log group.
pub const DEFAULT_MESSAGE_KEY: &str = "msg";

/// Default prefix trimmed from source files.
///
/// Workspace members are compiled from paths relative to the workspace root,
/// which need no trimming. Registry dependencies are compiled from absolute
/// paths under `$CARGO_HOME/registry/src/`; trimming there leaves
/// `<index>/<crate>-<ver>/src/...` whatever the user's home directory is.
pub const DEFAULT_PACKAGE_PREFIX: &str = "/.cargo/registry/src/";

/// Comparator used to order attributes in rendered output.
pub type AttrCompare = fn(&Attr, &Attr) -> Ordering;

/// Orders attributes by key.
pub fn compare_keys(a: &Attr, b: &Attr) -> Ordering {
    a.key().cmp(b.key())
}

/// Rendering and location settings.
///
/// ```rust
/// use attrerr::Config;
///
/// let config = Config::builder()
///     .source_key("file")
///     .package_prefix("")
///     .sort_by_key()
///     .build();
/// assert_eq!(config.source_key(), "file");
/// assert_eq!(config.message_key(), "msg");
/// assert!(config.sort().is_some());
/// ```
#[derive(Debug, Clone)]
pub struct Config {
    source_key: Cow<'static, str>,
    message_key: Cow<'static, str>,
    package_prefix: Cow<'static, str>,
    sort: Option<AttrCompare>,
}

impl Config {
    pub fn builder() -> ConfigBuilder {
        ConfigBuilder::new()
    }

    /// Key of the location attribute. Empty means locations are not recorded.
    pub fn source_key(&self) -> &str {
        &self.source_key
    }

    /// Key of the message in a log group. Empty means the message is omitted.
    pub fn message_key(&self) -> &str {
        &self.message_key
    }

    /// Prefix trimmed from source file paths. Empty disables trimming.
    pub fn package_prefix(&self) -> &str {
        &self.package_prefix
    }

    /// Ordering applied to rendered attributes; `None` keeps chain order.
    pub fn sort(&self) -> Option<AttrCompare> {
        self.sort
    }
}

impl Default for Config {
    fn default() -> Self {
        ConfigBuilder::new().build()
    }
}

/// Builder for [`Config`].
#[derive(Debug, Clone)]
pub struct ConfigBuilder {
    source_key: Cow<'static, str>,
    message_key: Cow<'static, str>,
    package_prefix: Cow<'static, str>,
    sort: Option<AttrCompare>,
}

impl ConfigBuilder {
    /// Create a new builder with default values.
    pub fn new() -> Self {
        Self {
            source_key: Cow::Borrowed(DEFAULT_SOURCE_KEY),
            message_key: Cow::Borrowed(DEFAULT_MESSAGE_KEY),
            package_prefix: Cow::Borrowed(DEFAULT_PACKAGE_PREFIX),
            sort: None,
        }
    }

    pub fn source_key(mut self, key: impl Into<Cow<'static, str>>) -> Self {
        self.source_key = key.into();
        self
    }

    pub fn message_key(mut self, key: impl Into<Cow<'static, str>>) -> Self {
        self.message_key = key.into();
        self
    }

    /// Override the file prefix. Defaults to [`DEFAULT_PACKAGE_PREFIX`].
    pub fn package_prefix(mut self, prefix: impl Into<Cow<'static, str>>) -> Self {
        self.package_prefix = prefix.into();
        self
    }

    pub fn sort(mut self, compare: AttrCompare) -> Self {
        self.sort = Some(compare);
        self
    }

    /// Sort rendered attributes by key for deterministic output.
    pub fn sort_by_key(self) -> Self {
        self.sort(compare_keys)
    }

    pub fn build(self) -> Config {
        Config {
            source_key: self.source_key,
            message_key: self.message_key,
            package_prefix: self.package_prefix,
            sort: self.sort,
        }
    }
}

impl Default for ConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}
