//! Rendering an error for a structured logging sink.

use std::fmt;

use crate::chain::AttrMap;
use crate::config::Config;
use crate::value::{Attr, Value};

/// An ordered group of attributes describing an error chain.
///
/// Order: the message first, then the flattened chain metadata (sorted when
/// the configuration asks for it), then the location attribute last.
///
/// `Display` renders `[msg=... k=v source=file:line]`, so the value can be
/// recorded by `tracing` as a display field:
///
/// ```rust
/// let err = attrerr::wrap_attrs(attrerr::new("lost"), [attrerr::Attr::uint("shard", 3)]);
/// tracing::warn!(error = %err.log_value(), "replication failed");
/// ```
#[derive(Clone, PartialEq)]
pub struct LogValue {
    attrs: Vec<Attr>,
}

impl LogValue {
    pub(crate) fn build(message: String, mut map: AttrMap, config: &Config) -> Self {
        let mut attrs = Vec::with_capacity(map.len() + 1);
        if !config.message_key().is_empty() {
            // The message owns its key; a same-named attribute would be ambiguous.
            map.take(config.message_key());
            attrs.push(Attr::string(config.message_key().to_string(), message));
        }
        let source = if config.source_key().is_empty() {
            None
        } else {
            map.take(config.source_key())
        };
        let start = attrs.len();
        attrs.extend(map);
        if let Some(compare) = config.sort() {
            attrs[start..].sort_by(compare);
        }
        attrs.extend(source);
        Self { attrs }
    }

    pub fn attrs(&self) -> &[Attr] {
        &self.attrs
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.attrs.iter().find(|a| a.key() == key).map(Attr::value)
    }

    pub fn len(&self) -> usize {
        self.attrs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.attrs.is_empty()
    }

    /// The group as a plain [`Value`].
    pub fn into_value(self) -> Value {
        Value::Group(self.attrs)
    }
}

impl fmt::Display for LogValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[")?;
        for (i, attr) in self.attrs.iter().enumerate() {
            if i > 0 {
                f.write_str(" ")?;
            }
            write!(f, "{}", attr)?;
        }
        f.write_str("]")
    }
}

impl fmt::Debug for LogValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.attrs.iter()).finish()
    }
}

impl IntoIterator for LogValue {
    type Item = Attr;
    type IntoIter = std::vec::IntoIter<Attr>;

    fn into_iter(self) -> Self::IntoIter {
        self.attrs.into_iter()
    }
}

#[cfg(feature = "serde")]
impl serde::Serialize for LogValue {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        use serde::ser::SerializeMap;

        let mut map = serializer.serialize_map(Some(self.attrs.len()))?;
        for attr in &self.attrs {
            map.serialize_entry(attr.key(), attr.value())?;
        }
        map.end()
    }
}
