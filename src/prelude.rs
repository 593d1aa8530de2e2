//! Convenient re-exports for common usage.
//!
//! ```rust
//! use attrerr::prelude::*;
//!
//! fn parse(raw: &str) -> Result<u32, Error> {
//!     raw.parse::<u32>().wrap_attrs([Attr::string("raw", raw.to_string())])
//! }
//!
//! assert!(parse("12").is_ok());
//! ```

pub use crate::Attr;
pub use crate::Context;
pub use crate::Error;
pub use crate::OptionExt;
pub use crate::ResultExt;
