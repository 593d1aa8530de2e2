//! Caller identity for error sites.
//!
//! Locations come from `#[track_caller]`: every public entry point of the
//! wrapping API is annotated, so the recorded frame is the user's call site
//! regardless of how many internal calls sit in between. Function names are
//! opt-in through [`function_name!`](crate::function_name), which uses the
//! closure `type_name` trick.

use core::fmt;
use core::panic::Location;

/// Where an error was created or first wrapped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Frame {
    function: Option<&'static str>,
    file: &'static str,
    line: u32,
    column: u32,
}

impl Frame {
    /// The location of the caller of the outermost `#[track_caller]` function.
    #[track_caller]
    #[inline]
    pub fn caller() -> Self {
        Self::from_location(Location::caller())
    }

    pub fn from_location(loc: &'static Location<'static>) -> Self {
        Self {
            function: None,
            file: loc.file(),
            line: loc.line(),
            column: loc.column(),
        }
    }

    /// Attach a function name. The name is trimmed with [`trim_function`].
    pub fn with_function(mut self, name: &'static str) -> Self {
        self.function = Some(trim_function(name)).filter(|f| !f.is_empty());
        self
    }

    /// Trimmed `module::function`, if one was captured.
    pub fn function(&self) -> Option<&'static str> {
        self.function
    }

    pub fn file(&self) -> &'static str {
        self.file
    }

    pub fn line(&self) -> u32 {
        self.line
    }

    pub fn column(&self) -> u32 {
        self.column
    }

    /// `<file>:<line>` with the file trimmed by `prefix`.
    pub fn location(&self, prefix: &str) -> String {
        format!("{}:{}", trim_file(self.file, prefix), self.line)
    }
}

impl fmt::Display for Frame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(func) = self.function {
            write!(f, "{} ", func)?;
        }
        write!(f, "{}:{}", self.file, self.line)
    }
}

/// Trim a fully qualified function path down to `<last module>::<function>`.
///
/// ```rust
/// use attrerr::trim_function;
///
/// assert_eq!(trim_function("app::db::device::delete"), "device::delete");
/// assert_eq!(trim_function("app::db::delete::{{closure}}"), "db::delete");
/// assert_eq!(trim_function("main"), "main");
/// ```
pub fn trim_function(name: &str) -> &str {
    let mut name = name;
    while let Some(stripped) = name.strip_suffix("::{{closure}}") {
        name = stripped;
    }
    // Generic and trait-impl paths contain `::` inside `<...>`; only split outside them.
    let bytes = name.as_bytes();
    let mut depth = 0usize;
    let mut seps = [None::<usize>; 2];
    let mut i = 0;
    while i < bytes.len() {
        match bytes[i] {
            b'<' => depth += 1,
            b'>' => depth = depth.saturating_sub(1),
            b':' if depth == 0 && bytes.get(i + 1) == Some(&b':') => {
                seps = [seps[1], Some(i)];
                i += 1;
            }
            _ => {}
        }
        i += 1;
    }
    match seps {
        [Some(start), Some(_)] => &name[start + 2..],
        _ => name,
    }
}

/// Remove everything up to and including the first occurrence of `prefix`.
///
/// The file is returned unchanged when `prefix` is empty or never occurs, so a
/// misconfigured prefix can never produce an empty path.
///
/// ```rust
/// use attrerr::trim_file;
///
/// assert_eq!(trim_file("/home/ci/app/src/db.rs", "/home/ci/app/"), "src/db.rs");
/// assert_eq!(trim_file("src/db.rs", "/home/ci/app/"), "src/db.rs");
/// assert_eq!(trim_file("src/db.rs", ""), "src/db.rs");
/// ```
pub fn trim_file<'a>(file: &'a str, prefix: &str) -> &'a str {
    if prefix.is_empty() {
        return file;
    }
    match file.find(prefix) {
        Some(idx) if idx + prefix.len() < file.len() => &file[idx + prefix.len()..],
        _ => file,
    }
}

/// Capture the enclosing function's path as a `&'static str`.
///
/// ```rust
/// fn load_config() -> &'static str {
///     attrerr::function_name!()
/// }
/// assert!(load_config().ends_with("load_config"));
/// ```
#[macro_export]
macro_rules! function_name {
    () => {{
        fn __f() {}
        let name = ::core::any::type_name_of_val(&__f);
        name.strip_suffix("::__f").unwrap_or(name)
    }};
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn caller_reports_this_file() {
        let frame = Frame::caller();
        assert!(frame.file().ends_with("frame.rs"), "got {}", frame.file());
        assert_eq!(frame.line(), line!() - 2);
        assert!(frame.function().is_none());
    }

    #[test]
    fn track_caller_is_depth_insensitive() {
        #[track_caller]
        fn depth_one() -> Frame {
            depth_two()
        }
        #[track_caller]
        fn depth_two() -> Frame {
            Frame::caller()
        }
        let frame = depth_one();
        assert_eq!(frame.line(), line!() - 1);
    }

    #[test]
    fn function_name_is_trimmed() {
        let frame = Frame::caller().with_function(crate::function_name!());
        assert_eq!(frame.function(), Some("tests::function_name_is_trimmed"));
    }

    #[test]
    fn function_name_inside_closure() {
        let name = (|| crate::function_name!())();
        assert_eq!(trim_function(name), "tests::function_name_inside_closure");
    }

    #[test]
    fn trim_function_ignores_generic_paths() {
        assert_eq!(
            trim_function("app::Repo<app::db::Pool>::fetch"),
            "Repo<app::db::Pool>::fetch"
        );
        assert_eq!(
            trim_function("<app::Repo as app::Store>::fetch"),
            "<app::Repo as app::Store>::fetch"
        );
    }

    #[test]
    fn trim_file_never_empties() {
        assert_eq!(trim_file("src/lib.rs", "src/lib.rs"), "src/lib.rs");
        assert_eq!(
            trim_file("/root/.cargo/registry/src/index/foo-1.0/src/lib.rs", "/.cargo/registry/src/"),
            "index/foo-1.0/src/lib.rs"
        );
    }

    #[test]
    fn location_uses_prefix() {
        let frame = Frame::caller();
        let loc = frame.location("");
        assert!(loc.ends_with(&format!(":{}", frame.line())));
        assert!(loc.starts_with(frame.file()));
    }
}
