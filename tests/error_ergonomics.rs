//! Test ergonomics of attrerr with different error handling approaches.
//!
//! Tests interaction with:
//! - Regular enums
//! - thiserror
//! - anyhow
//! - `?` propagation

use attrerr::{Attr, Error, ResultExt};
use std::fmt;
use std::io;

// ============================================================================
// 1. Regular enum errors (no external crate)
// ============================================================================

#[derive(Debug, PartialEq)]
enum PlainError {
    NotFound,
    InvalidInput(String),
}

impl fmt::Display for PlainError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PlainError::NotFound => write!(f, "not found"),
            PlainError::InvalidInput(s) => write!(f, "invalid input: {}", s),
        }
    }
}

impl std::error::Error for PlainError {}

// ============================================================================
// 2. thiserror-based errors
// ============================================================================

#[derive(Debug, thiserror::Error)]
enum ThiserrorError {
    #[error("database connection failed")]
    DbConnection,
    #[error("query failed: {0}")]
    Query(String),
    #[error("io error")]
    Io(#[from] io::Error),
}

#[derive(Debug, thiserror::Error)]
enum OuterThiserror {
    #[error("inner error occurred")]
    Inner(#[from] ThiserrorError),
}

// ============================================================================
// Plain enums
// ============================================================================

#[test]
fn plain_enum_with_question_mark() {
    fn validate(input: &str) -> Result<(), PlainError> {
        if input.is_empty() {
            return Err(PlainError::InvalidInput("empty".into()));
        }
        Ok(())
    }

    fn handler(input: &str) -> Result<(), Error> {
        validate(input).wrap_attrs([Attr::string("input", input.to_string())])?;
        Ok(())
    }

    assert!(handler("ok").is_ok());
    let err = handler("").unwrap_err();
    assert_eq!(err.to_string(), "invalid input: empty");
    assert_eq!(
        err.find::<PlainError>(),
        Some(&PlainError::InvalidInput("empty".into()))
    );
}

#[test]
fn plain_enum_converts_with_question_mark_alone() {
    fn lookup() -> Result<(), Error> {
        Err(PlainError::NotFound)?;
        Ok(())
    }

    let err = lookup().unwrap_err();
    assert!(err.flatten().is_empty());
    assert!(attrerr::is(&err, &PlainError::NotFound));
}

// ============================================================================
// thiserror
// ============================================================================

#[test]
fn thiserror_source_chain_is_searchable() {
    fn read() -> Result<(), ThiserrorError> {
        Err(io::Error::new(io::ErrorKind::UnexpectedEof, "short read"))?;
        Ok(())
    }

    fn outer() -> Result<(), Error> {
        read()
            .map_err(OuterThiserror::from)
            .wrap_attrs([Attr::string("table", "users")])
    }

    let err = outer().unwrap_err();
    assert_eq!(err.to_string(), "inner error occurred");
    let io_err = err.find::<io::Error>().expect("io error in chain");
    assert_eq!(io_err.kind(), io::ErrorKind::UnexpectedEof);
    assert!(err.find::<ThiserrorError>().is_some());
    assert_eq!(err.get::<String>("table").as_deref(), Ok("users"));

    let messages: Vec<_> = err.chain().map(|e| e.to_string()).collect();
    assert_eq!(
        messages,
        ["inner error occurred", "inner error occurred", "io error", "short read"]
    );
}

#[test]
fn thiserror_variants_keep_their_messages() {
    let db = attrerr::wrapf(ThiserrorError::DbConnection, "opening pool");
    assert_eq!(db.to_string(), "opening pool: database connection failed");

    let query = attrerr::wrap(ThiserrorError::Query("syntax".into()));
    assert_eq!(query.to_string(), "query failed: syntax");
}

// ============================================================================
// anyhow
// ============================================================================

#[test]
fn anyhow_into_attrerr() {
    let source = anyhow::anyhow!("upstream failed").context("calling billing");
    let err = attrerr::wrap_attrs(
        Error::from_boxed(source.into()),
        [Attr::uint("attempt", 3)],
    );
    assert_eq!(err.to_string(), "calling billing");
    assert_eq!(err.get::<u64>("attempt"), Ok(3));
    assert!(err.chain().any(|e| e.to_string() == "upstream failed"));
}

#[test]
fn attrerr_into_anyhow() {
    fn inner() -> Result<(), Error> {
        Err(PlainError::NotFound).wrap_attrs([Attr::uint("id", 7)])
    }

    fn outer() -> anyhow::Result<()> {
        inner().map_err(anyhow::Error::msg)?;
        Ok(())
    }

    let err = outer().unwrap_err();
    assert_eq!(err.to_string(), "not found");
    let back = err.downcast_ref::<Error>().expect("attrerr::Error inside anyhow");
    assert_eq!(back.get::<u64>("id"), Ok(7));
}

// ============================================================================
// Boxed std errors
// ============================================================================

#[test]
fn boxed_std_error_round_trip() {
    fn api() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        Err(attrerr::wrap_attrs(PlainError::NotFound, [Attr::bool("cached", false)]))?;
        Ok(())
    }

    let boxed = api().unwrap_err();
    assert_eq!(boxed.to_string(), "not found");
    let err = Error::from_boxed(boxed);
    assert_eq!(err.get::<bool>("cached"), Ok(false));
    assert!(err.find::<PlainError>().is_some());
}
