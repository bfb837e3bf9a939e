//! Unified error interface for PACT crates.
//!
//! Every error enum in the workspace implements [`ErrorCode`] so the
//! governance loops can decide uniformly whether a failure is worth
//! retrying (transient transport, busy store) or final (bad input,
//! protocol violation).
//!
//! # Code Format
//!
//! Codes are UPPER_SNAKE_CASE, prefixed with the owning crate's domain
//! (`STORE_`, `REGISTRY_`, `PROTOCOL_`, `BUS_`, `CONFIG_`) and stable
//! once published: retry policies and log-based alerting match on them.
//!
//! # Example
//!
//! ```
//! use pact_types::ErrorCode;
//!
//! #[derive(Debug)]
//! enum FetchError {
//!     Unreachable,
//!     Rejected(String),
//! }
//!
//! impl ErrorCode for FetchError {
//!     fn code(&self) -> &'static str {
//!         match self {
//!             Self::Unreachable => "FETCH_UNREACHABLE",
//!             Self::Rejected(_) => "FETCH_REJECTED",
//!         }
//!     }
//!
//!     fn is_recoverable(&self) -> bool {
//!         matches!(self, Self::Unreachable)
//!     }
//! }
//!
//! assert!(FetchError::Unreachable.is_recoverable());
//! ```

/// Machine-readable error classification.
///
/// # Recoverability
///
/// An error is **recoverable** when retrying the same operation later
/// may succeed without any code or configuration change: a network
/// blip, a busy database, a ledger node catching up. Everything else
/// (malformed proposals, rejected registry requests, programmer
/// errors) is final and retrying only burns a reconciler pass.
pub trait ErrorCode {
    /// Returns the stable machine-readable code for this error.
    ///
    /// UPPER_SNAKE_CASE, domain-prefixed, never changed once released.
    fn code(&self) -> &'static str;

    /// Returns whether retrying the failed operation may succeed.
    fn is_recoverable(&self) -> bool;
}

/// Asserts that an error's code follows workspace conventions.
///
/// Checks that the code is non-empty, UPPER_SNAKE_CASE and carries the
/// expected domain prefix.
///
/// # Panics
///
/// Panics with a descriptive message when any check fails. Intended
/// for tests.
pub fn assert_error_code<E: ErrorCode>(err: &E, expected_prefix: &str) {
    let code = err.code();

    assert!(!code.is_empty(), "error code must not be empty");
    assert!(
        code.starts_with(expected_prefix),
        "error code '{}' must start with prefix '{}'",
        code,
        expected_prefix
    );
    assert!(
        is_upper_snake_case(code),
        "error code '{}' must be UPPER_SNAKE_CASE",
        code
    );
}

/// Asserts [`assert_error_code`] over every variant of an error enum.
///
/// Error modules list all their variants once and validate them in a
/// single test, so a new variant with a malformed code fails CI
/// immediately.
pub fn assert_error_codes<E: ErrorCode>(errors: &[E], expected_prefix: &str) {
    assert!(!errors.is_empty(), "no error variants supplied");
    for err in errors {
        assert_error_code(err, expected_prefix);
    }
}

fn is_upper_snake_case(s: &str) -> bool {
    !s.is_empty()
        && s.chars()
            .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit() || c == '_')
        && !s.starts_with('_')
        && !s.ends_with('_')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug)]
    enum SampleError {
        Busy,
        Corrupt,
    }

    impl ErrorCode for SampleError {
        fn code(&self) -> &'static str {
            match self {
                Self::Busy => "SAMPLE_BUSY",
                Self::Corrupt => "SAMPLE_CORRUPT",
            }
        }

        fn is_recoverable(&self) -> bool {
            matches!(self, Self::Busy)
        }
    }

    #[test]
    fn valid_codes_pass() {
        assert_error_codes(&[SampleError::Busy, SampleError::Corrupt], "SAMPLE_");
    }

    #[test]
    #[should_panic(expected = "must start with prefix")]
    fn wrong_prefix_panics() {
        assert_error_code(&SampleError::Busy, "OTHER_");
    }

    #[test]
    fn upper_snake_case_rules() {
        assert!(is_upper_snake_case("STORE_NOT_FOUND"));
        assert!(is_upper_snake_case("A2B"));
        assert!(!is_upper_snake_case(""));
        assert!(!is_upper_snake_case("store_not_found"));
        assert!(!is_upper_snake_case("_LEADING"));
        assert!(!is_upper_snake_case("TRAILING_"));
    }

    #[test]
    fn recoverability_split() {
        assert!(SampleError::Busy.is_recoverable());
        assert!(!SampleError::Corrupt.is_recoverable());
    }
}
