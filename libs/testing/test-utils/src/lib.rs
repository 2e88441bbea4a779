//! Shared test utilities
//!
//! - `TestPostgres`: PostgreSQL container with automatic cleanup
//! - `TestDataBuilder`: deterministic names derived from a test name
//!
//! # Usage
//!
//! ```rust,no_run
//! use test_utils::{TestDataBuilder, TestPostgres};
//!
//! #[tokio::test]
//! async fn my_postgres_test() {
//!     let pg = TestPostgres::new().await;
//!     let names = TestDataBuilder::from_test_name("my_postgres_test");
//!     let app_name = names.application_name();
//! }
//! ```

mod postgres;

pub use postgres::{POSTGRES_TAG, TestPostgres};

/// Longest identifier PostgreSQL keeps without truncating
pub const MAX_IDENTIFIER_LEN: usize = 63;

/// Deterministic, collision-resistant names for test objects
///
/// Every name is a lowercase PostgreSQL identifier that fits in
/// [`MAX_IDENTIFIER_LEN`], so it can be used unquoted in `SET` statements,
/// schema names or `application_name`.
pub struct TestDataBuilder {
    seed: u64,
}

impl TestDataBuilder {
    pub fn new(seed: u64) -> Self {
        Self { seed }
    }

    /// Seed from a hash of the test name
    ///
    /// ```
    /// use test_utils::TestDataBuilder;
    ///
    /// let a = TestDataBuilder::from_test_name("test_connect");
    /// let b = TestDataBuilder::from_test_name("test_connect");
    /// assert_eq!(a.name("app", "main"), b.name("app", "main"));
    /// ```
    pub fn from_test_name(name: &str) -> Self {
        use std::collections::hash_map::DefaultHasher;
        use std::hash::{Hash, Hasher};

        let mut hasher = DefaultHasher::new();
        name.hash(&mut hasher);
        Self::new(hasher.finish())
    }

    /// `test_<prefix>_<seed>_<suffix>`, sanitized and truncated
    ///
    /// ```
    /// use test_utils::TestDataBuilder;
    ///
    /// let name = TestDataBuilder::new(7).name("Schema", "main-1");
    /// assert_eq!(name, "test_schema_7_main_1");
    /// ```
    pub fn name(&self, prefix: &str, suffix: &str) -> String {
        let raw = format!("test_{}_{:x}_{}", prefix, self.seed, suffix);
        let mut name: String = raw
            .chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() {
                    c.to_ascii_lowercase()
                } else {
                    '_'
                }
            })
            .collect();
        name.truncate(MAX_IDENTIFIER_LEN);
        name
    }

    /// Value for the `application_name` session setting
    pub fn application_name(&self) -> String {
        self.name("app", "client")
    }

    /// Name for a throwaway schema
    pub fn schema_name(&self) -> String {
        self.name("schema", "main")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_names_are_deterministic_per_test() {
        let a = TestDataBuilder::from_test_name("my_test");
        let b = TestDataBuilder::from_test_name("my_test");
        assert_eq!(a.application_name(), b.application_name());

        let other = TestDataBuilder::from_test_name("other_test");
        assert_ne!(a.application_name(), other.application_name());
    }

    #[test]
    fn test_names_are_valid_identifiers() {
        let builder = TestDataBuilder::new(u64::MAX);
        let long_suffix = "x".repeat(100);

        for name in [
            builder.schema_name(),
            builder.name("Mixed Case", "with-dash"),
            builder.name("app", &long_suffix),
        ] {
            assert!(name.len() <= MAX_IDENTIFIER_LEN, "{} too long", name);
            assert!(name.starts_with("test_"));
            assert!(
                name.chars()
                    .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_'),
                "{} is not a plain identifier",
                name
            );
        }
    }
}
