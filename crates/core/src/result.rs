//! Result type definition for multirotate operations.

use crate::error::Error;

/// The standard Result type for multirotate operations.
///
/// All fallible operations return this type. Use the `?` operator, `match`,
/// or combinator methods to handle results.
///
/// # Examples
///
/// ```
/// use multirotate_core::{Period, Result};
///
/// fn half_period(raw: &str) -> Result<i64> {
///     let period = raw.parse::<Period>()?;
///     Ok(period.as_nanos() / 2)
/// }
///
/// assert_eq!(half_period("2s").ok(), Some(1_000_000_000));
/// assert!(half_period("soon").is_err());
/// ```
pub type Result<T> = std::result::Result<T, Error>;
