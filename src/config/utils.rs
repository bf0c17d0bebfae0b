use std::fmt::Display;
use std::str::FromStr;

/// Parse a numeric environment variable value
///
/// The error names the variable so a bad deployment setting is easy to find.
pub fn parse_number<T>(name: &str, value: &str) -> Result<T, String>
where
    T: FromStr,
    T::Err: Display,
{
    value
        .trim()
        .parse::<T>()
        .map_err(|e| format!("Invalid {name} environment variable: {e}"))
}
