use std::{fmt::Display, str::FromStr};

use crate::{errors::CliError, CliResult};

/// Parse the value of the variable `key`, if there is one.
///
/// # Errors
///
/// If the value cannot be parsed.
pub fn parse_opt<T>(key: &str, value: Option<String>) -> CliResult<Option<T>>
where
    T: FromStr,
    <T as FromStr>::Err: Display,
{
    value
        .map(|s| {
            s.parse().map_err(|e: T::Err| CliError::Env {
                key: key.to_owned(),
                message: e.to_string(),
            })
        })
        .transpose()
}
