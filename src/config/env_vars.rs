use std::borrow::Cow;

use lazy_static::lazy_static;
use regex::{Captures, Regex};

lazy_static! {
    /// Matches `${VAR}` (group 1) or `$VAR` (group 2)
    static ref ENV_VAR_PATTERN: Regex =
        Regex::new(r"\$\{([A-Za-z_][A-Za-z0-9_]*)\}|\$([A-Za-z_][A-Za-z0-9_]*)").unwrap();
}

/// Expand Unix-style environment variables (`$VAR` and `${VAR}`) in a manifest value.
///
/// An unset `${VAR}` expands to the empty string; an unset `$VAR` is left as written.
pub fn expand_env_vars(value: &str) -> Cow<'_, str> {
    ENV_VAR_PATTERN.replace_all(value, |caps: &Captures| {
        if let Some(name) = caps.get(1) {
            std::env::var(name.as_str()).unwrap_or_default()
        } else {
            let name = &caps[2];
            std::env::var(name).unwrap_or_else(|_| format!("${}", name))
        }
    })
}
