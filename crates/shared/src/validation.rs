//! Common validation utilities.

use std::net::IpAddr;
use thiserror::Error;

/// Reasons a value was rejected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("{field} must be a plain token, got {value:?}")]
    InvalidToken { field: &'static str, value: String },

    #[error("{value:?} is not a valid {family} address")]
    InvalidAddress { family: &'static str, value: String },

    #[error("no recipients given")]
    NoRecipients,
}

lazy_static::lazy_static! {
    static ref TOKEN_REGEX: regex::Regex = regex::Regex::new(r"^[A-Za-z0-9_-]+$").unwrap();
}

/// Validates a value that is interpolated into a script file name.
///
/// Only ASCII letters, digits, `_` and `-` are accepted so the resulting path
/// can never leave the script directory.
pub fn validate_token(field: &'static str, value: &str) -> Result<(), ValidationError> {
    if TOKEN_REGEX.is_match(value) {
        Ok(())
    } else {
        Err(ValidationError::InvalidToken {
            field,
            value: value.to_string(),
        })
    }
}

/// Validates an IP address against the declared family (`ipv4` or `ipv6`).
///
/// Unknown families accept either kind of address; the family name itself is
/// checked separately with [`validate_token`].
pub fn validate_ip(family: &str, value: &str) -> Result<IpAddr, ValidationError> {
    let parsed: Option<IpAddr> = value.trim().parse().ok();
    match (family, parsed) {
        ("ipv4", Some(ip @ IpAddr::V4(_))) => Ok(ip),
        ("ipv6", Some(ip @ IpAddr::V6(_))) => Ok(ip),
        ("ipv4", _) => Err(ValidationError::InvalidAddress {
            family: "ipv4",
            value: value.to_string(),
        }),
        ("ipv6", _) => Err(ValidationError::InvalidAddress {
            family: "ipv6",
            value: value.to_string(),
        }),
        (_, Some(ip)) => Ok(ip),
        (_, None) => Err(ValidationError::InvalidAddress {
            family: "ip",
            value: value.to_string(),
        }),
    }
}

/// Splits a recipient list as entered in the web UI.
///
/// Both `,` and `;` separate addresses; blanks are dropped.
pub fn split_recipients(list: &str) -> Result<Vec<String>, ValidationError> {
    let recipients: Vec<String> = list
        .split([',', ';'])
        .map(str::trim)
        .filter(|r| !r.is_empty())
        .map(String::from)
        .collect();

    if recipients.is_empty() {
        Err(ValidationError::NoRecipients)
    } else {
        Ok(recipients)
    }
}
