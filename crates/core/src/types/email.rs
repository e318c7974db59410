//! Verification-code recipient address.
//!
//! The backend owns real address validation. The check here only keeps a
//! verification request from going out for input that cannot be delivered:
//! `local@domain.tld`, one `@`, no whitespace.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Why an address was refused.
#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmailError {
    #[error("email cannot be empty")]
    Empty,
    #[error("email must be at most {limit} characters")]
    TooLong { limit: usize },
    #[error("email cannot contain whitespace")]
    Whitespace,
    #[error("email must contain a single @ symbol")]
    AtSign,
    #[error("email needs a name before the @")]
    NoLocalPart,
    #[error("email domain must look like example.com")]
    Domain,
}

/// A trimmed address that passed [`Email::parse`].
///
/// ```
/// use folio_core::Email;
///
/// assert_eq!(Email::parse(" ann@example.org ").unwrap().as_str(), "ann@example.org");
/// assert!(Email::parse("ann@localhost").is_err());
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(transparent)]
pub struct Email(String);

const LENGTH_LIMIT: usize = 254;

fn has_dotted_domain(domain: &str) -> bool {
    domain
        .rsplit_once('.')
        .is_some_and(|(name, tld)| !name.is_empty() && !tld.is_empty())
}

impl Email {
    /// # Errors
    ///
    /// Returns the first [`EmailError`] the input runs into, checked in
    /// declaration order.
    pub fn parse(raw: &str) -> Result<Self, EmailError> {
        let candidate = raw.trim();
        if candidate.is_empty() {
            return Err(EmailError::Empty);
        }
        if candidate.len() > LENGTH_LIMIT {
            return Err(EmailError::TooLong {
                limit: LENGTH_LIMIT,
            });
        }
        if candidate.contains(char::is_whitespace) {
            return Err(EmailError::Whitespace);
        }

        match candidate.split_once('@') {
            Some((_, domain)) if domain.contains('@') => Err(EmailError::AtSign),
            None => Err(EmailError::AtSign),
            Some(("", _)) => Err(EmailError::NoLocalPart),
            Some((_, domain)) if !has_dotted_domain(domain) => Err(EmailError::Domain),
            Some(_) => Ok(Self(candidate.to_string())),
        }
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Email {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::str::FromStr for Email {
    type Err = EmailError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_accepts_deliverable_shapes() {
        for ok in ["a@b.co", "ann+shop@mail.example.org", "x.y@z.io"] {
            assert!(Email::parse(ok).is_ok(), "{ok}");
        }
    }

    #[test]
    fn test_refusals_in_order() {
        assert_eq!(Email::parse("\t"), Err(EmailError::Empty));
        assert_eq!(Email::parse("an n@b.co"), Err(EmailError::Whitespace));
        assert_eq!(Email::parse("ann.example.org"), Err(EmailError::AtSign));
        assert_eq!(Email::parse("a@b@c.org"), Err(EmailError::AtSign));
        assert_eq!(Email::parse("@example.org"), Err(EmailError::NoLocalPart));
        assert_eq!(Email::parse("ann@"), Err(EmailError::Domain));
        assert_eq!(Email::parse("ann@.org"), Err(EmailError::Domain));
        assert_eq!(Email::parse("ann@example."), Err(EmailError::Domain));
    }

    #[test]
    fn test_length_limit() {
        let long = format!("{}@example.org", "n".repeat(LENGTH_LIMIT));
        assert_eq!(
            Email::parse(&long),
            Err(EmailError::TooLong {
                limit: LENGTH_LIMIT
            })
        );
    }

    #[test]
    fn test_serializes_as_plain_string() {
        let email: Email = "ann@example.org".parse().unwrap();
        assert_eq!(serde_json::to_value(&email).unwrap(), "ann@example.org");
    }
}
