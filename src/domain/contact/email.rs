//! Email address value object and extraction from free text.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::domain::foundation::ValidationError;

static EMAIL_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}").expect("email pattern is valid")
});

/// An email address as it appears in user input.
///
/// Comparison is exact; no case folding or normalization is applied.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct EmailAddress(String);

impl EmailAddress {
    /// Creates an email address, requiring the whole string to match the pattern.
    pub fn new(value: impl Into<String>) -> Result<Self, ValidationError> {
        let value = value.into();
        if value.is_empty() {
            return Err(ValidationError::empty_field("email"));
        }
        match EMAIL_PATTERN.find(&value) {
            Some(m) if m.start() == 0 && m.end() == value.len() => Ok(Self(value)),
            _ => Err(ValidationError::invalid_format(
                "email",
                "not a valid email address",
            )),
        }
    }

    /// Returns the address as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EmailAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<String> for EmailAddress {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<EmailAddress> for String {
    fn from(email: EmailAddress) -> Self {
        email.0
    }
}

/// Returns the first email-shaped substring of `text`, if any.
pub fn extract_email(text: &str) -> Option<EmailAddress> {
    if !text.contains('@') {
        return None;
    }
    EMAIL_PATTERN
        .find(text)
        .map(|m| EmailAddress(m.as_str().to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn extracts_email_from_sentence() {
        let email = extract_email("Hi, I'm Pat, email pat@example.com").unwrap();
        assert_eq!(email.as_str(), "pat@example.com");
    }

    #[test]
    fn first_match_wins() {
        let email = extract_email("a@one.org or b@two.org").unwrap();
        assert_eq!(email.as_str(), "a@one.org");
    }

    #[test]
    fn accepts_mixed_case_and_subdomains() {
        let email = extract_email("write to Jane.Doe+news@Mail.Example.CO.uk!").unwrap();
        assert_eq!(email.as_str(), "Jane.Doe+news@Mail.Example.CO.uk");
    }

    #[test]
    fn rejects_single_letter_tld() {
        assert!(extract_email("me@host.c").is_none());
    }

    #[test]
    fn no_at_sign_means_no_email() {
        assert!(extract_email("no address here").is_none());
        assert!(extract_email("").is_none());
    }

    #[test]
    fn bare_at_sign_is_not_an_email() {
        assert!(extract_email("meet @ noon").is_none());
    }

    #[test]
    fn new_requires_full_match() {
        assert!(EmailAddress::new("pat@example.com").is_ok());
        assert!(EmailAddress::new(" pat@example.com").is_err());
        assert!(EmailAddress::new("pat@example").is_err());
        assert_eq!(
            EmailAddress::new("").unwrap_err(),
            ValidationError::empty_field("email")
        );
    }

    #[test]
    fn serde_validates_on_deserialize() {
        let ok: Result<EmailAddress, _> = serde_json::from_str("\"a@b.io\"");
        assert!(ok.is_ok());
        let bad: Result<EmailAddress, _> = serde_json::from_str("\"nope\"");
        assert!(bad.is_err());
    }

    proptest! {
        #[test]
        fn finds_embedded_email(
            prefix in "[a-zA-Z ,!?]{0,20}",
            local in "[a-zA-Z0-9._%+-]{1,12}",
            domain in "[a-z0-9]{1,10}",
            tld in "[a-zA-Z]{2,6}",
            suffix in "[a-zA-Z ,!?]{0,20}",
        ) {
            let email = format!("{}@{}.{}", local, domain, tld);
            let text = format!("{} {} {}", prefix, email, suffix);
            let found = extract_email(&text).unwrap();
            prop_assert_eq!(found.as_str(), email.as_str());
        }

        #[test]
        fn text_without_at_sign_has_no_email(text in "[^@]*") {
            prop_assert!(extract_email(&text).is_none());
        }
    }
}
