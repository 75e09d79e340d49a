//! Checks applied to user input before anything is sent to the backend.

use once_cell::sync::Lazy;
use regex::Regex;

static EMAIL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\S+@\S+\.\S+").expect("the email pattern is valid")
});

/// Does this look vaguely like an email address?
pub fn is_email(candidate: &str) -> bool { EMAIL.is_match(candidate) }

/// Trim and lower-case an email address the same way the backend does.
pub fn normalise_email(email: &str) -> String { email.trim().to_lowercase() }

pub const MIN_LOGIN_PASSWORD_LEN: usize = 3;
pub const MIN_REGISTRATION_PASSWORD_LEN: usize = 6;
pub const OTP_LEN: usize = 6;

/// Login details which passed validation.
#[derive(Clone, PartialEq)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .finish()
    }
}

pub fn validate_login(
    email: &str,
    password: &str,
) -> Result<Credentials, ValidationError> {
    let email = normalise_email(email);

    if email.is_empty() || password.is_empty() {
        return Err(ValidationError::MissingFields);
    }
    if !is_email(&email) {
        return Err(ValidationError::InvalidEmail);
    }
    if password.chars().count() < MIN_LOGIN_PASSWORD_LEN {
        return Err(ValidationError::PasswordTooShort {
            min: MIN_LOGIN_PASSWORD_LEN,
        });
    }

    Ok(Credentials {
        email,
        password: password.to_string(),
    })
}

/// A new account, ready to be registered.
#[derive(Clone, PartialEq, serde_derive::Serialize)]
pub struct Registration {
    pub name: String,
    pub email: String,
    pub password: String,
}

impl std::fmt::Debug for Registration {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Registration")
            .field("name", &self.name)
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .finish()
    }
}

pub fn validate_registration(
    name: &str,
    email: &str,
    password: &str,
) -> Result<Registration, ValidationError> {
    let name = name.trim();
    let email = normalise_email(email);
    let password = password.trim();

    if name.is_empty() || email.is_empty() || password.is_empty() {
        return Err(ValidationError::MissingFields);
    }
    if !is_email(&email) {
        return Err(ValidationError::InvalidEmail);
    }
    if password.chars().count() < MIN_REGISTRATION_PASSWORD_LEN {
        return Err(ValidationError::PasswordTooShort {
            min: MIN_REGISTRATION_PASSWORD_LEN,
        });
    }

    let has_lower = password.chars().any(|c| c.is_ascii_lowercase());
    let has_upper = password.chars().any(|c| c.is_ascii_uppercase());
    let has_digit = password.chars().any(|c| c.is_ascii_digit());
    if !(has_lower && has_upper && has_digit) {
        return Err(ValidationError::WeakPassword);
    }

    Ok(Registration {
        name: name.to_string(),
        email,
        password: password.to_string(),
    })
}

pub fn validate_otp(otp: &str) -> Result<(), ValidationError> {
    if otp.chars().count() == OTP_LEN {
        Ok(())
    } else {
        Err(ValidationError::InvalidOtp)
    }
}

/// Why some user input was rejected. The messages are suitable for showing
/// to the user as-is.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ValidationError {
    #[error("Please fill in all fields")]
    MissingFields,
    #[error("Please enter {0}")]
    MissingField(&'static str),
    #[error("Please enter a valid email address")]
    InvalidEmail,
    #[error("Password must be at least {} characters long", min)]
    PasswordTooShort { min: usize },
    #[error("Password must contain at least one uppercase letter, one lowercase letter, and one number")]
    WeakPassword,
    #[error("Please enter a valid 6-digit verification code")]
    InvalidOtp,
    #[error("Please enter a valid phone number")]
    InvalidPhoneNumber,
    #[error("Please enter a valid 6-digit pincode")]
    InvalidPincode,
}
