//! Input checks callers run before invoking the session and conversation stores.

use thiserror::Error;

/// Shortest accepted phone number.
pub const PHONE_MIN_DIGITS: usize = 10;
/// Longest accepted phone number.
pub const PHONE_MAX_DIGITS: usize = 15;
/// Exact OTP length.
pub const OTP_LEN: usize = 6;
/// Largest accepted image attachment.
pub const MAX_IMAGE_BYTES: u64 = 5 * 1024 * 1024;

/// First failed input rule.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    /// Phone number length out of range.
    #[error("phone number must be {min}-{max} digits, got {got}")]
    PhoneLength {
        /// Minimum length.
        min: usize,
        /// Maximum length.
        max: usize,
        /// Actual length.
        got: usize,
    },
    /// Phone number contains a non-digit.
    #[error("phone number can only contain digits")]
    PhoneNotDigits,
    /// Dial code missing or malformed.
    #[error("country code must look like +1 to +9999")]
    CountryCode,
    /// OTP is not exactly six characters.
    #[error("OTP must be exactly 6 digits")]
    OtpLength,
    /// OTP contains a non-digit.
    #[error("OTP can only contain digits")]
    OtpNotDigits,
    /// Attachment is not an image.
    #[error("attachment must be an image, got {0}")]
    NotAnImage(String),
    /// Attachment exceeds the size limit.
    #[error("image must be smaller than 5MB, got {0} bytes")]
    ImageTooLarge(u64),
}

fn all_digits(value: &str) -> bool {
    !value.is_empty() && value.chars().all(|ch| ch.is_ascii_digit())
}

/// Check a phone number: 10-15 ASCII digits.
///
/// # Errors
/// Returns the first rule the number breaks.
pub fn validate_phone(phone: &str) -> Result<(), ValidationError> {
    let got = phone.chars().count();
    if !(PHONE_MIN_DIGITS..=PHONE_MAX_DIGITS).contains(&got) {
        return Err(ValidationError::PhoneLength {
            min: PHONE_MIN_DIGITS,
            max: PHONE_MAX_DIGITS,
            got,
        });
    }
    if !all_digits(phone) {
        return Err(ValidationError::PhoneNotDigits);
    }
    Ok(())
}

/// Check a dial code: `+` followed by 1-4 digits.
///
/// # Errors
/// Returns `ValidationError::CountryCode` when malformed.
pub fn validate_country_code(code: &str) -> Result<(), ValidationError> {
    match code.strip_prefix('+') {
        Some(digits) if digits.len() <= 4 && all_digits(digits) => Ok(()),
        _ => Err(ValidationError::CountryCode),
    }
}

/// Check an OTP: exactly six ASCII digits.
///
/// # Errors
/// Returns the first rule the code breaks.
pub fn validate_otp(code: &str) -> Result<(), ValidationError> {
    if code.chars().count() != OTP_LEN {
        return Err(ValidationError::OtpLength);
    }
    if !all_digits(code) {
        return Err(ValidationError::OtpNotDigits);
    }
    Ok(())
}

/// Check an image attachment by MIME type and size.
///
/// # Errors
/// Returns the first rule the attachment breaks.
pub fn validate_image(mime_type: &str, size_bytes: u64) -> Result<(), ValidationError> {
    if !mime_type.starts_with("image/") {
        return Err(ValidationError::NotAnImage(mime_type.to_string()));
    }
    if size_bytes > MAX_IMAGE_BYTES {
        return Err(ValidationError::ImageTooLarge(size_bytes));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_phone_rules() {
        assert!(validate_phone("5551234567").is_ok());
        assert!(validate_phone("123456789012345").is_ok());
        assert_eq!(
            validate_phone("555123"),
            Err(ValidationError::PhoneLength {
                min: 10,
                max: 15,
                got: 6
            })
        );
        assert_eq!(
            validate_phone("555-123-4567"),
            Err(ValidationError::PhoneNotDigits)
        );
    }

    #[test]
    fn test_country_code_rules() {
        assert!(validate_country_code("+1").is_ok());
        assert!(validate_country_code("+1264").is_ok());
        assert!(validate_country_code("1").is_err());
        assert!(validate_country_code("+").is_err());
        assert!(validate_country_code("+12345").is_err());
        assert!(validate_country_code("+4a").is_err());
    }

    #[test]
    fn test_otp_rules() {
        assert!(validate_otp("123456").is_ok());
        assert_eq!(validate_otp("12345"), Err(ValidationError::OtpLength));
        assert_eq!(validate_otp("12a456"), Err(ValidationError::OtpNotDigits));
        assert_eq!(validate_otp("１２３４５６"), Err(ValidationError::OtpNotDigits));
    }

    #[test]
    fn test_image_rules() {
        assert!(validate_image("image/png", 1024).is_ok());
        assert!(matches!(
            validate_image("application/pdf", 10),
            Err(ValidationError::NotAnImage(_))
        ));
        assert_eq!(
            validate_image("image/jpeg", MAX_IMAGE_BYTES + 1),
            Err(ValidationError::ImageTooLarge(MAX_IMAGE_BYTES + 1))
        );
    }
}
