//! Validation helpers for DTOs.

use validator::ValidationError;

/// Longest accepted display name, in characters.
pub const USERNAME_MAX_CHARS: usize = 20;

/// Validates that a user id is a `0x`-prefixed 20-byte hexadecimal wallet address.
///
/// Mixed case is accepted so checksummed addresses pass.
///
/// # Examples
///
/// ```ignore
/// validate_wallet_address("0x04823b9e53F6e921BcBf49737ed94aec3f2778ef") // Ok
/// validate_wallet_address("04823b9e53F6e921BcBf49737ed94aec3f2778ef")   // Err - no prefix
/// validate_wallet_address("0x1234")                                     // Err - too short
/// ```
pub fn validate_wallet_address(address: &str) -> Result<(), ValidationError> {
    let Some(digits) = address.strip_prefix("0x") else {
        let mut err = ValidationError::new("wallet_address_prefix");
        err.message = Some("Wallet address must start with 0x".into());
        return Err(err);
    };

    if digits.len() != 40 {
        let mut err = ValidationError::new("wallet_address_length");
        err.message = Some(
            format!(
                "Wallet address must have exactly 40 hex digits (got {})",
                digits.len()
            )
            .into(),
        );
        return Err(err);
    }

    if !digits.chars().all(|c| c.is_ascii_hexdigit()) {
        let mut err = ValidationError::new("wallet_address_format");
        err.message = Some("Wallet address must contain only hexadecimal characters".into());
        return Err(err);
    }

    Ok(())
}

/// Validates that a display name has between 1 and 20 characters once trimmed.
pub fn validate_username(username: &str) -> Result<(), ValidationError> {
    let length = username.trim().chars().count();
    if length == 0 || length > USERNAME_MAX_CHARS {
        let mut err = ValidationError::new("username_length");
        err.message = Some(
            format!("Username must be 1 to {USERNAME_MAX_CHARS} characters (got {length})").into(),
        );
        return Err(err);
    }
    Ok(())
}
