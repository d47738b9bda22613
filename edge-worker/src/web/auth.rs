//! Credential comparison for the webhook secret and the admin login.

/// Constant-time byte comparison to prevent timing attacks.
pub fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }

    let mut result = 0u8;
    for (x, y) in a.iter().zip(b.iter()) {
        result |= x ^ y;
    }
    result == 0
}

/// Check if a secret is configured at all.
pub fn is_secret_configured(secret: &Option<String>) -> bool {
    secret.as_ref().map(|s| !s.is_empty()).unwrap_or(false)
}

/// Compare a provided user/password pair against the configured one.
///
/// Both halves are always compared so the timing does not reveal which
/// one was wrong.
pub fn credentials_match(
    expected_user: &str,
    expected_pass: &str,
    user: Option<&str>,
    pass: Option<&str>,
) -> bool {
    match (user, pass) {
        (Some(user), Some(pass)) => {
            let user_ok = constant_time_eq(expected_user.as_bytes(), user.as_bytes());
            let pass_ok = constant_time_eq(expected_pass.as_bytes(), pass.as_bytes());
            user_ok & pass_ok
        }
        _ => false,
    }
}
