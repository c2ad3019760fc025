use subtle::ConstantTimeEq;

/// Constant-time string comparison to prevent timing attacks
pub fn constant_time_compare(a: &str, b: &str) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.as_bytes().ct_eq(b.as_bytes()).into()
}

/// Check an `Authorization` header value against the configured API key.
///
/// With no key configured every request is allowed.
pub fn is_authorized(expected_key: Option<&str>, authorization: Option<&str>) -> bool {
    let Some(expected) = expected_key else {
        return true;
    };

    authorization
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(|token| constant_time_compare(token.trim(), expected))
        .unwrap_or(false)
}
