/// Validates return_to URL to prevent open redirects.
///
/// Returns `Some(url)` if the URL is a valid relative path, `None` otherwise.
///
/// # Security
///
/// This function prevents open redirect attacks by ensuring URLs:
/// - Start with a single `/` (relative path)
/// - Do not start with `//` (protocol-relative URLs like `//evil.com`)
/// - Do not contain control characters (potential injection)
/// - Do not contain `://` (absolute URLs with schemes like `https://`, `javascript:`)
pub fn validate_return_to(url: &str) -> Option<&str> {
    // Must start with /
    if !url.starts_with('/') {
        return None;
    }

    // Reject protocol-relative URLs (//evil.com)
    if url.starts_with("//") {
        return None;
    }

    // Reject control characters (potential injection attacks)
    if url.chars().any(|c| c.is_control()) {
        return None;
    }

    // Reject URLs with schemes (https://, javascript:, etc.)
    if url.contains("://") {
        return None;
    }

    Some(url)
}

/// Shape check for an email used as the sign-in name.
///
/// The pool enforces the real policy; this only catches obvious typos
/// before a round trip.
pub fn validate_email(email: &str) -> bool {
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    !local.is_empty() && domain.contains('.') && !domain.starts_with('.') && !domain.ends_with('.')
}

/// Shape check for a delivered confirmation code: six ASCII digits.
pub fn validate_confirmation_code(code: &str) -> bool {
    code.len() == 6 && code.chars().all(|c| c.is_ascii_digit())
}
