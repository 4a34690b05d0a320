//! Shape checks for contact data shared by checkout and notification settings.

/// `+?[0-9]{10,15}` after trimming.
pub fn is_phone(value: &str) -> bool {
    let digits = value.trim();
    let digits = digits.strip_prefix('+').unwrap_or(digits);
    (10..=15).contains(&digits.len()) && digits.bytes().all(|b| b.is_ascii_digit())
}

/// Loose `local@domain.tld` check: one `@`, no whitespace, a dot inside the
/// domain that is neither leading nor trailing.
pub fn is_email(value: &str) -> bool {
    let Some((local, domain)) = value.split_once('@') else {
        return false;
    };
    if local.is_empty() || domain.contains('@') || value.chars().any(char::is_whitespace) {
        return false;
    }
    match domain.rsplit_once('.') {
        Some((host, tld)) => !host.is_empty() && !tld.is_empty() && !host.starts_with('.'),
        None => false,
    }
}

/// Absolute `http://` or `https://` URL with a non-empty host.
pub fn is_http_url(value: &str) -> bool {
    let rest = value
        .strip_prefix("https://")
        .or_else(|| value.strip_prefix("http://"));
    match rest {
        Some(rest) => {
            let host = rest.split(['/', '?', '#']).next().unwrap_or_default();
            !host.is_empty() && !value.chars().any(char::is_whitespace)
        }
        None => false,
    }
}
