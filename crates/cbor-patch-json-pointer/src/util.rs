use crate::PointerError;

/// Unescapes a JSON Pointer reference token (`~1` → `/`, then `~0` → `~`).
pub fn unescape_token(token: &str) -> String {
    if !token.contains('~') {
        return token.to_string();
    }
    token.replace("~1", "/").replace("~0", "~")
}

/// Escapes a string for use as a JSON Pointer reference token.
pub fn escape_token(token: &str) -> String {
    if !token.contains('/') && !token.contains('~') {
        return token.to_string();
    }
    token.replace('~', "~0").replace('/', "~1")
}

/// Splits a JSON Pointer into unescaped reference tokens.
///
/// The empty pointer yields no tokens. Anything else must start with `/`;
/// trailing empty segments are kept as empty tokens.
pub fn parse_pointer(pointer: &str) -> Result<Vec<String>, PointerError> {
    if pointer.is_empty() {
        return Ok(Vec::new());
    }
    if !pointer.starts_with('/') {
        return Err(PointerError::MissingLeadingSlash(pointer.to_string()));
    }
    Ok(pointer[1..].split('/').map(unescape_token).collect())
}

/// Assembles unescaped tokens back into a JSON Pointer.
pub fn format_pointer<S: AsRef<str>>(tokens: &[S]) -> String {
    let mut out = String::new();
    for token in tokens {
        out.push('/');
        out.push_str(&escape_token(token.as_ref()));
    }
    out
}

/// Returns true if the token is the array-append sentinel `-`.
pub fn is_append_token(token: &str) -> bool {
    token == "-"
}

/// Returns true if the token matches `-?[0-9]+`.
pub fn is_integer_token(token: &str) -> bool {
    let digits = token.strip_prefix('-').unwrap_or(token);
    !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit())
}
