//! Input Sanitization
//!
//! Normalizers shared by the validator and the form input masks. All of them
//! are idempotent: applying one twice gives the same result as applying it once.

/// Maximum stored length of a registrant name, in characters
pub const MAX_NAME_CHARS: usize = 100;

/// Maximum stored length of an email address, in characters
pub const MAX_EMAIL_CHARS: usize = 255;

/// Maximum stored length of the allergy note, in characters
pub const MAX_ALLERGY_CHARS: usize = 200;

/// Escape the five HTML-significant characters `<>"'&`.
pub fn escape_html(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#x27;"),
            '&' => out.push_str("&amp;"),
            other => out.push(other),
        }
    }
    out
}

/// Trim, cut to `max_chars` characters, then HTML-escape.
///
/// The cut happens before escaping, so the escaped result may be longer
/// than `max_chars` bytes.
pub fn sanitize_text(value: &str, max_chars: usize) -> String {
    let cut: String = value.trim().chars().take(max_chars).collect();
    escape_html(&cut)
}

/// Keep ASCII digits only.
pub fn digits_only(value: &str) -> String {
    value.chars().filter(char::is_ascii_digit).collect()
}

/// Keep letters (accented ones included) and whitespace, trimmed and capped
/// at [`MAX_NAME_CHARS`].
pub fn sanitize_name(value: &str) -> String {
    let letters: String = value
        .chars()
        .filter(|c| c.is_alphabetic() || c.is_whitespace())
        .collect();
    let capped: String = letters.trim().chars().take(MAX_NAME_CHARS).collect();
    capped.trim_end().to_string()
}

/// Drop every whitespace character and lower-case the rest.
pub fn normalize_email(value: &str) -> String {
    value
        .chars()
        .filter(|c| !c.is_whitespace())
        .flat_map(char::to_lowercase)
        .collect()
}
