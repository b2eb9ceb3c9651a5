//! WinAnsi-safe text sanitization for PDF rendering.
//!
//! The builtin Helvetica fonts only cover an 8-bit Western encoding, so any
//! free-text field (doctor review, findings, model version) has to be
//! stripped of emoji, pictographs, combining marks and other symbol blocks
//! before it reaches the page. A single classification pass over code points
//! replaces the pile of overlapping regex ranges the original frontend used.

/// Substituted when sanitization empties a field, so every labeled line
/// still has visible content.
pub const UNSUPPORTED_PLACEHOLDER: &str = "[Content contains unsupported characters]";

/// Default truncation limit for free-text fields.
pub const DEFAULT_MAX_LENGTH: usize = 500;

const ELLIPSIS: &str = "...";

enum CharClass {
    /// Representable in WinAnsi; copied through.
    Keep,
    /// Collapses with adjacent whitespace into a single space.
    Space,
    /// Stripped silently, no replacement character.
    Strip,
}

/// Symbols outside Latin-1 that WinAnsi still encodes and that show up in
/// clinical free text: euro, trademark, per-mille. Degree, plus-minus,
/// multiplication and division signs are already in the Latin-1 range.
const SYMBOL_ALLOW_LIST: &[char] = &['\u{20AC}', '\u{2122}', '\u{2030}'];

fn classify(c: char) -> CharClass {
    if c == ' ' || c.is_whitespace() {
        return CharClass::Space;
    }
    match c {
        '\u{0021}'..='\u{007E}' => CharClass::Keep,
        // Latin-1 Supplement, minus the unprintable C1 range. U+00A0 is
        // NBSP and already classified as whitespace above.
        '\u{00A1}'..='\u{00FF}' => CharClass::Keep,
        c if SYMBOL_ALLOW_LIST.contains(&c) => CharClass::Keep,
        _ => CharClass::Strip,
    }
}

/// Strips unrenderable characters, collapses whitespace and truncates to
/// `max_length` characters (plus a `...` marker when truncation happened).
///
/// The result is never empty: if nothing printable survives, the fixed
/// [`UNSUPPORTED_PLACEHOLDER`] is substituted before truncation. Output
/// length is therefore at most `max_length + 3` characters.
pub fn sanitize(text: &str, max_length: usize) -> String {
    let mut out = String::with_capacity(text.len().min(max_length + ELLIPSIS.len()));
    let mut pending_space = false;

    for c in text.chars() {
        match classify(c) {
            CharClass::Keep => {
                if pending_space && !out.is_empty() {
                    out.push(' ');
                }
                pending_space = false;
                out.push(c);
            }
            CharClass::Space => pending_space = true,
            CharClass::Strip => {}
        }
    }

    if out.is_empty() {
        out = UNSUPPORTED_PLACEHOLDER.to_string();
    }

    truncate_chars(out, max_length)
}

/// [`sanitize`] with the default field length limit.
pub fn sanitize_default(text: &str) -> String {
    sanitize(text, DEFAULT_MAX_LENGTH)
}

fn truncate_chars(text: String, max_length: usize) -> String {
    match text.char_indices().nth(max_length) {
        Some((byte_index, _)) => {
            let mut truncated = text;
            truncated.truncate(byte_index);
            truncated.push_str(ELLIPSIS);
            truncated
        }
        None => text,
    }
}
