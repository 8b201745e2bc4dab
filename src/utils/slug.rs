//! URL slugification.
//!
//! Converts path components to URL-safe form: transliterated to ASCII,
//! lowercased, with runs of anything else collapsed to a single dash.

use deunicode::deunicode;

/// Slugify one path component.
pub fn slugify(component: &str) -> String {
    let ascii = deunicode(component);
    let mut out = String::with_capacity(ascii.len());
    let mut pending_dash = false;

    for c in ascii.chars() {
        if c.is_ascii_alphanumeric() {
            if pending_dash && !out.is_empty() {
                out.push('-');
            }
            out.push(c.to_ascii_lowercase());
            pending_dash = false;
        } else {
            pending_dash = true;
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slugify_lowercases() {
        assert_eq!(slugify("Guide"), "guide");
    }

    #[test]
    fn test_slugify_replaces_spaces_and_punctuation() {
        assert_eq!(slugify("My First Guide!"), "my-first-guide");
        assert_eq!(slugify("a  &  b"), "a-b");
    }

    #[test]
    fn test_slugify_transliterates() {
        assert_eq!(slugify("café"), "cafe");
        assert_eq!(slugify("Übersicht"), "ubersicht");
    }

    #[test]
    fn test_slugify_trims_edges() {
        assert_eq!(slugify("--guide--"), "guide");
        assert_eq!(slugify("   "), "");
    }

    #[test]
    fn test_slugify_keeps_digits() {
        assert_eq!(slugify("v2.1 release"), "v2-1-release");
    }
}
