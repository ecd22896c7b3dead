// SPDX-FileCopyrightText: 2026 ircnostr Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Chat text cleanup before publishing.

use std::sync::LazyLock;

use regex::Regex;

/// Longest post body, in characters, before hashtags are appended.
pub const MAX_POST_CHARS: usize = 280;

/// mIRC colour (`\x03fg[,bg]`) and hex colour (`\x04RRGGBB[,RRGGBB]`) sequences.
/// Other formatting bytes (bold, italic, reset) are plain control characters.
static COLOUR_CODES: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\x03(\d{1,2}(,\d{1,2})?)?|\x04([0-9A-Fa-f]{6}(,[0-9A-Fa-f]{6})?)?")
        .expect("colour code pattern is valid")
});

/// Strips formatting and control characters, trims, and caps the length.
///
/// The result never has leading or trailing whitespace and never exceeds
/// [`MAX_POST_CHARS`] characters; applying it twice changes nothing.
pub fn sanitize(text: &str) -> String {
    let uncoloured = COLOUR_CODES.replace_all(text, "");
    let visible: String = uncoloured.chars().filter(|c| !c.is_control()).collect();
    let capped: String = visible.trim().chars().take(MAX_POST_CHARS).collect();
    capped.trim_end().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn strips_colour_codes_with_and_without_background() {
        assert_eq!(sanitize("\x0304red\x03 plain"), "red plain");
        assert_eq!(sanitize("\x0312,01blue on black\x03"), "blue on black");
        assert_eq!(sanitize("\x03bare"), "bare");
    }

    #[test]
    fn strips_hex_colours_and_formatting_bytes() {
        assert_eq!(sanitize("\x04FF0000hot\x04"), "hot");
        assert_eq!(sanitize("\x02bold\x02 \x1ditalic\x1d\x0f"), "bold italic");
    }

    #[test]
    fn removes_control_characters_and_trims() {
        assert_eq!(sanitize("  \x01ACTION waves\x01\r\n "), "ACTION waves");
        assert_eq!(sanitize("\t\t"), "");
    }

    #[test]
    fn truncates_to_limit_and_trims_tail() {
        let long = "a".repeat(279) + " " + &"b".repeat(50);
        let out = sanitize(&long);
        assert_eq!(out.chars().count(), 279);
        assert!(out.chars().all(|c| c == 'a'));

        let exact = "x".repeat(400);
        assert_eq!(sanitize(&exact).chars().count(), MAX_POST_CHARS);
    }

    #[test]
    fn counts_characters_not_bytes() {
        let emoji = "⚡".repeat(300);
        assert_eq!(sanitize(&emoji).chars().count(), MAX_POST_CHARS);
    }

    #[test]
    fn colour_only_text_sanitizes_to_empty() {
        assert_eq!(sanitize("\x0304,05\x03\x02"), "");
    }

    proptest! {
        #[test]
        fn sanitize_is_idempotent(input in "(\\PC|[\\x00-\\x1f]|\\x03[0-9]{0,2}(,[0-9]{0,2})?|\\s){0,400}") {
            let once = sanitize(&input);
            prop_assert_eq!(sanitize(&once), once.clone());
        }

        #[test]
        fn sanitized_output_is_bounded_and_clean(input in any::<String>()) {
            let out = sanitize(&input);
            prop_assert!(out.chars().count() <= MAX_POST_CHARS);
            prop_assert!(!out.chars().any(char::is_control));
            prop_assert_eq!(out.trim(), out.as_str());
        }
    }
}
