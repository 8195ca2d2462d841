//! Text clean-up for speech synthesis and media file naming.

use std::sync::OnceLock;

use regex::{Captures, Regex};
use sha2::{Digest, Sha256};

fn directive_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\[.*?\]").unwrap())
}

fn break_tag_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)<\s*/?\s*(br|p|div|li|tr|td|h[1-6])\b[^>]*>").unwrap())
}

fn tag_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?s)<!--.*?-->|<[^>]*>").unwrap())
}

fn entity_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"&(#[xX][0-9a-fA-F]+|#[0-9]+|[a-zA-Z]+);").unwrap())
}

fn whitespace_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\s+").unwrap())
}

/// Remove every `[...]` span (shortest match, within one line), e.g.
/// `[sound:x.mp3]` or `[latex]`.
pub fn strip_directives(text: &str) -> String {
    directive_re().replace_all(text, "").into_owned()
}

/// Reduce HTML to its text content.
///
/// Line and block level tags turn into a space, other tags disappear, and
/// character entities are decoded.
pub fn strip_markup(html: &str) -> String {
    let text = break_tag_re().replace_all(html, " ");
    let text = tag_re().replace_all(&text, "");
    entity_re()
        .replace_all(&text, |caps: &Captures| decode_entity(&caps[1]).unwrap_or_else(|| caps[0].to_string()))
        .into_owned()
}

fn decode_entity(entity: &str) -> Option<String> {
    let ch = match entity {
        "amp" => '&',
        "lt" => '<',
        "gt" => '>',
        "quot" => '"',
        "apos" => '\'',
        "nbsp" => ' ',
        _ => {
            let code = if let Some(hex) = entity.strip_prefix("#x").or_else(|| entity.strip_prefix("#X")) {
                u32::from_str_radix(hex, 16).ok()?
            } else if let Some(dec) = entity.strip_prefix('#') {
                dec.parse::<u32>().ok()?
            } else {
                return None;
            };
            char::from_u32(code)?
        }
    };
    Some(ch.to_string())
}

/// Prepare field text to be read aloud.
///
/// Drops `[...]` directives and markup, keeps letters, digits and `. , ! ?`,
/// turns everything else into single spaces. Applying it twice gives the
/// same result as applying it once.
pub fn sanitize_for_speech(raw: &str) -> String {
    let text = strip_markup(&strip_directives(raw));

    let classified: String = text
        .chars()
        .map(|c| match c {
            c if c.is_alphanumeric() => c,
            '.' | ',' | '!' | '?' => c,
            _ => ' ',
        })
        .collect();

    whitespace_re()
        .replace_all(&classified, " ")
        .trim()
        .to_string()
}

/// Hex digits of the text digest appended to slugs that lost information.
const DIGEST_LEN: usize = 8;

/// File name safe form of `text`, made of `[A-Za-z0-9_]` only.
///
/// ASCII letters and digits are kept, every other character becomes `_`, and
/// leading/trailing `_` are trimmed. Letters and digits outside ASCII cannot
/// be kept as they are, so when the text has any (or nothing is left) a short
/// digest of the whole text is appended. `día` and `dúa` get different names
/// and `Привет` still gets one.
pub fn slug(text: &str) -> String {
    let replaced: String = text
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect();
    let base = replaced.trim_matches('_');

    let lossy = text.chars().any(|c| c.is_alphanumeric() && !c.is_ascii());
    if !lossy && !base.is_empty() {
        return base.to_string();
    }

    let digest = format!("{:x}", Sha256::digest(text.as_bytes()));
    let digest = &digest[..DIGEST_LEN];
    if base.is_empty() {
        digest.to_string()
    } else {
        format!("{base}_{digest}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn strips_sound_directives() {
        assert_eq!(strip_directives("Hola [sound:x.mp3]"), "Hola ");
        assert_eq!(strip_directives("[a] b [c] d"), " b  d");
        assert_eq!(strip_directives("no directives"), "no directives");
    }

    #[test]
    fn directives_are_matched_shortest_first() {
        assert_eq!(strip_directives("[x] keep [y]"), " keep ");
    }

    #[test]
    fn markup_keeps_rendered_text() {
        assert_eq!(strip_markup("<b>Hola</b> mundo"), "Hola mundo");
        assert_eq!(strip_markup("uno<br>dos<div>tres</div>"), "uno dos tres ");
        assert_eq!(strip_markup("fish &amp; chips&nbsp;&#33;"), "fish & chips !");
        assert_eq!(strip_markup("&bogus; stays"), "&bogus; stays");
    }

    #[test]
    fn sanitize_keeps_letters_digits_and_pauses() {
        assert_eq!(
            sanitize_for_speech("¿Qué tal? <i>Bien</i>, gracias!! [sound:a.mp3]"),
            "Qué tal? Bien, gracias!!"
        );
        assert_eq!(sanitize_for_speech("a - b / c"), "a b c");
        assert_eq!(sanitize_for_speech("Hola"), "Hola");
    }

    #[test]
    fn sanitize_output_alphabet() {
        let out = sanitize_for_speech("x\t\ty;  z:\"q\" &lt;tag&gt; 2+2=4 日本語。");
        assert!(out
            .chars()
            .all(|c| c.is_alphanumeric() || matches!(c, '.' | ',' | '!' | '?' | ' ')));
        assert!(!out.contains("  "));
        assert_eq!(out, "x y z q tag 2 2 4 日本語");
    }

    #[test]
    fn sanitize_is_idempotent() {
        for input in [
            "Hola [sound:x.mp3]",
            "<p>Hello,&nbsp;world!</p>",
            "  lots   of\n\nspace  ",
            "¿¡mixed!? 1.5 [x]<br/>y",
            "",
        ] {
            let once = sanitize_for_speech(input);
            assert_eq!(sanitize_for_speech(&once), once, "input: {input:?}");
        }
    }

    #[test]
    fn directives_stop_at_line_end() {
        assert_eq!(strip_directives("a [b\nc] d"), "a [b\nc] d");
        assert_eq!(strip_directives("[x]\n[open\nkeep]"), "\n[open\nkeep]");
    }

    #[test]
    fn slug_replaces_and_trims() {
        assert_eq!(slug("Hola"), "Hola");
        assert_eq!(slug("  a b  "), "a_b");
        assert_eq!(slug("palabra 3"), "palabra_3");
        assert_eq!(slug("uno &amp; dos"), "uno__amp__dos");
    }

    #[test]
    fn slug_keeps_non_ascii_text_apart() {
        assert_eq!(slug("¿Qué tal?"), "Qu__tal_e730a1d8");
        assert_eq!(slug("día"), "d_a_bfbf4474");
        assert_eq!(slug("dúa"), "d_a_af5c4e20");
        assert_ne!(slug("día"), slug("dúa"));
    }

    #[test]
    fn slug_is_never_empty_for_text() {
        assert_eq!(slug("Привет"), "dd679c0b");
        assert_eq!(slug("!!!"), "e84c538e");
        assert!(!slug("日本語").is_empty());
    }

    #[test]
    fn slug_alphabet() {
        for text in ["_Straße 12, día_", "Привет мир", "¿?", "a-b", "ÅÄÖ 123"] {
            let s = slug(text);
            assert!(s.chars().all(|c| c.is_ascii_alphanumeric() || c == '_'), "{s}");
            assert!(!s.starts_with('_') && !s.ends_with('_'), "{s}");
            assert_eq!(s, slug(text));
        }
    }
}
