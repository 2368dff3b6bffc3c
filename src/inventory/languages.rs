//! Language codes as found in stream tags and subtitle file names.

/// ISO 639-1 codes and the ISO 639-2/B codes they are folded into
pub const LANGUAGE_MAPPING: &[(&str, &str)] = &[
    ("en", "eng"), ("no", "nor"), ("da", "dan"), ("sv", "swe"), ("fi", "fin"),
    ("fr", "fre"), ("de", "ger"), ("es", "spa"), ("pt", "por"), ("nl", "dut"),
    ("pl", "pol"), ("cs", "cze"), ("el", "gre"), ("tr", "tur"), ("ko", "kor"),
    ("it", "ita"), ("ru", "rus"), ("ar", "ara"), ("ja", "jpn"), ("zh", "chi"),
    ("he", "heb"), ("hu", "hun"), ("ro", "rum"), ("sk", "slo"), ("sl", "slv"),
    ("uk", "ukr"), ("id", "ind"), ("th", "tha"), ("vi", "vie"), ("bg", "bul"),
    ("is", "ice"), ("hr", "hrv"), ("lt", "lit"), ("lv", "lav"), ("et", "est"),
    ("hi", "hin"), ("ca", "cat"), ("gl", "glg"), ("eu", "baq"), ("sr", "srp"),
    ("fa", "per"), ("mk", "mac"), ("te", "tel"), ("ta", "tam"), ("ml", "mal"),
    ("kn", "kan"), ("bn", "ben"),
];

/// Languages every file is expected to carry
pub const HOME_LANGUAGES: &[&str] = &["eng", "nor"];

pub const UNDETERMINED: &str = "und";

/// Lowercase, with two-letter codes mapped to their three-letter form
pub fn normalize_language(code: &str) -> String {
    let code = code.trim().to_lowercase();
    LANGUAGE_MAPPING
        .iter()
        .find(|(short, _)| *short == code)
        .map(|(_, long)| long.to_string())
        .unwrap_or(code)
}

/// Normalized languages in first-seen order, without repeats
pub fn dedup_languages<'a>(codes: impl IntoIterator<Item = &'a str>) -> Vec<String> {
    let mut seen = Vec::new();
    for code in codes {
        let code = normalize_language(code);
        if !seen.contains(&code) {
            seen.push(code);
        }
    }
    seen
}

/// Languages other than the home languages and `und`, sorted
pub fn foreign_languages(deduped: &[String]) -> Vec<String> {
    let mut foreign: Vec<String> = deduped
        .iter()
        .filter(|code| code.as_str() != UNDETERMINED && !HOME_LANGUAGES.contains(&code.as_str()))
        .cloned()
        .collect();
    foreign.sort();
    foreign
}

/// Language suffix of an external subtitle, e.g. `Movie.en.srt` -> `eng`
pub fn subtitle_file_language(file_name: &str) -> Option<String> {
    let (without_ext, _) = file_name.rsplit_once('.')?;
    let (_, code) = without_ext.rsplit_once('.')?;
    let valid = matches!(code.len(), 2 | 3) && code.chars().all(|c| c.is_ascii_alphabetic());
    valid.then(|| normalize_language(code))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_language() {
        assert_eq!(normalize_language("en"), "eng");
        assert_eq!(normalize_language(" NO "), "nor");
        assert_eq!(normalize_language("ger"), "ger");
        assert_eq!(normalize_language("xx"), "xx");
    }

    #[test]
    fn test_dedup_and_foreign() {
        let deduped = dedup_languages(["eng", "en", "fr", "und", "nor", "fre", "ja"]);
        assert_eq!(deduped, vec!["eng", "fre", "und", "nor", "jpn"]);
        assert_eq!(foreign_languages(&deduped), vec!["fre", "jpn"]);
    }

    #[test]
    fn test_subtitle_file_language() {
        assert_eq!(subtitle_file_language("Movie.en.srt").as_deref(), Some("eng"));
        assert_eq!(subtitle_file_language("Movie.nor.SRT").as_deref(), Some("nor"));
        assert_eq!(subtitle_file_language("Movie.en.forced.srt"), None);
        assert_eq!(subtitle_file_language("Movie.srt"), None);
        assert_eq!(subtitle_file_language("Movie.2020.srt"), None);
    }
}
