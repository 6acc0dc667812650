//! Output clip naming.
//!
//! Rendered clips are named `<base>-AS<n>-<token1>_<token2>_…`, where `n`
//! counts how many times effects were applied and the tokens record which
//! effects, oldest first. Only the most recent `cap` tokens are kept.
//!
//! Names without a version tag are cleaned before use: media extensions,
//! glue/render artifacts and a trailing `" - X"` label are stripped.

/// Marker preceding the version number.
const VERSION_MARKER: &str = "-AS";

/// Separator between tokens.
const TOKEN_SEPARATOR: char = '_';

const MEDIA_EXTENSIONS: &[&str] = &[
    ".wav", ".wave", ".aif", ".aiff", ".flac", ".mp3", ".ogg", ".opus", ".w64", ".rf64", ".caf",
    ".m4a",
];

const ARTIFACT_WORDS: &[&str] = &["glued", "rendered", "render"];

/// Parsed form of a clip display name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NamingState {
    pub base: String,
    pub version: u32,
    pub tokens: Vec<String>,
}

/// Applies effect tokens to clip names with a FIFO cap.
#[derive(Debug, Clone, Copy)]
pub struct OutputNamer {
    cap: usize,
}

impl NamingState {
    /// Parse a display name.
    pub fn parse(name: &str) -> Self {
        let name = name.trim();
        if let Some(state) = parse_tagged(name) {
            return state;
        }

        let cleaned = strip_artifacts(name);
        Self {
            base: if cleaned.is_empty() {
                name.to_string()
            } else {
                cleaned.to_string()
            },
            version: 0,
            tokens: vec![],
        }
    }

    /// Append tokens, bump the version, and evict the oldest beyond `cap`.
    ///
    /// Does nothing when no usable token is given.
    pub fn push_tokens<I, S>(&mut self, tokens: I, cap: usize)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let before = self.tokens.len();
        self.tokens.extend(
            tokens
                .into_iter()
                .filter_map(|t| sanitize_token(t.as_ref())),
        );
        if self.tokens.len() == before {
            return;
        }

        self.version += 1;
        let cap = cap.max(1);
        if self.tokens.len() > cap {
            let excess = self.tokens.len() - cap;
            self.tokens.drain(..excess);
        }
    }

    /// Render back to a display name.
    pub fn render(&self) -> String {
        match (self.version, self.tokens.is_empty()) {
            (0, true) => self.base.clone(),
            (n, true) => format!("{}{VERSION_MARKER}{n}", self.base),
            (n, false) => format!(
                "{}{VERSION_MARKER}{n}-{}",
                self.base,
                self.tokens.join(&TOKEN_SEPARATOR.to_string())
            ),
        }
    }
}

impl OutputNamer {
    pub fn new(cap: usize) -> Self {
        Self { cap: cap.max(1) }
    }

    pub fn cap(&self) -> usize {
        self.cap
    }

    /// Name for a clip that just had `tokens` applied.
    ///
    /// With no tokens a tagged name comes back unchanged.
    pub fn apply<S: AsRef<str>>(&self, name: &str, tokens: &[S]) -> String {
        let mut state = NamingState::parse(name);
        if tokens.is_empty() && state.version > 0 {
            return name.trim().to_string();
        }
        state.push_tokens(tokens, self.cap);
        state.render()
    }
}

/// Clean a token so it survives re-parsing.
///
/// The token separator becomes `-`, and a `-AS<digit>` inside the token
/// loses its dash so it cannot be read back as the version tag.
pub fn sanitize_token(token: &str) -> Option<String> {
    let mut cleaned = token.trim().replace(TOKEN_SEPARATOR, "-");
    while let Some(idx) = find_version_marker(&cleaned) {
        cleaned.replace_range(idx..idx + 1, " ");
    }
    (!cleaned.is_empty()).then_some(cleaned)
}

/// Byte offset of the first `-AS` followed by a digit.
fn find_version_marker(name: &str) -> Option<usize> {
    name.match_indices(VERSION_MARKER)
        .map(|(idx, _)| idx)
        .find(|&idx| {
            name[idx + VERSION_MARKER.len()..]
                .bytes()
                .next()
                .is_some_and(|b| b.is_ascii_digit())
        })
}

fn parse_tagged(name: &str) -> Option<NamingState> {
    for (idx, _) in name.rmatch_indices(VERSION_MARKER) {
        let rest = &name[idx + VERSION_MARKER.len()..];
        let digits_len = rest.bytes().take_while(u8::is_ascii_digit).count();
        if digits_len == 0 {
            continue;
        }
        let Ok(version) = rest[..digits_len].parse::<u32>() else {
            continue;
        };

        let tail = &rest[digits_len..];
        let tokens = if tail.is_empty() {
            vec![]
        } else if let Some(list) = tail.strip_prefix('-') {
            list.split(TOKEN_SEPARATOR)
                .filter(|t| !t.is_empty())
                .map(str::to_string)
                .collect()
        } else {
            continue;
        };

        return Some(NamingState {
            base: name[..idx].to_string(),
            version,
            tokens,
        });
    }
    None
}

/// Strip media extension, glue/render artifacts, and a trailing `" - X"` label.
pub fn strip_artifacts(name: &str) -> &str {
    let mut current = name.trim();

    let lower = current.to_ascii_lowercase();
    if let Some(ext) = MEDIA_EXTENSIONS.iter().find(|ext| lower.ends_with(*ext)) {
        current = current[..current.len() - ext.len()].trim_end();
    }

    current = strip_trailing_artifacts(current);

    if let Some(idx) = current.rfind(" - ") {
        if idx > 0 {
            current = strip_trailing_artifacts(current[..idx].trim_end());
        }
    }

    current
}

fn strip_trailing_artifacts(mut name: &str) -> &str {
    while let Some(stripped) = strip_one_artifact(name) {
        name = stripped.trim_end();
    }
    name
}

/// Remove one trailing `<sep><word>[<sep><digits>]` artifact.
fn strip_one_artifact(name: &str) -> Option<&str> {
    const SEPARATORS: [char; 3] = ['-', ' ', '_'];

    let lower = name.to_ascii_lowercase();
    let without_digits = lower.trim_end_matches(|c: char| c.is_ascii_digit());
    let core = if without_digits.len() < lower.len() {
        without_digits.strip_suffix(SEPARATORS)?
    } else {
        lower.as_str()
    };

    ARTIFACT_WORDS.iter().find_map(|word| {
        core.strip_suffix(word)
            .and_then(|rest| rest.strip_suffix(SEPARATORS))
            .map(|rest| &name[..rest.len()])
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_application() {
        let namer = OutputNamer::new(8);
        assert_eq!(namer.apply("Drum", &["Comp"]), "Drum-AS1-Comp");
    }

    #[test]
    fn test_second_application_appends() {
        let namer = OutputNamer::new(8);
        let first = namer.apply("Drum", &["Comp"]);
        assert_eq!(namer.apply(&first, &["EQ"]), "Drum-AS2-Comp_EQ");
    }

    #[test]
    fn test_fifo_cap_evicts_oldest() {
        let namer = OutputNamer::new(1);
        let first = namer.apply("Drum", &["Comp"]);
        assert_eq!(namer.apply(&first, &["EQ"]), "Drum-AS2-EQ");
    }

    #[test]
    fn test_duplicate_tokens_allowed() {
        let namer = OutputNamer::new(8);
        let once = namer.apply("Vox", &["Comp"]);
        assert_eq!(namer.apply(&once, &["Comp"]), "Vox-AS2-Comp_Comp");
    }

    #[test]
    fn test_reapply_without_token_is_noop() {
        let namer = OutputNamer::new(8);
        let named = namer.apply("Drum", &["Comp", "EQ"]);
        let none: [&str; 0] = [];
        assert_eq!(namer.apply(&named, &none), named);
        assert_eq!(NamingState::parse(&named).render(), named);
    }

    #[test]
    fn test_chain_tokens_bump_version_once() {
        let namer = OutputNamer::new(3);
        assert_eq!(
            namer.apply("Bass-AS4-Sat", &["EQ", "Comp", "Limit"]),
            "Bass-AS5-EQ_Comp_Limit"
        );
    }

    #[test]
    fn test_parse_tag_with_dashes_in_base_and_tokens() {
        let state = NamingState::parse("Kick-In-AS3-Pro-Q 3_DeEss");
        assert_eq!(state.base, "Kick-In");
        assert_eq!(state.version, 3);
        assert_eq!(state.tokens, vec!["Pro-Q 3", "DeEss"]);
    }

    #[test]
    fn test_invalid_marker_falls_back_to_earlier_one() {
        let state = NamingState::parse("Drum-AS1-Comp-ASx");
        assert_eq!(state.base, "Drum");
        assert_eq!(state.version, 1);
        assert_eq!(state.tokens, vec!["Comp-ASx"]);

        let untagged = NamingState::parse("BASS-ASIDE");
        assert_eq!(untagged.version, 0);
        assert_eq!(untagged.base, "BASS-ASIDE");
    }

    #[test]
    fn test_strip_artifacts() {
        assert_eq!(strip_artifacts("Drum-glued-01.wav"), "Drum");
        assert_eq!(strip_artifacts("Drum glued"), "Drum");
        assert_eq!(strip_artifacts("Vox render 003"), "Vox");
        assert_eq!(strip_artifacts("Vox-rendered"), "Vox");
        assert_eq!(strip_artifacts("Vox-glued-glued-02"), "Vox");
        assert_eq!(strip_artifacts("Gtr - Take 2"), "Gtr");
        assert_eq!(strip_artifacts("Gtr-glued - X"), "Gtr");
        assert_eq!(strip_artifacts("Kick 2"), "Kick 2");
        assert_eq!(strip_artifacts("Unglued"), "Unglued");
    }

    #[test]
    fn test_untagged_name_is_cleaned() {
        let namer = OutputNamer::new(8);
        assert_eq!(namer.apply("Snare-glued-03.wav", &["Gate"]), "Snare-AS1-Gate");
    }

    #[test]
    fn test_token_sanitization() {
        assert_eq!(sanitize_token("  Pro_Q  ").as_deref(), Some("Pro-Q"));
        assert_eq!(sanitize_token("   "), None);

        let namer = OutputNamer::new(8);
        assert_eq!(namer.apply("Drum", &["", "EQ"]), "Drum-AS1-EQ");
        assert_eq!(namer.apply("Drum", &[" "]), "Drum");
    }

    #[test]
    fn test_token_that_looks_like_a_tag_round_trips() {
        assert_eq!(sanitize_token("Mix-AS2").as_deref(), Some("Mix AS2"));
        assert_eq!(sanitize_token("Bus-AS").as_deref(), Some("Bus-AS"));

        let namer = OutputNamer::new(8);
        let first = namer.apply("Drum", &["Mix-AS2"]);
        assert_eq!(first, "Drum-AS1-Mix AS2");

        let state = NamingState::parse(&first);
        assert_eq!(state.base, "Drum");
        assert_eq!(state.version, 1);
        assert_eq!(state.tokens, vec!["Mix AS2"]);

        assert_eq!(namer.apply(&first, &["EQ"]), "Drum-AS2-Mix AS2_EQ");
    }
}
