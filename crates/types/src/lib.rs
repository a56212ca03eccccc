//! Validated text types shared across the uploadimg workspace.

/// Errors that can occur when creating validated text types.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum TextError {
    /// The input text was empty or contained only whitespace
    #[error("Text cannot be empty")]
    Empty,

    /// Nothing usable was left once unsafe characters were removed
    #[error("'{0}' does not contain any characters usable in a file name")]
    Unusable(String),
}

/// A string type that guarantees non-empty content.
///
/// This type wraps a `String` and ensures it contains at least one non-whitespace character.
/// The input is automatically trimmed of leading and trailing whitespace during construction.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct NonEmptyText(String);

impl NonEmptyText {
    /// Creates a new `NonEmptyText` from the given input.
    ///
    /// The input is trimmed of leading and trailing whitespace. If the trimmed
    /// result is empty, an error is returned.
    ///
    /// # Arguments
    ///
    /// * `input` - Any type that can be converted to a string reference
    ///
    /// # Returns
    ///
    /// Returns `Ok(NonEmptyText)` if the trimmed input is non-empty,
    /// or `Err(TextError::Empty)` if it's empty or contains only whitespace.
    pub fn new(input: impl AsRef<str>) -> Result<Self, TextError> {
        let trimmed = input.as_ref().trim();
        if trimmed.is_empty() {
            return Err(TextError::Empty);
        }
        Ok(Self(trimmed.to_owned()))
    }

    /// Returns the inner string as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for NonEmptyText {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for NonEmptyText {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl serde::Serialize for NonEmptyText {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> serde::Deserialize<'de> for NonEmptyText {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        NonEmptyText::new(&s).map_err(serde::de::Error::custom)
    }
}

/// A caller-supplied file name stem, safe to embed in a path and in HTML.
///
/// Construction strips markup tags (`<b>cat</b>` becomes `cat`), removes characters that
/// are not valid in file names on common platforms (`/`, `\`, `:`, `*`, `?`, `|`, `<`,
/// `>`, control characters), removes HTML-significant quotes and ampersands, and trims
/// whitespace. The stem never contains a path separator.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FileStem(NonEmptyText);

impl FileStem {
    /// Sanitises `input` into a file stem.
    ///
    /// # Errors
    ///
    /// Returns [`TextError::Empty`] for blank input and [`TextError::Unusable`] when
    /// nothing remains after sanitising.
    pub fn new(input: impl AsRef<str>) -> Result<Self, TextError> {
        let raw = input.as_ref();
        if raw.trim().is_empty() {
            return Err(TextError::Empty);
        }

        let cleaned: String = sanitize_filename::sanitize(strip_tags(raw))
            .chars()
            .filter(|c| !matches!(c, '\'' | '"' | '&' | '`'))
            .collect();

        NonEmptyText::new(cleaned)
            .map(Self)
            .map_err(|_| TextError::Unusable(raw.to_owned()))
    }

    /// Returns the stem as a string slice.
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl std::fmt::Display for FileStem {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

impl AsRef<str> for FileStem {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl serde::Serialize for FileStem {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        self.0.serialize(serializer)
    }
}

/// Removes `<...>` sequences. An unterminated `<` drops the rest of the input.
fn strip_tags(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut in_tag = false;
    for c in input.chars() {
        match c {
            '<' => in_tag = true,
            '>' if in_tag => in_tag = false,
            _ if !in_tag => out.push(c),
            _ => {}
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_non_empty_text_trims() {
        let text = NonEmptyText::new("  hello ").unwrap();
        assert_eq!(text.as_str(), "hello");
    }

    #[test]
    fn test_non_empty_text_rejects_blank() {
        assert_eq!(NonEmptyText::new("   "), Err(TextError::Empty));
        assert_eq!(NonEmptyText::new(""), Err(TextError::Empty));
    }

    #[test]
    fn test_non_empty_text_deserialize_rejects_blank() {
        let result: Result<NonEmptyText, _> = serde_json::from_str("\"  \"");
        assert!(result.is_err());
    }

    #[test]
    fn test_file_stem_keeps_plain_names() {
        assert_eq!(FileStem::new("foo").unwrap().as_str(), "foo");
        assert_eq!(FileStem::new("2012").unwrap().as_str(), "2012");
        assert_eq!(
            FileStem::new("we_belive_in_json").unwrap().as_str(),
            "we_belive_in_json"
        );
    }

    #[test]
    fn test_file_stem_strips_tags() {
        assert_eq!(FileStem::new("<b>cat</b>").unwrap().as_str(), "cat");
        assert_eq!(
            FileStem::new("dog<script>alert(1)</script>").unwrap().as_str(),
            "dogalert(1)"
        );
    }

    #[test]
    fn test_file_stem_removes_quotes_and_ampersands() {
        assert_eq!(FileStem::new("a\"b'c&d").unwrap().as_str(), "abcd");
    }

    #[test]
    fn test_file_stem_never_contains_separators() {
        let stem = FileStem::new("../../etc/passwd").unwrap();
        assert!(!stem.as_str().contains('/'));

        let stem = FileStem::new("..\\windows\\system32").unwrap();
        assert!(!stem.as_str().contains('\\'));
    }

    #[test]
    fn test_file_stem_is_idempotent() {
        let once = FileStem::new(" <i>holiday</i> photo ").unwrap();
        let twice = FileStem::new(once.as_str()).unwrap();
        assert_eq!(once, twice);
        assert_eq!(once.as_str(), "holiday photo");
    }

    #[test]
    fn test_file_stem_rejects_blank() {
        assert_eq!(FileStem::new("  "), Err(TextError::Empty));
    }

    #[test]
    fn test_file_stem_rejects_markup_only() {
        assert!(matches!(
            FileStem::new("<img src=x>"),
            Err(TextError::Unusable(_))
        ));
        assert!(matches!(FileStem::new("///"), Err(TextError::Unusable(_))));
    }

    #[test]
    fn test_file_stem_serializes_as_string() {
        let stem = FileStem::new("demo").unwrap();
        assert_eq!(serde_json::to_string(&stem).unwrap(), "\"demo\"");
    }
}
