//! Internal implementation of unique id and generated name types.

use crate::{UuidError, UuidResult};
use chrono::{DateTime, SubsecRound, Utc};
use rand::seq::SliceRandom;
use std::{fmt, str::FromStr};
use uuid::Uuid;

/// Letters shuffled into the tail of every generated name.
pub const NAME_ALPHABET: [char; 13] = [
    'e', 'f', 'g', 'h', 'i', 'j', 'k', 'l', 'm', 'n', 'o', 'p', 'q',
];

const TIMESTAMP_FORMAT: &str = "%Y%m%dT%H%M%S%.6f";
const ENTROPY_LEN: usize = 8;

/// A time-prefixed unique identifier.
///
/// Format:
/// `YYYYMMDDTHHMMSS.ffffffZ-<8 lowercase hex>`
///
/// Example:
/// `20260111T143522.045123Z-550e8400`
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct UniqueId {
    timestamp: DateTime<Utc>,
    entropy: String,
}

impl UniqueId {
    /// Generate a new unique id from the current time, truncated to microseconds.
    pub fn generate() -> Self {
        let timestamp = Utc::now().trunc_subsecs(6);
        let entropy = Uuid::new_v4().simple().to_string()[..ENTROPY_LEN].to_owned();

        Self { timestamp, entropy }
    }

    /// Returns the timestamp component.
    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    /// Returns the hex entropy component.
    pub fn entropy(&self) -> &str {
        &self.entropy
    }
}

impl FromStr for UniqueId {
    type Err = UuidError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (ts_str, entropy) = s.split_once('-').ok_or_else(|| {
            UuidError::InvalidInput(format!("Invalid unique id format: '{}'", s))
        })?;

        let ts_no_z = ts_str.strip_suffix('Z').ok_or_else(|| {
            UuidError::InvalidInput(format!("Timestamp must end with 'Z': '{}'", ts_str))
        })?;

        let naive = chrono::NaiveDateTime::parse_from_str(ts_no_z, TIMESTAMP_FORMAT).map_err(
            |e| UuidError::InvalidInput(format!("Invalid timestamp format '{}': {}", ts_str, e)),
        )?;

        let valid_entropy = entropy.len() == ENTROPY_LEN
            && entropy
                .bytes()
                .all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f'));
        if !valid_entropy {
            return Err(UuidError::InvalidInput(format!(
                "Entropy must be {} lowercase hex characters, got: '{}'",
                ENTROPY_LEN, entropy
            )));
        }

        Ok(Self {
            timestamp: DateTime::<Utc>::from_naive_utc_and_offset(naive, Utc),
            entropy: entropy.to_owned(),
        })
    }
}

impl fmt::Display for UniqueId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}Z-{}",
            self.timestamp.format(TIMESTAMP_FORMAT),
            self.entropy
        )
    }
}

#[cfg(feature = "serde")]
impl serde::Serialize for UniqueId {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.collect_str(self)
    }
}

/// A file name generated for an upload that arrived without a caller-supplied name.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct GeneratedName {
    id: UniqueId,
    letters: String,
}

impl GeneratedName {
    /// Generates a fresh name: a new [`UniqueId`], `_`, then [`NAME_ALPHABET`] shuffled.
    pub fn generate() -> Self {
        let mut letters = NAME_ALPHABET;
        letters.shuffle(&mut rand::thread_rng());

        Self {
            id: UniqueId::generate(),
            letters: letters.iter().collect(),
        }
    }

    /// Parses a previously generated name.
    ///
    /// # Errors
    ///
    /// Returns [`UuidError::InvalidInput`] if `input` is not `<unique id>_<permutation>`.
    pub fn parse(input: &str) -> UuidResult<Self> {
        let (id, letters) = input.rsplit_once('_').ok_or_else(|| {
            UuidError::InvalidInput(format!("Generated name has no '_' separator: '{}'", input))
        })?;

        let mut sorted: Vec<char> = letters.chars().collect();
        sorted.sort_unstable();
        if sorted != NAME_ALPHABET {
            return Err(UuidError::InvalidInput(format!(
                "'{}' is not a permutation of the name alphabet",
                letters
            )));
        }

        Ok(Self {
            id: id.parse()?,
            letters: letters.to_owned(),
        })
    }

    /// Returns the unique id component.
    pub fn id(&self) -> &UniqueId {
        &self.id
    }
}

impl fmt::Display for GeneratedName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}_{}", self.id, self.letters)
    }
}
