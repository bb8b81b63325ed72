//! Wire format for loan transaction identifiers.
//!
//! A transaction id is ten ASCII digits: a six digit date token (`YYMMDD` of
//! the submission date) followed by a four digit, zero padded sequence in
//! `0001`..=`9999`. The display form inserts a hyphen after the date token
//! (`250121-0001`). Parsing is two staged: strip a correctly placed
//! separator if present, then validate the digit grammar, so raw and
//! display input share one code path.

use chrono::{Datelike, NaiveDate};

/// Errors raised while parsing or constructing transaction ids.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum IdFormatError {
    #[error("transaction id cannot be empty")]
    Empty,
    #[error("transaction id must be 10 digits, found {found}")]
    WrongLength { found: usize },
    #[error("transaction id may only contain ASCII digits")]
    NonDigit,
    #[error("separator must sit between the 6-digit date and 4-digit sequence")]
    MisplacedSeparator,
    #[error("sequence 0000 is outside the issued range 0001-9999")]
    SequenceZero,
    #[error("sequence {0} does not fit the 4-digit issue range")]
    SequenceOverflow(u32),
}

/// Six digit date token naming the allocation day.
///
/// The codec treats the token as opaque digits; only the allocator insists
/// on deriving it from a real calendar date. This keeps lookup able to
/// resolve any identifier that storage actually issued.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DateToken(u32);

impl DateToken {
    /// Digits in the token.
    pub const LEN: usize = 6;

    /// Derives the `YYMMDD` token for a calendar date.
    pub fn from_date(date: NaiveDate) -> Self {
        let yy = date.year().rem_euclid(100) as u32;
        Self(yy * 10_000 + date.month() * 100 + date.day())
    }

    /// Parses a token from exactly six ASCII digits.
    pub fn from_digits(digits: &str) -> Result<Self, IdFormatError> {
        if digits.chars().count() != Self::LEN {
            return Err(IdFormatError::WrongLength {
                found: digits.chars().count(),
            });
        }
        if !digits.bytes().all(|byte| byte.is_ascii_digit()) {
            return Err(IdFormatError::NonDigit);
        }
        let value = digits.parse::<u32>().map_err(|_| IdFormatError::NonDigit)?;
        Ok(Self(value))
    }

    pub fn value(self) -> u32 {
        self.0
    }
}

impl std::fmt::Display for DateToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:06}", self.0)
    }
}

/// Date-plus-sequence identifier issued once per submitted application.
///
/// Immutable after construction; the constructor is the only place the
/// sequence range is enforced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TransactionId {
    date_token: DateToken,
    sequence: u16,
}

impl TransactionId {
    /// Length of the raw form.
    pub const RAW_LEN: usize = 10;
    /// Highest sequence a single date can issue.
    pub const SEQUENCE_MAX: u32 = 9_999;

    /// Builds an id from a date token and a sequence in `1..=9999`.
    pub fn new(date_token: DateToken, sequence: u32) -> Result<Self, IdFormatError> {
        if sequence == 0 {
            return Err(IdFormatError::SequenceZero);
        }
        if sequence > Self::SEQUENCE_MAX {
            return Err(IdFormatError::SequenceOverflow(sequence));
        }
        Ok(Self {
            date_token,
            sequence: sequence as u16,
        })
    }

    /// Encodes the raw ten digit form, preserving leading zeros.
    pub fn raw(&self) -> String {
        format!("{}{:04}", self.date_token, self.sequence)
    }

    /// Renders the display form with the separator after the date token.
    pub fn display(&self) -> String {
        format!("{}-{:04}", self.date_token, self.sequence)
    }

    /// Parses raw or display input into an id.
    ///
    /// Stage one strips a single hyphen when it sits exactly between the
    /// date and sequence parts; stage two checks the remaining text is ten
    /// ASCII digits with a non-zero sequence. Input is taken exactly as
    /// given; surrounding whitespace fails the grammar like any other
    /// non-digit.
    pub fn parse(text: &str) -> Result<Self, IdFormatError> {
        if text.is_empty() {
            return Err(IdFormatError::Empty);
        }

        let raw = match text.split_once('-') {
            Some((date_part, sequence_part)) => {
                if date_part.chars().count() != DateToken::LEN || sequence_part.contains('-') {
                    return Err(IdFormatError::MisplacedSeparator);
                }
                format!("{date_part}{sequence_part}")
            }
            None => text.to_string(),
        };

        if raw.chars().count() != Self::RAW_LEN {
            return Err(IdFormatError::WrongLength {
                found: raw.chars().count(),
            });
        }
        if !raw.bytes().all(|byte| byte.is_ascii_digit()) {
            return Err(IdFormatError::NonDigit);
        }

        let date_token = DateToken::from_digits(&raw[..DateToken::LEN])?;
        let sequence = raw[DateToken::LEN..]
            .parse::<u32>()
            .map_err(|_| IdFormatError::NonDigit)?;

        Self::new(date_token, sequence)
    }

    /// Non-throwing grammar check over raw or display input.
    pub fn is_valid(text: &str) -> bool {
        Self::parse(text).is_ok()
    }

    pub fn date_token(&self) -> DateToken {
        self.date_token
    }

    pub fn sequence(&self) -> u16 {
        self.sequence
    }
}

impl std::fmt::Display for TransactionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.display())
    }
}

impl std::str::FromStr for TransactionId {
    type Err = IdFormatError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl serde::Serialize for TransactionId {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.raw())
    }
}

impl<'de> serde::Deserialize<'de> for TransactionId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let text = <String as serde::Deserialize>::deserialize(deserializer)?;
        Self::parse(&text).map_err(serde::de::Error::custom)
    }
}
