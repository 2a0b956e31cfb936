use crate::{
    constants::CREDENTIAL_LEN,
    error::{Error, Result},
};
use serde::{Deserialize, Serialize};
use std::fmt;
use subtle::ConstantTimeEq;

/// Physical line number.
///
/// Identifies one hardware signal line (BCM-style numbering). The registry
/// guarantees at most one live resource per line id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LineId(u32);

impl LineId {
    /// Create a new line id.
    #[must_use]
    pub const fn new(id: u32) -> Self {
        LineId(id)
    }

    /// Get the raw line number as u32.
    #[must_use]
    pub fn as_u32(&self) -> u32 {
        self.0
    }

    /// Name of the endpoint exposed for this line when exported.
    #[must_use]
    pub fn endpoint_name(&self) -> String {
        format!("{}{}", crate::constants::ENDPOINT_PREFIX, self.0)
    }
}

impl fmt::Display for LineId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for LineId {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let id: u32 = s
            .trim()
            .parse()
            .map_err(|_| Error::invalid_argument(format!("invalid line number: {s:?}")))?;
        Ok(LineId(id))
    }
}

/// Signal direction of a line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    /// Line is sampled; writing a level is rejected.
    Input,
    /// Line is driven; levels may be written.
    Output,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Direction::Input => write!(f, "in"),
            Direction::Output => write!(f, "out"),
        }
    }
}

impl std::str::FromStr for Direction {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim() {
            "in" => Ok(Direction::Input),
            "out" => Ok(Direction::Output),
            other => Err(Error::invalid_argument(format!(
                "direction must be \"in\" or \"out\", got {other:?}"
            ))),
        }
    }
}

/// Binary level of a line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Level {
    Low,
    High,
}

impl Level {
    /// Interpret a bit: zero is low, anything else is high.
    #[must_use]
    pub fn from_bit(bit: u8) -> Self {
        if bit == 0 { Level::Low } else { Level::High }
    }

    /// The level as a single bit.
    #[must_use]
    pub fn as_bit(&self) -> u8 {
        match self {
            Level::Low => 0,
            Level::High => 1,
        }
    }

    /// True if the level is high.
    #[must_use]
    pub fn is_high(&self) -> bool {
        matches!(self, Level::High)
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.as_bit())
    }
}

impl std::str::FromStr for Level {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim() {
            "0" => Ok(Level::Low),
            "1" => Ok(Level::High),
            other => Err(Error::invalid_argument(format!(
                "level must be \"0\" or \"1\", got {other:?}"
            ))),
        }
    }
}

/// A fixed-length numeric credential.
///
/// Exactly [`CREDENTIAL_LEN`] ASCII digits.
///
/// # Security
/// Comparison is constant-time to avoid leaking the matching prefix length
/// through timing, both between credentials and against a raw received word.
/// The link itself is deliberately plaintext.
#[derive(Debug, Clone, Eq, Serialize, Deserialize)]
pub struct Credential(String);

impl Credential {
    /// The all-zero dummy substituted for malformed transmitter input.
    pub const DUMMY: &str = "0000";

    /// Create a new credential with validation.
    ///
    /// # Errors
    /// Returns `Error::InvalidArgument` if the input is not exactly
    /// [`CREDENTIAL_LEN`] ASCII digits.
    pub fn new(digits: &str) -> Result<Self> {
        let digits = digits.trim();
        if digits.len() != CREDENTIAL_LEN || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return Err(Error::invalid_argument(format!(
                "credential must be exactly {CREDENTIAL_LEN} digits"
            )));
        }
        Ok(Credential(digits.to_string()))
    }

    /// The all-zero dummy credential.
    #[must_use]
    pub fn dummy() -> Self {
        Credential(Self::DUMMY.to_string())
    }

    /// True if this is the dummy credential.
    #[must_use]
    pub fn is_dummy(&self) -> bool {
        self.matches_bytes(Self::DUMMY.as_bytes())
    }

    /// Get the credential as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Constant-time comparison against a raw byte word.
    ///
    /// Received frames may decode to arbitrary bytes under line noise, so
    /// the comparison takes the raw word rather than a validated credential.
    #[must_use]
    pub fn matches_bytes(&self, word: &[u8]) -> bool {
        self.0.as_bytes().ct_eq(word).into()
    }
}

impl PartialEq for Credential {
    fn eq(&self, other: &Self) -> bool {
        self.0.as_bytes().ct_eq(other.0.as_bytes()).into()
    }
}

impl fmt::Display for Credential {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for Credential {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Credential::new(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("17", 17)]
    #[case("0", 0)]
    #[case(" 26\n", 26)]
    fn test_line_id_valid(#[case] input: &str, #[case] expected: u32) {
        let id: LineId = input.parse().unwrap();
        assert_eq!(id.as_u32(), expected);
    }

    #[rstest]
    #[case("abc")]
    #[case("-4")]
    #[case("")]
    fn test_line_id_invalid(#[case] input: &str) {
        let result: Result<LineId> = input.parse();
        assert!(matches!(result, Err(Error::InvalidArgument { .. })));
    }

    #[test]
    fn test_line_id_endpoint_name() {
        assert_eq!(LineId::new(17).endpoint_name(), "line17");
    }

    #[rstest]
    #[case("in", Direction::Input)]
    #[case("out", Direction::Output)]
    #[case("out\n", Direction::Output)]
    fn test_direction_parse(#[case] input: &str, #[case] expected: Direction) {
        assert_eq!(input.parse::<Direction>().unwrap(), expected);
        assert_eq!(expected.to_string().parse::<Direction>().unwrap(), expected);
    }

    #[rstest]
    #[case("0", Level::Low)]
    #[case("1", Level::High)]
    fn test_level_parse(#[case] input: &str, #[case] expected: Level) {
        assert_eq!(input.parse::<Level>().unwrap(), expected);
    }

    #[test]
    fn test_level_bits() {
        assert_eq!(Level::from_bit(0), Level::Low);
        assert_eq!(Level::from_bit(1), Level::High);
        assert_eq!(Level::from_bit(7), Level::High);
        assert_eq!(Level::High.as_bit(), 1);
        assert!(!Level::Low.is_high());
    }

    #[rstest]
    #[case("2")]
    #[case("high")]
    #[case("")]
    fn test_level_invalid(#[case] input: &str) {
        assert!(input.parse::<Level>().is_err());
    }

    #[test]
    fn test_credential_valid() {
        let cred = Credential::new("1234").unwrap();
        assert_eq!(cred.as_str(), "1234");
        assert_eq!(cred, Credential::new("1234").unwrap());
        assert_ne!(cred, Credential::new("1235").unwrap());
    }

    #[rstest]
    #[case("123")] // too short
    #[case("12345")] // too long
    #[case("12a4")] // non-digit
    #[case("12.4")]
    #[case("")]
    fn test_credential_invalid(#[case] input: &str) {
        assert!(Credential::new(input).is_err());
    }

    #[test]
    fn test_credential_dummy() {
        let dummy = Credential::dummy();
        assert!(dummy.is_dummy());
        assert!(!Credential::new("1234").unwrap().is_dummy());
    }

    #[test]
    fn test_credential_matches_bytes() {
        let cred = Credential::new("1234").unwrap();
        assert!(cred.matches_bytes(b"1234"));
        assert!(!cred.matches_bytes(b"1235"));
        // Noise word with non-digit bytes compares unequal, never panics.
        assert!(!cred.matches_bytes(&[0xFF, 0x00, 0xAA, 0x55]));
        // Length mismatch compares unequal.
        assert!(!cred.matches_bytes(b"123"));
    }
}
