/// Errors that can occur when creating validated field types.
#[derive(Debug, thiserror::Error)]
pub enum FieldError {
    /// The input text was empty or contained only whitespace
    #[error("Text cannot be empty")]
    Empty,
    /// The input text exceeded the maximum allowed length
    #[error("Text exceeds maximum length of {0} characters")]
    TooLong(usize),
    /// The input text contained a character outside the allowed set
    #[error("Text contains invalid characters")]
    InvalidCharacter,
    /// A Glasgow sub-score was outside its valid range
    #[error("{component} score must be between {min} and {max}, got {value}")]
    ScoreOutOfRange {
        component: &'static str,
        min: u8,
        max: u8,
        value: u8,
    },
}

/// An operator display name, guaranteed non-empty.
///
/// Actor identity is supplied by an external session collaborator and used
/// verbatim in audit entries. This type wraps a `String` and ensures it
/// contains at least one non-whitespace character. The input is trimmed of
/// leading and trailing whitespace during construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActorName(String);

impl ActorName {
    /// Creates a new `ActorName` from the given input.
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
    /// Returns `Ok(ActorName)` if the trimmed input is non-empty,
    /// or `Err(FieldError::Empty)` if it's empty or contains only whitespace.
    pub fn new(input: impl AsRef<str>) -> Result<Self, FieldError> {
        let trimmed = input.as_ref().trim();
        if trimmed.is_empty() {
            return Err(FieldError::Empty);
        }
        Ok(Self(trimmed.to_owned()))
    }

    /// Returns the inner string as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ActorName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for ActorName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl serde::Serialize for ActorName {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> serde::Deserialize<'de> for ActorName {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        ActorName::new(&s).map_err(serde::de::Error::custom)
    }
}

/// Maximum length of a bib number, in characters.
const BIB_MAX_LEN: usize = 12;

/// A participant's bib (dossard) number.
///
/// Bib numbers are short operator-facing codes used as a quick patient lookup
/// key when identity is unknown. They are trimmed on construction and
/// restricted to ASCII alphanumerics and `-`, at most 12 characters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BibNumber(String);

impl BibNumber {
    /// Creates a new `BibNumber` from the given input.
    ///
    /// # Errors
    ///
    /// Returns `FieldError::Empty` if the trimmed input is empty,
    /// `FieldError::TooLong` if it exceeds 12 characters, or
    /// `FieldError::InvalidCharacter` if it contains anything other than
    /// ASCII alphanumerics and `-`.
    pub fn new(input: impl AsRef<str>) -> Result<Self, FieldError> {
        let trimmed = input.as_ref().trim();
        if trimmed.is_empty() {
            return Err(FieldError::Empty);
        }
        if trimmed.len() > BIB_MAX_LEN {
            return Err(FieldError::TooLong(BIB_MAX_LEN));
        }
        let ok = trimmed
            .bytes()
            .all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'z' | b'A'..=b'Z' | b'-'));
        if !ok {
            return Err(FieldError::InvalidCharacter);
        }
        Ok(Self(trimmed.to_owned()))
    }

    /// Returns the inner string as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for BibNumber {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for BibNumber {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl serde::Serialize for BibNumber {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> serde::Deserialize<'de> for BibNumber {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        BibNumber::new(&s).map_err(serde::de::Error::custom)
    }
}

/// Glasgow Coma Scale sub-scores.
///
/// The three sub-scores are validated on construction: eye response in
/// [1, 4], verbal response in [1, 5], motor response in [1, 6]. The total is
/// therefore always in [3, 15] and is derived, never stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GlasgowComa {
    eye: u8,
    verbal: u8,
    motor: u8,
}

impl GlasgowComa {
    /// Creates a validated set of Glasgow sub-scores.
    ///
    /// # Errors
    ///
    /// Returns `FieldError::ScoreOutOfRange` naming the offending component
    /// if any sub-score lies outside its valid range.
    pub fn new(eye: u8, verbal: u8, motor: u8) -> Result<Self, FieldError> {
        if !(1..=4).contains(&eye) {
            return Err(FieldError::ScoreOutOfRange {
                component: "eye",
                min: 1,
                max: 4,
                value: eye,
            });
        }
        if !(1..=5).contains(&verbal) {
            return Err(FieldError::ScoreOutOfRange {
                component: "verbal",
                min: 1,
                max: 5,
                value: verbal,
            });
        }
        if !(1..=6).contains(&motor) {
            return Err(FieldError::ScoreOutOfRange {
                component: "motor",
                min: 1,
                max: 6,
                value: motor,
            });
        }
        Ok(Self { eye, verbal, motor })
    }

    /// Eye response sub-score, in [1, 4].
    pub fn eye(&self) -> u8 {
        self.eye
    }

    /// Verbal response sub-score, in [1, 5].
    pub fn verbal(&self) -> u8 {
        self.verbal
    }

    /// Motor response sub-score, in [1, 6].
    pub fn motor(&self) -> u8 {
        self.motor
    }

    /// Total Glasgow score, always in [3, 15].
    pub fn total(&self) -> u8 {
        self.eye + self.verbal + self.motor
    }
}

impl std::fmt::Display for GlasgowComa {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "E{}V{}M{} = {}",
            self.eye,
            self.verbal,
            self.motor,
            self.total()
        )
    }
}

/// Wire shape used for (de)serialisation so sub-scores are re-validated on
/// the way in.
#[derive(serde::Serialize, serde::Deserialize)]
struct GlasgowComaWire {
    eye: u8,
    verbal: u8,
    motor: u8,
}

impl serde::Serialize for GlasgowComa {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        GlasgowComaWire {
            eye: self.eye,
            verbal: self.verbal,
            motor: self.motor,
        }
        .serialize(serializer)
    }
}

impl<'de> serde::Deserialize<'de> for GlasgowComa {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let wire = GlasgowComaWire::deserialize(deserializer)?;
        GlasgowComa::new(wire.eye, wire.verbal, wire.motor).map_err(serde::de::Error::custom)
    }
}
