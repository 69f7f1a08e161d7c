//! The rotation-interval grammar: `"<digits><UNIT>[S]"`, case-insensitive,
//! digits defaulting to 1 (`spec.md` §4.1, §6).

use std::fmt;

/// The calendar unit a [`RotationInterval`] rotates against.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum RotationField {
    Minute,
    Hour,
    Day,
    Week,
    Month,
    Year,
}

impl RotationField {
    fn parse(word: &str) -> Option<Self> {
        match word {
            "MINUTE" => Some(Self::Minute),
            "HOUR" => Some(Self::Hour),
            "DAY" => Some(Self::Day),
            "WEEK" => Some(Self::Week),
            "MONTH" => Some(Self::Month),
            "YEAR" => Some(Self::Year),
            _ => None,
        }
    }
}

impl fmt::Display for RotationField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Minute => "MINUTE",
            Self::Hour => "HOUR",
            Self::Day => "DAY",
            Self::Week => "WEEK",
            Self::Month => "MONTH",
            Self::Year => "YEAR",
        };
        f.write_str(s)
    }
}

/// A parsed interval specification: a calendar field plus a multiplier, e.g.
/// `5MINUTES` -> `{ field: Minute, multiplier: 5 }`.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct RotationInterval {
    pub field: RotationField,
    pub multiplier: u32,
}

impl RotationInterval {
    /// Parses `"<digits>?<UNIT>S?"`. An absent digit prefix defaults to 1; a
    /// trailing `S` (plural) is tolerated and stripped. Anything else -- no
    /// digits *and* no recognizable unit, a unit with no digits that still
    /// fails to parse, a bare number -- is reported back as the original
    /// string so the caller can surface it verbatim in
    /// [`crate::LogWriterError::InvalidInterval`].
    pub fn parse(spec: &str) -> Result<Self, String> {
        let upper = spec.trim().to_ascii_uppercase();
        let digit_end = upper
            .find(|c: char| !c.is_ascii_digit())
            .unwrap_or(upper.len());
        let (digits, rest) = upper.split_at(digit_end);

        let multiplier: u32 = if digits.is_empty() {
            1
        } else {
            digits.parse().map_err(|_| spec.to_string())?
        };

        let unit_word = rest.strip_suffix('S').unwrap_or(rest);
        let field = RotationField::parse(unit_word).ok_or_else(|| spec.to_string())?;

        Ok(Self { field, multiplier })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_multiplier_and_plural() {
        let parsed = RotationInterval::parse("5MINUTES").unwrap();
        assert_eq!(parsed.field, RotationField::Minute);
        assert_eq!(parsed.multiplier, 5);
    }

    #[test]
    fn defaults_multiplier_to_one() {
        let parsed = RotationInterval::parse("HOUR").unwrap();
        assert_eq!(parsed.field, RotationField::Hour);
        assert_eq!(parsed.multiplier, 1);
    }

    #[test]
    fn is_case_insensitive() {
        let parsed = RotationInterval::parse("3days").unwrap();
        assert_eq!(parsed.field, RotationField::Day);
        assert_eq!(parsed.multiplier, 3);
    }

    #[test]
    fn rejects_digits_only() {
        assert!(RotationInterval::parse("7").is_err());
    }

    #[test]
    fn rejects_unknown_unit() {
        assert!(RotationInterval::parse("5FORTNIGHTS").is_err());
    }
}
