use std::{fmt::Display, str::FromStr};

use garde::Validate;
use serde::{Deserialize, Serialize};

/// ISBN-10 or ISBN-13, stored in normalized form (digits only, upper case check character `X`)
#[derive(Debug, Clone, PartialEq, Eq, Validate, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[garde(transparent)]
#[serde(try_from = "String", into = "String")]
pub struct Isbn(#[garde(custom(check_isbn))] String);

fn check_isbn(value: &String, _ctx: &()) -> garde::Result {
    if is_valid_isbn(value) {
        Ok(())
    } else {
        Err(garde::Error::new("not a valid ISBN-10 or ISBN-13"))
    }
}

fn is_valid_isbn(value: &str) -> bool {
    let bytes = value.as_bytes();
    match bytes.len() {
        10 => {
            let mut sum = 0;
            for (i, b) in bytes.iter().enumerate() {
                let digit = match b {
                    b'0'..=b'9' => (b - b'0') as u32,
                    b'X' if i == 9 => 10,
                    _ => return false,
                };
                sum += (10 - i as u32) * digit;
            }
            sum % 11 == 0
        }
        13 => {
            let mut sum = 0;
            for (i, b) in bytes.iter().enumerate() {
                if !b.is_ascii_digit() {
                    return false;
                }
                let weight = if i % 2 == 0 { 1 } else { 3 };
                sum += weight * (b - b'0') as u32;
            }
            sum % 10 == 0
        }
        _ => false,
    }
}

fn normalize(s: &str) -> String {
    s.chars()
        .filter(|c| !matches!(c, '-' | ' '))
        .map(|c| c.to_ascii_uppercase())
        .collect()
}

impl FromStr for Isbn {
    type Err = garde::Report;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let isbn = Isbn(normalize(s));
        isbn.validate()?;
        Ok(isbn)
    }
}

impl TryFrom<String> for Isbn {
    type Error = garde::Report;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Isbn> for String {
    fn from(value: Isbn) -> Self {
        value.0
    }
}

impl AsRef<str> for Isbn {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Display for Isbn {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use quickcheck::{Arbitrary, Gen};
    use quickcheck_macros::quickcheck;

    use super::*;

    #[derive(Debug, Clone)]
    struct Isbn13Digits(String);

    impl Arbitrary for Isbn13Digits {
        fn arbitrary(g: &mut Gen) -> Self {
            let mut digits: Vec<u32> = vec![9, 7, 8];
            for _ in 0..9 {
                digits.push(u32::arbitrary(g) % 10);
            }
            let sum: u32 = digits
                .iter()
                .enumerate()
                .map(|(i, d)| if i % 2 == 0 { *d } else { 3 * d })
                .sum();
            digits.push((10 - sum % 10) % 10);
            Isbn13Digits(digits.iter().map(|d| d.to_string()).collect())
        }
    }

    #[quickcheck]
    fn test_generated_isbn13_is_valid(isbn: Isbn13Digits) -> bool {
        Isbn::from_str(&isbn.0).is_ok()
    }

    #[quickcheck]
    fn test_hyphenation_is_ignored(isbn: Isbn13Digits) -> bool {
        let hyphenated = format!("{}-{}-{}", &isbn.0[0..3], &isbn.0[3..8], &isbn.0[8..]);
        Isbn::from_str(&hyphenated).map(String::from).ok() == Some(isbn.0)
    }

    #[test]
    fn test_valid_isbn() {
        let isbn = Isbn::from_str("978-0-553-29335-7").unwrap();
        assert_eq!(isbn.as_ref(), "9780553293357");

        let isbn = Isbn::from_str("0 306 40615 2").unwrap();
        assert_eq!(isbn.as_ref(), "0306406152");

        let isbn = Isbn::from_str("080442957x").unwrap();
        assert_eq!(isbn.as_ref(), "080442957X");
    }

    #[test]
    fn test_invalid_isbn() {
        assert!(Isbn::from_str("9780553293358").is_err());
        assert!(Isbn::from_str("0306406153").is_err());
        assert!(Isbn::from_str("X306406152").is_err());
        assert!(Isbn::from_str("").is_err());
        assert!(Isbn::from_str("abc").is_err());

        // cheat on creation
        let isbn = Isbn("123".to_string());
        assert!(isbn.validate().is_err());
    }

    #[test]
    fn test_serde() {
        let isbn: Isbn = serde_json::from_str("\"978-0-553-29335-7\"").unwrap();
        assert_eq!(isbn.as_ref(), "9780553293357");
        assert_eq!(serde_json::to_string(&isbn).unwrap(), "\"9780553293357\"");
        assert!(serde_json::from_str::<Isbn>("\"12345\"").is_err());
    }
}
