use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Length of a full hexadecimal commit id
pub const SHA_LEN: usize = 40;

/// A full 40-character commit (or object) id, normalized to lowercase.
///
/// Only values that passed validation exist, so anything holding a `Sha` can
/// address the server directly.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Sha(String);

impl Sha {
    pub fn parse(input: &str) -> Result<Self, String> {
        if is_valid_sha(input) {
            Ok(Self(input.to_ascii_lowercase()))
        } else {
            Err(format!("That isn't a valid SHA ID: {input:?}"))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn short(&self) -> &str {
        &self.0[..7]
    }
}

/// True when `input` matches `^[a-fA-F0-9]{40}$`
pub fn is_valid_sha(input: &str) -> bool {
    input.len() == SHA_LEN && input.bytes().all(|b| b.is_ascii_hexdigit())
}

impl FromStr for Sha {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Sha::parse(s)
    }
}

impl TryFrom<String> for Sha {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Sha::parse(&value)
    }
}

impl From<Sha> for String {
    fn from(sha: Sha) -> Self {
        sha.0
    }
}

impl AsRef<str> for Sha {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Sha {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
