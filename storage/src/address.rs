use serde::{de::Error as _, Deserialize, Deserializer, Serialize, Serializer};
use std::{fmt, str::FromStr};
use thiserror::Error;

const BODY_LEN: usize = 20;
const TEXT_LEN: usize = 2 + BODY_LEN * 2;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AddressError {
    #[error("Invalid address length `{0}`")]
    Length(usize),
    #[error("Invalid address prefix in `{0}`")]
    Prefix(String),
    #[error("Invalid hex in address `{0}`")]
    Hex(String),
    #[error("Invalid address bytes")]
    Bytes,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum AddressKind {
    Eoa,
    Contract,
}

impl AddressKind {
    fn prefix(self) -> &'static str {
        match self {
            AddressKind::Eoa => "hx",
            AddressKind::Contract => "cx",
        }
    }

    fn tag(self) -> u8 {
        match self {
            AddressKind::Eoa => 0,
            AddressKind::Contract => 1,
        }
    }

    fn from_tag(tag: u8) -> Option<Self> {
        match tag {
            0 => Some(AddressKind::Eoa),
            1 => Some(AddressKind::Contract),
            _ => None,
        }
    }
}

/// Account identifier: `hx` or `cx` followed by 20 bytes of hex.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Address {
    kind: AddressKind,
    body: [u8; BODY_LEN],
}

impl Address {
    pub fn new(kind: AddressKind, body: [u8; BODY_LEN]) -> Self {
        Self { kind, body }
    }

    pub fn kind(&self) -> AddressKind {
        self.kind
    }

    pub fn is_contract(&self) -> bool {
        self.kind == AddressKind::Contract
    }

    /// 21-byte storage form: kind tag then body.
    pub fn to_bytes(&self) -> [u8; BODY_LEN + 1] {
        let mut out = [0u8; BODY_LEN + 1];
        out[0] = self.kind.tag();
        out[1..].copy_from_slice(&self.body);
        out
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, AddressError> {
        if bytes.len() != BODY_LEN + 1 {
            return Err(AddressError::Bytes);
        }
        let kind = AddressKind::from_tag(bytes[0]).ok_or(AddressError::Bytes)?;
        let mut body = [0u8; BODY_LEN];
        body.copy_from_slice(&bytes[1..]);

        Ok(Self { kind, body })
    }
}

impl FromStr for Address {
    type Err = AddressError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.len() != TEXT_LEN {
            return Err(AddressError::Length(s.len()));
        }

        let kind = match s.get(..2) {
            Some("hx") => AddressKind::Eoa,
            Some("cx") => AddressKind::Contract,
            _ => return Err(AddressError::Prefix(s.to_string())),
        };

        let mut body = [0u8; BODY_LEN];
        hex::decode_to_slice(&s[2..], &mut body).map_err(|_| AddressError::Hex(s.to_string()))?;

        Ok(Self { kind, body })
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.kind.prefix(), hex::encode(self.body))
    }
}

impl Serialize for Address {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Address {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s: String = Deserialize::deserialize(deserializer)?;

        Address::from_str(&s).map_err(D::Error::custom)
    }
}
