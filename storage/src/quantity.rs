//! Wire form of integer quantities: `0x`-prefixed lowercase hex, the way
//! balances and heights travel over JSON-RPC. Decimal strings are accepted on
//! input for hand-written fixtures.

use serde::{de::Error, Deserialize, Deserializer, Serializer};

pub fn to_hex(value: u128) -> String {
    format!("{value:#x}")
}

pub fn parse_u128(s: &str) -> Result<u128, String> {
    if s.strip_prefix("0x").unwrap_or(s).starts_with('+') {
        return Err(format!("`{s}`: unexpected sign"));
    }

    match s.strip_prefix("0x") {
        Some("") => Err(format!("empty hex quantity `{s}`")),
        Some(digits) => u128::from_str_radix(digits, 16).map_err(|e| format!("`{s}`: {e}")),
        None => s.parse::<u128>().map_err(|e| format!("`{s}`: {e}")),
    }
}

pub fn parse_u64(s: &str) -> Result<u64, String> {
    let value = parse_u128(s)?;

    u64::try_from(value).map_err(|_| format!("`{s}` does not fit in 64 bits"))
}

pub fn u128_from_str<'de, D>(deserializer: D) -> Result<u128, D::Error>
where
    D: Deserializer<'de>,
{
    let s: String = Deserialize::deserialize(deserializer)?;

    parse_u128(&s).map_err(D::Error::custom)
}

pub fn u128_to_hex<S>(value: &u128, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.serialize_str(&to_hex(*value))
}
