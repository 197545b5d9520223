//! Serde adapters writing pubkeys as base58 strings.
//!
//! Use with `#[serde(with = "crate::utils::serde_pubkey")]`. Wrapped values
//! go through `option::serialize` and `vec::deserialize`.

use std::str::FromStr;
use serde::{de, Deserialize, Deserializer, Serializer};
use solana_pubkey::Pubkey;

pub fn serialize<S: Serializer>(key: &Pubkey, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.collect_str(key)
}

pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Pubkey, D::Error> {
    let value = String::deserialize(deserializer)?;
    Pubkey::from_str(&value).map_err(de::Error::custom)
}

pub mod option {
    use super::*;

    pub fn serialize<S: Serializer>(key: &Option<Pubkey>, serializer: S) -> Result<S::Ok, S::Error> {
        match key {
            Some(key) => serializer.collect_str(key),
            None => serializer.serialize_none(),
        }
    }
}

pub mod vec {
    use super::*;

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<Pubkey>, D::Error> {
        Vec::<String>::deserialize(deserializer)?
            .iter()
            .map(|value| Pubkey::from_str(value).map_err(de::Error::custom))
            .collect()
    }
}
