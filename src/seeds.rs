//! Seed constants and the typed seed encoder
//!
//! A [`Seed`] is one ordered input to a program address derivation. Each kind has exactly one
//! canonical byte encoding, and that encoding is what the on-chain program hashes.

use solana_sdk::pubkey::Pubkey;

use crate::codec::Value;
use crate::error::{TokrError, TokrResult};

pub const SEED_IDENTITY: &str = "identity";
pub const SEED_LIST: &str = "list";
pub const SEED_GOVERNANCE: &str = "governance";
pub const SEED_REALM_CONFIG: &str = "realm-config";
pub const SEED_ACCOUNT_GOVERNANCE: &str = "account-governance";
pub const SEED_MINT_GOVERNANCE: &str = "mint-governance";
pub const SEED_TOKEN_GOVERNANCE: &str = "token-governance";
pub const SEED_PROGRAM_GOVERNANCE: &str = "program-governance";
pub const SEED_NATIVE_TREASURY: &str = "native-treasury";

/// A typed program address derivation input
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Seed {
    /// Raw 32 bytes of the key
    PublicKey(Pubkey),
    /// UTF-8 bytes, no length prefix
    Utf8(String),
    U8(u8),
    /// Little-endian
    U16(u16),
    /// Little-endian
    U32(u32),
    /// Little-endian
    U64(u64),
    /// Passed through unchanged
    Raw(Vec<u8>),
}

impl Seed {
    pub fn utf8(s: impl Into<String>) -> Self {
        Seed::Utf8(s.into())
    }

    /// Canonical byte encoding of this seed
    pub fn encode(&self) -> Vec<u8> {
        match self {
            Seed::PublicKey(key) => key.to_bytes().to_vec(),
            Seed::Utf8(s) => s.as_bytes().to_vec(),
            Seed::U8(v) => vec![*v],
            Seed::U16(v) => v.to_le_bytes().to_vec(),
            Seed::U32(v) => v.to_le_bytes().to_vec(),
            Seed::U64(v) => v.to_le_bytes().to_vec(),
            Seed::Raw(bytes) => bytes.clone(),
        }
    }

    /// Convert the codec value at seed position `index`
    pub fn from_value(index: usize, value: &Value) -> TokrResult<Self> {
        match value {
            Value::PublicKey(key) => Ok(Seed::PublicKey(*key)),
            Value::String(s) => Ok(Seed::Utf8(s.clone())),
            Value::U8(v) => Ok(Seed::U8(*v)),
            Value::U16(v) => Ok(Seed::U16(*v)),
            Value::U32(v) => Ok(Seed::U32(*v)),
            Value::U64(v) => Ok(Seed::U64(*v)),
            Value::Bytes(bytes) | Value::FixedBytes(bytes) => Ok(Seed::Raw(bytes.clone())),
            other => Err(TokrError::InvalidSeedKind {
                index,
                kind: other.kind(),
            }),
        }
    }
}

impl TryFrom<&Value> for Seed {
    type Error = TokrError;

    fn try_from(value: &Value) -> TokrResult<Self> {
        Seed::from_value(0, value)
    }
}

impl From<Pubkey> for Seed {
    fn from(key: Pubkey) -> Self {
        Seed::PublicKey(key)
    }
}

impl From<&Pubkey> for Seed {
    fn from(key: &Pubkey) -> Self {
        Seed::PublicKey(*key)
    }
}

impl From<&str> for Seed {
    fn from(s: &str) -> Self {
        Seed::Utf8(s.to_string())
    }
}

impl From<u8> for Seed {
    fn from(v: u8) -> Self {
        Seed::U8(v)
    }
}

impl From<u16> for Seed {
    fn from(v: u16) -> Self {
        Seed::U16(v)
    }
}

impl From<u32> for Seed {
    fn from(v: u32) -> Self {
        Seed::U32(v)
    }
}

impl From<u64> for Seed {
    fn from(v: u64) -> Self {
        Seed::U64(v)
    }
}

/// Convert an ordered list of codec values into seeds, reporting the first bad position
pub fn seeds_from_values(values: &[Value]) -> TokrResult<Vec<Seed>> {
    values
        .iter()
        .enumerate()
        .map(|(index, value)| Seed::from_value(index, value))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::ArgumentRecord;

    #[test]
    fn test_seed_encodings() {
        let key = Pubkey::new_unique();
        assert_eq!(Seed::from(key).encode(), key.to_bytes().to_vec());
        assert_eq!(Seed::utf8("identity").encode(), b"identity".to_vec());
        assert_eq!(Seed::U8(7).encode(), vec![7]);
        assert_eq!(Seed::U16(0x0102).encode(), vec![0x02, 0x01]);
        assert_eq!(Seed::U32(3).encode(), vec![3, 0, 0, 0]);
        assert_eq!(Seed::U64(1).encode(), vec![1, 0, 0, 0, 0, 0, 0, 0]);
        assert_eq!(Seed::Raw(vec![9, 9]).encode(), vec![9, 9]);
    }

    #[test]
    fn test_value_conversion() {
        let key = Pubkey::new_unique();
        let seeds =
            seeds_from_values(&[Value::from("governance"), Value::from(key), Value::U32(4)])
                .unwrap();
        assert_eq!(
            seeds,
            vec![Seed::utf8("governance"), Seed::PublicKey(key), Seed::U32(4)]
        );
    }

    #[test]
    fn test_invalid_seed_kind_names_position() {
        let values = [
            Value::from("list"),
            Value::Bool(true),
            Value::Record(ArgumentRecord::new()),
        ];
        match seeds_from_values(&values) {
            Err(TokrError::InvalidSeedKind { index, kind }) => {
                assert_eq!(index, 1);
                assert_eq!(kind, "bool");
            }
            other => panic!("expected InvalidSeedKind, got {:?}", other),
        }

        assert!(Seed::try_from(&Value::Option(None)).is_err());
        assert!(Seed::try_from(&Value::I64(-1)).is_err());
    }
}
