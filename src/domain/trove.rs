//! Trove identifiers: derivation from (owner, index) and the `collIndex:troveId` key.

use super::{Address, CollIndex, CollateralCatalog, ValidationError};
use num_bigint::BigUint;
use serde::{Serialize, Serializer};
use sha3::{Digest, Keccak256};
use std::fmt;
use std::str::FromStr;

/// 256-bit trove identifier.
///
/// Textual form is `0x` + lowercase hex without leading zeros (`0x0` for zero).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TroveId(BigUint);

impl TroveId {
    pub fn from_biguint(value: BigUint) -> Result<Self, ValidationError> {
        if value.bits() > 256 {
            return Err(ValidationError::InvalidTroveId(format!("{:#x}", value)));
        }
        Ok(TroveId(value))
    }

    pub fn as_biguint(&self) -> &BigUint {
        &self.0
    }

    /// Big-endian 32-byte word, as used in contract call arguments.
    pub fn to_word(&self) -> [u8; 32] {
        uint_word(&self.0).unwrap_or_default()
    }
}

/// Big-endian ABI `uint256` word, `None` if `value` needs more than 256 bits.
pub fn uint_word(value: &BigUint) -> Option<[u8; 32]> {
    if value.bits() > 256 {
        return None;
    }
    let bytes = value.to_bytes_be();
    let mut word = [0u8; 32];
    word[32 - bytes.len()..].copy_from_slice(&bytes);
    Some(word)
}

impl fmt::Display for TroveId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#x}", self.0)
    }
}

impl FromStr for TroveId {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = || ValidationError::InvalidTroveId(s.to_string());
        let digits = s.strip_prefix("0x").ok_or_else(err)?;
        let well_formed = !digits.is_empty()
            && digits.len() <= 64
            && digits.bytes().all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f'))
            && (digits == "0" || !digits.starts_with('0'));
        if !well_formed {
            return Err(err());
        }
        BigUint::parse_bytes(digits.as_bytes(), 16)
            .map(TroveId)
            .ok_or_else(err)
    }
}

impl Serialize for TroveId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// keccak256(abi.encode(owner, ownerIndex)) read as an unsigned integer.
///
/// # Errors
/// `InvalidOwnerIndex` when `owner_index` does not fit a `uint256`.
pub fn compute_trove_id(owner: &Address, owner_index: &BigUint) -> Result<TroveId, ValidationError> {
    let index_word = uint_word(owner_index)
        .ok_or_else(|| ValidationError::InvalidOwnerIndex(owner_index.to_string()))?;

    let mut encoded = [0u8; 64];
    encoded[12..32].copy_from_slice(owner.as_bytes());
    encoded[32..].copy_from_slice(&index_word);
    let digest = Keccak256::digest(encoded);
    TroveId::from_biguint(BigUint::from_bytes_be(&digest))
}

/// Abbreviate an id for display: first `chars + 2` characters followed by an ellipsis.
pub fn shorten_trove_id(trove_id: &str, chars: usize) -> String {
    if trove_id.chars().count() < chars * 2 + 2 {
        return trove_id.to_string();
    }
    let head: String = trove_id.chars().take(chars + 2).collect();
    format!("{}…", head)
}

/// Block explorer page of the NFT that represents a trove.
pub fn trove_nft_url(explorer_url: &str, trove_nft: &Address, trove_id: &TroveId) -> String {
    format!("{}nft/{}/{}", explorer_url, trove_nft, trove_id.as_biguint())
}

/// A trove id qualified by its collateral branch, written `"<collIndex>:<troveId>"`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PrefixedTroveId {
    pub coll_index: CollIndex,
    pub trove_id: TroveId,
}

impl PrefixedTroveId {
    pub fn new(coll_index: CollIndex, trove_id: TroveId) -> Self {
        Self {
            coll_index,
            trove_id,
        }
    }

    /// Parse and validate against the catalog.
    ///
    /// # Errors
    /// `InvalidPrefixedTroveId` carrying the raw input when either half is malformed
    /// or the collateral index is outside the catalog.
    pub fn parse(value: &str, catalog: &CollateralCatalog) -> Result<Self, ValidationError> {
        let err = || ValidationError::InvalidPrefixedTroveId(value.to_string());
        let (coll_part, trove_part) = value.split_once(':').ok_or_else(err)?;

        let raw_index = coll_part.parse::<i64>().map_err(|_| err())?;
        // Reject "+1" and "01" so that formatting reproduces the input exactly.
        if raw_index.to_string() != coll_part {
            return Err(err());
        }
        let coll_index = catalog.coll_index(raw_index).map_err(|_| err())?;
        let trove_id = TroveId::from_str(trove_part).map_err(|_| err())?;

        Ok(Self {
            coll_index,
            trove_id,
        })
    }
}

impl fmt::Display for PrefixedTroveId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.coll_index, self.trove_id)
    }
}

impl Serialize for PrefixedTroveId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn owner() -> Address {
        Address::from_str("0x1111111111111111111111111111111111111111").unwrap()
    }

    #[test]
    fn test_compute_trove_id_known_vector() {
        // keccak256 of 64 zero bytes
        let id = compute_trove_id(&Address::ZERO, &BigUint::from(0u32)).unwrap();
        assert_eq!(
            id.to_string(),
            "0xad3228b676f7d3cd4284a5443f17f1962b36e491b30a40b2405849e597ba5fb5"
        );
    }

    #[test]
    fn test_compute_trove_id_deterministic() {
        let id = |owner: &Address, index: u64| compute_trove_id(owner, &BigUint::from(index)).unwrap();
        let a = id(&owner(), 7);
        assert_eq!(a, id(&owner(), 7));
        assert_ne!(a, id(&owner(), 8));
        assert_ne!(a, id(&Address::ZERO, 7));
    }

    #[test]
    fn test_compute_trove_id_full_uint256_index() {
        let beyond_u64 = BigUint::from(u64::MAX) + 1u32;
        let wide = compute_trove_id(&owner(), &beyond_u64).unwrap();
        // 2^64 must not collide with the index it would wrap to.
        assert_ne!(wide, compute_trove_id(&owner(), &BigUint::from(0u32)).unwrap());

        let largest = (BigUint::from(1u32) << 256usize) - 1u32;
        assert!(compute_trove_id(&owner(), &largest).is_ok());

        let too_wide = BigUint::from(1u32) << 256usize;
        assert_eq!(
            compute_trove_id(&owner(), &too_wide),
            Err(ValidationError::InvalidOwnerIndex(too_wide.to_string()))
        );
    }

    #[test]
    fn test_uint_word_layout() {
        let word = uint_word(&(BigUint::from(1u32) << 64usize)).unwrap();
        assert_eq!(word[23], 0x01);
        assert!(word[..23].iter().all(|b| *b == 0));
        assert!(word[24..].iter().all(|b| *b == 0));
    }

    #[test]
    fn test_trove_id_text_form() {
        assert_eq!(TroveId::from_str("0x0").unwrap().to_string(), "0x0");
        assert_eq!(TroveId::from_str("0xabc").unwrap().to_string(), "0xabc");
        assert!(TroveId::from_str("0xABC").is_err());
        assert!(TroveId::from_str("0x0abc").is_err());
        assert!(TroveId::from_str("123").is_err());
        assert!(TroveId::from_str("0x").is_err());
        assert!(TroveId::from_str(&format!("0x1{}", "0".repeat(64))).is_err());
    }

    #[test]
    fn test_trove_id_word() {
        let id = TroveId::from_str("0x1ff").unwrap();
        let word = id.to_word();
        assert_eq!(word[30], 0x01);
        assert_eq!(word[31], 0xff);
        assert!(word[..30].iter().all(|b| *b == 0));
    }

    #[test]
    fn test_prefixed_roundtrip() {
        let catalog = CollateralCatalog::default();
        for s in ["0:0xabc", "2:0x1", "1:0x0"] {
            let parsed = PrefixedTroveId::parse(s, &catalog).unwrap();
            assert_eq!(parsed.to_string(), s);
        }

        let id = compute_trove_id(&owner(), &BigUint::from(0u32)).unwrap();
        let prefixed = PrefixedTroveId::new(catalog.coll_index(1).unwrap(), id);
        let reparsed = PrefixedTroveId::parse(&prefixed.to_string(), &catalog).unwrap();
        assert_eq!(reparsed, prefixed);
    }

    #[test]
    fn test_prefixed_rejects_malformed() {
        let catalog = CollateralCatalog::default();
        for s in ["0xabc", "x:0xabc", "3:0xabc", "-1:0xabc", "01:0xabc", "0:xyz", "0:", ":0x1"] {
            assert_eq!(
                PrefixedTroveId::parse(s, &catalog),
                Err(ValidationError::InvalidPrefixedTroveId(s.to_string())),
                "expected {} to be rejected",
                s
            );
        }
    }

    #[test]
    fn test_shorten_trove_id() {
        assert_eq!(shorten_trove_id("0xabc", 8), "0xabc");
        assert_eq!(
            shorten_trove_id("0x1234567890abcdef1234", 8),
            "0x12345678…"
        );
    }

    #[test]
    fn test_trove_nft_url_uses_decimal_id() {
        let nft = owner();
        let id = TroveId::from_str("0xff").unwrap();
        assert_eq!(
            trove_nft_url("https://etherscan.io/", &nft, &id),
            "https://etherscan.io/nft/0x1111111111111111111111111111111111111111/255"
        );
    }
}
