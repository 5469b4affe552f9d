//! The 2673-tryte transaction record.
//!
//! Fields live at fixed tryte offsets; signed integer fields are balanced
//! ternary at exact trit width. The transaction hash is the Kerl digest of
//! the full record and is computed lazily and cached until a field changes.

use crate::TxError;
use iota_crypto::{Kerl, Sponge};
use iota_types::constants::{
    FRAGMENT_TRYTES, HASH_TRITS, HASH_TRYTES, NONCE_TRYTES, TAG_TRYTES, TRANSACTION_TRYTES,
    TRITS_PER_TRYTE,
};
use iota_types::ternary::{int_to_trits, trits_to_int, trits_to_trytes, trytes_to_trits};
use iota_types::{Address, Hash, Iota, Tag};
use std::sync::OnceLock;

// Field layout, tryte offsets into the 2673-tryte record.
const SIGNATURE_OFFSET: usize = 0;
const ADDRESS_OFFSET: usize = 2187;
const VALUE_OFFSET: usize = 2268;
const OBSOLETE_TAG_OFFSET: usize = 2295;
const TIMESTAMP_OFFSET: usize = 2322;
const CURRENT_INDEX_OFFSET: usize = 2331;
const LAST_INDEX_OFFSET: usize = 2340;
const BUNDLE_OFFSET: usize = 2349;
const TRUNK_OFFSET: usize = 2430;
const BRANCH_OFFSET: usize = 2511;
const TAG_OFFSET: usize = 2592;
const ATTACHMENT_TS_OFFSET: usize = 2619;
const ATTACHMENT_LOWER_OFFSET: usize = 2628;
const ATTACHMENT_UPPER_OFFSET: usize = 2637;
const NONCE_OFFSET: usize = 2646;

const VALUE_TRYTES: usize = 27;
const COUNTER_TRYTES: usize = 9;

/// Trytes of essence per transaction: the fields covered by the bundle hash.
pub const ESSENCE_TRYTES: usize = 162;

/// One transaction of a bundle.
#[derive(Debug, Clone)]
pub struct Transaction {
    signature_message_fragment: String,
    address: Address,
    value: Iota,
    obsolete_tag: Tag,
    timestamp: i64,
    current_index: u64,
    last_index: u64,
    bundle_hash: Hash,
    trunk: Hash,
    branch: Hash,
    tag: Tag,
    attachment_timestamp: i64,
    attachment_timestamp_lower: i64,
    attachment_timestamp_upper: i64,
    nonce: String,
    hash: OnceLock<Hash>,
}

impl Transaction {
    /// A fresh, unattached transaction. Indices and references are set
    /// later, by bundle finalization and by the node respectively.
    pub fn new(address: Address, value: Iota, tag: Tag, timestamp: i64) -> Self {
        Transaction {
            signature_message_fragment: "9".repeat(FRAGMENT_TRYTES),
            address,
            value,
            obsolete_tag: tag.clone(),
            timestamp,
            current_index: 0,
            last_index: 0,
            bundle_hash: Hash::null(),
            trunk: Hash::null(),
            branch: Hash::null(),
            tag,
            attachment_timestamp: 0,
            attachment_timestamp_lower: 0,
            attachment_timestamp_upper: 0,
            nonce: "9".repeat(NONCE_TRYTES),
            hash: OnceLock::new(),
        }
    }

    // ── Accessors ────────────────────────────────────────────────────────

    pub fn signature_message_fragment(&self) -> &str {
        &self.signature_message_fragment
    }

    pub fn address(&self) -> &Address {
        &self.address
    }

    pub fn value(&self) -> &Iota {
        &self.value
    }

    pub fn obsolete_tag(&self) -> &Tag {
        &self.obsolete_tag
    }

    pub fn timestamp(&self) -> i64 {
        self.timestamp
    }

    pub fn current_index(&self) -> u64 {
        self.current_index
    }

    pub fn last_index(&self) -> u64 {
        self.last_index
    }

    pub fn bundle_hash(&self) -> &Hash {
        &self.bundle_hash
    }

    pub fn trunk(&self) -> &Hash {
        &self.trunk
    }

    pub fn branch(&self) -> &Hash {
        &self.branch
    }

    pub fn tag(&self) -> &Tag {
        &self.tag
    }

    pub fn nonce(&self) -> &str {
        &self.nonce
    }

    pub fn attachment_timestamp(&self) -> i64 {
        self.attachment_timestamp
    }

    // ── Mutators (invalidate the cached hash) ────────────────────────────

    pub fn set_signature_message_fragment(&mut self, fragment: String) -> Result<(), TxError> {
        if fragment.len() != FRAGMENT_TRYTES {
            return Err(TxError::FragmentLength(fragment.len()));
        }
        iota_types::ternary::validate_trytes(&fragment)?;
        self.signature_message_fragment = fragment;
        self.hash = OnceLock::new();
        Ok(())
    }

    pub(crate) fn set_obsolete_tag(&mut self, tag: Tag) {
        self.obsolete_tag = tag;
        self.hash = OnceLock::new();
    }

    pub(crate) fn set_indices(&mut self, current: u64, last: u64) {
        self.current_index = current;
        self.last_index = last;
        self.hash = OnceLock::new();
    }

    pub(crate) fn set_bundle_hash(&mut self, bundle: Hash) {
        self.bundle_hash = bundle;
        self.hash = OnceLock::new();
    }

    // ── Essence and hashing ──────────────────────────────────────────────

    /// The 486 essence trits covered by the bundle hash:
    /// `address || value || obsoleteTag || timestamp || currentIndex ||
    /// lastIndex`.
    pub fn essence_trits(&self) -> Result<Vec<i8>, TxError> {
        let mut trits = Vec::with_capacity(ESSENCE_TRYTES * TRITS_PER_TRYTE);
        trits.extend(self.address.to_trits());
        trits.extend(self.value.to_trits(VALUE_TRYTES * TRITS_PER_TRYTE)?);
        trits.extend(self.obsolete_tag.to_trits());
        trits.extend(int_to_trits(self.timestamp, COUNTER_TRYTES * TRITS_PER_TRYTE)?);
        trits.extend(int_to_trits(
            self.current_index as i64,
            COUNTER_TRYTES * TRITS_PER_TRYTE,
        )?);
        trits.extend(int_to_trits(
            self.last_index as i64,
            COUNTER_TRYTES * TRITS_PER_TRYTE,
        )?);
        Ok(trits)
    }

    /// The Kerl hash of the serialized transaction, cached until a field
    /// changes.
    pub fn hash(&self) -> Result<Hash, TxError> {
        if let Some(hash) = self.hash.get() {
            return Ok(hash.clone());
        }
        let trits = trytes_to_trits(&self.to_trytes()?)?;
        let mut kerl = Kerl::new();
        kerl.absorb(&trits)?;
        let hash = Hash::new(&trits_to_trytes(&kerl.squeeze(HASH_TRITS)?)?)?;
        Ok(self.hash.get_or_init(|| hash).clone())
    }

    /// Trailing zero trits of the transaction hash; what the node's
    /// proof-of-work achieved.
    pub fn weight_magnitude(&self) -> Result<usize, TxError> {
        let trits = self.hash()?.to_trits();
        Ok(trits.iter().rev().take_while(|&&t| t == 0).count())
    }

    // ── Wire codec ───────────────────────────────────────────────────────

    /// Serialize into the 2673-tryte wire record.
    pub fn to_trytes(&self) -> Result<String, TxError> {
        let mut out = String::with_capacity(TRANSACTION_TRYTES);
        out.push_str(&self.signature_message_fragment);
        out.push_str(self.address.as_trytes());
        out.push_str(&encode_int_field(&self.value, VALUE_TRYTES)?);
        out.push_str(self.obsolete_tag.as_trytes());
        out.push_str(&encode_counter(self.timestamp, "timestamp")?);
        out.push_str(&encode_counter(self.current_index as i64, "currentIndex")?);
        out.push_str(&encode_counter(self.last_index as i64, "lastIndex")?);
        out.push_str(self.bundle_hash.as_trytes());
        out.push_str(self.trunk.as_trytes());
        out.push_str(self.branch.as_trytes());
        out.push_str(self.tag.as_trytes());
        out.push_str(&encode_counter(self.attachment_timestamp, "attachmentTimestamp")?);
        out.push_str(&encode_counter(
            self.attachment_timestamp_lower,
            "attachmentTimestampLowerBound",
        )?);
        out.push_str(&encode_counter(
            self.attachment_timestamp_upper,
            "attachmentTimestampUpperBound",
        )?);
        out.push_str(&self.nonce);
        debug_assert_eq!(out.len(), TRANSACTION_TRYTES);
        Ok(out)
    }

    /// Parse a 2673-tryte wire record.
    pub fn from_trytes(trytes: &str) -> Result<Self, TxError> {
        if trytes.len() != TRANSACTION_TRYTES {
            return Err(TxError::TransactionLength(trytes.len()));
        }
        iota_types::ternary::validate_trytes(trytes)?;

        let field = |offset: usize, len: usize| &trytes[offset..offset + len];

        let value = Iota::from_trits(&trytes_to_trits(field(VALUE_OFFSET, VALUE_TRYTES))?);
        let current_index = decode_counter(field(CURRENT_INDEX_OFFSET, COUNTER_TRYTES))?;
        let last_index = decode_counter(field(LAST_INDEX_OFFSET, COUNTER_TRYTES))?;
        if current_index < 0 || last_index < 0 || current_index > last_index {
            return Err(TxError::FieldRange {
                field: "currentIndex/lastIndex",
            });
        }

        Ok(Transaction {
            signature_message_fragment: field(SIGNATURE_OFFSET, FRAGMENT_TRYTES).to_string(),
            address: Address::new(field(ADDRESS_OFFSET, HASH_TRYTES))?,
            value,
            obsolete_tag: Tag::new(field(OBSOLETE_TAG_OFFSET, TAG_TRYTES))?,
            timestamp: decode_counter(field(TIMESTAMP_OFFSET, COUNTER_TRYTES))?,
            current_index: current_index as u64,
            last_index: last_index as u64,
            bundle_hash: Hash::new(field(BUNDLE_OFFSET, HASH_TRYTES))?,
            trunk: Hash::new(field(TRUNK_OFFSET, HASH_TRYTES))?,
            branch: Hash::new(field(BRANCH_OFFSET, HASH_TRYTES))?,
            tag: Tag::new(field(TAG_OFFSET, TAG_TRYTES))?,
            attachment_timestamp: decode_counter(field(ATTACHMENT_TS_OFFSET, COUNTER_TRYTES))?,
            attachment_timestamp_lower: decode_counter(field(
                ATTACHMENT_LOWER_OFFSET,
                COUNTER_TRYTES,
            ))?,
            attachment_timestamp_upper: decode_counter(field(
                ATTACHMENT_UPPER_OFFSET,
                COUNTER_TRYTES,
            ))?,
            nonce: field(NONCE_OFFSET, NONCE_TRYTES).to_string(),
            hash: OnceLock::new(),
        })
    }
}

fn encode_int_field(value: &Iota, trytes: usize) -> Result<String, TxError> {
    Ok(trits_to_trytes(&value.to_trits(trytes * TRITS_PER_TRYTE)?)?)
}

fn encode_counter(value: i64, field: &'static str) -> Result<String, TxError> {
    let trits = int_to_trits(value, COUNTER_TRYTES * TRITS_PER_TRYTE)
        .map_err(|_| TxError::FieldRange { field })?;
    Ok(trits_to_trytes(&trits)?)
}

fn decode_counter(trytes: &str) -> Result<i64, TxError> {
    Ok(trits_to_int(&trytes_to_trits(trytes)?)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Transaction {
        Transaction::new(
            Address::new(&"D".repeat(81)).unwrap(),
            Iota::from(42),
            Tag::new("SAMPLE").unwrap(),
            1_700_000_000,
        )
    }

    #[test]
    fn test_serialized_width() {
        assert_eq!(sample().to_trytes().unwrap().len(), TRANSACTION_TRYTES);
    }

    #[test]
    fn test_wire_round_trip() {
        let mut tx = sample();
        tx.set_indices(1, 3);
        tx.set_bundle_hash(Hash::new(&"E".repeat(81)).unwrap());
        let trytes = tx.to_trytes().unwrap();

        let parsed = Transaction::from_trytes(&trytes).unwrap();
        assert_eq!(parsed.address(), tx.address());
        assert_eq!(parsed.value(), &Iota::from(42));
        assert_eq!(parsed.timestamp(), 1_700_000_000);
        assert_eq!(parsed.current_index(), 1);
        assert_eq!(parsed.last_index(), 3);
        assert_eq!(parsed.bundle_hash(), tx.bundle_hash());
        assert_eq!(parsed.to_trytes().unwrap(), trytes);
    }

    #[test]
    fn test_negative_value_round_trip() {
        let mut tx = sample();
        tx.value = Iota::from(-250);
        let parsed = Transaction::from_trytes(&tx.to_trytes().unwrap()).unwrap();
        assert_eq!(parsed.value(), &Iota::from(-250));
    }

    #[test]
    fn test_from_trytes_rejects_bad_length() {
        assert!(matches!(
            Transaction::from_trytes("ABC"),
            Err(TxError::TransactionLength(3))
        ));
    }

    #[test]
    fn test_from_trytes_rejects_bad_alphabet() {
        let bad = "a".repeat(TRANSACTION_TRYTES);
        assert!(Transaction::from_trytes(&bad).is_err());
    }

    #[test]
    fn test_hash_is_cached_and_invalidated() {
        let mut tx = sample();
        let first = tx.hash().unwrap();
        assert_eq!(tx.hash().unwrap(), first);

        tx.set_indices(0, 1);
        let second = tx.hash().unwrap();
        assert_ne!(first, second);
    }

    #[test]
    fn test_essence_width() {
        let mut tx = sample();
        tx.set_indices(0, 0);
        assert_eq!(tx.essence_trits().unwrap().len(), ESSENCE_TRYTES * 3);
    }

    #[test]
    fn test_fragment_setter_enforces_width() {
        let mut tx = sample();
        assert!(tx
            .set_signature_message_fragment("9".repeat(FRAGMENT_TRYTES))
            .is_ok());
        assert!(matches!(
            tx.set_signature_message_fragment("9".repeat(10)),
            Err(TxError::FragmentLength(10))
        ));
    }

    #[test]
    fn test_weight_magnitude_counts_trailing_zeros() {
        let tx = sample();
        let trits = tx.hash().unwrap().to_trits();
        let expected = trits.iter().rev().take_while(|&&t| t == 0).count();
        assert_eq!(tx.weight_magnitude().unwrap(), expected);
    }
}
