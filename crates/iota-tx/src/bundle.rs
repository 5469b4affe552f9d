//! Bundle construction and finalization.
//!
//! A bundle collects the transactions of one transfer. `finalize` assigns
//! indices, hashes the joined essence with Kerl, and repeats with an
//! incremented obsolete tag until the normalized hash is free of the
//! insecure maximum value. After finalization the bundle is immutable
//! except for signature-fragment placement.

use crate::transaction::Transaction;
use crate::TxError;
use iota_crypto::{sign, Kerl, Sponge};
use iota_types::constants::{FRAGMENT_TRYTES, HASH_TRITS};
use iota_types::ternary::{self, trits_to_trytes};
use iota_types::{Address, Hash, Iota, Tag};
use tracing::{debug, warn};

/// Upper bound on obsolete-tag attempts before finalization gives up.
const MAX_TAG_ATTEMPTS: u64 = 1_000_000;

/// Attempt count past which finalization starts complaining; empirically the
/// loop resolves within a handful of iterations.
const TAG_ATTEMPT_WARN: u64 = 81;

#[derive(Debug, Default)]
pub struct Bundle {
    transactions: Vec<Transaction>,
    finalized: bool,
}

impl Bundle {
    pub fn new() -> Self {
        Bundle::default()
    }

    pub fn len(&self) -> usize {
        self.transactions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.transactions.is_empty()
    }

    pub fn is_finalized(&self) -> bool {
        self.finalized
    }

    pub fn transactions(&self) -> &[Transaction] {
        &self.transactions
    }

    /// The accepted bundle hash. Available once finalized.
    pub fn hash(&self) -> Result<&Hash, TxError> {
        if !self.finalized {
            return Err(TxError::NotFinalized);
        }
        Ok(self.transactions[0].bundle_hash())
    }

    /// Append `fragment_count` transactions for one transfer entry. Only the
    /// first carries the value; the rest are zero-value carriers for
    /// additional signature or message fragments at the same address.
    pub fn add_entry(
        &mut self,
        fragment_count: usize,
        address: Address,
        value: Iota,
        tag: &Tag,
        timestamp: i64,
    ) -> Result<(), TxError> {
        if self.finalized {
            return Err(TxError::AlreadyFinalized);
        }
        for i in 0..fragment_count.max(1) {
            let entry_value = if i == 0 { value.clone() } else { Iota::zero() };
            self.transactions.push(Transaction::new(
                address.clone(),
                entry_value,
                tag.clone(),
                timestamp,
            ));
        }
        Ok(())
    }

    /// Place message fragments into the transactions in order; transactions
    /// beyond the provided fragments keep their empty payload.
    pub fn add_signature_message_fragments(
        &mut self,
        fragments: &[String],
    ) -> Result<(), TxError> {
        for (tx, fragment) in self.transactions.iter_mut().zip(fragments.iter()) {
            let mut padded = fragment.clone();
            if padded.len() > FRAGMENT_TRYTES {
                return Err(TxError::FragmentLength(padded.len()));
            }
            while padded.len() < FRAGMENT_TRYTES {
                padded.push('9');
            }
            tx.set_signature_message_fragment(padded)?;
        }
        Ok(())
    }

    /// Overwrite the signature fragment of one transaction. Used by the
    /// signing pass and the MAC stamper; allowed after finalization since
    /// fragments are not part of the essence.
    pub fn set_signature_fragment(
        &mut self,
        index: usize,
        fragment: String,
    ) -> Result<(), TxError> {
        let tx = self
            .transactions
            .get_mut(index)
            .ok_or(TxError::IndexOutOfBounds(index))?;
        tx.set_signature_message_fragment(fragment)
    }

    /// Assign indices and compute the bundle hash, incrementing the first
    /// transaction's obsolete tag until the normalized hash carries no
    /// insecure value.
    pub fn finalize(&mut self) -> Result<Hash, TxError> {
        if self.finalized {
            return Err(TxError::AlreadyFinalized);
        }
        if self.transactions.is_empty() {
            return Err(TxError::EmptyBundle);
        }

        let last_index = (self.transactions.len() - 1) as u64;
        for (i, tx) in self.transactions.iter_mut().enumerate() {
            tx.set_indices(i as u64, last_index);
        }

        let mut attempts = 0u64;
        let hash = loop {
            let candidate = self.essence_hash()?;
            if !sign::has_insecure_value(&sign::normalize(&candidate)) {
                break candidate;
            }

            attempts += 1;
            if attempts >= MAX_TAG_ATTEMPTS {
                return Err(TxError::BundleInvalid(format!(
                    "no secure bundle hash after {} obsolete-tag increments",
                    attempts
                )));
            }
            if attempts == TAG_ATTEMPT_WARN {
                warn!(attempts, "obsolete-tag search is running long");
            }

            let mut tag_trits = self.transactions[0].obsolete_tag().to_trits();
            ternary::increment(&mut tag_trits);
            self.transactions[0].set_obsolete_tag(Tag::new(&trits_to_trytes(&tag_trits)?)?);
        };

        debug!(attempts, bundle = %hash, "bundle finalized");
        for tx in &mut self.transactions {
            tx.set_bundle_hash(hash.clone());
        }
        self.finalized = true;
        Ok(hash)
    }

    fn essence_hash(&self) -> Result<Hash, TxError> {
        let mut kerl = Kerl::new();
        for tx in &self.transactions {
            kerl.absorb(&tx.essence_trits()?)?;
        }
        Ok(Hash::new(&trits_to_trytes(&kerl.squeeze(HASH_TRITS)?)?)?)
    }

    /// Check the invariants a finalized bundle must satisfy: values sum to
    /// zero, indices chain, every transaction commits to the recomputed
    /// bundle hash, and the normalized hash carries no insecure value.
    pub fn validate(&self) -> Result<(), TxError> {
        if !self.finalized {
            return Err(TxError::NotFinalized);
        }

        let total: Iota = self.transactions.iter().map(|tx| tx.value()).sum();
        if !total.is_zero() {
            return Err(TxError::BundleInvalid(format!(
                "values sum to {}, expected 0",
                total
            )));
        }

        let last_index = (self.transactions.len() - 1) as u64;
        for (i, tx) in self.transactions.iter().enumerate() {
            if tx.current_index() != i as u64 || tx.last_index() != last_index {
                return Err(TxError::BundleInvalid(format!(
                    "transaction {} carries indices {}/{}",
                    i,
                    tx.current_index(),
                    tx.last_index()
                )));
            }
        }

        let expected = self.essence_hash()?;
        for tx in &self.transactions {
            if tx.bundle_hash() != &expected {
                return Err(TxError::BundleInvalid("bundle hash mismatch".to_string()));
            }
        }

        if sign::has_insecure_value(&sign::normalize(&expected)) {
            return Err(TxError::BundleInvalid(
                "normalized bundle hash contains an insecure value".to_string(),
            ));
        }
        Ok(())
    }

    /// Verify the signatures of every input in the bundle: each negative
    /// value transaction plus the zero-value carriers that follow at the
    /// same address.
    pub fn validate_signatures(&self) -> Result<(), TxError> {
        let bundle_hash = self.hash()?.clone();
        let mut index = 0;
        while index < self.transactions.len() {
            let tx = &self.transactions[index];
            if !tx.value().is_negative() {
                index += 1;
                continue;
            }

            let address = tx.address().clone();
            let mut fragments =
                vec![tx.signature_message_fragment().to_string()];
            let mut next = index + 1;
            while next < self.transactions.len()
                && self.transactions[next].address() == &address
                && self.transactions[next].value().is_zero()
            {
                fragments.push(self.transactions[next].signature_message_fragment().to_string());
                next += 1;
            }

            if !sign::verify_signatures(&address, &fragments, &bundle_hash)? {
                return Err(TxError::BundleInvalid(format!(
                    "invalid signature for input at transaction {}",
                    index
                )));
            }
            index = next;
        }
        Ok(())
    }

    /// Serialize every transaction, in bundle order.
    pub fn to_trytes(&self) -> Result<Vec<String>, TxError> {
        self.transactions.iter().map(|tx| tx.to_trytes()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn address(fill: char) -> Address {
        Address::new(&fill.to_string().repeat(81)).unwrap()
    }

    fn finalized_zero_bundle() -> Bundle {
        let mut bundle = Bundle::new();
        bundle
            .add_entry(1, address('A'), Iota::zero(), &Tag::new("TEST").unwrap(), 1_700_000_000)
            .unwrap();
        bundle.finalize().unwrap();
        bundle
    }

    #[test]
    fn test_add_entry_splits_value() {
        let mut bundle = Bundle::new();
        bundle
            .add_entry(3, address('A'), Iota::from(100), &Tag::empty(), 0)
            .unwrap();
        assert_eq!(bundle.len(), 3);
        assert_eq!(bundle.transactions()[0].value(), &Iota::from(100));
        assert!(bundle.transactions()[1].value().is_zero());
        assert!(bundle.transactions()[2].value().is_zero());
    }

    #[test]
    fn test_finalize_assigns_indices_and_hash() {
        let mut bundle = Bundle::new();
        bundle
            .add_entry(2, address('B'), Iota::zero(), &Tag::empty(), 5)
            .unwrap();
        let hash = bundle.finalize().unwrap();

        for (i, tx) in bundle.transactions().iter().enumerate() {
            assert_eq!(tx.current_index(), i as u64);
            assert_eq!(tx.last_index(), 1);
            assert_eq!(tx.bundle_hash(), &hash);
        }
        assert!(bundle.is_finalized());
    }

    #[test]
    fn test_finalize_is_reproducible() {
        let build = || {
            let mut bundle = Bundle::new();
            bundle
                .add_entry(1, address('C'), Iota::zero(), &Tag::new("SAME").unwrap(), 99)
                .unwrap();
            bundle.finalize().unwrap()
        };
        assert_eq!(build(), build());
    }

    #[test]
    fn test_identical_essence_identical_hash() {
        let mut a = Bundle::new();
        let mut b = Bundle::new();
        for bundle in [&mut a, &mut b] {
            bundle
                .add_entry(2, address('D'), Iota::from(7), &Tag::empty(), 1)
                .unwrap();
            bundle
                .add_entry(1, address('E'), Iota::from(-7), &Tag::empty(), 1)
                .unwrap();
        }
        assert_eq!(a.finalize().unwrap(), b.finalize().unwrap());
    }

    #[test]
    fn test_finalized_hash_is_secure() {
        for seed_char in ['F', 'G', 'H', 'I', 'J'] {
            let mut bundle = Bundle::new();
            bundle
                .add_entry(1, address(seed_char), Iota::zero(), &Tag::empty(), 7)
                .unwrap();
            let hash = bundle.finalize().unwrap();
            assert!(!sign::has_insecure_value(&sign::normalize(&hash)));
            bundle.validate().unwrap();
        }
    }

    #[test]
    fn test_finalize_terminates_on_varied_inputs() {
        // Many distinct essences; each must settle on a secure hash.
        for ts in 0..40 {
            let mut bundle = Bundle::new();
            bundle
                .add_entry(1, address('K'), Iota::zero(), &Tag::empty(), ts)
                .unwrap();
            bundle.finalize().unwrap();
            bundle.validate().unwrap();
        }
    }

    #[test]
    fn test_double_finalize_rejected() {
        let mut bundle = finalized_zero_bundle();
        assert!(matches!(bundle.finalize(), Err(TxError::AlreadyFinalized)));
    }

    #[test]
    fn test_empty_bundle_rejected() {
        assert!(matches!(Bundle::new().finalize(), Err(TxError::EmptyBundle)));
    }

    #[test]
    fn test_validate_detects_unbalanced_values() {
        let mut bundle = Bundle::new();
        bundle
            .add_entry(1, address('L'), Iota::from(10), &Tag::empty(), 0)
            .unwrap();
        bundle.finalize().unwrap();
        assert!(matches!(bundle.validate(), Err(TxError::BundleInvalid(_))));
    }

    #[test]
    fn test_message_fragments_are_padded() {
        let mut bundle = Bundle::new();
        bundle
            .add_entry(2, address('M'), Iota::zero(), &Tag::empty(), 0)
            .unwrap();
        bundle
            .add_signature_message_fragments(&["HELLO9WORLD".to_string()])
            .unwrap();
        let fragment = bundle.transactions()[0].signature_message_fragment();
        assert!(fragment.starts_with("HELLO9WORLD9"));
        assert_eq!(fragment.len(), FRAGMENT_TRYTES);
    }

    #[test]
    fn test_to_trytes_preserves_order() {
        let bundle = finalized_zero_bundle();
        let trytes = bundle.to_trytes().unwrap();
        assert_eq!(trytes.len(), 1);
        let parsed = Transaction::from_trytes(&trytes[0]).unwrap();
        assert_eq!(parsed.bundle_hash(), bundle.hash().unwrap());
    }
}
