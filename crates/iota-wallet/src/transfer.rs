//! The transfer pipeline.
//!
//! `send_transfer` runs the whole flow: prepare output entries, select
//! inputs and place the remainder, finalize the bundle, sign every input
//! across its adjacent transactions, optionally stamp value transactions
//! with a MAC, and hand the serialized bundle to the node for
//! proof-of-work and broadcast.

use crate::error::WalletError;
use crate::wallet::Wallet;
use iota_crypto::{hmac, key, sign, HmacKey};
use iota_rpc::{TangleNode, DEFAULT_BALANCE_THRESHOLD};
use iota_tx::{Bundle, Transaction, TxError};
use iota_types::constants::{FRAGMENT_TRYTES, HASH_TRYTES};
use iota_types::ternary::{self, trits_to_trytes};
use iota_types::{Address, AmountError, Hash, Iota, SecurityLevel, Tag};
use std::time::{SystemTime, UNIX_EPOCH};
use tracing::{debug, info};

/// One requested payment: recipient (81 or 90 trytes), value, and an
/// optional message and tag.
#[derive(Debug, Clone)]
pub struct Transfer {
    pub recipient: String,
    pub value: Iota,
    pub message: String,
    pub tag: Tag,
}

impl Transfer {
    pub fn new(recipient: &str, value: Iota) -> Self {
        Transfer {
            recipient: recipient.to_string(),
            value,
            message: String::new(),
            tag: Tag::empty(),
        }
    }

    pub fn with_message(mut self, message: &str) -> Self {
        self.message = message.to_string();
        self
    }

    pub fn with_tag(mut self, tag: Tag) -> Self {
        self.tag = tag;
        self
    }
}

/// A spendable address with its confirmed balance and key provenance.
#[derive(Debug, Clone)]
pub struct Input {
    pub address: Address,
    pub balance: Iota,
    pub key_index: u32,
    pub security: SecurityLevel,
}

/// Knobs for one `send_transfer` invocation.
#[derive(Debug, Default, Clone)]
pub struct SendOptions {
    /// Tip-selection depth passed to the node.
    pub depth: u32,
    /// Minimum weight magnitude for the node's proof-of-work.
    pub min_weight_magnitude: u32,
    /// Pre-selected inputs; when absent, the wallet scans for them.
    pub inputs: Option<Vec<Input>>,
    /// Where the remainder goes; when absent, a fresh address is derived.
    pub remainder_address: Option<Address>,
    /// MAC key; when set, value transactions are stamped.
    pub hmac_key: Option<HmacKey>,
    /// Transaction to reference during tip selection.
    pub reference: Option<Hash>,
    /// Timestamp override; defaults to the current time.
    pub timestamp: Option<i64>,
}

impl SendOptions {
    pub fn with_depth(mut self, depth: u32) -> Self {
        self.depth = depth;
        self
    }

    pub fn with_min_weight_magnitude(mut self, mwm: u32) -> Self {
        self.min_weight_magnitude = mwm;
        self
    }

    pub fn with_inputs(mut self, inputs: Vec<Input>) -> Self {
        self.inputs = Some(inputs);
        self
    }

    pub fn with_remainder_address(mut self, address: Address) -> Self {
        self.remainder_address = Some(address);
        self
    }

    pub fn with_hmac_key(mut self, key: HmacKey) -> Self {
        self.hmac_key = Some(key);
        self
    }
}

/// Result of a submitted transfer.
#[derive(Debug)]
pub struct SentBundle {
    /// The bundle as prepared and signed locally.
    pub bundle: Bundle,
    /// Tip references the bundle was attached to.
    pub trunk: Hash,
    pub branch: Hash,
    /// The attached transactions as returned by the node, nonces set.
    pub transactions: Vec<Transaction>,
}

impl<N: TangleNode> Wallet<N> {
    /// Prepare, sign, and submit a transfer. Returns the local bundle plus
    /// the attached transactions.
    pub async fn send_transfer(
        &self,
        transfers: &[Transfer],
        options: &SendOptions,
    ) -> Result<SentBundle, WalletError> {
        let bundle = self.prepare_transfers(transfers, options).await?;

        // The node expects the bundle tail-first.
        let mut trytes = bundle.to_trytes()?;
        trytes.reverse();

        info!(transactions = bundle.len(), bundle = %bundle.hash()?, "submitting bundle");
        let (trunk, branch, transactions) = self
            .send_trytes(
                trytes,
                options.depth,
                options.min_weight_magnitude,
                options.reference.clone(),
            )
            .await?;

        Ok(SentBundle {
            bundle,
            trunk,
            branch,
            transactions,
        })
    }

    /// Build and sign a bundle for the given transfers without submitting
    /// it. The returned bundle is finalized and validated.
    pub async fn prepare_transfers(
        &self,
        transfers: &[Transfer],
        options: &SendOptions,
    ) -> Result<Bundle, WalletError> {
        if transfers.is_empty() {
            return Err(WalletError::NoTransfers);
        }

        let timestamp = options.timestamp.unwrap_or_else(now_seconds);
        let mut bundle = Bundle::new();
        let mut fragments: Vec<String> = Vec::new();
        let mut total = Iota::zero();
        let mut bundle_tag = Tag::empty();

        for transfer in transfers {
            if transfer.value.is_negative() {
                return Err(AmountError::Negative.into());
            }
            let recipient = key::parse_address(&transfer.recipient)?;

            let mut message = transfer.message.clone();
            ternary::validate_trytes(&message)?;
            if options.hmac_key.is_some() && transfer.value.is_positive() {
                // Reserve the stamp's 81 leading trytes.
                message.insert_str(0, &"9".repeat(HASH_TRYTES));
            }

            let fragment_count = message.len().div_ceil(FRAGMENT_TRYTES).max(1);
            for i in 0..fragment_count {
                let start = i * FRAGMENT_TRYTES;
                let end = (start + FRAGMENT_TRYTES).min(message.len());
                fragments.push(message[start..end].to_string());
            }

            bundle_tag = transfer.tag.clone();
            bundle.add_entry(
                fragment_count,
                recipient,
                transfer.value.clone(),
                &transfer.tag,
                timestamp,
            )?;
            total += &transfer.value;
        }

        let inputs = if total.is_positive() {
            let (inputs, gathered) = match &options.inputs {
                Some(provided) => self.confirm_inputs(provided, &total).await?,
                None => self.get_inputs(0, &total).await?,
            };
            self.add_inputs_and_remainder(
                &mut bundle,
                &inputs,
                &gathered,
                &total,
                &bundle_tag,
                timestamp,
                options,
            )
            .await?;
            inputs
        } else {
            Vec::new()
        };

        bundle.finalize()?;
        bundle.add_signature_message_fragments(&fragments)?;

        if !inputs.is_empty() {
            self.sign_inputs(&mut bundle, &inputs)?;
        }
        if let Some(mac_key) = &options.hmac_key {
            apply_hmac(&mut bundle, mac_key)?;
        }

        bundle.validate()?;
        if !inputs.is_empty() {
            bundle.validate_signatures()?;
        }
        Ok(bundle)
    }

    /// Re-check provided inputs against the node and keep the prefix whose
    /// balances cover `needed`.
    async fn confirm_inputs(
        &self,
        provided: &[Input],
        needed: &Iota,
    ) -> Result<(Vec<Input>, Iota), WalletError> {
        let strings = provided
            .iter()
            .map(|input| input.address.as_trytes().to_string())
            .collect();
        let response = self
            .node()
            .get_balances(strings, DEFAULT_BALANCE_THRESHOLD)
            .await?;

        let mut chosen = Vec::new();
        let mut total = Iota::zero();
        for (input, balance_str) in provided.iter().zip(&response.balances) {
            let balance: Iota = balance_str.parse()?;
            if !balance.is_positive() {
                continue;
            }
            total += &balance;
            chosen.push(Input {
                balance,
                ..input.clone()
            });
            if &total >= needed {
                return Ok((chosen, total));
            }
        }

        Err(WalletError::NotEnoughBalance {
            needed: needed.clone(),
            available: total,
        })
    }

    #[allow(clippy::too_many_arguments)]
    async fn add_inputs_and_remainder(
        &self,
        bundle: &mut Bundle,
        inputs: &[Input],
        gathered: &Iota,
        needed: &Iota,
        tag: &Tag,
        timestamp: i64,
        options: &SendOptions,
    ) -> Result<(), WalletError> {
        for input in inputs {
            bundle.add_entry(
                input.security.fragments(),
                input.address.clone(),
                -&input.balance,
                tag,
                timestamp,
            )?;
        }

        let remainder = gathered - needed;
        if remainder.is_positive() {
            let remainder_address = match &options.remainder_address {
                Some(address) => address.clone(),
                None => {
                    let next_index = inputs
                        .iter()
                        .map(|input| input.key_index)
                        .max()
                        .unwrap_or(0)
                        .saturating_add(1);
                    self.new_address(next_index).await?
                }
            };
            debug!(remainder = %remainder, "placing remainder");
            bundle.add_entry(1, remainder_address, remainder, tag, timestamp)?;
        }
        Ok(())
    }

    /// Sign every spending transaction: each input's key covers `security`
    /// consecutive transactions at its address, one normalized-hash fragment
    /// each, in order and never interleaved.
    fn sign_inputs(&self, bundle: &mut Bundle, inputs: &[Input]) -> Result<(), WalletError> {
        let bundle_hash = bundle.hash()?.clone();
        let normalized = sign::normalize(&bundle_hash);

        let mut index = 0;
        while index < bundle.len() {
            let tx = &bundle.transactions()[index];
            if !tx.value().is_negative() {
                index += 1;
                continue;
            }

            let address = tx.address().clone();
            let input = inputs
                .iter()
                .find(|input| input.address == address)
                .ok_or(WalletError::UnknownInput(index))?;
            let private = key::key(self.seed(), input.key_index, input.security)?;

            for j in 0..input.security.fragments() {
                let target = index + j;
                match bundle.transactions().get(target) {
                    Some(tx) if j == 0 || (tx.address() == &address && tx.value().is_zero()) => {}
                    _ => return Err(WalletError::BundleLayout { index: target }),
                }
                let fragment = &normalized[j * sign::NORMALIZED_FRAGMENT_LENGTH
                    ..(j + 1) * sign::NORMALIZED_FRAGMENT_LENGTH];
                let signature = sign::signature_fragment(fragment, private.fragment(j))?;
                bundle.set_signature_fragment(target, trits_to_trytes(&signature)?)?;
            }

            debug!(index, key_index = input.key_index, "input signed");
            index += input.security.fragments();
        }
        Ok(())
    }

    /// Run the submission pipeline on serialized transactions (tail-first):
    /// tip selection, proof-of-work attachment, store, broadcast.
    pub async fn send_trytes(
        &self,
        trytes: Vec<String>,
        depth: u32,
        min_weight_magnitude: u32,
        reference: Option<Hash>,
    ) -> Result<(Hash, Hash, Vec<Transaction>), WalletError> {
        let tips = self
            .node()
            .get_transactions_to_approve(depth, reference.map(|h| h.to_string()))
            .await?;
        let trunk = Hash::new(&tips.trunk_transaction)?;
        let branch = Hash::new(&tips.branch_transaction)?;

        let attached = self
            .node()
            .attach_to_tangle(
                tips.trunk_transaction,
                tips.branch_transaction,
                min_weight_magnitude,
                trytes,
            )
            .await?;

        self.store_and_broadcast(attached.clone()).await?;

        let transactions = attached
            .iter()
            .map(|t| Transaction::from_trytes(t))
            .collect::<Result<Vec<_>, TxError>>()?;
        info!(transactions = transactions.len(), "bundle attached and broadcast");
        Ok((trunk, branch, transactions))
    }

    /// Store then broadcast. Both commands are idempotent on the node, so
    /// this is safe to repeat after a partial submission.
    pub async fn store_and_broadcast(&self, trytes: Vec<String>) -> Result<(), WalletError> {
        self.node().store_transactions(trytes.clone()).await?;
        self.node().broadcast_transactions(trytes).await?;
        Ok(())
    }
}

/// Stamp every value transaction's fragment with the MAC of the bundle
/// hash.
fn apply_hmac(bundle: &mut Bundle, mac_key: &HmacKey) -> Result<(), WalletError> {
    let bundle_hash = bundle.hash()?.clone();
    let stamp = hmac::stamp(mac_key, &bundle_hash)?;
    for index in 0..bundle.len() {
        if !bundle.transactions()[index].value().is_positive() {
            continue;
        }
        let mut fragment = bundle.transactions()[index]
            .signature_message_fragment()
            .to_string();
        fragment.replace_range(..HASH_TRYTES, &stamp);
        bundle.set_signature_fragment(index, fragment)?;
    }
    Ok(())
}

fn now_seconds() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs() as i64)
        .unwrap_or_default()
}
