//! The `Wallet`: a seed, a security level, and a node.
//!
//! Address derivation is pure; everything else consults the node. Input
//! discovery scans ascending key indices until the requested amount is
//! covered or the used address range is exhausted.

use crate::error::WalletError;
use crate::transfer::Input;
use iota_crypto::key;
use iota_rpc::{FindTransactionsQuery, TangleNode, DEFAULT_BALANCE_THRESHOLD};
use iota_types::{Address, Iota, Seed, SecurityLevel};
use tracing::debug;

/// Addresses derived and queried per balance-scan round trip.
const INPUT_BATCH: u32 = 10;

/// Hard cap on scanned indices for input discovery and unused-address
/// search.
const MAX_ADDRESS_SCAN: u32 = 1000;

pub struct Wallet<N> {
    node: N,
    seed: Seed,
    security: SecurityLevel,
}

impl<N> Wallet<N> {
    pub fn new(node: N, seed: Seed, security: SecurityLevel) -> Self {
        Wallet {
            node,
            seed,
            security,
        }
    }

    pub fn node(&self) -> &N {
        &self.node
    }

    pub fn security(&self) -> SecurityLevel {
        self.security
    }

    pub(crate) fn seed(&self) -> &Seed {
        &self.seed
    }

    /// The address at a key index. A pure function of the wallet's seed and
    /// security level.
    pub fn address_at(&self, index: u32) -> Result<Address, WalletError> {
        Ok(key::generate_address(&self.seed, index, self.security)?)
    }

    /// The checksummed 90-tryte form of `address_at`, for display.
    pub fn display_address_at(&self, index: u32) -> Result<String, WalletError> {
        Ok(key::address_with_checksum(&self.address_at(index)?)?)
    }
}

impl<N: TangleNode> Wallet<N> {
    /// The first address at or after `start` with no transactions on the
    /// tangle. Suitable as a remainder target.
    pub async fn new_address(&self, start: u32) -> Result<Address, WalletError> {
        for index in start..start.saturating_add(MAX_ADDRESS_SCAN) {
            let address = self.address_at(index)?;
            let hashes = self
                .node
                .find_transactions(FindTransactionsQuery::by_addresses(vec![address
                    .as_trytes()
                    .to_string()]))
                .await?;
            if hashes.is_empty() {
                debug!(index, "found unused address");
                return Ok(address);
            }
        }
        Err(WalletError::AddressSearchExhausted(MAX_ADDRESS_SCAN))
    }

    /// Confirmed balances for a set of addresses, in request order.
    pub async fn balances(&self, addresses: &[Address]) -> Result<Vec<Iota>, WalletError> {
        let strings = addresses
            .iter()
            .map(|a| a.as_trytes().to_string())
            .collect();
        let response = self
            .node
            .get_balances(strings, DEFAULT_BALANCE_THRESHOLD)
            .await?;
        response
            .balances
            .iter()
            .map(|s| s.parse::<Iota>().map_err(WalletError::from))
            .collect()
    }

    /// Gather inputs from ascending key indices until their balances cover
    /// `threshold`. Stops scanning once a whole batch of addresses has no
    /// transaction history.
    pub async fn get_inputs(
        &self,
        start: u32,
        threshold: &Iota,
    ) -> Result<(Vec<Input>, Iota), WalletError> {
        let mut inputs = Vec::new();
        let mut total = Iota::zero();
        let mut index = start;

        while index < start.saturating_add(MAX_ADDRESS_SCAN) {
            let addresses: Vec<Address> = (index..index + INPUT_BATCH)
                .map(|i| self.address_at(i))
                .collect::<Result<_, _>>()?;
            let strings: Vec<String> = addresses
                .iter()
                .map(|a| a.as_trytes().to_string())
                .collect();

            let response = self
                .node
                .get_balances(strings.clone(), DEFAULT_BALANCE_THRESHOLD)
                .await?;

            for (offset, (address, balance_str)) in
                addresses.iter().zip(&response.balances).enumerate()
            {
                let balance: Iota = balance_str.parse()?;
                if !balance.is_positive() {
                    continue;
                }
                total += &balance;
                inputs.push(Input {
                    address: address.clone(),
                    balance,
                    key_index: index + offset as u32,
                    security: self.security,
                });
                if &total >= threshold {
                    debug!(inputs = inputs.len(), total = %total, "input scan satisfied");
                    return Ok((inputs, total));
                }
            }

            let used = self
                .node
                .find_transactions(FindTransactionsQuery::by_addresses(strings))
                .await?;
            if used.is_empty() {
                break;
            }
            index += INPUT_BATCH;
        }

        Err(WalletError::NotEnoughBalance {
            needed: threshold.clone(),
            available: total,
        })
    }
}
