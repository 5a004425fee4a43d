//! The shared item ledger.
//!
//! One inventory serves the whole roster. Counts are non-negative; gold is
//! an ordinary entry with the reserved id from
//! [`hearthstead_logic::constants::GOLD_ITEM_ID`]. Completion transactions
//! apply all of their deltas in one call so observers never see a partial
//! update.

use hearthstead_logic::constants::GOLD_ITEM_ID;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Inventory {
    counts: BTreeMap<String, u64>,
}

impl Inventory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn count(&self, item_id: &str) -> u64 {
        self.counts.get(item_id).copied().unwrap_or(0)
    }

    pub fn gold(&self) -> u64 {
        self.count(GOLD_ITEM_ID)
    }

    pub fn grant(&mut self, item_id: &str, amount: u64) {
        if amount == 0 {
            return;
        }
        *self.counts.entry(item_id.to_string()).or_insert(0) += amount;
    }

    /// Remove up to `amount` units. Saturates at zero; empty entries are
    /// dropped so the map only holds owned items.
    pub fn consume(&mut self, item_id: &str, amount: u64) {
        if let Some(count) = self.counts.get_mut(item_id) {
            *count = count.saturating_sub(amount);
            if *count == 0 {
                self.counts.remove(item_id);
            }
        }
    }

    pub fn has(&self, item_id: &str, amount: u64) -> bool {
        self.count(item_id) >= amount
    }

    pub fn can_afford(&self, costs: &BTreeMap<String, u64>) -> bool {
        costs.iter().all(|(item_id, amount)| self.has(item_id, *amount))
    }

    pub fn add_gold(&mut self, amount: u64) {
        self.grant(GOLD_ITEM_ID, amount);
    }

    /// Spend gold if there is enough. Returns whether it happened.
    pub fn spend_gold(&mut self, amount: u64) -> bool {
        if self.gold() < amount {
            return false;
        }
        self.consume(GOLD_ITEM_ID, amount);
        true
    }

    /// Apply one completion's resource movement: all costs out, all
    /// rewards and gold in, within a single call.
    pub fn apply_completion(
        &mut self,
        costs: &BTreeMap<String, u64>,
        rewards: &BTreeMap<String, u64>,
        gold: u64,
    ) {
        for (item_id, amount) in costs {
            self.consume(item_id, *amount);
        }
        for (item_id, amount) in rewards {
            self.grant(item_id, *amount);
        }
        self.add_gold(gold);
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, u64)> {
        self.counts.iter().map(|(id, count)| (id.as_str(), *count))
    }

    pub fn to_map(&self) -> BTreeMap<String, u64> {
        self.counts.clone()
    }

    pub fn from_map(counts: BTreeMap<String, u64>) -> Self {
        let counts = counts.into_iter().filter(|(_, count)| *count > 0).collect();
        Self { counts }
    }
}
