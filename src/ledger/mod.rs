//! Ledger domain: coins and friendship earned from gifts.
//!
//! The biome only emits `Gift` events; this is the one place that folds them
//! into running totals.

use bevy::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::biome::observe_slots;
use crate::shared::*;

/// Running totals. Persisted with the biome.
#[derive(Resource, Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ledger {
    pub coins: u64,
    /// Friendship points per guest.
    pub friendship: BTreeMap<GuestId, u32>,
    pub gifts_received: u64,
}

impl Ledger {
    pub fn record(&mut self, gift: &Gift) {
        self.coins = self.coins.saturating_add(gift.coins as u64);
        let points = self.friendship.entry(gift.guest.clone()).or_insert(0);
        *points = points.saturating_add(gift.friendship);
        self.gifts_received = self.gifts_received.saturating_add(1);
    }

    pub fn friendship_points(&self, guest: &str) -> u32 {
        self.friendship.get(guest).copied().unwrap_or(0)
    }

    pub fn friendship_level(&self, guest: &str) -> u32 {
        (self.friendship_points(guest) / FRIENDSHIP_PER_LEVEL).min(MAX_FRIENDSHIP_LEVEL)
    }
}

pub struct LedgerPlugin;

impl Plugin for LedgerPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<Ledger>()
            .add_event::<Gift>()
            .add_systems(
                Update,
                apply_gifts
                    .after(observe_slots)
                    .run_if(in_state(GameState::Playing)),
            );
    }
}

/// Applies Gift events to the ledger.
pub fn apply_gifts(mut gifts: EventReader<Gift>, mut ledger: ResMut<Ledger>) {
    for gift in gifts.read() {
        let before = ledger.friendship_level(&gift.guest);
        ledger.record(gift);
        info!(
            "[Ledger] {} brought {} from '{}'. Balance: {}",
            gift.guest,
            format_coins(gift.coins as u64),
            gift.item,
            format_coins(ledger.coins)
        );
        let after = ledger.friendship_level(&gift.guest);
        if after > before {
            info!("[Ledger] Friendship with {} reached level {}", gift.guest, after);
        }
    }
}

/// Format a coin amount for logs (e.g. "1,234c").
pub fn format_coins(amount: u64) -> String {
    let digits = amount.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3 + 1);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out.push('c');
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gift(guest: &str, coins: u32, friendship: u32) -> Gift {
        Gift {
            guest: guest.into(),
            item: "Ball".into(),
            coins,
            friendship,
        }
    }

    #[test]
    fn test_record_accumulates() {
        let mut ledger = Ledger::default();
        ledger.record(&gift("Gizmo", 10, 5));
        ledger.record(&gift("Gizmo", 3, 2));
        ledger.record(&gift("Bear", 1, 1));
        assert_eq!(ledger.coins, 14);
        assert_eq!(ledger.friendship_points("Gizmo"), 7);
        assert_eq!(ledger.friendship_points("Nobody"), 0);
        assert_eq!(ledger.gifts_received, 3);
    }

    #[test]
    fn test_friendship_level_is_capped() {
        let mut ledger = Ledger::default();
        ledger.record(&gift("Bear", 0, 250));
        assert_eq!(ledger.friendship_level("Bear"), 2);
        ledger.record(&gift("Bear", 0, u32::MAX));
        assert_eq!(ledger.friendship_points("Bear"), u32::MAX);
        assert_eq!(ledger.friendship_level("Bear"), MAX_FRIENDSHIP_LEVEL);
    }

    #[test]
    fn test_coins_saturate() {
        let mut ledger = Ledger {
            coins: u64::MAX - 1,
            ..Default::default()
        };
        ledger.record(&gift("Mochi", 50, 0));
        assert_eq!(ledger.coins, u64::MAX);
    }

    #[test]
    fn test_format_coins() {
        assert_eq!(format_coins(0), "0c");
        assert_eq!(format_coins(999), "999c");
        assert_eq!(format_coins(1_234), "1,234c");
        assert_eq!(format_coins(1_000_000), "1,000,000c");
    }
}
