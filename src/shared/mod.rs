//! Shared components, resources, events, and states for Hamstead.
//!
//! This is the type contract. Every domain plugin imports from here;
//! cross-domain traffic goes through the events declared below.

use bevy::prelude::*;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::error::{CatalogError, NotFoundError};

// ═══════════════════════════════════════════════════════════════════════
// GAME STATE: top-level state machine
// ═══════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, States, Default)]
pub enum GameState {
    #[default]
    Loading,
    Playing,
    /// Application backgrounded or closing. Time-driven systems stop and the
    /// biome is persisted on entry.
    Suspended,
}

// ═══════════════════════════════════════════════════════════════════════
// IDENTITIES & TIME
// ═══════════════════════════════════════════════════════════════════════

/// Guests are identified by name everywhere, including save data.
pub type GuestId = String;

/// Items are identified by name everywhere, including save data.
pub type ItemId = String;

/// Absolute wall-clock instant. Every engine comparison uses this type and
/// the value handed out by `SessionClock::now`.
pub type Timestamp = DateTime<Utc>;

// ═══════════════════════════════════════════════════════════════════════
// GUESTS
// ═══════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GuestDef {
    pub name: GuestId,
    pub personality: String,
    /// Minutes after the not-before time, inclusive range.
    pub arrival_delay_minutes: (u32, u32),
    /// Minutes after arrival before the ×10 stay scale, inclusive range.
    pub departure_delay_minutes: (u32, u32),
    pub power_level: u8,
    pub coin_reward: (u32, u32),
    pub friendship_reward: (u32, u32),
}

impl GuestDef {
    /// Rejects any reward or delay range whose max is below its min.
    pub fn validate(&self) -> Result<(), CatalogError> {
        let ranges = [
            ("arrival_delay_minutes", self.arrival_delay_minutes),
            ("departure_delay_minutes", self.departure_delay_minutes),
            ("coin_reward", self.coin_reward),
            ("friendship_reward", self.friendship_reward),
        ];
        for (field, (min, max)) in ranges {
            if max < min {
                return Err(CatalogError::InvalidRange {
                    guest: self.name.clone(),
                    field,
                    min,
                    max,
                });
            }
        }
        Ok(())
    }
}

// ═══════════════════════════════════════════════════════════════════════
// AFFINITY TABLE
// ═══════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AffinityEntry {
    pub guest: GuestId,
    /// Cumulative upper bound of this guest's band in [0, 1).
    pub threshold: f64,
}

/// Ordered guest bands for one item, rarest (lowest threshold) first.
///
/// Thresholds are strictly increasing and the last one is exactly 1.0, so the
/// bands partition [0, 1) without gaps. The only way to build one is through
/// [`AffinityTable::new`] (deserialization goes through the same check).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<AffinityEntry>", into = "Vec<AffinityEntry>")]
pub struct AffinityTable {
    entries: Vec<AffinityEntry>,
}

impl AffinityTable {
    pub fn new<G: Into<GuestId>>(
        bands: impl IntoIterator<Item = (G, f64)>,
    ) -> Result<Self, CatalogError> {
        let entries: Vec<AffinityEntry> = bands
            .into_iter()
            .map(|(guest, threshold)| AffinityEntry {
                guest: guest.into(),
                threshold,
            })
            .collect();
        Self::try_from(entries)
    }

    pub fn entries(&self) -> &[AffinityEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Zero-based position of `guest` in the table. Lower is rarer.
    pub fn rank_of(&self, guest: &str) -> Option<usize> {
        self.entries.iter().position(|e| e.guest == guest)
    }

    pub fn guests(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|e| e.guest.as_str())
    }
}

impl TryFrom<Vec<AffinityEntry>> for AffinityTable {
    type Error = CatalogError;

    fn try_from(entries: Vec<AffinityEntry>) -> Result<Self, Self::Error> {
        let Some(last) = entries.last() else {
            return Err(CatalogError::EmptyAffinityTable);
        };
        if last.threshold != 1.0 {
            return Err(CatalogError::FinalThresholdNotOne {
                threshold: last.threshold,
            });
        }

        let mut previous = 0.0_f64;
        for (i, entry) in entries.iter().enumerate() {
            if !(entry.threshold > 0.0 && entry.threshold <= 1.0) {
                return Err(CatalogError::ThresholdOutOfRange {
                    guest: entry.guest.clone(),
                    threshold: entry.threshold,
                });
            }
            if i > 0 && entry.threshold <= previous {
                return Err(CatalogError::NonIncreasingThreshold {
                    guest: entry.guest.clone(),
                    threshold: entry.threshold,
                    previous,
                });
            }
            if entries[..i].iter().any(|e| e.guest == entry.guest) {
                return Err(CatalogError::DuplicateGuest {
                    guest: entry.guest.clone(),
                });
            }
            previous = entry.threshold;
        }

        Ok(Self { entries })
    }
}

impl From<AffinityTable> for Vec<AffinityEntry> {
    fn from(table: AffinityTable) -> Self {
        table.entries
    }
}

// ═══════════════════════════════════════════════════════════════════════
// ITEMS
// ═══════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemDef {
    pub name: ItemId,
    pub price: u32,
    /// Active life of a freshly placed item; the schedule covers this span.
    pub duration_hours: u32,
    /// Upper bound (inclusive) of the per-hour visit count draw.
    pub max_visits_per_hour: u8,
    pub affinity: AffinityTable,
}

// ═══════════════════════════════════════════════════════════════════════
// CATALOG (loaded from data)
// ═══════════════════════════════════════════════════════════════════════

/// Read-only content registry. Populated once by the data plugin.
#[derive(Resource, Debug, Clone, Default)]
pub struct Catalog {
    pub guests: HashMap<GuestId, GuestDef>,
    pub items: HashMap<ItemId, ItemDef>,
}

impl Catalog {
    pub fn lookup_guest(&self, name: &str) -> Result<&GuestDef, NotFoundError> {
        self.guests
            .get(name)
            .ok_or_else(|| NotFoundError::Guest(name.to_string()))
    }

    pub fn lookup_item(&self, name: &str) -> Result<&ItemDef, NotFoundError> {
        self.items
            .get(name)
            .ok_or_else(|| NotFoundError::Item(name.to_string()))
    }

    pub fn insert_guest(&mut self, guest: GuestDef) {
        self.guests.insert(guest.name.clone(), guest);
    }

    pub fn insert_item(&mut self, item: ItemDef) {
        self.items.insert(item.name.clone(), item);
    }

    /// Checks every guest's ranges and that every affinity table only names
    /// guests that exist.
    pub fn validate(&self) -> Result<(), CatalogError> {
        for guest in self.guests.values() {
            guest.validate()?;
        }
        for item in self.items.values() {
            if let Some(missing) = item.affinity.guests().find(|g| !self.guests.contains_key(*g)) {
                return Err(CatalogError::UnknownGuest {
                    item: item.name.clone(),
                    guest: missing.to_string(),
                });
            }
        }
        Ok(())
    }
}

// ═══════════════════════════════════════════════════════════════════════
// VISITS
// ═══════════════════════════════════════════════════════════════════════

/// One scheduled guest presence at an item. Rewards are fixed at creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Visit {
    pub item: ItemId,
    pub guest: GuestId,
    pub arrival: Timestamp,
    pub departure: Timestamp,
    pub coins: u32,
    pub friendship: u32,
}

impl Visit {
    /// Half-open interval overlap on [arrival, departure).
    pub fn overlaps(&self, other: &Visit) -> bool {
        self.arrival < other.departure && other.arrival < self.departure
    }

    pub fn has_arrived(&self, now: Timestamp) -> bool {
        now >= self.arrival
    }

    pub fn has_departed(&self, now: Timestamp) -> bool {
        now >= self.departure
    }

    pub fn is_active(&self, now: Timestamp) -> bool {
        self.has_arrived(now) && !self.has_departed(now)
    }

    pub fn to_gift(&self) -> Gift {
        Gift {
            guest: self.guest.clone(),
            item: self.item.clone(),
            coins: self.coins,
            friendship: self.friendship,
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════
// EVENTS: cross-domain communication
// ═══════════════════════════════════════════════════════════════════════

/// Reward payload for one completed visit. Emitted exactly once.
#[derive(Event, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Gift {
    pub guest: GuestId,
    pub item: ItemId,
    pub coins: u32,
    pub friendship: u32,
}

/// Player puts an item into a slot (replacing whatever was there).
#[derive(Event, Debug, Clone)]
pub struct PlaceItemEvent {
    pub slot: usize,
    pub item: ItemId,
}

/// Player takes the item out of a slot.
#[derive(Event, Debug, Clone)]
pub struct RemoveItemEvent {
    pub slot: usize,
}

/// Player refreshes the item in a slot.
#[derive(Event, Debug, Clone)]
pub struct RefillItemEvent {
    pub slot: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SlotChange {
    Placed(ItemId),
    Removed(ItemId),
    Refilled(ItemId),
    Rescheduled(ItemId),
}

/// Sent by the biome after any player-visible change to slot contents or
/// schedule. The save domain listens for it.
#[derive(Event, Debug, Clone)]
pub struct SlotChangedEvent {
    pub slot: usize,
    pub change: SlotChange,
}

#[derive(Event, Debug, Clone)]
pub struct SuspendRequestEvent;

#[derive(Event, Debug, Clone)]
pub struct ResumeRequestEvent;

// ═══════════════════════════════════════════════════════════════════════
// CONSTANTS
// ═══════════════════════════════════════════════════════════════════════

pub const DEFAULT_SLOT_COUNT: usize = 6;

/// Departure windows are an order of magnitude wider than arrival jitter.
pub const DEPARTURE_SCALE: i64 = 10;
pub const SECONDS_PER_MINUTE: i64 = 60;
pub const SECONDS_PER_HOUR: i64 = 3_600;
/// Floor on a visit's length so departure is strictly after arrival.
pub const MIN_STAY_SECS: i64 = 1;

pub const FRIENDSHIP_PER_LEVEL: u32 = 100;
pub const MAX_FRIENDSHIP_LEVEL: u32 = 10;

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn at(secs: i64) -> Timestamp {
        Utc.timestamp_opt(1_700_000_000 + secs, 0).unwrap()
    }

    fn visit(arrival: i64, departure: i64) -> Visit {
        Visit {
            item: "Ball".into(),
            guest: "Gizmo".into(),
            arrival: at(arrival),
            departure: at(departure),
            coins: 1,
            friendship: 1,
        }
    }

    #[test]
    fn test_affinity_table_accepts_valid_bands() {
        let table = AffinityTable::new([("Gizmo", 0.1), ("Bear", 0.4), ("Biscuit", 1.0)]).unwrap();
        assert_eq!(table.len(), 3);
        assert_eq!(table.rank_of("Gizmo"), Some(0));
        assert_eq!(table.rank_of("Biscuit"), Some(2));
        assert_eq!(table.rank_of("Nobody"), None);
    }

    #[test]
    fn test_affinity_table_rejects_gaps_and_disorder() {
        assert_eq!(
            AffinityTable::new(Vec::<(&str, f64)>::new()),
            Err(CatalogError::EmptyAffinityTable)
        );
        assert!(matches!(
            AffinityTable::new([("Gizmo", 0.5), ("Bear", 0.9)]),
            Err(CatalogError::FinalThresholdNotOne { .. })
        ));
        assert!(matches!(
            AffinityTable::new([("Gizmo", 0.5), ("Bear", 0.5), ("Biscuit", 1.0)]),
            Err(CatalogError::NonIncreasingThreshold { .. })
        ));
        assert!(matches!(
            AffinityTable::new([("Gizmo", 0.0), ("Biscuit", 1.0)]),
            Err(CatalogError::ThresholdOutOfRange { .. })
        ));
        assert!(matches!(
            AffinityTable::new([("Gizmo", 0.5), ("Gizmo", 1.0)]),
            Err(CatalogError::DuplicateGuest { .. })
        ));
    }

    #[test]
    fn test_affinity_table_deserialize_is_validated() {
        let bad = r#"[{"guest":"Gizmo","threshold":0.3}]"#;
        assert!(serde_json::from_str::<AffinityTable>(bad).is_err());

        let good = r#"[{"guest":"Gizmo","threshold":0.3},{"guest":"Bear","threshold":1.0}]"#;
        let table: AffinityTable = serde_json::from_str(good).unwrap();
        assert_eq!(table.rank_of("Bear"), Some(1));
    }

    #[test]
    fn test_guest_validate_rejects_inverted_range() {
        let guest = GuestDef {
            name: "Bear".into(),
            personality: "sleepy".into(),
            arrival_delay_minutes: (15, 5),
            departure_delay_minutes: (1, 5),
            power_level: 1,
            coin_reward: (1, 2),
            friendship_reward: (1, 2),
        };
        assert!(matches!(
            guest.validate(),
            Err(CatalogError::InvalidRange { field: "arrival_delay_minutes", .. })
        ));
    }

    #[test]
    fn test_catalog_lookup_not_found() {
        let catalog = Catalog::default();
        assert_eq!(
            catalog.lookup_guest("Gizmo"),
            Err(NotFoundError::Guest("Gizmo".into()))
        );
        assert_eq!(
            catalog.lookup_item("Ball"),
            Err(NotFoundError::Item("Ball".into()))
        );
    }

    #[test]
    fn test_visit_overlap_is_half_open() {
        let a = visit(0, 100);
        let b = visit(100, 200);
        let c = visit(50, 150);
        assert!(!a.overlaps(&b), "touching intervals do not overlap");
        assert!(a.overlaps(&c));
        assert!(c.overlaps(&b));
    }

    #[test]
    fn test_visit_lifecycle_predicates() {
        let v = visit(10, 20);
        assert!(!v.has_arrived(at(9)));
        assert!(v.is_active(at(10)));
        assert!(v.is_active(at(19)));
        assert!(!v.is_active(at(20)));
        assert!(v.has_departed(at(20)));
        assert!(v.has_departed(at(20) + Duration::days(3)));
    }
}
