//! On-disk shape of a saved biome, and conversion to and from live state.
//!
//! Only names and RFC 3339 timestamps are stored. Restoring resolves every
//! name against the catalog; a record that fails is dropped with a warning
//! and the rest of the save still loads.

use bevy::prelude::*;
use chrono::{DateTime, Duration, SecondsFormat, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::biome::{Biome, PlacedItem, Slot};
use crate::clock::remaining_after_suspend;
use crate::error::RestoreError;
use crate::ledger::Ledger;
use crate::shared::*;
use crate::visits::generator::draw_inclusive;
use crate::visits::{arbitrate_at, VisitSchedule};

pub const SAVE_VERSION: u32 = 1;

/// One slot. Visit fields describe the slot's current or next visit and are
/// empty strings when there is none; `item_name` is empty for an empty slot.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlotSnapshot {
    pub item_name: String,
    pub guest_name: String,
    pub arrival: String,
    pub departure: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub coins: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub friendship: Option<u32>,
    #[serde(default)]
    pub freshness_remaining_secs: i64,
    /// Seconds until an exhausted schedule may be rebuilt.
    #[serde(default)]
    pub rebuild_remaining_secs: i64,
}

/// A scheduled visit behind a slot's front visit. Missing rewards are
/// redrawn from the guest's ranges on load.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VisitRecord {
    pub item_name: String,
    pub guest_name: String,
    pub arrival: String,
    pub departure: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub coins: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub friendship: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SaveFile {
    pub version: u32,
    pub saved_at: String,
    pub slots: Vec<SlotSnapshot>,
    #[serde(default)]
    pub visits: Vec<VisitRecord>,
    #[serde(default)]
    pub ledger: Ledger,
}

pub fn format_timestamp(at: Timestamp) -> String {
    at.to_rfc3339_opts(SecondsFormat::AutoSi, true)
}

pub fn parse_timestamp(field: &'static str, value: &str) -> Result<Timestamp, RestoreError> {
    DateTime::parse_from_rfc3339(value)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|_| RestoreError::BadTimestamp {
            field,
            value: value.to_string(),
        })
}

// ═══════════════════════════════════════════════════════════════════════
// ENCODE
// ═══════════════════════════════════════════════════════════════════════

impl SaveFile {
    /// Capture `biome` and `ledger` as of `now`.
    pub fn capture(biome: &Biome, ledger: &Ledger, now: Timestamp) -> Self {
        let mut slots = Vec::with_capacity(biome.slot_count());
        let mut visits = Vec::new();

        for slot in biome.slots() {
            let Some(placed) = slot.placed.as_ref() else {
                slots.push(SlotSnapshot::default());
                continue;
            };
            let scheduled = biome.schedule().visits(&placed.item);
            let mut snap = SlotSnapshot {
                item_name: placed.item.clone(),
                freshness_remaining_secs: placed.freshness_remaining_secs(now),
                rebuild_remaining_secs: placed.rebuild_remaining_secs(now),
                ..Default::default()
            };
            if let Some(front) = scheduled.first() {
                snap.guest_name = front.guest.clone();
                snap.arrival = format_timestamp(front.arrival);
                snap.departure = format_timestamp(front.departure);
                snap.coins = Some(front.coins);
                snap.friendship = Some(front.friendship);
            }
            slots.push(snap);
            visits.extend(scheduled.iter().skip(1).map(VisitRecord::from));
        }

        Self {
            version: SAVE_VERSION,
            saved_at: format_timestamp(now),
            slots,
            visits,
            ledger: ledger.clone(),
        }
    }
}

impl From<&Visit> for VisitRecord {
    fn from(visit: &Visit) -> Self {
        Self {
            item_name: visit.item.clone(),
            guest_name: visit.guest.clone(),
            arrival: format_timestamp(visit.arrival),
            departure: format_timestamp(visit.departure),
            coins: Some(visit.coins),
            friendship: Some(visit.friendship),
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════
// RESTORE
// ═══════════════════════════════════════════════════════════════════════

/// Raw visit fields, shared by slot fronts and loose records.
struct VisitFields<'a> {
    item: &'a str,
    guest: &'a str,
    arrival: &'a str,
    departure: &'a str,
    coins: Option<u32>,
    friendship: Option<u32>,
}

impl<'a> From<&'a VisitRecord> for VisitFields<'a> {
    fn from(r: &'a VisitRecord) -> Self {
        Self {
            item: &r.item_name,
            guest: &r.guest_name,
            arrival: &r.arrival,
            departure: &r.departure,
            coins: r.coins,
            friendship: r.friendship,
        }
    }
}

/// Names and timestamps are checked before any catalog lookup.
fn restore_visit<R: Rng>(
    fields: VisitFields<'_>,
    catalog: &Catalog,
    rng: &mut R,
) -> Result<Visit, RestoreError> {
    if fields.item.is_empty() {
        return Err(RestoreError::EmptyName("item"));
    }
    if fields.guest.is_empty() {
        return Err(RestoreError::EmptyName("guest"));
    }
    let arrival = parse_timestamp("arrival", fields.arrival)?;
    let departure = parse_timestamp("departure", fields.departure)?;
    if departure <= arrival {
        return Err(RestoreError::EmptyWindow {
            guest: fields.guest.to_string(),
        });
    }
    let item = catalog.lookup_item(fields.item)?;
    let guest = catalog.lookup_guest(fields.guest)?;

    Ok(Visit {
        item: item.name.clone(),
        guest: guest.name.clone(),
        arrival,
        departure,
        coins: fields
            .coins
            .unwrap_or_else(|| draw_inclusive(guest.coin_reward, rng)),
        friendship: fields
            .friendship
            .unwrap_or_else(|| draw_inclusive(guest.friendship_reward, rng)),
    })
}

fn restore_slot<R: Rng>(
    snap: &SlotSnapshot,
    catalog: &Catalog,
    saved_at: Timestamp,
    now: Timestamp,
    rng: &mut R,
) -> Result<(PlacedItem, Option<Visit>), RestoreError> {
    let item = catalog.lookup_item(&snap.item_name)?;
    let fields = VisitFields {
        item: &snap.item_name,
        guest: &snap.guest_name,
        arrival: &snap.arrival,
        departure: &snap.departure,
        coins: snap.coins,
        friendship: snap.friendship,
    };
    // A bad front visit costs only that visit; the item stays placed.
    let front = if snap.guest_name.is_empty() {
        None
    } else {
        match restore_visit(fields, catalog, rng) {
            Ok(visit) => Some(visit),
            Err(e) => {
                warn!("[Save] Dropping front visit at '{}': {}", snap.item_name, e);
                None
            }
        }
    };

    let remaining = remaining_after_suspend(snap.freshness_remaining_secs, saved_at, now);
    let fresh_until = now + Duration::seconds(remaining);
    let rebuild_wait = remaining_after_suspend(snap.rebuild_remaining_secs, saved_at, now);
    let placed = PlacedItem {
        item: item.name.clone(),
        placed_at: fresh_until - Duration::hours(item.duration_hours as i64),
        fresh_until,
        rebuild_after: now + Duration::seconds(rebuild_wait),
    };
    Ok((placed, front))
}

/// Rebuild a biome with `slot_count` slots from `save` as of `now`.
///
/// Freshness loses the time spent away. Visits are restored as saved; the
/// next observation settles whatever finished in the meantime.
pub fn restore_biome<R: Rng>(
    save: &SaveFile,
    catalog: &Catalog,
    slot_count: usize,
    now: Timestamp,
    rng: &mut R,
) -> Biome {
    if save.version != SAVE_VERSION {
        warn!(
            "[Save] Save has version {} but current version is {}. Attempting to load anyway.",
            save.version, SAVE_VERSION
        );
    }
    let saved_at = parse_timestamp("saved_at", &save.saved_at).unwrap_or_else(|e| {
        warn!("[Save] {}; treating the save as current", e);
        now
    });

    let mut slots = vec![Slot::default(); slot_count];
    let mut visits: Vec<Visit> = Vec::new();

    for (index, snap) in save.slots.iter().enumerate() {
        if snap.item_name.is_empty() {
            continue;
        }
        let restored = if index >= slot_count {
            Err(RestoreError::SlotOutOfRange { slot: index })
        } else if slots.iter().any(|s| s.item() == Some(snap.item_name.as_str())) {
            Err(RestoreError::DuplicateItem(snap.item_name.clone()))
        } else {
            restore_slot(snap, catalog, saved_at, now, rng)
        };
        match restored {
            Ok((placed, front)) => {
                slots[index].placed = Some(placed);
                visits.extend(front);
            }
            Err(e) => warn!("[Save] Dropping slot {}: {}", index, e),
        }
    }

    for record in &save.visits {
        let restored = if slots.iter().any(|s| s.item() == Some(record.item_name.as_str())) {
            restore_visit(record.into(), catalog, rng)
        } else {
            Err(RestoreError::OrphanVisit(record.item_name.clone()))
        };
        match restored {
            Ok(visit) => visits.push(visit),
            Err(e) => warn!("[Save] Dropping visit by '{}': {}", record.guest_name, e),
        }
    }

    let mut schedule = VisitSchedule::from_visits(visits);
    arbitrate_at(&mut schedule, catalog, Some(saved_at));

    info!(
        "[Save] Restored {} slot(s), {} visit(s)",
        slots.iter().filter(|s| !s.is_empty()).count(),
        schedule.len()
    );
    Biome::from_parts(slots, schedule)
}
