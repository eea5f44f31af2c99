//! Slot contents and the phase a slot is in at a given instant.

use chrono::Duration;

use crate::shared::*;

/// An item sitting in a slot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlacedItem {
    pub item: ItemId,
    pub placed_at: Timestamp,
    /// End of the item's active life. Refilling moves it forward.
    pub fresh_until: Timestamp,
    /// Earliest instant an exhausted schedule may be rebuilt. One hour past
    /// the start of the latest build, so a build that drew nothing is retried
    /// at most once per hour block.
    pub rebuild_after: Timestamp,
}

impl PlacedItem {
    pub fn new(item: &ItemDef, now: Timestamp) -> Self {
        let fresh_until = now + Duration::hours(item.duration_hours as i64);
        Self {
            item: item.name.clone(),
            placed_at: now,
            fresh_until,
            rebuild_after: rebuild_after(now),
        }
    }

    /// Record that a schedule was just built starting at `start`.
    pub fn mark_built(&mut self, start: Timestamp) {
        self.rebuild_after = rebuild_after(start);
    }

    /// Seconds until the schedule may be rebuilt, never negative.
    pub fn rebuild_remaining_secs(&self, now: Timestamp) -> i64 {
        (self.rebuild_after - now).num_seconds().max(0)
    }

    /// Seconds of freshness left at `now`, never negative.
    pub fn freshness_remaining_secs(&self, now: Timestamp) -> i64 {
        (self.fresh_until - now).num_seconds().max(0)
    }

    /// Whole hours of freshness left at `now`.
    pub fn fresh_hours_remaining(&self, now: Timestamp) -> u32 {
        let hours = self.freshness_remaining_secs(now) / SECONDS_PER_HOUR;
        u32::try_from(hours).unwrap_or(u32::MAX)
    }

    pub fn is_fresh(&self, now: Timestamp) -> bool {
        now < self.fresh_until
    }
}

fn rebuild_after(start: Timestamp) -> Timestamp {
    start + Duration::seconds(SECONDS_PER_HOUR)
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Slot {
    pub placed: Option<PlacedItem>,
}

impl Slot {
    pub fn item(&self) -> Option<&str> {
        self.placed.as_ref().map(|p| p.item.as_str())
    }

    pub fn is_empty(&self) -> bool {
        self.placed.is_none()
    }
}

/// What a slot shows at one instant. Derived purely from timestamps.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotPhase<'a> {
    Empty,
    /// Item placed, no visit left in its schedule.
    Occupied,
    Pending(&'a Visit),
    Active(&'a Visit),
    /// Departure reached, gift not yet settled by an observation.
    Ended(&'a Visit),
}

impl<'a> SlotPhase<'a> {
    /// Phase of an occupied slot whose front visit is `front`.
    pub fn of(front: Option<&'a Visit>, now: Timestamp) -> Self {
        match front {
            None => SlotPhase::Occupied,
            Some(v) if v.has_departed(now) => SlotPhase::Ended(v),
            Some(v) if v.has_arrived(now) => SlotPhase::Active(v),
            Some(v) => SlotPhase::Pending(v),
        }
    }

    pub fn visit(&self) -> Option<&'a Visit> {
        match *self {
            SlotPhase::Pending(v) | SlotPhase::Active(v) | SlotPhase::Ended(v) => Some(v),
            SlotPhase::Empty | SlotPhase::Occupied => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn t(minutes: i64) -> Timestamp {
        Utc.with_ymd_and_hms(2026, 3, 1, 9, 0, 0).unwrap() + Duration::minutes(minutes)
    }

    #[test]
    fn test_phase_follows_visit_window() {
        let v = Visit {
            item: "Ball".into(),
            guest: "Mochi".into(),
            arrival: t(10),
            departure: t(30),
            coins: 3,
            friendship: 1,
        };
        assert_eq!(SlotPhase::of(Some(&v), t(0)), SlotPhase::Pending(&v));
        assert_eq!(SlotPhase::of(Some(&v), t(10)), SlotPhase::Active(&v));
        assert_eq!(SlotPhase::of(Some(&v), t(30)), SlotPhase::Ended(&v));
        assert_eq!(SlotPhase::of(None, t(30)), SlotPhase::Occupied);
        assert_eq!(SlotPhase::of(Some(&v), t(20)).visit(), Some(&v));
    }

    #[test]
    fn test_freshness_counts_down_and_clamps() {
        let item = ItemDef {
            name: "Wheel".into(),
            price: 40,
            duration_hours: 3,
            max_visits_per_hour: 1,
            affinity: AffinityTable::new([("Mochi", 1.0)]).unwrap(),
        };
        let placed = PlacedItem::new(&item, t(0));
        assert_eq!(placed.freshness_remaining_secs(t(0)), 3 * 3_600);
        assert_eq!(placed.fresh_hours_remaining(t(61)), 1);
        assert!(placed.is_fresh(t(179)));
        assert!(!placed.is_fresh(t(180)));
        assert_eq!(placed.freshness_remaining_secs(t(500)), 0);
    }

    #[test]
    fn test_rebuild_gate_is_an_hour_past_the_build() {
        let item = ItemDef {
            name: "Hammock".into(),
            price: 80,
            duration_hours: 12,
            max_visits_per_hour: 1,
            affinity: AffinityTable::new([("Mochi", 1.0)]).unwrap(),
        };
        let mut placed = PlacedItem::new(&item, t(0));
        assert_eq!(placed.rebuild_after, t(60));
        assert!(placed.rebuild_after < placed.fresh_until);
        assert_eq!(placed.rebuild_remaining_secs(t(45)), 15 * 60);

        placed.mark_built(t(300));
        assert_eq!(placed.rebuild_after, t(360));
        assert_eq!(placed.rebuild_remaining_secs(t(400)), 0);
    }
}
