//! Per-item visit schedules and the builder that fills them.
//!
//! A schedule maps each item to its visits in arrival order. Within one item
//! visits never overlap: every visit waits for the previous departure. Across
//! items the same guest may collide, which [`super::arbitration`] resolves.

use bevy::prelude::*;
use chrono::Duration;
use rand::Rng;
use std::collections::HashSet;

use crate::biome::GuestPresence;
use crate::config::SelectionFallback;
use crate::shared::*;

use super::arbitration::arbitrate;
use super::generator::generate_visit;
use super::select::{resolve_fallback, select_guest};

// ═══════════════════════════════════════════════════════════════════════
// SCHEDULE
// ═══════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemVisits {
    pub item: ItemId,
    pub visits: Vec<Visit>,
}

/// Visits for every scheduled item, in the order items were first added.
/// That order is the final tie-break during arbitration.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VisitSchedule {
    entries: Vec<ItemVisits>,
}

impl VisitSchedule {
    /// Rebuild a schedule from loose visits, e.g. from save data. Visits are
    /// grouped by item in first-seen order and sorted by arrival.
    pub fn from_visits(visits: impl IntoIterator<Item = Visit>) -> Self {
        let mut schedule = Self::default();
        for visit in visits {
            match schedule.entries.iter_mut().find(|e| e.item == visit.item) {
                Some(entry) => entry.visits.push(visit),
                None => schedule.entries.push(ItemVisits {
                    item: visit.item.clone(),
                    visits: vec![visit],
                }),
            }
        }
        for entry in &mut schedule.entries {
            entry.visits.sort_by_key(|v| v.arrival);
        }
        schedule
    }

    pub fn entries(&self) -> &[ItemVisits] {
        &self.entries
    }

    pub(super) fn entries_mut(&mut self) -> &mut Vec<ItemVisits> {
        &mut self.entries
    }

    pub fn visits(&self, item: &str) -> &[Visit] {
        self.entries
            .iter()
            .find(|e| e.item == item)
            .map(|e| e.visits.as_slice())
            .unwrap_or(&[])
    }

    /// The current or next visit for `item`.
    pub fn front(&self, item: &str) -> Option<&Visit> {
        self.visits(item).first()
    }

    pub fn contains_item(&self, item: &str) -> bool {
        self.entries.iter().any(|e| e.item == item)
    }

    /// Every visit, item by item.
    pub fn iter(&self) -> impl Iterator<Item = &Visit> {
        self.entries.iter().flat_map(|e| e.visits.iter())
    }

    pub fn len(&self) -> usize {
        self.entries.iter().map(|e| e.visits.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Remove and return the front visit of `item` if it has departed by `now`.
    pub fn pop_departed(&mut self, item: &str, now: Timestamp) -> Option<Visit> {
        let entry = self.entries.iter_mut().find(|e| e.item == item)?;
        if entry.visits.first().is_some_and(|v| v.has_departed(now)) {
            return Some(entry.visits.remove(0));
        }
        None
    }

    /// Drop `item` and all of its visits.
    pub fn remove_item(&mut self, item: &str) -> Vec<Visit> {
        match self.entries.iter().position(|e| e.item == item) {
            Some(index) => self.entries.remove(index).visits,
            None => Vec::new(),
        }
    }

    /// Keep only visits of `item` that have already arrived by `now`.
    pub fn retain_arrived(&mut self, item: &str, now: Timestamp) {
        if let Some(entry) = self.entries.iter_mut().find(|e| e.item == item) {
            entry.visits.retain(|v| v.has_arrived(now));
        }
    }

    /// Fold another schedule into this one. Each item in `other` replaces the
    /// same item here wholesale, except that visits already in this schedule
    /// are kept in front when `keep_existing` is set (used for refills).
    pub fn merge(&mut self, other: VisitSchedule, keep_existing: bool) {
        for incoming in other.entries {
            match self.entries.iter_mut().find(|e| e.item == incoming.item) {
                Some(existing) if keep_existing => existing.visits.extend(incoming.visits),
                Some(existing) => existing.visits = incoming.visits,
                None => self.entries.push(incoming),
            }
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════
// BUILDER
// ═══════════════════════════════════════════════════════════════════════

/// Generates visits for one or more items in a single build pass.
///
/// Every guest picked during the pass joins the builder's used set, so a
/// guest is scheduled at most once per pass. Guests currently present in the
/// biome are excluded as well.
pub struct ScheduleBuilder<'a, R: Rng> {
    catalog: &'a Catalog,
    presence: &'a GuestPresence,
    fallback: &'a SelectionFallback,
    rng: &'a mut R,
    used_guests: HashSet<GuestId>,
    schedule: VisitSchedule,
}

impl<'a, R: Rng> ScheduleBuilder<'a, R> {
    pub fn new(
        catalog: &'a Catalog,
        presence: &'a GuestPresence,
        fallback: &'a SelectionFallback,
        rng: &'a mut R,
    ) -> Self {
        Self {
            catalog,
            presence,
            fallback,
            rng,
            used_guests: HashSet::new(),
            schedule: VisitSchedule::default(),
        }
    }

    /// Schedule `item` for `total_hours` one-hour blocks starting at `start`.
    ///
    /// Each block draws a visit count in `0..=max_visits_per_hour`. The first
    /// visit of a block waits for the block start or the previous departure,
    /// whichever is later; each further visit waits for the one before it.
    pub fn add_item(&mut self, item: &ItemDef, start: Timestamp, total_hours: u32) -> &mut Self {
        let mut visits: Vec<Visit> = Vec::new();

        for hour in 0..total_hours {
            let block_start = start + Duration::hours(hour as i64);
            let count = self.rng.gen_range(0..=item.max_visits_per_hour);
            let mut not_before = match visits.last() {
                Some(prev) if prev.departure > block_start => prev.departure,
                _ => block_start,
            };

            for _ in 0..count {
                let Some(guest) = self.pick_guest(item) else {
                    debug!(
                        "[Schedule] No eligible guest for '{}' in hour {}; skipping visit",
                        item.name, hour
                    );
                    continue;
                };
                let visit = generate_visit(item, guest, not_before, &mut *self.rng);
                not_before = visit.departure;
                self.used_guests.insert(visit.guest.clone());
                visits.push(visit);
            }
        }

        debug!(
            "[Schedule] '{}': {} visit(s) over {} hour(s)",
            item.name,
            visits.len(),
            total_hours
        );
        self.schedule.merge(
            VisitSchedule {
                entries: vec![ItemVisits {
                    item: item.name.clone(),
                    visits,
                }],
            },
            false,
        );
        self
    }

    /// Guests picked so far in this pass.
    pub fn used_guests(&self) -> &HashSet<GuestId> {
        &self.used_guests
    }

    /// Arbitrate cross-item conflicts and hand the schedule over.
    pub fn finish(self) -> VisitSchedule {
        let mut schedule = self.schedule;
        arbitrate(&mut schedule, self.catalog);
        schedule
    }

    fn pick_guest(&mut self, item: &ItemDef) -> Option<&'a GuestDef> {
        let catalog = self.catalog;
        let presence = self.presence;
        let used = &self.used_guests;
        let excluded = |guest: &str| presence.contains(guest) || used.contains(guest);

        match select_guest(&item.affinity, &mut *self.rng, excluded) {
            Some(name) => match catalog.lookup_guest(name) {
                Ok(guest) => Some(guest),
                Err(e) => {
                    warn!("[Schedule] '{}' affinity table: {}", item.name, e);
                    None
                }
            },
            None => resolve_fallback(self.fallback, catalog, excluded),
        }
    }
}

impl VisitSchedule {
    /// One build pass over `items`, each covering its full duration from
    /// `start`, sharing a single used-guest set. The result is arbitrated.
    pub fn build<R: Rng>(
        items: &[&ItemDef],
        start: Timestamp,
        catalog: &Catalog,
        presence: &GuestPresence,
        fallback: &SelectionFallback,
        rng: &mut R,
    ) -> Self {
        let mut builder = ScheduleBuilder::new(catalog, presence, fallback, rng);
        for item in items {
            builder.add_item(item, start, item.duration_hours);
        }
        builder.finish()
    }
}
