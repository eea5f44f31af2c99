//! The biome: slots, their schedule, and which guests are out visiting.

use bevy::prelude::*;
use chrono::Duration;
use rand::Rng;

use crate::config::SelectionFallback;
use crate::error::BiomeError;
use crate::shared::*;
use crate::visits::{arbitrate_at, ScheduleBuilder, VisitSchedule};

use super::presence::GuestPresence;
use super::slot::{PlacedItem, Slot, SlotPhase};

/// Everything needed to build visits for a slot.
pub struct BuildContext<'a, R: Rng> {
    pub catalog: &'a Catalog,
    pub fallback: &'a SelectionFallback,
    pub rng: &'a mut R,
}

/// Result of taking an item out of a slot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Removal {
    pub item: ItemId,
    /// Gifts settled on the way out, including the active visit if any.
    pub gifts: Vec<Gift>,
}

#[derive(Resource, Debug, Clone, PartialEq, Eq)]
pub struct Biome {
    slots: Vec<Slot>,
    schedule: VisitSchedule,
    presence: GuestPresence,
    /// Latest instant ever observed. Observation never goes back past it.
    watermark: Option<Timestamp>,
}

impl Biome {
    pub fn new(slot_count: usize) -> Self {
        Self {
            slots: vec![Slot::default(); slot_count],
            schedule: VisitSchedule::default(),
            presence: GuestPresence::default(),
            watermark: None,
        }
    }

    /// Rebuild from saved parts. Presence is left empty; the first
    /// [`Biome::observe`] recomputes it from the visits.
    pub fn from_parts(slots: Vec<Slot>, schedule: VisitSchedule) -> Self {
        Self {
            slots,
            schedule,
            presence: GuestPresence::default(),
            watermark: None,
        }
    }

    // ─── Reads ────────────────────────────────────────────────────────────

    pub fn slot_count(&self) -> usize {
        self.slots.len()
    }

    pub fn slots(&self) -> &[Slot] {
        &self.slots
    }

    pub fn slot(&self, index: usize) -> Result<&Slot, BiomeError> {
        self.slots.get(index).ok_or(BiomeError::SlotOutOfRange {
            slot: index,
            slot_count: self.slots.len(),
        })
    }

    pub fn schedule(&self) -> &VisitSchedule {
        &self.schedule
    }

    pub fn presence(&self) -> &GuestPresence {
        &self.presence
    }

    pub fn watermark(&self) -> Option<Timestamp> {
        self.watermark
    }

    /// Slot currently holding `item`, if any.
    pub fn slot_of(&self, item: &str) -> Option<usize> {
        self.slots.iter().position(|s| s.item() == Some(item))
    }

    /// Phase of slot `index` at `now`. Does not change anything.
    pub fn slot_phase(&self, index: usize, now: Timestamp) -> Result<SlotPhase<'_>, BiomeError> {
        let slot = self.slot(index)?;
        Ok(match slot.item() {
            None => SlotPhase::Empty,
            Some(item) => SlotPhase::of(self.schedule.front(item), now),
        })
    }

    // ─── Observation ──────────────────────────────────────────────────────

    /// Settle everything that happened up to `now`.
    ///
    /// Departures across all slots are handled before arrivals, so a guest
    /// leaving one slot can show up at another in the same observation. Each
    /// departed visit yields one gift and leaves the schedule for good.
    pub fn observe(&mut self, now: Timestamp) -> Vec<Gift> {
        let now = self.advance_watermark(now);
        let mut gifts = Vec::new();

        for slot in &self.slots {
            let Some(item) = slot.item() else { continue };
            while let Some(visit) = self.schedule.pop_departed(item, now) {
                self.presence.depart(&visit.guest);
                info!(
                    "[Biome] {} left '{}' with {} coins, {} friendship",
                    visit.guest, visit.item, visit.coins, visit.friendship
                );
                gifts.push(visit.to_gift());
            }
        }

        for slot in &self.slots {
            let Some(item) = slot.item() else { continue };
            if let Some(visit) = self.schedule.front(item) {
                if visit.is_active(now) && self.presence.arrive(&visit.guest) {
                    debug!("[Biome] {} arrived at '{}'", visit.guest, item);
                }
            }
        }

        gifts
    }

    fn advance_watermark(&mut self, now: Timestamp) -> Timestamp {
        let now = match self.watermark {
            Some(seen) if seen > now => seen,
            _ => now,
        };
        self.watermark = Some(now);
        now
    }

    // ─── Commands ─────────────────────────────────────────────────────────

    /// Put `item` into slot `index`, replacing whatever was there, and build
    /// its schedule for the item's full duration.
    ///
    /// Returns gifts settled along the way. Fails without changing anything
    /// if the slot or item is unknown or the item already sits in another
    /// slot. Placing an item into the slot that holds it replaces it.
    pub fn place_item<R: Rng>(
        &mut self,
        index: usize,
        item: &str,
        now: Timestamp,
        ctx: BuildContext<'_, R>,
    ) -> Result<Vec<Gift>, BiomeError> {
        self.slot(index)?;
        let def = ctx.catalog.lookup_item(item)?;
        if let Some(existing) = self.slot_of(item).filter(|&slot| slot != index) {
            return Err(BiomeError::ItemAlreadyPlaced {
                item: item.to_string(),
                slot: existing,
            });
        }

        let mut gifts = if self.slots[index].is_empty() {
            self.observe(now)
        } else {
            self.remove_item(index, now)?.gifts
        };
        let now = self.advance_watermark(now);

        let placed = PlacedItem::new(def, now);
        let mut builder = ScheduleBuilder::new(ctx.catalog, &self.presence, ctx.fallback, ctx.rng);
        builder.add_item(def, now, def.duration_hours);
        let built = builder.finish();
        self.schedule.merge(built, false);
        arbitrate_at(&mut self.schedule, ctx.catalog, Some(now));

        info!(
            "[Biome] Placed '{}' in slot {} ({} visit(s) scheduled)",
            item,
            index,
            self.schedule.visits(item).len()
        );
        self.slots[index].placed = Some(placed);
        gifts.extend(self.observe(now));
        Ok(gifts)
    }

    /// Take the item out of slot `index`.
    ///
    /// Observes first. A guest still active at the item leaves with its gift;
    /// a pending visit is simply cancelled.
    pub fn remove_item(&mut self, index: usize, now: Timestamp) -> Result<Removal, BiomeError> {
        let item = self
            .slot(index)?
            .item()
            .map(str::to_string)
            .ok_or(BiomeError::SlotEmpty { slot: index })?;

        let mut gifts = self.observe(now);
        let now = self.advance_watermark(now);

        let mut remaining = self.schedule.remove_item(&item);
        if remaining.first().is_some_and(|front| front.is_active(now)) {
            let front = remaining.remove(0);
            self.presence.depart(&front.guest);
            info!("[Biome] {} left '{}' early (item removed)", front.guest, item);
            gifts.push(front.to_gift());
        }
        self.slots[index].placed = None;

        info!(
            "[Biome] Removed '{}' from slot {} ({} visit(s) cancelled)",
            item,
            index,
            remaining.len()
        );
        Ok(Removal { item, gifts })
    }

    /// Restore the item in slot `index` to full freshness and schedule the
    /// new span. A guest already at the item stays; everything else that had
    /// not arrived yet is rebuilt.
    pub fn refill_slot<R: Rng>(
        &mut self,
        index: usize,
        now: Timestamp,
        ctx: BuildContext<'_, R>,
    ) -> Result<Vec<Gift>, BiomeError> {
        let item = self
            .slot(index)?
            .item()
            .map(str::to_string)
            .ok_or(BiomeError::SlotEmpty { slot: index })?;
        let def = ctx.catalog.lookup_item(&item)?;

        let gifts = self.observe(now);
        let now = self.advance_watermark(now);

        self.schedule.retain_arrived(&item, now);
        let start = match self.schedule.front(&item) {
            Some(active) if active.departure > now => active.departure,
            _ => now,
        };

        let mut builder = ScheduleBuilder::new(ctx.catalog, &self.presence, ctx.fallback, ctx.rng);
        builder.add_item(def, start, def.duration_hours);
        let built = builder.finish();
        self.schedule.merge(built, true);
        arbitrate_at(&mut self.schedule, ctx.catalog, Some(now));

        if let Some(placed) = self.slots[index].placed.as_mut() {
            placed.placed_at = now;
            placed.fresh_until = now + Duration::hours(def.duration_hours as i64);
            placed.mark_built(start);
        }
        info!("[Biome] Refilled '{}' in slot {}", item, index);
        Ok(gifts)
    }

    /// Build new visits for every slot whose schedule has run out while its
    /// item still has at least one whole hour of freshness. A slot is not
    /// rebuilt again until an hour after its previous build started. Returns
    /// the slots that were rescheduled.
    pub fn reschedule_exhausted<R: Rng>(
        &mut self,
        now: Timestamp,
        mut ctx: BuildContext<'_, R>,
    ) -> Vec<(usize, ItemId)> {
        let now = self.advance_watermark(now);
        let mut rescheduled = Vec::new();

        for index in 0..self.slots.len() {
            let Some(placed) = self.slots[index].placed.as_ref() else { continue };
            if !self.schedule.visits(&placed.item).is_empty() || now < placed.rebuild_after {
                continue;
            }
            let hours = placed.fresh_hours_remaining(now);
            if hours == 0 {
                continue;
            }
            let def = match ctx.catalog.lookup_item(&placed.item) {
                Ok(def) => def,
                Err(e) => {
                    warn!("[Biome] Cannot reschedule slot {}: {}", index, e);
                    continue;
                }
            };

            let mut builder = ScheduleBuilder::new(ctx.catalog, &self.presence, ctx.fallback, &mut *ctx.rng);
            builder.add_item(def, now, hours);
            self.schedule.merge(builder.finish(), false);
            arbitrate_at(&mut self.schedule, ctx.catalog, Some(now));

            let item = def.name.clone();
            if let Some(placed) = self.slots[index].placed.as_mut() {
                placed.mark_built(now);
            }
            info!(
                "[Biome] Rescheduled '{}' in slot {} for {} hour(s): {} visit(s)",
                item,
                index,
                hours,
                self.schedule.visits(&item).len()
            );
            rescheduled.push((index, item));
        }

        rescheduled
    }
}
