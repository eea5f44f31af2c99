//! Cross-item conflict resolution.
//!
//! Schedules for different items are generated independently, so one guest
//! can end up booked at two items at once. Arbitration keeps exactly one
//! visit out of every overlapping group for a guest.

use bevy::prelude::*;
use std::collections::{HashMap, HashSet};

use crate::shared::*;

use super::schedule::VisitSchedule;

/// Rank of `guest` in `item`'s affinity table. Unknown names rank last.
pub fn affinity_rank(catalog: &Catalog, item: &str, guest: &str) -> usize {
    catalog
        .items
        .get(item)
        .and_then(|def| def.affinity.rank_of(guest))
        .unwrap_or(usize::MAX)
}

/// Resolve overlaps with nothing pinned. Returns the number of visits dropped.
pub fn arbitrate(schedule: &mut VisitSchedule, catalog: &Catalog) -> usize {
    arbitrate_at(schedule, catalog, None)
}

/// Resolve overlaps for every guest.
///
/// Visits are accepted greedily in priority order and a visit is dropped iff
/// it overlaps one already kept for the same guest. Priority, best first:
/// already exposed (`arrival <= exposed_before`), lower affinity rank, earlier
/// arrival, then item order and position within the item.
pub fn arbitrate_at(
    schedule: &mut VisitSchedule,
    catalog: &Catalog,
    exposed_before: Option<Timestamp>,
) -> usize {
    let mut order: Vec<(bool, usize, Timestamp, usize, usize)> = Vec::with_capacity(schedule.len());
    for (entry_idx, entry) in schedule.entries().iter().enumerate() {
        for (visit_idx, visit) in entry.visits.iter().enumerate() {
            let pinned = exposed_before.is_some_and(|now| visit.has_arrived(now));
            order.push((
                !pinned,
                affinity_rank(catalog, &entry.item, &visit.guest),
                visit.arrival,
                entry_idx,
                visit_idx,
            ));
        }
    }
    order.sort();

    let mut kept: HashMap<&str, Vec<&Visit>> = HashMap::new();
    let mut dropped: HashSet<(usize, usize)> = HashSet::new();
    let entries = schedule.entries();
    for &(_, _, _, entry_idx, visit_idx) in &order {
        let visit = &entries[entry_idx].visits[visit_idx];
        let booked = kept.entry(visit.guest.as_str()).or_default();
        if booked.iter().any(|other| other.overlaps(visit)) {
            debug!(
                "[Arbitration] Dropping {} at '{}' ({})",
                visit.guest, visit.item, visit.arrival
            );
            dropped.insert((entry_idx, visit_idx));
        } else {
            booked.push(visit);
        }
    }

    if dropped.is_empty() {
        return 0;
    }

    for (entry_idx, entry) in schedule.entries_mut().iter_mut().enumerate() {
        let mut visit_idx = 0;
        entry.visits.retain(|_| {
            let keep = !dropped.contains(&(entry_idx, visit_idx));
            visit_idx += 1;
            keep
        });
    }

    info!("[Arbitration] Dropped {} conflicting visit(s)", dropped.len());
    dropped.len()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone, Utc};

    fn t(minutes: i64) -> Timestamp {
        Utc.with_ymd_and_hms(2026, 3, 1, 9, 0, 0).unwrap() + Duration::minutes(minutes)
    }

    fn visit(item: &str, guest: &str, from: i64, to: i64) -> Visit {
        Visit {
            item: item.into(),
            guest: guest.into(),
            arrival: t(from),
            departure: t(to),
            coins: 1,
            friendship: 1,
        }
    }

    fn item(name: &str, bands: &[(&str, f64)]) -> ItemDef {
        ItemDef {
            name: name.into(),
            price: 1,
            duration_hours: 4,
            max_visits_per_hour: 2,
            affinity: AffinityTable::new(bands.iter().copied()).unwrap(),
        }
    }

    /// Gizmo is rare on the Ball and common on the Wheel.
    fn catalog() -> Catalog {
        let mut catalog = Catalog::default();
        catalog.insert_item(item("Ball", &[("Gizmo", 0.1), ("Bear", 1.0)]));
        catalog.insert_item(item("Wheel", &[("Bear", 0.3), ("Gizmo", 1.0)]));
        catalog.insert_item(item("Tunnel", &[("Gizmo", 0.5), ("Bear", 1.0)]));
        catalog
    }

    fn assert_exclusive(schedule: &VisitSchedule) {
        let all: Vec<&Visit> = schedule.iter().collect();
        for (i, a) in all.iter().enumerate() {
            for b in &all[i + 1..] {
                assert!(
                    a.guest != b.guest || !a.overlaps(b),
                    "{} double-booked: {:?} / {:?}",
                    a.guest,
                    a,
                    b
                );
            }
        }
    }

    #[test]
    fn test_rarer_rank_wins() {
        let mut schedule = VisitSchedule::from_visits([
            visit("Wheel", "Gizmo", 0, 30),
            visit("Ball", "Gizmo", 10, 40),
        ]);
        assert_eq!(arbitrate(&mut schedule, &catalog()), 1);
        assert_eq!(schedule.visits("Ball").len(), 1);
        assert!(schedule.visits("Wheel").is_empty());
    }

    #[test]
    fn test_equal_rank_earlier_arrival_wins() {
        let mut schedule = VisitSchedule::from_visits([
            visit("Ball", "Gizmo", 20, 50),
            visit("Tunnel", "Gizmo", 5, 30),
        ]);
        arbitrate(&mut schedule, &catalog());
        assert!(schedule.visits("Ball").is_empty());
        assert_eq!(schedule.visits("Tunnel").len(), 1);
    }

    #[test]
    fn test_full_tie_keeps_first_item() {
        let mut schedule = VisitSchedule::from_visits([
            visit("Tunnel", "Gizmo", 0, 30),
            visit("Ball", "Gizmo", 0, 30),
        ]);
        arbitrate(&mut schedule, &catalog());
        assert_eq!(schedule.visits("Tunnel").len(), 1);
        assert!(schedule.visits("Ball").is_empty());
    }

    #[test]
    fn test_touching_visits_do_not_conflict() {
        let mut schedule = VisitSchedule::from_visits([
            visit("Ball", "Gizmo", 0, 30),
            visit("Wheel", "Gizmo", 30, 60),
        ]);
        assert_eq!(arbitrate(&mut schedule, &catalog()), 0);
        assert_eq!(schedule.len(), 2);
    }

    #[test]
    fn test_exposed_visit_is_never_displaced() {
        let mut schedule = VisitSchedule::from_visits([
            visit("Wheel", "Gizmo", 0, 60),
            visit("Ball", "Gizmo", 20, 40),
        ]);
        arbitrate_at(&mut schedule, &catalog(), Some(t(5)));
        assert_eq!(schedule.visits("Wheel").len(), 1);
        assert!(schedule.visits("Ball").is_empty());
    }

    #[test]
    fn test_unknown_item_ranks_last() {
        let mut schedule = VisitSchedule::from_visits([
            visit("Mystery", "Gizmo", 0, 30),
            visit("Wheel", "Gizmo", 10, 20),
        ]);
        arbitrate(&mut schedule, &catalog());
        assert!(schedule.visits("Mystery").is_empty());
        assert_eq!(affinity_rank(&catalog(), "Mystery", "Gizmo"), usize::MAX);
    }

    #[test]
    fn test_chain_of_conflicts_leaves_guest_exclusive() {
        let mut schedule = VisitSchedule::from_visits([
            visit("Ball", "Bear", 0, 20),
            visit("Wheel", "Bear", 15, 35),
            visit("Tunnel", "Bear", 30, 50),
            visit("Ball", "Gizmo", 25, 45),
            visit("Wheel", "Gizmo", 0, 100),
        ]);
        arbitrate(&mut schedule, &catalog());
        assert_exclusive(&schedule);
        // Bear ranks 0 on the Wheel, so the Wheel visit wins and knocks out
        // both neighbours.
        assert_eq!(schedule.visits("Wheel").iter().filter(|v| v.guest == "Bear").count(), 1);
        assert!(schedule.visits("Tunnel").is_empty());
    }
}
