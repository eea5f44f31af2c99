//! Guest selection from an item's affinity table.
//!
//! A single uniform draw picks a band; excluded guests are skipped by walking
//! forward through the table, never by drawing again. A rare guest who is
//! already busy therefore hands the draw to the next commoner guest.

use rand::Rng;

use crate::config::SelectionFallback;
use crate::shared::*;

// ─── Selection ───────────────────────────────────────────────────────────────

/// Pick a guest for one visit.
///
/// Returns `None` when every band at or above the draw is excluded.
pub fn select_guest<'a, R: Rng>(
    table: &'a AffinityTable,
    rng: &mut R,
    is_excluded: impl Fn(&str) -> bool,
) -> Option<&'a GuestId> {
    let draw: f64 = rng.gen_range(0.0..1.0);
    select_guest_with_draw(table, draw, is_excluded)
}

/// Deterministic core of [`select_guest`] for a known draw in [0, 1).
pub fn select_guest_with_draw<'a>(
    table: &'a AffinityTable,
    draw: f64,
    is_excluded: impl Fn(&str) -> bool,
) -> Option<&'a GuestId> {
    table
        .entries()
        .iter()
        .filter(|entry| entry.threshold > draw)
        .find(|entry| !is_excluded(&entry.guest))
        .map(|entry| &entry.guest)
}

/// Apply the configured policy after a failed selection.
///
/// The fallback guest must exist in the catalog and must not be excluded;
/// otherwise the visit is skipped as well.
pub fn resolve_fallback<'a>(
    fallback: &SelectionFallback,
    catalog: &'a Catalog,
    is_excluded: impl Fn(&str) -> bool,
) -> Option<&'a GuestDef> {
    match fallback {
        SelectionFallback::Skip => None,
        SelectionFallback::Guest(name) => {
            if is_excluded(name) {
                return None;
            }
            catalog.guests.get(name)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::collections::HashMap;

    fn ball_table() -> AffinityTable {
        AffinityTable::new([
            ("Gizmo", 0.1),
            ("Bear", 0.2),
            ("Pudding", 0.35),
            ("Mochi", 0.5),
            ("Peanut", 0.7),
            ("Biscuit", 1.0),
        ])
        .unwrap()
    }

    fn nobody(_: &str) -> bool {
        false
    }

    #[test]
    fn test_draw_picks_first_band_above() {
        let table = ball_table();
        assert_eq!(select_guest_with_draw(&table, 0.05, nobody).unwrap(), "Gizmo");
        assert_eq!(select_guest_with_draw(&table, 0.15, nobody).unwrap(), "Bear");
        assert_eq!(select_guest_with_draw(&table, 0.95, nobody).unwrap(), "Biscuit");
    }

    #[test]
    fn test_band_edges_belong_to_the_next_guest() {
        let table = ball_table();
        assert_eq!(select_guest_with_draw(&table, 0.0, nobody).unwrap(), "Gizmo");
        assert_eq!(select_guest_with_draw(&table, 0.1, nobody).unwrap(), "Bear");
        assert_eq!(select_guest_with_draw(&table, 0.999_999, nobody).unwrap(), "Biscuit");
    }

    #[test]
    fn test_excluded_guest_yields_to_next_entry_without_reroll() {
        let table = ball_table();
        let no_gizmo = |g: &str| g == "Gizmo";
        assert_eq!(select_guest_with_draw(&table, 0.15, no_gizmo).unwrap(), "Bear");
        // A draw inside Gizmo's band walks forward to Bear, it is not redrawn.
        assert_eq!(select_guest_with_draw(&table, 0.05, no_gizmo).unwrap(), "Bear");
    }

    #[test]
    fn test_excluded_chain_skips_several_entries() {
        let table = ball_table();
        let busy = |g: &str| matches!(g, "Gizmo" | "Bear" | "Pudding");
        assert_eq!(select_guest_with_draw(&table, 0.01, busy).unwrap(), "Mochi");
    }

    #[test]
    fn test_exhausted_table_returns_none() {
        let table = ball_table();
        let everyone_busy = |_: &str| true;
        assert!(select_guest_with_draw(&table, 0.3, everyone_busy).is_none());

        // Only entries above the draw are eligible; Gizmo is free but below it.
        let only_gizmo_free = |g: &str| g != "Gizmo";
        assert!(select_guest_with_draw(&table, 0.5, only_gizmo_free).is_none());
    }

    #[test]
    fn test_random_selection_always_returns_table_member() {
        let table = ball_table();
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..500 {
            let guest = select_guest(&table, &mut rng, nobody).unwrap();
            assert!(table.rank_of(guest).is_some());
        }
    }

    #[test]
    fn test_selection_frequencies_follow_band_widths() {
        let table = ball_table();
        let mut rng = StdRng::seed_from_u64(99);
        let mut counts: HashMap<String, u32> = HashMap::new();
        let trials = 20_000;
        for _ in 0..trials {
            let guest = select_guest(&table, &mut rng, nobody).unwrap();
            *counts.entry(guest.clone()).or_insert(0) += 1;
        }
        let share = |g: &str| counts.get(g).copied().unwrap_or(0) as f64 / trials as f64;
        assert!((share("Gizmo") - 0.10).abs() < 0.02);
        assert!((share("Biscuit") - 0.30).abs() < 0.02);
    }

    #[test]
    fn test_fallback_policy() {
        let mut catalog = Catalog::default();
        catalog.insert_guest(GuestDef {
            name: "Biscuit".into(),
            personality: "easygoing".into(),
            arrival_delay_minutes: (1, 2),
            departure_delay_minutes: (1, 2),
            power_level: 1,
            coin_reward: (1, 1),
            friendship_reward: (1, 1),
        });

        assert!(resolve_fallback(&SelectionFallback::Skip, &catalog, nobody).is_none());

        let biscuit = SelectionFallback::Guest("Biscuit".into());
        assert_eq!(resolve_fallback(&biscuit, &catalog, nobody).unwrap().name, "Biscuit");
        assert!(resolve_fallback(&biscuit, &catalog, |g| g == "Biscuit").is_none());

        let ghost = SelectionFallback::Guest("Ghost".into());
        assert!(resolve_fallback(&ghost, &catalog, nobody).is_none());
    }
}
