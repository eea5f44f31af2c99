//! Single-visit generation: timing and rewards for one (item, guest) pair.

use chrono::Duration;
use rand::Rng;

use crate::shared::*;

/// Build one visit that starts no earlier than `not_before`.
///
/// Arrival jitter is drawn in whole seconds from the guest's arrival range.
/// The stay is drawn from the departure range scaled by [`DEPARTURE_SCALE`],
/// with a floor of [`MIN_STAY_SECS`]. Both rewards are inclusive integer draws.
pub fn generate_visit<R: Rng>(
    item: &ItemDef,
    guest: &GuestDef,
    not_before: Timestamp,
    rng: &mut R,
) -> Visit {
    let arrival_secs = draw_seconds(guest.arrival_delay_minutes, 1, rng);
    let stay_secs = draw_seconds(guest.departure_delay_minutes, DEPARTURE_SCALE, rng).max(MIN_STAY_SECS);

    let arrival = not_before + Duration::seconds(arrival_secs);
    let departure = arrival + Duration::seconds(stay_secs);

    Visit {
        item: item.name.clone(),
        guest: guest.name.clone(),
        arrival,
        departure,
        coins: draw_inclusive(guest.coin_reward, rng),
        friendship: draw_inclusive(guest.friendship_reward, rng),
    }
}

fn draw_seconds<R: Rng>((min, max): (u32, u32), scale: i64, rng: &mut R) -> i64 {
    let lo = min as i64 * SECONDS_PER_MINUTE * scale;
    let hi = max as i64 * SECONDS_PER_MINUTE * scale;
    if hi <= lo {
        return lo;
    }
    rng.gen_range(lo..=hi)
}

/// Uniform inclusive draw over a reward range. Inverted ranges yield `min`.
pub(crate) fn draw_inclusive<R: Rng>((min, max): (u32, u32), rng: &mut R) -> u32 {
    if max <= min {
        return min;
    }
    rng.gen_range(min..=max)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn guest(arrival: (u32, u32), departure: (u32, u32)) -> GuestDef {
        GuestDef {
            name: "Pudding".into(),
            personality: "curious".into(),
            arrival_delay_minutes: arrival,
            departure_delay_minutes: departure,
            power_level: 3,
            coin_reward: (4, 9),
            friendship_reward: (1, 3),
        }
    }

    fn ball() -> ItemDef {
        ItemDef {
            name: "Ball".into(),
            price: 30,
            duration_hours: 6,
            max_visits_per_hour: 2,
            affinity: AffinityTable::new([("Pudding", 1.0)]).unwrap(),
        }
    }

    fn start() -> Timestamp {
        Utc.with_ymd_and_hms(2026, 3, 1, 9, 0, 0).unwrap()
    }

    #[test]
    fn test_visit_windows_follow_guest_ranges() {
        let item = ball();
        let pudding = guest((5, 15), (1, 5));
        let mut rng = StdRng::seed_from_u64(1);

        for _ in 0..1_000 {
            let v = generate_visit(&item, &pudding, start(), &mut rng);
            let arrival_offset = (v.arrival - start()).num_seconds();
            let stay = (v.departure - v.arrival).num_seconds();
            assert!((300..=900).contains(&arrival_offset), "arrival offset {}", arrival_offset);
            assert!((600..=3000).contains(&stay), "stay {}", stay);
            assert!((4..=9).contains(&v.coins));
            assert!((1..=3).contains(&v.friendship));
            assert_eq!(v.item, "Ball");
            assert_eq!(v.guest, "Pudding");
        }
    }

    #[test]
    fn test_zero_stay_range_still_departs_after_arrival() {
        let item = ball();
        let blink = guest((0, 0), (0, 0));
        let mut rng = StdRng::seed_from_u64(2);
        let v = generate_visit(&item, &blink, start(), &mut rng);
        assert_eq!(v.arrival, start());
        assert!(v.departure > v.arrival);
    }

    #[test]
    fn test_degenerate_ranges_are_exact() {
        let item = ball();
        let mut fixed = guest((10, 10), (2, 2));
        fixed.coin_reward = (7, 7);
        fixed.friendship_reward = (2, 2);
        let mut rng = StdRng::seed_from_u64(3);
        let v = generate_visit(&item, &fixed, start(), &mut rng);
        assert_eq!((v.arrival - start()).num_seconds(), 600);
        assert_eq!((v.departure - v.arrival).num_seconds(), 1_200);
        assert_eq!(v.coins, 7);
        assert_eq!(v.friendship, 2);
    }

    #[test]
    fn test_same_seed_same_visit() {
        let item = ball();
        let pudding = guest((5, 15), (1, 5));
        let a = generate_visit(&item, &pudding, start(), &mut StdRng::seed_from_u64(11));
        let b = generate_visit(&item, &pudding, start(), &mut StdRng::seed_from_u64(11));
        assert_eq!(a, b);
    }
}
