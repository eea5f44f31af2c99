use crate::shared::*;

/// Populate the catalog with the ten resident hamsters.
///
/// Guests:
///   1. Gizmo    tinkerer, the rarest visitor, big gifts
///   2. Bear     sleepy heavyweight, long stays
///   3. Pudding  curious, quick in and out
///   4. Mochi    sweet-toothed, shows up fast
///   5. Peanut   restless sprinter
///   6. Nugget   hoarder, stays for snacks
///   7. Clover   shy, arrives late
///   8. Pepper   bossy, short visits
///   9. Hazel    gentle climber
///  10. Biscuit  easygoing regular, small gifts
pub fn populate_guests(catalog: &mut Catalog) {
    let guests = [
        guest("Gizmo", "tinkerer", (10, 20), (3, 5), 9, (40, 60), (8, 12)),
        guest("Bear", "sleepy", (5, 15), (4, 6), 7, (20, 35), (5, 8)),
        guest("Pudding", "curious", (2, 8), (1, 3), 5, (10, 20), (3, 6)),
        guest("Mochi", "sweet-toothed", (1, 5), (2, 4), 4, (8, 15), (3, 5)),
        guest("Peanut", "restless", (1, 4), (1, 2), 3, (5, 12), (2, 4)),
        guest("Nugget", "hoarder", (3, 10), (2, 5), 4, (10, 18), (2, 5)),
        guest("Clover", "shy", (8, 20), (1, 3), 3, (6, 12), (4, 7)),
        guest("Pepper", "bossy", (2, 6), (1, 2), 2, (5, 10), (1, 3)),
        guest("Hazel", "gentle", (4, 12), (2, 4), 2, (4, 9), (2, 4)),
        guest("Biscuit", "easygoing", (1, 5), (1, 3), 1, (2, 6), (1, 3)),
    ];
    for g in guests {
        catalog.insert_guest(g);
    }
}

fn guest(
    name: &str,
    personality: &str,
    arrival_delay_minutes: (u32, u32),
    departure_delay_minutes: (u32, u32),
    power_level: u8,
    coin_reward: (u32, u32),
    friendship_reward: (u32, u32),
) -> GuestDef {
    GuestDef {
        name: name.into(),
        personality: personality.into(),
        arrival_delay_minutes,
        departure_delay_minutes,
        power_level,
        coin_reward,
        friendship_reward,
    }
}
