//! Which guests are currently visiting somewhere in the biome.

use std::collections::HashSet;

use crate::shared::*;

/// Guests that have arrived at some slot and not yet departed.
///
/// Owned by one [`super::Biome`]; schedule generation borrows it to keep busy
/// guests out of new visits. A name is present at most once.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GuestPresence {
    visiting: HashSet<GuestId>,
}

impl GuestPresence {
    /// Returns `false` if the guest was already marked present.
    pub fn arrive(&mut self, guest: &str) -> bool {
        if self.visiting.contains(guest) {
            return false;
        }
        self.visiting.insert(guest.to_string())
    }

    /// Returns `false` if the guest was not present.
    pub fn depart(&mut self, guest: &str) -> bool {
        self.visiting.remove(guest)
    }

    pub fn contains(&self, guest: &str) -> bool {
        self.visiting.contains(guest)
    }

    pub fn len(&self) -> usize {
        self.visiting.len()
    }

    pub fn is_empty(&self) -> bool {
        self.visiting.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.visiting.iter().map(|g| g.as_str())
    }

    pub fn clear(&mut self) {
        self.visiting.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_guest_present_at_most_once() {
        let mut presence = GuestPresence::default();
        assert!(presence.arrive("Gizmo"));
        assert!(!presence.arrive("Gizmo"));
        assert_eq!(presence.len(), 1);
        assert!(presence.contains("Gizmo"));
    }

    #[test]
    fn test_depart_is_idempotent() {
        let mut presence = GuestPresence::default();
        presence.arrive("Bear");
        assert!(presence.depart("Bear"));
        assert!(!presence.depart("Bear"));
        assert!(presence.is_empty());
    }
}
