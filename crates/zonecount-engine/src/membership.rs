//! Zone membership evaluation.
//!
//! Each zone keeps the set of persons currently inside it. Every frame the
//! observed persons are re-tested against the polygon and the difference
//! against the stored set yields enter and exit transitions. A member absent
//! from the frame's occupants exits in that frame.
//!
//! A frame with no detections at all leaves the stored set untouched; open
//! visits of a lost person are closed at finalization instead.

use std::collections::BTreeSet;

use zonecount_models::{Detection, Point, Zone, ZoneKind};

use crate::config::MembershipMode;
use crate::geometry::{box_overlap_fraction, point_in_polygon};
use crate::line_crossing::PersonId;

/// Membership transitions produced by one frame for one zone.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MembershipDiff {
    pub entered: Vec<PersonId>,
    pub exited: Vec<PersonId>,
    /// Observed persons inside the zone in this frame
    pub occupants: usize,
}

impl MembershipDiff {
    pub fn is_empty(&self) -> bool {
        self.entered.is_empty() && self.exited.is_empty()
    }
}

/// Membership state for one zone, in pixel space.
#[derive(Debug, Clone)]
pub struct ZoneMembership {
    name: String,
    kind: ZoneKind,
    polygon: Vec<Point>,
    members: BTreeSet<PersonId>,
}

impl ZoneMembership {
    /// Scale a zone to the frame resolution.
    pub fn new(zone: &Zone, width: f64, height: f64) -> Self {
        Self {
            name: zone.name.clone(),
            kind: zone.kind,
            polygon: zone.pixel_polygon(width, height),
            members: BTreeSet::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> ZoneKind {
        self.kind
    }

    /// Whether a detection counts as inside this zone.
    pub fn contains(&self, detection: &Detection, mode: MembershipMode) -> bool {
        match mode {
            MembershipMode::Centroid => point_in_polygon(detection.centroid(), &self.polygon),
            MembershipMode::BoxOverlap { min_fraction } => {
                box_overlap_fraction(&detection.bounding_box, &self.polygon) >= min_fraction
            }
        }
    }

    /// Re-test the observed persons and apply the difference.
    ///
    /// Entries are listed in the order of `observed`, exits in person id order.
    pub fn evaluate(
        &mut self,
        observed: &[(PersonId, &Detection)],
        mode: MembershipMode,
    ) -> MembershipDiff {
        let mut diff = MembershipDiff::default();
        if observed.is_empty() {
            return diff;
        }

        let mut current = BTreeSet::new();
        for &(person, detection) in observed {
            if self.contains(detection, mode)
                && current.insert(person)
                && !self.members.contains(&person)
            {
                diff.entered.push(person);
            }
        }
        diff.exited = self.members.difference(&current).copied().collect();
        diff.occupants = current.len();
        self.members = current;

        diff
    }

    pub fn is_member(&self, person: PersonId) -> bool {
        self.members.contains(&person)
    }

    /// Persons currently considered inside.
    pub fn members(&self) -> impl Iterator<Item = PersonId> + '_ {
        self.members.iter().copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use zonecount_models::BoundingBox;

    fn zone() -> ZoneMembership {
        let zone = Zone::new(
            "queue",
            ZoneKind::Customer,
            vec![
                Point::new(0.0, 0.0),
                Point::new(0.5, 0.0),
                Point::new(0.5, 0.5),
                Point::new(0.0, 0.5),
            ],
        );
        // 200x200 frame -> zone covers [0,100]x[0,100]
        ZoneMembership::new(&zone, 200.0, 200.0)
    }

    fn at(track: u64, x: f64, y: f64) -> Detection {
        Detection::centered(track, Point::new(x, y), 20.0, 40.0)
    }

    #[test]
    fn test_enter_then_exit() {
        let mut zone = zone();
        let inside = at(1, 50.0, 50.0);
        let outside = at(1, 150.0, 50.0);

        let diff = zone.evaluate(&[(1, &inside)], MembershipMode::Centroid);
        assert_eq!(diff.entered, vec![1]);
        assert_eq!(diff.occupants, 1);

        let diff = zone.evaluate(&[(1, &inside)], MembershipMode::Centroid);
        assert!(diff.is_empty());

        let diff = zone.evaluate(&[(1, &outside)], MembershipMode::Centroid);
        assert_eq!(diff.exited, vec![1]);
        assert_eq!(diff.occupants, 0);
        assert!(!zone.is_member(1));
    }

    #[test]
    fn test_missing_person_exits() {
        let mut zone = zone();
        let first = at(1, 50.0, 50.0);
        let second = at(2, 60.0, 60.0);
        zone.evaluate(&[(1, &first), (2, &second)], MembershipMode::Centroid);

        // Person 1 drops out while person 2 is still detected
        let diff = zone.evaluate(&[(2, &second)], MembershipMode::Centroid);
        assert_eq!(diff.exited, vec![1]);
        assert!(diff.entered.is_empty());
        assert_eq!(diff.occupants, 1);
        assert!(!zone.is_member(1));
        assert_eq!(zone.members().collect::<Vec<_>>(), vec![2]);
    }

    #[test]
    fn test_empty_frame_keeps_membership() {
        let mut zone = zone();
        let inside = at(1, 50.0, 50.0);
        zone.evaluate(&[(1, &inside)], MembershipMode::Centroid);

        let diff = zone.evaluate(&[], MembershipMode::Centroid);
        assert!(diff.is_empty());
        assert_eq!(diff.occupants, 0);
        assert!(zone.is_member(1));
    }

    #[test]
    fn test_box_overlap_mode() {
        let zone = zone();
        // Centroid outside (x=105) but 40% of the box is inside
        let straddling = Detection::new(1, BoundingBox::new(80.0, 20.0, 130.0, 60.0), 0.9);
        assert!(!zone.contains(&straddling, MembershipMode::Centroid));
        assert!(zone.contains(&straddling, MembershipMode::BoxOverlap { min_fraction: 0.2 }));
        assert!(!zone.contains(&straddling, MembershipMode::BoxOverlap { min_fraction: 0.5 }));
    }
}
