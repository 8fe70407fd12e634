//! Portal proximity detection.
//!
//! The nearest portal strictly inside its radius is "proximate". Equal distances
//! resolve to the earlier portal in the list. Changes are reported once per
//! transition; entering a portal latches it out until the avatar leaves its radius.

use glam::Vec3;

use super::hub::PortalData;

/// What changed this tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ProximityUpdate {
    /// `Some(new)` when the proximate portal changed; `new` may be `None`.
    pub changed: Option<Option<usize>>,
    /// The latched portal was left and can be entered again.
    pub released: Option<usize>,
}

#[derive(Debug)]
pub struct ProximityDetector {
    portals: Vec<PortalData>,
    current: Option<usize>,
    dwell_ticks: u32,
    latched: Option<usize>,
}

impl ProximityDetector {
    pub fn new(portals: Vec<PortalData>) -> Self {
        Self {
            portals,
            current: None,
            dwell_ticks: 0,
            latched: None,
        }
    }

    pub fn portals(&self) -> &[PortalData] {
        &self.portals
    }

    pub fn current(&self) -> Option<usize> {
        self.current
    }

    pub fn current_portal(&self) -> Option<&PortalData> {
        self.current.and_then(|i| self.portals.get(i))
    }

    /// Ticks the current portal has stayed nearest. Zero when none.
    pub fn dwell_ticks(&self) -> u32 {
        self.dwell_ticks
    }

    /// Nearest portal containing `position`, ignoring latching.
    pub fn nearest(&self, position: Vec3) -> Option<usize> {
        self.nearest_except(position, None)
    }

    fn nearest_except(&self, position: Vec3, skip: Option<usize>) -> Option<usize> {
        let mut nearest: Option<(usize, f32)> = None;
        for (index, portal) in self.portals.iter().enumerate() {
            if Some(index) == skip {
                continue;
            }
            let distance = position.distance(portal.position);
            let closer = nearest.map_or(true, |(_, best)| distance < best);
            if distance < portal.radius && closer {
                nearest = Some((index, distance));
            }
        }
        nearest.map(|(index, _)| index)
    }

    /// Run one detection pass.
    pub fn update(&mut self, position: Vec3) -> ProximityUpdate {
        let mut update = ProximityUpdate::default();

        if let Some(latched) = self.latched {
            let inside = self
                .portals
                .get(latched)
                .is_some_and(|p| position.distance(p.position) < p.radius);
            if !inside {
                self.latched = None;
                update.released = Some(latched);
            }
        }

        let nearest = self.nearest_except(position, self.latched);
        if nearest != self.current {
            self.current = nearest;
            self.dwell_ticks = 0;
            update.changed = Some(nearest);
        }
        if self.current.is_some() {
            self.dwell_ticks += 1;
        }
        update
    }

    /// Enter the proximate portal. Clears proximity without reporting a change.
    pub fn enter(&mut self) -> Option<PortalData> {
        let index = self.current.take()?;
        self.dwell_ticks = 0;
        self.latched = Some(index);
        self.portals.get(index).cloned()
    }

    /// Enter by direct click; only the proximate portal can be clicked in.
    pub fn enter_clicked(&mut self, index: usize) -> Option<PortalData> {
        if self.current == Some(index) {
            self.enter()
        } else {
            None
        }
    }

    /// Forget proximity and latches (e.g. after returning to the hub).
    pub fn reset(&mut self) {
        self.current = None;
        self.dwell_ticks = 0;
        self.latched = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::simulation::hub::hub_portals;
    use kidquest_domain::WorldKey;

    fn portal(name: &str, x: f32, radius: f32) -> PortalData {
        PortalData::new(name, WorldKey::MathJungle, Vec3::new(x, 0.0, 0.0), Vec3::ONE)
            .with_radius(radius)
    }

    #[test]
    fn one_event_for_many_ticks_inside() {
        let mut detector = ProximityDetector::new(hub_portals());
        let near_math = Vec3::new(-13.0, 0.0, 0.0);

        let changes: Vec<_> = (0..120)
            .map(|_| detector.update(near_math))
            .filter_map(|u| u.changed)
            .collect();

        assert_eq!(changes, vec![Some(0)]);
        assert_eq!(detector.dwell_ticks(), 120);
    }

    #[test]
    fn leaving_reports_none_and_resets_dwell() {
        let mut detector = ProximityDetector::new(hub_portals());
        detector.update(Vec3::new(-13.0, 0.0, 0.0));
        let update = detector.update(Vec3::ZERO);
        assert_eq!(update.changed, Some(None));
        assert_eq!(detector.dwell_ticks(), 0);
    }

    #[test]
    fn radius_boundary_is_exclusive() {
        let detector = ProximityDetector::new(vec![portal("a", 0.0, 4.0)]);
        assert_eq!(detector.nearest(Vec3::new(4.0, 0.0, 0.0)), None);
        assert_eq!(detector.nearest(Vec3::new(3.99, 0.0, 0.0)), Some(0));
    }

    #[test]
    fn overlapping_radii_pick_strictly_nearer() {
        let detector =
            ProximityDetector::new(vec![portal("a", 0.0, 5.0), portal("b", 4.0, 5.0)]);
        assert_eq!(detector.nearest(Vec3::new(3.0, 0.0, 0.0)), Some(1));
        assert_eq!(detector.nearest(Vec3::new(1.0, 0.0, 0.0)), Some(0));
    }

    #[test]
    fn exact_tie_goes_to_first_portal() {
        let detector =
            ProximityDetector::new(vec![portal("a", 0.0, 5.0), portal("b", 4.0, 5.0)]);
        assert_eq!(detector.nearest(Vec3::new(2.0, 0.0, 0.0)), Some(0));
    }

    #[test]
    fn entered_portal_is_latched_until_left() {
        let mut detector = ProximityDetector::new(hub_portals());
        let near_math = Vec3::new(-13.0, 0.0, 0.0);
        detector.update(near_math);

        let entered = detector.enter().expect("proximate portal");
        assert_eq!(entered.world_key, WorldKey::MathJungle);
        assert_eq!(detector.current(), None);

        // Standing still does not re-trigger
        let still = detector.update(near_math);
        assert_eq!(still, ProximityUpdate::default());
        assert!(detector.enter().is_none());

        let away = detector.update(Vec3::ZERO);
        assert_eq!(away.released, Some(0));
        assert_eq!(away.changed, None);

        let back = detector.update(near_math);
        assert_eq!(back.changed, Some(Some(0)));
    }

    #[test]
    fn latched_portal_yields_to_an_overlapping_one() {
        let mut detector =
            ProximityDetector::new(vec![portal("a", 0.0, 5.0), portal("b", 4.0, 5.0)]);
        let between = Vec3::new(1.0, 0.0, 0.0);
        detector.update(between);
        assert_eq!(detector.enter().map(|p| p.name), Some("a".to_string()));

        let update = detector.update(between);
        assert_eq!(update.changed, Some(Some(1)));
    }

    #[test]
    fn click_only_enters_the_proximate_portal() {
        let mut detector = ProximityDetector::new(hub_portals());
        detector.update(Vec3::new(-13.0, 0.0, 0.0));
        assert!(detector.enter_clicked(2).is_none());
        assert!(detector.enter_clicked(0).is_some());
    }
}
