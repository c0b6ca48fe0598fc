use log::trace;
use serde::{Deserialize, Serialize};

use super::{
    ControlPoint, ControlPointData, ControlPointKind, DifficultyPoint, EffectPoint, GroupKey,
    SamplePoint, TimingPoint,
};

/// All control points sharing one timestamp, at most one per kind.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ControlPointGroup {
    time: f64,
    /// Sorted by kind.
    points: Vec<ControlPoint>,
}

impl ControlPointGroup {
    fn new(time: f64) -> Self {
        Self {
            time,
            points: Vec::new(),
        }
    }

    pub fn time(&self) -> f64 {
        self.time
    }

    pub fn points(&self) -> &[ControlPoint] {
        &self.points
    }

    pub fn get(&self, kind: ControlPointKind) -> Option<&ControlPoint> {
        self.points.iter().find(|p| p.kind() == kind)
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Stores `point`, replacing a point of the same kind. Returns the replaced point.
    fn insert(&mut self, mut point: ControlPoint) -> Option<ControlPoint> {
        point.set_group(Some(GroupKey(self.time)));
        let kind = point.kind();
        match self.points.binary_search_by_key(&kind, |p| p.kind()) {
            Ok(index) => {
                let mut old = std::mem::replace(&mut self.points[index], point);
                old.set_group(None);
                Some(old)
            }
            Err(index) => {
                self.points.insert(index, point);
                None
            }
        }
    }

    fn take(&mut self, kind: ControlPointKind) -> Option<ControlPoint> {
        let index = self.points.iter().position(|p| p.kind() == kind)?;
        let mut point = self.points.remove(index);
        point.set_group(None);
        Some(point)
    }
}

/// Ascending, timestamp-unique sequence of control point groups.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ControlPointTimeline {
    groups: Vec<ControlPointGroup>,
}

impl ControlPointTimeline {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn groups(&self) -> &[ControlPointGroup] {
        &self.groups
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    pub fn clear(&mut self) {
        self.groups.clear();
    }

    fn search(&self, time: f64) -> Result<usize, usize> {
        self.groups.binary_search_by(|g| g.time.total_cmp(&time))
    }

    pub fn group_at(&self, time: f64) -> Option<&ControlPointGroup> {
        self.search(time).ok().map(|index| &self.groups[index])
    }

    fn group_at_mut_or_insert(&mut self, time: f64) -> &mut ControlPointGroup {
        let index = match self.search(time) {
            Ok(index) => index,
            Err(index) => {
                self.groups.insert(index, ControlPointGroup::new(time));
                index
            }
        };
        &mut self.groups[index]
    }

    /// Adds a point at `time` unless it would change nothing.
    ///
    /// Returns `false` when the point was discarded as redundant.
    pub fn add(&mut self, time: f64, data: ControlPointData) -> bool {
        let existing = self.query(time, data.kind());
        if data.is_redundant(&existing.data) {
            trace!("discarding redundant {:?} point at {time}", data.kind());
            return false;
        }
        self.attach(time, ControlPoint::new(data));
        true
    }

    /// Places a point into the group at `time` without a redundancy check.
    ///
    /// A point of the same kind already in that group is detached and returned.
    pub fn attach(&mut self, time: f64, point: ControlPoint) -> Option<ControlPoint> {
        self.group_at_mut_or_insert(time).insert(point)
    }

    /// Takes the point of `kind` out of the group at `time`. The group itself stays.
    pub fn detach(&mut self, time: f64, kind: ControlPointKind) -> Option<ControlPoint> {
        let index = self.search(time).ok()?;
        self.groups[index].take(kind)
    }

    /// Removes the whole group at `time`, returning its points detached.
    pub fn remove_group(&mut self, time: f64) -> Vec<ControlPoint> {
        let Ok(index) = self.search(time) else {
            return Vec::new();
        };
        let mut group = self.groups.remove(index);
        for point in &mut group.points {
            point.set_group(None);
        }
        group.points
    }

    /// Point of `kind` in effect at `time`, or the kind's default.
    ///
    /// Before the first timing point, the first timing point is in effect.
    pub fn query(&self, time: f64, kind: ControlPointKind) -> &ControlPoint {
        let end = match self.search(time) {
            Ok(index) => index + 1,
            Err(index) => index,
        };
        let found = self.groups[..end].iter().rev().find_map(|g| g.get(kind));
        match (found, kind) {
            (Some(point), _) => point,
            (None, ControlPointKind::Timing) => self
                .points(ControlPointKind::Timing)
                .next()
                .unwrap_or(kind.default_point()),
            (None, _) => kind.default_point(),
        }
    }

    /// All points of `kind`, in time order.
    pub fn points(&self, kind: ControlPointKind) -> impl Iterator<Item = &ControlPoint> {
        self.groups.iter().filter_map(move |g| g.get(kind))
    }

    pub fn timing_point_at(&self, time: f64) -> TimingPoint {
        match self.query(time, ControlPointKind::Timing).data {
            ControlPointData::Timing(point) => point,
            _ => unreachable!("timing query returned another kind"),
        }
    }

    pub fn difficulty_point_at(&self, time: f64) -> DifficultyPoint {
        match self.query(time, ControlPointKind::Difficulty).data {
            ControlPointData::Difficulty(point) => point,
            _ => unreachable!("difficulty query returned another kind"),
        }
    }

    pub fn effect_point_at(&self, time: f64) -> EffectPoint {
        match self.query(time, ControlPointKind::Effect).data {
            ControlPointData::Effect(point) => point,
            _ => unreachable!("effect query returned another kind"),
        }
    }

    pub fn sample_point_at(&self, time: f64) -> SamplePoint {
        match self.query(time, ControlPointKind::Sample).data {
            ControlPointData::Sample(point) => point,
            _ => unreachable!("sample query returned another kind"),
        }
    }

    pub fn beat_length_at(&self, time: f64) -> f64 {
        self.timing_point_at(time).beat_length
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sample::SampleBank;
    use proptest::prelude::*;

    fn timing(beat_length: f64) -> ControlPointData {
        ControlPointData::Timing(TimingPoint::new(beat_length, 4))
    }

    fn velocity(sv: f64) -> ControlPointData {
        ControlPointData::Difficulty(DifficultyPoint::new(sv))
    }

    #[test]
    fn test_equal_value_points_record_one_change() {
        let mut timeline = ControlPointTimeline::new();
        assert!(timeline.add(1000.0, velocity(1.5)));
        assert!(!timeline.add(2000.0, velocity(1.5)));
        assert_eq!(timeline.points(ControlPointKind::Difficulty).count(), 1);
        assert_eq!(timeline.groups().len(), 1);
    }

    #[test]
    fn test_equal_timing_points_both_recorded() {
        let mut timeline = ControlPointTimeline::new();
        assert!(timeline.add(1000.0, timing(500.0)));
        assert!(timeline.add(2000.0, timing(500.0)));
        assert_eq!(timeline.points(ControlPointKind::Timing).count(), 2);
    }

    #[test]
    fn test_default_valued_point_is_redundant() {
        let mut timeline = ControlPointTimeline::new();
        assert!(!timeline.add(0.0, velocity(1.0)));
        assert!(timeline.is_empty());
    }

    #[test]
    fn test_same_time_merges_into_group() {
        let mut timeline = ControlPointTimeline::new();
        timeline.add(500.0, timing(300.0));
        timeline.add(500.0, velocity(2.0));
        assert_eq!(timeline.groups().len(), 1);
        let group = timeline.group_at(500.0).unwrap();
        assert_eq!(group.points().len(), 2);
        for point in group.points() {
            assert_eq!(point.start_time(), 500.0);
        }
    }

    #[test]
    fn test_same_kind_same_time_replaces() {
        let mut timeline = ControlPointTimeline::new();
        timeline.add(500.0, timing(300.0));
        timeline.add(500.0, timing(400.0));
        assert_eq!(timeline.points(ControlPointKind::Timing).count(), 1);
        assert_eq!(timeline.beat_length_at(500.0), 400.0);
    }

    #[test]
    fn test_query_uses_latest_preceding_point() {
        let mut timeline = ControlPointTimeline::new();
        timeline.add(1000.0, velocity(2.0));
        timeline.add(3000.0, velocity(0.5));
        assert_eq!(timeline.difficulty_point_at(500.0).slider_velocity, 1.0);
        assert_eq!(timeline.difficulty_point_at(1000.0).slider_velocity, 2.0);
        assert_eq!(timeline.difficulty_point_at(2999.0).slider_velocity, 2.0);
        assert_eq!(timeline.difficulty_point_at(3000.0).slider_velocity, 0.5);
    }

    #[test]
    fn test_timing_query_before_first_point() {
        let mut timeline = ControlPointTimeline::new();
        assert_eq!(
            timeline.beat_length_at(0.0),
            TimingPoint::DEFAULT_BEAT_LENGTH
        );
        timeline.add(1000.0, timing(250.0));
        assert_eq!(timeline.beat_length_at(0.0), 250.0);
    }

    #[test]
    fn test_sample_query_default() {
        let timeline = ControlPointTimeline::new();
        let sample = timeline.sample_point_at(100.0);
        assert_eq!(sample.bank, SampleBank::Normal);
        assert_eq!(sample.volume, 100);
    }

    #[test]
    fn test_detach_and_attach_preserve_point() {
        let mut timeline = ControlPointTimeline::new();
        timeline.add(1000.0, velocity(2.0));
        let point = timeline
            .detach(1000.0, ControlPointKind::Difficulty)
            .unwrap();
        assert!(point.group().is_none());
        assert_eq!(point.data, velocity(2.0));
        assert!(timeline.group_at(1000.0).unwrap().is_empty());

        assert!(timeline.attach(2000.0, point).is_none());
        let moved = timeline.query(2000.0, ControlPointKind::Difficulty);
        assert_eq!(moved.start_time(), 2000.0);
        assert_eq!(moved.data, velocity(2.0));
    }

    #[test]
    fn test_remove_group_detaches_points() {
        let mut timeline = ControlPointTimeline::new();
        timeline.add(1000.0, timing(400.0));
        let removed = timeline.remove_group(1000.0);
        assert_eq!(removed.len(), 1);
        assert!(removed[0].group().is_none());
        assert!(timeline.is_empty());
        assert!(timeline.remove_group(1000.0).is_empty());
    }

    proptest! {
        #[test]
        fn prop_groups_sorted_and_unique(
            entries in proptest::collection::vec((0u16..50, 1u8..4, 1u8..20), 0..60)
        ) {
            let mut timeline = ControlPointTimeline::new();
            for (time, kind, value) in entries {
                let time = f64::from(time) * 100.0;
                let data = match kind {
                    1 => timing(f64::from(value) * 50.0),
                    2 => velocity(f64::from(value) / 4.0),
                    _ => ControlPointData::Effect(EffectPoint { kiai: value % 2 == 0, scroll_speed: 1.0 }),
                };
                timeline.add(time, data);
            }
            let groups = timeline.groups();
            for pair in groups.windows(2) {
                prop_assert!(pair[0].time() < pair[1].time());
            }
            for group in groups {
                let mut kinds: Vec<_> = group.points().iter().map(|p| p.kind()).collect();
                let len = kinds.len();
                kinds.dedup();
                prop_assert_eq!(kinds.len(), len);
                for point in group.points() {
                    prop_assert_eq!(point.start_time(), group.time());
                }
            }
        }
    }
}
