pub mod kalman;

pub use kalman::JointKalman;

use nalgebra::Vector2;

use crate::config::KalmanConfig;
use crate::pose::{HandJoint, Joint, JointSet};

/// デコード済み関節の時系列平滑化 (関節ごとに独立したフィルタ)
///
/// 無効時は観測をそのまま返す。
pub struct JointTracker {
    filters: Option<Vec<JointKalman>>,
    joints: usize,
}

impl JointTracker {
    pub fn new(joints: usize, enabled: bool, noise: f32) -> Self {
        let filters = enabled.then(|| (0..joints).map(|_| JointKalman::new(noise)).collect());
        Self { filters, joints }
    }

    pub fn from_config(joints: usize, config: &KalmanConfig) -> Self {
        Self::new(joints, config.enabled, config.noise)
    }

    pub fn joint_count(&self) -> usize {
        self.joints
    }

    pub fn is_filtering(&self) -> bool {
        self.filters.is_some()
    }

    /// 全関節で補正 -> 予測。予測値がこのフレームの追跡位置になる。
    ///
    /// `observations` はフィルタと同数であること。
    pub fn update(&mut self, observations: &JointSet) -> JointSet {
        debug_assert_eq!(observations.len(), self.joints);

        let filters = match self.filters.as_mut() {
            Some(filters) => filters,
            None => return observations.clone(),
        };

        filters
            .iter_mut()
            .zip(observations.iter())
            .enumerate()
            .map(|(i, (kf, obs))| {
                if !kf.correct(Vector2::new(obs.row, obs.col)) {
                    match HandJoint::from_index(i) {
                        Some(joint) => log::warn!("{:?}: singular innovation covariance, observation dropped", joint),
                        None => log::warn!("joint {}: singular innovation covariance, observation dropped", i),
                    }
                }
                let pred = kf.predict();
                Joint::new(pred[0], pred[1])
            })
            .collect::<Vec<_>>()
            .into()
    }

    pub fn reset(&mut self) {
        if let Some(filters) = self.filters.as_mut() {
            filters.iter_mut().for_each(JointKalman::reset);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set(points: &[(f32, f32)]) -> JointSet {
        points.iter().map(|&(r, c)| Joint::new(r, c)).collect::<Vec<_>>().into()
    }

    #[test]
    fn test_disabled_is_passthrough() {
        let mut tracker = JointTracker::new(3, false, 0.03);
        assert!(!tracker.is_filtering());
        for frame in 0..5 {
            let f = frame as f32;
            let obs = set(&[(f, 1.0), (2.0 * f, 3.0), (7.0, f * f)]);
            assert_eq!(tracker.update(&obs), obs);
        }
    }

    #[test]
    fn test_enabled_converges_per_joint() {
        let mut tracker = JointTracker::new(21, true, 0.03);
        let points: Vec<(f32, f32)> = (0..21).map(|i| (10.0 + i as f32 * 5.0, 300.0 - i as f32 * 7.0)).collect();
        let obs = set(&points);
        let mut tracked = JointSet::default();
        for _ in 0..200 {
            tracked = tracker.update(&obs);
        }
        assert_eq!(tracked.len(), 21);
        for (t, o) in tracked.iter().zip(obs.iter()) {
            assert!(t.distance(o) < 0.01, "{:?} vs {:?}", t, o);
        }
    }

    #[test]
    fn test_filters_are_independent() {
        // 関節1は両方で同じ入力、関節0だけ大きく異なる
        let mut a = JointTracker::new(2, true, 0.03);
        let mut b = JointTracker::new(2, true, 0.03);
        let mut last_a = JointSet::default();
        let mut last_b = JointSet::default();
        for i in 0..20 {
            let f = i as f32;
            last_a = a.update(&set(&[(f * 10.0, 0.0), (50.0, 60.0)]));
            last_b = b.update(&set(&[(-f * 3.0, 999.0), (50.0, 60.0)]));
        }
        assert_eq!(last_a[1], last_b[1]);
        assert_ne!(last_a[0], last_b[0]);
    }

    #[test]
    fn test_first_frame_starts_from_origin() {
        let mut tracker = JointTracker::new(1, true, 0.03);
        let tracked = tracker.update(&set(&[(100.0, 100.0)]));
        assert_eq!(tracked[0], Joint::new(0.0, 0.0));
    }

    #[test]
    fn test_reset() {
        let mut tracker = JointTracker::new(1, true, 0.03);
        for _ in 0..50 {
            tracker.update(&set(&[(40.0, 40.0)]));
        }
        tracker.reset();
        let tracked = tracker.update(&set(&[(40.0, 40.0)]));
        assert_eq!(tracked[0], Joint::new(0.0, 0.0));
    }
}
