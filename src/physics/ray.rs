use cgmath::Vector3;
use rapier3d::prelude::ColliderHandle;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RayHit {
    pub collider: ColliderHandle,
    /// Distance along the cast segment, 0 at `from` and 1 at `to`.
    pub hit_fraction: f32,
    pub point: Vector3<f32>,
    pub normal: Vector3<f32>,
}

/// Receives the hits of [`PhysicsWorld::single_ray_cast`](super::PhysicsWorld::single_ray_cast).
pub trait RayResultCallback {
    fn add_single_result(&mut self, hit: RayHit);

    fn has_hit(&self) -> bool;
}

#[derive(Debug, Default)]
pub struct ClosestRayResult {
    pub hit: Option<RayHit>,
}

impl ClosestRayResult {
    pub fn new() -> Self {
        Self::default()
    }
}

impl RayResultCallback for ClosestRayResult {
    fn add_single_result(&mut self, hit: RayHit) {
        match self.hit {
            Some(current) if current.hit_fraction <= hit.hit_fraction => {}
            _ => self.hit = Some(hit),
        }
    }

    fn has_hit(&self) -> bool {
        self.hit.is_some()
    }
}

#[derive(Debug, Default)]
pub struct AllHitsRayResult {
    hits: Vec<RayHit>,
}

impl AllHitsRayResult {
    pub fn new() -> Self {
        Self::default()
    }

    /// Hits ordered from `from` towards `to`.
    pub fn hits(&self) -> &[RayHit] {
        &self.hits
    }
}

impl RayResultCallback for AllHitsRayResult {
    fn add_single_result(&mut self, hit: RayHit) {
        let index = self
            .hits
            .partition_point(|existing| existing.hit_fraction <= hit.hit_fraction);
        self.hits.insert(index, hit);
    }

    fn has_hit(&self) -> bool {
        !self.hits.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hit(fraction: f32) -> RayHit {
        RayHit {
            collider: ColliderHandle::invalid(),
            hit_fraction: fraction,
            point: Vector3::new(0.0, fraction, 0.0),
            normal: Vector3::new(0.0, 1.0, 0.0),
        }
    }

    #[test]
    fn closest_keeps_smallest_fraction() {
        let mut result = ClosestRayResult::new();
        assert!(!result.has_hit());

        for fraction in [0.7, 0.2, 0.9] {
            result.add_single_result(hit(fraction));
        }

        assert_eq!(result.hit.map(|h| h.hit_fraction), Some(0.2));
    }

    #[test]
    fn all_hits_stay_sorted() {
        let mut result = AllHitsRayResult::new();
        for fraction in [0.5, 0.1, 0.8, 0.3] {
            result.add_single_result(hit(fraction));
        }

        let fractions: Vec<f32> = result.hits().iter().map(|h| h.hit_fraction).collect();
        assert_eq!(fractions, vec![0.1, 0.3, 0.5, 0.8]);
    }
}
