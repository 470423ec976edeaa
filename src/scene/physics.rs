use glam::{Mat4, Vec2};
use rand::Rng;

use crate::config::FieldConfig;

use super::node::{Node, NodeKind};
use super::spawn::small_velocity;

/// Rotation of the whole node group: `tilt` about X, then `spin` about Y.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct GroupTransform {
    pub spin: f32,
    pub tilt: f32,
}

impl GroupTransform {
    pub fn matrix(&self) -> Mat4 {
        Mat4::from_rotation_x(self.tilt) * Mat4::from_rotation_y(self.spin)
    }

    /// Constant spin plus a tilt eased toward the pointer height. An inactive
    /// pointer eases the tilt back to level.
    pub fn advance(&mut self, config: &FieldConfig, pointer: Option<Vec2>) {
        self.spin += config.group_spin;
        let target = pointer.map_or(0.0, |p| p.y * config.tilt_gain * config.tilt_factor);
        self.tilt = lerp(self.tilt, target, config.tilt_ease);
    }
}

pub fn lerp(from: f32, to: f32, t: f32) -> f32 {
    from + (to - from) * t
}

/// Advances one background node by one frame. Skill nodes are left alone.
pub fn drift<R: Rng + ?Sized>(node: &mut Node, config: &FieldConfig, rng: &mut R) {
    if !matches!(node.kind, NodeKind::Background) {
        return;
    }
    node.position += node.velocity;

    // Soft boundary: pull back toward the origin, never clamp.
    if node.position.length() > config.boundary_radius {
        node.velocity -= node.position.normalize_or_zero() * config.boundary_pull;
    }

    node.velocity += small_velocity(config.jitter, rng);
    node.velocity *= config.damping;

    node.rotation += Vec2::splat(config.node_spin);
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec3;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    use crate::scene::node::Node;

    #[test]
    fn outside_node_is_pulled_inward_without_clamp() {
        let config = FieldConfig::default();
        let mut rng = StdRng::seed_from_u64(9);
        let mut node = Node::background(Vec3::new(25.0, 0.0, 0.0), Vec3::ZERO, 0.4);

        let mut frames = 0;
        while node.position.length() >= config.boundary_radius {
            let before = node.position;
            let velocity = node.velocity;
            drift(&mut node, &config, &mut rng);
            assert_eq!(node.position, before + velocity, "position must only move by velocity");
            // The pull dominates the jitter, so radial velocity is always inward.
            assert!(node.velocity.dot(node.position.normalize()) < 0.0);
            frames += 1;
            assert!(frames < 500, "node never came back inside the boundary");
        }
        assert!(frames > 1);
    }

    #[test]
    fn velocity_is_damped_inside_boundary() {
        let config = FieldConfig { jitter: 0.0, ..FieldConfig::default() };
        let mut rng = StdRng::seed_from_u64(1);
        let mut node = Node::background(Vec3::new(10.0, 0.0, 0.0), Vec3::new(0.01, 0.0, 0.0), 0.4);
        drift(&mut node, &config, &mut rng);
        assert!((node.velocity.x - 0.01 * 0.995).abs() < 1e-9);
        assert!((node.position.x - 10.01).abs() < 1e-5);
        assert_eq!(node.rotation, Vec2::splat(0.002));
    }

    #[test]
    fn skill_nodes_do_not_drift() {
        let config = FieldConfig::default();
        let mut rng = StdRng::seed_from_u64(1);
        let mut node = crate::scene::spawn::skill_nodes(&config).remove(0);
        let before = node.clone();
        drift(&mut node, &config, &mut rng);
        assert_eq!(node, before);
    }

    #[test]
    fn tilt_eases_toward_pointer_and_back() {
        let config = FieldConfig::default();
        let mut group = GroupTransform::default();
        group.advance(&config, Some(Vec2::new(0.0, 1.0)));
        assert!((group.tilt - 0.05 * 0.02).abs() < 1e-7);
        assert!((group.spin - 0.001).abs() < 1e-7);
        for _ in 0..2000 {
            group.advance(&config, Some(Vec2::new(0.0, 1.0)));
        }
        assert!((group.tilt - 0.05).abs() < 1e-4);
        for _ in 0..2000 {
            group.advance(&config, None);
        }
        assert!(group.tilt.abs() < 1e-4);
    }
}
