use glam::{Mat4, Vec3};

use crate::camera::Ray;

use super::node::Node;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Hit {
    pub node: usize,
    /// Distance along the ray to the entry point.
    pub distance: f32,
}

/// Nearest non-negative intersection of `ray` with a sphere, if any.
pub fn ray_sphere(ray: &Ray, center: Vec3, radius: f32) -> Option<f32> {
    let oc = ray.origin - center;
    let b = oc.dot(ray.direction);
    let c = oc.length_squared() - radius * radius;
    let disc = b * b - c;
    if disc < 0.0 {
        return None;
    }
    let sqrt_disc = disc.sqrt();
    let near = -b - sqrt_disc;
    if near >= 0.0 {
        return Some(near);
    }
    // origin inside the sphere
    let far = -b + sqrt_disc;
    (far >= 0.0).then_some(far)
}

/// Nearest node under the ray. Nodes are tested as bounding spheres of
/// `radius_of(node) * scale`, placed by `group`. Ties go to the lower index.
pub fn pick_nearest(
    ray: &Ray,
    nodes: &[Node],
    group: Mat4,
    radius_of: impl Fn(&Node) -> f32,
) -> Option<Hit> {
    let mut best: Option<Hit> = None;
    for (i, node) in nodes.iter().enumerate() {
        let center = group.transform_point3(node.position);
        let radius = radius_of(node) * node.appearance.scale;
        let Some(distance) = ray_sphere(ray, center, radius) else {
            continue;
        };
        if best.is_none_or(|b| distance < b.distance) {
            best = Some(Hit { node: i, distance });
        }
    }
    best
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ray_down_z() -> Ray {
        Ray { origin: Vec3::new(0.0, 0.0, 30.0), direction: Vec3::NEG_Z }
    }

    #[test]
    fn sphere_hit_distance() {
        assert_eq!(ray_sphere(&ray_down_z(), Vec3::ZERO, 1.0), Some(29.0));
        assert_eq!(ray_sphere(&ray_down_z(), Vec3::new(2.0, 0.0, 0.0), 1.0), None);
        // behind the origin
        assert_eq!(ray_sphere(&ray_down_z(), Vec3::new(0.0, 0.0, 40.0), 1.0), None);
    }

    #[test]
    fn nearest_of_overlapping_nodes_wins() {
        let nodes = vec![
            Node::background(Vec3::new(0.0, 0.0, -5.0), Vec3::ZERO, 1.0),
            Node::background(Vec3::new(0.0, 0.0, 5.0), Vec3::ZERO, 1.0),
            Node::background(Vec3::new(3.0, 0.0, 10.0), Vec3::ZERO, 1.0),
        ];
        let hit = pick_nearest(&ray_down_z(), &nodes, Mat4::IDENTITY, |_| 0.5).unwrap();
        assert_eq!(hit.node, 1);
        assert!((hit.distance - 24.5).abs() < 1e-5);
    }

    #[test]
    fn group_rotation_moves_targets() {
        let nodes = vec![Node::background(Vec3::new(5.0, 0.0, 0.0), Vec3::ZERO, 1.0)];
        assert!(pick_nearest(&ray_down_z(), &nodes, Mat4::IDENTITY, |_| 0.5).is_none());
        // a quarter turn about Y carries (5, 0, 0) to (0, 0, -5)
        let group = Mat4::from_rotation_y(std::f32::consts::FRAC_PI_2);
        assert!(pick_nearest(&ray_down_z(), &nodes, group, |_| 0.5).is_some());
    }

    #[test]
    fn picking_is_repeatable() {
        let nodes: Vec<Node> = (0..20)
            .map(|i| Node::background(Vec3::new(0.1 * i as f32, 0.0, i as f32 - 10.0), Vec3::ZERO, 0.5))
            .collect();
        let first = pick_nearest(&ray_down_z(), &nodes, Mat4::IDENTITY, |_| 0.4);
        for _ in 0..10 {
            assert_eq!(pick_nearest(&ray_down_z(), &nodes, Mat4::IDENTITY, |_| 0.4), first);
        }
    }
}
