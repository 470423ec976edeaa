use glam::{Mat4, Vec2, Vec3};

use crate::camera::Camera;
use crate::color::Color;
use crate::config::FieldConfig;

use super::node::{Node, NodeKind};

/// Screen placement of one skill label for the current frame.
#[derive(Debug, Clone, PartialEq)]
pub struct LabelPlacement {
    pub node: usize,
    /// Index into the skill catalog.
    pub skill: usize,
    pub text: String,
    pub color: Color,
    /// Pill center in surface pixels.
    pub center: Vec2,
}

/// Projects the label anchor of every visible skill node. The anchor sits
/// `label_offset` above the node in its own (scaled) space and is lifted by
/// `label_margin_top` logical pixels on screen.
pub fn place_labels(
    nodes: &[Node],
    group: Mat4,
    camera: &Camera,
    config: &FieldConfig,
    scale_factor: f32,
) -> Vec<LabelPlacement> {
    nodes
        .iter()
        .enumerate()
        .filter_map(|(i, node)| {
            let NodeKind::Skill { skill, base_color } = &node.kind else {
                return None;
            };
            let spec = config.skills.get(*skill)?;
            let anchor = node.position + Vec3::Y * config.label_offset * node.appearance.scale;
            let screen = camera.world_to_screen(group.transform_point3(anchor))?;
            Some(LabelPlacement {
                node: i,
                skill: *skill,
                text: spec.name.clone(),
                color: Color(*base_color),
                center: screen - Vec2::Y * config.label_margin_top * scale_factor,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::spawn::skill_nodes;

    #[test]
    fn labels_sit_above_their_nodes() {
        let config = FieldConfig::default();
        let camera = Camera::new(&config, 800, 600);
        let nodes = skill_nodes(&config);
        let labels = place_labels(&nodes, Mat4::IDENTITY, &camera, &config, 1.0);
        assert_eq!(labels.len(), 8);
        for label in &labels {
            let node_px = camera.world_to_screen(nodes[label.node].position).unwrap();
            assert!(label.center.y < node_px.y - 22.0);
            assert!((label.center.x - node_px.x).abs() < 1e-3);
        }
        assert_eq!(labels[0].text, "Storytelling");
        assert_eq!(labels[7].skill, 7);
    }

    #[test]
    fn background_nodes_have_no_label() {
        let config = FieldConfig::default();
        let camera = Camera::new(&config, 800, 600);
        let nodes = vec![Node::background(Vec3::ZERO, Vec3::ZERO, 0.4)];
        assert!(place_labels(&nodes, Mat4::IDENTITY, &camera, &config, 1.0).is_empty());
    }
}
