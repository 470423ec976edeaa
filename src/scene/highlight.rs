use crate::config::FieldConfig;

use super::node::{Material, Node, NodeKind};
use super::physics::lerp;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CursorStyle {
    #[default]
    Default,
    Pointer,
}

/// Resets every node to its resting look, then highlights `hovered`.
/// Background nodes swap material, skill nodes change emissive intensity and
/// ease back to their resting size. A background node keeps whatever size
/// hovering gave it.
pub fn apply(nodes: &mut [Node], hovered: Option<usize>, config: &FieldConfig) -> CursorStyle {
    let ease = config.highlight_ease;

    for node in nodes.iter_mut() {
        let look = &mut node.appearance;
        match node.kind {
            NodeKind::Background => look.material = Material::Base,
            NodeKind::Skill { .. } => {
                look.emissive_intensity = config.skill_emissive;
                look.scale = lerp(look.scale, look.base_scale, ease);
            }
        }
    }

    let Some(node) = hovered.and_then(|i| nodes.get_mut(i)) else {
        return CursorStyle::Default;
    };
    let look = &mut node.appearance;
    look.scale = lerp(look.scale, config.hover_scale, ease);
    match node.kind {
        NodeKind::Background => look.material = Material::Highlight,
        NodeKind::Skill { .. } => look.emissive_intensity = config.skill_emissive_hover,
    }
    CursorStyle::Pointer
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::spawn::skill_nodes;
    use glam::Vec3;

    #[test]
    fn hovered_background_switches_material() {
        let config = FieldConfig::default();
        let mut nodes = vec![Node::background(Vec3::ZERO, Vec3::ZERO, 0.5)];
        assert_eq!(apply(&mut nodes, Some(0), &config), CursorStyle::Pointer);
        assert_eq!(nodes[0].appearance.material, Material::Highlight);
        assert!(nodes[0].appearance.scale > 0.5);

        assert_eq!(apply(&mut nodes, None, &config), CursorStyle::Default);
        assert_eq!(nodes[0].appearance.material, Material::Base);
    }

    #[test]
    fn hovered_skill_brightens() {
        let config = FieldConfig::default();
        let mut nodes = skill_nodes(&config);
        apply(&mut nodes, Some(3), &config);
        assert_eq!(nodes[3].appearance.emissive_intensity, 1.5);
        assert_eq!(nodes[2].appearance.emissive_intensity, 0.8);
        assert_eq!(nodes[3].appearance.material, Material::Base);
    }

    #[test]
    fn hovered_background_grows_to_hover_size() {
        let config = FieldConfig::default();
        let mut nodes = vec![Node::background(Vec3::ZERO, Vec3::ZERO, 0.4)];
        for _ in 0..100 {
            apply(&mut nodes, Some(0), &config);
        }
        assert!((nodes[0].appearance.scale - 1.3).abs() < 1e-3, "{:?}", nodes[0].appearance);
    }

    #[test]
    fn background_keeps_its_size_after_hover() {
        let config = FieldConfig::default();
        let mut nodes = vec![Node::background(Vec3::ZERO, Vec3::ZERO, 0.4)];
        for _ in 0..10 {
            apply(&mut nodes, Some(0), &config);
        }
        let grown = nodes[0].appearance.scale;
        for _ in 0..50 {
            apply(&mut nodes, None, &config);
        }
        assert_eq!(nodes[0].appearance.scale, grown);
        assert_eq!(nodes[0].appearance.material, Material::Base);
    }

    #[test]
    fn unhovered_skills_settle_back() {
        let config = FieldConfig::default();
        let mut nodes = skill_nodes(&config);
        for _ in 0..60 {
            apply(&mut nodes, Some(0), &config);
            apply(&mut nodes, Some(5), &config);
        }
        for _ in 0..100 {
            apply(&mut nodes, None, &config);
        }
        for node in &nodes {
            let look = node.appearance;
            assert!((look.scale - 1.0).abs() < 1e-3, "{look:?}");
            assert_eq!(look.material, Material::Base);
            assert_eq!(look.emissive_intensity, 0.8);
        }
    }

    #[test]
    fn out_of_range_hover_is_ignored() {
        let config = FieldConfig::default();
        let mut nodes = skill_nodes(&config);
        assert_eq!(apply(&mut nodes, Some(99), &config), CursorStyle::Default);
    }
}
