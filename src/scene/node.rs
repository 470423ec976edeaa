use bevy_color::Srgba;
use glam::{Mat4, Quat, Vec2, Vec3};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Material {
    Base,
    Highlight,
}

#[derive(Debug, Clone, PartialEq)]
pub enum NodeKind {
    /// Ambient drifting point.
    Background,
    /// Named, stationary point. `skill` indexes the config's skill catalog.
    Skill { skill: usize, base_color: Srgba },
}

/// Per-frame render attributes of a node.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Appearance {
    pub scale: f32,
    /// Resting scale the node eases back to when not hovered.
    pub base_scale: f32,
    pub material: Material,
    /// Only meaningful for skill nodes.
    pub emissive_intensity: f32,
}

impl Appearance {
    pub fn at_rest(base_scale: f32, emissive_intensity: f32) -> Self {
        Self { scale: base_scale, base_scale, material: Material::Base, emissive_intensity }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    pub kind: NodeKind,
    pub position: Vec3,
    pub velocity: Vec3,
    /// Placement at creation. Kept for inspection, never read by the simulation.
    pub original_pos: Vec3,
    /// Cosmetic spin around the node's own x and y axes.
    pub rotation: Vec2,
    pub appearance: Appearance,
}

impl Node {
    pub fn background(position: Vec3, velocity: Vec3, scale: f32) -> Self {
        Self {
            kind: NodeKind::Background,
            position,
            velocity,
            original_pos: position,
            rotation: Vec2::ZERO,
            appearance: Appearance::at_rest(scale, 0.0),
        }
    }

    pub fn skill(skill: usize, base_color: Srgba, position: Vec3, emissive_intensity: f32) -> Self {
        Self {
            kind: NodeKind::Skill { skill, base_color },
            position,
            velocity: Vec3::ZERO,
            original_pos: position,
            rotation: Vec2::ZERO,
            appearance: Appearance::at_rest(1.0, emissive_intensity),
        }
    }

    pub fn is_skill(&self) -> bool {
        matches!(self.kind, NodeKind::Skill { .. })
    }

    /// Node-local to group-local transform.
    pub fn model_matrix(&self) -> Mat4 {
        let rotation = Quat::from_euler(glam::EulerRot::XYZ, self.rotation.x, self.rotation.y, 0.0);
        Mat4::from_scale_rotation_translation(Vec3::splat(self.appearance.scale), rotation, self.position)
    }
}
