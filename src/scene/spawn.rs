use std::f32::consts::TAU;

use bevy_color::Srgba;
use glam::Vec3;
use rand::Rng;

use crate::color::Color;
use crate::config::FieldConfig;

use super::node::Node;

/// Uniform direction on the unit sphere: uniform azimuth, `acos` of a
/// uniform cosine for the polar angle so the poles are not oversampled.
pub fn unit_direction<R: Rng + ?Sized>(rng: &mut R) -> Vec3 {
    let theta = rng.gen_range(0.0..TAU);
    let phi = rng.gen_range(-1.0f32..=1.0).acos();
    Vec3::new(phi.sin() * theta.cos(), phi.sin() * theta.sin(), phi.cos())
}

/// Point in the hollow shell `[inner, outer]` described by the config.
pub fn shell_point<R: Rng + ?Sized>(config: &FieldConfig, rng: &mut R) -> Vec3 {
    let dist = config.shell_radius * (config.shell_inner + rng.r#gen::<f32>() * config.shell_span);
    unit_direction(rng) * dist
}

/// Each component uniform in `[-range / 2, range / 2]`.
pub fn small_velocity<R: Rng + ?Sized>(range: f32, rng: &mut R) -> Vec3 {
    Vec3::new(
        (rng.r#gen::<f32>() - 0.5) * range,
        (rng.r#gen::<f32>() - 0.5) * range,
        (rng.r#gen::<f32>() - 0.5) * range,
    )
}

pub fn background_nodes<R: Rng + ?Sized>(config: &FieldConfig, rng: &mut R) -> Vec<Node> {
    (0..config.background_count)
        .map(|_| {
            let position = shell_point(config, rng);
            let velocity = small_velocity(config.initial_speed, rng);
            let scale = config.scale_min + rng.r#gen::<f32>() * config.scale_span;
            Node::background(position, velocity, scale)
        })
        .collect()
}

pub fn skill_nodes(config: &FieldConfig) -> Vec<Node> {
    config
        .skills
        .iter()
        .enumerate()
        .map(|(i, skill)| {
            let base_color: Srgba = Color::hex(skill.color).0;
            Node::skill(i, base_color, skill.position, config.skill_emissive)
        })
        .collect()
}
