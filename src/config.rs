// src/config.rs
use anyhow::{Context, bail};
use glam::Vec3;
use serde::{Deserialize, Serialize};

/// One named node of the skill catalog.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct SkillSpec {
    pub name: String,
    /// sRGB hex, `0xRRGGBB`.
    pub color: u32,
    pub position: Vec3,
}

impl SkillSpec {
    fn new(name: &str, color: u32, position: [f32; 3]) -> Self {
        Self { name: name.to_owned(), color, position: Vec3::from_array(position) }
    }
}

pub fn default_skills() -> Vec<SkillSpec> {
    vec![
        SkillSpec::new("Storytelling", 0xFFD700, [-6.0, -2.0, 6.0]),
        SkillSpec::new("Data Modeling", 0x14B8A6, [6.0, -3.0, 4.0]),
        SkillSpec::new("Leadership", 0xF472B6, [-4.0, 6.0, -2.0]),
        SkillSpec::new("Big Data", 0x22C55E, [5.0, 5.0, -3.0]),
        SkillSpec::new("Python", 0x3B82F6, [-7.0, 3.0, 2.0]),
        SkillSpec::new("SQL", 0x6366F1, [0.0, -6.0, 3.0]),
        SkillSpec::new("Machine Learning", 0xA855F7, [7.0, 2.0, 5.0]),
        SkillSpec::new("Cloud Arch", 0xF97316, [2.0, 7.0, 0.0]),
    ]
}

/// Every tunable of the particle field. Partial JSON overrides are accepted,
/// missing fields fall back to `Default`.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct FieldConfig {
    /// CSS class of the element the field attaches to (web only).
    pub container_class: String,
    /// Fixed RNG seed; `None` seeds from the clock.
    pub seed: Option<u64>,

    pub background_count: usize,
    pub shell_radius: f32,
    /// Sampled radius is `shell_radius * (shell_inner + shell_span * rand)`.
    pub shell_inner: f32,
    pub shell_span: f32,
    /// Full width of the per-component velocity/jitter range, centred on zero.
    pub initial_speed: f32,
    pub scale_min: f32,
    pub scale_span: f32,

    pub boundary_radius: f32,
    pub boundary_pull: f32,
    pub jitter: f32,
    pub damping: f32,
    pub node_spin: f32,

    pub group_spin: f32,
    pub tilt_gain: f32,
    pub tilt_factor: f32,
    pub tilt_ease: f32,

    pub connection_distance: f32,
    pub connections_per_node: usize,

    pub highlight_ease: f32,
    pub hover_scale: f32,
    pub skill_emissive: f32,
    pub skill_emissive_hover: f32,
    pub background_radius: f32,
    pub skill_radius: f32,

    pub label_offset: f32,
    pub label_margin_top: f32,

    pub camera_fov_deg: f32,
    pub camera_near: f32,
    pub camera_far: f32,
    pub camera_distance: f32,
    pub fog_density: f32,

    pub skills: Vec<SkillSpec>,
}

impl Default for FieldConfig {
    fn default() -> Self {
        Self {
            container_class: "data-sphere".to_owned(),
            seed: None,

            background_count: 50,
            shell_radius: 14.0,
            shell_inner: 0.6,
            shell_span: 0.7,
            initial_speed: 0.0005,
            scale_min: 0.2,
            scale_span: 0.4,

            boundary_radius: 18.0,
            boundary_pull: 0.005,
            jitter: 0.0005,
            damping: 0.995,
            node_spin: 0.002,

            group_spin: 0.001,
            tilt_gain: 0.1,
            tilt_factor: 0.5,
            tilt_ease: 0.02,

            connection_distance: 6.5,
            connections_per_node: 12,

            highlight_ease: 0.1,
            hover_scale: 1.3,
            skill_emissive: 0.8,
            skill_emissive_hover: 1.5,
            background_radius: 0.4,
            skill_radius: 0.6,

            label_offset: 1.2,
            label_margin_top: 22.0,

            camera_fov_deg: 50.0,
            camera_near: 0.1,
            camera_far: 100.0,
            camera_distance: 30.0,
            fog_density: 0.02,

            skills: default_skills(),
        }
    }
}

impl FieldConfig {
    pub fn from_json(json: &str) -> anyhow::Result<Self> {
        let config: FieldConfig = serde_json::from_str(json).context("invalid field config JSON")?;
        config.validate()?;
        Ok(config)
    }

    pub fn node_count(&self) -> usize {
        self.background_count + self.skills.len()
    }

    /// Segment capacity of the line buffer.
    pub fn max_connections(&self) -> usize {
        self.node_count() * self.connections_per_node
    }

    pub fn shell_bounds(&self) -> (f32, f32) {
        let inner = self.shell_radius * self.shell_inner;
        (inner, inner + self.shell_radius * self.shell_span)
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        let finite = [
            self.shell_radius, self.shell_inner, self.shell_span, self.initial_speed,
            self.scale_min, self.scale_span, self.boundary_radius, self.boundary_pull,
            self.jitter, self.damping, self.node_spin, self.group_spin, self.tilt_gain,
            self.tilt_factor, self.tilt_ease, self.connection_distance, self.highlight_ease,
            self.hover_scale, self.skill_emissive, self.skill_emissive_hover,
            self.background_radius, self.skill_radius, self.label_offset,
            self.label_margin_top, self.camera_fov_deg, self.camera_near, self.camera_far,
            self.camera_distance, self.fog_density,
        ];
        if finite.iter().any(|v| !v.is_finite()) {
            bail!("field config contains a non-finite value");
        }
        if self.connection_distance <= 0.0 {
            bail!("connection_distance must be positive, got {}", self.connection_distance);
        }
        if self.connections_per_node == 0 {
            bail!("connections_per_node must be at least 1");
        }
        if self.shell_radius <= 0.0 || self.shell_inner < 0.0 || self.shell_span < 0.0 {
            bail!("shell bounds must be non-negative with a positive radius");
        }
        if self.scale_min <= 0.0 || self.scale_span < 0.0 {
            bail!("node scale range must be positive");
        }
        for (name, ease) in [
            ("tilt_ease", self.tilt_ease),
            ("highlight_ease", self.highlight_ease),
            ("damping", self.damping),
        ] {
            if !(0.0..=1.0).contains(&ease) {
                bail!("{name} must be within [0, 1], got {ease}");
            }
        }
        if self.camera_near <= 0.0 || self.camera_far <= self.camera_near {
            bail!("camera clip planes must satisfy 0 < near < far");
        }
        if !(1.0..179.0).contains(&self.camera_fov_deg) {
            bail!("camera_fov_deg out of range: {}", self.camera_fov_deg);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_constants() {
        let config = FieldConfig::default();
        assert_eq!(config.node_count(), 58);
        assert_eq!(config.max_connections(), 58 * 12);
        let (inner, outer) = config.shell_bounds();
        assert!((inner - 8.4).abs() < 1e-5);
        assert!((outer - 18.2).abs() < 1e-5);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn partial_json_keeps_defaults() {
        let config = FieldConfig::from_json(r#"{ "background_count": 10, "seed": 7 }"#).unwrap();
        assert_eq!(config.background_count, 10);
        assert_eq!(config.seed, Some(7));
        assert_eq!(config.skills.len(), 8);
        assert_eq!(config.connection_distance, 6.5);
    }

    #[test]
    fn skills_parse_from_json() {
        let json = r#"{ "skills": [ { "name": "Rust", "color": 16729344, "position": [1.0, 2.0, 3.0] } ] }"#;
        let config = FieldConfig::from_json(json).unwrap();
        assert_eq!(config.skills.len(), 1);
        assert_eq!(config.skills[0].position, Vec3::new(1.0, 2.0, 3.0));
    }

    #[test]
    fn rejects_bad_values() {
        assert!(FieldConfig::from_json(r#"{ "connection_distance": 0.0 }"#).is_err());
        assert!(FieldConfig::from_json(r#"{ "highlight_ease": 1.5 }"#).is_err());
        assert!(FieldConfig::from_json(r#"{ "camera_near": 5.0, "camera_far": 1.0 }"#).is_err());
        assert!(FieldConfig::from_json("not json").is_err());
    }
}
