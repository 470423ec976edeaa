//! Particle field simulation. Everything here is plain data stepped one
//! display frame at a time; no GPU or DOM types leak in, so the whole field
//! can be replayed deterministically from a seed.

pub mod connection;
pub mod highlight;
pub mod label;
pub mod node;
pub mod physics;
pub mod picking;
pub mod spawn;

use glam::{Mat4, Vec2};
use rand::SeedableRng;
use rand::rngs::StdRng;

use crate::camera::Camera;
use crate::config::FieldConfig;

use connection::ConnectionBuffer;
use highlight::CursorStyle;
use node::{Node, NodeKind};
use physics::GroupTransform;
use picking::Hit;

/// Pointer position in normalized device coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Pointer(pub Vec2);

impl Pointer {
    /// No interaction yet, or pointer outside the canvas.
    pub const OFF_SCREEN: Pointer = Pointer(Vec2::new(-999.0, -999.0));

    pub fn is_active(&self) -> bool {
        *self != Self::OFF_SCREEN
    }

    pub fn ndc(&self) -> Option<Vec2> {
        self.is_active().then_some(self.0)
    }
}

impl Default for Pointer {
    fn default() -> Self {
        Self::OFF_SCREEN
    }
}

pub struct FrameInput<'a> {
    pub pointer: Pointer,
    pub camera: &'a Camera,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameReport {
    pub hovered: Option<Hit>,
    pub cursor: CursorStyle,
    pub segments: usize,
}

pub struct FieldState {
    pub config: FieldConfig,
    pub nodes: Vec<Node>,
    pub group: GroupTransform,
    pub connections: ConnectionBuffer,
    pub frame: u64,
    rng: StdRng,
}

impl FieldState {
    pub fn new(config: FieldConfig) -> Self {
        let seed = config.seed.unwrap_or_else(clock_seed);
        Self::with_rng(config, StdRng::seed_from_u64(seed))
    }

    /// Background nodes first, then the skill catalog in order.
    pub fn with_rng(config: FieldConfig, mut rng: StdRng) -> Self {
        let mut nodes = spawn::background_nodes(&config, &mut rng);
        nodes.extend(spawn::skill_nodes(&config));
        let connections = ConnectionBuffer::with_capacity(config.max_connections());
        log::debug!("Field populated with {} nodes, {} segment slots.", nodes.len(), connections.capacity());
        Self { config, nodes, group: GroupTransform::default(), connections, frame: 0, rng }
    }

    /// Builds a field around an explicit node set, e.g. for replaying a
    /// recorded layout.
    pub fn from_nodes(config: FieldConfig, nodes: Vec<Node>, seed: u64) -> Self {
        let connections = ConnectionBuffer::with_capacity(nodes.len() * config.connections_per_node);
        Self {
            config,
            nodes,
            group: GroupTransform::default(),
            connections,
            frame: 0,
            rng: StdRng::seed_from_u64(seed),
        }
    }

    pub fn group_matrix(&self) -> Mat4 {
        self.group.matrix()
    }

    pub fn background_count(&self) -> usize {
        self.nodes.iter().filter(|n| !n.is_skill()).count()
    }

    /// Bounding radius of a node's mesh before scaling.
    pub fn mesh_radius(&self, node: &Node) -> f32 {
        match node.kind {
            NodeKind::Background => self.config.background_radius,
            NodeKind::Skill { .. } => self.config.skill_radius,
        }
    }

    /// Node currently under `pointer`, without advancing the field.
    pub fn pick(&self, pointer: Pointer, camera: &Camera) -> Option<Hit> {
        let ndc = pointer.ndc()?;
        let ray = camera.ray_from_ndc(ndc);
        picking::pick_nearest(&ray, &self.nodes, self.group_matrix(), |n| self.mesh_radius(n))
    }

    /// Advances the field by one display frame.
    pub fn step(&mut self, input: &FrameInput) -> FrameReport {
        for node in self.nodes.iter_mut() {
            physics::drift(node, &self.config, &mut self.rng);
        }

        self.group.advance(&self.config, input.pointer.ndc());

        let segments = self.connections.rebuild(&self.nodes, self.config.connection_distance);

        let hovered = self.pick(input.pointer, input.camera);
        let cursor = highlight::apply(&mut self.nodes, hovered.map(|h| h.node), &self.config);

        self.frame += 1;
        FrameReport { hovered, cursor, segments }
    }

    pub fn labels(&self, camera: &Camera, scale_factor: f32) -> Vec<label::LabelPlacement> {
        label::place_labels(&self.nodes, self.group_matrix(), camera, &self.config, scale_factor)
    }
}

fn clock_seed() -> u64 {
    cfg_if::cfg_if! {
        if #[cfg(target_arch = "wasm32")] {
            (js_sys::Math::random() * u64::MAX as f64) as u64
        } else {
            std::time::SystemTime::now()
                .duration_since(std::time::UNIX_EPOCH)
                .map(|d| d.as_nanos() as u64)
                .unwrap_or(0x5eed)
        }
    }
}
