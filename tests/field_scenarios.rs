use glam::{Vec2, Vec3};
use neural_field::FieldConfig;
use neural_field::camera::Camera;
use neural_field::scene::highlight::CursorStyle;
use neural_field::scene::node::{Material, Node};
use neural_field::scene::{FieldState, FrameInput, FrameReport, Pointer};

fn skills_only() -> FieldState {
    FieldState::new(FieldConfig { background_count: 0, seed: Some(7), ..FieldConfig::default() })
}

fn pointer_over(field: &FieldState, camera: &Camera, node: usize) -> Pointer {
    let world = field.group_matrix().transform_point3(field.nodes[node].position);
    let ndc = camera.world_to_ndc(world).expect("skill nodes are in front of the camera");
    Pointer(ndc.truncate())
}

fn step(field: &mut FieldState, camera: &Camera, pointer: Pointer) -> FrameReport {
    field.step(&FrameInput { pointer, camera })
}

#[test]
fn hovering_a_skill_lights_it_up_until_the_pointer_leaves() {
    let camera = Camera::new(&FieldConfig::default(), 1024, 768);
    let mut field = skills_only();

    let idle = step(&mut field, &camera, Pointer::OFF_SCREEN);
    assert_eq!(idle.cursor, CursorStyle::Default);
    assert!(field.nodes.iter().all(|n| n.appearance.emissive_intensity == 0.8));

    let mut last_scale = field.nodes[0].appearance.scale;
    for _ in 0..20 {
        let pointer = pointer_over(&field, &camera, 0);
        let report = step(&mut field, &camera, pointer);
        assert_eq!(report.hovered.map(|h| h.node), Some(0));
        assert_eq!(report.cursor, CursorStyle::Pointer);
        assert_eq!(field.nodes[0].appearance.emissive_intensity, 1.5);
        assert!(field.nodes[0].appearance.scale > last_scale);
        last_scale = field.nodes[0].appearance.scale;
    }
    assert!(last_scale < 1.3);
    assert!(field.nodes[1..].iter().all(|n| n.appearance.emissive_intensity == 0.8));

    let left = step(&mut field, &camera, Pointer::OFF_SCREEN);
    assert_eq!(left.cursor, CursorStyle::Default);
    assert!(left.hovered.is_none());
    assert_eq!(field.nodes[0].appearance.emissive_intensity, 0.8);
    assert!(field.nodes[0].appearance.scale < last_scale);
}

#[test]
fn hovered_background_node_swaps_material_and_restores_it() {
    let config = FieldConfig { background_count: 0, skills: Vec::new(), ..FieldConfig::default() };
    let nodes = vec![Node::background(Vec3::ZERO, Vec3::ZERO, 0.4)];
    let mut field = FieldState::from_nodes(config, nodes, 3);
    let camera = Camera::new(&field.config, 800, 600);

    let report = step(&mut field, &camera, Pointer(Vec2::ZERO));
    assert_eq!(report.hovered.map(|h| h.node), Some(0));
    assert_eq!(field.nodes[0].appearance.material, Material::Highlight);

    step(&mut field, &camera, Pointer(Vec2::new(0.9, 0.9)));
    assert_eq!(field.nodes[0].appearance.material, Material::Base);
}

#[test]
fn dense_cluster_saturates_connection_capacity() {
    let config = FieldConfig { connections_per_node: 1, skills: Vec::new(), ..FieldConfig::default() };
    let nodes: Vec<Node> = (0..20)
        .map(|i| Node::background(Vec3::new(i as f32 * 0.01, 0.0, 0.0), Vec3::ZERO, 0.3))
        .collect();
    let mut field = FieldState::from_nodes(config, nodes, 11);
    let camera = Camera::new(&field.config, 800, 600);

    let report = step(&mut field, &camera, Pointer::OFF_SCREEN);
    // 190 pairs are within range, only one slot per node
    assert_eq!(field.connections.capacity(), 20);
    assert_eq!(report.segments, 20);
    assert_eq!(field.connections.pairs()[0], (0, 1));
}

#[test]
fn drifting_nodes_are_pulled_back_softly() {
    let config = FieldConfig { jitter: 0.0, skills: Vec::new(), ..FieldConfig::default() };
    let escaping = Node::background(Vec3::new(20.0, 0.0, 0.0), Vec3::new(0.05, 0.0, 0.0), 0.3);
    let mut field = FieldState::from_nodes(config, vec![escaping], 1);
    let camera = Camera::new(&field.config, 800, 600);

    let mut farthest: f32 = 0.0;
    for _ in 0..2000 {
        step(&mut field, &camera, Pointer::OFF_SCREEN);
        farthest = farthest.max(field.nodes[0].position.length());
    }
    // overshoots the boundary but turns around
    assert!(farthest > 20.0);
    assert!(farthest < 25.0);
    assert!(field.nodes[0].position.length() < farthest);
}

#[test]
fn picking_is_stable_for_a_fixed_layout() {
    let camera = Camera::new(&FieldConfig::default(), 1280, 720);
    let field = FieldState::new(FieldConfig { seed: Some(99), ..FieldConfig::default() });
    let skill = field.background_count();
    let pointer = pointer_over(&field, &camera, skill);

    let first = field.pick(pointer, &camera);
    assert!(first.is_some());
    for _ in 0..5 {
        assert_eq!(field.pick(pointer, &camera), first);
    }
    assert_eq!(field.pick(Pointer::OFF_SCREEN, &camera), None);
}
