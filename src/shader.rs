//! WGSL sources and base geometry for the instanced passes.
//!
//! The foliage shader is generated in [`crate::foliage`]; this module holds
//! the two fixed shaders (lit instanced meshes and additive point sprites)
//! and the vertex data of each [`MeshKind`].

use crate::render::MeshKind;
use bytemuck::{Pod, Zeroable};
use std::f32::consts::{PI, TAU};

/// Lit, instanced meshes: ornaments, star, snow.
///
/// Vertex buffer 0 is [`MeshVertex`], buffer 1 the per-instance model matrix,
/// buffer 2 the per-instance color. Group 0 is [`MeshGlobals`], group 1 the
/// per-batch [`MaterialUniform`].
pub const MESH_SHADER: &str = r#"
struct Globals {
    view_proj: mat4x4<f32>,
    group_transform: mat4x4<f32>,
    camera_pos: vec4<f32>,
    light_dir: vec4<f32>,
};

struct Material {
    metalness: f32,
    roughness: f32,
    emissive: f32,
    in_group: f32,
};

@group(0) @binding(0)
var<uniform> globals: Globals;

@group(1) @binding(0)
var<uniform> material: Material;

struct VertexInput {
    @location(0) position: vec3<f32>,
    @location(1) normal: vec3<f32>,
};

struct InstanceInput {
    @location(2) model_0: vec4<f32>,
    @location(3) model_1: vec4<f32>,
    @location(4) model_2: vec4<f32>,
    @location(5) model_3: vec4<f32>,
    @location(6) color: vec3<f32>,
};

struct VertexOutput {
    @builtin(position) clip_position: vec4<f32>,
    @location(0) world_pos: vec3<f32>,
    @location(1) normal: vec3<f32>,
    @location(2) color: vec3<f32>,
};

@vertex
fn vs_main(v: VertexInput, inst: InstanceInput) -> VertexOutput {
    var model = mat4x4<f32>(inst.model_0, inst.model_1, inst.model_2, inst.model_3);
    if material.in_group > 0.5 {
        model = globals.group_transform * model;
    }
    let world = model * vec4<f32>(v.position, 1.0);

    var out: VertexOutput;
    out.clip_position = globals.view_proj * world;
    out.world_pos = world.xyz;
    out.normal = (model * vec4<f32>(v.normal, 0.0)).xyz;
    out.color = inst.color;
    return out;
}

@fragment
fn fs_main(in: VertexOutput, @builtin(front_facing) front: bool) -> @location(0) vec4<f32> {
    var n = normalize(in.normal);
    if !front {
        n = -n;
    }
    let l = normalize(-globals.light_dir.xyz);
    let v = normalize(globals.camera_pos.xyz - in.world_pos);
    let h = normalize(l + v);

    let diffuse = max(dot(n, l), 0.0) * (1.0 - material.metalness * 0.5);
    let shininess = mix(128.0, 4.0, material.roughness);
    let specular = pow(max(dot(n, h), 0.0), shininess) * mix(0.04, 1.0, material.metalness);
    let rim = pow(1.0 - max(dot(n, v), 0.0), 3.0) * 0.3;

    let lit = in.color * (0.25 + diffuse + material.emissive) + vec3<f32>(specular + rim);
    return vec4<f32>(lit, 1.0);
}
"#;

/// Camera-facing quads with soft round falloff, blended additively.
pub const SPRITE_SHADER: &str = r#"
struct SpriteUniforms {
    view_proj: mat4x4<f32>,
    pixel_to_ndc: vec2<f32>,
    _pad: vec2<f32>,
};

@group(0) @binding(0)
var<uniform> uniforms: SpriteUniforms;

struct VertexOutput {
    @builtin(position) clip_position: vec4<f32>,
    @location(0) uv: vec2<f32>,
    @location(1) color: vec3<f32>,
    @location(2) opacity: f32,
};

@vertex
fn vs_main(
    @builtin(vertex_index) vertex_index: u32,
    @location(0) position: vec3<f32>,
    @location(1) size: f32,
    @location(2) color: vec3<f32>,
    @location(3) opacity: f32,
) -> VertexOutput {
    var quad_vertices = array<vec2<f32>, 6>(
        vec2<f32>(-1.0, -1.0),
        vec2<f32>( 1.0, -1.0),
        vec2<f32>(-1.0,  1.0),
        vec2<f32>(-1.0,  1.0),
        vec2<f32>( 1.0, -1.0),
        vec2<f32>( 1.0,  1.0),
    );
    let quad_pos = quad_vertices[vertex_index];

    var clip_pos = uniforms.view_proj * vec4<f32>(position, 1.0);
    let pixel_size = size * (300.0 / max(clip_pos.w, 0.1));
    clip_pos.x += quad_pos.x * 0.5 * pixel_size * uniforms.pixel_to_ndc.x * clip_pos.w;
    clip_pos.y += quad_pos.y * 0.5 * pixel_size * uniforms.pixel_to_ndc.y * clip_pos.w;

    var out: VertexOutput;
    out.clip_position = clip_pos;
    out.uv = quad_pos;
    out.color = color;
    out.opacity = opacity;
    return out;
}

@fragment
fn fs_main(in: VertexOutput) -> @location(0) vec4<f32> {
    let r = length(in.uv);
    if r > 1.0 {
        discard;
    }
    let falloff = 1.0 - r;
    return vec4<f32>(in.color * falloff, in.opacity * falloff);
}
"#;

/// Group 0 of [`MESH_SHADER`].
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Pod, Zeroable)]
pub struct MeshGlobals {
    pub view_proj: [[f32; 4]; 4],
    pub group_transform: [[f32; 4]; 4],
    pub camera_pos: [f32; 4],
    /// Direction the light travels, `w` unused.
    pub light_dir: [f32; 4],
}

/// Group 1 of [`MESH_SHADER`], one per batch.
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Pod, Zeroable)]
pub struct MaterialUniform {
    pub metalness: f32,
    pub roughness: f32,
    pub emissive: f32,
    /// `1.0` when the batch lives inside the tree group.
    pub in_group: f32,
}

/// Uniforms of [`SPRITE_SHADER`].
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Pod, Zeroable)]
pub struct SpriteUniforms {
    pub view_proj: [[f32; 4]; 4],
    pub pixel_to_ndc: [f32; 2],
    pub _pad: [f32; 2],
}

#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Pod, Zeroable)]
pub struct MeshVertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
}

/// Indexed triangle list of one base mesh.
#[derive(Debug, Clone, Default)]
pub struct MeshData {
    pub vertices: Vec<MeshVertex>,
    pub indices: Vec<u16>,
}

impl MeshData {
    fn push(&mut self, position: [f32; 3], normal: [f32; 3]) -> u16 {
        self.vertices.push(MeshVertex { position, normal });
        (self.vertices.len() - 1) as u16
    }
}

/// Base geometry of `kind`, sized so that a unit instance scale matches the
/// modelled ornament.
pub fn mesh_data(kind: MeshKind) -> MeshData {
    match kind {
        MeshKind::Cube => cube(),
        MeshKind::Sphere => uv_sphere(1.0, 16, 16),
        MeshKind::Octahedron => octahedron(1.0),
        MeshKind::Flake => disc(1.0, 6),
    }
}

/// Unit cube with per-face normals.
fn cube() -> MeshData {
    let mut mesh = MeshData::default();
    let faces: [([f32; 3], [f32; 3], [f32; 3]); 6] = [
        ([1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0]),
        ([-1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, -1.0]),
        ([0.0, 1.0, 0.0], [0.0, 0.0, 1.0], [1.0, 0.0, 0.0]),
        ([0.0, -1.0, 0.0], [0.0, 0.0, -1.0], [1.0, 0.0, 0.0]),
        ([0.0, 0.0, 1.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]),
        ([0.0, 0.0, -1.0], [-1.0, 0.0, 0.0], [0.0, 1.0, 0.0]),
    ];
    for (normal, u, v) in faces {
        let corner = |su: f32, sv: f32| {
            [
                (normal[0] + u[0] * su + v[0] * sv) * 0.5,
                (normal[1] + u[1] * su + v[1] * sv) * 0.5,
                (normal[2] + u[2] * su + v[2] * sv) * 0.5,
            ]
        };
        let a = mesh.push(corner(-1.0, -1.0), normal);
        let b = mesh.push(corner(1.0, -1.0), normal);
        let c = mesh.push(corner(1.0, 1.0), normal);
        let d = mesh.push(corner(-1.0, 1.0), normal);
        mesh.indices.extend_from_slice(&[a, b, c, a, c, d]);
    }
    mesh
}

fn uv_sphere(radius: f32, slices: u16, stacks: u16) -> MeshData {
    let mut mesh = MeshData::default();
    for stack in 0..=stacks {
        let phi = PI * stack as f32 / stacks as f32;
        for slice in 0..=slices {
            let theta = TAU * slice as f32 / slices as f32;
            let n = [phi.sin() * theta.cos(), phi.cos(), phi.sin() * theta.sin()];
            mesh.push([n[0] * radius, n[1] * radius, n[2] * radius], n);
        }
    }
    let row = slices + 1;
    for stack in 0..stacks {
        for slice in 0..slices {
            let a = stack * row + slice;
            let b = a + row;
            mesh.indices.extend_from_slice(&[a, a + 1, b, a + 1, b + 1, b]);
        }
    }
    mesh
}

fn octahedron(radius: f32) -> MeshData {
    let mut mesh = MeshData::default();
    let axes = [
        [radius, 0.0, 0.0],
        [0.0, 0.0, radius],
        [-radius, 0.0, 0.0],
        [0.0, 0.0, -radius],
    ];
    for pole in [radius, -radius] {
        for i in 0..4 {
            let a = axes[i];
            let b = axes[(i + 1) % 4];
            let top = [0.0, pole, 0.0];
            let (b, a) = if pole > 0.0 { (a, b) } else { (b, a) };
            let n = (glam::Vec3::from(a) + glam::Vec3::from(b) + glam::Vec3::from(top)).normalize();
            let i0 = mesh.push(top, n.to_array());
            let i1 = mesh.push(a, n.to_array());
            let i2 = mesh.push(b, n.to_array());
            mesh.indices.extend_from_slice(&[i0, i1, i2]);
        }
    }
    mesh
}

/// Flat polygon facing +Z, drawn double-sided.
fn disc(radius: f32, segments: u16) -> MeshData {
    let mut mesh = MeshData::default();
    let normal = [0.0, 0.0, 1.0];
    let center = mesh.push([0.0, 0.0, 0.0], normal);
    for i in 0..segments {
        let theta = TAU * i as f32 / segments as f32;
        mesh.push([theta.cos() * radius, theta.sin() * radius, 0.0], normal);
    }
    for i in 0..segments {
        let a = center + 1 + i;
        let b = center + 1 + (i + 1) % segments;
        mesh.indices.extend_from_slice(&[center, a, b]);
    }
    mesh
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec3;

    fn validate(source: &str) {
        let module = naga::front::wgsl::parse_str(source).expect("WGSL should parse");
        let mut validator = naga::valid::Validator::new(
            naga::valid::ValidationFlags::all(),
            naga::valid::Capabilities::all(),
        );
        validator.validate(&module).expect("WGSL should validate");
    }

    #[test]
    fn test_mesh_shader_validates() {
        validate(MESH_SHADER);
    }

    #[test]
    fn test_sprite_shader_validates() {
        validate(SPRITE_SHADER);
    }

    #[test]
    fn test_uniform_sizes_are_16_aligned() {
        assert_eq!(std::mem::size_of::<MeshGlobals>(), 160);
        assert_eq!(std::mem::size_of::<MaterialUniform>(), 16);
        assert_eq!(std::mem::size_of::<SpriteUniforms>(), 80);
        assert_eq!(std::mem::size_of::<MeshVertex>(), 24);
    }

    #[test]
    fn test_meshes_are_well_formed() {
        for kind in [MeshKind::Cube, MeshKind::Sphere, MeshKind::Octahedron, MeshKind::Flake] {
            let mesh = mesh_data(kind);
            assert_eq!(mesh.indices.len() % 3, 0, "{kind:?}");
            assert!(mesh
                .indices
                .iter()
                .all(|&i| (i as usize) < mesh.vertices.len()));
        }
        assert_eq!(mesh_data(MeshKind::Cube).indices.len(), 36);
        assert_eq!(mesh_data(MeshKind::Octahedron).indices.len(), 24);
        assert_eq!(mesh_data(MeshKind::Flake).indices.len(), 18);
    }

    #[test]
    fn test_mesh_extents() {
        let max_extent = |kind| {
            mesh_data(kind)
                .vertices
                .iter()
                .map(|v| Vec3::from(v.position).abs().max_element())
                .fold(0.0f32, f32::max)
        };
        assert!((max_extent(MeshKind::Cube) - 0.5).abs() < 1e-6);
        assert!((max_extent(MeshKind::Sphere) - 1.0).abs() < 1e-6);
        assert!((max_extent(MeshKind::Octahedron) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_cube_normals_point_outward() {
        let mesh = mesh_data(MeshKind::Cube);
        for v in &mesh.vertices {
            assert!(Vec3::from(v.position).dot(Vec3::from(v.normal)) > 0.0);
        }
    }
}
