//! Foliage point cloud.
//!
//! Fifteen thousand needles interpolate between a scatter sphere and the cone
//! exactly like the ornaments, but the per-point math runs in the vertex
//! shader: the CPU only uploads static attributes once and a
//! [`FoliageUniforms`] block per frame. [`FoliageCloud::point_position`] is
//! the CPU mirror of that shader and uses the same easing function.

use crate::easing::{approach, ease_in_out_cubic};
use crate::spawn::{cone_normal, SpawnContext};
use crate::Vec3;
use bytemuck::{Pod, Zeroable};
use glam::Mat4;

/// Needle base color (`#002419`).
pub const FOLIAGE_BASE: Vec3 = Vec3::new(0.0, 36.0 / 255.0, 25.0 / 255.0);
/// Needle highlight color (`#D4AF37`).
pub const FOLIAGE_HIGHLIGHT: Vec3 = Vec3::new(212.0 / 255.0, 175.0 / 255.0, 55.0 / 255.0);

/// Static per-point attributes, one vertex-buffer entry per point.
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Pod, Zeroable)]
pub struct FoliageVertex {
    pub position: [f32; 3],
    pub size: f32,
    pub target: [f32; 3],
    pub seed: f32,
    pub normal: [f32; 3],
    pub _pad: f32,
}

/// Per-frame uniforms of the foliage shader.
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Pod, Zeroable)]
pub struct FoliageUniforms {
    /// `projection × view × group`.
    pub view_proj: [[f32; 4]; 4],
    pub time: f32,
    pub progress: f32,
    /// `2 / viewport` in pixels, converts point sizes to NDC.
    pub pixel_to_ndc: [f32; 2],
}

/// Tunables of the cloud.
#[derive(Debug, Clone, Copy)]
pub struct FoliageParams {
    pub count: u32,
    pub scatter_radius: f32,
    pub tree_height: f32,
    pub tree_radius: f32,
    pub smoothing_rate: f32,
    pub size_min: f32,
    pub size_span: f32,
    /// Progress above which the breathing displacement kicks in.
    pub breathe_threshold: f32,
}

/// The needle cloud: static attributes plus its own progress.
#[derive(Debug, Clone)]
pub struct FoliageCloud {
    vertices: Vec<FoliageVertex>,
    progress: f32,
    time: f32,
    params: FoliageParams,
}

impl FoliageCloud {
    pub fn generate(params: FoliageParams, ctx: &mut SpawnContext) -> Self {
        let vertices = (0..params.count)
            .map(|_| {
                let scatter = ctx.scatter_point(params.scatter_radius);
                let target = ctx.cone_point(params.tree_height, params.tree_radius);
                let normal = cone_normal(target, params.tree_height, params.tree_radius);
                FoliageVertex {
                    position: scatter.to_array(),
                    size: ctx.random() * params.size_span + params.size_min,
                    target: target.to_array(),
                    seed: ctx.random(),
                    normal: normal.to_array(),
                    _pad: 0.0,
                }
            })
            .collect();
        Self {
            vertices,
            progress: 0.0,
            time: 0.0,
            params,
        }
    }

    pub fn vertices(&self) -> &[FoliageVertex] {
        &self.vertices
    }

    pub fn len(&self) -> usize {
        self.vertices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }

    pub fn progress(&self) -> f32 {
        self.progress
    }

    pub fn params(&self) -> &FoliageParams {
        &self.params
    }

    /// Advance progress toward the current mode and record the frame time.
    pub fn update(&mut self, tree_shape: bool, dt: f32, elapsed: f32) {
        let target = if tree_shape { 1.0 } else { 0.0 };
        self.progress = approach(self.progress, target, self.params.smoothing_rate, dt);
        self.time = elapsed;
    }

    /// Uniform block for the current frame.
    pub fn uniforms(&self, view_proj: Mat4, viewport: (u32, u32)) -> FoliageUniforms {
        let (w, h) = viewport;
        FoliageUniforms {
            view_proj: view_proj.to_cols_array_2d(),
            time: self.time,
            progress: self.progress,
            pixel_to_ndc: [2.0 / w.max(1) as f32, 2.0 / h.max(1) as f32],
        }
    }

    /// CPU evaluation of the vertex shader's position for point `index`.
    pub fn point_position(&self, index: usize, time: f32) -> Option<Vec3> {
        self.vertices
            .get(index)
            .map(|v| foliage_position(v, self.progress, time, self.params.breathe_threshold))
    }
}

/// Interpolated, breathing position of one foliage point.
pub fn foliage_position(v: &FoliageVertex, progress: f32, time: f32, breathe_threshold: f32) -> Vec3 {
    let t = ease_in_out_cubic(progress);
    let mut pos = Vec3::from(v.position).lerp(Vec3::from(v.target), t);
    if progress > breathe_threshold {
        let breathe = (time * 2.0 + v.seed * 10.0).sin() * 0.1;
        pos += Vec3::from(v.normal) * breathe;
    }
    pos
}

fn wgsl_vec3(c: Vec3) -> String {
    format!("vec3<f32>({:.6}, {:.6}, {:.6})", c.x, c.y, c.z)
}

/// Vertex + fragment WGSL for the foliage pass.
///
/// Points are drawn as 6-vertex quads, one instance per point.
pub fn foliage_shader_wgsl(breathe_threshold: f32) -> String {
    let base = wgsl_vec3(FOLIAGE_BASE);
    let highlight = wgsl_vec3(FOLIAGE_HIGHLIGHT);
    format!(
        r#"struct FoliageUniforms {{
    view_proj: mat4x4<f32>,
    time: f32,
    progress: f32,
    pixel_to_ndc: vec2<f32>,
}};

@group(0) @binding(0)
var<uniform> uniforms: FoliageUniforms;

const BREATHE_THRESHOLD: f32 = {breathe_threshold:.6};
const COLOR_BASE: vec3<f32> = {base};
const COLOR_HIGHLIGHT: vec3<f32> = {highlight};

struct VertexOutput {{
    @builtin(position) clip_position: vec4<f32>,
    @location(0) uv: vec2<f32>,
    @location(1) height: f32,
}};

fn ease_in_out_cubic(x: f32) -> f32 {{
    if x < 0.5 {{
        return 4.0 * x * x * x;
    }}
    let k = -2.0 * x + 2.0;
    return 1.0 - k * k * k / 2.0;
}}

@vertex
fn vs_main(
    @builtin(vertex_index) vertex_index: u32,
    @location(0) position: vec3<f32>,
    @location(1) size: f32,
    @location(2) target_pos: vec3<f32>,
    @location(3) seed: f32,
    @location(4) surface_normal: vec3<f32>,
) -> VertexOutput {{
    var quad_vertices = array<vec2<f32>, 6>(
        vec2<f32>(-1.0, -1.0),
        vec2<f32>( 1.0, -1.0),
        vec2<f32>(-1.0,  1.0),
        vec2<f32>(-1.0,  1.0),
        vec2<f32>( 1.0, -1.0),
        vec2<f32>( 1.0,  1.0),
    );
    let quad_pos = quad_vertices[vertex_index];

    let t = ease_in_out_cubic(uniforms.progress);
    var pos = mix(position, target_pos, t);
    if uniforms.progress > BREATHE_THRESHOLD {{
        let breathe = sin(uniforms.time * 2.0 + seed * 10.0) * 0.1;
        pos += surface_normal * breathe;
    }}

    var clip_pos = uniforms.view_proj * vec4<f32>(pos, 1.0);
    let pixel_size = size * (300.0 / max(clip_pos.w, 0.1));
    clip_pos.x += quad_pos.x * 0.5 * pixel_size * uniforms.pixel_to_ndc.x * clip_pos.w;
    clip_pos.y += quad_pos.y * 0.5 * pixel_size * uniforms.pixel_to_ndc.y * clip_pos.w;

    var out: VertexOutput;
    out.clip_position = clip_pos;
    out.uv = quad_pos;
    out.height = pos.y;
    return out;
}}

@fragment
fn fs_main(in: VertexOutput) -> @location(0) vec4<f32> {{
    let r = length(in.uv) * 0.5;
    if r > 0.5 {{
        discard;
    }}
    var color = mix(COLOR_HIGHLIGHT, COLOR_BASE, r * 2.5);
    if uniforms.progress > 0.5 {{
        let tip = smoothstep(5.0, 9.0, in.height);
        color = mix(color, COLOR_HIGHLIGHT, tip * 0.8);
    }}
    return vec4<f32>(color * 1.5, 1.0);
}}
"#
    )
}
