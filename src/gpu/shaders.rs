// ============================================================================
// GPU SHADERS — WGSL code kept inline for containment
// ============================================================================

// ============================================================================
// JUMP FLOOD PROPAGATION — one temporal round of the distance field
// ============================================================================
//
// Same program as the CPU `JumpFloodProgram`: each field pixel gathers seeds
// from its 8 neighbours of the opposite class and from the previous field at
// ±jump and ±1, keeps the nearest still-valid one, and stores
// `[signed distance, seed_u, seed_v, seeded]`.
//
// WGSL has no infinity literal: an unseeded texel is written as ±1 with
// `seeded = 0` and the host turns it into ±∞ after readback.
pub const JUMP_FLOOD_SHADER: &str = r#"
struct FieldParams {
    field_size: vec2<u32>,
    image_size: vec2<u32>,
    feedback_size: vec2<u32>,
    jump: u32,
    threshold: f32,
};

// Source frame as packed RGBA8 (alpha in the top byte).
@group(0) @binding(0) var<storage, read> source_px: array<u32>;
// Previous field, feedback_size.x * feedback_size.y texels.
@group(0) @binding(1) var<storage, read> feedback: array<vec4<f32>>;
// New field, field_size.x * field_size.y texels.
@group(0) @binding(2) var<storage, read_write> field_out: array<vec4<f32>>;
@group(0) @binding(3) var<uniform> params: FieldParams;

fn is_inside(p: vec2<i32>) -> bool {
    let fsz = vec2<f32>(params.field_size);
    let isz = params.image_size;
    let uv = (vec2<f32>(p) + vec2<f32>(0.5)) / fsz;
    let s = min(vec2<u32>(uv * vec2<f32>(isz)), isz - vec2<u32>(1u));
    let texel = source_px[s.y * isz.x + s.x];
    let alpha = f32(texel >> 24u) / 255.0;
    return alpha > params.threshold;
}

fn feedback_at(uv: vec2<f32>) -> vec4<f32> {
    let fb = params.feedback_size;
    let t = min(vec2<u32>(max(floor(uv * vec2<f32>(fb)), vec2<f32>(0.0))), fb - vec2<u32>(1u));
    return feedback[t.y * fb.x + t.x];
}

fn dist2(p: vec2<i32>, seed: vec2<i32>) -> f32 {
    let d = vec2<f32>(seed - p);
    return dot(d, d);
}

@compute @workgroup_size(16, 16)
fn cs_propagate(@builtin(global_invocation_id) gid: vec3<u32>) {
    let size = vec2<i32>(params.field_size);
    let p = vec2<i32>(gid.xy);
    if (p.x >= size.x || p.y >= size.y) {
        return;
    }
    let inside = is_inside(p);
    let fsz = vec2<f32>(params.field_size);

    var best_d2 = -1.0;
    var best = vec2<i32>(0, 0);

    for (var dy: i32 = -1; dy <= 1; dy = dy + 1) {
        for (var dx: i32 = -1; dx <= 1; dx = dx + 1) {
            let q = p + vec2<i32>(dx, dy);
            if (q.x < 0 || q.y < 0 || q.x >= size.x || q.y >= size.y) {
                continue;
            }
            if (is_inside(q) != inside) {
                let d2 = dist2(p, q);
                if (best_d2 < 0.0 || d2 < best_d2) {
                    best_d2 = d2;
                    best = q;
                }
            }
        }
    }

    var jump = max(i32(params.jump), 1);
    for (var level: i32 = 0; level < 2; level = level + 1) {
        for (var oy: i32 = -1; oy <= 1; oy = oy + 1) {
            for (var ox: i32 = -1; ox <= 1; ox = ox + 1) {
                let q = p + vec2<i32>(ox, oy) * jump;
                if (q.x < 0 || q.y < 0 || q.x >= size.x || q.y >= size.y) {
                    continue;
                }
                let texel = feedback_at((vec2<f32>(q) + vec2<f32>(0.5)) / fsz);
                if (texel.w < 0.5) {
                    continue;
                }
                let seed = clamp(vec2<i32>(floor(texel.yz * fsz)), vec2<i32>(0), size - vec2<i32>(1));
                if (is_inside(seed) != inside) {
                    let d2 = dist2(p, seed);
                    if (best_d2 < 0.0 || d2 < best_d2) {
                        best_d2 = d2;
                        best = seed;
                    }
                }
            }
        }
        jump = 1;
    }

    let idx = u32(p.y) * params.field_size.x + u32(p.x);
    let side = select(1.0, -1.0, inside);
    if (best_d2 < 0.0) {
        field_out[idx] = vec4<f32>(side, 0.0, 0.0, 0.0);
    } else {
        let seed_uv = (vec2<f32>(best) + vec2<f32>(0.5)) / fsz;
        field_out[idx] = vec4<f32>(side * (sqrt(best_d2) - 0.5), seed_uv, 1.0);
    }
}
"#;
