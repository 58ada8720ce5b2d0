use std::sync::Arc;

use criterion::{black_box, criterion_group, criterion_main, Criterion};

use strata_graphics::{
    ArrayFormat, BuildMode, DummyBackend, Geometry, GeometryOwnership, GraphicsDevice, Mesh,
    RenderMode, StreamUsages, VertexAttribute,
};

fn sample_geometry(vertices: usize) -> Arc<Geometry> {
    let mut geometry = Geometry::new();
    for attribute in [
        VertexAttribute::Position,
        VertexAttribute::Normal,
        VertexAttribute::Color,
    ] {
        geometry
            .add_array_pod(ArrayFormat::float3(attribute), &vec![0.0f32; 3 * vertices])
            .unwrap();
    }
    geometry
        .add_array_pod(
            ArrayFormat::float2(VertexAttribute::TexCoord(0)),
            &vec![0.0f32; 2 * vertices],
        )
        .unwrap();
    let indices: Vec<u32> = (0..vertices as u32).collect();
    geometry.set_indices_u32(&indices).unwrap();
    Arc::new(geometry)
}

fn device() -> GraphicsDevice {
    GraphicsDevice::with_backend(Arc::new(DummyBackend::new()))
}

// ---------------------------------------------------------------------------
// Mesh build
// ---------------------------------------------------------------------------

fn bench_build(c: &mut Criterion, name: &str, build_mode: BuildMode, mode: RenderMode) {
    let device = device();
    let geometry = sample_geometry(4096);
    let usages = StreamUsages::default();
    c.bench_function(name, |b| {
        b.iter(|| {
            let mut mesh =
                Mesh::from_geometry(Arc::clone(&geometry), GeometryOwnership::Shared).unwrap();
            mesh.build_with(&device, build_mode, &usages, mode).unwrap();
            black_box(mesh)
        });
    });
}

fn bench_build_independent_vbo(c: &mut Criterion) {
    bench_build(
        c,
        "mesh_build_independent_vbo_4k",
        BuildMode::IndependentStreams,
        RenderMode::VertexBufferObject,
    );
}

fn bench_build_independent_unified(c: &mut Criterion) {
    bench_build(
        c,
        "mesh_build_independent_unified_vao_4k",
        BuildMode::IndependentStreams,
        RenderMode::UnifiedVertexArrayObject,
    );
}

fn bench_build_global_vao(c: &mut Criterion) {
    bench_build(
        c,
        "mesh_build_global_vao_4k",
        BuildMode::GlobalStream,
        RenderMode::VertexArrayObject,
    );
}

// ---------------------------------------------------------------------------
// Bind and draw
// ---------------------------------------------------------------------------

fn bench_bind_and_draw(c: &mut Criterion) {
    let mut group = c.benchmark_group("mesh_bind_draw");
    for mode in RenderMode::ALL {
        let mut device = device();
        let mut mesh = Mesh::from_geometry(sample_geometry(256), GeometryOwnership::Owned).unwrap();
        mesh.build_with(&device, BuildMode::IndependentStreams, &StreamUsages::default(), mode)
            .unwrap();
        group.bench_function(format!("{mode:?}"), |b| {
            b.iter(|| {
                mesh.bind(&mut device).unwrap();
                device.render_mesh().unwrap();
                device.unbind_mesh();
            });
        });
    }
    group.finish();
}

// ---------------------------------------------------------------------------
// Partial updates
// ---------------------------------------------------------------------------

fn bench_update_after_edit(c: &mut Criterion) {
    let device = device();
    let geometry = sample_geometry(4096);
    let root = geometry.root_arrays().next().unwrap();
    let mut mesh = Mesh::from_geometry(Arc::clone(&geometry), GeometryOwnership::Shared).unwrap();
    mesh.auto_build(&device).unwrap();
    let patch = vec![0u8; 12 * 64];

    c.bench_function("mesh_update_64_vertices", |b| {
        b.iter(|| {
            geometry.update_vertices(root, black_box(512), &patch).unwrap();
            black_box(mesh.update())
        });
    });
}

criterion_group!(
    benches,
    bench_build_independent_vbo,
    bench_build_independent_unified,
    bench_build_global_vao,
    bench_bind_and_draw,
    bench_update_after_edit,
);
criterion_main!(benches);
