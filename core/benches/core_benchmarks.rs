use criterion::{black_box, criterion_group, criterion_main, Criterion};

use strata_core::geometry::{ArrayFormat, Geometry, VertexAttribute};
use strata_core::obj::{parse_obj, ObjOptions};

/// OBJ text for an `n` x `n` grid of quads with texcoords and normals.
fn grid_obj(n: usize) -> String {
    let mut out = String::from("o grid\n");
    for y in 0..=n {
        for x in 0..=n {
            out.push_str(&format!("v {x} {y} 0\n"));
            out.push_str(&format!("vt {} {}\n", x as f32 / n as f32, y as f32 / n as f32));
        }
    }
    out.push_str("vn 0 0 1\n");
    let row = n + 1;
    for y in 0..n {
        for x in 0..n {
            let a = y * row + x + 1;
            let (b, c, d) = (a + 1, a + row + 1, a + row);
            out.push_str(&format!("f {a}/{a}/1 {b}/{b}/1 {c}/{c}/1 {d}/{d}/1\n"));
        }
    }
    out
}

// ---------------------------------------------------------------------------
// OBJ parsing
// ---------------------------------------------------------------------------

fn bench_parse_obj_indexed(c: &mut Criterion) {
    let source = grid_obj(64);
    let options = ObjOptions::default();
    c.bench_function("parse_obj_grid_64_indexed", |b| {
        b.iter(|| parse_obj(black_box(&source), &options));
    });
}

fn bench_parse_obj_expanded(c: &mut Criterion) {
    let source = grid_obj(64);
    let options = ObjOptions {
        generate_indices: false,
    };
    c.bench_function("parse_obj_grid_64_expanded", |b| {
        b.iter(|| parse_obj(black_box(&source), &options));
    });
}

// ---------------------------------------------------------------------------
// Geometry construction
// ---------------------------------------------------------------------------

fn bench_geometry_separate_arrays(c: &mut Criterion) {
    let positions = vec![0.0f32; 3 * 10_000];
    let normals = vec![0.0f32; 3 * 10_000];
    c.bench_function("geometry_two_arrays_10k", |b| {
        b.iter(|| {
            let mut geometry = Geometry::new();
            geometry
                .add_array_pod(ArrayFormat::float3(VertexAttribute::Position), &positions)
                .unwrap();
            geometry
                .add_array_pod(ArrayFormat::float3(VertexAttribute::Normal), &normals)
                .unwrap();
            black_box(geometry)
        });
    });
}

fn bench_geometry_interleaved(c: &mut Criterion) {
    let formats = [
        ArrayFormat::float3(VertexAttribute::Position),
        ArrayFormat::float3(VertexAttribute::Normal),
        ArrayFormat::float2(VertexAttribute::TexCoord(0)),
    ];
    let data = vec![0u8; 32 * 10_000];
    c.bench_function("geometry_interleaved_10k", |b| {
        b.iter(|| {
            let mut geometry = Geometry::new();
            geometry.add_interleaved(&formats, data.clone()).unwrap();
            black_box(geometry)
        });
    });
}

fn bench_geometry_update_vertices(c: &mut Criterion) {
    let mut geometry = Geometry::new();
    let root = geometry
        .add_array_pod(
            ArrayFormat::float3(VertexAttribute::Position),
            &vec![0.0f32; 3 * 10_000],
        )
        .unwrap();
    let patch = vec![1u8; 12 * 256];
    c.bench_function("geometry_update_256_vertices", |b| {
        b.iter(|| geometry.update_vertices(root, black_box(1024), &patch));
    });
}

criterion_group!(
    benches,
    bench_parse_obj_indexed,
    bench_parse_obj_expanded,
    bench_geometry_separate_arrays,
    bench_geometry_interleaved,
    bench_geometry_update_vertices,
);
criterion_main!(benches);
