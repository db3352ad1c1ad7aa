//! Benchmarks for deformation operations.

use arap_deform::mesh::grid;
use arap_deform::prelude::*;
use criterion::{criterion_group, criterion_main, Criterion};
use nalgebra::Vector3;

/// Pin the left column, drag the right column, solve the rest.
fn strip_types(mesh: &TriangleMesh, n: usize) -> Vec<VertexType> {
    mesh.vertices()
        .iter()
        .map(|p| {
            if p.x == 0.0 {
                VertexType::Fixed
            } else if p.x == n as f64 {
                VertexType::Draggable
            } else {
                VertexType::Calculated
            }
        })
        .collect()
}

fn bench_setup(c: &mut Criterion) {
    let mesh = grid(50, 50, 1.0);

    c.bench_function("solver_new_50x50", |b| {
        b.iter(|| ArapSolver::new(&mesh, DeformOptions::default()).unwrap());
    });
}

fn bench_solve_step(c: &mut Criterion) {
    let n = 50;
    let mesh = grid(n, n, 1.0);
    let types = strip_types(&mesh, n);

    let mut dragged = mesh.vertices().to_vec();
    for (v, t) in types.iter().enumerate() {
        if *t == VertexType::Draggable {
            dragged[v] += Vector3::new(0.0, 0.0, 5.0);
        }
    }

    c.bench_function("solve_step_cached_50x50", |b| {
        let mut solver = ArapSolver::new(&mesh, DeformOptions::default()).unwrap();
        let mut positions = dragged.clone();
        solver.solve_step(&types, &mut positions).unwrap();

        b.iter(|| solver.solve_step(&types, &mut positions).unwrap());
    });

    c.bench_function("solve_step_refactor_50x50", |b| {
        let mut solver = ArapSolver::new(&mesh, DeformOptions::default()).unwrap();
        let mut positions = dragged.clone();

        b.iter(|| {
            solver.invalidate();
            solver.solve_step(&types, &mut positions).unwrap()
        });
    });
}

criterion_group!(benches, bench_setup, bench_solve_step);
criterion_main!(benches);
