//! Step orchestration and the reduced global solve.

use log::{debug, warn};
use nalgebra::{Point3, Vector3};

use crate::algo::Progress;
use crate::error::{DeformError, Result};
use crate::mesh::{NeighborTable, Topology, TriangleMesh};

use super::laplacian::{build_laplacian, Laplacian};
use super::rotation::compute_rotations;
use super::sparse::{CholeskyFactor, CsrMatrix};
use super::weights::{build_weights, EdgeWeights};
use super::{DeformOptions, DeformReport, SkipReason, StepOutcome, VertexType};

/// Interactive ARAP solver for one mesh.
///
/// Holds everything that depends only on the rest pose (topology, cotangent
/// weights, Laplacian) plus the factorization of the most recent reduced
/// system. Build a new solver when the mesh topology changes.
///
/// The solver is single-threaded and must not be driven concurrently on the
/// same position buffer.
#[derive(Debug)]
pub struct ArapSolver {
    rest: Vec<Point3<f64>>,
    topology: Topology,
    weights: EdgeWeights,
    laplacian: Laplacian,
    options: DeformOptions,
    system: Option<ReducedSystem>,
}

/// The Laplacian restricted to one set of Calculated vertices.
#[derive(Debug)]
struct ReducedSystem {
    /// Compact index -> vertex id, in ascending id order.
    calculated: Vec<usize>,
    /// Vertex id -> compact index.
    compact: Vec<Option<usize>>,
    state: SystemState,
}

#[derive(Debug)]
enum SystemState {
    Ready(CholeskyFactor),
    Unconstrained,
    Failed,
}

impl ArapSolver {
    /// Precompute topology, weights and Laplacian for a mesh.
    ///
    /// # Errors
    ///
    /// Returns an error if `options` fails [`DeformOptions::validate`].
    pub fn new(mesh: &TriangleMesh, options: DeformOptions) -> Result<Self> {
        options.validate()?;

        let topology = Topology::build(mesh);
        let weights = build_weights(mesh.vertices(), &topology.neighbors, &topology.opposite);
        let laplacian = build_laplacian(&weights, mesh.num_vertices(), &topology.neighbors);

        debug!(
            "ARAP setup: {} vertices, {} faces, {} edges, {} Laplacian entries",
            mesh.num_vertices(),
            mesh.num_faces(),
            weights.len(),
            laplacian.nnz()
        );

        Ok(Self {
            rest: mesh.vertices().to_vec(),
            topology,
            weights,
            laplacian,
            options,
            system: None,
        })
    }

    /// Rest-pose positions.
    #[inline]
    pub fn rest_positions(&self) -> &[Point3<f64>] {
        &self.rest
    }

    /// Number of mesh vertices.
    #[inline]
    pub fn num_vertices(&self) -> usize {
        self.rest.len()
    }

    /// Cached topology.
    #[inline]
    pub fn topology(&self) -> &Topology {
        &self.topology
    }

    /// Cached cotangent weights.
    #[inline]
    pub fn weights(&self) -> &EdgeWeights {
        &self.weights
    }

    /// Cached Laplacian.
    #[inline]
    pub fn laplacian(&self) -> &Laplacian {
        &self.laplacian
    }

    /// Solver options.
    #[inline]
    pub fn options(&self) -> &DeformOptions {
        &self.options
    }

    /// Drop the cached reduced system; the next solve refactors.
    pub fn invalidate(&mut self) {
        self.system = None;
    }

    /// Whether a usable factorization is cached.
    pub fn is_factorized(&self) -> bool {
        matches!(
            self.system,
            Some(ReducedSystem {
                state: SystemState::Ready(_),
                ..
            })
        )
    }

    /// Run one local/global step.
    ///
    /// Rotations are fitted for every vertex, then the positions of Calculated
    /// vertices are solved with Fixed and Draggable vertices as boundary
    /// values. Only Calculated entries of `positions` are written.
    ///
    /// Calculated vertices that belong to no face are left where they are.
    ///
    /// # Errors
    ///
    /// Returns an error if `vertex_types` or `positions` does not have one entry
    /// per mesh vertex. Numerical failures are reported as
    /// [`StepOutcome::Skipped`] and leave `positions` untouched.
    pub fn solve_step(
        &mut self,
        vertex_types: &[VertexType],
        positions: &mut [Point3<f64>],
    ) -> Result<StepOutcome> {
        let n = self.rest.len();
        DeformError::check_len("vertex types", n, vertex_types.len())?;
        DeformError::check_len("positions", n, positions.len())?;

        let calculated: Vec<usize> = vertex_types
            .iter()
            .enumerate()
            .filter(|&(v, t)| t.is_calculated() && self.topology.neighbors.contains_vertex(v))
            .map(|(v, _)| v)
            .collect();

        if calculated.is_empty() {
            debug!("ARAP step skipped: no calculated vertices");
            return Ok(StepOutcome::Skipped(SkipReason::NoCalculatedVertices));
        }

        let Self {
            rest,
            topology,
            weights,
            laplacian,
            options,
            system,
        } = self;
        let neighbors = &topology.neighbors;

        let mut refactored = false;
        let system = match system.take() {
            Some(cached) if cached.calculated == calculated => system.insert(cached),
            _ => {
                refactored = true;
                system.insert(ReducedSystem::build(calculated, n, laplacian, neighbors, weights))
            }
        };

        let factor = match &system.state {
            SystemState::Ready(factor) => factor,
            SystemState::Unconstrained => {
                return Ok(StepOutcome::Skipped(SkipReason::Unconstrained));
            }
            SystemState::Failed => return Ok(StepOutcome::Skipped(SkipReason::SolveFailed)),
        };

        // Local step over the whole mesh: rotations of pinned vertices still
        // enter their free neighbors' right-hand sides
        let rotations = compute_rotations(rest, positions, neighbors, weights, options.regularization);

        let m = system.calculated.len();
        let mut rhs = [vec![0.0; m], vec![0.0; m], vec![0.0; m]];
        for (ci, &i) in system.calculated.iter().enumerate() {
            let ri = rotations.get(i);
            let mut bi = Vector3::zeros();

            for &j in neighbors.neighbors(i) {
                let w = weights.weight(i, j);
                bi += (ri + rotations.get(j)) * (rest[i] - rest[j]) * (0.5 * w);
            }

            // Move known positions to the right-hand side
            for &(j, coef) in laplacian.row(i) {
                if system.compact[j].is_none() {
                    bi -= positions[j].coords * coef;
                }
            }

            for axis in 0..3 {
                rhs[axis][ci] = bi[axis];
            }
        }

        let xs = factor.solve(&rhs[0])?;
        let ys = factor.solve(&rhs[1])?;
        let zs = factor.solve(&rhs[2])?;

        let finite = xs.iter().chain(&ys).chain(&zs).all(|v| v.is_finite());
        if !finite {
            warn!("ARAP step produced non-finite positions; keeping previous positions");
            return Ok(StepOutcome::Skipped(SkipReason::SolveFailed));
        }

        let mut max_displacement = 0.0_f64;
        for (ci, &i) in system.calculated.iter().enumerate() {
            let p = Point3::new(xs[ci], ys[ci], zs[ci]);
            max_displacement = max_displacement.max((p - positions[i]).norm());
            positions[i] = p;
        }

        Ok(StepOutcome::Solved {
            moved: m,
            max_displacement,
            rotation_fallbacks: rotations.fallback_count(),
            refactored,
        })
    }

    /// Iterate local/global steps until the free vertices settle.
    ///
    /// Repeats [`solve_step`](Self::solve_step) up to `max_iterations` times,
    /// stopping early once the largest per-step displacement falls below
    /// `tolerance`, or as soon as a step is skipped.
    pub fn deform(
        &mut self,
        vertex_types: &[VertexType],
        positions: &mut [Point3<f64>],
        progress: &Progress,
    ) -> Result<DeformReport> {
        let max_iterations = self.options.max_iterations;
        let tolerance = self.options.tolerance;
        let mut report = DeformReport {
            iterations: 0,
            converged: false,
            max_displacement: 0.0,
            skipped: None,
        };

        for iteration in 0..max_iterations {
            progress.report(iteration, max_iterations, "ARAP iteration");

            match self.solve_step(vertex_types, positions)? {
                StepOutcome::Solved {
                    max_displacement, ..
                } => {
                    report.iterations = iteration + 1;
                    report.max_displacement = max_displacement;
                    if max_displacement < tolerance {
                        report.converged = true;
                        break;
                    }
                }
                StepOutcome::Skipped(reason) => {
                    report.skipped = Some(reason);
                    break;
                }
            }
        }

        progress.report(max_iterations, max_iterations, "ARAP done");
        debug!(
            "ARAP deform: {} iterations, converged = {}, last displacement = {:.3e}",
            report.iterations, report.converged, report.max_displacement
        );

        Ok(report)
    }
}

impl ReducedSystem {
    fn build(
        calculated: Vec<usize>,
        num_vertices: usize,
        laplacian: &Laplacian,
        neighbors: &NeighborTable,
        weights: &EdgeWeights,
    ) -> Self {
        let mut compact = vec![None; num_vertices];
        for (ci, &v) in calculated.iter().enumerate() {
            compact[v] = Some(ci);
        }

        let state = if !every_component_anchored(&calculated, &compact, neighbors, weights) {
            debug!("ARAP system unconstrained: a free region touches no pinned vertex");
            SystemState::Unconstrained
        } else {
            let mut triplets = Vec::with_capacity(calculated.len() * 7);
            for (ci, &i) in calculated.iter().enumerate() {
                for &(j, coef) in laplacian.row(i) {
                    if let Some(cj) = compact[j] {
                        triplets.push((ci, cj, coef));
                    }
                }
            }

            let m = calculated.len();
            let matrix = CsrMatrix::from_triplets(m, m, triplets);
            match CholeskyFactor::factorize(&matrix) {
                Ok(factor) => {
                    debug!("ARAP system factored: {} unknowns, {} non-zeros", m, matrix.nnz());
                    SystemState::Ready(factor)
                }
                Err(e) => {
                    warn!("ARAP system could not be factored: {}", e);
                    SystemState::Failed
                }
            }
        };

        Self {
            calculated,
            compact,
            state,
        }
    }
}

/// Whether every connected group of free vertices is tied to a known position.
///
/// Connectivity only follows edges with positive weight, matching the
/// non-zero pattern of the reduced matrix. A group without such a tie makes
/// the matrix singular.
fn every_component_anchored(
    calculated: &[usize],
    compact: &[Option<usize>],
    neighbors: &NeighborTable,
    weights: &EdgeWeights,
) -> bool {
    let mut visited = vec![false; calculated.len()];
    let mut stack = Vec::new();

    for start in 0..calculated.len() {
        if visited[start] {
            continue;
        }
        visited[start] = true;
        stack.push(start);

        let mut anchored = false;
        while let Some(ci) = stack.pop() {
            let i = calculated[ci];
            for &j in neighbors.neighbors(i) {
                if weights.weight(i, j) <= 0.0 {
                    continue;
                }
                match compact[j] {
                    Some(cj) if !visited[cj] => {
                        visited[cj] = true;
                        stack.push(cj);
                    }
                    Some(_) => {}
                    None => anchored = true,
                }
            }
        }

        if !anchored {
            return false;
        }
    }

    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mesh::grid;
    use nalgebra::Matrix3;

    /// Unit square split along the 0-3 diagonal.
    ///
    /// ```text
    /// 2 --- 3
    /// |   / |
    /// | /   |
    /// 0 --- 1
    /// ```
    fn create_patch() -> TriangleMesh {
        TriangleMesh::new(
            vec![
                Point3::new(0.0, 0.0, 0.0),
                Point3::new(1.0, 0.0, 0.0),
                Point3::new(0.0, 1.0, 0.0),
                Point3::new(1.0, 1.0, 0.0),
            ],
            vec![[0, 1, 3], [0, 3, 2]],
        )
        .unwrap()
    }

    fn patch_types() -> Vec<VertexType> {
        vec![
            VertexType::Fixed,
            VertexType::Fixed,
            VertexType::Calculated,
            VertexType::Calculated,
        ]
    }

    /// Grid with the left column Fixed and the right column Draggable.
    fn create_strip(nx: usize, ny: usize) -> (TriangleMesh, Vec<VertexType>) {
        let mesh = grid(nx, ny, 1.0);
        let types = (0..mesh.num_vertices())
            .map(|v| match v % (nx + 1) {
                0 => VertexType::Fixed,
                i if i == nx => VertexType::Draggable,
                _ => VertexType::Calculated,
            })
            .collect();
        (mesh, types)
    }

    fn solved(outcome: StepOutcome) -> (usize, f64, usize, bool) {
        match outcome {
            StepOutcome::Solved {
                moved,
                max_displacement,
                rotation_fallbacks,
                refactored,
            } => (moved, max_displacement, rotation_fallbacks, refactored),
            other => panic!("Expected Solved, got {:?}", other),
        }
    }

    #[test]
    fn test_patch_at_rest_stays_at_rest() {
        let mesh = create_patch();
        let mut solver = ArapSolver::new(&mesh, DeformOptions::default()).unwrap();
        let mut positions = mesh.vertices().to_vec();

        let (moved, max_displacement, fallbacks, refactored) =
            solved(solver.solve_step(&patch_types(), &mut positions).unwrap());

        assert_eq!(moved, 2);
        assert_eq!(fallbacks, 0);
        assert!(refactored);
        assert!(max_displacement < 1e-9);
        for v in [2, 3] {
            assert!((positions[v] - mesh.vertices()[v]).norm() < 1e-9);
        }
    }

    #[test]
    fn test_patch_rigid_translation() {
        let mesh = create_patch();
        let mut solver = ArapSolver::new(&mesh, DeformOptions::default()).unwrap();

        let t = Vector3::new(0.3, -0.2, 0.5);
        let mut positions: Vec<_> = mesh.vertices().iter().map(|p| p + t).collect();

        solved(solver.solve_step(&patch_types(), &mut positions).unwrap());

        for v in [2, 3] {
            assert!((positions[v] - (mesh.vertices()[v] + t)).norm() < 1e-9);
        }

        let topology = solver.topology();
        let rotations = compute_rotations(
            mesh.vertices(),
            &positions,
            &topology.neighbors,
            solver.weights(),
            1e-6,
        );
        for r in rotations.as_slice() {
            assert!((r - Matrix3::identity()).norm() < 1e-4);
        }
    }

    #[test]
    fn test_patch_recovers_rest_from_perturbation() {
        let mesh = create_patch();
        let options = DeformOptions::default()
            .with_max_iterations(100)
            .with_tolerance(1e-12);
        let mut solver = ArapSolver::new(&mesh, options).unwrap();

        let mut positions = mesh.vertices().to_vec();
        positions[2] += Vector3::new(0.05, -0.05, 0.0);
        positions[3] += Vector3::new(-0.05, 0.02, 0.0);

        let report = solver
            .deform(&patch_types(), &mut positions, &Progress::none())
            .unwrap();

        assert!(report.skipped.is_none());
        for v in [2, 3] {
            assert!((positions[v] - mesh.vertices()[v]).norm() < 1e-3);
        }
    }

    #[test]
    fn test_boundary_positions_bit_identical() {
        let (mesh, types) = create_strip(4, 3);
        let mut solver = ArapSolver::new(&mesh, DeformOptions::default()).unwrap();

        let mut positions = mesh.vertices().to_vec();
        for (v, t) in types.iter().enumerate() {
            if *t == VertexType::Draggable {
                positions[v] += Vector3::new(0.1, 0.7, 1.3);
            }
        }
        let before = positions.clone();

        for _ in 0..3 {
            solved(solver.solve_step(&types, &mut positions).unwrap());
        }

        for (v, t) in types.iter().enumerate() {
            if !t.is_calculated() {
                for axis in 0..3 {
                    assert_eq!(positions[v][axis].to_bits(), before[v][axis].to_bits());
                }
            }
        }
    }

    #[test]
    fn test_no_drift_at_rest() {
        let (mesh, types) = create_strip(5, 4);
        let mut solver = ArapSolver::new(&mesh, DeformOptions::default()).unwrap();
        let mut positions = mesh.vertices().to_vec();

        for _ in 0..5 {
            let (_, max_displacement, _, _) = solved(solver.solve_step(&types, &mut positions).unwrap());
            assert!(max_displacement < 1e-9);
        }
        for (p, rest) in positions.iter().zip(mesh.vertices()) {
            assert!((p - rest).norm() < 1e-9);
        }
    }

    #[test]
    fn test_converges_to_fixed_point() {
        let (mesh, types) = create_strip(4, 4);
        let options = DeformOptions::default()
            .with_max_iterations(300)
            .with_tolerance(1e-10);
        let mut solver = ArapSolver::new(&mesh, options).unwrap();

        let mut positions = mesh.vertices().to_vec();
        for (v, t) in types.iter().enumerate() {
            if *t == VertexType::Draggable {
                positions[v] += Vector3::new(0.0, 0.0, 0.5);
            }
        }

        let (_, first_step, _, _) = solved(solver.solve_step(&types, &mut positions).unwrap());
        solver.deform(&types, &mut positions, &Progress::none()).unwrap();

        let (_, last_step, _, refactored) =
            solved(solver.solve_step(&types, &mut positions).unwrap());
        assert!(!refactored);
        assert!(last_step < first_step);
        assert!(last_step < 1e-3, "still moving by {}", last_step);
    }

    #[test]
    fn test_rotations_proper_after_large_drag() {
        let (mesh, types) = create_strip(4, 2);
        let mut solver = ArapSolver::new(&mesh, DeformOptions::default()).unwrap();

        let mut positions = mesh.vertices().to_vec();
        for (v, t) in types.iter().enumerate() {
            if *t == VertexType::Draggable {
                positions[v] = Point3::new(-1.0, positions[v].y, 3.0);
            }
        }
        solver.deform(&types, &mut positions, &Progress::none()).unwrap();

        let rotations = compute_rotations(
            mesh.vertices(),
            &positions,
            &solver.topology().neighbors,
            solver.weights(),
            1e-6,
        );
        for r in rotations.as_slice() {
            assert!((r.determinant() - 1.0).abs() < 1e-4);
            assert!((r.transpose() * r - Matrix3::identity()).norm() < 1e-4);
        }
        for p in &positions {
            assert!(p.coords.iter().all(|c| c.is_finite()));
        }
    }

    #[test]
    fn test_factorization_reused_until_set_changes() {
        let (mesh, mut types) = create_strip(3, 3);
        let mut solver = ArapSolver::new(&mesh, DeformOptions::default()).unwrap();
        let mut positions = mesh.vertices().to_vec();
        assert!(!solver.is_factorized());

        let (_, _, _, refactored) = solved(solver.solve_step(&types, &mut positions).unwrap());
        assert!(refactored);
        assert!(solver.is_factorized());

        let (_, _, _, refactored) = solved(solver.solve_step(&types, &mut positions).unwrap());
        assert!(!refactored);

        // Pin one more vertex
        types[5] = VertexType::Fixed;
        let (moved, _, _, refactored) = solved(solver.solve_step(&types, &mut positions).unwrap());
        assert!(refactored);
        assert_eq!(moved, 7);

        solver.invalidate();
        assert!(!solver.is_factorized());
        let (_, _, _, refactored) = solved(solver.solve_step(&types, &mut positions).unwrap());
        assert!(refactored);
    }

    #[test]
    fn test_no_calculated_vertices() {
        let mesh = create_patch();
        let mut solver = ArapSolver::new(&mesh, DeformOptions::default()).unwrap();
        let types = vec![VertexType::Fixed; 4];
        let mut positions = mesh.vertices().to_vec();

        let outcome = solver.solve_step(&types, &mut positions).unwrap();
        assert_eq!(outcome, StepOutcome::Skipped(SkipReason::NoCalculatedVertices));

        let report = solver.deform(&types, &mut positions, &Progress::none()).unwrap();
        assert_eq!(report.iterations, 0);
        assert_eq!(report.skipped, Some(SkipReason::NoCalculatedVertices));
    }

    #[test]
    fn test_unconstrained_is_noop() {
        let mesh = create_patch();
        let mut solver = ArapSolver::new(&mesh, DeformOptions::default()).unwrap();
        let types = vec![VertexType::Calculated; 4];
        let mut positions = mesh.vertices().to_vec();
        positions[1] += Vector3::new(0.5, 0.0, 0.0);
        let before = positions.clone();

        let outcome = solver.solve_step(&types, &mut positions).unwrap();
        assert_eq!(outcome, StepOutcome::Skipped(SkipReason::Unconstrained));
        assert_eq!(positions, before);
        assert!(!solver.is_factorized());
    }

    #[test]
    fn test_unconstrained_component_is_noop() {
        // Two disjoint triangles; only the first has a pinned vertex
        let mesh = TriangleMesh::new(
            vec![
                Point3::new(0.0, 0.0, 0.0),
                Point3::new(1.0, 0.0, 0.0),
                Point3::new(0.0, 1.0, 0.0),
                Point3::new(5.0, 0.0, 0.0),
                Point3::new(6.0, 0.0, 0.0),
                Point3::new(5.0, 1.0, 0.0),
            ],
            vec![[0, 1, 2], [3, 4, 5]],
        )
        .unwrap();
        let mut solver = ArapSolver::new(&mesh, DeformOptions::default()).unwrap();
        let mut types = vec![VertexType::Calculated; 6];
        types[0] = VertexType::Fixed;
        let mut positions = mesh.vertices().to_vec();

        let outcome = solver.solve_step(&types, &mut positions).unwrap();
        assert_eq!(outcome, StepOutcome::Skipped(SkipReason::Unconstrained));

        types[3] = VertexType::Draggable;
        assert!(solver.solve_step(&types, &mut positions).unwrap().positions_changed());
    }

    #[test]
    fn test_isolated_calculated_vertex_untouched() {
        let mesh = TriangleMesh::new(
            vec![
                Point3::new(0.0, 0.0, 0.0),
                Point3::new(1.0, 0.0, 0.0),
                Point3::new(0.0, 1.0, 0.0),
                Point3::new(9.0, 9.0, 9.0),
            ],
            vec![[0, 1, 2]],
        )
        .unwrap();
        let mut solver = ArapSolver::new(&mesh, DeformOptions::default()).unwrap();
        let types = vec![
            VertexType::Fixed,
            VertexType::Fixed,
            VertexType::Calculated,
            VertexType::Calculated,
        ];
        let mut positions = mesh.vertices().to_vec();
        positions[3] = Point3::new(-4.0, 2.0, 1.0);

        let (moved, _, _, _) = solved(solver.solve_step(&types, &mut positions).unwrap());
        assert_eq!(moved, 1);
        assert_eq!(positions[3], Point3::new(-4.0, 2.0, 1.0));
        assert!((positions[2] - mesh.vertices()[2]).norm() < 1e-9);
    }

    #[test]
    fn test_non_finite_input_is_noop() {
        let mesh = create_patch();
        let mut solver = ArapSolver::new(&mesh, DeformOptions::default()).unwrap();
        let mut positions = mesh.vertices().to_vec();
        positions[0] = Point3::new(f64::NAN, 0.0, 0.0);
        let calculated_before = [positions[2], positions[3]];

        let outcome = solver.solve_step(&patch_types(), &mut positions).unwrap();
        assert_eq!(outcome, StepOutcome::Skipped(SkipReason::SolveFailed));
        assert_eq!([positions[2], positions[3]], calculated_before);
        // The factorization itself is still valid
        assert!(solver.is_factorized());
    }

    #[test]
    fn test_buffer_length_mismatch() {
        let mesh = create_patch();
        let mut solver = ArapSolver::new(&mesh, DeformOptions::default()).unwrap();
        let mut positions = mesh.vertices().to_vec();

        let result = solver.solve_step(&patch_types()[..3], &mut positions);
        assert!(matches!(result, Err(DeformError::VertexCountMismatch { .. })));

        let result = solver.solve_step(&patch_types(), &mut positions[..2]);
        assert!(matches!(result, Err(DeformError::VertexCountMismatch { .. })));
    }

    #[test]
    fn test_invalid_options_rejected() {
        let mesh = create_patch();
        let result = ArapSolver::new(&mesh, DeformOptions::default().with_max_iterations(0));
        assert!(matches!(result, Err(DeformError::InvalidParameter { .. })));
    }

    #[test]
    fn test_deform_reports_progress() {
        use std::sync::atomic::{AtomicUsize, Ordering};
        use std::sync::Arc;

        let (mesh, types) = create_strip(3, 2);
        let options = DeformOptions::default().with_max_iterations(4).with_tolerance(0.0);
        let mut solver = ArapSolver::new(&mesh, options).unwrap();
        let mut positions = mesh.vertices().to_vec();
        for (v, t) in types.iter().enumerate() {
            if *t == VertexType::Draggable {
                positions[v] += Vector3::new(0.0, 1.0, 0.0);
            }
        }

        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        let progress = Progress::new(move |_, total, _| {
            assert_eq!(total, 4);
            counter.fetch_add(1, Ordering::Relaxed);
        });

        let report = solver.deform(&types, &mut positions, &progress).unwrap();
        assert_eq!(report.iterations, 4);
        assert!(!report.converged);
        assert_eq!(calls.load(Ordering::Relaxed), 5);
    }
}
