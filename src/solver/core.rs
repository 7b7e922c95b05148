use crate::state::{idx, GridDims};

/// Gauss-Seidel iterative linear solver over interior cells.
/// Solves: x[i,j] = (x0[i,j] + a * (neighbors)) / c
///
/// Updates are written in place, so cells later in a sweep read neighbours
/// already refreshed earlier in the same sweep. Boundary cells are read but never written.
pub fn lin_solve(x: &mut [f64], x0: &[f64], a: f64, c: f64, iter: usize, dims: GridDims) {
    let w = dims.width();
    let c_inv = 1.0 / c;
    for _ in 0..iter {
        for j in dims.interior_y() {
            for i in dims.interior_x() {
                let neighbors = x[idx(i - 1, j, w)]
                    + x[idx(i + 1, j, w)]
                    + x[idx(i, j - 1, w)]
                    + x[idx(i, j + 1, w)];
                let v = (x0[idx(i, j, w)] + a * neighbors) * c_inv;
                debug_assert!(v.is_finite(), "lin_solve produced {} at ({}, {})", v, i, j);
                x[idx(i, j, w)] = v;
            }
        }
    }
}

/// Diffusion step: relaxes `x` toward the implicit solution of
/// `x = (x0 + a * sum(neighbors)) / (1 + 4a)`.
/// `x0` receives the pre-diffusion snapshot and stays fixed for every sweep.
pub fn diffuse(x: &mut [f64], x0: &mut [f64], a: f64, iter: usize, dims: GridDims) {
    x0.copy_from_slice(x);
    lin_solve(x, x0, a, 1.0 + 4.0 * a, iter, dims);
}

/// Semi-Lagrangian advection: traces each interior cell backwards through the
/// velocity field (grid cells per tick) and samples `d` bilinearly.
///
/// Reads come only from the snapshot copied into `d0`. A cell whose traced
/// stencil touches the boundary ring or leaves the grid keeps its prior value.
pub fn advect(d: &mut [f64], d0: &mut [f64], vx: &[f64], vy: &[f64], dims: GridDims) {
    let w = dims.width();
    d0.copy_from_slice(d);
    // Highest index a stencil corner may take and still be interior.
    let max_x = w.saturating_sub(2) as f64;
    let max_y = dims.height().saturating_sub(2) as f64;

    for j in dims.interior_y() {
        for i in dims.interior_x() {
            let ii = idx(i, j, w);
            // Trace backwards
            let x = i as f64 - vx[ii];
            let y = j as f64 - vy[ii];
            if !(x.is_finite() && y.is_finite()) {
                continue;
            }

            let x0f = x.floor();
            let y0f = y.floor();
            if x0f < 1.0 || y0f < 1.0 || x0f + 1.0 > max_x || y0f + 1.0 > max_y {
                continue;
            }

            let i0 = x0f as usize;
            let j0 = y0f as usize;
            let i1 = i0 + 1;
            let j1 = j0 + 1;
            let s1 = x - x0f;
            let s0 = 1.0 - s1;
            let t1 = y - y0f;
            let t0 = 1.0 - t1;

            // Along x for both rows, then along y.
            let lower = s0 * d0[idx(i0, j0, w)] + s1 * d0[idx(i1, j0, w)];
            let upper = s0 * d0[idx(i0, j1, w)] + s1 * d0[idx(i1, j1, w)];
            let v = t0 * lower + t1 * upper;
            debug_assert!(v.is_finite(), "advect produced {} at ({}, {})", v, i, j);
            d[ii] = v;
        }
    }
}

/// Pressure projection: removes the curl-free part of the velocity field.
///
/// `div` receives the negated divergence and `p` the scalar potential, both
/// zero on the boundary ring. Boundary velocities are left untouched.
pub fn project(vx: &mut [f64], vy: &mut [f64], p: &mut [f64], div: &mut [f64], iter: usize, dims: GridDims) {
    let w = dims.width();
    p.fill(0.0);
    div.fill(0.0);

    // Stored negated so lin_solve's `x0 + neighbors` form yields (neighbors - div) / 4.
    for j in dims.interior_y() {
        for i in dims.interior_x() {
            div[idx(i, j, w)] = -0.5
                * (vx[idx(i + 1, j, w)] - vx[idx(i - 1, j, w)]
                    + vy[idx(i, j + 1, w)] - vy[idx(i, j - 1, w)]);
        }
    }

    // Solve for potential
    lin_solve(p, div, 1.0, 4.0, iter, dims);

    // Subtract potential gradient from velocity
    for j in dims.interior_y() {
        for i in dims.interior_x() {
            let ii = idx(i, j, w);
            vx[ii] -= 0.5 * (p[idx(i + 1, j, w)] - p[idx(i - 1, j, w)]);
            vy[ii] -= 0.5 * (p[idx(i, j + 1, w)] - p[idx(i, j - 1, w)]);
            debug_assert!(
                vx[ii].is_finite() && vy[ii].is_finite(),
                "project produced ({}, {}) at ({}, {})",
                vx[ii],
                vy[ii],
                i,
                j
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::solver::diagnostics::{divergence_into, max_interior, poisson_residual};
    use crate::state::Xor128;

    fn dims(w: usize, h: usize) -> GridDims {
        GridDims::new(w, h).unwrap()
    }

    fn sum_abs_interior(field: &[f64], dims: GridDims) -> f64 {
        let w = dims.width();
        let mut sum = 0.0;
        for j in dims.interior_y() {
            for i in dims.interior_x() {
                sum += field[idx(i, j, w)].abs();
            }
        }
        sum
    }

    fn boundary_bits(field: &[f64], dims: GridDims) -> Vec<u64> {
        let w = dims.width();
        let mut out = Vec::new();
        for j in 0..dims.height() {
            for i in 0..w {
                if dims.is_boundary(i, j) {
                    out.push(field[idx(i, j, w)].to_bits());
                }
            }
        }
        out
    }

    #[test]
    fn test_lin_solve_converges() {
        let d = dims(21, 21);
        let mut x = vec![0.0; d.len()];
        let mut x0 = vec![0.0; d.len()];
        x0[idx(10, 10, 21)] = 100.0;
        x.copy_from_slice(&x0);

        lin_solve(&mut x, &x0, 1.0, 5.0, 20, d);

        let center = x[idx(10, 10, 21)];
        let neighbor = x[idx(11, 10, 21)];
        assert!(center > 0.0, "Center should still be positive");
        assert!(neighbor > 0.0, "Neighbors should get some value");
        assert!(center > neighbor, "Center should be larger than neighbor");
    }

    #[test]
    fn test_diffuse_spike_scenario() {
        // 10x10, k=0.001, dt=0.1, 20 sweeps
        let d = dims(10, 10);
        let mut x = vec![0.0; d.len()];
        let mut x0 = vec![0.0; d.len()];
        x[idx(5, 5, 10)] = 1.0;

        diffuse(&mut x, &mut x0, 0.1 * 0.001, 20, d);

        assert!(x[idx(5, 5, 10)] < 1.0, "spike should shrink: {}", x[idx(5, 5, 10)]);
        for (i, j) in [(4, 5), (6, 5), (5, 4), (5, 6)] {
            assert!(x[idx(i, j, 10)] > 0.0, "neighbor ({}, {}) should gain density", i, j);
        }
        for j in 0..10 {
            for i in 0..10 {
                if d.is_boundary(i, j) {
                    assert_eq!(x[idx(i, j, 10)], 0.0, "boundary ({}, {}) changed", i, j);
                }
            }
        }
        assert_eq!(x0[idx(5, 5, 10)], 1.0, "snapshot must hold the pre-diffusion field");
    }

    #[test]
    fn test_diffuse_zero_rate_is_noop() {
        let d = dims(12, 9);
        let mut rng = Xor128::new(3);
        let mut x: Vec<f64> = (0..d.len()).map(|_| rng.next_f64().abs()).collect();
        let before = x.clone();
        let mut x0 = vec![0.0; d.len()];

        diffuse(&mut x, &mut x0, 0.0, 50, d);

        for (k, (a, b)) in x.iter().zip(&before).enumerate() {
            assert!((a - b).abs() < 1e-12, "cell {} changed: {} -> {}", k, b, a);
        }
    }

    #[test]
    fn test_diffuse_max_non_increasing() {
        let d = dims(12, 12);
        let mut x = vec![0.0; d.len()];
        let mut x0 = vec![0.0; d.len()];
        x[idx(6, 6, 12)] = 1.0;

        let mut prev = max_interior(&x, d);
        for call in 0..10 {
            diffuse(&mut x, &mut x0, 0.5, 20, d);
            let cur = max_interior(&x, d);
            assert!(cur <= prev + 1e-15, "call {}: max rose from {} to {}", call, prev, cur);
            prev = cur;
        }
        assert!(prev < 1.0);
    }

    #[test]
    fn test_advect_zero_velocity_preserves() {
        let d = dims(16, 12);
        let mut rng = Xor128::new(11);
        let mut dens: Vec<f64> = (0..d.len()).map(|_| rng.next_f64()).collect();
        let before = dens.clone();
        let mut d0 = vec![0.0; d.len()];
        let vx = vec![0.0; d.len()];
        let vy = vec![0.0; d.len()];

        advect(&mut dens, &mut d0, &vx, &vy, d);

        assert_eq!(dens, before);
    }

    #[test]
    fn test_advect_uniform_field_unchanged() {
        let d = dims(16, 16);
        let mut dens = vec![5.0; d.len()];
        let mut d0 = vec![0.0; d.len()];
        let vx = vec![0.3; d.len()];
        let vy = vec![-0.2; d.len()];

        advect(&mut dens, &mut d0, &vx, &vy, d);

        for (k, &v) in dens.iter().enumerate() {
            assert!((v - 5.0).abs() < 1e-12, "Uniform field should stay uniform: got {} at {}", v, k);
        }
    }

    #[test]
    fn test_advect_shift_reads_snapshot_only() {
        // vx = +1 moves everything one cell right; an in-place pass would smear the first value.
        let (w, h) = (10, 8);
        let d = dims(w, h);
        let mut dens = vec![0.0; d.len()];
        for j in 0..h {
            for i in 0..w {
                dens[idx(i, j, w)] = i as f64 + 10.0 * j as f64;
            }
        }
        let before = dens.clone();
        let mut d0 = vec![0.0; d.len()];
        let vx = vec![1.0; d.len()];
        let vy = vec![0.0; d.len()];

        advect(&mut dens, &mut d0, &vx, &vy, d);

        for j in 1..(h - 2) {
            for i in 2..(w - 1) {
                assert_eq!(dens[idx(i, j, w)], before[idx(i - 1, j, w)], "cell ({}, {})", i, j);
            }
            // Column 1 traces into the boundary ring and keeps its value.
            assert_eq!(dens[idx(1, j, w)], before[idx(1, j, w)]);
        }
    }

    #[test]
    fn test_advect_bilinear_half_cell() {
        let (w, h) = (10, 10);
        let d = dims(w, h);
        let mut dens = vec![0.0; d.len()];
        dens[idx(4, 4, w)] = 1.0;
        let mut d0 = vec![0.0; d.len()];
        let vx = vec![0.5; d.len()];
        let vy = vec![0.5; d.len()];

        advect(&mut dens, &mut d0, &vx, &vy, d);

        // Trace from (5,5) lands on (4.5,4.5): a quarter of the spike.
        assert!((dens[idx(5, 5, w)] - 0.25).abs() < 1e-12);
        assert!((dens[idx(4, 4, w)] - 0.25).abs() < 1e-12);
        assert!(dens[idx(6, 6, w)].abs() < 1e-12);
    }

    #[test]
    fn test_advect_skips_non_finite_trace() {
        let d = dims(8, 8);
        let mut dens = vec![0.5; d.len()];
        let mut d0 = vec![0.0; d.len()];
        let mut vx = vec![0.0; d.len()];
        let vy = vec![0.0; d.len()];
        vx[idx(3, 3, 8)] = f64::INFINITY;

        advect(&mut dens, &mut d0, &vx, &vy, d);

        assert_eq!(dens[idx(3, 3, 8)], 0.5);
    }

    #[test]
    #[cfg(debug_assertions)]
    #[should_panic(expected = "produced")]
    fn test_project_flags_non_finite_velocity() {
        let d = dims(8, 8);
        let mut vx = vec![0.0; d.len()];
        let mut vy = vec![0.0; d.len()];
        let mut p = vec![0.0; d.len()];
        let mut div = vec![0.0; d.len()];
        vx[idx(4, 4, 8)] = f64::INFINITY;

        project(&mut vx, &mut vy, &mut p, &mut div, 20, d);
    }

    // The collocated scheme leaves a divergence floor next to the boundary ring, so
    // per-cell divergence cannot reach 0.05 here; only the totals and deep interior shrink.
    #[test]
    fn test_project_outward_pattern_reduces_divergence() {
        let (w, h) = (10, 10);
        let d = dims(w, h);
        let mut vx = vec![0.0; d.len()];
        let mut vy = vec![0.0; d.len()];
        for j in 0..h {
            for i in 0..w {
                vx[idx(i, j, w)] = i as f64 - 5.0;
                vy[idx(i, j, w)] = j as f64 - 5.0;
            }
        }
        let mut div = vec![0.0; d.len()];
        divergence_into(&mut div, &vx, &vy, d);
        let before = sum_abs_interior(&div, d);
        assert!((div[idx(4, 4, w)] - 2.0).abs() < 1e-12);

        let mut p = vec![0.0; d.len()];
        let mut scratch = vec![0.0; d.len()];
        project(&mut vx, &mut vy, &mut p, &mut scratch, 20, d);

        divergence_into(&mut div, &vx, &vy, d);
        let after = sum_abs_interior(&div, d);
        assert!(after < 0.7 * before, "Divergence should be reduced: before={}, after={}", before, after);
        // Away from the fixed boundary ring the field is close to divergence-free.
        for j in 2..(h - 2) {
            for i in 2..(w - 2) {
                let v = div[idx(i, j, w)].abs();
                assert!(v < 0.5, "|div| at ({}, {}) = {}", i, j, v);
            }
        }
    }

    #[test]
    fn test_project_residual_shrinks_with_iterations() {
        let (w, h) = (16, 16);
        let d = dims(w, h);
        let mut vx0 = vec![0.0; d.len()];
        let mut vy0 = vec![0.0; d.len()];
        let mut rng = Xor128::new(42);
        for j in d.interior_y() {
            for i in d.interior_x() {
                vx0[idx(i, j, w)] = rng.next_f64();
                vy0[idx(i, j, w)] = rng.next_f64();
            }
        }
        let mut div = vec![0.0; d.len()];
        divergence_into(&mut div, &vx0, &vy0, d);
        let before = sum_abs_interior(&div, d);

        let mut prev = f64::INFINITY;
        for iter in [1, 2, 5, 10, 20, 40, 80] {
            let (mut vx, mut vy) = (vx0.clone(), vy0.clone());
            let mut p = vec![0.0; d.len()];
            let mut neg_div = vec![0.0; d.len()];
            project(&mut vx, &mut vy, &mut p, &mut neg_div, iter, d);

            let residual = poisson_residual(&p, &neg_div, d);
            assert!(residual < prev, "iter={}: residual {} did not drop below {}", iter, residual, prev);
            prev = residual;

            if iter >= 20 {
                divergence_into(&mut div, &vx, &vy, d);
                let after = sum_abs_interior(&div, d);
                assert!(after < 0.8 * before, "iter={}: before={}, after={}", iter, before, after);
            }
        }
        assert!(prev < 1e-3, "residual should approach zero, got {}", prev);
    }

    #[test]
    fn test_solvers_never_write_boundary() {
        let (w, h) = (12, 10);
        let d = dims(w, h);
        let mut rng = Xor128::new(99);
        let mut dens: Vec<f64> = (0..d.len()).map(|_| rng.next_f64().abs()).collect();
        let mut vx: Vec<f64> = (0..d.len()).map(|_| rng.next_f64() * 2.0).collect();
        let mut vy: Vec<f64> = (0..d.len()).map(|_| rng.next_f64() * 2.0).collect();
        let (db, xb, yb) = (boundary_bits(&dens, d), boundary_bits(&vx, d), boundary_bits(&vy, d));
        let mut a = vec![0.0; d.len()];
        let mut b = vec![0.0; d.len()];

        for _ in 0..5 {
            diffuse(&mut dens, &mut a, 0.3, 20, d);
            advect(&mut dens, &mut a, &vx, &vy, d);
            project(&mut vx, &mut vy, &mut a, &mut b, 20, d);
        }

        assert_eq!(boundary_bits(&dens, d), db);
        assert_eq!(boundary_bits(&vx, d), xb);
        assert_eq!(boundary_bits(&vy, d), yb);
    }

    #[test]
    fn test_tiny_grid_has_no_interior() {
        let d = dims(2, 2);
        let mut dens = vec![1.0; 4];
        let mut vx = vec![1.0; 4];
        let mut vy = vec![1.0; 4];
        let mut a = vec![0.0; 4];
        let mut b = vec![0.0; 4];
        diffuse(&mut dens, &mut a, 1.0, 20, d);
        advect(&mut dens, &mut a, &vx, &vy, d);
        project(&mut vx, &mut vy, &mut a, &mut b, 20, d);
        assert_eq!(dens, vec![1.0; 4]);
        assert_eq!(vx, vec![1.0; 4]);
    }
}
