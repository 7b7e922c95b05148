use crate::state::{idx, GridDims};

/// Central-difference divergence on interior cells; boundary entries are zeroed.
/// div = ((vx[i+1] - vx[i-1]) + (vy[j+1] - vy[j-1])) / 2
pub fn divergence_into(out: &mut [f64], vx: &[f64], vy: &[f64], dims: GridDims) {
    let w = dims.width();
    out.fill(0.0);
    for j in dims.interior_y() {
        for i in dims.interior_x() {
            out[idx(i, j, w)] = 0.5
                * (vx[idx(i + 1, j, w)] - vx[idx(i - 1, j, w)]
                    + vy[idx(i, j + 1, w)] - vy[idx(i, j - 1, w)]);
        }
    }
}

/// Largest |divergence| over interior cells.
pub fn max_abs_divergence(vx: &[f64], vy: &[f64], dims: GridDims) -> f64 {
    let mut div = vec![0.0; dims.len()];
    divergence_into(&mut div, vx, vy, dims);
    div.iter().fold(0.0_f64, |m, v| m.max(v.abs()))
}

/// Max-norm residual of the discrete Poisson system `4p - sum(neighbors) = rhs`
/// over interior cells, where `rhs` is the negated divergence used by `project`.
pub fn poisson_residual(p: &[f64], rhs: &[f64], dims: GridDims) -> f64 {
    let w = dims.width();
    let mut max = 0.0_f64;
    for j in dims.interior_y() {
        for i in dims.interior_x() {
            let neighbors = p[idx(i - 1, j, w)] + p[idx(i + 1, j, w)] + p[idx(i, j - 1, w)] + p[idx(i, j + 1, w)];
            let r = 4.0 * p[idx(i, j, w)] - neighbors - rhs[idx(i, j, w)];
            max = max.max(r.abs());
        }
    }
    max
}

/// Largest value over interior cells (0.0 when there is no interior).
pub fn max_interior(field: &[f64], dims: GridDims) -> f64 {
    let w = dims.width();
    let mut max = f64::NEG_INFINITY;
    for j in dims.interior_y() {
        for i in dims.interior_x() {
            max = max.max(field[idx(i, j, w)]);
        }
    }
    if max.is_finite() { max } else { 0.0 }
}

/// Sum of density over every cell.
pub fn total_density(density: &[f64]) -> f64 {
    density.iter().sum()
}

/// Compute mean kinetic energy: KE = 0.5 * <vx² + vy²> over interior cells.
pub fn kinetic_energy(vx: &[f64], vy: &[f64], dims: GridDims) -> f64 {
    let w = dims.width();
    let mut sum = 0.0;
    let mut count = 0usize;
    for j in dims.interior_y() {
        for i in dims.interior_x() {
            let ii = idx(i, j, w);
            sum += vx[ii] * vx[ii] + vy[ii] * vy[ii];
            count += 1;
        }
    }
    if count > 0 { 0.5 * sum / count as f64 } else { 0.0 }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dims(w: usize, h: usize) -> GridDims {
        GridDims::new(w, h).unwrap()
    }

    #[test]
    fn test_divergence_of_uniform_flow_is_zero() {
        let d = dims(8, 8);
        let vx = vec![0.7; d.len()];
        let vy = vec![-0.3; d.len()];
        assert!(max_abs_divergence(&vx, &vy, d) < 1e-12);
    }

    #[test]
    fn test_divergence_of_source() {
        let d = dims(8, 8);
        let mut vx = vec![0.0; d.len()];
        let mut vy = vec![0.0; d.len()];
        for j in 0..8 {
            for i in 0..8 {
                vx[idx(i, j, 8)] = i as f64;
                vy[idx(i, j, 8)] = j as f64;
            }
        }
        let mut div = vec![9.0; d.len()];
        divergence_into(&mut div, &vx, &vy, d);
        assert!((div[idx(3, 4, 8)] - 2.0).abs() < 1e-12);
        assert_eq!(div[idx(0, 4, 8)], 0.0, "boundary entries should be zeroed");
    }

    #[test]
    fn test_poisson_residual_zero_for_zero_system() {
        let d = dims(6, 6);
        let p = vec![0.0; d.len()];
        let rhs = vec![0.0; d.len()];
        assert_eq!(poisson_residual(&p, &rhs, d), 0.0);
    }

    #[test]
    fn test_max_interior_ignores_boundary() {
        let d = dims(5, 5);
        let mut f = vec![0.0; d.len()];
        f[idx(0, 0, 5)] = 9.0;
        f[idx(2, 2, 5)] = 0.5;
        assert_eq!(max_interior(&f, d), 0.5);
        assert_eq!(max_interior(&[1.0; 4], dims(2, 2)), 0.0);
    }

    #[test]
    fn test_total_density() {
        assert!((total_density(&[0.25, 0.5, 0.25]) - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_kinetic_energy_zero() {
        let d = dims(10, 10);
        let vx = vec![0.0; d.len()];
        let vy = vec![0.0; d.len()];
        let ke = kinetic_energy(&vx, &vy, d);
        assert!(ke.abs() < 1e-15, "KE should be 0 with no flow, got {}", ke);
    }

    #[test]
    fn test_kinetic_energy_uniform_flow() {
        let d = dims(10, 10);
        let vx = vec![1.0; d.len()];
        let vy = vec![0.0; d.len()];
        let ke = kinetic_energy(&vx, &vy, d);
        assert!((ke - 0.5).abs() < 1e-10, "KE should be 0.5, got {}", ke);
    }
}
