//! Dense linear solve for the normal equations

use crate::error::{ResearchError, Result};

const PIVOT_EPSILON: f64 = 1e-12;
/// Relative residual below which a column counts as a combination of earlier ones
const DEPENDENCE_EPSILON: f64 = 1e-8;

/// Solve `a · x = b` by Gaussian elimination with partial pivoting.
/// `a` is row-major and square.
pub fn solve(mut a: Vec<Vec<f64>>, mut b: Vec<f64>) -> Result<Vec<f64>> {
    let n = b.len();
    if a.len() != n || a.iter().any(|row| row.len() != n) {
        return Err(ResearchError::Model(format!(
            "system shape mismatch: {} rows for {} unknowns",
            a.len(),
            n
        )));
    }
    let scale = a
        .iter()
        .flat_map(|row| row.iter())
        .fold(0.0f64, |m, v| m.max(v.abs()))
        .max(1.0);

    for col in 0..n {
        let pivot = (col..n)
            .max_by(|&i, &j| a[i][col].abs().total_cmp(&a[j][col].abs()))
            .unwrap_or(col);
        if a[pivot][col].abs() <= PIVOT_EPSILON * scale {
            return Err(ResearchError::Model(format!(
                "singular system at column {}",
                col
            )));
        }
        a.swap(col, pivot);
        b.swap(col, pivot);

        let pivot_row = a[col].clone();
        let pivot_b = b[col];
        for row in col + 1..n {
            let factor = a[row][col] / pivot_row[col];
            if factor == 0.0 {
                continue;
            }
            for (k, p) in pivot_row.iter().enumerate().skip(col) {
                a[row][k] -= factor * p;
            }
            b[row] -= factor * pivot_b;
        }
    }

    let mut x = vec![0.0; n];
    for row in (0..n).rev() {
        let tail: f64 = (row + 1..n).map(|k| a[row][k] * x[k]).sum();
        x[row] = (b[row] - tail) / a[row][row];
    }
    Ok(x)
}

/// Columns of `rows` (indices among `0..width`) that are linearly independent
/// of the intercept and of every earlier kept column. Constant columns and
/// columns spanned by earlier ones are left out; the first of a dependent
/// group is kept.
pub fn independent_columns(rows: &[Vec<f64>], width: usize) -> Vec<usize> {
    let n = rows.len();
    if n == 0 {
        return Vec::new();
    }
    let mut basis: Vec<Vec<f64>> = Vec::new();
    let mut kept = Vec::new();

    for j in 0..width {
        let raw_norm = rows.iter().map(|r| r[j] * r[j]).sum::<f64>().sqrt();
        let mean = rows.iter().map(|r| r[j]).sum::<f64>() / n as f64;
        let mut v: Vec<f64> = rows.iter().map(|r| r[j] - mean).collect();
        let centered_norm = norm(&v);
        if centered_norm <= DEPENDENCE_EPSILON * raw_norm || centered_norm == 0.0 {
            continue;
        }

        // two passes of modified Gram-Schmidt keep the residual accurate
        for _ in 0..2 {
            for q in &basis {
                let dot: f64 = v.iter().zip(q).map(|(a, b)| a * b).sum();
                for (vi, qi) in v.iter_mut().zip(q) {
                    *vi -= dot * qi;
                }
            }
        }
        let residual = norm(&v);
        if residual <= DEPENDENCE_EPSILON * centered_norm {
            continue;
        }
        for vi in v.iter_mut() {
            *vi /= residual;
        }
        basis.push(v);
        kept.push(j);
    }
    kept
}

fn norm(v: &[f64]) -> f64 {
    v.iter().map(|x| x * x).sum::<f64>().sqrt()
}
