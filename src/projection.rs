//! Projection training — map base embeddings onto the anchor manifold.
//!
//! Two training methods over paired matrices X (per-anchor mean base
//! embeddings of training excerpts) and Y (canonical anchor centroids):
//!   - Procrustes: the nearest orthogonal map, W = U·Vᵗ from the SVD of
//!     M = Xᵗ·Y. Orthogonality preserves vector norms, so projected
//!     embeddings stay on the unit sphere.
//!   - Ridge: regularized least squares, W = (XᵗX + λI)⁻¹ XᵗY.
//!
//! Everything is hand-rolled on flat row-major matrices: a one-sided
//! Jacobi SVD for the orthogonal factor and Gauss-Jordan elimination
//! with partial pivoting for the ridge solve. The anchor count is tiny
//! relative to the embedding dimension, so M is rank-deficient; the
//! Jacobi null space is completed by Gram-Schmidt against the standard
//! basis.

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::anchors::{self, ANCHORS};
use crate::embedding::{dot, normalize, EmbeddingSpace};
use crate::errors::{Result, ZyntalicError};

pub const WEIGHTS_FILE: &str = "W.json";
pub const META_FILE: &str = "meta.json";

// ---------------------------------------------------------------------------
// Method and config
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrainMethod {
    Procrustes,
    Ridge,
}

impl TrainMethod {
    pub fn parse(s: &str) -> Result<Self> {
        match s {
            "procrustes" => Ok(Self::Procrustes),
            "ridge" => Ok(Self::Ridge),
            other => Err(ZyntalicError::Config(format!(
                "unknown training method '{other}' (expected 'procrustes' or 'ridge')"
            ))),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Procrustes => "procrustes",
            Self::Ridge => "ridge",
        }
    }
}

#[derive(Debug, Clone)]
pub struct TrainConfig {
    pub method: TrainMethod,
    pub ridge_lambda: f32,
    /// Fraction of each anchor's excerpts held out for evaluation.
    pub test_ratio: f64,
    /// Seed of the split shuffle, independent of any generation key.
    pub split_seed: u64,
}

impl Default for TrainConfig {
    fn default() -> Self {
        Self {
            method: TrainMethod::Procrustes,
            ridge_lambda: 1e-3,
            test_ratio: 0.25,
            split_seed: 41,
        }
    }
}

// ---------------------------------------------------------------------------
// Artifacts
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectionMeta {
    pub dimension: usize,
    pub method: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ridge_lambda: Option<f32>,
    pub anchors_in_training: Vec<String>,
    pub test_examples: usize,
    pub top1_accuracy: f64,
}

/// A trained dim×dim map, stored row-major. Applying it is a row-vector
/// multiply followed by L2 normalization.
#[derive(Debug, Clone)]
pub struct Projection {
    pub dim: usize,
    pub weights: Vec<f32>,
}

impl Projection {
    pub fn apply(&self, v: &[f32]) -> Vec<f32> {
        let mut out = vec![0.0f32; self.dim];
        for (i, &x) in v.iter().enumerate().take(self.dim) {
            if x == 0.0 {
                continue;
            }
            let row = &self.weights[i * self.dim..(i + 1) * self.dim];
            for (o, &w) in out.iter_mut().zip(row.iter()) {
                *o += x * w;
            }
        }
        normalize(&out)
    }

    pub fn save(&self, dir: &Path) -> Result<()> {
        fs::create_dir_all(dir).map_err(|e| ZyntalicError::Io(e.to_string()))?;
        let rows: Vec<&[f32]> = self.weights.chunks(self.dim).collect();
        let json =
            serde_json::to_string(&rows).map_err(|e| ZyntalicError::Io(e.to_string()))?;
        fs::write(dir.join(WEIGHTS_FILE), json)
            .map_err(|e| ZyntalicError::Io(e.to_string()))?;
        Ok(())
    }

    /// Load a projection if a valid artifact exists for this dimension.
    /// A missing or mismatched artifact is not an error; the engine
    /// degrades to the blend fallback.
    pub fn load(dir: &Path, dim: usize) -> Option<Self> {
        let path = dir.join(WEIGHTS_FILE);
        let content = fs::read_to_string(&path).ok()?;
        let rows: Vec<Vec<f32>> = match serde_json::from_str(&content) {
            Ok(rows) => rows,
            Err(err) => {
                warn!(file = %path.display(), %err, "ignoring unreadable projection");
                return None;
            }
        };
        if rows.len() != dim || rows.iter().any(|r| r.len() != dim) {
            warn!(
                file = %path.display(),
                expected = dim,
                got = rows.len(),
                "ignoring projection with mismatched dimension"
            );
            return None;
        }
        Some(Self {
            dim,
            weights: rows.into_iter().flatten().collect(),
        })
    }
}

pub fn save_artifacts(projection: &Projection, meta: &ProjectionMeta, dir: &Path) -> Result<()> {
    projection.save(dir)?;
    let json =
        serde_json::to_string_pretty(meta).map_err(|e| ZyntalicError::Io(e.to_string()))?;
    fs::write(dir.join(META_FILE), json).map_err(|e| ZyntalicError::Io(e.to_string()))?;
    Ok(())
}

pub fn load_meta(dir: &Path) -> Option<ProjectionMeta> {
    let content = fs::read_to_string(dir.join(META_FILE)).ok()?;
    serde_json::from_str(&content).ok()
}

// ---------------------------------------------------------------------------
// Training
// ---------------------------------------------------------------------------

/// Train a projection from corpus rows (anchor-id, excerpt).
///
/// Rows naming unknown anchors are skipped with a warning. Each anchor's
/// excerpts are shuffled once with the split seed and the tail fraction
/// held out for top-1 evaluation; an anchor with a single excerpt
/// contributes only to evaluation.
pub fn train(
    space: &EmbeddingSpace,
    rows: &[(String, String)],
    config: &TrainConfig,
) -> Result<(Projection, ProjectionMeta)> {
    if rows.is_empty() {
        return Err(ZyntalicError::Training("empty training corpus".into()));
    }

    let mut grouped: HashMap<&str, Vec<&str>> = HashMap::new();
    for (anchor, excerpt) in rows {
        if !anchors::is_known(anchor) {
            warn!(anchor = %anchor, "skipping row with unknown anchor");
            continue;
        }
        grouped.entry(anchor.as_str()).or_default().push(excerpt);
    }

    let mut split_rng = ChaCha8Rng::seed_from_u64(config.split_seed);
    let dim = space.dim;
    let centroids = space.anchor_centroids();

    // X rows paired with Y rows, one per anchor with training data,
    // in anchor declaration order so the split is reproducible.
    let mut x_rows: Vec<Vec<f32>> = Vec::new();
    let mut y_rows: Vec<&[f32]> = Vec::new();
    let mut trained_anchors: Vec<String> = Vec::new();
    let mut test_set: Vec<(usize, &str)> = Vec::new();
    for (idx, &name) in ANCHORS.iter().enumerate() {
        let Some(excerpts) = grouped.get_mut(name) else {
            continue;
        };
        excerpts.shuffle(&mut split_rng);
        let n_test = ((excerpts.len() as f64 * config.test_ratio) as usize).max(1);
        let n_train = excerpts.len().saturating_sub(n_test);
        for &excerpt in &excerpts[n_train..] {
            test_set.push((idx, excerpt));
        }
        if n_train == 0 {
            continue;
        }

        let mut mean = vec![0.0f32; dim];
        for &excerpt in &excerpts[..n_train] {
            let e = normalize(&space.base_embedding(excerpt));
            for (m, x) in mean.iter_mut().zip(e.iter()) {
                *m += x;
            }
        }
        let inv = 1.0 / n_train as f32;
        for m in mean.iter_mut() {
            *m *= inv;
        }
        x_rows.push(normalize(&mean));
        y_rows.push(&centroids[idx].1);
        trained_anchors.push(name.to_string());
    }

    if x_rows.is_empty() {
        return Err(ZyntalicError::Training(
            "no anchor has enough excerpts to train on".into(),
        ));
    }

    let weights = match config.method {
        TrainMethod::Procrustes => train_procrustes(dim, &x_rows, &y_rows),
        TrainMethod::Ridge => train_ridge(dim, &x_rows, &y_rows, config.ridge_lambda)?,
    };
    let projection = Projection { dim, weights };

    let top1_accuracy = evaluate_top1(space, &projection, &test_set);
    info!(
        method = config.method.as_str(),
        anchors = x_rows.len(),
        test_examples = test_set.len(),
        top1_accuracy,
        "projection trained"
    );

    let meta = ProjectionMeta {
        dimension: dim,
        method: config.method.as_str().to_string(),
        ridge_lambda: matches!(config.method, TrainMethod::Ridge)
            .then_some(config.ridge_lambda),
        anchors_in_training: trained_anchors,
        test_examples: test_set.len(),
        top1_accuracy,
    };
    Ok((projection, meta))
}

/// W = U·Vᵗ, the orthogonal factor of M = Xᵗ·Y.
fn train_procrustes(dim: usize, x_rows: &[Vec<f32>], y_rows: &[&[f32]]) -> Vec<f32> {
    // M[i][j] = Σ_a X[a][i] · Y[a][j], accumulated in f64.
    let mut m = vec![0.0f64; dim * dim];
    for (x, y) in x_rows.iter().zip(y_rows.iter()) {
        for (i, &xi) in x.iter().enumerate() {
            if xi == 0.0 {
                continue;
            }
            let row = &mut m[i * dim..(i + 1) * dim];
            for (mj, &yj) in row.iter_mut().zip(y.iter()) {
                *mj += xi as f64 * yj as f64;
            }
        }
    }
    let w = orthogonal_factor(dim, &m);
    w.into_iter().map(|v| v as f32).collect()
}

/// One-sided Jacobi SVD of a square matrix (row-major input), returning
/// U·Vᵗ directly. Columns of A are rotated pairwise until mutually
/// orthogonal; the rotations accumulate V, the surviving column
/// directions form U, and zero columns of U are completed by
/// Gram-Schmidt against the standard basis.
fn orthogonal_factor(dim: usize, m_row_major: &[f64]) -> Vec<f64> {
    // Column-major working copies: a[col * dim + row].
    let mut a = vec![0.0f64; dim * dim];
    let mut v = vec![0.0f64; dim * dim];
    for i in 0..dim {
        for j in 0..dim {
            a[j * dim + i] = m_row_major[i * dim + j];
        }
        v[i * dim + i] = 1.0;
    }

    let eps = 1e-12;
    for _sweep in 0..30 {
        let mut rotated = false;
        for p in 0..dim {
            for q in (p + 1)..dim {
                let (mut alpha, mut beta, mut gamma) = (0.0f64, 0.0f64, 0.0f64);
                for r in 0..dim {
                    let ap = a[p * dim + r];
                    let aq = a[q * dim + r];
                    alpha += ap * ap;
                    beta += aq * aq;
                    gamma += ap * aq;
                }
                if gamma.abs() <= eps * (alpha * beta).sqrt() {
                    continue;
                }
                rotated = true;
                let zeta = (beta - alpha) / (2.0 * gamma);
                let t = zeta.signum() / (zeta.abs() + (1.0 + zeta * zeta).sqrt());
                let c = 1.0 / (1.0 + t * t).sqrt();
                let s = c * t;
                for r in 0..dim {
                    let ap = a[p * dim + r];
                    let aq = a[q * dim + r];
                    a[p * dim + r] = c * ap - s * aq;
                    a[q * dim + r] = s * ap + c * aq;
                    let vp = v[p * dim + r];
                    let vq = v[q * dim + r];
                    v[p * dim + r] = c * vp - s * vq;
                    v[q * dim + r] = s * vp + c * vq;
                }
            }
        }
        if !rotated {
            break;
        }
    }

    // Column norms of A are the singular values.
    let sigmas: Vec<f64> = (0..dim)
        .map(|j| {
            (0..dim)
                .map(|r| a[j * dim + r] * a[j * dim + r])
                .sum::<f64>()
                .sqrt()
        })
        .collect();
    let sigma_max = sigmas.iter().cloned().fold(0.0f64, f64::max);
    let tol = sigma_max.max(1.0) * 1e-10;

    // U columns: normalized surviving directions first, then a
    // Gram-Schmidt completion of the null space from the standard basis.
    let mut u = vec![0.0f64; dim * dim];
    let mut filled: Vec<usize> = Vec::new();
    for j in 0..dim {
        if sigmas[j] > tol {
            for r in 0..dim {
                u[j * dim + r] = a[j * dim + r] / sigmas[j];
            }
            filled.push(j);
        }
    }
    let mut basis = 0usize;
    for j in 0..dim {
        if sigmas[j] > tol {
            continue;
        }
        while basis < dim {
            let mut cand = vec![0.0f64; dim];
            cand[basis] = 1.0;
            basis += 1;
            for &k in &filled {
                let proj: f64 = (0..dim).map(|r| cand[r] * u[k * dim + r]).sum();
                for r in 0..dim {
                    cand[r] -= proj * u[k * dim + r];
                }
            }
            let norm: f64 = cand.iter().map(|x| x * x).sum::<f64>().sqrt();
            if norm > 1e-8 {
                for r in 0..dim {
                    u[j * dim + r] = cand[r] / norm;
                }
                filled.push(j);
                break;
            }
        }
    }

    // W = U·Vᵗ, row-major.
    let mut w = vec![0.0f64; dim * dim];
    for k in 0..dim {
        for i in 0..dim {
            let uik = u[k * dim + i];
            if uik == 0.0 {
                continue;
            }
            let row = &mut w[i * dim..(i + 1) * dim];
            for (j, wij) in row.iter_mut().enumerate() {
                *wij += uik * v[k * dim + j];
            }
        }
    }
    w
}

/// W = (XᵗX + λI)⁻¹ XᵗY by Gauss-Jordan elimination on the augmented
/// system [A | B].
fn train_ridge(
    dim: usize,
    x_rows: &[Vec<f32>],
    y_rows: &[&[f32]],
    lambda: f32,
) -> Result<Vec<f32>> {
    let mut a = vec![0.0f64; dim * dim];
    let mut b = vec![0.0f64; dim * dim];
    for (x, y) in x_rows.iter().zip(y_rows.iter()) {
        for (i, &xi) in x.iter().enumerate() {
            if xi == 0.0 {
                continue;
            }
            let xi = xi as f64;
            let a_row = &mut a[i * dim..(i + 1) * dim];
            for (aij, &xj) in a_row.iter_mut().zip(x.iter()) {
                *aij += xi * xj as f64;
            }
            let b_row = &mut b[i * dim..(i + 1) * dim];
            for (bij, &yj) in b_row.iter_mut().zip(y.iter()) {
                *bij += xi * yj as f64;
            }
        }
    }
    for i in 0..dim {
        a[i * dim + i] += lambda as f64;
    }

    // Forward elimination with partial pivoting, then back-substitution
    // folded into the same loop (reduced row echelon form).
    for col in 0..dim {
        let mut pivot = col;
        for row in (col + 1)..dim {
            if a[row * dim + col].abs() > a[pivot * dim + col].abs() {
                pivot = row;
            }
        }
        if a[pivot * dim + col].abs() < 1e-12 {
            return Err(ZyntalicError::Training(
                "ridge system is singular; increase lambda".into(),
            ));
        }
        if pivot != col {
            for j in 0..dim {
                a.swap(col * dim + j, pivot * dim + j);
                b.swap(col * dim + j, pivot * dim + j);
            }
        }
        let inv = 1.0 / a[col * dim + col];
        for j in 0..dim {
            a[col * dim + j] *= inv;
            b[col * dim + j] *= inv;
        }
        for row in 0..dim {
            if row == col {
                continue;
            }
            let factor = a[row * dim + col];
            if factor == 0.0 {
                continue;
            }
            for j in 0..dim {
                a[row * dim + j] -= factor * a[col * dim + j];
                b[row * dim + j] -= factor * b[col * dim + j];
            }
        }
    }
    Ok(b.into_iter().map(|v| v as f32).collect())
}

/// Fraction of held-out excerpts whose projected embedding ranks its
/// true anchor first. Ties keep the earlier anchor, matching resolver
/// order. An empty test set scores 1.0.
fn evaluate_top1(
    space: &EmbeddingSpace,
    projection: &Projection,
    test_set: &[(usize, &str)],
) -> f64 {
    if test_set.is_empty() {
        return 1.0;
    }
    let centroids = space.anchor_centroids();
    let mut correct = 0usize;
    for &(true_idx, excerpt) in test_set {
        let projected = projection.apply(&normalize(&space.base_embedding(excerpt)));
        let mut best = 0usize;
        let mut best_score = f32::NEG_INFINITY;
        for (i, (_, c)) in centroids.iter().enumerate() {
            let score = dot(&projected, c);
            if score > best_score {
                best_score = score;
                best = i;
            }
        }
        if best == true_idx {
            correct += 1;
        }
    }
    correct as f64 / test_set.len() as f64
}
