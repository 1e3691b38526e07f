// ============================================================
// Layer 5 — ML / Model Layer
// ============================================================
// The candidate regressors, the R² metric and the trainer that
// picks between them. Everything here works on ndarray
// matrices that have already been through the FeatureBuilder;
// nothing in this layer knows about CSV columns or HTTP.
//
//   model.rs    — Regressor trait, ModelKind catalogue and the
//                 serialisable Model enum
//   linear.rs   — ordinary least squares
//   tree.rs     — CART regression tree
//   forest.rs   — bagged trees, fit in parallel with rayon
//   knn.rs      — k-nearest neighbours
//   score.rs    — coefficient of determination
//   trainer.rs  — fit, score, select, persist

/// Regressor trait and model catalogue
pub mod model;

/// Ordinary least squares
pub mod linear;

/// CART regression tree
pub mod tree;

/// Random forest of bootstrap trees
pub mod forest;

/// K-nearest neighbours regressor
pub mod knn;

/// R² metric
pub mod score;

/// Candidate fitting and model selection
pub mod trainer;
