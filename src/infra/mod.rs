// ============================================================
// Layer 6 — Infrastructure Layer
// ============================================================
// Cross-cutting concerns used by more than one layer:
//
//   artifact_store.rs — Saving and loading the fitted
//                       preprocessor and model (bincode
//                       envelopes tagged with the feature
//                       schema) plus the run's TrainConfig
//                       as JSON.
//
//   metrics.rs        — Candidate scores appended to a CSV
//                       file after every training run.
//
//   logging.rs        — Global tracing subscriber writing to
//                       the console and a timestamped file.

/// Versioned artifact persistence
pub mod artifact_store;

/// Candidate score CSV logger
pub mod metrics;

/// Console + file tracing setup
pub mod logging;
