// ============================================================
// Layer 3 — Domain Layer
// ============================================================
// Plain Rust structs, enums and traits that define what the
// pipeline works with: the feature schema, a prediction
// request, the error kinds and the seams between layers.
// Tables are polars DataFrames throughout.
//
// Rules for this layer:
//   - NO model code
//   - NO file I/O or network calls
//   - NO web framework types

/// Structured error kinds shared by every layer
pub mod error;

/// One prediction request (the 10 model inputs)
pub mod house;

/// Versioned, ordered feature schema
pub mod schema;

/// Core abstractions other layers implement
pub mod traits;
