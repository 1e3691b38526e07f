// ============================================================
// Layer 2 — Application / Use Cases
// ============================================================
// This layer orchestrates the other layers to accomplish one
// goal each: ingest the raw data, train a model, or predict a
// price.
//
// Rules for this layer:
//   - No ML math or model code here
//   - No printing or HTML here (that's Layer 1 and the web layer)
//   - Only workflow coordination, with anyhow context naming
//     the step that failed

// Raw CSV → engineered, stratified train/test CSVs
pub mod ingest_use_case;

// The full training workflow
pub mod train_use_case;

// Loaded artifacts → single-house predictions
pub mod predict_use_case;
