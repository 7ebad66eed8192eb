// ============================================================
// Layer 2 - Application / Use Cases
// ============================================================
// Orchestrates the domain and ML layers for the CLI.
//
// Rules for this layer:
//   - No tensor math or module definitions here
//   - No printing here (that's Layer 1)
//   - Only workflow coordination

// Build a model, run one batch, report shapes
pub mod summary_use_case;
