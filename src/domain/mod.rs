// ============================================================
// Domain Layer
// ============================================================
// Plain Rust types describing what a tagging model is built
// from, before any tensor exists:
//
//   cell.rs        - which recurrent cell the encoders use
//   vocabulary.rs  - how token indices split into pretrained
//                    and randomly initialised ranges
//   embeddings.rs  - the pretrained vectors handed in by the
//                    caller
//
// Rules for this layer:
//   - NO Burn framework types allowed here
//   - NO file I/O
//   - Only plain Rust structs, enums, and validation

/// Recurrent cell type identifier
pub mod cell;

/// Pretrained word vectors supplied by the caller
pub mod embeddings;

/// Index layout of the vocabulary
pub mod vocabulary;
