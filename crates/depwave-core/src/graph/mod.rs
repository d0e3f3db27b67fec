//! Dependency graph and wave scheduling.
//!
//! ## Pipeline
//!
//! ```text
//! Vec<Document>
//!        ↓  build::DependencyGraph::build()
//! DependencyGraph (DiGraph, A → B = "A depends on B")
//!        ↓  waves::compute_waves()
//! BTreeMap<id, wave>      or  Error::DependencyCycle (cycles::find_all_cycles)
//! ```

pub mod build;
pub mod cycles;
pub mod waves;

pub use build::DependencyGraph;
pub use cycles::find_all_cycles;
pub use waves::compute_waves;
