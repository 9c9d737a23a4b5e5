//! Model data assembly.
//!
//! Turns the irregular input tables into the fixed-shape payload the sampler
//! consumes, keeping the index mappings needed to read the posterior back:
//!
//! 1. **Index builder** ([`GroupIndex`]): dense numbering of earthquakes and stations
//! 2. **Cell network filter** ([`filter_cells`]): drop cells no path crosses
//! 3. **Payload** ([`assemble`]): counts, 1-based index vectors, coordinates, distances
//! 4. **Diagnostics**: excluded cells and the path-length misfit

mod cells;
mod diagnostics;
mod index;
mod payload;

pub use cells::{align_distances, filter_cells, path_misfit, CellNetwork, PathMisfit};
pub use diagnostics::compute_diagnostics;
pub use index::GroupIndex;
pub use payload::{assemble, AssembledModel, ModelInputs, ModelPayload, PayloadWire};
