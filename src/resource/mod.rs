//! Resource catalog: wire models, schemas, mapping tables, readers, and
//! the sweeper.
//!
//! Each resource module owns everything for one record type: the serde wire
//! struct, the schema descriptor, the field-mapping table, and the
//! paginated reader that ties them together.

pub mod fetcher;
pub mod instances;
pub mod network;
pub mod registry;
pub mod shapes;
pub mod sweeper;

pub use fetcher::collect_pages;
pub use registry::{Registry, RegistryError, ResourceDef};
