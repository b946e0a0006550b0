#![cfg(feature = "functional-tests")]

mod resources;
mod sync_lifecycle;

pub use cluster::TestCluster;
pub use resources::TestResources;
