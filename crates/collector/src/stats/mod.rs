pub mod capacity;
pub mod cluster;

pub use capacity::{CAPACITY_OBJECT_TYPES, CapacityReports};
pub use cluster::{ClusterDetails, ClusterInfoPoller, fetch_cluster_details};
