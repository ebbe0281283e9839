pub mod router;

pub use router::{route_to, Destination, FileRouter, COLLISION_TIMESTAMP_FORMAT};
