//! muster-services — registry, discovery, and chat fan-out logic for
//! both roles: the rendezvous service and the participant.

pub mod broadcast;
pub mod directory;
pub mod discovery;
pub mod receive;
pub mod registry;
pub mod rendezvous;
pub mod sink;

pub use broadcast::broadcast;
pub use directory::{Directory, SharedDirectory};
pub use discovery::{join, leave, refresh_loop, DiscoveryError};
pub use receive::receive_loop;
pub use registry::Registry;
pub use sink::EventSink;
