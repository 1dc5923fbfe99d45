mod buffer_pool;
mod manager;
mod tcp_forwarder;
mod udp_forwarder;

pub use buffer_pool::BufferPool;
pub use manager::{ConnectionSummary, ForwarderManager};
pub use tcp_forwarder::TcpForwarder;
pub use udp_forwarder::UdpForwarder;
