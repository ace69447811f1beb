mod address;
mod connection;

pub use address::resolve_ip_address;
pub use connection::{AmcpConnection, ConnectionInfo, DEFAULT_PORT};
