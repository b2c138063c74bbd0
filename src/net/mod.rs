//! Backend access: the remote source abstraction, its HTTP
//! implementation, and connectivity tracking.

pub mod api_types;
pub mod connectivity;
pub mod http;
pub mod source;

pub use connectivity::{spawn_prober, ConnectivityHandle, ConnectivityOracle, ProbeConfig};
pub use http::HttpSource;
pub use source::{Document, QuerySpec, RemoteError, RemoteSource, SortDir};
