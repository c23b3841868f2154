//! Tool namespace: descriptors, local tools, remote endpoints, registry and
//! the failover-aware invoker

pub mod descriptor;
pub mod invoker;
pub mod local;
pub mod registry;
pub mod remote;

pub use descriptor::{ParamSpec, ToolDescriptor, ToolOrigin};
pub use invoker::ToolInvoker;
pub use local::LocalTool;
pub use registry::{DiscoveryOutcome, ToolRegistry};
pub use remote::{RemoteEndpoint, RemoteToolInfo};
