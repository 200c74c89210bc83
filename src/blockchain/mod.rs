pub mod poller;
pub mod rpc_client;
pub mod source;

pub use poller::{Poller, PollerConfig, PollerState};
pub use rpc_client::RpcClient;
pub use source::BlockSource;
