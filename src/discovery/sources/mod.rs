mod birdeye;
mod jupiter;
mod rpc_logs;

pub use birdeye::BirdeyeSource;
pub use jupiter::JupiterListSource;
pub use rpc_logs::{is_creation_log, RpcLogSource, PUMP_FUN_PROGRAM, RAYDIUM_AMM_V4_PROGRAM};
