// 声明所有模块
pub mod action;
pub mod call;
pub mod config;
pub mod controller;
pub mod error;
pub mod provider;
pub mod registry;
pub mod simulated;
pub mod traits;
pub mod utils;

#[cfg(test)]
pub(crate) mod testing;

/// 重新导出thiserror错误类型
pub use crate::error::{BoxError, CallError, CallResult, ConfigError};

/// 主要API重新导出，简化使用
pub use crate::action::{Action, ActionResponder};
pub use crate::call::{Call, CallSnapshot, CallState, ConnectedState, ConnectedStateListener, OutgoingCall};
pub use crate::config::{HandleType, ProviderConfiguration};
pub use crate::controller::CallLifecycleController;
pub use crate::provider::{CallProvider, ProviderHandle};
pub use crate::registry::CallRegistry;
pub use crate::traits::{AudioSession, CallReporter, OutgoingCallStarter, ReportResult};

use std::sync::Arc;

/// Call Provider库的版本信息
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// 便捷函数：创建并在后台运行呼叫提供者
pub fn start_provider(
    config: ProviderConfiguration,
    reporter: Arc<dyn CallReporter>,
    audio: Arc<dyn AudioSession>,
    starter: Arc<dyn OutgoingCallStarter>,
) -> CallResult<ProviderHandle> {
    let (provider, handle) = CallProvider::new(config, reporter, audio, starter)?;
    provider.spawn();
    Ok(handle)
}

/// 便捷函数：使用模拟协作者运行呼叫提供者
pub fn start_simulated_provider(config: ProviderConfiguration) -> CallResult<ProviderHandle> {
    use crate::simulated::{LoggingAudioSession, LoggingReporter, SimulatedStarter};

    start_provider(
        config,
        Arc::new(LoggingReporter::default()),
        Arc::new(LoggingAudioSession),
        Arc::new(SimulatedStarter::default()),
    )
}
