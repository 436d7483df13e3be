use thiserror::Error;
use uuid::Uuid;

/// 外部协作者（上报子系统、外呼启动器）返回的错误类型
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid configuration: {0}")]
    Invalid(String),

    #[error("Missing required field: {0}")]
    Missing(String),
}

impl From<&str> for ConfigError {
    fn from(s: &str) -> Self {
        ConfigError::Invalid(s.to_string())
    }
}

/// 呼叫操作的Result类型别名
pub type CallResult<T> = Result<T, CallError>;

/// 呼叫生命周期相关错误类型
#[derive(Error, Debug)]
pub enum CallError {
    /// 动作指向的呼叫不在注册表中
    #[error("呼叫不存在: {id}")]
    CallNotFound { id: Uuid },

    /// 上报子系统或外呼启动器返回失败
    #[error("呼叫上报失败: {0}")]
    Reporting(#[source] BoxError),

    /// 注册表中已存在相同ID的呼叫
    #[error("重复的呼叫ID: {id}")]
    DuplicateCall { id: Uuid },

    #[error("不支持的号码类型: {handle}")]
    UnsupportedHandle { handle: String },

    /// 事件循环已停止
    #[error("呼叫提供者已关闭")]
    ProviderClosed,

    #[error("配置错误: {0}")]
    Config(#[from] ConfigError),
}

impl CallError {
    /// 判断错误是否可恢复（可用于重试逻辑）
    pub fn is_recoverable(&self) -> bool {
        match self {
            CallError::Reporting(_) => true,
            CallError::CallNotFound { .. } => false,
            CallError::DuplicateCall { .. } => false,
            CallError::UnsupportedHandle { .. } => false,
            CallError::ProviderClosed => false,
            CallError::Config(_) => false,
        }
    }

    /// 获取标准错误代码，用于日志分析和监控
    pub fn error_code(&self) -> &'static str {
        match self {
            CallError::CallNotFound { .. } => "CALL_NOT_FOUND",
            CallError::Reporting(_) => "REPORTING_ERROR",
            CallError::DuplicateCall { .. } => "DUPLICATE_CALL",
            CallError::UnsupportedHandle { .. } => "UNSUPPORTED_HANDLE",
            CallError::ProviderClosed => "PROVIDER_CLOSED",
            CallError::Config(_) => "INVALID_CONFIG",
        }
    }

    /// 创建呼叫不存在错误
    pub fn call_not_found(id: Uuid) -> Self {
        CallError::CallNotFound { id }
    }

    /// 创建上报失败错误
    pub fn reporting(err: impl Into<BoxError>) -> Self {
        CallError::Reporting(err.into())
    }

    /// 创建不支持的号码错误
    pub fn unsupported_handle(handle: impl Into<String>) -> Self {
        CallError::UnsupportedHandle {
            handle: handle.into(),
        }
    }
}

impl<T> From<tokio::sync::mpsc::error::SendError<T>> for CallError {
    fn from(_: tokio::sync::mpsc::error::SendError<T>) -> Self {
        CallError::ProviderClosed
    }
}

impl From<tokio::sync::oneshot::error::RecvError> for CallError {
    fn from(_: tokio::sync::oneshot::error::RecvError) -> Self {
        CallError::ProviderClosed
    }
}
