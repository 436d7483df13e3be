/// 外部协作者 trait 定义
///
/// 系统呼叫上报子系统、音频会话与外呼启动器均由宿主实现
use crate::call::OutgoingCall;
use crate::error::BoxError;
use crate::provider::ProviderHandle;
use async_trait::async_trait;
use uuid::Uuid;

/// 协作者操作结果
pub type ReportResult = Result<(), BoxError>;

/// 呼叫上报子系统
///
/// 把呼叫状态变化告知宿主系统的电话栈
#[async_trait]
pub trait CallReporter: Send + Sync {
    /// 上报新来电
    ///
    /// 完成结果只会返回一次；可能永远不返回
    async fn report_new_incoming_call(&self, id: Uuid, handle: &str, has_video: bool) -> ReportResult;

    /// 上报外呼开始连接
    fn report_outgoing_call_started_connecting(&self, id: Uuid);

    /// 上报外呼已接通
    fn report_outgoing_call_connected(&self, id: Uuid);
}

/// 音频会话
pub trait AudioSession: Send + Sync {
    /// 配置音频会话（类别、模式等）
    fn configure(&self);

    fn start(&self);

    fn stop(&self);
}

/// 外呼启动器
#[async_trait]
pub trait OutgoingCallStarter: Send + Sync {
    /// 启动外呼
    ///
    /// # 参数
    /// - `call`: 启动期间可推进连接进度的受限视图
    /// - `provider`: 启动完成后通过 `connection_progress` 继续上报进度
    ///
    /// # 返回
    /// - `Ok(())`: 呼叫已发起，控制器随后将其加入注册表
    /// - `Err`: 发起失败，呼叫被丢弃
    async fn start_call(&self, call: OutgoingCall<'_>, provider: ProviderHandle) -> ReportResult;
}
