/// 模拟协作者
///
/// 没有真实电话栈时使用：上报与音频操作只输出日志，外呼按固定延迟推进连接进度
use crate::call::{ConnectedState, OutgoingCall};
use crate::provider::ProviderHandle;
use crate::traits::{AudioSession, CallReporter, OutgoingCallStarter, ReportResult};
use async_trait::async_trait;
use std::time::Duration;
use tracing::{info, warn};
use uuid::Uuid;

/// 只记录日志的上报子系统
#[derive(Debug, Default)]
pub struct LoggingReporter {
    /// 为 true 时拒绝所有来电上报
    pub reject_incoming: bool,
}

#[async_trait]
impl CallReporter for LoggingReporter {
    async fn report_new_incoming_call(&self, id: Uuid, handle: &str, has_video: bool) -> ReportResult {
        if self.reject_incoming {
            warn!("系统拒绝来电: {} from {}", id, handle);
            return Err(format!("incoming call {} rejected", id).into());
        }
        info!("系统已接受来电: {} from {} (video: {})", id, handle, has_video);
        Ok(())
    }

    fn report_outgoing_call_started_connecting(&self, id: Uuid) {
        info!("外呼开始连接: {}", id);
    }

    fn report_outgoing_call_connected(&self, id: Uuid) {
        info!("外呼已接通: {}", id);
    }
}

/// 只记录日志的音频会话
#[derive(Debug, Default)]
pub struct LoggingAudioSession;

impl AudioSession for LoggingAudioSession {
    fn configure(&self) {
        info!("配置音频会话");
    }

    fn start(&self) {
        info!("开始音频");
    }

    fn stop(&self) {
        info!("停止音频");
    }
}

/// 模拟外呼启动器
///
/// 发起后先等待 `connecting_after` 再标记开始连接，再等待 `connected_after` 标记接通
#[derive(Debug, Clone)]
pub struct SimulatedStarter {
    pub connecting_after: Duration,
    pub connected_after: Duration,
    pub fail: bool,
}

impl SimulatedStarter {
    pub fn new(connecting_after: Duration, connected_after: Duration) -> Self {
        Self {
            connecting_after,
            connected_after,
            fail: false,
        }
    }

    /// 总是发起失败的启动器
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }
}

impl Default for SimulatedStarter {
    fn default() -> Self {
        Self::new(Duration::from_secs(3), Duration::from_millis(1500))
    }
}

#[async_trait]
impl OutgoingCallStarter for SimulatedStarter {
    async fn start_call(&self, call: OutgoingCall<'_>, provider: ProviderHandle) -> ReportResult {
        if self.fail {
            return Err(format!("unable to reach {}", call.handle()).into());
        }

        let id = call.id();
        let connecting_after = self.connecting_after;
        let connected_after = self.connected_after;
        tokio::spawn(async move {
            tokio::time::sleep(connecting_after).await;
            if provider.connection_progress(id, ConnectedState::Pending).is_err() {
                return;
            }
            tokio::time::sleep(connected_after).await;
            let _ = provider.connection_progress(id, ConnectedState::Complete);
        });
        Ok(())
    }
}
