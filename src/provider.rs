/// 呼叫提供者事件循环
///
/// `CallProvider` 持有控制器与唯一的事件队列，逐条串行处理消息；
/// `ProviderHandle` 是可克隆的事件发送端，也是动作源的入口。
use crate::action::{Action, ActionResponder};
use crate::call::{Call, CallSnapshot, ConnectedState};
use crate::config::ProviderConfiguration;
use crate::controller::CallLifecycleController;
use crate::error::CallResult;
use crate::traits::{AudioSession, CallReporter, OutgoingCallStarter, ReportResult};
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};
use uuid::Uuid;

/// 事件队列中的消息
pub(crate) enum Message {
    Reset,
    AudioActivated,
    ReportIncoming {
        id: Uuid,
        handle: String,
        has_video: bool,
        completion: ActionResponder,
    },
    Perform(Action, ActionResponder),
    ConnectionProgress {
        id: Uuid,
        state: ConnectedState,
    },
    Calls(oneshot::Sender<Vec<CallSnapshot>>),
    FindCall(Uuid, oneshot::Sender<Option<CallSnapshot>>),
    IncomingReported {
        id: Uuid,
        handle: String,
        has_video: bool,
        result: ReportResult,
        completion: ActionResponder,
    },
    OutgoingStarted {
        call: Call,
        result: ReportResult,
        responder: ActionResponder,
    },
}

/// 呼叫提供者
pub struct CallProvider {
    controller: CallLifecycleController,
    receiver: mpsc::UnboundedReceiver<Message>,
    cancel_token: CancellationToken,
}

impl CallProvider {
    /// 创建提供者及其句柄
    ///
    /// 配置在此校验一次，随后由控制器独占
    pub fn new(
        config: ProviderConfiguration,
        reporter: Arc<dyn CallReporter>,
        audio: Arc<dyn AudioSession>,
        starter: Arc<dyn OutgoingCallStarter>,
    ) -> CallResult<(Self, ProviderHandle)> {
        config.validate()?;
        info!("提供者配置: {}", config);

        let (sender, receiver) = mpsc::unbounded_channel();
        let cancel_token = CancellationToken::new();
        let handle = ProviderHandle {
            sender,
            cancel_token: cancel_token.clone(),
        };

        let controller =
            CallLifecycleController::new(config, reporter, audio, starter, handle.downgrade());

        Ok((
            Self {
                controller,
                receiver,
                cancel_token,
            },
            handle,
        ))
    }

    /// 串行处理事件，直到被取消或所有句柄都被丢弃
    pub async fn run(mut self) {
        info!("呼叫提供者已启动");
        while let Some(message) = tokio::select! {
            message = self.receiver.recv() => message,
            _ = self.cancel_token.cancelled() => None,
        } {
            self.controller.handle_message(message);
        }
        info!(
            "呼叫提供者已停止，剩余 {} 路呼叫",
            self.controller.registry().len()
        );
    }

    /// 在后台任务中运行
    pub fn spawn(self) -> JoinHandle<()> {
        tokio::spawn(self.run())
    }
}

/// 提供者句柄
///
/// 控制器只持有弱引用；最后一个句柄被丢弃后事件循环随之退出。
/// 进行中的来电上报与外呼启动任务会持有句柄直到完成。
#[derive(Clone)]
pub struct ProviderHandle {
    sender: mpsc::UnboundedSender<Message>,
    cancel_token: CancellationToken,
}

/// 不阻止事件循环退出的句柄
#[derive(Clone)]
pub(crate) struct WeakProviderHandle {
    sender: mpsc::WeakUnboundedSender<Message>,
    cancel_token: CancellationToken,
}

impl WeakProviderHandle {
    pub(crate) fn upgrade(&self) -> Option<ProviderHandle> {
        let sender = self.sender.upgrade()?;
        Some(ProviderHandle {
            sender,
            cancel_token: self.cancel_token.clone(),
        })
    }
}

impl ProviderHandle {
    pub(crate) fn downgrade(&self) -> WeakProviderHandle {
        WeakProviderHandle {
            sender: self.sender.downgrade(),
            cancel_token: self.cancel_token.clone(),
        }
    }

    pub(crate) fn post(&self, message: Message) -> CallResult<()> {
        self.sender.send(message)?;
        Ok(())
    }

    /// 上报来电，等待上报子系统的完成结果
    pub async fn report_incoming_call(
        &self,
        id: Uuid,
        handle: impl Into<String>,
        has_video: bool,
    ) -> CallResult<()> {
        let (completion, receiver) = ActionResponder::new("report_incoming", id);
        self.post(Message::ReportIncoming {
            id,
            handle: handle.into(),
            has_video,
            completion,
        })?;
        receiver.await?
    }

    /// 下发动作并等待 fulfill / fail
    pub async fn perform(&self, action: Action) -> CallResult<()> {
        let (responder, receiver) = ActionResponder::new(action.name(), action.call_id());
        self.post(Message::Perform(action, responder))?;
        receiver.await?
    }

    pub async fn answer(&self, call_id: Uuid) -> CallResult<()> {
        self.perform(Action::Answer { call_id }).await
    }

    pub async fn end(&self, call_id: Uuid) -> CallResult<()> {
        self.perform(Action::End { call_id }).await
    }

    pub async fn set_held(&self, call_id: Uuid, on_hold: bool) -> CallResult<()> {
        self.perform(Action::SetHeld { call_id, on_hold }).await
    }

    pub async fn start_call(&self, call_id: Uuid, handle: impl Into<String>) -> CallResult<()> {
        self.perform(Action::StartCall {
            call_id,
            handle: handle.into(),
        })
        .await
    }

    /// 通知提供者重置
    pub fn reset(&self) -> CallResult<()> {
        self.post(Message::Reset)
    }

    /// 通知音频会话已激活
    pub fn audio_activated(&self) -> CallResult<()> {
        self.post(Message::AudioActivated)
    }

    /// 上报已注册外呼的连接进度
    pub fn connection_progress(&self, id: Uuid, state: ConnectedState) -> CallResult<()> {
        debug!("外呼 {} 连接进度: {:?}", id, state);
        self.post(Message::ConnectionProgress { id, state })
    }

    /// 当前所有呼叫的快照
    pub async fn calls(&self) -> CallResult<Vec<CallSnapshot>> {
        let (reply, receiver) = oneshot::channel();
        self.post(Message::Calls(reply))?;
        Ok(receiver.await?)
    }

    pub async fn find_call(&self, id: Uuid) -> CallResult<Option<CallSnapshot>> {
        let (reply, receiver) = oneshot::channel();
        self.post(Message::FindCall(id, reply))?;
        Ok(receiver.await?)
    }

    /// 停止事件循环
    pub fn shutdown(&self) {
        self.cancel_token.cancel();
    }

    pub fn is_shutdown(&self) -> bool {
        self.cancel_token.is_cancelled()
    }
}

#[cfg(test)]
impl ProviderHandle {
    /// 不连接事件循环的句柄，测试中直接读取投递的消息
    pub(crate) fn detached() -> (Self, mpsc::UnboundedReceiver<Message>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        let handle = Self {
            sender,
            cancel_token: CancellationToken::new(),
        };
        (handle, receiver)
    }
}
