/// 呼叫生命周期控制器
///
/// 接收提供者事件，驱动注册表中呼叫的状态变迁，并触发音频与上报副作用。
///
/// ## 状态机
///
/// ```text
/// Connecting/Ringing ──answer──▶ Active ◀──set_held──▶ Held
///          │                        │                     │
///          └────────── end / reset ─┴─────────────────────┴──▶ Ended
/// ```
///
/// 所有方法都在单一串行事件循环中被调用，因此不需要加锁。
/// 唯一的异步边界是来电上报与外呼启动，它们在独立任务中执行，
/// 完成结果以消息形式回到同一个事件队列。
use crate::action::{Action, ActionResponder};
use crate::call::{Call, CallSnapshot, ConnectedState, OutgoingCall};
use crate::config::ProviderConfiguration;
use crate::error::{CallError, CallResult};
use crate::provider::{Message, WeakProviderHandle};
use crate::registry::CallRegistry;
use crate::traits::{AudioSession, CallReporter, OutgoingCallStarter, ReportResult};
use std::sync::Arc;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

pub struct CallLifecycleController {
    config: ProviderConfiguration,
    registry: CallRegistry,
    reporter: Arc<dyn CallReporter>,
    audio: Arc<dyn AudioSession>,
    starter: Arc<dyn OutgoingCallStarter>,
    provider: WeakProviderHandle,
}

impl CallLifecycleController {
    pub(crate) fn new(
        config: ProviderConfiguration,
        reporter: Arc<dyn CallReporter>,
        audio: Arc<dyn AudioSession>,
        starter: Arc<dyn OutgoingCallStarter>,
        provider: WeakProviderHandle,
    ) -> Self {
        Self {
            config,
            registry: CallRegistry::new(),
            reporter,
            audio,
            starter,
            provider,
        }
    }

    pub fn config(&self) -> &ProviderConfiguration {
        &self.config
    }

    pub fn registry(&self) -> &CallRegistry {
        &self.registry
    }

    /// 分发事件队列中的一条消息
    pub(crate) fn handle_message(&mut self, message: Message) {
        match message {
            Message::Reset => {
                self.provider_did_reset();
            }
            Message::AudioActivated => self.did_activate_audio(),
            Message::ReportIncoming {
                id,
                handle,
                has_video,
                completion,
            } => self.report_incoming_call(id, handle, has_video, completion),
            Message::Perform(action, responder) => self.perform(action, responder),
            Message::ConnectionProgress { id, state } => self.connection_progress(id, state),
            Message::Calls(reply) => {
                let _ = reply.send(self.registry.snapshots());
            }
            Message::FindCall(id, reply) => {
                let _ = reply.send(self.registry.find(&id).map(Call::snapshot));
            }
            Message::IncomingReported {
                id,
                handle,
                has_video,
                result,
                completion,
            } => self.incoming_reported(id, handle, has_video, result, completion),
            Message::OutgoingStarted {
                call,
                result,
                responder,
            } => self.outgoing_started(call, result, responder),
        }
    }

    /// 提供者重置：停止音频，结束并清空所有呼叫
    ///
    /// 返回被结束呼叫的快照
    pub fn provider_did_reset(&mut self) -> Vec<CallSnapshot> {
        info!("提供者重置，结束 {} 路呼叫", self.registry.len());
        self.audio.stop();
        let ended: Vec<CallSnapshot> = self
            .registry
            .iter_mut()
            .map(|call| {
                call.end();
                call.snapshot()
            })
            .collect();
        self.registry.remove_all();
        ended
    }

    /// 音频会话已激活
    pub fn did_activate_audio(&self) {
        debug!("音频会话已激活");
        self.audio.start();
    }

    /// 上报来电
    ///
    /// 上报在独立任务中执行，成功后才创建呼叫并加入注册表
    pub fn report_incoming_call(
        &mut self,
        id: Uuid,
        handle: String,
        has_video: bool,
        completion: ActionResponder,
    ) {
        if !self.config.accepts_handle(&handle) {
            completion.fail(CallError::unsupported_handle(handle));
            return;
        }

        let has_video = if has_video && !self.config.supports_video {
            warn!("配置不支持视频，来电 {} 按音频上报", id);
            false
        } else {
            has_video
        };

        let Some(provider) = self.provider.upgrade() else {
            completion.fail(CallError::ProviderClosed);
            return;
        };

        info!("上报来电: {} from {}", id, handle);
        let reporter = self.reporter.clone();
        tokio::spawn(async move {
            let result = reporter.report_new_incoming_call(id, &handle, has_video).await;
            let message = Message::IncomingReported {
                id,
                handle,
                has_video,
                result,
                completion,
            };
            if provider.post(message).is_err() {
                warn!("来电 {} 上报完成时提供者已关闭", id);
            }
        });
    }

    fn incoming_reported(
        &mut self,
        id: Uuid,
        handle: String,
        has_video: bool,
        result: ReportResult,
        completion: ActionResponder,
    ) {
        if let Err(e) = result {
            completion.fail(CallError::Reporting(e));
            return;
        }

        match self.registry.add(Call::incoming(id, handle, has_video)) {
            Ok(()) => completion.fulfill(),
            Err(e) => {
                error!("来电上报成功但无法注册: {}", e);
                completion.fail(e);
            }
        }
    }

    /// 执行动作源下发的动作
    pub fn perform(&mut self, action: Action, responder: ActionResponder) {
        debug!("执行动作: {:?}", action);
        match action {
            Action::Answer { call_id } => Self::respond(self.answer(call_id), responder),
            Action::End { call_id } => {
                self.end(call_id, responder);
            }
            Action::SetHeld { call_id, on_hold } => {
                Self::respond(self.set_held(call_id, on_hold), responder)
            }
            Action::StartCall { call_id, handle } => self.start_call(call_id, handle, responder),
        }
    }

    fn respond(result: CallResult<()>, responder: ActionResponder) {
        match result {
            Ok(()) => responder.fulfill(),
            Err(e) => responder.fail(e),
        }
    }

    fn answer(&mut self, call_id: Uuid) -> CallResult<()> {
        let call = self
            .registry
            .find_mut(&call_id)
            .ok_or_else(|| CallError::call_not_found(call_id))?;

        self.audio.configure();
        call.answer();
        info!("已接听呼叫: {}", call_id);
        Ok(())
    }

    /// 结束呼叫，返回已移出注册表的呼叫
    fn end(&mut self, call_id: Uuid, responder: ActionResponder) -> Option<Call> {
        let Some(call) = self.registry.find_mut(&call_id) else {
            responder.fail(CallError::call_not_found(call_id));
            return None;
        };

        self.audio.stop();
        call.end();
        responder.fulfill();
        info!("已结束呼叫: {}", call_id);
        self.registry.remove_by_id(&call_id)
    }

    fn set_held(&mut self, call_id: Uuid, on_hold: bool) -> CallResult<()> {
        let call = self
            .registry
            .find_mut(&call_id)
            .ok_or_else(|| CallError::call_not_found(call_id))?;

        call.set_held(on_hold);
        if on_hold {
            self.audio.stop();
        } else {
            self.audio.start();
        }
        info!("呼叫 {} 保持状态: {}", call_id, on_hold);
        Ok(())
    }

    fn start_call(&mut self, call_id: Uuid, handle: String, responder: ActionResponder) {
        if !self.config.accepts_handle(&handle) {
            responder.fail(CallError::unsupported_handle(handle));
            return;
        }

        let Some(provider) = self.provider.upgrade() else {
            responder.fail(CallError::ProviderClosed);
            return;
        };

        let mut call = Call::outgoing(call_id, handle);
        self.audio.configure();

        let reporter = self.reporter.clone();
        call.set_connected_state_listener(Box::new(move |id: Uuid, state: ConnectedState| {
            match state {
                ConnectedState::Pending => reporter.report_outgoing_call_started_connecting(id),
                ConnectedState::Complete => reporter.report_outgoing_call_connected(id),
                ConnectedState::None => {}
            }
        }));

        info!("发起外呼: {} to {}", call_id, call.handle());
        let starter = self.starter.clone();
        tokio::spawn(async move {
            let result = starter
                .start_call(OutgoingCall::new(&mut call), provider.clone())
                .await;
            let message = Message::OutgoingStarted {
                call,
                result,
                responder,
            };
            if provider.post(message).is_err() {
                warn!("外呼 {} 启动完成时提供者已关闭", call_id);
            }
        });
    }

    fn outgoing_started(&mut self, call: Call, result: ReportResult, responder: ActionResponder) {
        if let Err(e) = result {
            debug!("丢弃未能启动的外呼: {}", call.id());
            responder.fail(CallError::Reporting(e));
            return;
        }

        match self.registry.add(call) {
            Ok(()) => responder.fulfill(),
            Err(e) => {
                error!("外呼启动成功但无法注册: {}", e);
                responder.fail(e);
            }
        }
    }

    /// 已注册外呼的后续连接进度
    pub fn connection_progress(&mut self, id: Uuid, state: ConnectedState) {
        match self.registry.find_mut(&id) {
            Some(call) if call.is_outgoing() => call.set_connected_state(state),
            Some(_) => warn!("忽略来电 {} 的连接进度", id),
            None => debug!("忽略未知呼叫 {} 的连接进度", id),
        }
    }
}
