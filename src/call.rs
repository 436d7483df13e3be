/// 呼叫模型
///
/// 单个呼叫的状态与外呼连接进度
use std::fmt;
use tracing::debug;
use uuid::Uuid;

/// 呼叫状态
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallState {
    Connecting,
    Ringing,
    Active,
    Held,
    /// 终止状态
    Ended,
}

impl CallState {
    pub fn as_str(&self) -> &'static str {
        match self {
            CallState::Connecting => "connecting",
            CallState::Ringing => "ringing",
            CallState::Active => "active",
            CallState::Held => "held",
            CallState::Ended => "ended",
        }
    }
}

/// 外呼连接进度，仅用于外呼
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConnectedState {
    #[default]
    None,
    Pending,
    Complete,
}

/// 连接进度监听器
///
/// 每个呼叫最多一个监听器，后设置的覆盖先前的
pub trait ConnectedStateListener: Send + Sync {
    fn connected_state_changed(&self, call_id: Uuid, state: ConnectedState);
}

impl<F> ConnectedStateListener for F
where
    F: Fn(Uuid, ConnectedState) + Send + Sync,
{
    fn connected_state_changed(&self, call_id: Uuid, state: ConnectedState) {
        self(call_id, state)
    }
}

/// 一路电话呼叫
pub struct Call {
    id: Uuid,
    handle: String,
    is_outgoing: bool,
    has_video: bool,
    state: CallState,
    connected_state: ConnectedState,
    listener: Option<Box<dyn ConnectedStateListener>>,
}

impl Call {
    /// 创建来电，初始状态为振铃
    pub fn incoming(id: Uuid, handle: impl Into<String>, has_video: bool) -> Self {
        Self::new(id, handle.into(), false, has_video, CallState::Ringing)
    }

    /// 创建外呼，初始状态为连接中
    pub fn outgoing(id: Uuid, handle: impl Into<String>) -> Self {
        Self::new(id, handle.into(), true, false, CallState::Connecting)
    }

    fn new(id: Uuid, handle: String, is_outgoing: bool, has_video: bool, state: CallState) -> Self {
        Self {
            id,
            handle,
            is_outgoing,
            has_video,
            state,
            connected_state: ConnectedState::None,
            listener: None,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn handle(&self) -> &str {
        &self.handle
    }

    pub fn is_outgoing(&self) -> bool {
        self.is_outgoing
    }

    pub fn has_video(&self) -> bool {
        self.has_video
    }

    pub fn state(&self) -> CallState {
        self.state
    }

    pub fn connected_state(&self) -> ConnectedState {
        self.connected_state
    }

    /// 设置连接进度监听器，替换已有的监听器
    pub fn set_connected_state_listener(&mut self, listener: Box<dyn ConnectedStateListener>) {
        self.listener = Some(listener);
    }

    pub(crate) fn answer(&mut self) {
        self.transition(CallState::Active);
    }

    pub(crate) fn end(&mut self) {
        self.transition(CallState::Ended);
    }

    pub(crate) fn set_held(&mut self, on_hold: bool) {
        self.transition(if on_hold { CallState::Held } else { CallState::Active });
    }

    /// 更新连接进度
    ///
    /// 值发生变化时同步通知监听器。
    /// 仅当呼叫仍处于连接中时，Complete 才使其进入通话状态；
    /// 其它情况下不改变呼叫状态
    pub(crate) fn set_connected_state(&mut self, connected_state: ConnectedState) {
        if self.connected_state == connected_state {
            return;
        }
        self.connected_state = connected_state;
        if connected_state == ConnectedState::Complete && self.state == CallState::Connecting {
            self.transition(CallState::Active);
        }
        if let Some(listener) = &self.listener {
            listener.connected_state_changed(self.id, connected_state);
        }
    }

    fn transition(&mut self, state: CallState) {
        debug!("呼叫 {} 状态: {} -> {}", self.id, self.state.as_str(), state.as_str());
        self.state = state;
    }

    /// 只读快照
    pub fn snapshot(&self) -> CallSnapshot {
        CallSnapshot {
            id: self.id,
            handle: self.handle.clone(),
            is_outgoing: self.is_outgoing,
            has_video: self.has_video,
            state: self.state,
            connected_state: self.connected_state,
        }
    }
}

impl fmt::Debug for Call {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Call")
            .field("id", &self.id)
            .field("handle", &self.handle)
            .field("is_outgoing", &self.is_outgoing)
            .field("has_video", &self.has_video)
            .field("state", &self.state)
            .field("connected_state", &self.connected_state)
            .field("has_listener", &self.listener.is_some())
            .finish()
    }
}

/// 呼叫的只读视图，可跨事件循环传递
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallSnapshot {
    pub id: Uuid,
    pub handle: String,
    pub is_outgoing: bool,
    pub has_video: bool,
    pub state: CallState,
    pub connected_state: ConnectedState,
}

/// 外呼启动期间交给启动器的受限视图
///
/// 只允许推进连接进度，不暴露其它状态变更
pub struct OutgoingCall<'a> {
    call: &'a mut Call,
}

impl<'a> OutgoingCall<'a> {
    pub(crate) fn new(call: &'a mut Call) -> Self {
        Self { call }
    }

    pub fn id(&self) -> Uuid {
        self.call.id()
    }

    pub fn handle(&self) -> &str {
        self.call.handle()
    }

    /// 标记开始连接
    pub fn mark_connecting(&mut self) {
        self.call.set_connected_state(ConnectedState::Pending);
    }

    /// 标记已接通
    pub fn mark_connected(&mut self) {
        self.call.set_connected_state(ConnectedState::Complete);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    fn recording_listener() -> (Arc<Mutex<Vec<ConnectedState>>>, Box<dyn ConnectedStateListener>) {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        let listener = move |_id: Uuid, state: ConnectedState| sink.lock().unwrap().push(state);
        (seen, Box::new(listener))
    }

    #[test]
    fn test_initial_states() {
        let incoming = Call::incoming(Uuid::new_v4(), "555-0100", false);
        assert_eq!(incoming.state(), CallState::Ringing);
        assert!(!incoming.is_outgoing());

        let outgoing = Call::outgoing(Uuid::new_v4(), "555-0200");
        assert_eq!(outgoing.state(), CallState::Connecting);
        assert_eq!(outgoing.connected_state(), ConnectedState::None);
        assert!(outgoing.is_outgoing());
    }

    #[test]
    fn test_hold_toggle() {
        let mut call = Call::incoming(Uuid::new_v4(), "555-0100", false);
        call.answer();
        call.set_held(true);
        assert_eq!(call.state(), CallState::Held);
        call.set_held(false);
        assert_eq!(call.state(), CallState::Active);
    }

    #[test]
    fn test_listener_notified_only_on_change() {
        let mut call = Call::outgoing(Uuid::new_v4(), "555-0200");
        let (seen, listener) = recording_listener();
        call.set_connected_state_listener(listener);

        call.set_connected_state(ConnectedState::Pending);
        call.set_connected_state(ConnectedState::Pending);
        call.set_connected_state(ConnectedState::Complete);

        assert_eq!(
            *seen.lock().unwrap(),
            vec![ConnectedState::Pending, ConnectedState::Complete]
        );
        assert_eq!(call.state(), CallState::Active);
    }

    #[test]
    fn test_connected_after_hold_keeps_held() {
        let mut call = Call::outgoing(Uuid::new_v4(), "555-0200");
        call.set_connected_state(ConnectedState::Pending);
        call.set_held(true);

        call.set_connected_state(ConnectedState::Complete);

        assert_eq!(call.state(), CallState::Held);
        assert_eq!(call.connected_state(), ConnectedState::Complete);
    }

    #[test]
    fn test_late_pending_does_not_rewind_active_call() {
        let mut call = Call::outgoing(Uuid::new_v4(), "555-0200");
        let (seen, listener) = recording_listener();
        call.set_connected_state_listener(listener);

        call.set_connected_state(ConnectedState::Complete);
        call.set_connected_state(ConnectedState::Pending);

        assert_eq!(call.state(), CallState::Active);
        assert_eq!(
            *seen.lock().unwrap(),
            vec![ConnectedState::Complete, ConnectedState::Pending]
        );
    }

    #[test]
    fn test_connected_does_not_revive_ended_call() {
        let mut call = Call::outgoing(Uuid::new_v4(), "555-0200");
        call.end();

        call.set_connected_state(ConnectedState::Complete);

        assert_eq!(call.state(), CallState::Ended);
    }

    #[test]
    fn test_last_listener_wins() {
        let mut call = Call::outgoing(Uuid::new_v4(), "555-0200");
        let (first, listener) = recording_listener();
        call.set_connected_state_listener(listener);
        let (second, listener) = recording_listener();
        call.set_connected_state_listener(listener);

        OutgoingCall::new(&mut call).mark_connecting();

        assert!(first.lock().unwrap().is_empty());
        assert_eq!(*second.lock().unwrap(), vec![ConnectedState::Pending]);
    }
}
