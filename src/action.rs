/// 呼叫动作
///
/// 每个动作必须且只能以 fulfill 或 fail 结束一次
use crate::error::{CallError, CallResult};
use tokio::sync::oneshot;
use tracing::{debug, warn};
use uuid::Uuid;

/// 动作源下发的生命周期请求
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    /// 接听
    Answer { call_id: Uuid },

    /// 挂断
    End { call_id: Uuid },

    /// 保持/恢复
    SetHeld { call_id: Uuid, on_hold: bool },

    /// 发起外呼
    StartCall { call_id: Uuid, handle: String },
}

impl Action {
    pub fn call_id(&self) -> Uuid {
        match self {
            Action::Answer { call_id }
            | Action::End { call_id }
            | Action::SetHeld { call_id, .. }
            | Action::StartCall { call_id, .. } => *call_id,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Action::Answer { .. } => "answer",
            Action::End { .. } => "end",
            Action::SetHeld { .. } => "set_held",
            Action::StartCall { .. } => "start_call",
        }
    }
}

/// 动作结果回传
///
/// `fulfill` 与 `fail` 都会消耗自身，保证只回传一次。
/// 来电上报的完成回调也使用该类型。
#[derive(Debug)]
pub struct ActionResponder {
    name: &'static str,
    call_id: Uuid,
    sender: oneshot::Sender<CallResult<()>>,
}

impl ActionResponder {
    pub(crate) fn new(name: &'static str, call_id: Uuid) -> (Self, oneshot::Receiver<CallResult<()>>) {
        let (sender, receiver) = oneshot::channel();
        (Self { name, call_id, sender }, receiver)
    }

    pub fn call_id(&self) -> Uuid {
        self.call_id
    }

    /// 动作成功
    pub fn fulfill(self) {
        debug!("动作完成: {} {}", self.name, self.call_id);
        if self.sender.send(Ok(())).is_err() {
            debug!("动作 {} 的调用方已放弃等待", self.name);
        }
    }

    /// 动作失败
    pub fn fail(self, err: CallError) {
        warn!("动作失败: {} {}: {} [{}]", self.name, self.call_id, err, err.error_code());
        if self.sender.send(Err(err)).is_err() {
            debug!("动作 {} 的调用方已放弃等待", self.name);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_action_accessors() {
        let id = Uuid::new_v4();
        let action = Action::SetHeld { call_id: id, on_hold: true };
        assert_eq!(action.call_id(), id);
        assert_eq!(action.name(), "set_held");
    }

    #[tokio::test]
    async fn test_fulfill_and_fail_deliver_once() {
        let id = Uuid::new_v4();
        let (responder, receiver) = ActionResponder::new("answer", id);
        responder.fulfill();
        assert!(receiver.await.unwrap().is_ok());

        let (responder, receiver) = ActionResponder::new("end", id);
        responder.fail(CallError::call_not_found(id));
        let result = receiver.await.unwrap();
        assert!(matches!(result, Err(CallError::CallNotFound { .. })));
    }

    #[test]
    fn test_fulfill_after_caller_dropped() {
        let (responder, receiver) = ActionResponder::new("answer", Uuid::new_v4());
        drop(receiver);
        responder.fulfill();
    }
}
