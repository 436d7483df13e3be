/// 呼叫注册表
///
/// 持有所有活动呼叫，以 UUID 为键
use crate::call::{Call, CallSnapshot};
use crate::error::{CallError, CallResult};
use std::collections::HashMap;
use tracing::debug;
use uuid::Uuid;

#[derive(Debug, Default)]
pub struct CallRegistry {
    calls: HashMap<Uuid, Call>,
}

impl CallRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// 添加呼叫
    ///
    /// ID 已存在时返回 `DuplicateCall`，保留原有条目
    pub fn add(&mut self, call: Call) -> CallResult<()> {
        let id = call.id();
        if self.calls.contains_key(&id) {
            return Err(CallError::DuplicateCall { id });
        }
        debug!("注册呼叫: {} ({})", id, call.handle());
        self.calls.insert(id, call);
        Ok(())
    }

    /// 移除呼叫，不存在时不做任何操作
    pub fn remove(&mut self, call: &Call) -> Option<Call> {
        self.remove_by_id(&call.id())
    }

    /// 按 ID 移除呼叫，不存在时返回 None
    pub fn remove_by_id(&mut self, id: &Uuid) -> Option<Call> {
        let removed = self.calls.remove(id);
        if removed.is_some() {
            debug!("移除呼叫: {}", id);
        }
        removed
    }

    pub fn find(&self, id: &Uuid) -> Option<&Call> {
        self.calls.get(id)
    }

    pub fn find_mut(&mut self, id: &Uuid) -> Option<&mut Call> {
        self.calls.get_mut(id)
    }

    /// 清空注册表
    pub fn remove_all(&mut self) {
        self.calls.clear();
    }

    pub fn len(&self) -> usize {
        self.calls.len()
    }

    pub fn is_empty(&self) -> bool {
        self.calls.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Call> {
        self.calls.values()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Call> {
        self.calls.values_mut()
    }

    pub fn snapshots(&self) -> Vec<CallSnapshot> {
        self.calls.values().map(Call::snapshot).collect()
    }
}
