//! 测试用的记录型协作者

use crate::call::OutgoingCall;
use crate::config::ProviderConfiguration;
use crate::provider::{CallProvider, ProviderHandle};
use crate::traits::{AudioSession, CallReporter, OutgoingCallStarter, ReportResult};
use async_trait::async_trait;
use std::sync::{Arc, Mutex};
use tokio::task::JoinHandle;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AudioOp {
    Configure,
    Start,
    Stop,
}

#[derive(Default)]
pub struct RecordingAudio {
    ops: Mutex<Vec<AudioOp>>,
}

impl RecordingAudio {
    pub fn ops(&self) -> Vec<AudioOp> {
        self.ops.lock().unwrap().clone()
    }
}

impl AudioSession for RecordingAudio {
    fn configure(&self) {
        self.ops.lock().unwrap().push(AudioOp::Configure);
    }

    fn start(&self) {
        self.ops.lock().unwrap().push(AudioOp::Start);
    }

    fn stop(&self) {
        self.ops.lock().unwrap().push(AudioOp::Stop);
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reported {
    Incoming { id: Uuid, handle: String, has_video: bool },
    StartedConnecting(Uuid),
    Connected(Uuid),
}

#[derive(Default)]
pub struct RecordingReporter {
    pub fail_incoming: bool,
    reported: Mutex<Vec<Reported>>,
}

impl RecordingReporter {
    pub fn failing() -> Self {
        Self {
            fail_incoming: true,
            ..Self::default()
        }
    }

    pub fn reported(&self) -> Vec<Reported> {
        self.reported.lock().unwrap().clone()
    }
}

#[async_trait]
impl CallReporter for RecordingReporter {
    async fn report_new_incoming_call(&self, id: Uuid, handle: &str, has_video: bool) -> ReportResult {
        self.reported.lock().unwrap().push(Reported::Incoming {
            id,
            handle: handle.to_string(),
            has_video,
        });
        if self.fail_incoming {
            return Err("call blocked by system".into());
        }
        Ok(())
    }

    fn report_outgoing_call_started_connecting(&self, id: Uuid) {
        self.reported.lock().unwrap().push(Reported::StartedConnecting(id));
    }

    fn report_outgoing_call_connected(&self, id: Uuid) {
        self.reported.lock().unwrap().push(Reported::Connected(id));
    }
}

/// 外呼启动器的行为脚本
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StartScript {
    /// 立即成功，不推进进度
    Succeed,
    /// 启动期间标记开始连接后成功
    MarkConnecting,
    Fail,
}

pub struct ScriptedStarter {
    pub script: StartScript,
}

#[async_trait]
impl OutgoingCallStarter for ScriptedStarter {
    async fn start_call(&self, mut call: OutgoingCall<'_>, _provider: ProviderHandle) -> ReportResult {
        match self.script {
            StartScript::Succeed => Ok(()),
            StartScript::MarkConnecting => {
                call.mark_connecting();
                Ok(())
            }
            StartScript::Fail => Err(format!("cannot dial {}", call.handle()).into()),
        }
    }
}

pub struct Harness {
    pub handle: ProviderHandle,
    pub task: JoinHandle<()>,
    pub audio: Arc<RecordingAudio>,
    pub reporter: Arc<RecordingReporter>,
}

/// 在后台启动一个使用记录型协作者的提供者
pub fn spawn_provider(
    config: ProviderConfiguration,
    reporter: RecordingReporter,
    script: StartScript,
) -> Harness {
    let audio = Arc::new(RecordingAudio::default());
    let reporter = Arc::new(reporter);
    let (provider, handle) = CallProvider::new(
        config,
        reporter.clone(),
        audio.clone(),
        Arc::new(ScriptedStarter { script }),
    )
    .expect("valid configuration");
    let task = provider.spawn();

    Harness {
        handle,
        task,
        audio,
        reporter,
    }
}
