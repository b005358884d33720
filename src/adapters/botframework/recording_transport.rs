//! Recording transport for tests.
//!
//! Records every send and update in call order, including calls that were
//! configured to fail.

use async_trait::async_trait;
use std::sync::{Arc, Mutex, MutexGuard};

use crate::domain::activity::{Activity, ActivityId, StreamInfo};
use crate::domain::conversation::ConversationAddress;
use crate::ports::{Transport, TransportError, TransportFactory};

/// One recorded transport call.
#[derive(Debug, Clone, PartialEq)]
pub enum TransportCall {
    Send(Activity),
    Update(ActivityId, Activity),
}

impl TransportCall {
    pub fn activity(&self) -> &Activity {
        match self {
            TransportCall::Send(activity) | TransportCall::Update(_, activity) => activity,
        }
    }
}

#[derive(Debug, Default)]
struct Recorded {
    calls: Vec<TransportCall>,
    sent: u32,
}

/// In-memory transport that assigns ids `activity-1`, `activity-2`, ...
#[derive(Debug, Default)]
pub struct RecordingTransport {
    recorded: Mutex<Recorded>,
    fail_send: bool,
    fail_update: bool,
}

impl RecordingTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every `send` is rejected by the channel.
    pub fn failing_send() -> Self {
        Self {
            fail_send: true,
            ..Self::default()
        }
    }

    /// Every `update` is rejected by the channel.
    pub fn failing_update() -> Self {
        Self {
            fail_update: true,
            ..Self::default()
        }
    }

    pub fn calls(&self) -> Vec<TransportCall> {
        self.lock().calls.clone()
    }

    /// Activities of all calls, in order.
    pub fn activities(&self) -> Vec<Activity> {
        self.lock()
            .calls
            .iter()
            .map(|call| call.activity().clone())
            .collect()
    }

    /// Stream metadata of every streamed activity, in order.
    pub fn stream_infos(&self) -> Vec<StreamInfo> {
        self.lock()
            .calls
            .iter()
            .flat_map(|call| call.activity().entities.iter())
            .filter_map(|entity| entity.as_stream_info().cloned())
            .collect()
    }

    fn lock(&self) -> MutexGuard<'_, Recorded> {
        self.recorded.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[async_trait]
impl Transport for RecordingTransport {
    async fn send(&self, activity: Activity) -> Result<ActivityId, TransportError> {
        let mut recorded = self.lock();
        recorded.calls.push(TransportCall::Send(activity));
        if self.fail_send {
            return Err(TransportError::rejected(502, "send rejected"));
        }
        recorded.sent += 1;
        Ok(ActivityId::new(format!("activity-{}", recorded.sent)))
    }

    async fn update(&self, id: &ActivityId, activity: Activity) -> Result<(), TransportError> {
        let mut recorded = self.lock();
        recorded.calls.push(TransportCall::Update(id.clone(), activity));
        if self.fail_update {
            return Err(TransportError::rejected(502, "update rejected"));
        }
        Ok(())
    }
}

/// Factory handing out the same recording transport for every address.
#[derive(Debug, Clone)]
pub struct RecordingTransportFactory {
    transport: Arc<RecordingTransport>,
}

impl RecordingTransportFactory {
    pub fn new(transport: Arc<RecordingTransport>) -> Self {
        Self { transport }
    }
}

impl TransportFactory for RecordingTransportFactory {
    fn for_conversation(&self, _address: &ConversationAddress) -> Arc<dyn Transport> {
        self.transport.clone()
    }

    fn proactive(&self, _address: &ConversationAddress) -> Arc<dyn Transport> {
        self.transport.clone()
    }
}
