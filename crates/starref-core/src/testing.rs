//! Test doubles shared by the unit test modules.

use std::{collections::VecDeque, sync::Mutex};

use async_trait::async_trait;
use serde_json::json;

use crate::{
    errors::{Error, RemoteError},
    ports::Dispatcher,
    wire::Request,
    Result,
};

/// Dispatcher that records every request and replays scripted outcomes.
#[derive(Default)]
pub(crate) struct FakeDispatcher {
    requests: Mutex<Vec<Request>>,
    outcomes: Mutex<VecDeque<std::result::Result<Vec<u8>, RemoteError>>>,
}

impl FakeDispatcher {
    pub fn replying(body: serde_json::Value) -> Self {
        Self::replying_raw(body.to_string().into_bytes())
    }

    pub fn replying_raw(packet: Vec<u8>) -> Self {
        let d = Self::default();
        d.outcomes.lock().unwrap().push_back(Ok(packet));
        d
    }

    pub fn failing(error: RemoteError) -> Self {
        let d = Self::default();
        d.outcomes.lock().unwrap().push_back(Err(error));
        d
    }

    pub fn requests(&self) -> Vec<Request> {
        self.requests.lock().unwrap().clone()
    }

    pub fn calls(&self) -> usize {
        self.requests.lock().unwrap().len()
    }
}

#[async_trait]
impl Dispatcher for FakeDispatcher {
    async fn send(&self, request: Request) -> Result<Vec<u8>> {
        self.requests.lock().unwrap().push(request);
        match self.outcomes.lock().unwrap().pop_front() {
            Some(Ok(packet)) => Ok(packet),
            Some(Err(e)) => Err(Error::Remote(e)),
            None => Err(Error::External("no scripted response".to_string())),
        }
    }
}

pub(crate) fn connected_bot(date: i32, url: &str, bot_id: i64) -> serde_json::Value {
    json!({
      "url": url,
      "date": date,
      "bot_id": bot_id,
      "commission_permille": 120,
      "duration_months": 12,
      "participants": 4,
      "revenue": 1000,
      "revoked": false
    })
}
