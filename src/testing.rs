//! Scripted remote client for unit tests

use remote::{Error, RemoteClient, Request, Result};
use serde_json::Value;
use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

type Reply = Result<Option<Value>>;

/// Replies are queued per request (`Display` form, e.g. "GET access/apps").
/// The last queued reply for a request is repeated once the queue drains.
#[derive(Default)]
pub struct FakeClient {
    replies: Mutex<HashMap<String, VecDeque<Reply>>>,
    calls: Mutex<Vec<Request>>,
}

impl FakeClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reply(&self, request: &str, reply: Reply) -> &Self {
        self.replies
            .lock()
            .unwrap()
            .entry(request.to_string())
            .or_default()
            .push_back(reply);
        self
    }

    pub fn ok(&self, request: &str, payload: Value) -> &Self {
        self.reply(request, Ok(Some(payload)))
    }

    pub fn fail(&self, request: &str, status: Option<u16>, message: &str) -> &Self {
        self.reply(request, Err(Error::api(status, message)))
    }

    pub fn calls(&self) -> Vec<Request> {
        self.calls.lock().unwrap().clone()
    }

    pub fn mutations(&self) -> Vec<Request> {
        self.calls().into_iter().filter(Request::is_mutating).collect()
    }
}

impl RemoteClient for FakeClient {
    fn call(&self, request: &Request) -> Result<Option<Value>> {
        self.calls.lock().unwrap().push(request.clone());

        let key = request.to_string();
        let mut replies = self.replies.lock().unwrap();
        let Some(queue) = replies.get_mut(&key) else {
            return Err(Error::api(Some(404), format!("no reply scripted for {key}")));
        };

        if queue.len() > 1 {
            return queue.pop_front().unwrap_or(Ok(None));
        }
        match queue.front() {
            Some(Ok(value)) => Ok(value.clone()),
            Some(Err(e)) => Err(clone_error(e)),
            None => Ok(None),
        }
    }
}

fn clone_error(err: &Error) -> Error {
    match err {
        Error::Transport(m) => Error::Transport(m.clone()),
        Error::Parse(m) => Error::Parse(m.clone()),
        Error::Api { status, message } => Error::api(*status, message.clone()),
        Error::Unsupported(m) => Error::Unsupported(m.clone()),
    }
}
