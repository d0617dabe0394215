//! Test support utilities shared across unit and integration tests.

use std::collections::{BTreeSet, VecDeque};
use std::env;
use std::ffi::OsString;
use std::sync::{Arc, Mutex as StdMutex, MutexGuard as StdMutexGuard, PoisonError};

use tokio::sync::{Mutex, MutexGuard};

use crate::group::{
    ClientFactory, Credentials, DetachRequest, GroupClient, GroupError, GroupFuture,
    GroupInstance, ScaleRequest, ScaleResult,
};

/// One call observed by [`ScriptedGroupClient`].
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum GroupCall {
    /// A scale-up request.
    Scale(ScaleRequest),
    /// A status read for the named group.
    Status(String),
    /// A detach request.
    Detach(DetachRequest),
}

/// Queued reply, converted into a `Result` when popped.
#[derive(Debug)]
enum Reply<T> {
    Value(T),
    Failure(GroupError),
}

impl<T> Reply<T> {
    fn into_result(self) -> Result<T, GroupError> {
        match self {
            Self::Value(value) => Ok(value),
            Self::Failure(error) => Err(error),
        }
    }
}

#[derive(Debug, Default)]
struct Script {
    scale: VecDeque<Reply<ScaleResult>>,
    status: VecDeque<Reply<Vec<GroupInstance>>>,
    repeat_status: Option<Vec<GroupInstance>>,
    detach_failures: VecDeque<GroupError>,
    build_error: Option<GroupError>,
    calls: Vec<GroupCall>,
    built_for: Vec<Credentials>,
}

/// Scripted group client that replays queued responses in FIFO order.
///
/// The double doubles as its own [`ClientFactory`], so clones handed to a
/// driver share the same script and call log. Defaults when a queue runs
/// dry: scale launches nothing, status lists no instances (or the
/// [`repeat_status`](Self::repeat_status) snapshot), and detach succeeds.
#[derive(Clone, Debug, Default)]
pub struct ScriptedGroupClient {
    script: Arc<StdMutex<Script>>,
}

impl ScriptedGroupClient {
    /// Creates a client with nothing queued.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn script(&self) -> StdMutexGuard<'_, Script> {
        self.script.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Queues a scale response.
    pub fn push_scale(&self, result: ScaleResult) {
        self.script().scale.push_back(Reply::Value(result));
    }

    /// Queues a failing scale call.
    pub fn push_scale_error(&self, error: GroupError) {
        self.script().scale.push_back(Reply::Failure(error));
    }

    /// Queues a status snapshot.
    pub fn push_status(&self, instances: Vec<GroupInstance>) {
        self.script().status.push_back(Reply::Value(instances));
    }

    /// Queues a failing status call.
    pub fn push_status_error(&self, error: GroupError) {
        self.script().status.push_back(Reply::Failure(error));
    }

    /// Returns `instances` for every status call once the queue is empty.
    pub fn repeat_status(&self, instances: Vec<GroupInstance>) {
        self.script().repeat_status = Some(instances);
    }

    /// Queues a failing detach call.
    pub fn push_detach_error(&self, error: GroupError) {
        self.script().detach_failures.push_back(error);
    }

    /// Makes every subsequent [`ClientFactory::build`] fail with `error`.
    pub fn fail_build(&self, error: GroupError) {
        self.script().build_error = Some(error);
    }

    /// Returns a snapshot of all calls recorded so far.
    #[must_use]
    pub fn calls(&self) -> Vec<GroupCall> {
        self.script().calls.clone()
    }

    /// Returns the number of status calls recorded so far.
    #[must_use]
    pub fn status_calls(&self) -> usize {
        self.script()
            .calls
            .iter()
            .filter(|call| matches!(call, GroupCall::Status(_)))
            .count()
    }

    /// Returns every detach request recorded so far.
    #[must_use]
    pub fn detach_requests(&self) -> Vec<DetachRequest> {
        self.script()
            .calls
            .iter()
            .filter_map(|call| match call {
                GroupCall::Detach(request) => Some(request.clone()),
                _ => None,
            })
            .collect()
    }

    /// Returns the credentials every client was built with.
    #[must_use]
    pub fn credentials(&self) -> Vec<Credentials> {
        self.script().built_for.clone()
    }
}

impl GroupClient for ScriptedGroupClient {
    fn scale<'a>(&'a self, request: &'a ScaleRequest) -> GroupFuture<'a, ScaleResult> {
        Box::pin(async move {
            let mut script = self.script();
            script.calls.push(GroupCall::Scale(request.clone()));
            script
                .scale
                .pop_front()
                .map_or_else(|| Ok(ScaleResult::default()), Reply::into_result)
        })
    }

    fn status<'a>(&'a self, group_id: &'a str) -> GroupFuture<'a, Vec<GroupInstance>> {
        Box::pin(async move {
            let mut script = self.script();
            script.calls.push(GroupCall::Status(group_id.to_owned()));
            let repeated = script.repeat_status.clone().unwrap_or_default();
            script
                .status
                .pop_front()
                .map_or(Ok(repeated), Reply::into_result)
        })
    }

    fn detach<'a>(&'a self, request: &'a DetachRequest) -> GroupFuture<'a, ()> {
        Box::pin(async move {
            let mut script = self.script();
            script.calls.push(GroupCall::Detach(request.clone()));
            script.detach_failures.pop_front().map_or(Ok(()), Err)
        })
    }
}

impl ClientFactory for ScriptedGroupClient {
    type Client = Self;

    fn build(&self, credentials: &Credentials) -> Result<Self::Client, GroupError> {
        let mut script = self.script();
        script.built_for.push(credentials.clone());
        script
            .build_error
            .clone()
            .map_or_else(|| Ok(self.clone()), Err)
    }
}

/// Global mutex used to serialise environment mutation in tests.
pub static ENV_LOCK: Mutex<()> = Mutex::const_new(());

/// Guard that holds the env mutex and cleans up variables on drop.
pub struct EnvGuard {
    previous: Vec<(String, Option<OsString>)>,
    _guard: MutexGuard<'static, ()>,
}

impl EnvGuard {
    /// Sets multiple environment variables while holding a global mutex.
    pub async fn set_vars(pairs: &[(&str, &str)]) -> Self {
        debug_assert!(
            {
                let mut seen = BTreeSet::new();
                pairs.iter().all(|(key, _)| seen.insert(*key))
            },
            "duplicate environment variable keys passed to EnvGuard::set_vars"
        );

        let guard = ENV_LOCK.lock().await;
        let mut previous = Vec::with_capacity(pairs.len());
        for (key, value) in pairs {
            let old = env::var_os(key);
            // SAFETY: Environment mutation is serialised by `ENV_LOCK`, preventing races.
            unsafe { env::set_var(key, value) };
            previous.push(((*key).to_owned(), old));
        }

        Self {
            previous,
            _guard: guard,
        }
    }
}

impl Drop for EnvGuard {
    fn drop(&mut self) {
        for (key, old) in &self.previous {
            // SAFETY: Environment mutation is serialised by holding `_guard`.
            unsafe {
                match old {
                    Some(val) => env::set_var(key, val),
                    None => env::remove_var(key),
                }
            }
        }
    }
}
