//! Test doubles for the lifecycle: a recording scheduler and a scriptable Repository

use async_trait::async_trait;
use nfreg_core::{ConfigurationSnapshot, NfProfile, PatchItem, PlmnId};
use parking_lot::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

use super::timer::{Scheduler, TimerHandle, TimerTask};
use crate::client::{Registration, RepositoryClient};
use crate::error::{RepositoryError, Result};

pub(crate) fn plmns(ids: &[(&str, &str)]) -> ConfigurationSnapshot {
    ids.iter().map(|(mcc, mnc)| PlmnId::new(*mcc, *mnc)).collect()
}

/// Scheduler that records requested delays and never fires on its own
#[derive(Default)]
pub(crate) struct RecordingScheduler {
    requested: Mutex<Vec<Duration>>,
    scheduled: Mutex<Vec<(TimerHandle, Option<TimerTask>)>>,
}

impl RecordingScheduler {
    pub(crate) fn requested(&self) -> Vec<Duration> {
        self.requested.lock().clone()
    }

    pub(crate) fn handles(&self) -> Vec<TimerHandle> {
        self.scheduled.lock().iter().map(|(h, _)| h.clone()).collect()
    }

    /// Take the most recent task if its timer is still armed, to run it by hand
    pub(crate) fn take_latest(&self) -> Option<TimerTask> {
        let mut scheduled = self.scheduled.lock();
        let (handle, task) = scheduled.last_mut()?;
        if handle.is_stopped() {
            return None;
        }
        task.take()
    }
}

impl Scheduler for RecordingScheduler {
    fn schedule(&self, after: Duration, task: TimerTask) -> TimerHandle {
        let handle = TimerHandle::new(CancellationToken::new());
        self.requested.lock().push(after);
        self.scheduled.lock().push((handle.clone(), Some(task)));
        handle
    }
}

/// How the fake answers Register
#[derive(Debug, Clone, Copy)]
pub(crate) enum RegisterBehavior {
    /// Succeed, advertising this heartbeat interval
    Succeed(i32),
    Fail,
    /// Never return; the call only ends by being abandoned
    Block,
}

/// Flags an in-flight call as abandoned when its future is dropped
struct AbandonGuard(Arc<AtomicBool>);

impl Drop for AbandonGuard {
    fn drop(&mut self) {
        self.0.store(true, Ordering::SeqCst);
    }
}

/// Scriptable Repository that records every call
pub(crate) struct FakeRepository {
    register_behavior: Mutex<RegisterBehavior>,
    update_heartbeat: Mutex<Option<i32>>,
    deregister_fails: AtomicBool,
    deregister_blocks: AtomicBool,
    registrations: Mutex<Vec<ConfigurationSnapshot>>,
    abandoned: Mutex<Vec<Arc<AtomicBool>>>,
    register_calls: AtomicUsize,
    update_calls: AtomicUsize,
    deregister_calls: AtomicUsize,
}

impl FakeRepository {
    pub(crate) fn new(register_behavior: RegisterBehavior) -> Self {
        Self {
            register_behavior: Mutex::new(register_behavior),
            update_heartbeat: Mutex::new(Some(60)),
            deregister_fails: AtomicBool::new(false),
            deregister_blocks: AtomicBool::new(false),
            registrations: Mutex::new(Vec::new()),
            abandoned: Mutex::new(Vec::new()),
            register_calls: AtomicUsize::new(0),
            update_calls: AtomicUsize::new(0),
            deregister_calls: AtomicUsize::new(0),
        }
    }

    pub(crate) fn set_register_behavior(&self, behavior: RegisterBehavior) {
        *self.register_behavior.lock() = behavior;
    }

    /// `None` makes Update fail
    pub(crate) fn set_update_heartbeat(&self, heartbeat: Option<i32>) {
        *self.update_heartbeat.lock() = heartbeat;
    }

    pub(crate) fn fail_deregister(&self) {
        self.deregister_fails.store(true, Ordering::SeqCst);
    }

    /// Deregister never returns once called
    pub(crate) fn block_deregister(&self) {
        self.deregister_blocks.store(true, Ordering::SeqCst);
    }

    pub(crate) fn registrations(&self) -> Vec<ConfigurationSnapshot> {
        self.registrations.lock().clone()
    }

    /// Whether the n-th blocked Register call was abandoned by its attempt
    pub(crate) fn was_abandoned(&self, call: usize) -> Option<bool> {
        self.abandoned
            .lock()
            .get(call)
            .map(|flag| flag.load(Ordering::SeqCst))
    }

    pub(crate) fn register_calls(&self) -> usize {
        self.register_calls.load(Ordering::SeqCst)
    }

    pub(crate) fn update_calls(&self) -> usize {
        self.update_calls.load(Ordering::SeqCst)
    }

    pub(crate) fn deregister_calls(&self) -> usize {
        self.deregister_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl RepositoryClient for FakeRepository {
    async fn register(&self, snapshot: &ConfigurationSnapshot) -> Result<Registration> {
        self.register_calls.fetch_add(1, Ordering::SeqCst);
        self.registrations.lock().push(snapshot.clone());

        let behavior = *self.register_behavior.lock();
        match behavior {
            RegisterBehavior::Succeed(heartbeat) => Ok(Registration {
                profile: NfProfile {
                    plmn_list: snapshot.clone(),
                    heart_beat_timer: Some(heartbeat),
                    ..NfProfile::default()
                },
                location: "http://nrf/nf-instances/test".to_string(),
            }),
            RegisterBehavior::Fail => {
                Err(RepositoryError::Transport("nrf unreachable".to_string()))
            }
            RegisterBehavior::Block => {
                let flag = Arc::new(AtomicBool::new(false));
                self.abandoned.lock().push(flag.clone());
                let _guard = AbandonGuard(flag);
                futures::future::pending::<Result<Registration>>().await
            }
        }
    }

    async fn update(&self, _patch: &[PatchItem]) -> Result<NfProfile> {
        self.update_calls.fetch_add(1, Ordering::SeqCst);
        let heartbeat = *self.update_heartbeat.lock();
        heartbeat
            .map(|secs| NfProfile {
                heart_beat_timer: Some(secs),
                ..NfProfile::default()
            })
            .ok_or_else(|| RepositoryError::Transport("update refused".to_string()))
    }

    async fn deregister(&self) -> Result<()> {
        self.deregister_calls.fetch_add(1, Ordering::SeqCst);
        if self.deregister_blocks.load(Ordering::SeqCst) {
            std::future::pending::<()>().await;
        }
        if self.deregister_fails.load(Ordering::SeqCst) {
            return Err(RepositoryError::Transport("deregister refused".to_string()));
        }
        Ok(())
    }
}
