//! Shared helpers for session integration tests.
//!
//! Each test drives a [`CaptureSession`] running on its own task through a
//! [`SessionHandle`], while a [`MockPeerHandle`] plays the hardware.

#![allow(dead_code)]

use std::time::Duration;

use capture_core::HostPlatform;
use capture_peer::AppCredentials;
use capture_peer::mock::{MockPeer, MockPeerHandle};
use capture_session::{CaptureSession, SessionConfig, SessionHandle, SessionSnapshot};
use tokio::task::JoinHandle;

/// How long a test waits for the session to reach an expected state.
pub const WAIT: Duration = Duration::from_secs(5);

pub struct Harness {
    pub session: SessionHandle,
    pub hardware: MockPeerHandle,
    pub task: JoinHandle<capture_session::Result<()>>,
}

pub fn config(platform: HostPlatform) -> SessionConfig {
    SessionConfig::new(
        platform,
        AppCredentials::new("android:com.example.capture", "dev-id", "app-key"),
    )
}

/// Open a session on a mock peer and run it.
pub async fn start(config: SessionConfig) -> Harness {
    let (peer, hardware) = MockPeer::new();
    let mut session = CaptureSession::new(peer, config);
    let handle = session.handle();
    session.open().await.expect("session should open");

    Harness {
        session: handle,
        hardware,
        task: tokio::spawn(session.run()),
    }
}

/// Wait until a published snapshot satisfies `predicate`.
pub async fn wait_for(
    session: &SessionHandle,
    predicate: impl FnMut(&SessionSnapshot) -> bool,
) -> SessionSnapshot {
    let mut rx = session.subscribe();
    tokio::time::timeout(WAIT, rx.wait_for(predicate))
        .await
        .expect("timed out waiting for snapshot")
        .expect("session loop stopped")
        .clone()
}
