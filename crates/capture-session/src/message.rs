//! Messages consumed by the session loop besides peer notifications.
//!
//! Two producers feed the session message queue:
//!
//! - [`SessionHandle`](crate::SessionHandle) clones send [`Command`]s, each
//!   carrying a oneshot reply channel.
//! - Spawned property calls send a [`Completion`] once the peer answered.
//!   Completions carry the session epoch they were issued in so the loop
//!   can discard answers that arrive after a close.

use capture_core::{DataSource, DataSourceStatus, Guid, TriggerMode};
use tokio::sync::oneshot;

use crate::error::{Result, SessionError};
use crate::socketcam::SocketCamStatus;

pub(crate) type Reply<T> = oneshot::Sender<Result<T>>;

/// Request from a [`SessionHandle`](crate::SessionHandle).
#[derive(Debug)]
pub(crate) enum Command {
    FriendlyName(Reply<String>),
    SetFriendlyName { name: String, reply: Reply<String> },
    BatteryLevel(Reply<u32>),
    DataSource { id: u32, reply: Reply<DataSource> },
    SetDataSource {
        id: u32,
        status: DataSourceStatus,
        reply: Reply<DataSource>,
    },
    RefreshSocketCam(Reply<SocketCamStatus>),
    ToggleSocketCam(Reply<SocketCamStatus>),
    SetTrigger { mode: TriggerMode, reply: Reply<bool> },
    OpenScanView(Reply<()>),
    CloseScanView(Reply<()>),
    Close(Reply<()>),
}

impl Command {
    /// Answer the command with an error without processing it.
    pub(crate) fn reject(self, err: SessionError) {
        match self {
            Command::FriendlyName(reply) | Command::SetFriendlyName { reply, .. } => {
                let _ = reply.send(Err(err));
            }
            Command::BatteryLevel(reply) => {
                let _ = reply.send(Err(err));
            }
            Command::DataSource { reply, .. } | Command::SetDataSource { reply, .. } => {
                let _ = reply.send(Err(err));
            }
            Command::RefreshSocketCam(reply) | Command::ToggleSocketCam(reply) => {
                let _ = reply.send(Err(err));
            }
            Command::SetTrigger { reply, .. } => {
                let _ = reply.send(Err(err));
            }
            Command::OpenScanView(reply) | Command::CloseScanView(reply) | Command::Close(reply) => {
                let _ = reply.send(Err(err));
            }
        }
    }
}

/// Result of the favorite check run on a device manager.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum FavoriteOutcome {
    /// The manager already had a favorite.
    Found(String),

    /// The manager had none; the configured favorite was written.
    Assigned(String),
}

/// Answer of a spawned property call.
#[derive(Debug)]
pub(crate) enum Outcome {
    FriendlyName {
        result: Result<String>,
        reply: Reply<String>,
    },
    Renamed {
        result: Result<String>,
        reply: Reply<String>,
    },
    BatteryLevel {
        result: Result<u32>,
        reply: Reply<u32>,
    },
    DataSource {
        result: Result<DataSource>,
        reply: Reply<DataSource>,
    },
    /// Raw status code read from the peer; `reply` is absent for
    /// refreshes the session started on its own.
    SocketCamStatus {
        result: Result<u8>,
        reply: Option<Reply<SocketCamStatus>>,
    },
    SocketCamToggled {
        requested: SocketCamStatus,
        result: Result<u8>,
        reply: Reply<SocketCamStatus>,
    },
    ScanViewOpened {
        result: Result<()>,
        reply: Reply<()>,
    },
    OverlayView {
        result: Result<()>,
    },
    Favorite {
        result: Result<FavoriteOutcome>,
    },
}

impl Outcome {
    /// Fail the originating request, if any, instead of applying the answer.
    pub(crate) fn discard(self, err: SessionError) {
        match self {
            Outcome::FriendlyName { reply, .. } | Outcome::Renamed { reply, .. } => {
                let _ = reply.send(Err(err));
            }
            Outcome::BatteryLevel { reply, .. } => {
                let _ = reply.send(Err(err));
            }
            Outcome::DataSource { reply, .. } => {
                let _ = reply.send(Err(err));
            }
            Outcome::SocketCamStatus { reply, .. } => {
                if let Some(reply) = reply {
                    let _ = reply.send(Err(err));
                }
            }
            Outcome::SocketCamToggled { reply, .. } => {
                let _ = reply.send(Err(err));
            }
            Outcome::ScanViewOpened { reply, .. } => {
                let _ = reply.send(Err(err));
            }
            Outcome::OverlayView { .. } | Outcome::Favorite { .. } => {}
        }
    }
}

/// A property call answer tagged with where it came from.
#[derive(Debug)]
pub(crate) struct Completion {
    /// Session epoch at the time the call was issued.
    pub epoch: u64,

    /// Device the call addressed; `None` for session level calls.
    pub guid: Option<Guid>,

    pub outcome: Outcome,
}

#[derive(Debug)]
pub(crate) enum SessionMessage {
    Command(Command),
    Completion(Completion),
}
