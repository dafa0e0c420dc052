//! Capture session demo.
//!
//! Runs a session against the in-memory peer and walks through a typical
//! scanner lifecycle: devices arrive, scan, report battery, and leave.
//! Every step prints the published session snapshot as JSON.
//!
//! ```text
//! capture-demo [CONFIG.json]
//! CAPTURE_LOG=capture_session=debug capture-demo
//! ```

use std::time::Duration;

use anyhow::{Context, Result, bail};
use capture_core::constants::{
    DATA_SOURCE_EAN13, DEVICE_TYPE_READER_D600, DEVICE_TYPE_SCANNER_S740,
    DEVICE_TYPE_SOCKETCAM_C820,
};
use capture_core::{DataSourceStatus, DeviceType, HostPlatform, TriggerMode};
use capture_peer::AppCredentials;
use capture_peer::mock::MockPeer;
use capture_session::{CaptureSession, SessionConfig, SessionHandle, SessionSnapshot};
use tracing::info;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

const LOG_ENV: &str = "CAPTURE_LOG";
const STEP_TIMEOUT: Duration = Duration::from_secs(5);

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| "info".into()))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = load_config()?;
    config.validate().context("invalid session configuration")?;

    let (peer, hardware) = MockPeer::new();
    let mut session = CaptureSession::new(peer, config);
    let handle = session.handle();
    session.open().await.context("failed to open capture session")?;
    let task = tokio::spawn(session.run());
    print_step("open", &handle.snapshot())?;

    let scanner = hardware
        .arrive_device("Socket S740", DeviceType::new(DEVICE_TYPE_SCANNER_S740))
        .await?;
    let snapshot = wait_for(&handle, |s| s.active_device.is_some()).await?;
    print_step("scanner arrival", &snapshot)?;

    hardware.decode(&scanner, b"4006381333931", 7, "EAN 13").await?;
    let snapshot = wait_for(&handle, |s| s.decoded.is_some()).await?;
    print_step("decode", &snapshot)?;

    let level = handle.battery_level().await?;
    info!(level, "Battery level");
    let name = handle.set_friendly_name("Front Desk").await?;
    info!(name = %name, "Friendly name");
    let data_source = handle
        .set_data_source(DATA_SOURCE_EAN13, DataSourceStatus::Disable)
        .await?;
    info!(id = data_source.id, status = ?data_source.status, "Data source");
    print_step("properties", &handle.snapshot())?;

    let status = handle.toggle_socketcam().await?;
    info!(status = %status, "SocketCam toggled");
    let camera = hardware
        .arrive_device("SocketCam C820", DeviceType::new(DEVICE_TYPE_SOCKETCAM_C820))
        .await?;
    wait_for(&handle, |s| s.socketcam_device.is_some()).await?;
    handle.set_trigger(TriggerMode::Start).await?;
    handle.open_scan_view().await?;
    hardware.decode(&camera, b"https://example.com", 26, "QR Code").await?;
    let snapshot = wait_for(&handle, |s| !s.scan_view_open).await?;
    print_step("socketcam scan", &snapshot)?;

    let manager = hardware
        .arrive_manager("Socket Device Manager", DeviceType::new(DEVICE_TYPE_READER_D600))
        .await?;
    let snapshot = wait_for(&handle, |s| s.device_manager.is_some()).await?;
    print_step("device manager arrival", &snapshot)?;

    hardware.remove_device(&scanner).await?;
    hardware.remove_manager(&manager).await?;
    let snapshot = wait_for(&handle, |s| s.active_device.is_none() && s.device_manager.is_none()).await?;
    print_step("removals", &snapshot)?;

    handle.close().await?;
    task.await.context("session task panicked")??;
    print_step("close", &handle.snapshot())?;

    Ok(())
}

/// Configuration from the path given as first argument, or demo defaults.
fn load_config() -> Result<SessionConfig> {
    match std::env::args().nth(1) {
        Some(path) => SessionConfig::from_json_file(&path)
            .with_context(|| format!("failed to load configuration from {path}")),
        None => Ok(SessionConfig::new(
            HostPlatform::detect(),
            AppCredentials::new("ios:com.example.capture-demo", "demo-developer", "demo-key"),
        )),
    }
}

async fn wait_for(
    handle: &SessionHandle,
    predicate: impl FnMut(&SessionSnapshot) -> bool,
) -> Result<SessionSnapshot> {
    let mut rx = handle.subscribe();
    let snapshot = match tokio::time::timeout(STEP_TIMEOUT, rx.wait_for(predicate)).await {
        Ok(Ok(snapshot)) => snapshot.clone(),
        Ok(Err(_)) => bail!("session stopped"),
        Err(_) => bail!("timed out after {STEP_TIMEOUT:?}; last status: {}", handle.snapshot().status),
    };
    Ok(snapshot)
}

fn print_step(step: &str, snapshot: &SessionSnapshot) -> Result<()> {
    println!("== {step}");
    println!("{}", serde_json::to_string_pretty(snapshot)?);
    Ok(())
}
