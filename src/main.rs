use anyhow::Context;
use toy_hub_controller::domain::models::{AppEvent, BluetoothAddress, ControllerFamily};
use toy_hub_controller::domain::settings::SettingsService;
use toy_hub_controller::infrastructure::bluetooth::StartMode;
use toy_hub_controller::infrastructure::logging::init_logger;
use tracing::{error, info, warn};

/// `hub_monitor [ADDRESS [FAMILY]]`
///
/// Without an address the first recognized controller is used.
fn parse_start(settings: &SettingsService) -> anyhow::Result<StartMode> {
    let mut args = std::env::args().skip(1);
    let Some(address) = args.next() else {
        return Ok(StartMode::Scan);
    };
    let address: BluetoothAddress = address.parse()?;

    let family = match args.next() {
        Some(family) => family.parse::<ControllerFamily>().map_err(anyhow::Error::msg)?,
        None => settings
            .get()
            .identity_filters()
            .iter()
            .find(|identity| identity.oui == address.oui())
            .map(|identity| identity.family)
            .with_context(|| format!("Cannot tell the controller family of {}", address))?,
    };
    Ok(StartMode::Address(address, family))
}

#[cfg_attr(not(windows), allow(dead_code))]
fn report(event: AppEvent) {
    match event {
        AppEvent::Hub(event) => info!("{}", event),
        AppEvent::DeviceFound(device) => {
            info!("Found {} \"{}\" at {}", device.family, device.name, device.address)
        }
        AppEvent::SessionState(state) => info!("Session: {}", state),
        AppEvent::WriteFailed(reason) => warn!("{}", reason),
        AppEvent::LogMessage(message) => info!("[{:?}] {}", message.severity, message.message),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let settings = SettingsService::new()?;
    let _guard = init_logger(&settings.get().log_settings)?;
    info!("Starting Hub Monitor");

    let start = parse_start(&settings)?;
    run(&settings, start).await
}

#[cfg(windows)]
async fn run(settings: &SettingsService, start: StartMode) -> anyhow::Result<()> {
    use tokio::sync::mpsc;
    use toy_hub_controller::infrastructure::bluetooth::winrt::WinRtTransport;
    use toy_hub_controller::infrastructure::bluetooth::BluetoothService;

    let (transport, transport_events) = WinRtTransport::new();
    let (event_tx, mut event_rx) = mpsc::unbounded_channel();
    let (service, handle) = BluetoothService::new(transport, settings.get(), event_tx);

    tokio::spawn(async move {
        while let Some(event) = event_rx.recv().await {
            report(event);
        }
    });

    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Ctrl-C received, disconnecting");
            handle.shutdown();
        }
    });

    if let Err(e) = service.run(start, transport_events).await {
        error!("Bluetooth service stopped: {}", e);
        return Err(e.into());
    }
    Ok(())
}

#[cfg(not(windows))]
async fn run(_settings: &SettingsService, _start: StartMode) -> anyhow::Result<()> {
    anyhow::bail!("No BLE transport available on this platform")
}
