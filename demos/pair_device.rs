//! Walk through the pairing panel: scan, connect, read, spray, disconnect.
//!
//! Run with: cargo run --example pair_device

use std::time::Duration;
use vera_shield_ble::{BluetoothService, PairingPanel, Result, ToastVariant};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("vera_shield_ble=debug".parse().unwrap()),
        )
        .init();

    let service = BluetoothService::instance();

    let (panel, mut toasts) = PairingPanel::new(service);
    let mut panel = panel.with_scan_timeout(service.config().scan_timeout);
    panel.on_connect(|name| println!("\n>>> Paired with {}", name));

    // Print toasts as they arrive
    let toast_printer = tokio::spawn(async move {
        while let Some(toast) = toasts.recv().await {
            let marker = match toast.variant {
                ToastVariant::Default => "i",
                ToastVariant::Destructive => "!",
            };
            println!("[{}] {}: {}", marker, toast.title, toast.description);
        }
    });

    println!("Scanning for repellent devices...");
    panel.scan_for_devices().await;

    let view = panel.view();
    if view.show_disabled_banner {
        println!("Bluetooth Disabled. Please enable Bluetooth in your device settings");
    }

    println!("\nAvailable Devices:");
    for row in &view.devices {
        println!("  {} [{:?}]  {}", row.name, row.signal_color, row.detail);
    }
    if view.show_empty_state {
        println!("  No devices found. Make sure your device is in pairing mode.");
        println!("  Looking for VeraShield and compatible BLE devices");
    }

    if let Some(device) = panel.available_devices().first().cloned() {
        panel.connect_to_device(&device).await;

        if service.is_connected() {
            let data = service.device_data();
            println!("\nDevice data:");
            println!("  Battery:    {:?}%", data.battery_level);
            println!("  Intensity:  {:?}", data.spray_intensity);
            println!("  Active:     {:?}", data.is_active);
            println!("  Mode:       {:?}", data.device_mode);
            println!("  Sprays:     {:?}", data.spray_count);
            println!("  Schedule:   {}", data.scheduled_time_strings().join(", "));
            println!("  Firmware:   {:?}", data.firmware_version);

            if let Err(e) = service.send_default_spray_command().await {
                println!("Spray failed: {}", e);
            }

            tokio::time::sleep(Duration::from_secs(1)).await;
            let data = service.refresh_device_data().await;
            println!("  Last spray: {:?}", data.last_spray_time);

            service.disconnect_device().await?;
        }
    }

    drop(panel);
    let _ = toast_printer.await;

    println!("\nDone!");
    Ok(())
}
