//! Command handlers for the govee CLI

use std::sync::Arc;
use std::time::Duration;

use govee_ble::BleTransport;
use govee_core::{Device, DeviceSnapshot, LedLight, Scanner};
use tracing::{info, warn};

use crate::cli::Commands;
use crate::config::AppConfig;
use crate::error::{CliError, Result};

/// Command dispatcher for handling CLI commands
pub struct CommandDispatcher;

impl CommandDispatcher {
    /// Execute a CLI command against the configured BLE adapter
    pub async fn execute(command: Commands, config: AppConfig) -> Result<()> {
        if command == Commands::Config {
            print_example_config();
            return Ok(());
        }

        let transport = Arc::new(BleTransport::with_config(config.ble.clone()).await?);
        let scanner = Scanner::with_config(transport, config.scanner.clone());
        Self::run(&scanner, command, &config).await
    }

    /// Execute a command using an existing scanner
    pub async fn run(scanner: &Scanner, command: Commands, config: &AppConfig) -> Result<()> {
        let json = config.cli.json_output;
        match command {
            Commands::Scan {
                duration,
                json: json_flag,
            } => {
                let duration = duration
                    .map(Duration::from_secs)
                    .unwrap_or_else(|| config.cli.scan_duration());
                Self::handle_scan(scanner, duration, json || json_flag).await
            }
            Commands::Find { address, timeout } => {
                let timeout = timeout
                    .map(Duration::from_secs)
                    .unwrap_or(config.scanner.find_timeout);
                let device = Self::resolve(scanner, &address, timeout).await?;
                println!("{}", render(&device.snapshot(), json)?);
                Ok(())
            }
            Commands::On { address } => {
                let device = Self::resolve(scanner, &address, config.scanner.find_timeout).await?;
                led_light(&device)?.turn_on().await?;
                Self::report(&device, json)
            }
            Commands::Off { address } => {
                let device = Self::resolve(scanner, &address, config.scanner.find_timeout).await?;
                led_light(&device)?.turn_off().await?;
                Self::report(&device, json)
            }
            Commands::Color {
                address,
                red,
                green,
                blue,
            } => {
                let device = Self::resolve(scanner, &address, config.scanner.find_timeout).await?;
                led_light(&device)?.set_color(red, green, blue).await?;
                Self::report(&device, json)
            }
            Commands::Brightness { address, percent } => {
                let device = Self::resolve(scanner, &address, config.scanner.find_timeout).await?;
                led_light(&device)?.set_brightness(percent).await?;
                Self::report(&device, json)
            }
            Commands::Config => {
                print_example_config();
                Ok(())
            }
        }
    }

    /// Handle the scan command
    async fn handle_scan(scanner: &Scanner, duration: Duration, json: bool) -> Result<()> {
        let subscription = scanner.on_discovered(move |event| {
            match render(&event.device.snapshot(), json) {
                Ok(line) => println!("{}", line),
                Err(e) => warn!("Failed to render {}: {}", event.device, e),
            }
        });

        scanner.start().await?;
        info!("Scanning for {} seconds (Ctrl-C to stop)", duration.as_secs());

        let waited = tokio::select! {
            _ = tokio::time::sleep(duration) => Ok(()),
            interrupted = tokio::signal::ctrl_c() => {
                info!("Interrupted");
                interrupted
            }
        };

        // Stop before surfacing a signal error so the session is always closed
        let stopped = scanner.stop().await;
        subscription.unsubscribe();
        waited?;
        stopped?;

        if !json {
            println!("{} light(s) found", scanner.known_devices().len());
        }
        Ok(())
    }

    async fn resolve(scanner: &Scanner, address: &str, timeout: Duration) -> Result<Arc<Device>> {
        info!("Looking for {}", address);
        scanner
            .find_by_address(address, timeout)
            .await?
            .ok_or_else(|| CliError::DeviceNotFound {
                address: address.to_string(),
            })
    }

    fn report(device: &Device, json: bool) -> Result<()> {
        println!("{}", render(&device.snapshot(), json)?);
        Ok(())
    }
}

fn print_example_config() {
    print!("{}", AppConfig::example_config());
}

fn led_light(device: &Device) -> Result<&LedLight> {
    device
        .as_led_light()
        .ok_or_else(|| CliError::NotControllable {
            address: device.address().to_string(),
        })
}

/// One output line for a device
fn render(snapshot: &DeviceSnapshot, json: bool) -> Result<String> {
    if json {
        return Ok(serde_json::to_string(snapshot)?);
    }

    let mut line = format!(
        "{}  {}  {}",
        snapshot.address,
        snapshot.model,
        snapshot.name.as_deref().unwrap_or("-")
    );
    if let Some(rssi) = snapshot.rssi {
        line.push_str(&format!("  {} dBm", rssi));
    }
    if let Some(light) = &snapshot.light {
        if let Some(on) = light.on {
            line.push_str(if on { "  on" } else { "  off" });
        }
        if let Some(brightness) = light.brightness {
            line.push_str(&format!("  {}%", brightness));
        }
        if let Some(color) = light.color {
            line.push_str(&format!("  {}", color));
        }
    }
    Ok(line)
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use async_trait::async_trait;
    use govee_core::{
        encode_brightness_frame, encode_color_frame, encode_power_frame, Advertisement,
        AdvertisementSink, AdvertisementSource, CommandTransport, DeviceVariant, Frame, GoveeError,
        LightState, SessionId, TransportError,
    };
    use uuid::Uuid;

    use super::*;

    const ADDRESS: &str = "A4:C1:38:AA:BB:01";

    /// Radio that answers every scan session with one light advertisement
    #[derive(Default)]
    struct OneLightRadio {
        sessions: Mutex<Vec<(SessionId, AdvertisementSink)>>,
        next_session: Mutex<u64>,
        writes: Mutex<Vec<Frame>>,
    }

    impl OneLightRadio {
        fn open_sessions(&self) -> usize {
            self.sessions.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl AdvertisementSource for OneLightRadio {
        async fn start_session(&self, sink: AdvertisementSink) -> std::result::Result<SessionId, TransportError> {
            let _ = sink.send(
                Advertisement::new(ADDRESS)
                    .with_name("ihoment_H6170_BB01")
                    .with_rssi(-58),
            );
            let session = {
                let mut next = self.next_session.lock().unwrap();
                *next += 1;
                SessionId(*next)
            };
            self.sessions.lock().unwrap().push((session, sink));
            Ok(session)
        }

        async fn stop_session(&self, session: SessionId) -> std::result::Result<(), TransportError> {
            let mut sessions = self.sessions.lock().unwrap();
            let before = sessions.len();
            sessions.retain(|(id, _)| *id != session);
            if sessions.len() == before {
                return Err(TransportError::UnknownSession { session: session.0 });
            }
            Ok(())
        }
    }

    #[async_trait]
    impl CommandTransport for OneLightRadio {
        async fn write_command(
            &self,
            _address: &str,
            _characteristic: Uuid,
            frame: &Frame,
        ) -> std::result::Result<(), TransportError> {
            self.writes.lock().unwrap().push(*frame);
            Ok(())
        }
    }

    fn setup() -> (Arc<OneLightRadio>, Scanner) {
        let radio = Arc::new(OneLightRadio::default());
        let scanner = Scanner::new(radio.clone());
        (radio, scanner)
    }

    #[tokio::test]
    async fn test_light_commands_write_frames() {
        let (radio, scanner) = setup();
        let config = AppConfig::default();

        for command in [
            Commands::On {
                address: ADDRESS.to_lowercase(),
            },
            Commands::Color {
                address: ADDRESS.to_string(),
                red: 255,
                green: 0,
                blue: 0,
            },
            Commands::Brightness {
                address: ADDRESS.to_string(),
                percent: 50,
            },
        ] {
            CommandDispatcher::run(&scanner, command, &config)
                .await
                .unwrap();
        }

        assert_eq!(
            *radio.writes.lock().unwrap(),
            vec![
                encode_power_frame(true),
                encode_color_frame(255, 0, 0),
                encode_brightness_frame(50).unwrap(),
            ]
        );
    }

    #[tokio::test]
    async fn test_invalid_brightness_reports_core_error() {
        let (radio, scanner) = setup();
        let err = CommandDispatcher::run(
            &scanner,
            Commands::Brightness {
                address: ADDRESS.to_string(),
                percent: 150,
            },
            &AppConfig::default(),
        )
        .await
        .unwrap_err();

        assert!(matches!(
            err,
            CliError::Core(GoveeError::InvalidBrightness { value: 150 })
        ));
        assert!(radio.writes.lock().unwrap().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_unknown_address_not_found() {
        let (_radio, scanner) = setup();
        let err = CommandDispatcher::run(
            &scanner,
            Commands::Find {
                address: "AA:BB:CC:DD:EE:FF".to_string(),
                timeout: Some(1),
            },
            &AppConfig::default(),
        )
        .await
        .unwrap_err();

        assert!(matches!(err, CliError::DeviceNotFound { .. }));
    }

    #[tokio::test(start_paused = true)]
    async fn test_scan_closes_its_session() {
        let (radio, scanner) = setup();
        CommandDispatcher::run(
            &scanner,
            Commands::Scan {
                duration: Some(1),
                json: true,
            },
            &AppConfig::default(),
        )
        .await
        .unwrap();

        assert!(!scanner.is_scanning().await);
        assert_eq!(radio.open_sessions(), 0);
        assert_eq!(scanner.known_devices().len(), 1);
    }

    #[test]
    fn test_render_text_line() {
        let mut snapshot = DeviceSnapshot {
            address: ADDRESS.to_string(),
            model: "H6170".to_string(),
            variant: DeviceVariant::LedLight,
            name: Some("ihoment_H6170_BB01".to_string()),
            rssi: Some(-58),
            light: Some(LightState::default()),
        };
        assert_eq!(
            render(&snapshot, false).unwrap(),
            "A4:C1:38:AA:BB:01  H6170  ihoment_H6170_BB01  -58 dBm"
        );

        snapshot.light = Some(LightState {
            on: Some(true),
            brightness: Some(40),
            color: None,
        });
        assert!(render(&snapshot, false).unwrap().ends_with("  on  40%"));
        assert!(render(&snapshot, true).unwrap().starts_with('{'));
    }
}
