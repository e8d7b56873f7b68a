// Copyright 2026 Daniel Pelikan
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! QuadLink controller

use anyhow::Result;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use quadlink::bluetooth::{self, BluezTransport, LinkManager};
use quadlink::config::Config;
use quadlink::console::{ConsoleCommand, HELP};
use quadlink::events::EventProcessor;
use quadlink::keepalive::{FlightControls, KeepAlive};
use quadlink::state::ControllerState;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("quadlink=info".parse()?),
        )
        .init();

    info!("Starting QuadLink v{}...", env!("CARGO_PKG_VERSION"));

    // Load configuration
    let config = Config::load()?;
    info!("Configuration loaded, target {}", config.link.target_label());

    // Initialize Bluetooth transport
    let transport = BluezTransport::new().await?;

    let (event_tx, event_rx) = bluetooth::event_channel();
    let manager = LinkManager::new(transport, config.link.clone(), event_tx)?;

    // Handle link events
    let state = ControllerState::new();
    tokio::spawn(EventProcessor::new(state.clone()).run(event_rx));

    let controls = FlightControls::new();
    let keepalive = if config.keepalive.enabled {
        Some(KeepAlive::spawn(
            manager.clone(),
            controls.clone(),
            config.keepalive.interval(),
        ))
    } else {
        None
    };

    println!("{}", HELP);
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        tokio::select! {
            line = lines.next_line() => {
                let line = match line? {
                    Some(line) => line,
                    None => break,
                };

                let command = match ConsoleCommand::parse(&line) {
                    Ok(Some(command)) => command,
                    Ok(None) => continue,
                    Err(e) => {
                        warn!("{}", e);
                        continue;
                    }
                };

                match command {
                    ConsoleCommand::Connect => {
                        if let Err(e) = manager.connect().await {
                            error!("Connect failed: {}", e);
                        }
                    }
                    ConsoleCommand::Disconnect => manager.disconnect(),
                    ConsoleCommand::Status => {
                        println!(
                            "link: {} | device: {} | sent: {} B | received: {} B | last error: {}",
                            manager.state().as_str(),
                            state.get_device_name().unwrap_or_else(|| "-".to_string()),
                            state.bytes_sent(),
                            state.bytes_received(),
                            state.get_last_error().unwrap_or_else(|| "-".to_string()),
                        );
                    }
                    // Writes run off the console loop so a stalled peer
                    // cannot block disconnect or shutdown
                    ConsoleCommand::Send(text) => {
                        let manager = manager.clone();
                        tokio::spawn(async move {
                            if let Err(e) = manager.send_text(&text).await {
                                error!("Send failed: {}", e);
                            }
                        });
                    }
                    ConsoleCommand::Frame(frame) => {
                        controls.set(frame);
                        let manager = manager.clone();
                        tokio::spawn(async move {
                            if let Err(e) = manager
                                .send_flight_frame(frame.throttle, frame.yaw, frame.pitch, frame.roll)
                                .await
                            {
                                error!("Send failed: {}", e);
                            }
                        });
                    }
                    ConsoleCommand::Help => println!("{}", HELP),
                    ConsoleCommand::Quit => {
                        info!("Quit requested");
                        break;
                    }
                }
            }
            _ = tokio::signal::ctrl_c() => {
                info!("Shutdown signal received");
                break;
            }
        }
    }

    if let Some(keepalive) = keepalive {
        keepalive.stop();
    }
    manager.disconnect();

    info!("QuadLink stopped");
    Ok(())
}
