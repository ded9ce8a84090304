// Copyright 2023 Google LLC
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     https://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use std::{
    error::Error,
    io::{self, Write},
    sync::Arc,
};

use async_trait::async_trait;
use tokio::io::{AsyncBufReadExt, BufReader};

extern crate uarm_link;

use uarm_link::{
    api::{NoRuntimePermissions, RemediationPrompt},
    AdapterUnavailableReason, ArmCommand, EndpointConfig, ManagerConfig,
    Platform, RemediationChoice,
};

/// Asks on stdout, reads the answer from stdin.
struct ConsolePrompt;

fn ask(question: &str) -> io::Result<String> {
    print!("{}", question);
    io::stdout().flush()?;
    let mut answer = String::new();
    io::stdin().read_line(&mut answer)?;
    Ok(answer.trim().to_lowercase())
}

#[async_trait]
impl RemediationPrompt for ConsolePrompt {
    async fn permission_denied(&self) {
        println!("Bluetooth permission is required to connect to your U-ARM device.");
    }

    async fn adapter_unavailable(
        &self,
        reason: AdapterUnavailableReason,
    ) -> RemediationChoice {
        println!("{}: {}", reason.title(), reason.message());
        let answer = tokio::task::spawn_blocking(|| {
            ask("[r]etry, open [s]ettings or [c]ancel? ")
        })
        .await;
        match answer {
            Ok(Ok(answer)) if answer.starts_with('r') => RemediationChoice::Retry,
            Ok(Ok(answer)) if answer.starts_with('s') => {
                RemediationChoice::OpenSettings
            }
            _ => RemediationChoice::Cancel,
        }
    }
}

fn usage() {
    println!("Commands: A1 A2 A3 B1 B2 B3, info, uuid <service> <characteristic>, quit");
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    env_logger::init();

    let config = match std::env::args().nth(1) {
        Some(path) => ManagerConfig::from_json(&std::fs::read_to_string(path)?)?,
        None => ManagerConfig::default(),
    };
    let manager = Platform::connection_manager(
        Arc::new(NoRuntimePermissions),
        Arc::new(ConsolePrompt),
        config,
    )
    .await?;

    manager.initialize().await?;
    println!("Scanning for arm controllers...");
    let device = manager.scan_for_arm().await?;
    println!(
        "Found {} ({})",
        device.name().unwrap_or("unnamed"),
        device.id()
    );
    let info = manager.connect(&device).await?;
    println!("Connected, {} services discovered.", info.services.len());
    usage();

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let mut words = line.split_whitespace();
        match words.next() {
            None => continue,
            Some("quit") => break,
            Some("info") => match manager.device_info().await {
                Some(info) => println!("{}", serde_json::to_string_pretty(&info)?),
                None => println!("Not connected."),
            },
            Some("uuid") => {
                let (Some(service), Some(characteristic)) = (words.next(), words.next())
                else {
                    usage();
                    continue;
                };
                match EndpointConfig::parse(service, characteristic) {
                    Ok(endpoint) => manager.set_endpoint_configuration(endpoint),
                    Err(err) => println!("{}", err),
                }
            }
            Some(word) => match word.parse::<ArmCommand>() {
                Ok(command) => {
                    if let Err(err) = manager.send_arm_command(command).await {
                        println!("{} failed: {}", command, err);
                    }
                }
                Err(err) => {
                    println!("{}", err);
                    usage();
                }
            },
        }
    }

    manager.teardown().await;
    Ok(())
}
