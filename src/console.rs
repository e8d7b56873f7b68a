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

//! Operator console commands.
//!
//! Maps lines typed on stdin to link actions.

use crate::bluetooth::FlightFrame;

/// Console command types.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConsoleCommand {
    /// Connect to the configured receiver.
    Connect,
    /// Drop the current link.
    Disconnect,
    /// Print link status.
    Status,
    /// Send a text message.
    Send(String),
    /// Set and send a flight frame.
    Frame(FlightFrame),
    /// Print the command list.
    Help,
    /// Leave the console.
    Quit,
}

impl ConsoleCommand {
    /// Parse a console line. Returns `Ok(None)` for blank lines.
    pub fn parse(line: &str) -> Result<Option<Self>, String> {
        let line = line.trim();
        if line.is_empty() {
            return Ok(None);
        }

        let (word, rest) = match line.split_once(char::is_whitespace) {
            Some((word, rest)) => (word, rest.trim()),
            None => (line, ""),
        };

        let command = match word.to_lowercase().as_str() {
            "connect" => Self::Connect,
            "disconnect" => Self::Disconnect,
            "status" => Self::Status,
            "help" | "?" => Self::Help,
            "quit" | "exit" => Self::Quit,
            "send" => {
                if rest.is_empty() {
                    return Err("usage: send <text>".to_string());
                }
                Self::Send(rest.to_string())
            }
            "frame" => Self::Frame(parse_frame(rest)?),
            other => return Err(format!("unknown command '{}'", other)),
        };

        Ok(Some(command))
    }
}

fn parse_frame(args: &str) -> Result<FlightFrame, String> {
    let values = args
        .split_whitespace()
        .map(|v| {
            v.parse::<i8>()
                .map_err(|_| format!("'{}' is not a value in -128..=127", v))
        })
        .collect::<Result<Vec<_>, _>>()?;

    match values.as_slice() {
        [throttle, yaw, pitch, roll] => Ok(FlightFrame::new(*throttle, *yaw, *pitch, *roll)),
        _ => Err("usage: frame <throttle> <yaw> <pitch> <roll>".to_string()),
    }
}

pub const HELP: &str = "\
commands:
  connect                               connect to the receiver
  disconnect                            drop the link
  status                                show link status
  send <text>                           send a text message
  frame <throttle> <yaw> <pitch> <roll> send a flight frame (-128..=127)
  quit                                  exit";
