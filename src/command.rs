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

//! The command alphabet understood by the arm firmware: one letter for the
//! motor, one digit for the movement.

use std::{fmt, str::FromStr};

use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Motor {
    A,
    B,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MotorAction {
    Up,
    Rotate,
    Down,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ArmCommand {
    pub motor: Motor,
    pub action: MotorAction,
}

#[derive(Error, Debug, PartialEq, Eq)]
#[error("unknown arm command: {0:?}")]
pub struct UnknownCommand(pub String);

impl ArmCommand {
    pub const ALL: [ArmCommand; 6] = [
        ArmCommand::new(Motor::A, MotorAction::Up),
        ArmCommand::new(Motor::A, MotorAction::Rotate),
        ArmCommand::new(Motor::A, MotorAction::Down),
        ArmCommand::new(Motor::B, MotorAction::Up),
        ArmCommand::new(Motor::B, MotorAction::Rotate),
        ArmCommand::new(Motor::B, MotorAction::Down),
    ];

    pub const fn new(motor: Motor, action: MotorAction) -> Self {
        ArmCommand { motor, action }
    }

    /// Wire form, e.g. `"A1"`.
    pub fn as_str(&self) -> &'static str {
        match (self.motor, self.action) {
            (Motor::A, MotorAction::Up) => "A1",
            (Motor::A, MotorAction::Rotate) => "A2",
            (Motor::A, MotorAction::Down) => "A3",
            (Motor::B, MotorAction::Up) => "B1",
            (Motor::B, MotorAction::Rotate) => "B2",
            (Motor::B, MotorAction::Down) => "B3",
        }
    }
}

impl fmt::Display for ArmCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ArmCommand {
    type Err = UnknownCommand;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        ArmCommand::ALL
            .into_iter()
            .find(|command| command.as_str().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| UnknownCommand(String::from(s)))
    }
}
