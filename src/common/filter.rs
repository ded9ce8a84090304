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

use serde::{Deserialize, Serialize};

use super::DiscoveredDevice;

/// Name fragments advertised by the arm firmware variants we know about.
pub const DEFAULT_NAME_KEYWORDS: [&str; 5] =
    ["esp", "u-arm", "uarm", "arduino", "bluetooth"];

/// Case-insensitive substring match on advertised device names.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct NameFilter {
    keywords: Vec<String>,
}

impl NameFilter {
    pub fn new<I, S>(keywords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        NameFilter {
            keywords: keywords
                .into_iter()
                .map(|keyword| keyword.as_ref().to_lowercase())
                .collect(),
        }
    }

    pub fn keywords(&self) -> &[String] {
        &self.keywords
    }

    /// Nameless advertisements never match.
    pub fn matches(&self, name: Option<&str>) -> bool {
        let Some(name) = name else {
            return false;
        };
        let name = name.to_lowercase();
        self.keywords
            .iter()
            .any(|keyword| name.contains(&keyword.to_lowercase()))
    }

    pub fn matches_device(&self, device: &DiscoveredDevice) -> bool {
        self.matches(device.name())
    }
}

impl Default for NameFilter {
    fn default() -> Self {
        NameFilter::new(DEFAULT_NAME_KEYWORDS)
    }
}
