// Copyright 2025 RisingWave Labs
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

use std::fmt::{Display, Formatter};
use std::io::Read;

use anyhow::Context;
use serde::Serialize;

use crate::goroutine_dump::error::ParseError;
use crate::goroutine_dump::goroutine::Goroutine;
use crate::goroutine_dump::parser::parse;

/// Everything decoded from one dump. This is the JSON shape shared by the
/// command line tool, the wasm entry point and the golden test fixtures.
#[derive(Debug, Clone, Default, Serialize)]
pub struct DumpReport {
    /// Rendered [`ParseError`]s, in input order
    pub errors: Vec<String>,

    pub goroutines: Vec<Goroutine>,
}

impl DumpReport {
    pub fn from_parsed(goroutines: Vec<Goroutine>, errors: &[ParseError]) -> Self {
        Self {
            errors: errors.iter().map(ToString::to_string).collect(),
            goroutines,
        }
    }

    pub fn from_reader<R: Read>(reader: R) -> Self {
        let (goroutines, errors) = parse(reader);
        Self::from_parsed(goroutines, &errors)
    }

    pub fn to_json(&self) -> anyhow::Result<String> {
        serde_json::to_string(self).context("Failed to serialize dump report")
    }

    pub fn to_json_pretty(&self) -> anyhow::Result<String> {
        serde_json::to_string_pretty(self).context("Failed to serialize dump report")
    }
}

/// A short human readable summary, one line per error.
impl Display for DumpReport {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Goroutines parsed: {}", self.goroutines.len())?;
        writeln!(f, "Errors: {}", self.errors.len())?;
        for (i, error) in self.errors.iter().enumerate() {
            writeln!(f, "error {}: {}", i + 1, error)?;
        }
        Ok(())
    }
}
