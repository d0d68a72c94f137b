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

use std::time::Duration;

use tracing::debug;

use crate::goroutine_dump::goroutine::Goroutine;

pub(crate) const HEADER_PREFIX: &str = "goroutine ";
pub(crate) const LOCKED_TO_THREAD: &str = "locked to thread";
pub(crate) const WAIT_UNIT_MINUTES: &str = "minutes";

/// Splits a leading run of ASCII digits off `s`.
pub(crate) fn split_digits(s: &str) -> (&str, &str) {
    let end = s
        .bytes()
        .position(|c| !c.is_ascii_digit())
        .unwrap_or(s.len());
    s.split_at(end)
}

/// Parses a run of ASCII digits, rejecting empty input, signs and overflow.
pub(crate) fn parse_digits<T: std::str::FromStr>(s: &str) -> Option<T> {
    if s.is_empty() || !s.bytes().all(|c| c.is_ascii_digit()) {
        return None;
    }
    s.parse().ok()
}

/// Decodes a goroutine header line into a goroutine with an empty stack.
///
/// ```text
/// goroutine 1 [chan receive]:
/// goroutine 42 [select, 5 minutes, locked to thread]:
/// goroutine 18 gp=0xc000102380 m=4 mp=0xc000100008 [running]:
/// ```
///
/// The state is taken verbatim: runtime state names change between Go
/// versions, so no list of known states is kept.
pub(crate) fn parse_header(line: &str) -> Option<Goroutine> {
    let rest = line.strip_prefix(HEADER_PREFIX)?;
    let (id, mut rest) = split_digits(rest);
    let id = parse_digits::<u64>(id)?;

    // `key=value` annotations printed with GOTRACEBACK=system
    loop {
        rest = rest.strip_prefix(' ')?;
        if rest.starts_with('[') {
            break;
        }
        let (field, tail) = rest.split_once(' ')?;
        match field.split_once('=') {
            Some((key, value)) if !key.is_empty() && !value.is_empty() => {}
            _ => return None,
        }
        rest = tail;
    }

    let state_list = rest.strip_prefix('[')?.strip_suffix("]:")?;
    let mut parts = state_list.split(", ");
    let state = parts.next().filter(|s| !s.is_empty())?;

    let mut goroutine = Goroutine::new(id);
    goroutine.state = state.to_owned();

    let mut seen_wait = false;
    for part in parts {
        if goroutine.locked_to_thread {
            return None;
        }
        if part == LOCKED_TO_THREAD {
            goroutine.locked_to_thread = true;
            continue;
        }
        if seen_wait {
            return None;
        }
        seen_wait = true;
        goroutine.wait = parse_wait(part)?;
    }

    Some(goroutine)
}

/// `5 minutes` → 300s. A count with another unit is accepted but not
/// decoded, and yields zero. The runtime omits waits under a minute, so a
/// zero count is invalid.
fn parse_wait(clause: &str) -> Option<Duration> {
    let (count, unit) = clause.split_once(' ')?;
    let count = parse_digits::<u64>(count)?;
    if count == 0 || unit.is_empty() || unit.contains(' ') {
        return None;
    }
    if unit != WAIT_UNIT_MINUTES {
        debug!(clause, "ignoring wait clause with unsupported unit");
        return Some(Duration::ZERO);
    }
    count.checked_mul(60).map(Duration::from_secs)
}
