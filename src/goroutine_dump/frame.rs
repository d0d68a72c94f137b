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

use crate::goroutine_dump::header::{parse_digits, split_digits};

const IN_GOROUTINE: &str = " in goroutine ";

/// Extracts the function name from a call line.
///
/// # Example Input:
/// - "main.main()" → "main.main"
/// - "runtime.goparkunlock(...)" → "runtime.goparkunlock"
/// - "net/http.(*persistConn).writeLoop(0xc0001a5c20)" → "net/http.(*persistConn).writeLoop"
///
/// The argument list is the last top-level parenthesized group, so receiver
/// syntax in the name is kept. Unbalanced or truncated lines are rejected.
pub(crate) fn parse_func(line: &str) -> Option<&str> {
    if !line.ends_with(')') {
        return None;
    }
    let mut depth = 0usize;
    let mut args_open = None;
    for (i, c) in line.bytes().enumerate() {
        match c {
            b'(' => {
                if depth == 0 {
                    args_open = Some(i);
                }
                depth += 1;
            }
            b')' => depth = depth.checked_sub(1)?,
            _ => {}
        }
    }
    if depth != 0 {
        return None;
    }
    let name = &line[..args_open?];
    valid_name(name).then_some(name)
}

/// Extracts the function name from the part of a created-by line after
/// `created by `, dropping the ` in goroutine N` suffix of Go 1.21+.
pub(crate) fn parse_created_by(rest: &str) -> Option<&str> {
    let name = match rest.rsplit_once(IN_GOROUTINE) {
        Some((name, id)) if parse_digits::<u64>(id).is_some() => name,
        _ => rest,
    };
    (valid_name(name) && !name.contains(char::is_whitespace)).then_some(name)
}

fn valid_name(name: &str) -> bool {
    !name.is_empty() && !name.starts_with(char::is_whitespace)
}

/// Parses a location line into its path and line number.
///
/// # Example Input:
/// - "\t/usr/local/go/src/net/http/server.go:2969 +0x36c"
/// - "\tC:\\go\\src\\runtime\\proc.go:250"
/// - "\t/usr/local/go/src/runtime/proc.go:398 +0x1d fp=0xc000053f58 sp=0xc000053f38 pc=0x43a5dd"
///
/// Paths may contain spaces and colons, so the separator is the last `:`
/// whose remainder is a valid line number and suffix.
pub(crate) fn parse_file(line: &str) -> Option<(&str, u32)> {
    let rest = line.strip_prefix('\t')?;
    if rest.starts_with('\t') {
        return None;
    }
    rest.rmatch_indices(':').find_map(|(colon, _)| {
        let file = &rest[..colon];
        if file.is_empty() {
            return None;
        }
        let (line_no, tail) = split_digits(&rest[colon + 1..]);
        let line_no = parse_digits::<u32>(line_no)?;
        valid_location_suffix(tail).then_some((file, line_no))
    })
}

/// Accepts `""`, `" +0x1f"` and either followed by ` key=value` fields.
fn valid_location_suffix(tail: &str) -> bool {
    if tail.is_empty() {
        return true;
    }
    let Some(tail) = tail.strip_prefix(' ') else {
        return false;
    };
    let mut fields = tail.split(' ').peekable();
    if let Some(pc) = fields.next_if(|f| f.starts_with('+')) {
        let hex = pc.strip_prefix("+0x").unwrap_or_default();
        if hex.is_empty() || !hex.bytes().all(|c| c.is_ascii_hexdigit()) {
            return false;
        }
    }
    fields.all(|field| {
        field
            .split_once('=')
            .is_some_and(|(key, value)| !key.is_empty() && !value.is_empty())
    })
}
