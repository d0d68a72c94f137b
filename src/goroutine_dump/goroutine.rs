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

use std::fmt::{Display, Formatter, Write};
use std::time::Duration;

use itertools::Itertools;
use serde::{Serialize, Serializer};

use crate::goroutine_dump::header::{LOCKED_TO_THREAD, WAIT_UNIT_MINUTES};
use crate::goroutine_dump::parser::{ANCESTOR_PREFIX, CREATED_BY_PREFIX, FRAMES_ELIDED};

/// A single stack location: the function being executed and where.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Frame {
    /// Fully qualified name, e.g. `net/http.(*persistConn).writeLoop`
    pub function: String,

    /// Source path as printed by the runtime, possibly drive-qualified
    pub file: String,

    /// 1-based source line
    pub line: u32,
}

impl Frame {
    pub fn new(function: impl Into<String>, file: impl Into<String>, line: u32) -> Self {
        Self {
            function: function.into(),
            file: file.into(),
            line,
        }
    }
}

/// One goroutine of a dump.
///
/// Ancestors decoded from `[originating from goroutine N]:` sections have an
/// empty `state` and zero `wait`, since the runtime prints neither for them,
/// and never carry ancestors of their own.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Goroutine {
    pub id: u64,

    pub state: String,

    /// Time spent in `state`. The runtime reports whole minutes only.
    #[serde(rename = "wait_ns", serialize_with = "serialize_wait_ns")]
    pub wait: Duration,

    pub locked_to_thread: bool,

    /// Innermost call first
    pub stack: Vec<Frame>,

    /// Set when the runtime cut the middle of a deep stack
    pub frames_elided: bool,

    pub created_by: Option<Frame>,

    /// Nearest first
    pub ancestors: Vec<Goroutine>,
}

fn serialize_wait_ns<S: Serializer>(wait: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_u64(u64::try_from(wait.as_nanos()).unwrap_or(u64::MAX))
}

impl Goroutine {
    pub(crate) fn new(id: u64) -> Self {
        Self {
            id,
            ..Default::default()
        }
    }

    /// No frames, elision marker or creation site were decoded.
    pub(crate) fn is_empty(&self) -> bool {
        self.stack.is_empty() && !self.frames_elided && self.created_by.is_none()
    }
}

/// Renders the goroutine the way the runtime prints it. Argument values are
/// not kept by the parser, so every call is printed as `name(...)`.
impl Display for Goroutine {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        fn fmt_body(f: &mut Formatter<'_>, g: &Goroutine) -> std::fmt::Result {
            for frame in &g.stack {
                writeln!(f, "{}(...)", frame.function)?;
                writeln!(f, "\t{}:{}", frame.file, frame.line)?;
            }
            if g.frames_elided {
                writeln!(f, "{FRAMES_ELIDED}")?;
            }
            if let Some(created_by) = &g.created_by {
                writeln!(f, "{CREATED_BY_PREFIX}{}", created_by.function)?;
                writeln!(f, "\t{}:{}", created_by.file, created_by.line)?;
            }
            Ok(())
        }

        let wait_minutes = self.wait.as_secs() / 60;
        let state_list = std::iter::once(self.state.clone())
            .chain((wait_minutes > 0).then(|| format!("{wait_minutes} {WAIT_UNIT_MINUTES}")))
            .chain(self.locked_to_thread.then(|| LOCKED_TO_THREAD.to_owned()))
            .join(", ");

        write!(f, "goroutine {} [", self.id)?;
        f.write_str(&state_list)?;
        f.write_str("]:")?;
        f.write_char('\n')?;
        fmt_body(f, self)?;
        for ancestor in &self.ancestors {
            writeln!(f, "{ANCESTOR_PREFIX}{}]:", ancestor.id)?;
            fmt_body(f, ancestor)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use anyhow::Result;
    use pretty_assertions::assert_eq;

    use super::{Frame, Goroutine};
    use crate::goroutine_dump::parse;

    fn sample() -> Goroutine {
        Goroutine {
            id: 42,
            state: "select".to_owned(),
            wait: Duration::from_secs(5 * 60),
            locked_to_thread: true,
            stack: vec![
                Frame::new("runtime.gopark", "/usr/local/go/src/runtime/proc.go", 398),
                Frame::new(
                    "net/http.(*persistConn).writeLoop",
                    "/usr/local/go/src/net/http/transport.go",
                    2421,
                ),
            ],
            frames_elided: false,
            created_by: Some(Frame::new(
                "net/http.(*Transport).dialConn",
                "/usr/local/go/src/net/http/transport.go",
                1777,
            )),
            ancestors: vec![],
        }
    }

    #[test]
    fn test_display_goroutine() {
        let expected = "goroutine 42 [select, 5 minutes, locked to thread]:\n\
            runtime.gopark(...)\n\
            \t/usr/local/go/src/runtime/proc.go:398\n\
            net/http.(*persistConn).writeLoop(...)\n\
            \t/usr/local/go/src/net/http/transport.go:2421\n\
            created by net/http.(*Transport).dialConn\n\
            \t/usr/local/go/src/net/http/transport.go:1777\n";
        assert_eq!(sample().to_string(), expected);
    }

    #[test]
    fn test_display_parses_back() -> Result<()> {
        let mut g = sample();
        g.frames_elided = true;
        g.ancestors = vec![
            Goroutine {
                id: 7,
                stack: vec![Frame::new("main.spawn", "/src/main.go", 12)],
                created_by: Some(Frame::new("main.main", "/src/main.go", 30)),
                ..Default::default()
            },
            Goroutine {
                id: 1,
                stack: vec![Frame::new("main.main", "/src/main.go", 28)],
                ..Default::default()
            },
        ];

        let text = g.to_string();
        let (goroutines, errors) = parse(text.as_bytes());
        assert!(errors.is_empty(), "{errors:?}");
        assert_eq!(goroutines, vec![g]);
        Ok(())
    }

    #[test]
    fn test_display_ancestors_in_order() {
        let mut g = Goroutine::new(3);
        g.state = "running".to_owned();
        g.ancestors = vec![Goroutine::new(2), Goroutine::new(1)];
        assert_eq!(
            g.to_string(),
            "goroutine 3 [running]:\n\
             [originating from goroutine 2]:\n\
             [originating from goroutine 1]:\n"
        );
    }

    #[test]
    fn test_serialize_field_names() -> Result<()> {
        let value = serde_json::to_value(sample())?;
        assert_eq!(value["id"], 42);
        assert_eq!(value["wait_ns"], 300_000_000_000u64);
        assert_eq!(value["locked_to_thread"], true);
        assert_eq!(value["stack"][1]["function"], "net/http.(*persistConn).writeLoop");
        assert_eq!(value["created_by"]["line"], 1777);
        assert_eq!(value["ancestors"], serde_json::json!([]));
        Ok(())
    }
}
