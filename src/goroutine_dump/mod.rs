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

//! Goroutine dump format
//!
//! <https://github.com/golang/go/blob/master/src/runtime/traceback.go>
//!
//! Printed by `runtime.Stack(buf, true)`, `debug.Stack()`, `SIGQUIT`, and by a
//! program that panics or hits a fatal error:
//!
//! ```text
//! goroutine 1 [chan receive, 5 minutes]:
//! main.main()
//!     /src/example/main.go:21 +0x6a
//!
//! goroutine 23 [IO wait, locked to thread]:
//! internal/poll.runtime_pollWait(0x7f1c5c2e0e98, 0x72)
//!     /usr/local/go/src/runtime/netpoll.go:343 +0x85
//! net/http.(*persistConn).readLoop(0xc0001a5c20)
//!     /usr/local/go/src/net/http/transport.go:2205 +0xd25
//! created by net/http.(*Transport).dialConn in goroutine 22
//!     /usr/local/go/src/net/http/transport.go:1776 +0x169f
//! ```
//!
//! Location lines are indented with a single tab in the real output.
//!
//! With `GODEBUG=tracebackancestors=N` a goroutine is followed by the traces
//! of the goroutines that created it:
//!
//! ```text
//! [originating from goroutine 22]:
//! net/http.(*Transport).dialConnFor(...)
//!     /usr/local/go/src/net/http/transport.go:1467 +0x4f
//! ```

mod error;
mod frame;
mod goroutine;
mod header;
mod lines;
mod parser;
mod report;

pub use error::*;
pub use goroutine::*;
pub use parser::parse;
pub use report::*;
