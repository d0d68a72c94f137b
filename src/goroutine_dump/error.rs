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

use thiserror::Error;

/// Why a goroutine block could not be decoded.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseErrorKind {
    #[error("invalid goroutine header")]
    InvalidHeader,

    #[error("invalid function call")]
    InvalidFunctionCall,

    #[error("invalid file:line ref")]
    InvalidFileLineRef,

    /// The block was cut off where a location line was required.
    #[error("unexpected end of input")]
    UnexpectedEnd,

    #[error("failed to read input: {0}")]
    Read(String),
}

/// A decoding failure of one goroutine block. Other blocks are unaffected.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{line}: {kind}: {content:?}")]
pub struct ParseError {
    /// 1-based line number
    pub line: usize,
    pub kind: ParseErrorKind,
    /// Text of the offending line, empty at end of input
    pub content: String,
}

impl ParseError {
    pub(crate) fn new(line: usize, kind: ParseErrorKind, content: impl Into<String>) -> Self {
        Self {
            line,
            kind,
            content: content.into(),
        }
    }
}
