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

use std::io::{BufReader, Read};

use tracing::{debug, trace};

use crate::goroutine_dump::error::{ParseError, ParseErrorKind};
use crate::goroutine_dump::frame::{parse_created_by, parse_file, parse_func};
use crate::goroutine_dump::goroutine::{Frame, Goroutine};
use crate::goroutine_dump::header::{parse_digits, parse_header, HEADER_PREFIX};
use crate::goroutine_dump::lines::{Line, Lines};

pub(crate) const CREATED_BY_PREFIX: &str = "created by ";
pub(crate) const ANCESTOR_PREFIX: &str = "[originating from goroutine ";
pub(crate) const FRAMES_ELIDED: &str = "...additional frames elided...";
const STACK_UNAVAILABLE_SUFFIX: &str = "stack unavailable";

/// Parses a goroutine dump, e.g. the output of `runtime.Stack(buf, true)` or
/// the trace printed by a crashing Go program.
///
/// Every goroutine block either ends up in the first vector or contributes
/// exactly one error to the second, so a malformed block never hides the
/// blocks after it. Both vectors follow input order. Never panics.
pub fn parse<R: Read>(reader: R) -> (Vec<Goroutine>, Vec<ParseError>) {
    let mut parser = Parser::default();

    for line in Lines::new(BufReader::new(reader)) {
        match line {
            Ok(line) => parser.feed(&line),
            Err(e) => {
                parser.record(ParseError::new(
                    parser.lines_read + 1,
                    ParseErrorKind::Read(e.to_string()),
                    "",
                ));
                break;
            }
        }
    }

    parser.finish()
}

/// Classification of a single input line, done once before dispatching on
/// the parser state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LineKind<'a> {
    Header,
    /// The text after `[originating from goroutine `
    Ancestor(&'a str),
    Blank,
    /// `created by ...`, with the prefix stripped
    CreatedBy(&'a str),
    FramesElided,
    Other,
}

impl<'a> LineKind<'a> {
    fn classify(text: &'a str) -> Self {
        if text.is_empty() {
            LineKind::Blank
        } else if text.starts_with(HEADER_PREFIX) {
            LineKind::Header
        } else if let Some(rest) = text.strip_prefix(ANCESTOR_PREFIX) {
            LineKind::Ancestor(rest)
        } else if let Some(rest) = text.strip_prefix(CREATED_BY_PREFIX) {
            LineKind::CreatedBy(rest)
        } else if text == FRAMES_ELIDED {
            LineKind::FramesElided
        } else {
            LineKind::Other
        }
    }

    /// Lines that end the frame list of the current block or section.
    fn is_boundary(self) -> bool {
        matches!(self, LineKind::Header | LineKind::Ancestor(_))
    }
}

#[derive(Debug, Default)]
enum State {
    /// Outside of any block, looking for the next header
    #[default]
    Idle,
    /// Expecting a call line, `created by`, or the end of the block
    Func { first: bool },
    /// Expecting the location line of a stack frame
    File(Frame),
    /// Expecting the location line of the created-by frame
    CreatedByFile(Frame),
    /// The created-by frame was the last element of the block
    Done,
}

#[derive(Debug, Default)]
struct Parser {
    goroutines: Vec<Goroutine>,
    errors: Vec<ParseError>,
    state: State,
    /// The goroutine being decoded followed by its ancestor sections, nearest
    /// first. Empty when idle.
    chain: Vec<Goroutine>,
    lines_read: usize,
}

impl Parser {
    fn feed(&mut self, line: &Line) {
        self.lines_read = line.number;
        let kind = LineKind::classify(&line.text);

        match std::mem::take(&mut self.state) {
            State::Idle => {
                if kind == LineKind::Header {
                    self.start(line);
                }
            }

            State::Func { .. } | State::Done if kind.is_boundary() => {
                if let LineKind::Ancestor(rest) = kind {
                    self.start_ancestor(line, rest);
                } else {
                    self.close_block();
                    self.start(line);
                }
            }

            State::Func { first } => match kind {
                LineKind::Blank if first && self.chain.len() == 1 => {
                    self.abort(line.number, ParseErrorKind::InvalidFunctionCall, &line.text);
                }
                LineKind::Blank => self.close_block(),
                LineKind::FramesElided => {
                    self.current().frames_elided = true;
                    self.state = State::Func { first: false };
                }
                LineKind::CreatedBy(rest) => match parse_created_by(rest) {
                    Some(function) => {
                        self.state = State::CreatedByFile(Frame::new(function, "", 0));
                    }
                    None => {
                        self.abort(line.number, ParseErrorKind::InvalidFunctionCall, &line.text)
                    }
                },
                LineKind::Other
                    if first
                        && line.text.starts_with('\t')
                        && line.text.ends_with(STACK_UNAVAILABLE_SUFFIX) =>
                {
                    self.state = State::Func { first: false };
                }
                _ => match parse_func(&line.text) {
                    Some(function) => self.state = State::File(Frame::new(function, "", 0)),
                    None => {
                        self.abort(line.number, ParseErrorKind::InvalidFunctionCall, &line.text)
                    }
                },
            },

            State::File(_) | State::CreatedByFile(_) if kind.is_boundary() => {
                self.abort(line.number, ParseErrorKind::UnexpectedEnd, "");
                self.feed(line);
            }

            State::File(mut frame) => match parse_file(&line.text) {
                Some((file, line_no)) => {
                    frame.file = file.to_owned();
                    frame.line = line_no;
                    self.current().stack.push(frame);
                    self.state = State::Func { first: false };
                }
                None => self.abort(line.number, ParseErrorKind::InvalidFileLineRef, &line.text),
            },

            State::CreatedByFile(mut frame) => match parse_file(&line.text) {
                Some((file, line_no)) => {
                    frame.file = file.to_owned();
                    frame.line = line_no;
                    self.current().created_by = Some(frame);
                    self.state = State::Done;
                }
                None => self.abort(line.number, ParseErrorKind::InvalidFileLineRef, &line.text),
            },

            // Anything else after `created by` ends the block; the line is
            // not part of any goroutine.
            State::Done => self.close_block(),
        }
    }

    fn start(&mut self, line: &Line) {
        match parse_header(&line.text) {
            Some(goroutine) => {
                self.chain.push(goroutine);
                self.state = State::Func { first: true };
            }
            None => {
                debug!(line = line.number, "invalid goroutine header");
                self.record(ParseError::new(
                    line.number,
                    ParseErrorKind::InvalidHeader,
                    line.text.as_str(),
                ));
            }
        }
    }

    /// `[originating from goroutine 18]:` opens a section of the goroutine
    /// being decoded. An unreadable marker ends the block, so the sections
    /// after it are skipped.
    fn start_ancestor(&mut self, line: &Line, rest: &str) {
        let id = rest
            .strip_suffix("]:")
            .map(|inner| inner.split_once(',').map_or(inner, |(id, _)| id))
            .and_then(parse_digits::<u64>);

        match id {
            Some(id) => {
                self.chain.push(Goroutine::new(id));
                self.state = State::Func { first: true };
            }
            None => {
                debug!(line = line.number, "dropping unreadable ancestor marker");
                self.close_block();
            }
        }
    }

    /// Moves the chain into `goroutines`, the sections becoming the
    /// goroutine's ancestors. Empty trailing sections are dropped.
    fn close_block(&mut self) {
        self.state = State::Idle;
        let mut chain = std::mem::take(&mut self.chain).into_iter();
        let Some(mut goroutine) = chain.next() else {
            return;
        };
        goroutine.ancestors = chain.collect();
        while goroutine.ancestors.last().is_some_and(Goroutine::is_empty) {
            goroutine.ancestors.pop();
        }
        trace!(
            id = goroutine.id,
            frames = goroutine.stack.len(),
            ancestors = goroutine.ancestors.len(),
            "decoded goroutine"
        );
        self.goroutines.push(goroutine);
    }

    /// Gives up on the current block. Failures inside an ancestor section
    /// only drop that section.
    fn abort(&mut self, number: usize, kind: ParseErrorKind, content: &str) {
        if self.chain.len() > 1 {
            debug!(line = number, %kind, "dropping malformed ancestor section");
            self.chain.pop();
            self.close_block();
            return;
        }
        debug!(line = number, %kind, "aborting goroutine block");
        self.chain.clear();
        self.state = State::Idle;
        self.record(ParseError::new(number, kind, content));
    }

    fn record(&mut self, error: ParseError) {
        self.errors.push(error);
    }

    fn current(&mut self) -> &mut Goroutine {
        if self.chain.is_empty() {
            self.chain.push(Goroutine::default());
        }
        let last = self.chain.len() - 1;
        &mut self.chain[last]
    }

    fn finish(mut self) -> (Vec<Goroutine>, Vec<ParseError>) {
        match std::mem::take(&mut self.state) {
            State::File(_) | State::CreatedByFile(_) => {
                self.abort(self.lines_read + 1, ParseErrorKind::UnexpectedEnd, "");
            }
            State::Idle => {}
            State::Func { .. } | State::Done => self.close_block(),
        }
        (self.goroutines, self.errors)
    }
}
