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

//! Property-based tests for the goroutine dump parser
//!
//! - Arbitrary bytes and truncated dumps never panic
//! - Every decoded frame names a function
//! - Rendering goroutines and parsing them back is lossless
//! - Parsing two concatenated dumps equals parsing each one
//! - Deep stacks and long ancestor runs parse in a test thread's stack

use std::time::Duration;

use gostack_diagnose_tools::goroutine_dump::{parse, DumpReport, Frame, Goroutine};
use proptest::prelude::*;

const SAMPLE_DUMP: &str = include_str!("../test-fixtures/ancestors.txt");
const CRASH_DUMP: &str = include_str!("../test-fixtures/stackoverflow.txt");

fn assert_frames_named(goroutines: &[Goroutine]) {
    for g in goroutines {
        for frame in g.stack.iter().chain(&g.created_by) {
            assert!(!frame.function.is_empty(), "{frame:?}");
        }
        assert_frames_named(&g.ancestors);
    }
}

fn frame() -> impl Strategy<Value = Frame> {
    (
        "[a-z]{1,8}(/[a-z]{1,8}){0,2}\\.(\\(\\*[A-Z][a-z]{0,6}\\)\\.)?[A-Za-z][a-z0-9]{0,8}",
        "(C:)?/[a-z]{1,8}(/[a-z ]{1,8}){0,3}\\.go",
        0u32..100_000,
    )
        .prop_map(|(function, file, line)| Frame::new(function, file, line))
}

fn goroutine() -> impl Strategy<Value = Goroutine> {
    (
        any::<u64>(),
        "[a-zA-Z][a-zA-Z ]{0,15}",
        proptest::option::of(1u64..10_000),
        any::<bool>(),
        proptest::collection::vec(frame(), 1..5),
        any::<bool>(),
        proptest::option::of(frame()),
    )
        .prop_map(
            |(id, state, minutes, locked_to_thread, stack, frames_elided, created_by)| Goroutine {
                id,
                state,
                wait: Duration::from_secs(minutes.unwrap_or(0) * 60),
                locked_to_thread,
                stack,
                frames_elided,
                created_by,
                ancestors: vec![],
            },
        )
}

fn render(goroutines: &[Goroutine]) -> String {
    goroutines.iter().map(|g| format!("{g}\n")).collect()
}

proptest! {
    #[test]
    fn prop_arbitrary_bytes_never_panic(data in proptest::collection::vec(any::<u8>(), 0..512)) {
        let (goroutines, _) = parse(data.as_slice());
        assert_frames_named(&goroutines);
    }

    #[test]
    fn prop_arbitrary_lines_never_panic(
        lines in proptest::collection::vec(
            prop_oneof![
                Just("goroutine 1 [running]:".to_owned()),
                Just("[originating from goroutine 1]:".to_owned()),
                Just("created by main.main".to_owned()),
                Just("...additional frames elided...".to_owned()),
                Just(String::new()),
                "[ -~\t]{0,40}",
            ],
            0..40,
        )
    ) {
        let (goroutines, _) = parse(lines.join("\n").as_bytes());
        assert_frames_named(&goroutines);
    }

    #[test]
    fn prop_truncated_dumps_never_panic(cut in 0usize..4096, crash in any::<bool>()) {
        let dump = (if crash { CRASH_DUMP } else { SAMPLE_DUMP }).as_bytes();
        let (goroutines, _) = parse(&dump[..cut.min(dump.len())]);
        assert_frames_named(&goroutines);
    }

    #[test]
    fn prop_render_round_trip(goroutines in proptest::collection::vec(goroutine(), 0..5)) {
        let (parsed, errors) = parse(render(&goroutines).as_bytes());
        prop_assert!(errors.is_empty(), "{:?}", errors);
        prop_assert_eq!(parsed, goroutines);
    }

    #[test]
    fn prop_concatenation_is_idempotent(
        first in proptest::collection::vec(goroutine(), 0..4),
        second in proptest::collection::vec(goroutine(), 0..4),
    ) {
        let first = render(&first);
        let second = render(&second);

        let (mut expected, _) = parse(first.as_bytes());
        expected.extend(parse(second.as_bytes()).0);
        let (actual, errors) = parse(format!("{first}{second}").as_bytes());

        prop_assert!(errors.is_empty(), "{:?}", errors);
        prop_assert_eq!(actual, expected);
    }
}

#[test]
fn test_crash_regression() {
    let (goroutines, errors) = parse(&b"goroutine 0 [0]:\n0()\n\t:0\n[originating from goroutine "[..]);
    assert!(goroutines.is_empty());
    assert_eq!(errors.len(), 1);
}

#[test]
fn test_truncated_multibyte_sequences() {
    let (goroutines, errors) = parse(&b"goroutine 1 [chan \xe2\x82]:\nmain.f\xc3()\n\t/a/\xe2.go:3\n"[..]);
    assert!(errors.is_empty(), "{errors:?}");
    assert_eq!(goroutines.len(), 1);
    assert!(goroutines[0].state.starts_with("chan "));
    assert_eq!(goroutines[0].stack[0].line, 3);
}

#[test]
fn test_deep_stack_and_long_ancestor_run() -> anyhow::Result<()> {
    const FRAMES: usize = 100_000;
    const ANCESTORS: u64 = 20_000;

    let mut dump = String::from("goroutine 1 [running]:\n");
    for i in 0..FRAMES {
        dump.push_str(&format!("main.f{i}(...)\n\t/src/main.go:{i}\n"));
    }
    dump.push_str("created by main.main in goroutine 0\n\t/src/main.go:1\n");
    for id in 0..ANCESTORS {
        dump.push_str(&format!("[originating from goroutine {id}]:\nmain.g()\n\t/src/g.go:2\n"));
    }
    dump.push_str("\ngoroutine 2 [select]:\nmain.h()\n\t/src/h.go:3\n");

    let (goroutines, errors) = parse(dump.as_bytes());
    assert!(errors.is_empty(), "{errors:?}");
    assert_eq!(goroutines.len(), 2);
    assert_eq!(goroutines[0].stack.len(), FRAMES);
    assert_eq!(goroutines[0].ancestors.len(), ANCESTORS as usize);
    assert_eq!(goroutines[0].ancestors.last().map(|a| a.id), Some(ANCESTORS - 1));
    assert_eq!(goroutines[1].id, 2);

    let rendered = render(&goroutines);
    let (reparsed, errors) = parse(rendered.as_bytes());
    assert!(errors.is_empty(), "{errors:?}");
    assert!(reparsed == goroutines);

    let json = DumpReport::from_parsed(goroutines, &[]).to_json()?;
    assert!(json.len() > dump.len() / 2);
    Ok(())
}
