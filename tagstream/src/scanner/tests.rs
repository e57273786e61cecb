// Copyright 2026 The Tagstream Project
// SPDX-License-Identifier: Apache-2.0

// Scanner tests
//
// Tests cover:
//  1. Plain text passes through for every chunk segmentation
//  2. A block resolves identically for every chunk segmentation
//  3. Hold-back of trailing text that may start a marker
//  4. Unclosed blocks flushed verbatim at end of stream
//  5. No nesting: a second open marker is block content
//  6. First close marker wins
//  7. Tie-break by registration order, independent of chunking
//  8. Block size limit
//  9. Multi-byte text and markers

use super::*;
use crate::registry::{BlockDescriptor, TagRegistry};

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn printjob_registry() -> TagRegistry {
    let mut registry = TagRegistry::new();
    registry
        .register(BlockDescriptor::new("printjob", "[PRINTJOB]", "[/PRINTJOB]"))
        .unwrap();
    registry
}

fn registry_of(descriptors: &[(&str, &str, &str)]) -> TagRegistry {
    let mut registry = TagRegistry::new();
    for (name, open, close) in descriptors {
        registry
            .register(BlockDescriptor::new(*name, *open, *close))
            .unwrap();
    }
    registry
}

/// Feed `chunks` one by one, then finish. Returns every event.
fn scan_all<S: AsRef<str>>(registry: &TagRegistry, chunks: &[S]) -> Vec<ScanEvent> {
    let scanner = Scanner::new(registry);
    let mut state = ScanState::new();
    let mut events = Vec::new();
    for chunk in chunks {
        events.extend(scanner.step(&mut state, chunk.as_ref()));
    }
    events.extend(scanner.finish(&mut state));
    assert!(state.is_idle(), "finish must leave the state idle");
    events
}

/// Flatten events to a string: blocks as `<name>content</name>`.
fn render(registry: &TagRegistry, events: &[ScanEvent]) -> String {
    let mut out = String::new();
    for event in events {
        match event {
            ScanEvent::Text(t) => out.push_str(t),
            ScanEvent::BlockOpened { .. } => {}
            ScanEvent::BlockClosed { index, content } => {
                let name = &registry.get(*index).unwrap().name;
                out.push_str(&format!("<{name}>{content}</{name}>"));
            }
            ScanEvent::BlockAbandoned { raw, .. } => out.push_str(raw),
        }
    }
    out
}

/// Every way of cutting `text` into two chunks at a char boundary.
fn two_way_splits(text: &str) -> Vec<Vec<String>> {
    let mut splits = Vec::new();
    for (i, _) in text.char_indices().chain(std::iter::once((text.len(), ' '))) {
        splits.push(vec![text[..i].to_string(), text[i..].to_string()]);
    }
    splits
}

/// Every way of cutting `text` into three chunks at char boundaries.
fn three_way_splits(text: &str) -> Vec<Vec<String>> {
    let bounds: Vec<usize> = text
        .char_indices()
        .map(|(i, _)| i)
        .chain(std::iter::once(text.len()))
        .collect();
    let mut splits = Vec::new();
    for (a, &i) in bounds.iter().enumerate() {
        for &j in &bounds[a..] {
            splits.push(vec![
                text[..i].to_string(),
                text[i..j].to_string(),
                text[j..].to_string(),
            ]);
        }
    }
    splits
}

fn char_chunks(text: &str) -> Vec<String> {
    text.chars().map(|c| c.to_string()).collect()
}

// ---------------------------------------------------------------------------
// 1. Plain text for every segmentation
// ---------------------------------------------------------------------------

#[test]
fn plain_text_survives_every_segmentation() {
    let registry = printjob_registry();
    // Contains would-be marker prefixes that never complete.
    let text = "price [PRINT list [PRINTJOB and [/PRINTJOB] done [";

    for chunks in three_way_splits(text) {
        let events = scan_all(&registry, &chunks);
        assert!(
            events.iter().all(|e| matches!(e, ScanEvent::Text(_))),
            "only text expected for {chunks:?}"
        );
        assert_eq!(render(&registry, &events), text, "chunks: {chunks:?}");
    }
    assert_eq!(render(&registry, &scan_all(&registry, &char_chunks(text))), text);
}

#[test]
fn empty_registry_emits_immediately() {
    let registry = TagRegistry::new();
    let scanner = Scanner::new(&registry);
    let mut state = ScanState::new();
    let events = scanner.step(&mut state, "hello [X]");
    assert_eq!(events, vec![ScanEvent::Text("hello [X]".to_string())]);
    assert!(state.is_idle());
}

#[test]
fn empty_input_emits_nothing() {
    let registry = printjob_registry();
    let scanner = Scanner::new(&registry);
    let mut state = ScanState::new();
    assert!(scanner.step(&mut state, "").is_empty());
    assert!(scanner.finish(&mut state).is_empty());
}

// ---------------------------------------------------------------------------
// 2. Block resolution for every segmentation
// ---------------------------------------------------------------------------

#[test]
fn block_resolves_for_every_segmentation() {
    let registry = printjob_registry();
    let text = "A[PRINTJOB]{\"a\":1}[/PRINTJOB]C";
    let expected = "A<printjob>{\"a\":1}</printjob>C";

    for chunks in three_way_splits(text) {
        let events = scan_all(&registry, &chunks);
        assert_eq!(render(&registry, &events), expected, "chunks: {chunks:?}");
        let closed = events
            .iter()
            .filter(|e| matches!(e, ScanEvent::BlockClosed { .. }))
            .count();
        assert_eq!(closed, 1, "chunks: {chunks:?}");
    }
    assert_eq!(
        render(&registry, &scan_all(&registry, &char_chunks(text))),
        expected
    );
}

#[test]
fn printjob_scenario_events_in_order() {
    let registry = printjob_registry();
    let chunks = ["Hel", "lo [PRI", "NTJOB]{\"a\":1}[/PRI", "NTJOB] bye"];
    let events = scan_all(&registry, &chunks);
    assert_eq!(
        events,
        vec![
            ScanEvent::Text("Hello ".to_string()),
            ScanEvent::BlockOpened { index: 0 },
            ScanEvent::BlockClosed {
                index: 0,
                content: "{\"a\":1}".to_string()
            },
            ScanEvent::Text(" bye".to_string()),
        ]
    );
}

#[test]
fn open_event_arrives_before_close_marker() {
    let registry = printjob_registry();
    let scanner = Scanner::new(&registry);
    let mut state = ScanState::new();

    let events = scanner.step(&mut state, "x [PRINTJOB]partial");
    assert_eq!(
        events,
        vec![
            ScanEvent::Text("x ".to_string()),
            ScanEvent::BlockOpened { index: 0 }
        ]
    );
    assert_eq!(state.open_block().unwrap().content, "partial");
    assert_eq!(state.buffered(), "");

    let events = scanner.step(&mut state, " more[/PRINTJOB]");
    assert_eq!(
        events,
        vec![ScanEvent::BlockClosed {
            index: 0,
            content: "partial more".to_string()
        }]
    );
    assert!(state.is_idle());
}

#[test]
fn several_blocks_in_one_chunk() {
    let registry = registry_of(&[("a", "<a>", "</a>"), ("b", "<b>", "</b>")]);
    let events = scan_all(&registry, &["1<a>x</a>2<b>y</b>3<a>z</a>"]);
    assert_eq!(
        render(&registry, &events),
        "1<a>x</a>2<b>y</b>3<a>z</a>"
    );
    let closed: Vec<_> = events
        .iter()
        .filter_map(|e| match e {
            ScanEvent::BlockClosed { index, content } => Some((*index, content.as_str())),
            _ => None,
        })
        .collect();
    assert_eq!(closed, vec![(0, "x"), (1, "y"), (0, "z")]);
}

#[test]
fn empty_block_content() {
    let registry = printjob_registry();
    let events = scan_all(&registry, &["[PRINTJOB][/PRINTJOB]"]);
    assert_eq!(
        events,
        vec![
            ScanEvent::BlockOpened { index: 0 },
            ScanEvent::BlockClosed {
                index: 0,
                content: String::new()
            },
        ]
    );
}

// ---------------------------------------------------------------------------
// 3. Hold-back
// ---------------------------------------------------------------------------

#[test]
fn holds_back_max_marker_length_minus_one_chars() {
    let registry = printjob_registry(); // max marker length 11
    let scanner = Scanner::new(&registry);
    let mut state = ScanState::new();

    let events = scanner.step(&mut state, "Hello world, again");
    assert_eq!(events, vec![ScanEvent::Text("Hello wo".to_string())]);
    assert_eq!(state.buffered(), "rld, again");
}

#[test]
fn short_buffer_is_fully_retained() {
    let registry = printjob_registry();
    let scanner = Scanner::new(&registry);
    let mut state = ScanState::new();
    assert!(scanner.step(&mut state, "Hi").is_empty());
    assert_eq!(state.buffered(), "Hi");
    assert_eq!(
        scanner.finish(&mut state),
        vec![ScanEvent::Text("Hi".to_string())]
    );
}

// ---------------------------------------------------------------------------
// 4. End of stream inside a block
// ---------------------------------------------------------------------------

#[test]
fn unclosed_block_flushed_verbatim() {
    let registry = printjob_registry();
    let events = scan_all(&registry, &["before [PRINT", "JOB]{\"a\":", "1} [/PRINT"]);
    assert_eq!(
        events,
        vec![
            ScanEvent::Text("bef".to_string()),
            ScanEvent::Text("ore ".to_string()),
            ScanEvent::BlockOpened { index: 0 },
            ScanEvent::BlockAbandoned {
                index: 0,
                raw: "[PRINTJOB]{\"a\":1} [/PRINT".to_string(),
                reason: AbandonReason::EndOfStream,
            },
        ]
    );
}

#[test]
fn discard_drops_partial_state() {
    let registry = printjob_registry();
    let scanner = Scanner::new(&registry);
    let mut state = ScanState::new();
    scanner.step(&mut state, "[PRINTJOB]abc");
    assert!(!state.is_idle());
    state.discard();
    assert!(state.is_idle());
    assert!(scanner.finish(&mut state).is_empty());
}

// ---------------------------------------------------------------------------
// 5-6. No nesting, first close wins
// ---------------------------------------------------------------------------

#[test]
fn second_open_marker_is_block_content() {
    let registry = registry_of(&[("a", "<a>", "</a>"), ("b", "<b>", "</b>")]);
    let events = scan_all(&registry, &["<a>1<b>2<a>3</a>4</b>"]);
    assert_eq!(
        events,
        vec![
            ScanEvent::BlockOpened { index: 0 },
            ScanEvent::BlockClosed {
                index: 0,
                content: "1<b>2<a>3".to_string()
            },
            // Held back by the step, released by finish.
            ScanEvent::Text("4<".to_string()),
            ScanEvent::Text("/b>".to_string()),
        ]
    );
}

#[test]
fn first_close_marker_terminates_block() {
    let registry = printjob_registry();
    let events = scan_all(&registry, &["[PRINTJOB]a[/PRINTJOB]b[/PRINTJOB]"]);
    assert_eq!(
        events,
        vec![
            ScanEvent::BlockOpened { index: 0 },
            ScanEvent::BlockClosed {
                index: 0,
                content: "a".to_string()
            },
            ScanEvent::Text("b[".to_string()),
            ScanEvent::Text("/PRINTJOB]".to_string()),
        ]
    );
}

#[test]
fn close_marker_split_character_by_character() {
    let registry = printjob_registry();
    let mut chunks = vec!["[PRINTJOB]body".to_string()];
    chunks.extend(char_chunks("[/PRINTJOB]"));
    let events = scan_all(&registry, &chunks);
    assert_eq!(
        events.last(),
        Some(&ScanEvent::BlockClosed {
            index: 0,
            content: "body".to_string()
        })
    );
}

// ---------------------------------------------------------------------------
// 7. Tie-break
// ---------------------------------------------------------------------------

#[test]
fn distinct_markers_pick_the_one_that_matches() {
    let registry = registry_of(&[("a", "[A]", "[/A]"), ("ab", "[AB]", "[/AB]")]);
    let events = scan_all(&registry, &["[AB]x[/AB]"]);
    assert_eq!(
        events,
        vec![
            ScanEvent::BlockOpened { index: 1 },
            ScanEvent::BlockClosed {
                index: 1,
                content: "x".to_string()
            },
        ]
    );
}

#[test]
fn same_position_tie_goes_to_earlier_registration() {
    // "[A" and "[AB]" both match at offset 0 of "[AB]x[/AB]".
    let short_first = registry_of(&[("a", "[A", "[/A]"), ("ab", "[AB]", "[/AB]")]);
    let events = scan_all(&short_first, &["[AB]x[/AB]"]);
    assert_eq!(events[0], ScanEvent::BlockOpened { index: 0 });
    // "[/A]" never appears, so the short block is flushed verbatim.
    assert_eq!(render(&short_first, &events), "[AB]x[/AB]");

    let long_first = registry_of(&[("ab", "[AB]", "[/AB]"), ("a", "[A", "[/A]")]);
    let events = scan_all(&long_first, &["[AB]x[/AB]"]);
    assert_eq!(
        events,
        vec![
            ScanEvent::BlockOpened { index: 0 },
            ScanEvent::BlockClosed {
                index: 0,
                content: "x".to_string()
            },
        ]
    );
}

#[test]
fn tie_break_is_independent_of_chunking() {
    let long_first = registry_of(&[("ab", "[AB]", "[/AB]"), ("a", "[A", "[/A]")]);
    let text = "z[AB]x[/AB]";
    for chunks in two_way_splits(text) {
        let events = scan_all(&long_first, &chunks);
        assert_eq!(
            render(&long_first, &events),
            "z<ab>x</ab>",
            "chunks: {chunks:?}"
        );
    }
}

#[test]
fn earlier_partial_marker_defers_later_match() {
    // "[[X]]" could start at 0 while "[X]" is complete at 1.
    let registry = registry_of(&[("outer", "[[X]]", "[[/X]]"), ("inner", "[X]", "[/X]")]);
    let scanner = Scanner::new(&registry);
    let mut state = ScanState::new();

    assert!(scanner.step(&mut state, "[[X]").is_empty());
    let events = scanner.step(&mut state, "]body[[/X]]");
    assert_eq!(events[0], ScanEvent::BlockOpened { index: 0 });
    assert_eq!(
        events[1],
        ScanEvent::BlockClosed {
            index: 0,
            content: "body".to_string()
        }
    );
}

#[test]
fn earlier_candidate_ruled_out_by_later_text() {
    let registry = registry_of(&[("outer", "[[X]]", "[[/X]]"), ("inner", "[X]", "[/X]")]);
    let events = scan_all(&registry, &["[[X]y[/X]"]);
    assert_eq!(render(&registry, &events), "[<inner>y</inner>");
}

// ---------------------------------------------------------------------------
// 8. Block size limit
// ---------------------------------------------------------------------------

#[test]
fn oversized_block_is_abandoned_and_scanning_resumes() {
    let registry = registry_of(&[("b", "[B]", "[/B]")]);
    let scanner = Scanner::new(&registry).with_block_limit(Some(8));
    let mut state = ScanState::new();

    let events = scanner.step(&mut state, "[B]0123");
    assert_eq!(events, vec![ScanEvent::BlockOpened { index: 0 }]);

    let events = scanner.step(&mut state, "456789");
    assert_eq!(
        events,
        vec![ScanEvent::BlockAbandoned {
            index: 0,
            raw: "[B]0123456789".to_string(),
            reason: AbandonReason::Overflow,
        }]
    );
    assert!(state.is_idle());

    let mut events = scanner.step(&mut state, " [B]ok[/B]");
    events.extend(scanner.finish(&mut state));
    assert_eq!(render(&registry, &events), " <b>ok</b>");
}

#[test]
fn block_within_limit_resolves() {
    let registry = registry_of(&[("b", "[B]", "[/B]")]);
    let scanner = Scanner::new(&registry).with_block_limit(Some(8));
    let mut state = ScanState::new();
    let events = scanner.step(&mut state, "[B]01234567[/B]");
    assert_eq!(
        events[1],
        ScanEvent::BlockClosed {
            index: 0,
            content: "01234567".to_string()
        }
    );
}

// ---------------------------------------------------------------------------
// 9. Multi-byte text
// ---------------------------------------------------------------------------

#[test]
fn multibyte_text_and_markers() {
    let registry = registry_of(&[("note", "«note»", "«/note»")]);
    let text = "héllo ✓ «note»ünïcødé«/note» 终";
    for chunks in two_way_splits(text) {
        let events = scan_all(&registry, &chunks);
        assert_eq!(
            render(&registry, &events),
            "héllo ✓ <note>ünïcødé</note> 终",
            "chunks: {chunks:?}"
        );
    }
}

#[test]
fn holdback_respects_char_boundaries() {
    let registry = registry_of(&[("b", "[B]", "[/B]")]); // keep 3 chars
    let scanner = Scanner::new(&registry);
    let mut state = ScanState::new();
    let events = scanner.step(&mut state, "aé✓终x");
    assert_eq!(events, vec![ScanEvent::Text("aé".to_string())]);
    assert_eq!(state.buffered(), "✓终x");
}
