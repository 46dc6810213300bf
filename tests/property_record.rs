//! Property tests for the run record's append/scroll behaviour.

use proptest::prelude::*;

use taskmux::engine::RunRecord;
use taskmux::types::StreamKind;

#[derive(Debug, Clone)]
enum Op {
    Append(String),
    LineUp,
    LineDown,
    PageUp(usize),
    PageDown(usize),
    Top,
    Bottom,
}

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        "[a-z]{0,12}".prop_map(Op::Append),
        Just(Op::LineUp),
        Just(Op::LineDown),
        (1..50usize).prop_map(Op::PageUp),
        (1..50usize).prop_map(Op::PageDown),
        Just(Op::Top),
        Just(Op::Bottom),
    ]
}

proptest! {
    /// Stored output equals the appended arguments in call order, no matter
    /// how scroll operations interleave, and the scroll offset always stays
    /// within the buffered content.
    #[test]
    fn appends_keep_order_and_scroll_stays_clamped(
        ops in proptest::collection::vec(op_strategy(), 0..200)
    ) {
        let mut rec = RunRecord::new("T1".to_string(), "prop task".to_string(), None);
        let mut appended: Vec<String> = Vec::new();

        for op in ops {
            match op {
                Op::Append(text) => {
                    appended.push(text.clone());
                    rec.append_line(text, StreamKind::Out);
                    // Auto-follow: every append snaps to the newest line.
                    prop_assert_eq!(rec.scroll_back(), 0);
                }
                Op::LineUp => rec.scroll_line_up(),
                Op::LineDown => rec.scroll_line_down(),
                Op::PageUp(n) => rec.scroll_page_up(n),
                Op::PageDown(n) => rec.scroll_page_down(n),
                Op::Top => rec.scroll_to_top(),
                Op::Bottom => rec.scroll_to_bottom(),
            }

            prop_assert!(rec.scroll_back() <= rec.lines().len().saturating_sub(1));
        }

        let stored: Vec<&str> = rec.lines().iter().map(|l| l.text.as_str()).collect();
        let expected: Vec<&str> = appended.iter().map(String::as_str).collect();
        prop_assert_eq!(stored, expected);
    }
}
