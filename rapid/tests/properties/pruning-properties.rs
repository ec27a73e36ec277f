//! Pruning properties checked against a simple model of nested groups.

use crate::runner;
use proptest::prelude::*;
use rapid::*;

/// One step of a recorded run.
#[derive(Debug, Clone)]
enum Step {
    Draw(u64),
    Group {
        removable: bool,
        discard: bool,
        body: Vec<Step>,
    },
}

/// Runs of nested groups. Every group starts with a draw of its own, so a
/// kept group never ends up empty when its children are pruned.
fn runs() -> impl Strategy<Value = Vec<Step>> {
    let leaf = any::<u64>().prop_map(Step::Draw);
    let step = leaf.prop_recursive(4, 64, 4, |inner| {
        (
            any::<bool>(),
            prop::bool::weighted(0.3),
            any::<u64>(),
            prop::collection::vec(inner, 0..4),
        )
            .prop_map(|(removable, discard, first, mut body)| {
                body.insert(0, Step::Draw(first));
                Step::Group {
                    removable,
                    discard,
                    body,
                }
            })
    });
    prop::collection::vec(step, 0..6)
}

fn words(run: &[Step], out: &mut Vec<u64>) {
    for step in run {
        match step {
            Step::Draw(w) => out.push(*w),
            Step::Group { body, .. } => words(body, out),
        }
    }
}

fn group_count(run: &[Step]) -> usize {
    run.iter()
        .map(|step| match step {
            Step::Draw(_) => 0,
            Step::Group { body, .. } => 1 + group_count(body),
        })
        .sum()
}

/// Drive a stream through the run, labelling groups by open order.
fn play(s: &mut dyn BitStream, run: &[Step], next: &mut usize) {
    for step in run {
        match step {
            Step::Draw(_) => {
                s.draw_bits(64).unwrap();
            }
            Step::Group {
                removable,
                discard,
                body,
            } => {
                let handle = s.begin_group(&format!("g{next}"), *removable);
                *next += 1;
                play(&mut *s, body, next);
                s.end_group(handle, *discard);
            }
        }
    }
}

fn record(run: &[Step]) -> Recorder {
    let mut buf = Vec::new();
    words(run, &mut buf);
    let mut stream = BufBitStream::new(buf, true);
    play(&mut stream, run, &mut 0);
    stream.into_recorder()
}

/// What pruning should leave: kept words and `(label, begin, end)` spans.
fn expected(
    run: &[Step],
    next: &mut usize,
    data: &mut Vec<u64>,
    spans: &mut Vec<(String, usize, usize)>,
) {
    for step in run {
        match step {
            Step::Draw(w) => data.push(*w),
            Step::Group { discard: true, body, .. } => {
                *next += 1 + group_count(body);
            }
            Step::Group { body, .. } => {
                let slot = spans.len();
                spans.push((format!("g{next}"), data.len(), 0));
                *next += 1;
                expected(body, next, data, spans);
                spans[slot].2 = data.len();
            }
        }
    }
}

fn spans(rec: &Recorder) -> Vec<(String, usize, usize)> {
    rec.groups()
        .iter()
        .map(|g| (g.label().to_string(), g.begin(), g.end().unwrap()))
        .collect()
}

/// Property: pruning deletes exactly the discarded subtrees and shifts
/// everything else, preserving open order and containment
pub fn test_prune_matches_model() {
    runner()
        .run(&runs(), |run| {
            let mut rec = record(&run);
            rec.prune();

            let mut data = Vec::new();
            let mut want = Vec::new();
            expected(&run, &mut 0, &mut data, &mut want);

            prop_assert_eq!(rec.data(), &data[..]);
            prop_assert_eq!(rec.data_len(), data.len());
            prop_assert_eq!(spans(&rec), want);
            prop_assert!(rec.groups().iter().all(|g| !g.is_discarded()));
            prop_assert!(rec.groups().iter().all(|g| !g.is_empty()));
            Ok(())
        })
        .unwrap();
}

/// Property: pruning a recording with nothing discarded changes nothing
pub fn test_prune_is_idempotent() {
    runner()
        .run(&runs(), |run| {
            let mut rec = record(&run);
            rec.prune();
            let once = rec.clone();
            rec.prune();
            prop_assert_eq!(rec, once);
            Ok(())
        })
        .unwrap();
}

/// Property: replaying a pruned buffer re-records the pruned structure
pub fn test_pruned_recording_replays() {
    runner()
        .run(&runs(), |run| {
            let mut rec = record(&run);
            rec.prune();

            let mut kept = Vec::new();
            strip_discarded(&run, &mut kept);

            let again = record(&kept);
            prop_assert_eq!(again.data(), rec.data());
            prop_assert_eq!(again.groups().len(), rec.groups().len());
            for (a, b) in again.groups().iter().zip(rec.groups()) {
                prop_assert_eq!((a.begin(), a.end()), (b.begin(), b.end()));
                prop_assert_eq!(a.is_removable(), b.is_removable());
            }
            Ok(())
        })
        .unwrap();
}

fn strip_discarded(run: &[Step], out: &mut Vec<Step>) {
    for step in run {
        match step {
            Step::Draw(w) => out.push(Step::Draw(*w)),
            Step::Group { discard: true, .. } => {}
            Step::Group {
                removable, body, ..
            } => {
                let mut kept = Vec::new();
                strip_discarded(body, &mut kept);
                out.push(Step::Group {
                    removable: *removable,
                    discard: false,
                    body: kept,
                });
            }
        }
    }
}
