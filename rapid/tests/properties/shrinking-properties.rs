//! Integrated shrinking properties.
//!
//! A small deletion-only shrinker drives the recorder the way a test
//! harness would: replay a failing buffer, try removing each candidate
//! group, keep any shorter buffer that still fails.

use crate::runner;
use proptest::prelude::*;
use rapid::*;

/// Lists of even bytes, each element in its own removable group.
fn even_bytes() -> Gen<Vec<u64>> {
    let byte = Gen::bits(8).filter(|x| x % 2 == 0);
    Gen::new("even_bytes", move |s| {
        let mut out = Vec::new();
        loop {
            let handle = s.begin_group("element", true);
            let more = s.draw_bits(3)? != 0 && out.len() < 64;
            if !more {
                s.end_group(handle, false);
                return Ok(out);
            }
            out.push(byte.value(&mut *s)?);
            s.end_group(handle, false);
        }
    })
}

fn fails(xs: &[u64]) -> bool {
    xs.iter().any(|&x| x >= 200)
}

fn shrink(buf: Vec<u64>) -> (Vec<u64>, Vec<u64>) {
    let gen = even_bytes();
    let (mut value, mut rec) = replay(buf, true, &gen).unwrap();
    rec.prune();

    loop {
        let candidates: Vec<GroupHandle> = rec.removal_candidates().collect();
        let mut improved = false;
        for handle in candidates {
            match replay(rec.without_group(handle), true, &gen) {
                Ok((v, mut next)) if fails(&v) => {
                    next.prune();
                    assert!(next.data().len() < rec.data().len());
                    value = v;
                    rec = next;
                    improved = true;
                    break;
                }
                Ok(_) => {}
                Err(e) => assert!(e.is_invalid_data(), "unexpected error {e}"),
            }
        }
        if !improved {
            return (value, rec.into_data());
        }
    }
}

/// First failing run from a random stream, searching seeds upwards.
fn find_failure(start: u64) -> Option<(Vec<u64>, Vec<u64>)> {
    let gen = even_bytes();
    (start..start + 1000).find_map(|seed| {
        let config = Config::default().with_seed(seed).with_persist(true);
        let (value, _, rec) = generate(&config, &gen).ok()?;
        fails(&value).then(|| (value, rec.into_data()))
    })
}

/// Property: shrinking never loses the failure and never grows the buffer
pub fn test_shrinking_keeps_failure() {
    runner()
        .run(&(0u64..1_000_000), |start| {
            let Some((original, buf)) = find_failure(start) else {
                return Ok(());
            };
            let original_len = buf.len();
            let (value, shrunk) = shrink(buf);

            prop_assert!(fails(&value));
            prop_assert!(value.len() <= original.len());
            prop_assert!(shrunk.len() <= original_len);

            let (again, _) = replay(shrunk, false, &even_bytes()).unwrap();
            prop_assert_eq!(again, value);
            Ok(())
        })
        .unwrap();
}

/// Property: deleting groups alone shrinks any failing list to one element
pub fn test_shrinking_reaches_single_element() {
    runner()
        .run(&(0u64..1_000_000), |start| {
            let Some((_, buf)) = find_failure(start) else {
                return Ok(());
            };
            let (value, _) = shrink(buf);
            prop_assert_eq!(value.len(), 1);
            prop_assert!(value[0] >= 200);
            prop_assert!(value[0] % 2 == 0);
            Ok(())
        })
        .unwrap();
}
