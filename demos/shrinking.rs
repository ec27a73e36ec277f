//! Integrated shrinking walkthrough.
//!
//! Generates random pairs until one violates `a + b < 300`, then shrinks the
//! failing run by deleting recorded groups and replaying the shorter buffer.
//!
//! Run with `RUST_LOG=rapid_core=trace` to watch groups being removed.

use rapid::*;

fn pair_list() -> Gen<Vec<(u64, u64)>> {
    let byte = Gen::bits(8);
    Gen::new("pair_list", move |s| {
        let mut pairs = Vec::new();
        loop {
            let handle = s.begin_group("pair", true);
            if s.draw_bits(2)? == 0 {
                s.end_group(handle, false);
                return Ok(pairs);
            }
            let a = byte.value(&mut *s)?;
            let b = byte.value(&mut *s)?;
            pairs.push((a, b));
            s.end_group(handle, false);
        }
    })
}

fn fails(pairs: &[(u64, u64)]) -> bool {
    pairs.iter().any(|&(a, b)| a + b >= 300)
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let gen = pair_list();
    let base = Config::from_env()?.with_persist(true);

    let (value, seed, mut rec) = loop {
        let (value, seed, rec) = generate(&base, &gen)?;
        if fails(&value) {
            break (value, seed, rec);
        }
        if base.seed.is_some() {
            println!("{seed} does not fail");
            return Ok(());
        }
    };
    println!("{seed} failed with {} pairs: {value:?}", value.len());

    rec.prune();
    let mut best = value;
    let mut steps = 0;
    'shrink: loop {
        let candidates: Vec<GroupHandle> = rec.removal_candidates().collect();
        for handle in candidates {
            match replay(rec.without_group(handle), true, &gen) {
                Ok((v, mut next)) if fails(&v) => {
                    next.prune();
                    steps += 1;
                    println!("  step {steps}: {} words, {v:?}", next.data().len());
                    best = v;
                    rec = next;
                    continue 'shrink;
                }
                Ok(_) => {}
                Err(e) if e.is_invalid_data() => {}
                Err(e) => return Err(e),
            }
        }
        break;
    }

    println!("minimal counterexample after {steps} shrinks: {best:?}");
    println!("replay buffer: {:?}", rec.data());
    Ok(())
}
