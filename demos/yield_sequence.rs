//! Generators with `shift`
//!
//! Run with: cargo run --example yield_sequence

use undertow::sequence::{sequence, Yielder};
use undertow::{reset, Scope};

async fn collatz(y: Yielder<u64>, mut n: u64) {
    while n != 1 {
        y.emit(n).await;
        n = if n % 2 == 0 { n / 2 } else { 3 * n + 1 };
    }
    y.emit(1).await;
}

fn main() {
    println!("=== Collatz sequence from 27 ===");
    let steps = sequence(|y| collatz(y, 27)).expect("sequence runs to completion");
    println!("{} steps, peak {}", steps.len(), steps.iter().max().unwrap_or(&0));

    println!("\n=== Fibonacci, first 15 ===");
    let fib = sequence(|y| async move {
        let (mut a, mut b) = (0_u64, 1_u64);
        for _ in 0..15 {
            y.emit(a).await;
            (a, b) = (b, a + b);
        }
    })
    .expect("sequence runs to completion");
    println!("{fib:?}");

    println!("\n=== Raw shift: wrap the rest of the body ===");
    let wrapped = reset(|scope: Scope<String>| async move {
        let greeting: &str = scope
            .shift(|k| async move { format!("<p>{}</p>", k.invoke("hello").await) })
            .await;
        format!("{greeting}, world")
    })
    .expect("reset runs to completion");
    println!("{wrapped}");
}
