//! Backtracking search with multi-shot continuations
//!
//! Run with: cargo run --example nondeterminism

use undertow::nondet::all_choices;

fn main() {
    println!("=== Pythagorean triples up to 20 ===");
    let triples = all_choices(|c| async move {
        let a = c.choose((1..=20).collect()).await;
        let b = c.choose((a..=20).collect()).await;
        let h = c.choose((b..=20).collect()).await;
        c.guard(a * a + b * b == h * h).await;
        (a, b, h)
    })
    .expect("search runs to completion");
    for (a, b, h) in &triples {
        println!("{a}^2 + {b}^2 = {h}^2");
    }

    println!("\n=== Four queens ===");
    let boards = all_choices(|c| async move {
        let mut queens: Vec<usize> = Vec::new();
        for _row in 0..4 {
            let col = c.choose((0..4).collect()).await;
            let safe = queens.iter().enumerate().all(|(r, &q)| {
                let dr = queens.len() - r;
                q != col && q + dr != col && col + dr != q
            });
            c.guard(safe).await;
            queens.push(col);
        }
        queens
    })
    .expect("search runs to completion");
    for board in &boards {
        println!("{board:?}");
    }
}
