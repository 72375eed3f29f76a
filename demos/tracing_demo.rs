//! Demonstrates the engine's tracing output
//!
//! Run with: cargo run --example tracing_demo --features tracing

use undertow::nondet::all_choices;
use undertow::{reset, reset_with, ResetConfig, Scope};

fn main() {
    // Set up tracing subscriber
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::TRACE)
        .init();

    tracing::info!("Starting tracing demo");

    let doubled = reset(|scope: Scope<i32>| async move {
        let x: i32 = scope.shift(|k| async move { k.invoke(21).await * 2 }).await;
        x
    });
    tracing::info!(?doubled, "single-shot scope finished");

    let config = ResetConfig::multi_shot().with_label("coin-flips");
    let flips = reset_with(config, |scope: Scope<Vec<String>>| async move {
        let first: bool = scope
            .shift(|k| async move {
                let mut out = k.invoke(true).await;
                out.extend(k.invoke(false).await);
                out
            })
            .await;
        vec![if first { "heads" } else { "tails" }.to_string()]
    });
    tracing::info!(?flips, "multi-shot scope finished");

    let pairs = all_choices(|c| async move {
        let a = c.choose(vec![1, 2]).await;
        let b = c.choose(vec!['x', 'y']).await;
        (a, b)
    });
    tracing::info!(?pairs, "search finished");

    // A fault is logged at warn level before it is returned.
    let fault = reset(|scope: Scope<i32>| async move {
        scope
            .shift(|k| async move { k.invoke(1).await + k.invoke(2).await })
            .await
    });
    if let Err(error) = fault {
        tracing::error!(%error, "expected fault");
    }
}
