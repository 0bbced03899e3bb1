//! Onboarding Flow
//!
//! An app onboarding flow driven by a rule-guarded state machine.
//!
//! Key concepts:
//! - Required rules block a transition (terms must be accepted)
//! - Optional rules only report (analytics consent)
//! - A transition effect "shows the screen" for the new state
//! - Persisting the current state and reading it back
//!
//! Run with: RUST_LOG=debug cargo run --example onboarding_flow

use statelane::core::FnRule;
use statelane::delivery::TokioDispatcher;
use statelane::engine::{StateMachine, Transition};
use statelane::storage::FileStorage;
use statelane::{event_enum, state_enum, State};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

state_enum! {
    enum Screen {
        Welcome,
        Terms,
        SignIn,
        Home,
    }
    final: [Home]
}

event_enum! {
    enum Onboarding {
        Continue,
        AcceptTerms,
        SignedIn,
        Back,
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    println!("=== Onboarding Flow ===\n");

    let dir = tempfile::tempdir()?;
    let terms_accepted = Arc::new(AtomicBool::new(false));
    let analytics_consent = Arc::new(AtomicBool::new(false));

    let machine: StateMachine<Screen, Onboarding> = StateMachine::builder()
        .initial(Screen::Welcome)
        .dispatcher(TokioDispatcher::current())
        .storage(FileStorage::new(dir.path().join("onboarding.json")))
        .effect(|screen: &Screen, event: &Onboarding| -> anyhow::Result<()> {
            println!("  [Effect] {:?} -> showing {}", event, screen.name());
            Ok(())
        })
        .build()?;

    let accepted = Arc::clone(&terms_accepted);
    let consent = Arc::clone(&analytics_consent);

    machine.add_transition(Transition::new(
        Onboarding::Continue,
        Screen::Welcome,
        Screen::Terms,
    ));
    machine.add_transition(
        Transition::new(Onboarding::AcceptTerms, Screen::Terms, Screen::SignIn)
            .rule(
                FnRule::required(move || accepted.load(Ordering::SeqCst))
                    .with_failure_callback(|| println!("  [Rule] terms must be accepted first")),
            )
            .rule(
                FnRule::optional(move || consent.load(Ordering::SeqCst)).with_failure_callback(
                    || println!("  [Rule] continuing without analytics consent"),
                ),
            ),
    );
    machine.add_transition(Transition::new(
        Onboarding::SignedIn,
        Screen::SignIn,
        Screen::Home,
    ));
    machine.add_transition(Transition::new(
        Onboarding::Back,
        Screen::SignIn,
        Screen::Terms,
    ));

    let steps = [
        Onboarding::Continue,
        Onboarding::AcceptTerms,
        Onboarding::SignedIn,
    ];
    for event in steps {
        let result = machine.process_async(event).await;
        println!("{:?}: {:?} (now {})", event, result, machine.current_state().name());
    }

    println!("\nUser accepts the terms:");
    terms_accepted.store(true, Ordering::SeqCst);
    for event in steps.into_iter().skip(1) {
        let result = machine.process_async(event).await;
        println!("{:?}: {:?} (now {})", event, result, machine.current_state().name());
    }

    machine.store_current_state()?;
    println!("\nStored state: {:?}", machine.restored_state());
    println!("Finished: {}", machine.is_final());

    let history = machine.history();
    let path: Vec<&str> = history.get_path().into_iter().map(|s| s.name()).collect();
    println!("Path: {}", path.join(" -> "));

    machine.clear_state_storage()?;
    println!("Stored state after clearing: {:?}", machine.restored_state());

    Ok(())
}
