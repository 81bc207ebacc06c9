mod common;

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Barrier};
use std::thread;
use std::time::Duration;

use tempfile::TempDir;

use docqa_core::config::{EmbeddingProviderKind, Settings};
use docqa_core::Error;
use docqa_rag::ServingState;

use common::{engine, ScriptedGenerator};

#[test]
fn concurrent_first_use_initializes_once() {
    let inits = Arc::new(AtomicUsize::new(0));
    let generator = ScriptedGenerator::new(Some("YES"), Some("answer"));
    let state = {
        let inits = inits.clone();
        Arc::new(ServingState::new(Box::new(move || {
            inits.fetch_add(1, Ordering::SeqCst);
            thread::sleep(Duration::from_millis(50));
            Ok(engine(&generator, true))
        })))
    };
    assert!(!state.is_ready());

    let threads = 8;
    let barrier = Arc::new(Barrier::new(threads));
    let handles: Vec<_> = (0..threads)
        .map(|_| {
            let state = state.clone();
            let barrier = barrier.clone();
            thread::spawn(move || {
                barrier.wait();
                state.engine().unwrap()
            })
        })
        .collect();
    let engines: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();

    assert_eq!(inits.load(Ordering::SeqCst), 1);
    assert!(engines.windows(2).all(|w| Arc::ptr_eq(&w[0], &w[1])));
    assert!(state.is_ready());
}

#[test]
fn failed_initialization_is_retried() {
    let attempts = Arc::new(AtomicUsize::new(0));
    let generator = ScriptedGenerator::new(Some("YES"), Some("answer"));
    let state = {
        let attempts = attempts.clone();
        ServingState::new(Box::new(move || {
            if attempts.fetch_add(1, Ordering::SeqCst) == 0 {
                Err(Error::NotFound("index file".into()))
            } else {
                Ok(engine(&generator, true))
            }
        }))
    };

    assert!(matches!(state.engine(), Err(Error::NotFound(_))));
    assert!(!state.is_ready());
    let result = state.answer("What is LangGraph persistence?").unwrap();
    assert!(result.grounded);
    assert_eq!(attempts.load(Ordering::SeqCst), 2);
    state.engine().unwrap();
    assert_eq!(attempts.load(Ordering::SeqCst), 2);
}

#[test]
fn missing_index_is_fatal_at_startup() {
    let tmp = TempDir::new().unwrap();
    let mut settings = Settings::default();
    settings.embedding.provider = EmbeddingProviderKind::Hash;
    settings.index.path = tmp.path().join("absent/index.bin");
    let state = ServingState::from_settings(settings);
    assert!(matches!(state.answer("anything"), Err(Error::NotFound(_))));
    assert!(!state.is_ready());
}
