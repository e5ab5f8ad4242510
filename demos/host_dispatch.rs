//! Host dispatch example.
//!
//! Drives the sound service the way a plugin host would, using the mock
//! backend so no audio hardware is needed.
//!
//! Run with: cargo run --example host_dispatch

use ui_sounds::{result_callback, CacheEvent, Dispatch, MockBackend, Params, UiSounds};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize tracing for debug output
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "ui_sounds=debug".into()),
        )
        .init();

    let backend = MockBackend::new();
    backend.add_asset("www/sounds/click.mp3");
    backend.add_asset("www/sounds/toggle.mp3");
    backend.fail_prepare("www/sounds/broken.mp3", "unsupported codec");

    let service = UiSounds::builder()
        .backend(backend)
        .on_event(|event| {
            if let CacheEvent::PlaybackStarted {
                id,
                lazy_loaded: true,
                ..
            } = event
            {
                println!("hint: preload '{id}' to avoid the load on first play");
            }
        })
        .build()?;

    let commands = [
        ("preloadMultiple", r#"["sounds/click.mp3", "sounds/broken.mp3", 3]"#),
        ("playSound", r#"["sounds/click.mp3", 0.5]"#),
        ("playSound", r#"["sounds/toggle.mp3"]"#),
        ("playSound", r#"["sounds/click.mp3", 2.0]"#),
        ("unloadSound", r#"["sounds/click.mp3"]"#),
        ("vibrate", r"[]"),
    ];

    for (action, json) in commands {
        match service.submit(action, Params::from_json(json)?) {
            Some(pending) => println!("{action:<16} -> {}", pending.await),
            None => println!("{action:<16} -> not handled"),
        }
    }

    // Fire-and-forget style, as a plugin bridge would call it
    let dispatch = service.execute(
        "unloadSound",
        Params::from_json(r#"["sounds/toggle.mp3"]"#)?,
        result_callback(|result| println!("callback: {result}")),
    );
    assert_eq!(dispatch, Dispatch::Accepted);
    tokio::time::sleep(std::time::Duration::from_millis(50)).await;

    println!("Stats: {:?}", service.stats());
    let released = service.shutdown();
    println!("Released {released} sounds at shutdown");

    Ok(())
}
