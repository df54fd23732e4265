use std::sync::{Arc, Mutex};
use tracing_subscriber::prelude::*;
use tracing_subscriber::{layer::Context, Layer, Registry};

/// Custom Layer to collect emitted event messages.
struct EventCollector {
    events: Arc<Mutex<Vec<String>>>,
}

impl<S> Layer<S> for EventCollector
where
    S: tracing::Subscriber,
{
    fn on_event(&self, event: &tracing::Event<'_>, _ctx: Context<'_, S>) {
        self.events.lock().unwrap().push(format!("{:?}", event));
    }
}

#[tokio::test]
async fn emits_trace_initialised_event() {
    let events = Arc::new(Mutex::new(Vec::new()));
    let collector = EventCollector {
        events: events.clone(),
    };
    let subscriber = Registry::default().with(collector);
    let _guard = tracing::subscriber::set_default(subscriber);

    use sdkgen::cli::{run, Cli, Commands};

    let cli = Cli {
        command: Commands::List,
    };
    run(cli).await.expect("list should succeed");

    let event_msgs = events.lock().unwrap();
    assert!(
        event_msgs.iter().any(|msg| msg.contains("trace_initialised")),
        "Expected a 'trace_initialised' trace event, got: {:?}",
        event_msgs
    );
    assert!(
        event_msgs.iter().any(|msg| msg.contains("Generator registry built")),
        "Expected the registry build to be traced, got: {:?}",
        event_msgs
    );
}

#[tokio::test]
async fn failed_config_load_is_traced() {
    let events = Arc::new(Mutex::new(Vec::new()));
    let subscriber = Registry::default().with(EventCollector {
        events: events.clone(),
    });
    let _guard = tracing::subscriber::set_default(subscriber);

    use sdkgen::cli::{run, Cli, Commands};

    let cli = Cli {
        command: Commands::Generate {
            config: std::path::PathBuf::from("dummy.yaml"),
            json: false,
        },
    };
    assert!(run(cli).await.is_err());

    let event_msgs = events.lock().unwrap();
    assert!(
        event_msgs
            .iter()
            .any(|msg| msg.contains("Failed to read config file")),
        "Expected a config read failure event, got: {:?}",
        event_msgs
    );
}
