//! Async injection: the service is built by an async factory and the
//! handler itself is async.

use std::time::Duration;

use injekt::logging::{init_logging, LoggingConfig};
use injekt::{inject_async, BoxError, ConfigLoader, Container, Inject};

struct MyService {
    greeting: String,
}

impl MyService {
    async fn connect() -> Result<Self, BoxError> {
        tokio::time::sleep(Duration::from_millis(100)).await;
        Ok(Self {
            greeting: "Hello from async MyService".to_string(),
        })
    }

    async fn greet(&self) -> String {
        tokio::time::sleep(Duration::from_millis(100)).await;
        self.greeting.clone()
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_logging(LoggingConfig::default()).map_err(|e| anyhow::anyhow!(e))?;

    // INJEKT_CONTAINER_NAME / INJEKT_TRACK_STATS are honoured here.
    let config = ConfigLoader::new().load_config()?;
    let container = Container::with_config(config);
    container.register_async_singleton("my_service", MyService::connect);
    container.set_default();

    let handler = inject_async(|svc: Inject<MyService>| async move { svc.greet().await });
    println!("{}", handler.call().await?);
    println!("{}", handler.call().await?);

    println!("{}", container.get_stats().performance_summary());
    Ok(())
}
