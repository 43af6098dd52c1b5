//! Synchronous injection: register a singleton, make the container the
//! default, and call an injected function without passing the service.

use injekt::logging::{init_logging, LoggingConfig};
use injekt::{inject, Arg, CallArgs, Container, Inject};

struct MyService;

impl MyService {
    fn greet(&self, name: &str) -> String {
        format!("Hello {name} from MyService")
    }
}

fn main() -> anyhow::Result<()> {
    init_logging(LoggingConfig::development()).map_err(|e| anyhow::anyhow!(e))?;

    let container = Container::new();
    container.register_singleton("my_service", || MyService);
    container.set_default();

    let handler = inject(|svc: Inject<MyService>, name: Arg<String>| svc.greet(&name));
    println!("{}", handler.call_with(CallArgs::new().with("world".to_string()))?);

    println!("{}", container.get_stats().performance_summary());
    Ok(())
}
