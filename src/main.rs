/// did:stack:v2 resolver service
///
/// Universal resolver driver for did:stack:v2 identifiers backed by a
/// Stacks node API.
use stacks_did_resolver::{
    config::{LoggingConfig, ResolverConfig, DEFAULT_LOG_FILTER},
    context::AppContext,
    error::ServiceResult,
    server,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> ServiceResult<()> {
    let config = ResolverConfig::from_env()?;

    init_tracing(&config.logging);
    print_banner();

    let ctx = AppContext::new(config)?;
    server::serve(ctx).await?;

    Ok(())
}

fn init_tracing(logging: &LoggingConfig) {
    let filter = EnvFilter::try_new(&logging.level).unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    let registry = tracing_subscriber::registry().with(filter);

    if logging.json {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}

fn print_banner() {
    println!(
        r#"
     _ _     _       _             _      _        ____
  __| (_) __| |  ___| |_ __ _  ___| | __ (_)_   _|___ \
 / _` | |/ _` | / __| __/ _` |/ __| |/ / | \ \ / / __) |
| (_| | | (_| |_\__ \ || (_| | (__|   < _| |\ V / / __/
 \__,_|_|\__,_(_)___/\__\__,_|\___|_|\_(_)_| \_/ |_____|

        did:stack:v2 resolver v{}
        "#,
        env!("CARGO_PKG_VERSION")
    );
}
