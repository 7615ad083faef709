use std::sync::Arc;

use coursefile_shared::{telemetry, AppState, Config};
use lambda_http::{run, service_fn, Error, Request};

mod http_handler;

#[tokio::main]
async fn main() -> Result<(), Error> {
    let config = Config::from_env()?;
    telemetry::init_tracing(config.log_format);

    let state = Arc::new(AppState::from_config(config).await);

    run(service_fn(move |event: Request| {
        let state = state.clone();
        async move { http_handler::function_handler(event, state).await }
    }))
    .await
}
