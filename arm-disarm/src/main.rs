use arm_disarm::{function_handler, DatabaseConfig, MySqlConnector};
use lambda_runtime::{run, service_fn, tracing, Error};

#[tokio::main]
async fn main() -> Result<(), Error> {
    tracing::init_default_subscriber();

    let connector = MySqlConnector;

    // Configuration is read on every invocation, nothing is cached between them.
    run(service_fn(|event| {
        function_handler(&connector, DatabaseConfig::from_env(), event)
    }))
    .await
}
