use std::sync::Arc;

use tether::config::Config;
use tether::recovery::ToolRecovery;
use tether::{Server, handlers, logging};
use tracing::info;

#[tokio::main]
async fn main() -> Result<(), tether::Error> {
    let config = Config::from_env()?;
    logging::init(config.log_format);

    let backend = Arc::new(ToolRecovery::new(&config.tools_dir));
    let pipeline = handlers::registry(backend)?.compose(&config.pipeline)?;
    info!(pipeline = %config.pipeline.join(","), tools = %config.tools_dir.display(), "pipeline composed");

    Server::new(config.addr).body_limit(config.body_limit).serve(pipeline).await
}
