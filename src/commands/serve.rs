//! Run the HTTP planning server

use crate::config::Config;
use crate::error::Result;
use crate::server;

/// Execute the serve command
///
/// # Arguments
///
/// * `config` - Loaded application configuration
/// * `bind_override` - Optional bind address override
pub async fn execute(mut config: Config, bind_override: Option<String>) -> Result<()> {
    if let Some(bind) = bind_override {
        config.server.bind = bind;
    }
    server::serve(&config).await
}
