// CampusHub
// Copyright (C) 2025 Synerthink

// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.

// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU Affero General Public License for more details.

// You should have received a copy of the GNU Affero General Public License
// along with this program.  If not, see <http://www.gnu.org/licenses/>.

use anyhow::Context;
use campus_api::{config::Config, server::ApiServer};
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    info!("Starting CampusHub API");

    // Load configuration
    let config = Config::from_env().context("failed to load configuration")?;
    info!("Loaded configuration: bind_address={}", config.bind_address);

    // Create and start the API server
    let server = ApiServer::new(config).await?;
    info!("CampusHub API started on http://{}", server.bind_address());

    server.run().await?;

    Ok(())
}
