//! Deploys one token: reads `MINTLEDGER_*` settings, initializes the ledger
//! and reports what was set up.

use anyhow::Context;

use mintledger_core::{Amount, TokenId};
use mintledger_infra::{InMemoryTokenService, LedgerConfig};
use mintledger_observability::tracing::LogFormat;

/// What a successful deployment produced.
#[derive(Debug)]
struct Deployment {
    service: InMemoryTokenService,
    supply_limit: Amount,
    implementation: String,
}

fn deploy(config: &LedgerConfig) -> anyhow::Result<Deployment> {
    let token_id = config.token_id.unwrap_or_else(TokenId::new);
    let (service, _bus) = InMemoryTokenService::in_memory(token_id);

    let committed = service
        .initialize_from_config(config)
        .context("token initialization failed")?;
    tracing::debug!(%token_id, events = committed.len(), "initialization committed");

    Ok(Deployment {
        supply_limit: service.total_supply_limit()?,
        implementation: service.implementation()?,
        service,
    })
}

fn main() -> anyhow::Result<()> {
    let format = std::env::var("MINTLEDGER_LOG_FORMAT")
        .map(|v| LogFormat::from_name(&v))
        .unwrap_or_default();
    mintledger_observability::tracing::init(format);

    let config = LedgerConfig::from_env().context("invalid deployment configuration")?;
    let deployment = deploy(&config).inspect_err(|e| tracing::error!(error = %e, "deployment failed"))?;

    tracing::info!(
        token_id = %deployment.service.token_id(),
        name = %config.name,
        symbol = %config.symbol,
        decimals = config.decimals,
        supply_limit = %deployment.supply_limit,
        implementation = %deployment.implementation,
        default_admin = %config.roles.default_admin,
        minter = %config.roles.minter,
        "token deployed"
    );
    Ok(())
}
