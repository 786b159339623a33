// relo-client/examples/permission_probe.rs
// 权限探测示例: load the signed-in user's permissions and print what they may do

use std::sync::Arc;

use relo_client::{Action, ClientConfig, PermissionGate, PermissionProvider, guard, menu, logger};
use shared::resources;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    logger::init_logger();

    let config = ClientConfig::from_env();
    let gate = Arc::new(PermissionGate::from_config(&config)?);

    // Token passed on the command line wins over the configured store
    if let Some(token) = std::env::args().nth(1) {
        gate.tokens().set(&config.token_key, &token)?;
    }

    tracing::info!(api = %config.base_url, "Loading permissions");
    let provider = PermissionProvider::mount(gate.clone(), None);
    provider.ready().await;

    if let Some(error) = gate.error() {
        tracing::warn!("{error}");
    }

    println!("superadmin: {}", gate.is_superadmin());
    for resource in resources::ALL {
        let allowed: Vec<&str> = Action::ALL
            .iter()
            .filter(|action| gate.has_permission(resource, **action))
            .map(|action| action.as_str())
            .collect();
        if !allowed.is_empty() {
            println!("{resource:<22} {}", allowed.join(", "));
        }
    }

    println!();
    for item in menu::visible(&gate, &menu::dashboard()) {
        println!("- {}", item.label);
        for sub in &item.sub_items {
            println!("  - {}", sub.label);
        }
    }

    let access = guard::evaluate(&gate, &guard::RouteRequirement::page(resources::BOOKING));
    println!("\n/booking-list: {access:?}");

    provider.unmount().await;
    Ok(())
}
