//! Target discovery and settings reconciliation against the mock client.
//!
//! Run with:
//!   RUST_LOG=azwebapp=debug cargo run --example discover

use azwebapp::backends::mock::MockBackend;
use azwebapp::discovery::{DiscoveryContext, TargetDiscovery, ENVIRONMENT_TAG, ROLE_TAG};
use azwebapp::log::ConsoleLog;
use azwebapp::settings::SettingsReconciler;
use azwebapp::variables::keys;
use azwebapp::{Variables, WebAppClient, WebAppResource};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

const CONTEXT: &str = r#"{
    "scope": { "spaceId": "Spaces-1", "environmentId": "dev", "projectId": "Projects-1",
               "tenantId": null, "roles": ["web"] },
    "account": { "subscriptionNumber": "dad814cf-1c1e-4953-b950-c373a821c34f" }
}"#;

#[tokio::main]
async fn main() -> azwebapp::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "azwebapp=debug,info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let mut client = MockBackend::new();
    client.init().await?;

    for resource in [
        WebAppResource::web_app("shop", "demo-rg"),
        WebAppResource::slot("shop", "blue", "demo-rg"),
        WebAppResource::slot("shop", "green", "demo-rg"),
    ] {
        let role = if resource.name == "green" { "batch" } else { "web" };
        client
            .add_web_app(
                resource
                    .with_tag(ENVIRONMENT_TAG, "dev")
                    .with_tag(ROLE_TAG, role),
            )
            .await;
    }

    let log = ConsoleLog::new();
    let context = DiscoveryContext::from_json(CONTEXT)?;

    println!("Discovering targets in demo-rg...");
    let results = TargetDiscovery::new(&client, &log)
        .discover_and_report(&context.scope, "demo-rg")
        .await?;
    for result in &results {
        println!("  - {} (role: {})", result.target_name, result.role);
    }

    let variables = Variables::new()
        .with(keys::WEB_APP_NAME, "shop/blue")
        .with(keys::RESOURCE_GROUP_NAME, "demo-rg")
        .with(
            keys::APP_SETTINGS,
            r#"[{"name":"FEATURE_FLAG","value":"on","slotSetting":true},
                {"name":"LOG_LEVEL","value":"debug"}]"#,
        )
        .with(
            keys::CONNECTION_STRINGS,
            r#"[{"name":"orders","value":"Server=orders.example;","type":"SQLAzure"}]"#,
        );

    println!("\nReconciling settings...");
    let updated = SettingsReconciler::new(&mut client, &log)
        .run(&variables)
        .await?;
    if let Some(site) = updated {
        println!("Settings on {}:", site);
        for (name, value) in client.app_settings(&site).await {
            println!("  {} = {}", name, value);
        }
        println!("Slot settings: {:?}", client.slot_sticky_names(&site).await);
        println!("Calls: {:?}", client.calls().await);
    }

    client.close().await?;
    Ok(())
}
