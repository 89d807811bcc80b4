//! End-to-end target discovery against the mock client.
//!
//! Run with:
//!   cargo test --test target_discovery

#![cfg(feature = "mock")]

use azwebapp::backends::mock::MockBackend;
use azwebapp::discovery::{discover_targets, ENVIRONMENT_TAG, ROLE_TAG};
use azwebapp::endpoint::build_endpoint;
use azwebapp::log::InMemoryLog;
use azwebapp::service_message::{attributes, CREATE_WEB_APP_TARGET};
use azwebapp::variables::keys;
use azwebapp::{
    factory, ClientType, Config, Result, ServiceMessage, Variables, WebAppClient, WebAppResource,
};

const CONTEXT: &str = r#"{
    "scope": {
        "spaceId": "Spaces-1",
        "environmentId": "dev",
        "projectId": "Projects-1",
        "tenantId": null,
        "roles": ["web"]
    },
    "account": {
        "subscriptionNumber": "dad814cf-1c1e-4953-b950-c373a821c34f",
        "clientId": "a9ec7d56-5ed5-42d0-b5cf-bfdd33afa46e",
        "tenantId": "3d13e379-e666-469e-ac38-ec6fd61c1166",
        "password": "secret",
        "azureEnvironment": "",
        "resourceManagementEndpointBaseUri": "",
        "activeDirectoryEndpointBaseUri": ""
    }
}"#;

fn tagged(resource: WebAppResource, environment: &str, role: &str) -> WebAppResource {
    resource
        .with_tag(ENVIRONMENT_TAG, environment)
        .with_tag(ROLE_TAG, role)
}

fn seeded_mock(_config: Config) -> Result<Box<dyn WebAppClient>> {
    Ok(Box::new(MockBackend::with_web_apps(vec![
        tagged(WebAppResource::web_app("A", "rg"), "dev", "web"),
        tagged(WebAppResource::slot("A", "blue", "rg"), "dev", "web"),
        tagged(WebAppResource::slot("A", "green", "rg"), "dev", "other"),
        tagged(WebAppResource::web_app("B", "rg"), "prod", "web"),
        tagged(WebAppResource::web_app("C", "other-rg"), "dev", "web"),
    ])))
}

// Every test in this binary swaps the mock factory for the seeded one.
fn init_library() {
    azwebapp::init();
    factory::register_client("mock", seeded_mock);
}

fn variables() -> Variables {
    Variables::new()
        .with(keys::TARGET_DISCOVERY_CONTEXT, CONTEXT)
        .with(keys::RESOURCE_GROUP_NAME, "rg")
        .with(keys::ACCOUNT_ID, "Accounts-1")
}

#[tokio::test]
async fn test_discovery_emits_one_line_per_match() {
    init_library();
    let log = InMemoryLog::new();

    let results = discover_targets(&variables(), Config::new(ClientType::Mock), &log)
        .await
        .unwrap();

    let names: Vec<_> = results.iter().map(|r| r.target_name.as_str()).collect();
    assert_eq!(names, vec!["A", "A/blue"]);

    let lines: Vec<String> = log
        .standard_out()
        .into_iter()
        .filter(|line| line.starts_with("##octopus["))
        .collect();
    assert_eq!(lines.len(), 2);
    assert!(lines[1].starts_with(
        r#"##octopus[create-azurewebapptarget name="QS9ibHVl" azureWebAppSlot="Ymx1ZQ==""#
    ));
}

#[tokio::test]
async fn test_emitted_lines_resolve_to_endpoints() {
    init_library();
    let log = InMemoryLog::new();
    let variables = variables();

    discover_targets(&variables, Config::new(ClientType::Mock), &log)
        .await
        .unwrap();

    let endpoints: Vec<_> = log
        .standard_out()
        .iter()
        .filter_map(|line| ServiceMessage::parse(line).ok())
        .filter(|message| message.name() == CREATE_WEB_APP_TARGET)
        .map(|message| {
            assert_eq!(message.get(attributes::UPDATE_IF_EXISTING), Some("True"));
            assert_eq!(message.get(attributes::IS_DYNAMIC), Some("True"));
            assert_eq!(message.get(attributes::ROLES), Some("web"));

            build_endpoint(
                &message.to_property_map(),
                &variables,
                |key| (key == "Accounts-1").then(|| "Accounts-1".to_string()),
                |_| None,
                &log,
            )
            .unwrap()
        })
        .collect();

    assert_eq!(endpoints.len(), 2);
    assert_eq!(endpoints[0].web_app_name, "A");
    assert_eq!(endpoints[0].slot(), None);
    assert_eq!(endpoints[1].web_app_name, "A");
    assert_eq!(endpoints[1].web_app_slot_name, "blue");
    assert!(endpoints.iter().all(|e| e.resource_group_name == "rg"));
    assert!(endpoints.iter().all(|e| e.account_id == "Accounts-1"));
    assert!(log.errors().is_empty());
}

#[tokio::test]
async fn test_context_without_subscription_disables_discovery() {
    init_library();
    let log = InMemoryLog::new();
    let context = CONTEXT.replace("dad814cf-1c1e-4953-b950-c373a821c34f", "");
    let variables = variables().with(keys::TARGET_DISCOVERY_CONTEXT, context);

    let results = discover_targets(&variables, Config::new(ClientType::Mock), &log)
        .await
        .unwrap();

    assert!(results.is_empty());
    assert!(log
        .standard_out()
        .iter()
        .all(|line| !line.starts_with("##octopus[")));
}

#[tokio::test]
async fn test_malformed_context_disables_discovery() {
    init_library();
    let log = InMemoryLog::new();
    let variables = variables().with(keys::TARGET_DISCOVERY_CONTEXT, "{ not json");

    let results = discover_targets(&variables, Config::new(ClientType::Mock), &log)
        .await
        .unwrap();

    assert!(results.is_empty());
}
