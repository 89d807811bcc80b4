//! Target discovery.
//!
//! Finds web apps and slots whose tags place them in the scope's environment
//! and roles, and announces each one as a `create-azurewebapptarget` service
//! message. Discovery only reads; it never changes a resource.
//!
//! # Flow
//!
//! 1. Read the [`DiscoveryContext`] from deployment variables.
//! 2. List the resource group's web apps, each followed by its slots.
//! 3. [`scan`] the snapshot against the scope.
//! 4. Write one service message per [`DiscoveryResult`].
//!
//! Missing configuration disables discovery with a warning rather than
//! scanning part of the estate. Listing failures abort the whole run.

mod context;
mod scanner;

pub use context::{DiscoveryContext, DiscoveryScope};
pub use scanner::{matching_role, scan, DiscoveryResult, ENVIRONMENT_TAG, ROLE_TAG};

use crate::log::Log;
use crate::variables::{keys, Variables};
use crate::{factory, Config, Result, WebAppClient, WebAppResource};
use tracing::{debug, info, warn};

/// Drives a discovery run against one client.
pub struct TargetDiscovery<'a> {
    client: &'a dyn WebAppClient,
    log: &'a dyn Log,
}

impl<'a> TargetDiscovery<'a> {
    pub fn new(client: &'a dyn WebAppClient, log: &'a dyn Log) -> Self {
        Self { client, log }
    }

    /// Lists every web app in `resource_group` followed by its slots.
    ///
    /// Apps keep the order the client returns them in. Slots of every app
    /// are listed, since a slot is matched on its own tags.
    pub async fn candidates(&self, resource_group: &str) -> Result<Vec<WebAppResource>> {
        let mut candidates = Vec::new();

        for app in self.client.list_web_apps(resource_group).await? {
            let slots = self.client.list_slots(resource_group, &app.name).await?;
            debug!(
                web_app = %app.name,
                resource_group = %resource_group,
                slots = slots.len(),
                "enumerated web app"
            );
            candidates.push(app);
            candidates.extend(slots);
        }

        Ok(candidates)
    }

    /// Finds the resources in `resource_group` that match `scope`.
    pub async fn discover(
        &self,
        scope: &DiscoveryScope,
        resource_group: &str,
    ) -> Result<Vec<DiscoveryResult>> {
        let candidates = self.candidates(resource_group).await?;
        Ok(scan(&candidates, scope))
    }

    /// Discovers matches and writes one service message per match.
    pub async fn discover_and_report(
        &self,
        scope: &DiscoveryScope,
        resource_group: &str,
    ) -> Result<Vec<DiscoveryResult>> {
        let results = self.discover(scope, resource_group).await?;

        for result in &results {
            self.log.verbose(&format!(
                "Discovered matching web app target {}",
                result.target_name
            ));
            self.log.write_service_message(&result.to_service_message());
        }

        info!(
            resource_group = %resource_group,
            matches = results.len(),
            "target discovery complete"
        );
        Ok(results)
    }
}

/// Runs discovery as configured by deployment variables.
///
/// The client is built from `config` with the context's account. Returns
/// the matches written to `log`; an empty vector when discovery is disabled
/// by missing configuration.
///
/// # Errors
///
/// Client construction, initialization, and listing errors propagate
/// unchanged and abort the run.
pub async fn discover_targets(
    variables: &Variables,
    config: Config,
    log: &dyn Log,
) -> Result<Vec<DiscoveryResult>> {
    let Some(context) = read_context(variables, log) else {
        return Ok(Vec::new());
    };

    if !context.account.has_subscription() {
        log.warn("Target discovery is disabled: the account has no subscription id.");
        return Ok(Vec::new());
    }

    let Some(resource_group) = variables.get_non_blank(keys::RESOURCE_GROUP_NAME) else {
        log.warn(&format!(
            "Target discovery is disabled: variable {} is not set.",
            keys::RESOURCE_GROUP_NAME
        ));
        return Ok(Vec::new());
    };

    let client = factory::new_client(config.with_account(context.account.clone()))?;
    scan_with_client(client, &context.scope, resource_group, log).await
}

// Close failures are logged so they never mask the scan outcome.
async fn scan_with_client(
    mut client: Box<dyn WebAppClient>,
    scope: &DiscoveryScope,
    resource_group: &str,
    log: &dyn Log,
) -> Result<Vec<DiscoveryResult>> {
    client.init().await?;

    let outcome = TargetDiscovery::new(client.as_ref(), log)
        .discover_and_report(scope, resource_group)
        .await;

    if let Err(e) = client.close().await {
        warn!(client = %client.name(), error = %e, "failed to close client after target discovery");
    }
    outcome
}

fn read_context(variables: &Variables, log: &dyn Log) -> Option<DiscoveryContext> {
    let Some(json) = variables.get_non_blank(keys::TARGET_DISCOVERY_CONTEXT) else {
        log.warn(&format!(
            "Target discovery is disabled: variable {} is not set.",
            keys::TARGET_DISCOVERY_CONTEXT
        ));
        return None;
    };

    match DiscoveryContext::from_json(json) {
        Ok(context) => Some(context),
        Err(e) => {
            log.warn(&format!(
                "Target discovery is disabled: could not read the discovery context: {}",
                e
            ));
            None
        }
    }
}
