//! Health check for web app targets.

use crate::log::Log;
use crate::variables::{keys, Variables};
use crate::{AccountCredentials, AzWebAppError, Result, ServiceMessage, TargetSite, WebAppClient, WebAppResource};
use tracing::info;

/// Confirms the web app named by `variables` exists.
///
/// Publishes the app's App Service plan id as the
/// `Octopus.Action.Azure.AppServicePlanId` output variable when the site
/// reports one.
///
/// # Errors
///
/// - [`AzWebAppError::Required`]: web app or resource group name missing
/// - [`AzWebAppError::SiteNotFound`]: the web app does not exist
/// - Client errors, unchanged
pub async fn check(
    client: &dyn WebAppClient,
    variables: &Variables,
    log: &dyn Log,
) -> Result<WebAppResource> {
    let web_app_name = variables
        .get_non_blank(keys::WEB_APP_NAME)
        .ok_or_else(|| AzWebAppError::Required("Web App Name".to_string()))?;
    let resource_group = variables
        .get_non_blank(keys::RESOURCE_GROUP_NAME)
        .ok_or_else(|| AzWebAppError::Required("resource group name".to_string()))?;

    let site = TargetSite::parse(resource_group, web_app_name, None);
    site.validate()?;

    let Some(web_app) = client.get_web_app(&site.resource_group, &site.site).await? else {
        return Err(AzWebAppError::SiteNotFound {
            web_app: site.site,
            resource_group: site.resource_group,
            subscription: AccountCredentials::from_variables(variables).subscription_number,
        });
    };

    match &web_app.server_farm_id {
        Some(plan_id) => {
            log.write_service_message(&ServiceMessage::set_variable(
                keys::APP_SERVICE_PLAN_ID,
                plan_id,
            ));
        }
        None => log.warn(&format!(
            "Web app {} reports no App Service plan",
            web_app.name
        )),
    }

    info!(web_app = %site.site, resource_group = %site.resource_group, "health check passed");
    Ok(web_app)
}
