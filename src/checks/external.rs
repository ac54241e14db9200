//! Membership checks against the Home Assistant brands and wheels registries

use futures_util::FutureExt;

use super::manifest::no_integration_requirements;
use super::{CheckDefinition, CheckFuture, CheckResponse};
use crate::category::Category;
use crate::context::{CheckContext, RepoSlug};

const URL_BRANDS: &str = "https://hacs.xyz/docs/publish/include#check-brands";
const URL_WHEELS: &str = "https://hacs.xyz/docs/publish/include#check-wheels";

pub fn checks(repository: &RepoSlug) -> Vec<CheckDefinition> {
    vec![
        CheckDefinition::new(
            "brands",
            format!("{repository} is added to https://github.com/home-assistant/brands NICE!"),
            URL_BRANDS,
            brands,
        )
        .ignore_when(not_integration),
        CheckDefinition::new("wheels", "Python wheels", URL_WHEELS, wheels)
            .ignore_when(no_integration_requirements),
    ]
}

fn not_integration(ctx: &CheckContext) -> bool {
    !ctx.env.is_category(Category::Integration)
}

/// The manifest domain, or the message explaining why `what` cannot be checked
fn manifest_domain<'a>(ctx: &'a CheckContext, what: &str) -> Result<&'a str, CheckResponse> {
    if ctx.files.manifest.found().is_none() {
        return Err(CheckResponse::Message(format!(
            "manifest.json file not found, cannot check {what}"
        )));
    }
    ctx.files.manifest_domain().ok_or_else(|| {
        CheckResponse::Message(format!(
            "domain missing from manifest.json, cannot check {what}"
        ))
    })
}

fn brands(ctx: &CheckContext) -> CheckFuture<'_> {
    async move {
        let domain = match manifest_domain(ctx, "brands") {
            Ok(domain) => domain,
            Err(response) => return Ok(response),
        };
        let url = ctx.services.urls.brands(domain);
        let listed = ctx.services.probe.exists(&url).await?;
        Ok(CheckResponse::pass_or(
            listed,
            format!(
                "{domain} is not added to the custom_integration directory in https://github.com/home-assistant/brands"
            ),
        ))
    }
    .boxed()
}

fn wheels(ctx: &CheckContext) -> CheckFuture<'_> {
    async move {
        let domain = match manifest_domain(ctx, "wheels") {
            Ok(domain) => domain,
            Err(response) => return Ok(response),
        };
        let url = ctx.services.urls.wheels(domain);
        let listed = ctx.services.probe.exists(&url).await?;
        Ok(CheckResponse::pass_or(listed, "Python Wheels"))
    }
    .boxed()
}
