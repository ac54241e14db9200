use super::{CheckDefinition, CheckFuture, CheckResponse, ready};
use crate::context::CheckContext;
use crate::layout;

const URL_HACS: &str = "https://hacs.xyz/docs/publish/include#check-hacs";

pub fn checks() -> Vec<CheckDefinition> {
    vec![CheckDefinition::new(
        "hacs",
        "HACS load-ability check (does not try to load)",
        URL_HACS,
        hacs,
    )]
}

fn hacs(ctx: &CheckContext) -> CheckFuture<'_> {
    let Some(category) = ctx.env.category else {
        return ready(Ok(CheckResponse::Message("Invalid category.".to_string())));
    };
    let verdict = layout::evaluate(
        layout::rules_for(category),
        &ctx.files.tree,
        &ctx.env.repository.name,
    );
    ready(verdict.map(|failure| match failure {
        Some(message) => CheckResponse::Message(message.to_string()),
        None => CheckResponse::Bool(true),
    }))
}
