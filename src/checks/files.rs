//! File existence checks

use once_cell::sync::Lazy;
use regex::Regex;

use super::{CheckDefinition, CheckFuture, CheckResponse, ready};
use crate::category::Category;
use crate::context::CheckContext;

const URL_INFO: &str = "https://hacs.xyz/docs/publish/include#check-info";
const URL_IMAGES: &str = "https://hacs.xyz/docs/publish/include#check-images";

const NO_IMAGES: &str = "There should be images to show the user what they get";

/// Images whose tag contains one of these are badges, not screenshots
const BADGE_MARKERS: &[&str] = &["-shield", "img.shields.io", "buymeacoffee.com"];

static IMAGE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)<img[^>]+>|!\[[^\]]*\]\([^)]+\)").expect("image regex should compile")
});

pub fn checks() -> Vec<CheckDefinition> {
    vec![
        CheckDefinition::new(
            "information",
            "Information file exists",
            URL_INFO,
            information,
        ),
        CheckDefinition::new("images", "Information file has images", URL_IMAGES, images)
            .ignore_when(not_visual_category),
    ]
}

fn not_visual_category(ctx: &CheckContext) -> bool {
    !(ctx.env.is_category(Category::Plugin) || ctx.env.is_category(Category::Themes))
}

fn information(ctx: &CheckContext) -> CheckFuture<'_> {
    let response = match &ctx.files.info_file {
        Some(info) => CheckResponse::Structured {
            pass: true,
            message: format!("{} exists", info.name),
        },
        None => CheckResponse::Message("Missing information file".to_string()),
    };
    ready(Ok(response))
}

fn images(ctx: &CheckContext) -> CheckFuture<'_> {
    let has_screenshot = ctx
        .files
        .info_file
        .as_ref()
        .is_some_and(|info| has_non_badge_image(&info.content));
    ready(Ok(CheckResponse::pass_or(has_screenshot, NO_IMAGES)))
}

/// True when the markdown holds at least one image that is not a badge
pub fn has_non_badge_image(content: &str) -> bool {
    IMAGE_RE
        .find_iter(content)
        .any(|m| !BADGE_MARKERS.iter().any(|badge| m.as_str().contains(badge)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn screenshot_counts_as_image() {
        assert!(has_non_badge_image("![card](docs/screenshot.png)"));
        assert!(has_non_badge_image(r#"<IMG src="demo.gif" width="300">"#));
    }

    #[test]
    fn badges_alone_do_not_count() {
        let readme = "[![hacs](https://img.shields.io/badge/HACS-Custom-orange.svg)](https://hacs.xyz)\n\
                      <a href=\"https://www.buymeacoffee.com/x\"><img src=\"https://cdn.buymeacoffee.com/button.png\"></a>";
        assert!(!has_non_badge_image(readme));
        assert!(!has_non_badge_image("no pictures here"));
    }

    #[test]
    fn one_screenshot_among_badges_is_enough() {
        let readme = "![release](https://img.shields.io/github/release/a/b.svg)\n![preview](preview.png)";
        assert!(has_non_badge_image(readme));
    }
}
