/// Release notes, rendered as-is by the changelog panel.
pub const CHANGELOG: &str = include_str!("../CHANGELOG.md");

pub const WEBSITE_URL: &str = "https://qtshock.com";
pub const WEBSITE_LABEL: &str = "qtshock.com";
