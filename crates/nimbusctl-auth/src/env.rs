//! Detection of non-interactive (CI) execution contexts.
//!
//! Consulted only by the guard in [`crate::flow::auth_flow`]; it keeps a CLI
//! invocation from hanging forever on a browser that cannot open.

/// Environment variables that indicate an automated pipeline.
const CI_VARS: &[&str] = &[
    "CI",
    "CONTINUOUS_INTEGRATION",
    "BUILD_NUMBER",
    "GITHUB_ACTIONS",
    "GITLAB_CI",
    "CIRCLECI",
    "TEAMCITY_VERSION",
];

/// True when the process appears to run in a non-interactive CI context.
pub fn is_ci() -> bool {
    detect(|name| std::env::var(name).ok())
}

fn detect(get: impl Fn(&str) -> Option<String>) -> bool {
    CI_VARS.iter().any(|name| match get(name) {
        Some(value) => !value.is_empty() && value != "0" && value.to_lowercase() != "false",
        None => false,
    })
}
