use regex::{Captures, Regex};
use std::env;
use std::sync::LazyLock;


static ENV_VAR_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\$\{([^}]+)\}").expect("static pattern is valid")
});


/// Replace `${VAR}` with the variable's value.
/// Unset or empty variables keep the original pattern.
pub fn expand_env_vars(input: &str) -> String {
    expand_with(input, |name| env::var(name).ok())
}

pub fn expand_with<F>(input: &str, lookup: F) -> String
where
    F: Fn(&str) -> Option<String>,
{
    ENV_VAR_PATTERN
        .replace_all(input, |caps: &Captures| {
            match lookup(&caps[1]) {
                Some(value) if !value.is_empty() => value,
                _ => caps[0].to_string(),
            }
        })
        .into_owned()
}
