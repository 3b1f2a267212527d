//! Secret references in configuration values.
//!
//! - `env::VAR_NAME` reads `$VAR_NAME`
//! - `pass::path/in/store` returns the first line of `pass show path/in/store`
//! - anything else is used verbatim

use std::process::Command;

/// Expands a possibly-prefixed secret reference.
pub fn resolve(value: &str) -> Result<String, String> {
    match value.split_once("::") {
        Some(("env", var)) => {
            std::env::var(var).map_err(|_| format!("environment variable `{}` is not set", var))
        }
        Some(("pass", path)) => from_pass(path),
        _ => Ok(value.to_string()),
    }
}

fn from_pass(path: &str) -> Result<String, String> {
    let output = Command::new("pass")
        .args(["show", path])
        .output()
        .map_err(|e| format!("failed to run `pass show {}`: {}", path, e))?;

    if !output.status.success() {
        return Err(format!(
            "`pass show {}` exited with {}: {}",
            path,
            output.status,
            String::from_utf8_lossy(&output.stderr).trim()
        ));
    }

    String::from_utf8_lossy(&output.stdout)
        .lines()
        .next()
        .map(str::to_string)
        .ok_or_else(|| format!("`pass show {}` printed nothing", path))
}
