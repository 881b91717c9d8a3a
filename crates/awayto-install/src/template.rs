//! `##token##` substitution for the infrastructure template.
//!
//! A token is a name of ASCII letters, digits and underscores wrapped in
//! `##`. Every token in the input must have a value; anything left over is
//! an error rather than text passed through to the provider.

use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;
use std::sync::LazyLock;

use regex::{Captures, Regex};

use crate::error::{InstallError, InstallResult};

static TOKEN_PATTERN: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"##([A-Za-z0-9_]+)##").ok());

/// Replace every `##name##` in `input` with its value.
pub fn render(input: &str, values: &BTreeMap<&str, &str>) -> InstallResult<String> {
    let pattern = TOKEN_PATTERN
        .as_ref()
        .ok_or_else(|| InstallError::config("template token pattern failed to compile"))?;
    let mut unresolved = BTreeSet::new();

    let output = pattern.replace_all(input, |caps: &Captures<'_>| {
        let name = &caps[1];
        match values.get(name) {
            Some(value) => (*value).to_owned(),
            None => {
                unresolved.insert(name.to_owned());
                caps[0].to_owned()
            }
        }
    });

    if !unresolved.is_empty() {
        return Err(InstallError::UnresolvedTokens {
            tokens: unresolved.into_iter().collect(),
        });
    }

    Ok(output.into_owned())
}

/// Read a template file and render it.
pub async fn render_file(path: &Path, values: &BTreeMap<&str, &str>) -> InstallResult<String> {
    let input = tokio::fs::read_to_string(path).await?;
    render(&input, values)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn replaces_all_occurrences() {
        let values = BTreeMap::from([("id", "demodev1")]);
        let out = render("Name: ##id##Resource\nBucket: ##id##-lambda\n", &values).unwrap();
        assert_eq!(out, "Name: demodev1Resource\nBucket: demodev1-lambda\n");
    }

    #[test]
    fn unmatched_tokens_are_errors() {
        let values = BTreeMap::from([("id", "x")]);
        let err = render("##id## ##region## ##stage## ##region##", &values).unwrap_err();
        match err {
            InstallError::UnresolvedTokens { tokens } => {
                assert_eq!(tokens, vec!["region".to_owned(), "stage".to_owned()]);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn text_without_tokens_is_unchanged() {
        let input = "a # b ## c";
        assert_eq!(render(input, &BTreeMap::new()).unwrap(), input);
    }

    #[tokio::test]
    async fn renders_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("template.yaml.template");
        std::fs::write(&path, "Stack: ##id##").unwrap();

        let values = BTreeMap::from([("id", "abc")]);
        assert_eq!(render_file(&path, &values).await.unwrap(), "Stack: abc");
    }
}
