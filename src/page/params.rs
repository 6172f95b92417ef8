use std::collections::BTreeMap;

use serde_json::Value;
use thiserror::Error;

/// Caller-supplied keyword arguments threaded through a navigation.
pub type NavArgs = BTreeMap<String, Value>;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum TemplateError {
    #[error("no value for placeholder '{{{placeholder}}}' in '{template}'")]
    Missing {
        template: String,
        placeholder: String,
    },

    #[error("unclosed placeholder in '{0}'")]
    Unclosed(String),
}

/// Build `NavArgs` from key/value pairs.
pub fn nav_args<K, V, I>(pairs: I) -> NavArgs
where
    K: Into<String>,
    V: Into<Value>,
    I: IntoIterator<Item = (K, V)>,
{
    pairs
        .into_iter()
        .map(|(k, v)| (k.into(), v.into()))
        .collect()
}

/// Text form of an argument as it appears in a path or a selector.
/// Strings lose their JSON quotes; everything else uses its JSON rendering.
pub fn arg_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Names of the `{name}` placeholders in a template, in order of appearance.
pub fn placeholders(template: &str) -> Result<Vec<String>, TemplateError> {
    let mut names = Vec::new();
    let mut rest = template;
    while let Some(open) = rest.find('{') {
        let after = &rest[open + 1..];
        let close = after
            .find('}')
            .ok_or_else(|| TemplateError::Unclosed(template.to_string()))?;
        names.push(after[..close].to_string());
        rest = &after[close + 1..];
    }
    Ok(names)
}

/// Substitute every `{name}` in `template` with the matching argument.
pub fn render_template(template: &str, args: &NavArgs) -> Result<String, TemplateError> {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;
    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let after = &rest[open + 1..];
        let close = after
            .find('}')
            .ok_or_else(|| TemplateError::Unclosed(template.to_string()))?;
        let name = &after[..close];
        let value = args.get(name).ok_or_else(|| TemplateError::Missing {
            template: template.to_string(),
            placeholder: name.to_string(),
        })?;
        out.push_str(&arg_text(value));
        rest = &after[close + 1..];
    }
    out.push_str(rest);
    Ok(out)
}
