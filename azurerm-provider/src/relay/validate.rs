//! Plan-time validators for Relay names

use std::sync::LazyLock;

use azurerm_core::resource::Value;
use azurerm_core::schema::AttributeType;
use regex::Regex;

static NAMESPACE_NAME: LazyLock<Result<Regex, regex::Error>> =
    LazyLock::new(|| Regex::new(r"^[a-zA-Z][-a-zA-Z0-9]{4,48}[a-zA-Z0-9]$"));

static ENTITY_NAME: LazyLock<Result<Regex, regex::Error>> =
    LazyLock::new(|| Regex::new(r"^[a-zA-Z0-9]([a-zA-Z0-9._-]*[a-zA-Z0-9])?$"));

const MAX_HYBRID_CONNECTION_NAME_LENGTH: usize = 260;
const MAX_AUTHORIZATION_RULE_NAME_LENGTH: usize = 256;

fn matches(pattern: &LazyLock<Result<Regex, regex::Error>>, value: &str) -> bool {
    pattern.as_ref().is_ok_and(|re| re.is_match(value))
}

pub fn namespace_name(value: &str) -> Result<(), String> {
    if matches(&NAMESPACE_NAME, value) {
        Ok(())
    } else {
        Err(format!(
            "{:?} must be 6 to 50 characters long, contain only letters, numbers and hyphens, start with a letter and end with a letter or number",
            value
        ))
    }
}

fn entity_name(value: &str, kind: &str, max: usize) -> Result<(), String> {
    if value.len() > max {
        return Err(format!(
            "{} name {:?} must be at most {} characters long",
            kind, value, max
        ));
    }
    if !matches(&ENTITY_NAME, value) {
        return Err(format!(
            "{} name {:?} may only contain letters, numbers, periods, hyphens and underscores, and must start and end with a letter or number",
            kind, value
        ));
    }
    Ok(())
}

pub fn hybrid_connection_name(value: &str) -> Result<(), String> {
    entity_name(value, "hybrid connection", MAX_HYBRID_CONNECTION_NAME_LENGTH)
}

pub fn authorization_rule_name(value: &str) -> Result<(), String> {
    entity_name(value, "authorization rule", MAX_AUTHORIZATION_RULE_NAME_LENGTH)
}

fn string_type(name: &str, validate: fn(&Value) -> Result<(), String>) -> AttributeType {
    AttributeType::Custom {
        name: name.to_string(),
        base: Box::new(AttributeType::String),
        validate,
    }
}

pub fn namespace_name_type() -> AttributeType {
    string_type("NamespaceName", |v| v.as_str().map_or(Ok(()), namespace_name))
}

pub fn hybrid_connection_name_type() -> AttributeType {
    string_type("HybridConnectionName", |v| {
        v.as_str().map_or(Ok(()), hybrid_connection_name)
    })
}

pub fn authorization_rule_name_type() -> AttributeType {
    string_type("AuthorizationRuleName", |v| {
        v.as_str().map_or(Ok(()), authorization_rule_name)
    })
}
