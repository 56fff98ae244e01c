//! Argument extraction helpers shared by the skill tools.

use valet_contracts::{
    error::{ValetError, ValetResult},
    plan::Args,
};

pub(crate) fn required_str<'a>(args: &'a Args, key: &str, tool: &str) -> ValetResult<&'a str> {
    args.get(key)
        .and_then(|v| v.as_str())
        .ok_or_else(|| ValetError::ToolExecution {
            tool: tool.to_string(),
            reason: format!("missing or non-string argument '{}'", key),
        })
}

pub(crate) fn optional_str<'a>(args: &'a Args, key: &str, default: &'a str) -> &'a str {
    args.get(key).and_then(|v| v.as_str()).unwrap_or(default)
}

pub(crate) fn required_object<'a>(args: &'a Args, key: &str, tool: &str) -> ValetResult<&'a Args> {
    args.get(key)
        .and_then(|v| v.as_object())
        .ok_or_else(|| ValetError::ToolExecution {
            tool: tool.to_string(),
            reason: format!("missing or non-object argument '{}'", key),
        })
}

pub(crate) fn optional_u64(args: &Args, key: &str, default: u64) -> u64 {
    args.get(key).and_then(|v| v.as_u64()).unwrap_or(default)
}
