//! Commands delivered to the page and the replies sent back

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::types::{Rule, RuleExecution, RunSummary};

/// A request from the popup or the background page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS))]
#[serde(tag = "action")]
pub enum Command {
    /// Run one rule now, regardless of its URL patterns
    #[serde(rename = "executeRule")]
    ExecuteRule { rule: Rule },
    /// Run every enabled rule matching the page
    #[serde(rename = "executeAllAutoRules")]
    ExecuteAllAutoRules,
}

/// `action` tags answered by the content script.
pub const COMMAND_ACTIONS: [&str; 2] = ["executeRule", "executeAllAutoRules"];

/// How an incoming runtime message is handled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Inbound {
    Command(Command),
    /// One of our actions with a payload that does not decode; answered
    /// with this reply instead of being dropped
    Rejected(Reply),
    /// Somebody else's message, left for other listeners
    Foreign,
}

/// Classify a runtime message by its `action` tag, then decode it.
pub fn decode_message(message: Value) -> Inbound {
    let known = message
        .get("action")
        .and_then(Value::as_str)
        .map_or(false, |action| COMMAND_ACTIONS.contains(&action));
    if !known {
        return Inbound::Foreign;
    }

    match serde_json::from_value::<Command>(message) {
        Ok(command) => Inbound::Command(command),
        Err(e) => Inbound::Rejected(Reply::err(format!("Invalid request: {}", e))),
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS))]
#[serde(untagged)]
pub enum ReplyResult {
    Rule(RuleExecution),
    Run(RunSummary),
}

/// Exactly one reply is sent per command.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts", derive(ts_rs::TS))]
pub struct Reply {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[cfg_attr(feature = "ts", ts(optional))]
    pub result: Option<ReplyResult>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[cfg_attr(feature = "ts", ts(optional))]
    pub error: Option<String>,
}

impl Reply {
    pub fn ok(result: ReplyResult) -> Self {
        Self {
            success: true,
            result: Some(result),
            error: None,
        }
    }

    pub fn err(error: impl Into<String>) -> Self {
        Self {
            success: false,
            result: None,
            error: Some(error.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_command_tags() {
        let all: Command = serde_json::from_value(json!({"action": "executeAllAutoRules"})).unwrap();
        assert_eq!(all, Command::ExecuteAllAutoRules);

        let one: Command = serde_json::from_value(json!({
            "action": "executeRule",
            "rule": {"id": "r", "selector": "#a", "selectorType": "css", "fillValue": "v", "urls": []}
        }))
        .unwrap();
        assert!(matches!(one, Command::ExecuteRule { rule } if rule.id == "r"));

        assert!(serde_json::from_value::<Command>(json!({"action": "deleteEverything"})).is_err());
    }

    #[test]
    fn test_reply_shapes() {
        let err = serde_json::to_value(Reply::err("nope")).unwrap();
        assert_eq!(err, json!({"success": false, "error": "nope"}));

        let ok = serde_json::to_value(Reply::ok(ReplyResult::Run(RunSummary::completed(Vec::new()))))
            .unwrap();
        assert_eq!(ok["success"], true);
        assert_eq!(ok["result"]["status"], "completed");
        assert!(ok.get("error").is_none());
    }

    #[test]
    fn test_decode_message_routes_by_action() {
        assert_eq!(
            decode_message(json!({"action": "executeAllAutoRules"})),
            Inbound::Command(Command::ExecuteAllAutoRules)
        );
        assert_eq!(decode_message(json!({"action": "openPopup"})), Inbound::Foreign);
        assert_eq!(decode_message(json!({"type": "ping"})), Inbound::Foreign);
        assert_eq!(decode_message(json!("executeRule")), Inbound::Foreign);
    }

    #[test]
    fn test_malformed_execute_rule_gets_error_reply() {
        let inbound = decode_message(json!({
            "action": "executeRule",
            "rule": {"selector": "#a", "urls": null}
        }));
        let reply = match inbound {
            Inbound::Rejected(reply) => reply,
            other => panic!("expected a rejection, got {:?}", other),
        };
        assert!(!reply.success);
        assert!(reply.result.is_none());
        assert!(reply.error.unwrap().starts_with("Invalid request: "));

        assert!(matches!(
            decode_message(json!({"action": "executeRule"})),
            Inbound::Rejected(_)
        ));
    }
}
