//! Pulling the plan text out of a model reply.

use crate::error::{Error, Result};
use once_cell::sync::Lazy;
use regex::Regex;

static FENCED_BLOCK: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?s)```[A-Za-z0-9_+-]*[ \t]*\r?\n(.*?)```")
        .expect("Failed to build code fence pattern")
});

/// Extract the plan text from a reply.
///
/// Exactly one fenced block yields its body. A reply without any fence is
/// used whole, but only if it is itself a JSON object or list. Anything
/// else, including several fenced blocks, is rejected.
pub fn extract_plan_text(reply: &str) -> Result<String> {
    let blocks: Vec<&str> = FENCED_BLOCK
        .captures_iter(reply)
        .filter_map(|c| c.get(1))
        .map(|m| m.as_str().trim())
        .collect();

    match blocks.as_slice() {
        [body] if body.is_empty() => Err(Error::Extraction("the code block is empty".into())),
        [body] => Ok(body.to_string()),
        [] => {
            let whole = reply.trim();
            if reply.contains("```") {
                return Err(Error::Extraction("unterminated code block".into()));
            }
            match serde_json::from_str::<serde_json::Value>(whole) {
                Ok(v) if v.is_object() || v.is_array() => Ok(whole.to_string()),
                _ => Err(Error::Extraction(
                    "reply contains no code block and is not a JSON plan".into(),
                )),
            }
        }
        many => Err(Error::Extraction(format!(
            "expected one code block, found {}",
            many.len()
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_fenced_block() {
        let reply = "Here is the plan:\n```json\n{\"operations\": []}\n```\nDone.";
        assert_eq!(extract_plan_text(reply).unwrap(), "{\"operations\": []}");

        let bare_fence = "```\n[1]\n```";
        assert_eq!(extract_plan_text(bare_fence).unwrap(), "[1]");
    }

    #[test]
    fn test_raw_json_reply() {
        let reply = "  {\"operations\": [{\"op\": \"add_slide\"}]}\n";
        assert_eq!(
            extract_plan_text(reply).unwrap(),
            "{\"operations\": [{\"op\": \"add_slide\"}]}"
        );
    }

    #[test]
    fn test_rejections() {
        let prose = "I would add three boxes and connect them.";
        assert!(matches!(extract_plan_text(prose), Err(Error::Extraction(_))));

        let two = "```json\n{}\n```\nand\n```json\n{}\n```";
        assert!(matches!(extract_plan_text(two), Err(Error::Extraction(_))));

        let open = "```json\n{\"operations\": []}";
        assert!(matches!(extract_plan_text(open), Err(Error::Extraction(_))));

        assert!(matches!(extract_plan_text("42"), Err(Error::Extraction(_))));
        assert!(matches!(extract_plan_text("  \n"), Err(Error::Extraction(_))));
        assert!(matches!(
            extract_plan_text("```json\n\n```"),
            Err(Error::Extraction(_))
        ));
    }
}
