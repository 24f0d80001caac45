use anyhow::Result;
use serde_json::Value;

#[derive(Clone, Debug, PartialEq)]
pub enum OutputFormat {
    Pretty,
    Compact,
}

impl OutputFormat {
    pub fn parse(s: &str) -> Self {
        match s {
            "compact" => OutputFormat::Compact,
            _ => OutputFormat::Pretty,
        }
    }
}

/// Text printed for a response body. A body-less response renders as a
/// marker rather than `null`.
pub fn render(body: Option<&Value>, format: &OutputFormat) -> Result<String> {
    let Some(body) = body else {
        return Ok("(no content)".to_string());
    };
    let text = match format {
        OutputFormat::Pretty => serde_json::to_string_pretty(body)?,
        OutputFormat::Compact => serde_json::to_string(body)?,
    };
    Ok(text)
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn parse_defaults_to_pretty() {
        assert_eq!(OutputFormat::parse("compact"), OutputFormat::Compact);
        assert_eq!(OutputFormat::parse("pretty"), OutputFormat::Pretty);
        assert_eq!(OutputFormat::parse("table"), OutputFormat::Pretty);
    }

    #[test]
    fn render_no_content() {
        assert_eq!(render(None, &OutputFormat::Pretty).unwrap(), "(no content)");
    }

    #[test]
    fn render_empty_structure_is_not_no_content() {
        assert_eq!(render(Some(&json!([])), &OutputFormat::Compact).unwrap(), "[]");
    }

    #[test]
    fn render_compact_and_pretty() {
        let body = json!({"participants": ["a", "b"]});
        assert_eq!(
            render(Some(&body), &OutputFormat::Compact).unwrap(),
            r#"{"participants":["a","b"]}"#
        );
        let pretty = render(Some(&body), &OutputFormat::Pretty).unwrap();
        assert!(pretty.contains('\n'));
        assert_eq!(serde_json::from_str::<Value>(&pretty).unwrap(), body);
    }
}
