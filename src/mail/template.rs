use std::sync::Arc;

use anyhow::Context;
use tracing::info;

const DEFAULT_RESET_TEMPLATE: &str = include_str!("../../templates/password_token_mail.html");

/// HTML body with `{{name}}` placeholders. Values are escaped on render.
#[derive(Debug, Clone)]
pub struct MailTemplate {
    source: Arc<str>,
}

impl MailTemplate {
    pub fn new(source: impl Into<Arc<str>>) -> Self {
        Self {
            source: source.into(),
        }
    }

    /// Reads `path` when given, otherwise uses the bundled reset template.
    pub fn load_reset(path: Option<&str>) -> anyhow::Result<Self> {
        match path {
            Some(path) => {
                let source = std::fs::read_to_string(path)
                    .with_context(|| format!("read mail template {path}"))?;
                info!(path, "mail template loaded");
                Ok(Self::new(source))
            }
            None => Ok(Self::new(DEFAULT_RESET_TEMPLATE)),
        }
    }

    /// Substitutes in one pass over the source; inserted values are never re-scanned.
    pub fn render(&self, values: &[(&str, &str)]) -> String {
        let mut out = String::with_capacity(self.source.len());
        let mut rest = &*self.source;
        while let Some(start) = rest.find("{{") {
            out.push_str(&rest[..start]);
            let after = &rest[start + 2..];
            let Some(end) = after.find("}}") else {
                rest = &rest[start..];
                break;
            };
            let name = &after[..end];
            match values.iter().find(|(n, _)| *n == name) {
                Some((_, value)) => out.push_str(&escape_html(value)),
                None => {
                    out.push_str("{{");
                    out.push_str(name);
                    out.push_str("}}");
                }
            }
            rest = &after[end + 2..];
        }
        out.push_str(rest);
        out
    }
}

pub fn escape_html(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#x27;"),
            _ => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn render_replaces_every_occurrence() {
        let t = MailTemplate::new("{{a}} and {{a}} then {{b}}");
        assert_eq!(t.render(&[("a", "x"), ("b", "y")]), "x and x then y");
    }

    #[test]
    fn render_escapes_values() {
        let t = MailTemplate::new("<p>{{email}}</p>");
        assert_eq!(
            t.render(&[("email", "<script>\"a\"&'b'</script>")]),
            "<p>&lt;script&gt;&quot;a&quot;&amp;&#x27;b&#x27;&lt;/script&gt;</p>"
        );
    }

    #[test]
    fn placeholders_inside_values_are_not_expanded() {
        let t = MailTemplate::new("<p>{{email}}</p><a href=\"{{url}}\">go</a>");
        assert_eq!(
            t.render(&[("email", "{{url}}@x.com"), ("url", "http://u")]),
            "<p>{{url}}@x.com</p><a href=\"http://u\">go</a>"
        );
    }

    #[test]
    fn unclosed_braces_are_copied_through() {
        let t = MailTemplate::new("a {{email}} b {{ open");
        assert_eq!(t.render(&[("email", "x")]), "a x b {{ open");
    }

    #[test]
    fn unknown_placeholders_are_left_alone() {
        let t = MailTemplate::new("{{missing}}");
        assert_eq!(t.render(&[("email", "a@b.com")]), "{{missing}}");
    }

    #[test]
    fn bundled_template_has_both_placeholders() {
        let t = MailTemplate::load_reset(None).unwrap();
        let html = t.render(&[("email", "a@b.com"), ("url", "http://x/y")]);
        assert!(html.contains("a@b.com"));
        assert!(html.contains("href=\"http://x/y\""));
        assert!(!html.contains("{{"));
    }

    #[test]
    fn missing_template_file_is_an_error() {
        assert!(MailTemplate::load_reset(Some("/nonexistent/blogd/template.html")).is_err());
    }
}
