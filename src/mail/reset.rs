use super::{MailTemplate, OutgoingMail};
use crate::config::MailConfig;

/// `{origin}{path}?token=..&email=..`, with the email percent-encoded.
pub fn reset_url(origin: &str, path: &str, code: &str, email: &str) -> String {
    format!(
        "{}{}?token={}&email={}",
        origin.trim_end_matches('/'),
        path,
        code,
        encode_query_value(email)
    )
}

pub fn reset_mail(cfg: &MailConfig, template: &MailTemplate, email: &str, url: &str) -> OutgoingMail {
    OutgoingMail {
        from: cfg.from.clone(),
        to: email.to_string(),
        subject: cfg.reset_subject.clone(),
        html: template.render(&[("email", email), ("url", url)]),
    }
}

fn encode_query_value(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for b in raw.bytes() {
        match b {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'.' | b'_' | b'~' => out.push(b as char),
            _ => out.push_str(&format!("%{b:02X}")),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    const CODE: &str = "deadbeefdeadbeefdeadbeefdeadbeef";

    #[test]
    fn url_joins_origin_path_and_query() {
        assert_eq!(
            reset_url("http://localhost:3000", "/password/reset", CODE, "a@b.com"),
            "http://localhost:3000/password/reset?token=deadbeefdeadbeefdeadbeefdeadbeef&email=a%40b.com"
        );
    }

    #[test]
    fn url_tolerates_trailing_slash_and_plus_addresses() {
        let url = reset_url("https://blog.example/", "/password/reset", CODE, "a+tag@b.com");
        assert!(url.starts_with("https://blog.example/password/reset?"));
        assert!(url.ends_with("email=a%2Btag%40b.com"));
    }

    #[test]
    fn mail_is_addressed_and_rendered() {
        let cfg = MailConfig {
            from: "no-reply@blogd.local".into(),
            reset_subject: "Reset your password".into(),
            template_path: None,
        };
        let template = MailTemplate::new("{{email}}|{{url}}");
        let mail = reset_mail(&cfg, &template, "a@b.com", "http://x/?a=1&b=2");
        assert_eq!(mail.to, "a@b.com");
        assert_eq!(mail.from, "no-reply@blogd.local");
        assert_eq!(mail.subject, "Reset your password");
        assert_eq!(mail.html, "a@b.com|http://x/?a=1&amp;b=2");
    }
}
