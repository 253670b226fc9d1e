//! Greeting pages in HTML and JSON

use crate::templates::{render, HelloTemplate};
use chrono::{DateTime, Utc};
use serde::Serialize;
use sesscgi_core::{CgiResponse, RequestContext, SessionResult, SiteConfig};

const UNKNOWN_ADDR: &str = "Unknown";

#[derive(Debug, Serialize)]
struct HelloJson<'a> {
    greeting: &'a str,
    team: &'a str,
    language: &'a str,
    date: String,
    ip: &'a str,
}

/// RFC 1123 date, always in GMT
fn http_date(now: DateTime<Utc>) -> String {
    now.format("%a, %d %b %Y %H:%M:%S GMT").to_string()
}

fn remote_addr(request: &RequestContext) -> &str {
    request
        .remote_addr
        .as_deref()
        .filter(|addr| !addr.is_empty())
        .unwrap_or(UNKNOWN_ADDR)
}

pub fn hello_html(
    request: &RequestContext,
    site: &SiteConfig,
    now: DateTime<Utc>,
) -> SessionResult<CgiResponse> {
    let page = HelloTemplate::new(
        site.team.clone(),
        site.language.clone(),
        http_date(now),
        remote_addr(request).to_string(),
    );
    Ok(CgiResponse::html(render(&page, "hello")?))
}

pub fn hello_json(
    request: &RequestContext,
    site: &SiteConfig,
    now: DateTime<Utc>,
) -> SessionResult<CgiResponse> {
    let payload = HelloJson {
        greeting: "Hello from Rust!",
        team: &site.team,
        language: &site.language,
        date: now.to_rfc3339(),
        ip: remote_addr(request),
    };
    Ok(CgiResponse::json(serde_json::to_string_pretty(&payload)?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn fixed_now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 2, 15, 4, 5).unwrap()
    }

    #[test]
    fn test_http_date_format() {
        assert_eq!(http_date(fixed_now()), "Tue, 02 Jan 2024 15:04:05 GMT");
    }

    #[test]
    fn test_hello_html_fields() {
        let site = SiteConfig {
            team: "Team <A>".to_string(),
            language: "Rust".to_string(),
        };
        let request = RequestContext::get().with_remote_addr("192.0.2.7");

        let response = hello_html(&request, &site, fixed_now()).unwrap();

        assert_eq!(response.content_type, CgiResponse::HTML);
        assert!(response.body.contains("Team &lt;A&gt;"));
        assert!(response.body.contains("192.0.2.7"));
        assert!(response.body.contains("Tue, 02 Jan 2024 15:04:05 GMT"));
    }

    #[test]
    fn test_hello_json_payload() {
        let site = SiteConfig::default();
        let response = hello_json(&RequestContext::get(), &site, fixed_now()).unwrap();

        assert_eq!(response.content_type, CgiResponse::JSON);
        let value: serde_json::Value = serde_json::from_str(&response.body).unwrap();
        assert_eq!(value["greeting"], "Hello from Rust!");
        assert_eq!(value["team"], site.team.as_str());
        assert_eq!(value["ip"], "Unknown");
        assert_eq!(value["date"], "2024-01-02T15:04:05+00:00");
    }
}
