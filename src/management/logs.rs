use chrono::{DateTime, Utc};
use http::Method;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::{Filter, ManagementApi};
use crate::error::Auth0Error;
use crate::page::{Page, PageItem};
use crate::request::Request;

/// Entry of the tenant logs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogEvent {
    #[serde(default, alias = "_id")]
    pub log_id: Option<String>,
    #[serde(default)]
    pub date: Option<DateTime<Utc>>,
    /// Event type code, such as `s` for a successful login.
    #[serde(default, rename = "type")]
    pub kind: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub client_id: Option<String>,
    #[serde(default)]
    pub user_id: Option<String>,
    #[serde(default)]
    pub ip: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl PageItem for LogEvent {
    const ITEMS_KEY: &'static str = "logs";
}

/// `/api/v2/logs`
pub struct LogsEntity<'a> {
    api: &'a ManagementApi,
}

impl<'a> LogsEntity<'a> {
    pub(crate) fn new(api: &'a ManagementApi) -> Self {
        Self { api }
    }

    pub fn list(&self, filter: &Filter) -> Result<Request<Page<LogEvent>>, Auth0Error> {
        let request = self.api.request(Method::GET, &["logs"])?;
        Ok(filter.apply(request))
    }

    pub fn get(&self, log_id: &str) -> Result<Request<LogEvent>, Auth0Error> {
        self.api.request(Method::GET, &["logs", log_id])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http_client::tests::{MockHttpClient, response};
    use crate::management::tests::api;
    use chrono::TimeZone;

    #[test]
    fn list_with_search() {
        let mut client = MockHttpClient::new();
        client
            .expect_send()
            .withf(|req| {
                req.uri() == "https://tenant.auth0.com/api/v2/logs?q=type%3Afp&sort=date%3A-1"
            })
            .times(1)
            .returning(|_| {
                Ok(response(
                    200,
                    r#"[{"_id":"9001","type":"fp","date":"2024-05-01T10:00:00Z","ip":"10.0.0.1","details":{}}]"#,
                ))
            });

        let page = api(client)
            .logs()
            .list(&Filter::new().with_query("type:fp").with_sort("date:-1"))
            .unwrap()
            .execute()
            .unwrap()
            .into_body();

        let event = &page.items()[0];
        assert_eq!(event.log_id.as_deref(), Some("9001"));
        assert_eq!(
            event.date,
            Some(Utc.with_ymd_and_hms(2024, 5, 1, 10, 0, 0).unwrap())
        );
        assert!(event.extra.contains_key("details"));
    }

    #[test]
    fn get_single_event() {
        let mut client = MockHttpClient::new();
        client
            .expect_send()
            .withf(|req| req.uri().path() == "/api/v2/logs/9001")
            .times(1)
            .returning(|_| Ok(response(200, r#"{"log_id":"9001","type":"s"}"#)));

        let event = api(client)
            .logs()
            .get("9001")
            .unwrap()
            .execute()
            .unwrap()
            .into_body();

        assert_eq!(event.kind.as_deref(), Some("s"));
    }
}
