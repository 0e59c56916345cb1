use crate::error::{FlowError, Result};
use crate::tracker::{Tracker, TrackerIssue, TrackerVersion};
use chrono::NaiveDate;
use reqwest::blocking::{Client, Response};
use serde::Deserialize;
use serde_json::json;
use std::time::Duration;

const HTTP_CONNECT_TIMEOUT_SECS: u64 = 10;
const HTTP_REQUEST_TIMEOUT_SECS: u64 = 60;

/// REST implementation of the [Tracker] collaborator
///
/// Talks to a JIRA-style version/issue API with basic authentication.
/// Non-2xx responses become [FlowError::Tracker] carrying the HTTP status.
pub struct RestTracker {
    client: Client,
    base_url: String,
    user: String,
    token: String,
}

#[derive(Debug, Deserialize)]
struct RawVersion {
    id: String,
    name: String,
    #[serde(default)]
    released: bool,
    #[serde(rename = "releaseDate")]
    release_date: Option<String>,
    #[serde(rename = "projectId", default)]
    project_id: serde_json::Value,
    #[serde(rename = "self")]
    self_link: String,
}

#[derive(Debug, Deserialize)]
struct RawIssue {
    id: String,
    key: String,
}

#[derive(Debug, Deserialize)]
struct SearchResult {
    issues: Vec<RawIssue>,
}

impl RestTracker {
    /// Create a client against a tracker base URL with basic-auth credentials
    pub fn new(base_url: impl Into<String>, user: impl Into<String>, token: impl Into<String>) -> Result<Self> {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(HTTP_CONNECT_TIMEOUT_SECS))
            .timeout(Duration::from_secs(HTTP_REQUEST_TIMEOUT_SECS))
            .user_agent("releaseflow")
            .build()?;

        Ok(RestTracker {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            user: user.into(),
            token: token.into(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/rest/api/2/{}", self.base_url, path)
    }

    fn check(&self, response: Response, context: &str) -> Result<Response> {
        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(FlowError::tracker(
                status.as_u16(),
                format!("{}: {}", context, body),
            ));
        }
        Ok(response)
    }

    fn get(&self, path: &str, context: &str) -> Result<Response> {
        let response = self
            .client
            .get(self.url(path))
            .basic_auth(&self.user, Some(&self.token))
            .send()?;
        self.check(response, context)
    }

    fn put_json(&self, path: &str, body: serde_json::Value, context: &str) -> Result<()> {
        let response = self
            .client
            .put(self.url(path))
            .basic_auth(&self.user, Some(&self.token))
            .json(&body)
            .send()?;
        self.check(response, context)?;
        Ok(())
    }

    fn search_issues(&self, jql: &str) -> Result<Vec<TrackerIssue>> {
        let response = self
            .client
            .get(self.url("search"))
            .basic_auth(&self.user, Some(&self.token))
            .query(&[("jql", jql), ("fields", "key"), ("maxResults", "1000")])
            .send()?;
        let response = self.check(response, "issue search failed")?;
        let result: SearchResult = response.json()?;
        Ok(result
            .issues
            .into_iter()
            .map(|issue| TrackerIssue {
                id: issue.id,
                key: issue.key,
            })
            .collect())
    }
}

fn into_version(raw: RawVersion) -> TrackerVersion {
    let release_date = raw
        .release_date
        .as_deref()
        .and_then(|d| NaiveDate::parse_from_str(d, "%Y-%m-%d").ok());
    // projectId arrives as a number from the API
    let project_id = match &raw.project_id {
        serde_json::Value::Number(n) => n.to_string(),
        serde_json::Value::String(s) => s.clone(),
        _ => String::new(),
    };
    TrackerVersion {
        id: raw.id,
        name: raw.name,
        released: raw.released,
        release_date,
        project_id,
        self_link: raw.self_link,
    }
}

impl Tracker for RestTracker {
    fn create_version(&self, project: &str, name: &str) -> Result<TrackerVersion> {
        let response = self
            .client
            .post(self.url("version"))
            .basic_auth(&self.user, Some(&self.token))
            .json(&json!({ "name": name, "project": project }))
            .send()?;
        let response = self.check(response, "version creation failed")?;
        let raw: RawVersion = response.json()?;
        Ok(into_version(raw))
    }

    fn versions(&self, project: &str) -> Result<Vec<TrackerVersion>> {
        let response = self.get(
            &format!("project/{}/versions", project),
            "version listing failed",
        )?;
        let raw: Vec<RawVersion> = response.json()?;
        Ok(raw.into_iter().map(into_version).collect())
    }

    fn move_version_after(&self, id: &str, after_self_link: &str) -> Result<()> {
        self.put_json(
            &format!("version/{}/move", id),
            json!({ "after": after_self_link }),
            "version move failed",
        )
    }

    fn move_version_first(&self, id: &str) -> Result<()> {
        self.put_json(
            &format!("version/{}/move", id),
            json!({ "position": "First" }),
            "version move failed",
        )
    }

    fn release_version(&self, id: &str, release_date: NaiveDate) -> Result<()> {
        self.put_json(
            &format!("version/{}", id),
            json!({
                "released": true,
                "releaseDate": release_date.format("%Y-%m-%d").to_string(),
            }),
            "version release failed",
        )
    }

    fn delete_version(&self, id: &str) -> Result<()> {
        let response = self
            .client
            .delete(self.url(&format!("version/{}", id)))
            .basic_auth(&self.user, Some(&self.token))
            .send()?;
        self.check(response, "version deletion failed")?;
        Ok(())
    }

    fn non_closed_issues(&self, version_id: &str) -> Result<Vec<TrackerIssue>> {
        self.search_issues(&format!(
            "fixVersion = {} AND status != Closed",
            version_id
        ))
    }

    fn closed_issues(&self, version_id: &str) -> Result<Vec<TrackerIssue>> {
        self.search_issues(&format!("fixVersion = {} AND status = Closed", version_id))
    }

    fn move_issues_to_version(
        &self,
        issues: &[TrackerIssue],
        from_id: &str,
        to_id: &str,
    ) -> Result<()> {
        for issue in issues {
            self.put_json(
                &format!("issue/{}", issue.key),
                json!({
                    "update": {
                        "fixVersions": [
                            { "remove": { "id": from_id } },
                            { "add": { "id": to_id } },
                        ]
                    }
                }),
                "issue move failed",
            )?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_url_joins_without_double_slash() {
        let tracker = RestTracker::new("https://tracker.example.com/", "user", "token").unwrap();
        assert_eq!(
            tracker.url("version/10001"),
            "https://tracker.example.com/rest/api/2/version/10001"
        );
    }

    #[test]
    fn test_raw_version_mapping() {
        let raw: RawVersion = serde_json::from_value(json!({
            "id": "10001",
            "name": "1.2.0",
            "released": true,
            "releaseDate": "2026-08-24",
            "projectId": 10200,
            "self": "https://tracker.example.com/rest/api/2/version/10001"
        }))
        .unwrap();
        let version = into_version(raw);
        assert_eq!(version.id, "10001");
        assert!(version.released);
        assert_eq!(
            version.release_date,
            Some(NaiveDate::from_ymd_opt(2026, 8, 24).unwrap())
        );
        assert_eq!(version.project_id, "10200");
    }

    #[test]
    fn test_raw_version_mapping_defaults() {
        let raw: RawVersion = serde_json::from_value(json!({
            "id": "10002",
            "name": "1.3.0",
            "self": "https://tracker.example.com/rest/api/2/version/10002"
        }))
        .unwrap();
        let version = into_version(raw);
        assert!(!version.released);
        assert_eq!(version.release_date, None);
    }
}
