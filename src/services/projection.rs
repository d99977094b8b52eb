//! Shapes entities into response views, lifting well-known metadata fields to the top level.
//!
//! Extraction never fails: a missing key or a value of the wrong type yields `""`.

use serde_json::{Map, Value};
use url::Url;

use crate::models::{
    Component, ComponentSummary, ComponentView, Member, MemberView, Team, TeamSummary, TeamView,
};

/// String at `path` inside `doc`, or `""`.
pub fn extract_str(doc: Option<&Value>, path: &[&str]) -> String {
    let mut current = match doc {
        Some(v) => v,
        None => return String::new(),
    };
    for key in path {
        match current.get(*key) {
            Some(next) => current = next,
            None => return String::new(),
        }
    }
    current.as_str().map(str::to_string).unwrap_or_default()
}

fn metadata_or_empty(doc: &Option<Value>) -> Value {
    doc.clone().unwrap_or_else(|| Value::Object(Map::new()))
}

#[derive(Debug, Clone)]
pub struct Projector {
    sonar_base_url: String,
}

impl Projector {
    pub fn new(sonar_base_url: impl Into<String>) -> Self {
        Self {
            sonar_base_url: sonar_base_url.into(),
        }
    }

    /// Dashboard link for the code-quality project key stored under `sonar.projectKey`.
    pub fn sonar_url(&self, metadata: Option<&Value>) -> String {
        let key = extract_str(metadata, &["sonar", "projectKey"]);
        if key.is_empty() {
            return String::new();
        }
        match Url::parse(&format!("{}/dashboard", self.sonar_base_url)) {
            Ok(mut url) => {
                url.query_pairs_mut().append_pair("id", &key);
                url.into()
            }
            Err(e) => {
                tracing::warn!(base = %self.sonar_base_url, "Invalid sonar base URL: {}", e);
                String::new()
            }
        }
    }

    pub fn team_view(&self, team: Team) -> TeamView {
        let doc = team.metadata.as_ref();
        TeamView {
            jira_team: extract_str(doc, &["jira", "team"]),
            color: extract_str(doc, &["color"]),
            metadata: metadata_or_empty(&team.metadata),
            id: team.id,
            name: team.name,
            description: team.description,
        }
    }

    pub fn team_summary(&self, team: Team) -> TeamSummary {
        TeamSummary {
            jira_team: extract_str(team.metadata.as_ref(), &["jira", "team"]),
            id: team.id,
            name: team.name,
        }
    }

    pub fn member_view(&self, member: Member) -> MemberView {
        MemberView {
            jira_user: extract_str(member.metadata.as_ref(), &["jira", "user"]),
            metadata: metadata_or_empty(&member.metadata),
            id: member.id,
            name: member.name,
            email: member.email,
            team_id: member.team_id,
        }
    }

    pub fn component_view(&self, component: Component) -> ComponentView {
        let doc = component.metadata.as_ref();
        ComponentView {
            quality_gate: extract_str(doc, &["ci", "qualityGate"]),
            sonar_url: self.sonar_url(doc),
            github_url: extract_str(doc, &["github", "url"]),
            metadata: metadata_or_empty(&component.metadata),
            id: component.id,
            name: component.name,
            title: component.title,
            description: component.description,
            owner_team_id: component.owner_team_id,
        }
    }

    pub fn component_summary(&self, component: Component) -> ComponentSummary {
        let doc = component.metadata.as_ref();
        ComponentSummary {
            quality_gate: extract_str(doc, &["ci", "qualityGate"]),
            sonar_url: self.sonar_url(doc),
            id: component.id,
            name: component.name,
            owner_team_id: component.owner_team_id,
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use serde_json::json;
    use uuid::Uuid;

    use super::*;

    fn component(metadata: Option<Value>) -> Component {
        Component {
            id: Uuid::new_v4(),
            name: "billing-api".to_string(),
            title: Some("Billing API".to_string()),
            description: None,
            owner_team_id: None,
            metadata,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_extract_str_falls_back_to_empty() {
        let doc = json!({"jira": {"team": "CORE", "id": 7}, "list": ["x"]});
        assert_eq!(extract_str(Some(&doc), &["jira", "team"]), "CORE");
        assert_eq!(extract_str(Some(&doc), &["jira", "id"]), "");
        assert_eq!(extract_str(Some(&doc), &["jira", "team", "deeper"]), "");
        assert_eq!(extract_str(Some(&doc), &["list", "0"]), "");
        assert_eq!(extract_str(Some(&doc), &["missing"]), "");
        assert_eq!(extract_str(Some(&json!("flat")), &["jira"]), "");
        assert_eq!(extract_str(None, &["jira"]), "");
    }

    #[test]
    fn test_component_view_extracts_nested_fields() {
        let projector = Projector::new("https://sonar.example.com");
        let view = projector.component_view(component(Some(json!({
            "ci": {"qualityGate": "strict"},
            "sonar": {"projectKey": "org_billing"},
            "github": {"url": "https://github.com/org/billing"},
        }))));

        assert_eq!(view.quality_gate, "strict");
        assert_eq!(
            view.sonar_url,
            "https://sonar.example.com/dashboard?id=org_billing"
        );
        assert_eq!(view.github_url, "https://github.com/org/billing");
        assert_eq!(view.metadata["ci"]["qualityGate"], "strict");
    }

    #[test]
    fn test_component_view_with_partial_metadata() {
        let projector = Projector::new("https://sonar.example.com");
        let view = projector.component_view(component(Some(json!({
            "ci": "not-an-object",
            "sonar": {"projectKey": 42},
        }))));
        assert_eq!(view.quality_gate, "");
        assert_eq!(view.sonar_url, "");
        assert_eq!(view.github_url, "");

        let view = projector.component_view(component(None));
        assert_eq!(view.metadata, json!({}));
        assert_eq!(view.title.as_deref(), Some("Billing API"));
    }

    #[test]
    fn test_sonar_url_escapes_project_key() {
        let projector = Projector::new("https://sonar.example.com");
        let doc = json!({"sonar": {"projectKey": "team a&b#1"}});
        assert_eq!(
            projector.sonar_url(Some(&doc)),
            "https://sonar.example.com/dashboard?id=team+a%26b%231"
        );

        let broken = Projector::new("not a url");
        assert_eq!(broken.sonar_url(Some(&doc)), "");
    }

    #[test]
    fn test_team_view() {
        let projector = Projector::new("https://sonar.example.com");
        let team = Team {
            id: Uuid::new_v4(),
            name: "sre".to_string(),
            description: None,
            metadata: Some(json!({"color": "teal", "jira": {"team": "SRE"}})),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };

        let summary = projector.team_summary(team.clone());
        assert_eq!(summary.jira_team, "SRE");

        let view = projector.team_view(team);
        assert_eq!(view.color, "teal");
        assert_eq!(view.jira_team, "SRE");
    }
}
