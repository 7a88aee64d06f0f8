use crate::db::models::Spec;

/// Build the plan-generation prompt for a feature brief.
///
/// The output contract is spelled out inline so the response can be parsed
/// without tool/function calling support.
pub fn build_plan_prompt(spec: &Spec) -> String {
    let risks = spec.risks.as_deref().filter(|r| !r.trim().is_empty());
    let template = spec.template.as_deref().filter(|t| !t.trim().is_empty());

    format!(
        r#"You are a helpful senior software engineer and product manager. You output valid JSON only.

You are a senior Product Manager and Tech Lead.
Generate a development plan for the following feature request:

Title: {title}
Goal: {goal}
Target Users: {target_users}
Constraints: {constraints}
Risks: {risks}
Platform/Template: {template}

Output strictly in JSON format with the following structure:
{{
  "userStories": [
    {{
      "number": 1,
      "title": "User Story Title",
      "asA": "As a [user role/persona]",
      "iWant": "I want [specific goal/action]",
      "soThat": "so that [benefit/value]",
      "acceptanceCriteria": [
        {{
          "given": "Given [context/condition]",
          "when": "when [action/trigger]",
          "then": "then [expected outcome]"
        }}
      ]
    }}
  ],
  "engineeringTasks": [
    {{ "id": "task-1", "title": "Task title", "description": "Task details", "group": "Backend/Frontend/DevOps/etc" }}
  ]
}}

For user stories:
- Use the format: "As a [role], I want [goal] so that [benefit]"
- Each user story must have at least 2-4 acceptance criteria
- Acceptance criteria should follow Given/When/Then format
- Make user stories specific, testable, and focused on user value

For engineering tasks:
- Ensure tasks are granular and grouped logically
- Each task should have a clear title and description

Return ONLY valid JSON, no additional text or markdown code blocks."#,
        title = spec.title,
        goal = spec.goal,
        target_users = spec.target_users,
        constraints = spec.constraints,
        risks = risks.unwrap_or("None specified"),
        template = template.unwrap_or("General"),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn spec(risks: Option<&str>, template: Option<&str>) -> Spec {
        Spec {
            id: 1,
            user_id: 1,
            title: "Bulk CSV import".to_string(),
            goal: "Let admins import users".to_string(),
            target_users: "Workspace admins".to_string(),
            constraints: "Must stream files over 100MB".to_string(),
            risks: risks.map(str::to_string),
            template: template.map(str::to_string),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn prompt_interpolates_all_brief_fields() {
        let prompt = build_plan_prompt(&spec(Some("Partial imports"), Some("Internal Tool")));
        assert!(prompt.contains("Title: Bulk CSV import"));
        assert!(prompt.contains("Goal: Let admins import users"));
        assert!(prompt.contains("Target Users: Workspace admins"));
        assert!(prompt.contains("Risks: Partial imports"));
        assert!(prompt.contains("Platform/Template: Internal Tool"));
        assert!(prompt.contains(r#""engineeringTasks""#));
    }

    #[test]
    fn missing_optionals_fall_back_to_placeholders() {
        let prompt = build_plan_prompt(&spec(None, None));
        assert!(prompt.contains("Risks: None specified"));
        assert!(prompt.contains("Platform/Template: General"));
    }

    #[test]
    fn blank_optionals_treated_as_missing() {
        let prompt = build_plan_prompt(&spec(Some("   "), Some("")));
        assert!(prompt.contains("Risks: None specified"));
        assert!(prompt.contains("Platform/Template: General"));
    }
}
