//! Markdown rendering of a spec and its generated plan.

use crate::db::models::{GeneratedOutput, Spec};
use crate::types::plan::{EngineeringTask, UserStory};

/// Render the brief plus its plan as a markdown document.
pub fn render_markdown(spec: &Spec, output: &GeneratedOutput) -> String {
    let mut doc = String::new();

    doc.push_str(&format!("# {}\n\n", spec.title));
    doc.push_str(&format!("## Goal\n{}\n\n", spec.goal));
    doc.push_str(&format!("## Target Users\n{}\n\n", spec.target_users));
    doc.push_str(&format!("## Constraints\n{}\n\n", spec.constraints));
    if let Some(risks) = spec.risks.as_deref().filter(|r| !r.trim().is_empty()) {
        doc.push_str(&format!("## Risks\n{risks}\n\n"));
    }

    doc.push_str("## User Stories\n");
    let stories: Vec<String> = output.user_stories.iter().map(render_story).collect();
    doc.push_str(&stories.join("\n\n"));
    doc.push_str("\n\n## Engineering Tasks\n");
    for task in &output.engineering_tasks {
        doc.push_str(&render_task(task));
        doc.push('\n');
    }

    doc
}

fn render_story(story: &UserStory) -> String {
    // The model is told to embed the "As a"/"I want"/"so that" prefixes in
    // the field values; strip them so the sentence reads once.
    let as_a = strip_prefix_ci(&story.as_a, "as a ");
    let i_want = strip_prefix_ci(&story.i_want, "i want ");
    let so_that = strip_prefix_ci(&story.so_that, "so that ");

    let mut text = format!(
        "User Story {}: {}\nAs a {}, I want {} so that {}\n\nAcceptance Criteria\n",
        story.number, story.title, as_a, i_want, so_that
    );
    for ac in &story.acceptance_criteria {
        let given = strip_prefix_ci(&ac.given, "given ");
        let when = strip_prefix_ci(&ac.when, "when ");
        let then = strip_prefix_ci(&ac.then, "then ");
        text.push_str(&format!("  - Given {given}, when {when}, then {then}\n"));
    }
    text.trim_end().to_string()
}

fn render_task(task: &EngineeringTask) -> String {
    match task.description.as_deref().filter(|d| !d.trim().is_empty()) {
        Some(description) => format!("- [ ] **{}** ({}): {}", task.title, task.group, description),
        None => format!("- [ ] **{}** ({})", task.title, task.group),
    }
}

fn strip_prefix_ci<'a>(s: &'a str, prefix: &str) -> &'a str {
    match s.get(..prefix.len()) {
        Some(head) if head.eq_ignore_ascii_case(prefix) => s[prefix.len()..].trim_start(),
        _ => s,
    }
}

/// Download filename derived from the spec title: non-alphanumerics become
/// underscores, lowercased, with a `_spec.md` suffix.
pub fn export_filename(title: &str) -> String {
    let stem: String = title
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() {
                c.to_ascii_lowercase()
            } else {
                '_'
            }
        })
        .collect();
    format!("{stem}_spec.md")
}
