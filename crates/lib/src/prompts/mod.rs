//! # Prompt Templates
//!
//! Template rendering and the prompt builder for SQL generation. The default
//! templates live in [`tasks`].

pub mod tasks;

use crate::{errors::PromptError, schema::SchemaContext};
use serde::{Deserialize, Serialize};

/// A system/user template pair for one model task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PromptTemplate {
    pub system: String,
    pub user: String,
}

impl PromptTemplate {
    pub fn new(system: impl Into<String>, user: impl Into<String>) -> Self {
        Self {
            system: system.into(),
            user: user.into(),
        }
    }

    pub fn sql_generation() -> Self {
        Self::new(
            tasks::SQL_GENERATION_SYSTEM_PROMPT,
            tasks::SQL_GENERATION_USER_PROMPT,
        )
    }

    pub fn answer_summary() -> Self {
        Self::new(
            tasks::ANSWER_SUMMARY_SYSTEM_PROMPT,
            tasks::ANSWER_SUMMARY_USER_PROMPT,
        )
    }

    pub fn forecast() -> Self {
        Self::new(tasks::FORECAST_SYSTEM_PROMPT, tasks::FORECAST_USER_PROMPT)
    }

    /// Renders the user template with `vars`; the system prompt is used verbatim.
    pub fn render(&self, vars: &[(&str, &str)]) -> RenderedPrompt {
        RenderedPrompt {
            system: self.system.clone(),
            user: render_template(&self.user, vars),
        }
    }
}

/// A prompt ready to be sent to an AI provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedPrompt {
    pub system: String,
    pub user: String,
}

/// Substitutes `{name}` placeholders in one left-to-right pass.
///
/// Substituted values are never rescanned, so a value that itself contains a
/// placeholder is inserted literally. Unknown placeholders and stray braces are
/// left untouched.
pub fn render_template(template: &str, vars: &[(&str, &str)]) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let after = &rest[open + 1..];
        let value = after.find('}').and_then(|close| {
            let name = &after[..close];
            vars.iter()
                .find(|(key, _)| *key == name)
                .map(|(_, value)| (*value, close))
        });
        match value {
            Some((value, close)) => {
                out.push_str(value);
                rest = &after[close + 1..];
            }
            None => {
                out.push('{');
                rest = after;
            }
        }
    }

    out.push_str(rest);
    out
}

/// Counts the occurrences of `{name}` in a template.
pub fn count_placeholder(template: &str, name: &str) -> usize {
    template.matches(&format!("{{{name}}}")).count()
}

/// Checks that a SQL generation template embeds the schema and the question
/// exactly once each.
pub fn validate_sql_template(user_template: &str) -> Result<(), PromptError> {
    for name in ["schema", "question"] {
        let count = count_placeholder(user_template, name);
        if count != 1 {
            return Err(PromptError::InvalidTemplate(format!(
                "the SQL generation template must contain `{{{name}}}` exactly once, found {count}"
            )));
        }
    }
    Ok(())
}

/// Builds the SQL generation prompt for a question.
pub fn build_sql_prompt(
    template: &PromptTemplate,
    schema: &SchemaContext,
    question: &str,
) -> RenderedPrompt {
    template.render(&[("schema", schema.as_str()), ("question", question)])
}
