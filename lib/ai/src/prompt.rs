//! Prompt templates.
//!
//! Templates use `{{variable_name}}` placeholders. String values are inserted
//! verbatim; any other JSON value is inserted in its compact JSON form.

use crate::error::PromptError;
use crate::llm_call::LlmCall;
use serde_json::Value as JsonValue;
use std::collections::{BTreeMap, HashMap};

/// A placeholder a template expects.
#[derive(Debug, Clone, PartialEq)]
pub struct VariableDefinition {
    pub description: String,
    pub required: bool,
    /// Substituted when the caller supplies no value.
    pub default: Option<JsonValue>,
}

impl VariableDefinition {
    #[must_use]
    pub fn required(description: impl Into<String>) -> Self {
        Self {
            description: description.into(),
            required: true,
            default: None,
        }
    }

    #[must_use]
    pub fn optional(description: impl Into<String>) -> Self {
        Self {
            description: description.into(),
            required: false,
            default: None,
        }
    }

    #[must_use]
    pub fn with_default(mut self, default: JsonValue) -> Self {
        self.default = Some(default);
        self
    }
}

/// A named prompt with an optional system prompt. Both may hold
/// placeholders.
#[derive(Debug, Clone, PartialEq)]
pub struct PromptTemplate {
    /// Registry key.
    pub name: String,
    pub content: String,
    pub system_prompt: Option<String>,
    /// Declared placeholders, in name order.
    pub variables: BTreeMap<String, VariableDefinition>,
}

fn substitute(template: &str, name: &str, value: &JsonValue) -> String {
    let placeholder = format!("{{{{{name}}}}}");
    let replacement = match value {
        JsonValue::String(s) => s.clone(),
        other => other.to_string(),
    };
    template.replace(&placeholder, &replacement)
}

impl PromptTemplate {
    #[must_use]
    pub fn new(name: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            content: content.into(),
            system_prompt: None,
            variables: BTreeMap::new(),
        }
    }

    #[must_use]
    pub fn with_system_prompt(mut self, system: impl Into<String>) -> Self {
        self.system_prompt = Some(system.into());
        self
    }

    #[must_use]
    pub fn with_variable(
        mut self,
        name: impl Into<String>,
        definition: VariableDefinition,
    ) -> Self {
        self.variables.insert(name.into(), definition);
        self
    }

    /// Validates that all required variables are provided.
    ///
    /// # Errors
    ///
    /// Returns `MissingVariable` for the first required variable (in name
    /// order) that has neither a value nor a default.
    pub fn validate_variables(
        &self,
        variables: &HashMap<String, JsonValue>,
    ) -> Result<(), PromptError> {
        let missing = self
            .variables
            .iter()
            .filter(|(_, def)| def.required && def.default.is_none())
            .find(|(name, _)| !variables.contains_key(*name));

        match missing {
            Some((name, _)) => Err(PromptError::MissingVariable {
                template: self.name.clone(),
                variable: name.clone(),
            }),
            None => Ok(()),
        }
    }

    fn render_text(&self, text: &str, variables: &HashMap<String, JsonValue>) -> String {
        let mut result = variables
            .iter()
            .fold(text.to_string(), |acc, (name, value)| substitute(&acc, name, value));

        for (name, def) in &self.variables {
            if let Some(default) = &def.default
                && !variables.contains_key(name)
            {
                result = substitute(&result, name, default);
            }
        }
        result
    }

    /// Renders the template with the given variables.
    ///
    /// # Errors
    ///
    /// Returns `MissingVariable` if a required variable is absent.
    pub fn render(&self, variables: &HashMap<String, JsonValue>) -> Result<String, PromptError> {
        self.validate_variables(variables)?;
        Ok(self.render_text(&self.content, variables))
    }

    /// Renders the system prompt with the given variables.
    #[must_use]
    pub fn render_system_prompt(&self, variables: &HashMap<String, JsonValue>) -> Option<String> {
        self.system_prompt
            .as_deref()
            .map(|template| self.render_text(template, variables))
    }

    /// Renders both prompts into an [`LlmCall`].
    ///
    /// # Errors
    ///
    /// Returns `MissingVariable` if a required variable is absent.
    pub fn to_call(&self, variables: &HashMap<String, JsonValue>) -> Result<LlmCall, PromptError> {
        let call = LlmCall::new(self.render(variables)?);
        Ok(match self.render_system_prompt(variables) {
            Some(system) => call.with_system_prompt(system),
            None => call,
        })
    }
}

/// Templates keyed by name.
#[derive(Debug, Clone, Default)]
pub struct PromptRegistry {
    templates: HashMap<String, PromptTemplate>,
}

impl PromptRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a template, replacing any template with the same name.
    pub fn register(&mut self, template: PromptTemplate) {
        self.templates.insert(template.name.clone(), template);
    }

    /// Gets a template by name.
    ///
    /// # Errors
    ///
    /// Returns `TemplateNotFound` for an unknown name.
    pub fn get(&self, name: &str) -> Result<&PromptTemplate, PromptError> {
        self.templates
            .get(name)
            .ok_or_else(|| PromptError::TemplateNotFound {
                name: name.to_string(),
            })
    }

    /// Returns the number of registered templates.
    #[must_use]
    pub fn len(&self) -> usize {
        self.templates.len()
    }

    /// Returns whether the registry is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn vars(pairs: &[(&str, JsonValue)]) -> HashMap<String, JsonValue> {
        pairs
            .iter()
            .map(|(name, value)| ((*name).to_string(), value.clone()))
            .collect()
    }

    #[test]
    fn template_rendering() {
        let template = PromptTemplate::new(
            "stories",
            "Write stories for the epic {{epic}} in project {{project}}. Areas: {{areas}}",
        );

        let rendered = template
            .render(&vars(&[
                ("epic", json!("Payments")),
                ("project", json!("Storefront")),
                ("areas", json!(["Checkout", "Refunds"])),
            ]))
            .unwrap();
        assert_eq!(
            rendered,
            r#"Write stories for the epic Payments in project Storefront. Areas: ["Checkout","Refunds"]"#
        );
    }

    #[test]
    fn template_with_defaults() {
        let template = PromptTemplate::new("greeting", "Plan for {{team}} with {{size}} people.")
            .with_variable("team", VariableDefinition::required("Team name"))
            .with_variable(
                "size",
                VariableDefinition::optional("Team size").with_default(json!(3)),
            );

        let rendered = template.render(&vars(&[("team", json!("Core"))])).unwrap();
        assert_eq!(rendered, "Plan for Core with 3 people.");
    }

    #[test]
    fn missing_required_variable_is_reported() {
        let template = PromptTemplate::new("order", "{{stories}}")
            .with_variable("stories", VariableDefinition::required("Stories"));

        assert_eq!(
            template.render(&HashMap::new()),
            Err(PromptError::MissingVariable {
                template: "order".to_string(),
                variable: "stories".to_string(),
            })
        );
    }

    #[test]
    fn to_call_renders_system_prompt() {
        let template = PromptTemplate::new("epics", "Areas: {{areas}}")
            .with_system_prompt("You plan {{project}}.");
        let request = template
            .to_call(&vars(&[("areas", json!("Auth")), ("project", json!("Shop"))]))
            .unwrap()
            .into_request();

        assert_eq!(request.prompt, "Areas: Auth");
        assert_eq!(request.system.as_deref(), Some("You plan Shop."));
    }

    #[test]
    fn registry_operations() {
        let mut registry = PromptRegistry::new();
        assert!(registry.is_empty());

        registry.register(PromptTemplate::new("epics", "Content 1"));
        registry.register(PromptTemplate::new("stories", "Content 2"));

        assert_eq!(registry.len(), 2);
        assert!(registry.get("epics").is_ok());
        assert_eq!(
            registry.get("nonexistent"),
            Err(PromptError::TemplateNotFound {
                name: "nonexistent".to_string()
            })
        );
    }
}
