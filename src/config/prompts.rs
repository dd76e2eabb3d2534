//! Prompt templates for Replikk.
//!
//! Prompts can be customized by placing TOML files in the custom prompts directory.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Collection of all prompt templates.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
#[derive(Default)]
pub struct Prompts {
    pub rag: RagPrompts,
    /// Custom variables from config, available in all prompts.
    #[serde(skip)]
    pub variables: std::collections::HashMap<String, String>,
}


/// Prompts for RAG answer generation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RagPrompts {
    pub system: String,
    pub user: String,
}

impl Default for RagPrompts {
    fn default() -> Self {
        Self {
            system: r#"You are an assistant that answers questions about a TV season using only the subtitle excerpts provided as context.

Guidelines:
- Answer using only the provided excerpts; never rely on outside knowledge of the show
- Quote the relevant dialogue lines verbatim when they support your answer
- Cite every excerpt you use with its episode label, e.g. [S01E05]
- If the excerpts do not contain the answer, say so plainly instead of guessing
- Be concise"#
                .to_string(),

            user: r#"Question: {{question}}

Subtitle excerpts:

{{context}}

Answer the question based only on the excerpts above."#
                .to_string(),
        }
    }
}

impl Prompts {
    /// Load prompts from the default location, with optional custom directory and variables.
    pub fn load(
        custom_dir: Option<&str>,
        custom_variables: Option<&std::collections::HashMap<String, String>>,
    ) -> crate::error::Result<Self> {
        let mut prompts = Prompts::default();

        if let Some(vars) = custom_variables {
            prompts.variables = vars.clone();
        }

        if let Some(dir) = custom_dir {
            let custom_path = PathBuf::from(shellexpand::tilde(dir).to_string());

            let rag_path = custom_path.join("rag.toml");
            if rag_path.exists() {
                let content = std::fs::read_to_string(&rag_path)?;
                prompts.rag = toml::from_str(&content)?;
            }
        }

        Ok(prompts)
    }

    /// Render a prompt template with the given variables.
    pub fn render(template: &str, vars: &std::collections::HashMap<String, String>) -> String {
        let mut result = template.to_string();
        for (key, value) in vars {
            result = result.replace(&format!("{{{{{}}}}}", key), value);
        }
        result
    }

    /// Render a prompt template with both provided variables and custom config variables.
    /// Provided variables take precedence over custom config variables.
    pub fn render_with_custom(
        &self,
        template: &str,
        vars: &std::collections::HashMap<String, String>,
    ) -> String {
        let mut merged = self.variables.clone();
        for (key, value) in vars {
            merged.insert(key.clone(), value.clone());
        }
        Self::render(template, &merged)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_prompts() {
        let prompts = Prompts::default();
        assert!(prompts.rag.system.contains("episode label"));
        assert!(prompts.rag.user.contains("{{question}}"));
        assert!(prompts.rag.user.contains("{{context}}"));
    }

    #[test]
    fn test_render_template() {
        let template = "Question: {{question}}\n\n{{context}}";
        let mut vars = std::collections::HashMap::new();
        vars.insert("question".to_string(), "Who is Reese?".to_string());
        vars.insert("context".to_string(), "[1] S01E01 (lines 0-2)".to_string());

        let result = Prompts::render(template, &vars);
        assert_eq!(result, "Question: Who is Reese?\n\n[1] S01E01 (lines 0-2)");
    }

    #[test]
    fn test_custom_dir_overrides_rag_prompts() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("rag.toml"),
            "system = \"custom system\"\nuser = \"Q: {{question}}\"\n",
        )
        .unwrap();

        let prompts = Prompts::load(Some(dir.path().to_str().unwrap()), None).unwrap();
        assert_eq!(prompts.rag.system, "custom system");
        assert_eq!(prompts.rag.user, "Q: {{question}}");
    }

    #[test]
    fn test_config_variables_with_override() {
        let mut config_vars = std::collections::HashMap::new();
        config_vars.insert("show".to_string(), "Person of Interest".to_string());
        let prompts = Prompts::load(None, Some(&config_vars)).unwrap();

        let mut vars = std::collections::HashMap::new();
        vars.insert("question".to_string(), "test".to_string());
        let result = prompts.render_with_custom("{{show}}: {{question}}", &vars);
        assert_eq!(result, "Person of Interest: test");
    }
}
