//! Built-in background templates and the active image selection.

use serde::{Deserialize, Serialize};

/// A gallery template.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Template {
    pub id: u32,
    /// Path relative to the asset root.
    pub url: String,
    pub name: String,
    pub category: String,
}

impl Template {
    fn new(id: u32, url: &str, name: &str, category: &str) -> Self {
        Self {
            id,
            url: url.to_string(),
            name: name.to_string(),
            category: category.to_string(),
        }
    }
}

/// The templates shipped with the editor.
pub fn builtin_templates() -> Vec<Template> {
    vec![
        Template::new(1, "/templates/drake.jpg", "Drake", "Popular"),
        Template::new(2, "/templates/distracted-boyfriend.jpg", "Distracted Boyfriend", "Classic"),
        Template::new(3, "/templates/success-kid.jpg", "Success Kid", "Victory"),
        Template::new(4, "/templates/change-my-mind.jpg", "Change My Mind", "Debate"),
        Template::new(5, "/templates/two-buttons.jpg", "Two Buttons", "Choice"),
        Template::new(6, "/templates/expanding-brain.jpg", "Expanding Brain", "Smart"),
        Template::new(7, "/templates/woman-yelling.jpg", "Woman Yelling at Cat", "Reaction"),
        Template::new(8, "/templates/thinking-guy.jpg", "Thinking Guy", "Thoughtful"),
    ]
}

/// Which background is active: an uploaded image wins over the template.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageSelection {
    template_url: String,
    uploaded: Option<String>,
}

impl Default for ImageSelection {
    fn default() -> Self {
        let template_url = builtin_templates()
            .into_iter()
            .next()
            .map(|template| template.url)
            .unwrap_or_default();
        Self {
            template_url,
            uploaded: None,
        }
    }
}

impl ImageSelection {
    /// Select a template; discards any upload.
    pub fn select_template(&mut self, url: impl Into<String>) {
        self.template_url = url.into();
        self.uploaded = None;
    }

    /// Use an uploaded image (usually a data URI).
    pub fn upload(&mut self, data_url: impl Into<String>) {
        self.uploaded = Some(data_url.into());
    }

    /// The source string the compositor should load.
    pub fn current(&self) -> &str {
        self.uploaded.as_deref().unwrap_or(&self.template_url)
    }

    /// Whether an upload is active.
    pub fn has_upload(&self) -> bool {
        self.uploaded.is_some()
    }
}
