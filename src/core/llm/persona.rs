//! System prompt for the phone assistant.

use serde::Deserialize;

/// Parameters of the assistant persona.
///
/// Rendered once at startup into the system message sent with every request.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Persona {
    pub assistant_name: String,
    pub business_name: String,
    pub location: String,
    pub hours: String,
    /// What the assistant helps callers with.
    pub services: String,
    /// Style rules, rendered as a bulleted list.
    pub tone_rules: Vec<String>,
}

impl Default for Persona {
    fn default() -> Self {
        Self {
            assistant_name: "Lisa".to_string(),
            business_name: "London Electronics".to_string(),
            location: "Main Street, England".to_string(),
            hours: "8 AM to 8 PM daily, but we're closed on Sundays".to_string(),
            services: "service-related inquiries with Televisions and Electronics".to_string(),
            tone_rules: vec![
                "Maintain a fun, lighthearted vibe. Say things like \"Umm...\", \"Well...\", or \"I mean...\"".to_string(),
                "Keep responses concise, as it's a voice conversation. Avoid long monologues.".to_string(),
                "Provide basic info about the electronics if asked, but steer the conversation efficiently toward service scheduling if needed.".to_string(),
            ],
        }
    }
}

impl Persona {
    pub fn render(&self) -> String {
        let mut prompt = format!(
            "Your name is {}. You are a voice assistant for {}, located at {}.\n\
             The hours are {}.\n\n\
             You're responsible for assisting customers with {}.\n",
            self.assistant_name, self.business_name, self.location, self.hours, self.services
        );

        if !self.tone_rules.is_empty() {
            prompt.push('\n');
            for rule in &self.tone_rules {
                prompt.push_str("- ");
                prompt.push_str(rule);
                prompt.push('\n');
            }
        }

        prompt
    }
}
