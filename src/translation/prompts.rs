/*!
 * Prompt templates for document translation.
 *
 * The system prompt does double duty: it sets the translation role and
 * it instructs the engine to echo placeholder tokens verbatim. Engines
 * do not reliably comply with the second part, which is why the
 * placeholder resolver downstream is tolerant of drift.
 */

/// System prompt template for document translation.
#[derive(Debug, Clone)]
pub struct PromptTemplate {
    /// The template string with placeholders
    template: String,
}

impl PromptTemplate {
    /// The default system prompt for masked document translation.
    pub const DOCUMENT_TRANSLATOR: &'static str = r#"You are a professional document translator translating from {source_language} to {target_language}.

## Your Role
- Translate the natural-language content faithfully and idiomatically
- Preserve paragraph breaks, line breaks, and punctuation structure
- Keep headings, table content, and list items recognizable as such

## Figure Placeholders
The text contains figure placeholder tokens of the form <<DOC_FIG:0000>>.
These stand in for images and are NOT text to translate:
- Reproduce every placeholder token EXACTLY as it appears, byte for byte
- Never translate, reorder, merge, or drop a placeholder token
- Never invent placeholder tokens that are not in the source

## Output Requirements
- Respond with the translated text only, no explanations or notes
- Do not add content that is not present in the source"#;

    /// Create a new prompt template.
    pub fn new(template: &str) -> Self {
        Self {
            template: template.to_string(),
        }
    }

    /// Create the default document translator template.
    pub fn document_translator() -> Self {
        Self::new(Self::DOCUMENT_TRANSLATOR)
    }

    /// Render the template with the given variables.
    pub fn render(&self, source_language: &str, target_language: &str) -> String {
        self.template
            .replace("{source_language}", source_language)
            .replace("{target_language}", target_language)
    }
}

impl Default for PromptTemplate {
    fn default() -> Self {
        Self::document_translator()
    }
}
