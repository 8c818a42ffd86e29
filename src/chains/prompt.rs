// Prompt templates with `{name}` placeholders.
// `{{` and `}}` render as literal braces.

use crate::collaborators::PromptVars;
use crate::core::errors::RagError;

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Text(String),
    Var(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptTemplate {
    segments: Vec<Segment>,
}

impl PromptTemplate {
    pub fn parse(template: &str) -> Result<Self, RagError> {
        let mut segments = Vec::new();
        let mut text = String::new();
        let mut chars = template.chars().peekable();

        while let Some(c) = chars.next() {
            match c {
                '{' if chars.peek() == Some(&'{') => {
                    chars.next();
                    text.push('{');
                }
                '}' if chars.peek() == Some(&'}') => {
                    chars.next();
                    text.push('}');
                }
                '{' => {
                    let mut name = String::new();
                    loop {
                        match chars.next() {
                            Some('}') => break,
                            Some(ch) => name.push(ch),
                            None => {
                                return Err(RagError::Internal(format!(
                                    "Unclosed placeholder in prompt template: {{{}",
                                    name
                                )))
                            }
                        }
                    }
                    let name = name.trim().to_string();
                    if name.is_empty() {
                        return Err(RagError::Internal(
                            "Empty placeholder in prompt template".to_string(),
                        ));
                    }
                    if !text.is_empty() {
                        segments.push(Segment::Text(std::mem::take(&mut text)));
                    }
                    segments.push(Segment::Var(name));
                }
                '}' => {
                    return Err(RagError::Internal(
                        "Unmatched '}' in prompt template".to_string(),
                    ))
                }
                other => text.push(other),
            }
        }
        if !text.is_empty() {
            segments.push(Segment::Text(text));
        }
        Ok(Self { segments })
    }

    /// Placeholder names in order of first appearance
    pub fn variables(&self) -> Vec<&str> {
        let mut names: Vec<&str> = Vec::new();
        for segment in &self.segments {
            if let Segment::Var(name) = segment {
                if !names.contains(&name.as_str()) {
                    names.push(name.as_str());
                }
            }
        }
        names
    }

    pub fn render(&self, vars: &PromptVars) -> Result<String, RagError> {
        let mut out = String::new();
        for segment in &self.segments {
            match segment {
                Segment::Text(text) => out.push_str(text),
                Segment::Var(name) => {
                    let value = vars.get(name).ok_or_else(|| {
                        RagError::Internal(format!("Missing prompt variable: {}", name))
                    })?;
                    out.push_str(value);
                }
            }
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collaborators::prompt_vars;

    #[test]
    fn renders_placeholders_and_escapes() {
        let template = PromptTemplate::parse("Q: {question}\nReturn {{\"score\": ...}}").unwrap();
        let rendered = template
            .render(&prompt_vars([("question", "agent memory")]))
            .unwrap();
        assert_eq!(rendered, "Q: agent memory\nReturn {\"score\": ...}");
    }

    #[test]
    fn lists_variables_once() {
        let template = PromptTemplate::parse("{a} {b} {a}").unwrap();
        assert_eq!(template.variables(), vec!["a", "b"]);
    }

    #[test]
    fn missing_variable_is_an_error() {
        let template = PromptTemplate::parse("{context}").unwrap();
        assert!(template.render(&prompt_vars([])).is_err());
    }

    #[test]
    fn rejects_malformed_templates() {
        assert!(PromptTemplate::parse("{open").is_err());
        assert!(PromptTemplate::parse("stray }").is_err());
        assert!(PromptTemplate::parse("{}").is_err());
    }

    #[test]
    fn substituted_values_are_not_reparsed() {
        let template = PromptTemplate::parse("<doc>{content}</doc>").unwrap();
        let rendered = template
            .render(&prompt_vars([("content", "fn main() { {x} }")]))
            .unwrap();
        assert_eq!(rendered, "<doc>fn main() { {x} }</doc>");
    }
}
