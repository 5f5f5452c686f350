//! Prompt 构建服务
//!
//! 负责构建发送给生成服务的指令、清洗生成结果，以及本地增强文本的合成。

use once_cell::sync::Lazy;
use regex::Regex;

use crate::models::{EnhancementRequest, FlowAnswers};

/// 问卷模式的指令开头
const FLOW_PREAMBLE: &str =
    "You are an expert prompt engineer. Create a concise, effective prompt based on these specifications:";

/// 问卷模式的指令结尾
const FLOW_CLOSING: &str = "Create a single, well-crafted prompt that incorporates all these elements. \
The output should be one clear, actionable prompt that someone could use directly with an AI assistant.

Format your response as just the enhanced prompt, nothing else.";

/// 直接模式下原始提示词为空时的本地结果
pub const GENERIC_ENHANCEMENT: &str =
    "Create a comprehensive and well-structured response tailored to your specific needs.";

static OPENING_FENCE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^```[A-Za-z0-9_]*\n?").expect("valid opening fence regex"));
static CLOSING_FENCE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\n?```$").expect("valid closing fence regex"));
static SURROUNDING_QUOTE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"^["']|["']$"#).expect("valid quote regex"));

/// Prompt 服务
pub struct PromptService;

impl PromptService {
    /// 创建新的 Prompt 服务
    pub fn new() -> Self {
        Self
    }

    /// 构建发送给生成服务的指令
    pub fn build_instruction(&self, request: &EnhancementRequest) -> String {
        if request.is_flow() {
            let default_answers = FlowAnswers::default();
            let answers = request.flow_answers.as_ref().unwrap_or(&default_answers);
            self.build_flow_instruction(answers, request.original_prompt())
        } else {
            format!(
                "Enhance this prompt for clarity and effectiveness: \"{}\"",
                request.original_prompt().unwrap_or_default()
            )
        }
    }

    fn build_flow_instruction(&self, answers: &FlowAnswers, original_prompt: Option<&str>) -> String {
        let mut spec_lines = vec![
            format!("Audience: {}", answers.audience().unwrap_or_default()),
            format!("Purpose: {}", answers.purpose().unwrap_or_default()),
            format!("Style: {}", answers.style().unwrap_or("Professional")),
            format!("Constraints: {}", answers.constraints().unwrap_or("None")),
        ];

        if let Some(prompt) = original_prompt {
            spec_lines.push(format!("Original request: {}", prompt));
        }

        format!("{}\n\n{}\n\n{}", FLOW_PREAMBLE, spec_lines.join("\n"), FLOW_CLOSING)
    }

    /// 清洗生成文本：去首尾空白、代码块标记和一层引号
    pub fn clean_generated_text(&self, content: &str) -> String {
        let text = content.trim();
        let text = OPENING_FENCE.replace(text, "");
        let text = CLOSING_FENCE.replace(&text, "");
        SURROUNDING_QUOTE.replace_all(&text, "").into_owned()
    }

    /// 本地合成增强文本，不做任何网络调用
    pub fn local_enhancement(&self, request: &EnhancementRequest) -> String {
        match (request.is_flow(), request.flow_answers.as_ref()) {
            (true, Some(answers)) => {
                let audience = answers.audience().unwrap_or("general audience").to_lowercase();
                let purpose = answers.purpose().unwrap_or("general purpose").to_lowercase();
                let style = answers.style().unwrap_or("professional").to_lowercase();
                let constraints = answers
                    .constraints()
                    .map(|c| format!(" with constraints: {}", c))
                    .unwrap_or_default();

                format!("A {} {} tailored for {}{}.", style, purpose, audience, constraints)
            }
            _ => match request.original_prompt() {
                Some(prompt) => format!(
                    "Enhanced: {} - Optimized for clarity, specificity, and effectiveness.",
                    prompt
                ),
                None => GENERIC_ENHANCEMENT.to_string(),
            },
        }
    }
}

impl Default for PromptService {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn answers(audience: &str, purpose: &str, style: &str, constraints: &str) -> FlowAnswers {
        let opt = |s: &str| Some(s.to_string());
        FlowAnswers {
            audience: opt(audience),
            purpose: opt(purpose),
            style: opt(style),
            constraints: opt(constraints),
        }
    }

    #[test]
    fn test_flow_instruction_contents() {
        let service = PromptService::new();
        let mut request = EnhancementRequest::flow(answers("Students", "Explain photosynthesis", "Casual", ""));
        let instruction = service.build_instruction(&request);

        assert!(instruction.starts_with(FLOW_PREAMBLE));
        assert!(instruction.contains("Audience: Students\n"));
        assert!(instruction.contains("Purpose: Explain photosynthesis\n"));
        assert!(instruction.contains("Style: Casual\n"));
        assert!(instruction.contains("Constraints: None"));
        assert!(!instruction.contains("Original request"));
        assert!(instruction.ends_with("just the enhanced prompt, nothing else."));

        request.original_prompt = Some("make it fun".to_string());
        let instruction = service.build_instruction(&request);
        assert!(instruction.contains("Original request: make it fun"));
    }

    #[test]
    fn test_direct_instruction() {
        let service = PromptService::new();
        let instruction = service.build_instruction(&EnhancementRequest::direct("write a poem"));
        assert_eq!(
            instruction,
            "Enhance this prompt for clarity and effectiveness: \"write a poem\""
        );
    }

    #[test]
    fn test_clean_generated_text() {
        let service = PromptService::new();
        assert_eq!(service.clean_generated_text("  plain text \n"), "plain text");
        assert_eq!(service.clean_generated_text("```markdown\nfenced\n```"), "fenced");
        assert_eq!(service.clean_generated_text("```\nfenced```"), "fenced");
        assert_eq!(service.clean_generated_text("\"quoted\""), "quoted");
        assert_eq!(service.clean_generated_text("'single'"), "single");
        // 只去掉一层
        assert_eq!(service.clean_generated_text("\"\"twice\"\""), "\"twice\"");
        // 内部引号保留
        assert_eq!(service.clean_generated_text("say \"hi\" now"), "say \"hi\" now");
    }

    #[test]
    fn test_local_flow_enhancement() {
        let service = PromptService::new();
        let request = EnhancementRequest::flow(answers("Students", "Explain photosynthesis", "Casual", ""));
        assert_eq!(
            service.local_enhancement(&request),
            "A casual explain photosynthesis tailored for students."
        );

        let request = EnhancementRequest::flow(answers("Devs", "Code Review", "", "Under 100 Words"));
        assert_eq!(
            service.local_enhancement(&request),
            "A professional code review tailored for devs with constraints: Under 100 Words."
        );
    }

    #[test]
    fn test_local_direct_enhancement() {
        let service = PromptService::new();
        assert_eq!(
            service.local_enhancement(&EnhancementRequest::direct("Write a haiku")),
            "Enhanced: Write a haiku - Optimized for clarity, specificity, and effectiveness."
        );
        assert_eq!(
            service.local_enhancement(&EnhancementRequest::direct("")),
            GENERIC_ENHANCEMENT
        );
        assert_eq!(
            service.local_enhancement(&EnhancementRequest::default()),
            GENERIC_ENHANCEMENT
        );
    }
}
