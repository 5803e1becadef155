//! Task-specific instructions for the hosted model.
//!
//! Everything here is pure: the same request type and text always produce the
//! same prompt.

use std::fmt;

/// What the caller wants done with the text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestType {
    Summarize,
    Explain,
    Quiz,
    Notes,
    Default,
}

impl RequestType {
    /// Map a caller-supplied label onto a task. Labels match exactly; unknown
    /// ones (including other casings) are not an error and get the general
    /// analysis task.
    pub fn parse(label: &str) -> Self {
        match label {
            "summarize" => RequestType::Summarize,
            "explain" => RequestType::Explain,
            "quiz" => RequestType::Quiz,
            "notes" => RequestType::Notes,
            _ => RequestType::Default,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            RequestType::Summarize => "summarize",
            RequestType::Explain => "explain",
            RequestType::Quiz => "quiz",
            RequestType::Notes => "notes",
            RequestType::Default => "default",
        }
    }

    pub fn is_quiz(self) -> bool {
        self == RequestType::Quiz
    }
}

impl fmt::Display for RequestType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

const QUIZ_SCHEMA: &str = r#"{
  "questions": [
    {
      "question": "Question text",
      "options": ["A", "B", "C", "D"],
      "correct": 0
    }
  ]
}"#;

/// Single-purpose prompt for text that is already available.
pub fn build_prompt(request_type: RequestType, text: &str) -> String {
    match request_type {
        RequestType::Summarize => format!(
            "Please summarize the following text in exactly 3 key points. Make it clear and concise:\n\n{}",
            text
        ),
        RequestType::Explain => format!(
            "Please explain the following text in simple words that are easy to understand. Break down complex concepts:\n\n{}",
            text
        ),
        RequestType::Quiz => format!(
            "Based on the following text, generate exactly 5 multiple-choice quiz questions with exactly 4 options each. \
             Mark the correct answer with its zero-based option index. \
             Reply with JSON only, using this structure:\n{}\n\nText: {}",
            QUIZ_SCHEMA, text
        ),
        RequestType::Notes => format!(
            "Convert the following text into well-organized study notes with bullet points and key concepts highlighted:\n\n{}",
            text
        ),
        RequestType::Default => format!("Please analyze and explain the following text:\n\n{}", text),
    }
}

/// Dual-purpose prompt for an attached image: transcribe it and derive the
/// artifact in a single reply with the keys `extractedText` and `aiResponse`.
pub fn build_combined_prompt(request_type: RequestType) -> String {
    let (task, placeholder) = match request_type {
        RequestType::Summarize => ("summarize it in exactly 3 key points", "\"your 3-point summary here\""),
        RequestType::Explain => (
            "explain it in simple words that are easy to understand. Break down complex concepts",
            "\"your simple explanation here\"",
        ),
        RequestType::Quiz => (
            "generate exactly 5 multiple-choice quiz questions with exactly 4 options each, marking the correct answer with its zero-based option index",
            "",
        ),
        RequestType::Notes => (
            "convert it into well-organized study notes with bullet points and key concepts highlighted",
            "\"your organized study notes here\"",
        ),
        RequestType::Default => ("analyze and explain it", "\"your analysis here\""),
    };

    let ai_response = if request_type.is_quiz() {
        indent(QUIZ_SCHEMA, "  ")
    } else {
        placeholder.to_string()
    };

    format!(
        "Extract all the text from this image, then {task}.\n\n\
         Format your response as JSON with exactly these two keys:\n\
         {{\n  \"extractedText\": \"the full extracted text here\",\n  \"aiResponse\": {ai_response}\n}}"
    )
}

fn indent(block: &str, pad: &str) -> String {
    block
        .lines()
        .enumerate()
        .map(|(i, line)| if i == 0 { line.to_string() } else { format!("{}{}", pad, line) })
        .collect::<Vec<_>>()
        .join("\n")
}
