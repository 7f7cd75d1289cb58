//! Answer generation: prompt assembly, completion calls and rule-based fallback

pub mod composer;
pub mod fallback;
pub mod prompt;

pub use composer::AnswerComposer;
pub use fallback::rule_based_answer;
pub use prompt::PromptBuilder;
