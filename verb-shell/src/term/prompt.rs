//! Prompt rendering
//!
//! Renders the session title followed by the configured marker, so
//! `Shell::builder("CLI App").prompt("> ")` reads as `CLI App> `.

use std::borrow::Cow;

use reedline::{Prompt, PromptEditMode, PromptHistorySearch, PromptHistorySearchStatus};

/// Prompt showing `{title}{marker}`
pub struct ShellPrompt {
    title: String,
    marker: String,
}

impl ShellPrompt {
    pub fn new(title: impl Into<String>, marker: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            marker: marker.into(),
        }
    }
}

impl Prompt for ShellPrompt {
    fn render_prompt_left(&self) -> Cow<str> {
        Cow::Borrowed(&self.title)
    }

    fn render_prompt_right(&self) -> Cow<str> {
        Cow::Borrowed("")
    }

    fn render_prompt_indicator(&self, _prompt_mode: PromptEditMode) -> Cow<str> {
        Cow::Borrowed(&self.marker)
    }

    fn render_prompt_multiline_indicator(&self) -> Cow<str> {
        Cow::Borrowed("::: ")
    }

    fn render_prompt_history_search_indicator(
        &self,
        history_search: PromptHistorySearch,
    ) -> Cow<str> {
        let prefix = match history_search.status {
            PromptHistorySearchStatus::Passing => "",
            PromptHistorySearchStatus::Failing => "failing ",
        };
        Cow::Owned(format!(
            "({}reverse-search: {}) ",
            prefix, history_search.term
        ))
    }
}
