//! Interactive input seam.
//!
//! Prompts block the calling thread until answered; they are the only
//! suspension points of a run besides retry backoff sleeps. The binary
//! implements [`Prompter`] over stdin; tests script the answers.

use std::collections::VecDeque;

/// Supplies interactive answers during a run.
///
/// Returning `None` declines the prompt; callers treat a declined prompt as
/// an abort of the step that needed it.
pub trait Prompter {
    /// Handle of the profile to fetch. An empty answer means "the logged-in
    /// account". Asked again when the previous handle does not exist.
    fn profile_to_fetch(&mut self) -> Option<String>;

    /// Two-factor verification code. Asked again while the code is empty or
    /// rejected.
    fn verification_code(&mut self) -> Option<String>;
}

/// Prompter answering from pre-scripted lists; declines once exhausted.
#[derive(Debug, Default)]
pub struct ScriptedPrompter {
    profiles: VecDeque<String>,
    codes: VecDeque<String>,
}

impl ScriptedPrompter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues an answer for the next profile prompt.
    pub fn with_profile(mut self, handle: &str) -> Self {
        self.profiles.push_back(handle.to_string());
        self
    }

    /// Queues an answer for the next verification-code prompt.
    pub fn with_code(mut self, code: &str) -> Self {
        self.codes.push_back(code.to_string());
        self
    }
}

impl Prompter for ScriptedPrompter {
    fn profile_to_fetch(&mut self) -> Option<String> {
        self.profiles.pop_front()
    }

    fn verification_code(&mut self) -> Option<String> {
        self.codes.pop_front()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scripted_prompter_answers_in_order_then_declines() {
        let mut prompter = ScriptedPrompter::new()
            .with_profile("alice")
            .with_code("123456");

        assert_eq!(prompter.profile_to_fetch(), Some("alice".to_string()));
        assert_eq!(prompter.profile_to_fetch(), None);
        assert_eq!(prompter.verification_code(), Some("123456".to_string()));
        assert_eq!(prompter.verification_code(), None);
    }
}
