use crate::transition::error::{TransitionError, TransitionErrorKind};

use std::io;


/// Operator interaction seam. The terminal implementation lives in the CLI.
pub trait Prompt {
    fn is_interactive(&self) -> bool;
    /// Show a block of text before a question.
    fn show(&mut self, message: &str);
    /// Yes/no question, default No.
    fn confirm(&mut self, question: &str) -> io::Result<bool>;
    /// Free-text answer without the line terminator.
    fn read_line(&mut self, label: &str) -> io::Result<String>;
}


#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfirmationTier {
    None,
    Single,
    Double,
}

impl ConfirmationTier {
    pub fn select(auto_approve: bool, requires_confirmation: bool) -> Self {
        if auto_approve {
            Self::None
        } else if requires_confirmation {
            Self::Double
        } else {
            Self::Single
        }
    }

    /// Ask for approval. Declines come back as `Ok(false)`; a missing terminal is an error.
    pub fn confirm<P: Prompt + ?Sized>(
        &self,
        prompt: &mut P,
        env_name: &str,
        operation: &str,
        details: &str,
    ) -> Result<bool, TransitionError> {
        if *self == Self::None {
            return Ok(true);
        }
        if !prompt.is_interactive() {
            return Err(TransitionError::new(TransitionErrorKind::NoInteractiveTerminal));
        }

        match self {
            Self::None => Ok(true),
            Self::Single => {
                prompt.show(&format!("WARNING: DANGEROUS OPERATION\n{details}"));
                Ok(prompt.confirm(&format!("Proceed with {operation}?"))?)
            }
            Self::Double => {
                prompt.show(&format!(
                    "You are about to modify PRODUCTION environment: {env_name}\n{details}"
                ));
                if !prompt.confirm("Continue?")? {
                    return Ok(false);
                }
                let typed = prompt.read_line(&format!("Type '{env_name}' to confirm"))?;
                Ok(typed == env_name)
            }
        }
    }
}


#[cfg(test)]
pub mod fake {
    use super::Prompt;
    use std::collections::VecDeque;
    use std::io;

    /// Scripted answers, recording every question asked.
    #[derive(Default)]
    pub struct FakePrompt {
        pub interactive: bool,
        pub confirms: VecDeque<bool>,
        pub lines: VecDeque<String>,
        pub asked: Vec<String>,
        pub shown: Vec<String>,
    }

    impl FakePrompt {
        pub fn answering(confirms: &[bool], lines: &[&str]) -> Self {
            FakePrompt {
                interactive: true,
                confirms: confirms.iter().copied().collect(),
                lines: lines.iter().map(|s| s.to_string()).collect(),
                ..Default::default()
            }
        }

        pub fn headless() -> Self {
            FakePrompt::default()
        }
    }

    impl Prompt for FakePrompt {
        fn is_interactive(&self) -> bool {
            self.interactive
        }

        fn show(&mut self, message: &str) {
            self.shown.push(message.to_string());
        }

        fn confirm(&mut self, question: &str) -> io::Result<bool> {
            self.asked.push(question.to_string());
            Ok(self.confirms.pop_front().unwrap_or(false))
        }

        fn read_line(&mut self, label: &str) -> io::Result<String> {
            self.asked.push(label.to_string());
            Ok(self.lines.pop_front().unwrap_or_default())
        }
    }
}
