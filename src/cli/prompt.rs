use crate::cli::ux::Palette;
use crate::transition::Prompt;

use std::io::{self, BufRead, IsTerminal, StdinLock, Stderr, Write};


/// `y`/`yes` in any case. Everything else, including an empty answer, is No.
pub fn is_yes(answer: &str) -> bool {
    matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes")
}


/// Line-oriented prompt. Questions go to `output`, answers come from `input`.
pub struct TerminalPrompt<R: BufRead, W: Write> {
    input: R,
    output: W,
    interactive: bool,
    palette: Palette,
}

impl TerminalPrompt<StdinLock<'static>, Stderr> {
    /// Prompt on the process terminal; interactive only when stdin and stdout are TTYs.
    pub fn stdio(palette: Palette) -> Self {
        let interactive = io::stdin().is_terminal() && io::stdout().is_terminal();
        TerminalPrompt::new(io::stdin().lock(), io::stderr(), interactive, palette)
    }
}

impl<R: BufRead, W: Write> TerminalPrompt<R, W> {
    pub fn new(input: R, output: W, interactive: bool, palette: Palette) -> Self {
        TerminalPrompt { input, output, interactive, palette }
    }

    /// The answer without its line terminator, `None` on end of input.
    fn ask(&mut self, label: &str) -> io::Result<Option<String>> {
        write!(self.output, "{label}: ")?;
        self.output.flush()?;

        let mut line = String::new();
        match self.input.read_line(&mut line)? {
            0 => {
                writeln!(self.output)?;
                Ok(None)
            }
            _ => Ok(Some(line.trim_end_matches(['\r', '\n']).to_string())),
        }
    }
}

impl<R: BufRead, W: Write> Prompt for TerminalPrompt<R, W> {
    fn is_interactive(&self) -> bool {
        self.interactive
    }

    fn show(&mut self, message: &str) {
        let mut lines = message.lines();
        let heading = lines.next().unwrap_or_default();
        let mut text = format!("\n{}\n", self.palette.warning(heading));
        for line in lines {
            text.push_str(line);
            text.push('\n');
        }

        if let Err(e) = writeln!(self.output, "{text}") {
            tracing::debug!("Failed to write prompt text: {e}");
        }
    }

    fn confirm(&mut self, question: &str) -> io::Result<bool> {
        let answer = self.ask(&format!("{question} [y/N]"))?;
        Ok(answer.is_some_and(|a| is_yes(&a)))
    }

    fn read_line(&mut self, label: &str) -> io::Result<String> {
        Ok(self.ask(label)?.unwrap_or_default())
    }
}
