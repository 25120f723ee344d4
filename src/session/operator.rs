//! Operator console.
//!
//! The interactive session asks questions and shows results through
//! [`Operator`]; [`ConsoleOperator`] is the stdin/stdout implementation.

use async_trait::async_trait;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, Lines, Stdin};

use crate::error::Result;

/// The person driving an interactive session.
#[async_trait]
pub trait Operator: Send {
    /// Ask a question and wait for a single line answer, without the line ending.
    async fn ask(&mut self, prompt: &str) -> Result<String>;

    /// Show a line of output.
    fn show(&mut self, line: &str);
}

/// Operator on the process console.
pub struct ConsoleOperator {
    lines: Lines<BufReader<Stdin>>,
}

impl ConsoleOperator {
    /// Create an operator reading from stdin.
    pub fn new() -> Self {
        Self {
            lines: BufReader::new(tokio::io::stdin()).lines(),
        }
    }
}

impl Default for ConsoleOperator {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Operator for ConsoleOperator {
    async fn ask(&mut self, prompt: &str) -> Result<String> {
        let mut stdout = tokio::io::stdout();
        stdout.write_all(prompt.as_bytes()).await?;
        stdout.flush().await?;

        match self.lines.next_line().await? {
            Some(line) => Ok(line),
            None => Err(std::io::Error::new(
                std::io::ErrorKind::UnexpectedEof,
                "operator input closed",
            )
            .into()),
        }
    }

    fn show(&mut self, line: &str) {
        println!("{}", line);
    }
}
