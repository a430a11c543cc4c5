//! Interactive questions asked on the terminal before a run.

use std::io::{self, BufRead, Write};

use anyhow::Result;

/// Ask a free-text question. `None` when the answer is blank or stdin closed.
pub fn ask(question: &str) -> Result<Option<String>> {
    let stdin = io::stdin();
    ask_with(&mut stdin.lock(), &mut io::stderr(), question)
}

/// Ask a yes/no question. Anything other than `y`/`yes` is a no.
pub fn confirm(question: &str) -> Result<bool> {
    let stdin = io::stdin();
    confirm_with(&mut stdin.lock(), &mut io::stderr(), question)
}

pub fn ask_with<R: BufRead, W: Write>(
    input: &mut R,
    output: &mut W,
    question: &str,
) -> Result<Option<String>> {
    write!(output, "{question}: ")?;
    output.flush()?;

    let mut line = String::new();
    if input.read_line(&mut line)? == 0 {
        return Ok(None);
    }
    let answer = line.trim_end_matches(['\r', '\n']);
    if answer.trim().is_empty() {
        Ok(None)
    } else {
        Ok(Some(answer.to_string()))
    }
}

pub fn confirm_with<R: BufRead, W: Write>(
    input: &mut R,
    output: &mut W,
    question: &str,
) -> Result<bool> {
    let answer = ask_with(input, output, &format!("{question} [y/N]"))?;
    Ok(matches!(
        answer.as_deref().map(|a| a.trim().to_ascii_lowercase()).as_deref(),
        Some("y") | Some("yes")
    ))
}

/// The warning shown before anything is deleted.
pub fn destructive_warning(query: &str, max_pages: u32) -> String {
    format!(
        "Are you sure you want to delete ALL events containing \"{query}\"?\n\n\
         This action cannot be undone. The tool will:\n\
         1. Search through up to {max_pages} pages of your calendar\n\
         2. Delete every event that contains this text\n\
         3. Continue until all matching events are removed\n"
    )
}
