//! Operator prompts
//!
//! Line-oriented terminal prompts for the interview and the confirmation
//! gates. Prompts go to stderr so stdout stays clean for reports; answers are
//! read from stdin, which must be a terminal. Empty required answers are
//! fatal, matching the installer's two-tier error policy.

use std::io::{self, IsTerminal, Write};

use crate::error::PromptError;

fn read_answer(label: &str) -> Result<String, PromptError> {
    if !io::stdin().is_terminal() {
        return Err(PromptError::NotATerminal);
    }

    eprint!("{label}");
    io::stderr().flush()?;

    let mut input = String::new();
    io::stdin().read_line(&mut input)?;
    Ok(input.trim().to_string())
}

/// Prompt with a default used when the operator just presses enter
pub fn prompt_default(label: &str, default: &str) -> Result<String, PromptError> {
    let answer = read_answer(&format!("{label} [{default}]: "))?;
    if answer.is_empty() {
        Ok(default.to_string())
    } else {
        Ok(answer)
    }
}

/// Prompt for a value that must not be empty
pub fn prompt_required(field: &str, label: &str) -> Result<String, PromptError> {
    let answer = read_answer(&format!("{label}: "))?;
    if answer.is_empty() {
        return Err(PromptError::EmptyInput {
            field: field.to_string(),
        });
    }
    Ok(answer)
}

/// Prompt for one of a numbered list of choices; returns the chosen index
pub fn prompt_choice(field: &str, label: &str, choices: &[&str]) -> Result<usize, PromptError> {
    let menu: Vec<String> = choices
        .iter()
        .enumerate()
        .map(|(i, choice)| format!("{}) {choice}", i + 1))
        .collect();

    let answer = read_answer(&format!("{label} ({}): ", menu.join("  ")))?;
    let index: usize = answer.parse().map_err(|_| PromptError::InvalidChoice {
        field: field.to_string(),
        input: answer.clone(),
    })?;

    if index == 0 || index > choices.len() {
        return Err(PromptError::InvalidChoice {
            field: field.to_string(),
            input: answer,
        });
    }
    Ok(index - 1)
}

/// Yes/no confirmation; enter takes the default
pub fn confirm(label: &str, default_yes: bool) -> Result<bool, PromptError> {
    let hint = if default_yes { "Y/n" } else { "y/N" };
    let answer = read_answer(&format!("{label} [{hint}]: "))?.to_lowercase();

    Ok(match answer.as_str() {
        "" => default_yes,
        "y" | "yes" => true,
        _ => false,
    })
}

/// Free-form prompt, for the disk index
pub fn prompt_raw(label: &str) -> Result<String, PromptError> {
    read_answer(label)
}
