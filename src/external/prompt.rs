//! Operator selection prompts
//!
//! Selections return indices into the item slice so callers can render items
//! however they like (names with commit times, commit one-liners) and map
//! the answer back without re-parsing display strings.

use std::io::{self, BufRead, Write};

#[cfg_attr(test, mockall::automock)]
pub trait Prompter: Send + Sync {
    /// Pick a single item; `None` when the operator selects nothing
    fn select_one(&self, items: &[String], prompt: &str) -> Option<usize>;

    /// Pick any number of items; `None` when the operator selects nothing
    fn select_many(&self, items: &[String], prompt: &str) -> Option<Vec<usize>>;

    /// Yes/no question; anything other than an answer starting with `y` is no
    fn confirm(&self, prompt: &str) -> bool;

    /// Free-form answer; `None` for an empty answer
    fn free_text(&self, prompt: &str) -> Option<String>;
}

/// Numbered-menu prompts on stdin/stdout
#[derive(Debug, Default)]
pub struct TerminalPrompter;

impl TerminalPrompter {
    pub fn new() -> Self {
        Self
    }

    fn ask(&self, prompt: &str) -> Option<String> {
        print!("{prompt}: ");
        if io::stdout().flush().is_err() {
            return None;
        }
        let mut input = String::new();
        match io::stdin().lock().read_line(&mut input) {
            Ok(0) => None,
            Ok(_) => {
                let answer = input.trim().to_string();
                (!answer.is_empty()).then_some(answer)
            }
            Err(e) => {
                tracing::warn!(error = %e, "failed to read operator input");
                None
            }
        }
    }

    fn show_menu(&self, items: &[String]) {
        println!();
        for (index, item) in items.iter().enumerate() {
            println!("  {:>3}) {}", index + 1, item);
        }
        println!();
    }
}

/// Parse `1 3 5-7` style answers into zero-based indices, keeping order and
/// dropping duplicates. Returns `None` if any token is out of range or bogus.
pub fn parse_selection(answer: &str, item_count: usize) -> Option<Vec<usize>> {
    let mut picked = Vec::new();
    for token in answer.split(|c: char| c == ',' || c.is_whitespace()) {
        if token.is_empty() {
            continue;
        }
        let (start, end) = match token.split_once('-') {
            Some((a, b)) => (a.parse::<usize>().ok()?, b.parse::<usize>().ok()?),
            None => {
                let n = token.parse::<usize>().ok()?;
                (n, n)
            }
        };
        if start == 0 || end < start || end > item_count {
            return None;
        }
        for n in start..=end {
            if !picked.contains(&(n - 1)) {
                picked.push(n - 1);
            }
        }
    }
    (!picked.is_empty()).then_some(picked)
}

impl Prompter for TerminalPrompter {
    fn select_one(&self, items: &[String], prompt: &str) -> Option<usize> {
        if items.is_empty() {
            return None;
        }
        self.show_menu(items);
        loop {
            let answer = self.ask(prompt)?;
            match parse_selection(&answer, items.len()) {
                Some(picked) if picked.len() == 1 => return Some(picked[0]),
                _ => println!("Enter a single number between 1 and {}", items.len()),
            }
        }
    }

    fn select_many(&self, items: &[String], prompt: &str) -> Option<Vec<usize>> {
        if items.is_empty() {
            return None;
        }
        self.show_menu(items);
        loop {
            let answer = self.ask(&format!("{prompt} (e.g. 1 3 5-7)"))?;
            match parse_selection(&answer, items.len()) {
                Some(picked) => return Some(picked),
                None => println!("Enter numbers between 1 and {}", items.len()),
            }
        }
    }

    fn confirm(&self, prompt: &str) -> bool {
        self.ask(&format!("{prompt} (y/n)"))
            .map(|answer| answer.to_lowercase().starts_with('y'))
            .unwrap_or(false)
    }

    fn free_text(&self, prompt: &str) -> Option<String> {
        self.ask(prompt)
    }
}
