//! Terminal helpers.

use std::io::Write;

/// Print `text` and redisplay the prompt after it
pub fn print_above_prompt(text: &str, prompt_label: &str) {
    print!("{}", text);
    redisplay_prompt(prompt_label);
}

/// Redisplay the prompt after receiving a message
pub fn redisplay_prompt(prompt_label: &str) {
    print!("{}> ", prompt_label);
    std::io::stdout().flush().ok();
}
