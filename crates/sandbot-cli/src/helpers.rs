//! Console output — final answer, verbose details, errors.
//!
//! The answer goes to stdout; failures go to stderr.

use colored::Colorize;

use sandbot_core::types::UsageInfo;

/// Print the final answer to stdout.
pub fn print_response(answer: &str) {
    println!("{}", "Final response:".green().bold());
    if answer.is_empty() {
        println!("{}", "(no response)".dimmed());
    } else {
        println!("{answer}");
    }
}

/// Print the run's message when the iteration cap was hit.
pub fn print_unresolved(iterations: usize) {
    eprintln!("{}", unresolved_message(iterations).yellow().bold());
}

fn unresolved_message(iterations: usize) -> String {
    format!("Agent did not finish: no final answer after {iterations} iterations.")
}

/// Verbose: echo the user's prompt.
pub fn print_prompt(prompt: &str) {
    println!("{} {prompt}", "User prompt:".dimmed());
}

/// Verbose: token totals over the run.
pub fn print_usage(usage: &UsageInfo) {
    for line in usage_lines(usage) {
        println!("{}", line.dimmed());
    }
}

fn usage_lines(usage: &UsageInfo) -> [String; 2] {
    [
        format!("Prompt tokens: {}", usage.prompt_tokens),
        format!("Response tokens: {}", usage.completion_tokens),
    ]
}

/// Print a fatal error with its context chain.
pub fn print_error(err: &anyhow::Error) {
    eprintln!("{} {err:#}", "Error:".red().bold());
}
