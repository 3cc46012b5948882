//! Result reporting for the terminal.

use std::time::Duration;

use snipcheck_core::CompilationResult;

use crate::colors;

/// Print a human-readable report followed by a summary line.
pub fn print_report(results: &[CompilationResult], elapsed: Duration) {
    if results.is_empty() {
        println!(
            "{}No TypeScript code blocks found.{}",
            colors::YELLOW,
            colors::RESET
        );
        println!("Code blocks are fenced with ```ts or ```typescript");
        return;
    }

    for result in results {
        print_result(result);
    }

    let failed = results.iter().filter(|r| !r.is_success()).count();
    let (color, status) = if failed == 0 {
        (colors::GREEN, "Passed")
    } else {
        (colors::RED, "Failed")
    };

    println!("\n{}", "─".repeat(50));
    println!(
        "{}{}{} {} blocks, {} failed in {:.2}s",
        color,
        status,
        colors::RESET,
        results.len(),
        failed,
        elapsed.as_secs_f64()
    );
}

/// Print the results as a JSON array.
pub fn print_json(results: &[CompilationResult]) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(results)?);
    Ok(())
}

fn print_result(result: &CompilationResult) {
    let Some(error) = &result.error else {
        println!(
            "{}✓{} {} {}(line {}){}",
            colors::GREEN,
            colors::RESET,
            result.label(),
            colors::DIM,
            result.line,
            colors::RESET
        );
        return;
    };

    println!(
        "{}✗{} {}{}{} {}(line {}){}",
        colors::RED,
        colors::RESET,
        colors::BOLD,
        result.label(),
        colors::RESET,
        colors::DIM,
        result.line,
        colors::RESET
    );
    print_snippet(&result.snippet, &result.lines_with_errors);
    print!("{}", error.format_terminal());
}

/// Print the snippet with line numbers, marking the lines with errors.
fn print_snippet(snippet: &str, lines_with_errors: &[usize]) {
    for (i, line) in snippet.lines().enumerate() {
        let number = i + 1;
        if lines_with_errors.contains(&number) {
            println!("{}  > {:>3} | {}{}", colors::RED, number, line, colors::RESET);
        } else {
            println!("{}    {:>3} |{} {}", colors::DIM, number, colors::RESET, line);
        }
    }
}
