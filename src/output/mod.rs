//! Terminal output for search results
//!
//! Uses colored for terminal colors; the keyword is emphasised inside each
//! context line.

use anyhow::Result;
use colored::*;

use crate::config::MatchCase;
use crate::counter::find_matches;
use crate::search::SearchHit;

/// Handles formatting and printing search results
pub struct ResultPrinter {
    keyword: String,
    json: bool,
}

impl ResultPrinter {
    pub fn new(keyword: &str, json: bool) -> Self {
        Self {
            keyword: keyword.to_string(),
            json,
        }
    }

    pub fn print_results(&self, results: &[SearchHit]) -> Result<()> {
        if self.json {
            println!("{}", serde_json::to_string_pretty(results)?);
            return Ok(());
        }

        if results.is_empty() {
            println!("\n{}", "No results found.".yellow());
            return Ok(());
        }

        println!(
            "\n{} {}",
            "Found".green().bold(),
            format!("{} matching documents:", results.len()).green()
        );
        println!();

        for (i, result) in results.iter().enumerate() {
            self.print_result(i + 1, result);
        }

        Ok(())
    }

    fn print_result(&self, index: usize, result: &SearchHit) {
        println!(
            "{} {} {} {}",
            format!("[{}]", index).cyan().bold(),
            result.relative_path.blue().bold(),
            "·".dimmed(),
            format!("{} occurrence(s)", result.count).dimmed()
        );

        if let Some(path) = &result.highlighted_path {
            println!("    {} {}", "highlighted:".dimmed(), path.magenta());
        }

        for context in &result.contexts {
            println!("    {} {}", "│".dimmed(), self.emphasise(context));
        }

        println!();
    }

    /// Context with every keyword occurrence in bold yellow
    fn emphasise(&self, context: &str) -> String {
        let mut out = String::with_capacity(context.len());
        let mut last = 0;

        for range in find_matches(context, &self.keyword, MatchCase::Insensitive) {
            out.push_str(&context[last..range.start]);
            out.push_str(&context[range.clone()].yellow().bold().to_string());
            last = range.end;
        }
        out.push_str(&context[last..]);

        out
    }
}
