use owo_colors::OwoColorize;
use std::io::IsTerminal;

use crate::auth::PublicUser;
use crate::ranking::{Conversion, DistributionEntry, TableKey};

const ESTIMATE_NOTE: &str = "(estimate, no distribution table)";

/// Check if stdout is a TTY (for auto-detecting color support)
pub fn should_use_colors() -> bool {
    std::io::stdout().is_terminal()
}

/// Format a score without a trailing ".0" (694.0 -> "694", 722.5 -> "722.5")
pub fn format_score(score: f64) -> String {
    if score.fract() == 0.0 {
        format!("{:.0}", score)
    } else {
        format!("{}", score)
    }
}

/// One-line answer for a score-to-rank lookup
pub fn format_rank_result(
    score: f64,
    key: &TableKey,
    rank: &Conversion<u64>,
    use_colors: bool,
) -> String {
    let line = if use_colors {
        format!(
            "Score {} ({}) -> rank {}",
            format_score(score).bold(),
            key.to_string().cyan(),
            rank.value.green()
        )
    } else {
        format!("Score {} ({}) -> rank {}", format_score(score), key, rank.value)
    };
    with_estimate_note(line, rank.approximate, use_colors)
}

/// One-line answer for a rank-to-score lookup
pub fn format_score_result(
    rank: u64,
    key: &TableKey,
    score: &Conversion<f64>,
    use_colors: bool,
) -> String {
    let line = if use_colors {
        format!(
            "Rank {} ({}) -> score {}",
            rank.bold(),
            key.to_string().cyan(),
            format_score(score.value).green()
        )
    } else {
        format!(
            "Rank {} ({}) -> score {}",
            rank,
            key,
            format_score(score.value)
        )
    };
    with_estimate_note(line, score.approximate, use_colors)
}

fn with_estimate_note(line: String, approximate: bool, use_colors: bool) -> String {
    match (approximate, use_colors) {
        (false, _) => line,
        (true, true) => format!("{} {}", line, ESTIMATE_NOTE.yellow()),
        (true, false) => format!("{} {}", line, ESTIMATE_NOTE),
    }
}

/// Distribution rows as a right-aligned table, highest score first
pub fn format_range_table(entries: &[DistributionEntry], use_colors: bool) -> String {
    if entries.is_empty() {
        return "No distribution rows in range.".to_string();
    }

    let label_width = entries
        .iter()
        .map(|e| e.label.chars().count())
        .max()
        .unwrap_or(0)
        .max("Score".len());
    let num_width = entries
        .iter()
        .map(|e| e.num.to_string().len())
        .max()
        .unwrap_or(0)
        .max("Count".len());
    let acc_width = entries
        .iter()
        .map(|e| e.accumulate.to_string().len())
        .max()
        .unwrap_or(0)
        .max("Rank".len());

    let header = format!(
        "{:>label_width$}  {:>num_width$}  {:>acc_width$}",
        "Score", "Count", "Rank"
    );
    let header = if use_colors {
        header.bold().to_string()
    } else {
        header
    };

    let rows = entries.iter().rev().map(|e| {
        let label = format!("{:>label_width$}", e.label);
        let num = format!("{:>num_width$}", e.num);
        let acc = format!("{:>acc_width$}", e.accumulate);
        if use_colors {
            format!("{}  {}  {}", label.cyan(), num, acc.green())
        } else {
            format!("{}  {}  {}", label, num, acc)
        }
    });

    std::iter::once(header)
        .chain(rows)
        .collect::<Vec<_>>()
        .join("\n")
}

/// One "province subject" pair per line
pub fn format_datasets(keys: &[TableKey], use_colors: bool) -> String {
    if keys.is_empty() {
        return "No data files found.".to_string();
    }

    keys.iter()
        .map(|key| {
            if use_colors {
                format!("{} {}", key.province.cyan(), key.subject)
            } else {
                format!("{} {}", key.province, key.subject)
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn format_user(user: &PublicUser, use_colors: bool) -> String {
    if use_colors {
        format!(
            "{} <{}> ({})\n  id: {}",
            user.username.bold(),
            user.email.cyan(),
            user.name,
            user.id.dimmed()
        )
    } else {
        format!(
            "{} <{}> ({})\n  id: {}",
            user.username, user.email, user.name, user.id
        )
    }
}
