use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;

use crate::application::Ledger;
use crate::domain::{
    format_amount, format_signed, round_to_cents, Expense, ExpenseDraft, RoommateShare, Shares,
};
use crate::storage::{FileStore, KeyValueStore};

/// Width in characters of a 100% bar in `summary`.
const BAR_WIDTH: usize = 30;

/// Roomsplit - shared expense ledger
#[derive(Parser)]
#[command(name = "roomsplit")]
#[command(about = "A local-first ledger for splitting shared expenses among roommates")]
#[command(version)]
pub struct Cli {
    /// Directory the ledger is stored in
    #[arg(long, env = "ROOMSPLIT_DATA_DIR", default_value = ".")]
    pub data_dir: PathBuf,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Record a shared expense
    Add {
        /// What the money was spent on
        description: String,

        /// Amount paid (e.g., "50.00" or "50"), rounded to cents
        #[arg(allow_hyphen_values = true)]
        amount: String,

        /// Who paid
        #[arg(short, long)]
        paid_by: String,

        /// Number of people sharing the expense
        #[arg(short, long, allow_hyphen_values = true)]
        split: String,
    },

    /// List recorded expenses
    List {
        /// Show in insertion order instead of newest first
        #[arg(long)]
        oldest_first: bool,
    },

    /// Show what each person paid, owes, and their balance
    Balances,

    /// Show totals and a bar per expense
    Summary,

    /// Delete every expense (cannot be undone)
    Clear {
        /// Confirm the deletion
        #[arg(long)]
        yes: bool,
    },

    /// Export data to CSV or JSON
    Export {
        /// What to export: expenses, balances, full
        export_type: String,

        /// Output file (stdout if omitted)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Format: csv, json (default: csv for expenses and balances, json for full)
        #[arg(short, long)]
        format: Option<String>,
    },
}

impl Cli {
    pub fn run(self) -> Result<()> {
        let store = FileStore::open(&self.data_dir).with_context(|| {
            format!("Failed to open data directory: {}", self.data_dir.display())
        })?;
        let mut ledger = Ledger::open(store);

        if let Some(err) = ledger.load_error() {
            eprintln!("Warning: stored expenses could not be read ({}); starting empty", err);
        }

        match self.command {
            Commands::Add {
                description,
                amount,
                paid_by,
                split,
            } => {
                let draft = ExpenseDraft::new(description, amount, paid_by, split);
                let expense = ledger.add_expense_from_input(&draft)?;

                println!(
                    "Expense added: {} {} paid by {}, {} per person ({})",
                    expense.description,
                    format_amount(expense.amount),
                    expense.paid_by,
                    format_amount(expense.amount_per_person),
                    expense.id
                );
                warn_unsaved(&ledger);
            }

            Commands::List { oldest_first } => run_list_command(&ledger, oldest_first),

            Commands::Balances => run_balances_command(&ledger),

            Commands::Summary => run_summary_command(&ledger),

            Commands::Clear { yes } => {
                println!("{}", run_clear_command(&mut ledger, yes)?);
                warn_unsaved(&ledger);
            }

            Commands::Export {
                export_type,
                output,
                format,
            } => run_export_command(&ledger, &export_type, output, format.as_deref())?,
        }

        Ok(())
    }
}

fn warn_unsaved<S: KeyValueStore>(ledger: &Ledger<S>) {
    if let Some(err) = ledger.last_save_error() {
        eprintln!("Warning: change not saved: {}", err);
    }
}

fn run_clear_command<S: KeyValueStore>(ledger: &mut Ledger<S>, yes: bool) -> Result<&'static str> {
    let count = ledger.expense_count();
    if count == 0 {
        return Ok("No expenses to clear");
    }
    if !yes {
        anyhow::bail!(
            "Refusing to clear {} expenses without --yes. This cannot be undone.",
            count
        );
    }
    ledger.clear_all();
    Ok("All expenses cleared")
}

fn run_list_command<S: KeyValueStore>(ledger: &Ledger<S>, oldest_first: bool) {
    if ledger.expense_count() == 0 {
        println!("No expenses added yet.");
        return;
    }

    println!(
        "{:<12} {:<24} {:>10} {:<15} {:>6} {:>11}",
        "DATE", "DESCRIPTION", "AMOUNT", "PAID BY", "SPLIT", "PER PERSON"
    );
    println!("{}", "-".repeat(83));

    let expenses: Box<dyn Iterator<Item = &Expense> + '_> = if oldest_first {
        Box::new(ledger.expenses().iter())
    } else {
        Box::new(ledger.expenses_newest_first())
    };

    for expense in expenses {
        println!(
            "{:<12} {:<24} {:>10} {:<15} {:>6} {:>11}",
            expense.date_added.format("%Y-%m-%d"),
            truncate(&expense.description, 24),
            format_amount(expense.amount),
            truncate(&expense.paid_by, 15),
            expense.split_among,
            format_amount(expense.amount_per_person)
        );
    }
}

fn run_balances_command<S: KeyValueStore>(ledger: &Ledger<S>) {
    let shares = ledger.shares();
    if shares.is_empty() {
        println!("No expenses added yet.");
        return;
    }

    println!("{:<20} {:>12} {:>12} {:>12}", "NAME", "PAID", "OWES", "BALANCE");
    println!("{}", "-".repeat(59));
    for share in shares.by_owes_desc() {
        println!("{}", balance_row(share));
    }

    if let Some(note) = unattributed_note(&shares) {
        println!();
        println!("{}", note);
    }
}

fn balance_row(share: &RoommateShare) -> String {
    format!(
        "{:<20} {:>12} {:>12} {:>12}",
        truncate(&share.name, 20),
        format_amount(share.paid),
        format_amount(share.owes),
        format_signed(share.balance)
    )
}

/// Only shown when at least a cent went unattributed; repeating thirds
/// leave residue far below that.
fn unattributed_note(shares: &Shares) -> Option<String> {
    let unattributed = round_to_cents(shares.unattributed());
    if unattributed.is_zero() {
        return None;
    }
    Some(format!(
        "Note: {} is not owed by anyone (split among more people than have paid so far).",
        format_amount(unattributed)
    ))
}

fn run_summary_command<S: KeyValueStore>(ledger: &Ledger<S>) {
    println!("Total expenses: {}", format_amount(ledger.total_amount()));
    println!("Expense count:  {}", ledger.expense_count());

    if ledger.expense_count() == 0 {
        return;
    }

    println!();
    for (expense, bar) in ledger.expenses().iter().zip(ledger.amount_bars()) {
        let filled = (bar.percent * Decimal::from(BAR_WIDTH) / Decimal::ONE_HUNDRED)
            .round()
            .to_usize()
            .unwrap_or(0)
            .min(BAR_WIDTH);
        println!(
            "{:<24} {:>10} {}",
            truncate(&expense.description, 24),
            format_amount(expense.amount),
            "#".repeat(filled)
        );
    }
}

fn run_export_command<S: KeyValueStore>(
    ledger: &Ledger<S>,
    export_type: &str,
    output: Option<PathBuf>,
    format: Option<&str>,
) -> Result<()> {
    use crate::io::Exporter;
    use std::fs::File;
    use std::io::{stdout, Write};

    let exporter = Exporter::new(ledger);

    let format = match (export_type, format) {
        (_, Some(f)) => f,
        ("full", None) => "json",
        (_, None) => "csv",
    };

    match (export_type, format) {
        ("expenses", "csv") | ("balances", "csv") | ("full", "json") => {}
        ("expenses" | "balances" | "full", _) => {
            anyhow::bail!(
                "Format '{}' not supported for '{}'. Use csv for expenses/balances, json for full",
                format,
                export_type
            );
        }
        _ => {
            anyhow::bail!(
                "Invalid export type '{}'. Valid types: expenses, balances, full",
                export_type
            );
        }
    }

    // Determine output writer
    let writer: Box<dyn Write> = match &output {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("Failed to create output file: {}", path.display()))?;
            Box::new(file)
        }
        None => Box::new(stdout()),
    };

    match export_type {
        "expenses" => {
            let count = exporter.export_expenses_csv(writer)?;
            if output.is_some() {
                eprintln!("Exported {} expenses", count);
            }
        }
        "balances" => {
            let count = exporter.export_balances_csv(writer)?;
            if output.is_some() {
                eprintln!("Exported {} balances", count);
            }
        }
        _ => {
            let snapshot = exporter.export_full_json(writer)?;
            if output.is_some() {
                eprintln!(
                    "Exported full ledger: {} expenses, {} balances",
                    snapshot.expenses.len(),
                    snapshot.balances.len()
                );
            }
        }
    }

    Ok(())
}

fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}
