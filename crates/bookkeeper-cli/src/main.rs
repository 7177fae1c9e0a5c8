//! Bookkeeper command-line front end.
//!
//! Provides the `bookkeeper` binary with subcommands for managing expense
//! categories and expenses stored in a single SQLite file. The database
//! path comes from `--db` or the `BOOKKEEPER_DB` environment variable
//! (default: "bookkeeper.db"). Log verbosity follows `RUST_LOG`
//! (default: warn); logs go to stderr so stdout stays machine-readable.

use std::process;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use bookkeeper_core::{Category, Expense, Filter, Pk};
use bookkeeper_storage::{
    category_tree, delete_category, OpenMode, Repository, SqliteRepository, StorageError,
};

/// Personal finance tracker.
#[derive(Parser)]
#[command(name = "bookkeeper", about = "Personal finance tracker")]
struct Cli {
    /// Path to the database file.
    #[arg(long, env = "BOOKKEEPER_DB", default_value = "bookkeeper.db", global = true)]
    db: String,

    #[command(subcommand)]
    command: Commands,
}

/// Available subcommands.
#[derive(Subcommand)]
enum Commands {
    /// Manage expense categories.
    #[command(subcommand)]
    Category(CategoryCommand),

    /// Manage expenses.
    #[command(subcommand)]
    Expense(ExpenseCommand),

    /// Drop and recreate every table, discarding all data.
    Reset,
}

#[derive(Subcommand)]
enum CategoryCommand {
    /// Add a category.
    Add {
        name: String,

        /// Parent category key (omit for a top-level category).
        #[arg(short, long)]
        parent: Option<i64>,
    },

    /// List categories as JSON.
    List {
        /// Only list direct children of this category.
        #[arg(short, long)]
        parent: Option<i64>,
    },

    /// Rename a category.
    Rename { pk: i64, name: String },

    /// Delete a category; its subcategories move up to its parent.
    ///
    /// Expenses filed under the category keep its key and no longer show
    /// up under any category. Move or delete them first.
    Delete { pk: i64 },

    /// Print the category hierarchy.
    Tree,
}

#[derive(Subcommand)]
enum ExpenseCommand {
    /// Record an expense.
    Add {
        /// Amount in minor currency units.
        #[arg(short, long)]
        amount: i64,

        /// Category key; the category must exist.
        #[arg(short, long)]
        category: i64,

        /// Expense date, e.g. 2024-03-01.
        #[arg(short, long)]
        date: String,

        #[arg(long, default_value = "")]
        comment: String,
    },

    /// List expenses as JSON.
    List {
        /// Only list expenses in this category.
        #[arg(short, long)]
        category: Option<i64>,
    },

    /// Delete an expense.
    Delete { pk: i64 },
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let exit_code = match run(&cli.db, cli.command) {
        Ok(()) => 0,
        Err(e) => {
            eprintln!("Error: {}", e);
            exit_code(&e)
        }
    };
    process::exit(exit_code);
}

/// Maps an error to the process exit code.
///
/// 1 = contract or data error, 2 = missing record, 3 = storage error.
fn exit_code(err: &StorageError) -> i32 {
    match err {
        StorageError::NotFound { .. } => 2,
        StorageError::Sqlite(_) => 3,
        StorageError::InvalidState { .. }
        | StorageError::Integrity { .. }
        | StorageError::Core(_) => 1,
    }
}

fn run(db: &str, command: Commands) -> Result<(), StorageError> {
    tracing::debug!("using database {}", db);
    match command {
        Commands::Category(cmd) => {
            let mut repo = SqliteRepository::<Category>::new(db, OpenMode::Preserve)?;
            run_category(&mut repo, cmd)
        }
        Commands::Expense(cmd) => {
            let categories = SqliteRepository::<Category>::new(db, OpenMode::Preserve)?;
            let mut expenses = SqliteRepository::<Expense>::new(db, OpenMode::Preserve)?;
            run_expense(&categories, &mut expenses, cmd)
        }
        Commands::Reset => {
            SqliteRepository::<Category>::new(db, OpenMode::Reset)?;
            SqliteRepository::<Expense>::new(db, OpenMode::Reset)?;
            println!("reset {}", db);
            Ok(())
        }
    }
}

fn run_category(
    repo: &mut impl Repository<Category>,
    cmd: CategoryCommand,
) -> Result<(), StorageError> {
    match cmd {
        CategoryCommand::Add { name, parent } => {
            let parent = parent.map(Pk);
            if let Some(pk) = parent {
                require(repo.get(pk)?, "Category", pk)?;
            }
            let mut category = Category::new(name, parent);
            let pk = repo.add(&mut category)?;
            println!("{}", pk);
        }
        CategoryCommand::List { parent } => {
            let filter = parent.map(|p| Filter::new().with("parent", Pk(p)));
            print_json(&repo.get_all(filter.as_ref())?)?;
        }
        CategoryCommand::Rename { pk, name } => {
            let mut category = require(repo.get(Pk(pk))?, "Category", Pk(pk))?;
            category.name = name;
            repo.update(&category)?;
        }
        CategoryCommand::Delete { pk } => {
            delete_category(repo, Pk(pk))?;
        }
        CategoryCommand::Tree => {
            print!("{}", category_tree(&*repo)?.render());
        }
    }
    Ok(())
}

fn run_expense(
    categories: &impl Repository<Category>,
    repo: &mut impl Repository<Expense>,
    cmd: ExpenseCommand,
) -> Result<(), StorageError> {
    match cmd {
        ExpenseCommand::Add {
            amount,
            category,
            date,
            comment,
        } => {
            let category = Pk(category);
            require(categories.get(category)?, "Category", category)?;
            let mut expense = Expense::new(amount, category, date).with_comment(comment);
            let pk = repo.add(&mut expense)?;
            println!("{}", pk);
        }
        ExpenseCommand::List { category } => {
            let filter = category.map(|c| Filter::new().with("category", Pk(c)));
            print_json(&repo.get_all(filter.as_ref())?)?;
        }
        ExpenseCommand::Delete { pk } => {
            repo.delete(Pk(pk))?;
        }
    }
    Ok(())
}

/// Turns an absent lookup into [`StorageError::NotFound`].
fn require<T>(found: Option<T>, table: &str, pk: Pk) -> Result<T, StorageError> {
    found.ok_or_else(|| StorageError::NotFound {
        table: table.to_string(),
        pk,
    })
}

/// Prints records as pretty JSON on stdout.
fn print_json<T: serde::Serialize>(records: &T) -> Result<(), StorageError> {
    let json = serde_json::to_string_pretty(records).map_err(|e| StorageError::Integrity {
        reason: format!("failed to serialize output: {}", e),
    })?;
    println!("{}", json);
    Ok(())
}
