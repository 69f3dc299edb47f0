use itertools::Itertools;
use pagedb::common::Result;
use pagedb::config::config::Settings;
use pagedb::sql::{Session, StatementResult};
use pagedb::storage::PagedEngine;
use pagedb::types::Field;
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;
use std::process::ExitCode;

fn main() -> ExitCode {
    let settings = match Settings::load() {
        Ok(settings) => settings,
        Err(err) => {
            eprintln!("pagedb: {err}");
            return ExitCode::FAILURE;
        }
    };
    let engine = match PagedEngine::open(settings) {
        Ok(engine) => engine,
        Err(err) => {
            eprintln!("pagedb: {err}");
            return ExitCode::FAILURE;
        }
    };
    let session = Session::new(&engine);

    // One-shot mode: `pagedb -e "<statement>"` exits non-zero on any parse
    // or execution error.
    let args: Vec<String> = std::env::args().collect();
    if args.len() >= 3 && args[1] == "-e" {
        let mut failed = false;
        for statement in &args[2..] {
            if let Err(err) = execute(&session, statement) {
                eprintln!("pagedb: {err}");
                failed = true;
                break;
            }
        }
        return if failed { ExitCode::FAILURE } else { ExitCode::SUCCESS };
    }

    repl(&engine, &session)
}

fn repl(engine: &PagedEngine, session: &Session) -> ExitCode {
    let mut editor = match DefaultEditor::new() {
        Ok(editor) => editor,
        Err(err) => {
            eprintln!("pagedb: {err}");
            return ExitCode::FAILURE;
        }
    };

    loop {
        match editor.readline("pagedb> ") {
            Ok(line) => {
                let command = line.trim();
                if command.is_empty() {
                    continue;
                }
                if command.eq_ignore_ascii_case("exit") || command.eq_ignore_ascii_case("quit") {
                    break;
                }
                let _ = editor.add_history_entry(command);
                if command.eq_ignore_ascii_case("status") {
                    print_status(engine);
                    continue;
                }
                execute(session, command).unwrap_or_else(|err| println!("oops, {err}"))
            }
            Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => break,
            Err(err) => {
                eprintln!("pagedb: {err}");
                return ExitCode::FAILURE;
            }
        }
    }
    ExitCode::SUCCESS
}

fn execute(session: &Session, command: &str) -> Result<()> {
    match session.execute(command)? {
        StatementResult::CreateDatabase { name, created } => match created {
            true => println!("[console] Created database '{name}'."),
            false => println!("[console] Database '{name}' already exists, skipped."),
        },
        StatementResult::UseDatabase { name } => println!("[console] Using database '{name}'."),
        StatementResult::CreateTable { name, created } => match created {
            true => println!("[console] Created table '{name}'."),
            false => println!("[console] Table '{name}' already exists, skipped."),
        },
        StatementResult::DropTable { name, existed } => match existed {
            true => println!("[console] Dropped table '{name}'."),
            false => println!("[console] Table '{name}' does not exist, skipped."),
        },
        StatementResult::AlterTable { table } => println!("[console] Altered table '{table}'."),
        StatementResult::Insert { count, .. } => println!("[console] Inserted {count} tuples."),
        StatementResult::Select { columns, rows } => {
            print_columns(&columns);
            print_rows(&rows);
        }
        StatementResult::Update { count } => println!("[console] Updated {count} tuples."),
        StatementResult::Delete { count } => println!("[console] Deleted {count} tuples."),
        StatementResult::Describe { schema } => println!("  {}", schema.to_string()),
        StatementResult::Vacuum { stats } => println!(
            "[console] Vacuumed: {} pages scanned, {} compacted, {} tuples removed.",
            stats.pages_scanned, stats.pages_compacted, stats.tuples_removed
        ),
    }
    Ok(())
}

fn print_status(engine: &PagedEngine) {
    match engine.status() {
        Ok(status) => println!(
            "  {} databases, {} tables, {} statements (p50 {}us, p99 {}us, max {}us)",
            status.databases,
            status.tables,
            status.statements,
            status.latency_p50_us,
            status.latency_p99_us,
            status.latency_max_us
        ),
        Err(err) => println!("oops, {err}"),
    }
}

fn print_columns(columns: &[String]) {
    println!("  [{}]", columns.iter().join(", "));
}

fn print_rows(rows: &[Vec<Field>]) {
    rows.iter()
        .for_each(|row| println!("  {}", row.iter().map(|field| field.to_string()).join(", ")));
}
