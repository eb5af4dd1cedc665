//! mvd-ledger: headless front-end for the internal-affairs ledger.
//!
//! Usage:
//!   mvd-ledger --db ledger.db show
//!   mvd-ledger --db ledger.db add license '{"holder":"Petrov","expiresDay":180}'
//!   mvd-ledger --db ledger.db day inc
//!   mvd-ledger --db ledger.db export --out ./backups
//!   mvd-ledger --db ledger.db --ipc-mode

use anyhow::{bail, Context, Result};
use mvd_ledger_core::{
    command::{CommandOutput, LedgerCommand},
    Accident, Action, Applied, Arrest, DurableStore, LedgerConfig, LedgerRecord, LedgerStats,
    LedgerStore, License, LoadOutcome, PersistStatus, RecordKind, Refresh, SqliteKv,
};
use std::env;
use std::io::{self, BufRead, Read, Write};
use std::path::Path;

/// Flags that consume the following argument.
const VALUE_FLAGS: [&str; 3] = ["--db", "--config", "--out"];

#[derive(serde::Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum IpcRequest {
    GetState,
    Command {
        #[serde(flatten)]
        command: LedgerCommand,
    },
    /// Raw snapshot text from a file picker or the backup box.
    Import {
        text: String,
    },
    Export,
    Quit,
}

#[derive(serde::Serialize)]
struct UiState<'a> {
    game_day: u64,
    stats: LedgerStats,
    actions: &'a [Action],
    licenses: &'a [License],
    accidents: &'a [Accident],
    arrests: &'a [Arrest],
}

#[derive(serde::Serialize)]
struct IpcReply<'a> {
    #[serde(flatten)]
    state: UiState<'a>,
    #[serde(skip_serializing_if = "Option::is_none")]
    refresh: Option<Refresh>,
    #[serde(skip_serializing_if = "Option::is_none")]
    output: Option<CommandOutput>,
    #[serde(skip_serializing_if = "Option::is_none")]
    warning: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    export: Option<ExportPayload>,
}

#[derive(serde::Serialize)]
struct ExportPayload {
    file_name: String,
    contents: String,
}

fn main() -> Result<()> {
    env_logger::init();

    let args: Vec<String> = env::args().collect();
    let db = flag_value(&args, "--db").unwrap_or("mvd_ledger.db");
    let config = LedgerConfig::load_or_default(flag_value(&args, "--config"))?;
    let ipc_mode = args.iter().any(|a| a == "--ipc-mode");

    let backend = if db == ":memory:" {
        SqliteKv::in_memory()?
    } else {
        SqliteKv::open(db).with_context(|| format!("Cannot open ledger database {db}"))?
    };
    let (mut store, outcome) = LedgerStore::initialize(backend, config);
    // Any write now would replace a ledger we never saw.
    if let LoadOutcome::Recovered {
        reason,
        persist: PersistStatus::Skipped,
    } = &outcome
    {
        log::error!("refusing to run on an unread ledger: {reason}");
        bail!("Cannot read the saved ledger in {db}: {reason}");
    }
    report_load(&outcome);

    if ipc_mode {
        return run_ipc_loop(&mut store);
    }

    let positional = positional_args(&args);
    run_command(&mut store, &positional, &args)
}

fn run_command<S: DurableStore>(
    store: &mut LedgerStore<S>,
    positional: &[&str],
    args: &[String],
) -> Result<()> {
    match positional {
        [] | ["show"] => print_state(store),
        ["add", kind, fields] => {
            let kind: RecordKind = kind.parse()?;
            let fields: serde_json::Value =
                serde_json::from_str(fields).context("Record fields must be JSON")?;
            let applied = store.add_record_json(kind, fields)?;
            println!("added {kind} {}", applied.value);
            report(&applied);
        }
        ["remove", kind, id] => {
            let kind: RecordKind = kind.parse()?;
            let applied = store.remove_record(kind, id);
            if applied.value {
                println!("removed {kind} {id}");
            } else {
                println!("no {kind} with id {id}");
            }
            report(&applied);
        }
        ["day", "inc"] => report_day(store.increment_game_day()),
        ["day", "dec"] => report_day(store.decrement_game_day()),
        ["day", "set", value] => report_day(store.set_game_day_input(value)),
        ["export"] => {
            let dir = flag_value(args, "--out").unwrap_or(".");
            let path = store
                .write_export(Path::new(dir), chrono::Utc::now().date_naive())
                .with_context(|| format!("Cannot export into {dir}"))?;
            println!("exported to {}", path.display());
        }
        ["import", path] => {
            let text = std::fs::read_to_string(path)
                .with_context(|| format!("Cannot read {path}"))?;
            let applied = store.import_json(&text)?;
            println!("imported {} records", store.stats().total());
            report(&applied);
        }
        ["backup"] => println!("{}", store.backup_text()?),
        ["restore"] => {
            let mut text = String::new();
            io::stdin().read_to_string(&mut text)?;
            let applied = store.import_json(&text)?;
            println!("restored {} records", store.stats().total());
            report(&applied);
        }
        ["reset"] => {
            if !args.iter().any(|a| a == "--confirm") {
                bail!("reset deletes every record; re-run with --confirm");
            }
            let applied = store.reset();
            println!("all data cleared");
            report(&applied);
        }
        other => {
            log::warn!("unknown command: {}", other.join(" "));
            bail!("Unknown command: {}", other.join(" "))
        }
    }
    Ok(())
}

fn run_ipc_loop<S: DurableStore>(store: &mut LedgerStore<S>) -> Result<()> {
    let stdin = io::stdin();
    let mut stdout = io::stdout();
    let mut handle = stdin.lock();
    let mut buffer = String::new();

    loop {
        buffer.clear();
        let bytes_read = handle.read_line(&mut buffer)?;
        if bytes_read == 0 {
            break; // EOF
        }
        if buffer.trim().is_empty() {
            continue;
        }

        let request: IpcRequest = match serde_json::from_str(&buffer) {
            Ok(r) => r,
            Err(e) => {
                log::warn!("ipc: unreadable request: {e}");
                let err_json = serde_json::json!({ "error": e.to_string() });
                writeln!(stdout, "{}", err_json)?;
                stdout.flush()?;
                continue;
            }
        };

        let mut refresh = None;
        let mut output = None;
        let mut warning = None;
        let mut error = None;
        let mut export = None;

        match request {
            IpcRequest::Quit => break,
            IpcRequest::GetState => {}
            IpcRequest::Command { command } => match store.apply(command) {
                Ok(applied) => {
                    warning = applied.warning().map(str::to_string);
                    refresh = Some(applied.refresh);
                    output = Some(applied.value);
                }
                Err(e) => {
                    log::warn!("ipc: command rejected: {e}");
                    error = Some(e.to_string())
                }
            },
            IpcRequest::Import { text } => match store.import_json(&text) {
                Ok(applied) => {
                    warning = applied.warning().map(str::to_string);
                    refresh = Some(applied.refresh);
                }
                Err(e) => {
                    log::warn!("ipc: import rejected: {e}");
                    error = Some(e.to_string())
                }
            },
            IpcRequest::Export => match store.export_file(chrono::Utc::now().date_naive()) {
                Ok(file) => {
                    export = Some(ExportPayload {
                        file_name: file.file_name,
                        contents: file.contents,
                    })
                }
                Err(e) => {
                    log::warn!("ipc: export failed: {e}");
                    error = Some(e.to_string())
                }
            },
        }

        let reply = IpcReply {
            state: ui_state(store),
            refresh,
            output,
            warning,
            error,
            export,
        };
        writeln!(stdout, "{}", serde_json::to_string(&reply)?)?;
        stdout.flush()?;
    }
    Ok(())
}

fn ui_state<S: DurableStore>(store: &LedgerStore<S>) -> UiState<'_> {
    UiState {
        game_day: store.current_game_day(),
        stats: store.stats(),
        actions: store.actions(),
        licenses: store.licenses(),
        accidents: store.accidents(),
        arrests: store.arrests(),
    }
}

fn print_state<S: DurableStore>(store: &LedgerStore<S>) {
    let day = store.current_game_day();
    let stats = store.stats();
    println!("=== MVD LEDGER ===");
    println!("  game day:   {day}");
    println!("  actions:    {}", stats.actions);
    println!("  licenses:   {}", stats.licenses);
    println!("  accidents:  {}", stats.accidents);
    println!("  arrests:    {}", stats.arrests);

    println!();
    println!("=== ACTIONS ===");
    for a in store.actions() {
        println!(
            "  {} | day {} | {} | {} | {}",
            a.id(),
            show_day(a.game_day()),
            show(a.officer()),
            show(a.article()),
            show(a.description())
        );
    }

    println!();
    println!("=== LICENSES ===");
    for l in store.licenses() {
        let status = if l.is_expired(day) { "EXPIRED" } else { "valid" };
        println!(
            "  {} | {} | cat {} | issued {} | expires {} | {status}",
            l.id(),
            show(l.holder()),
            show(l.category()),
            show_day(l.issued_day()),
            show_day(l.expires_day())
        );
    }

    println!();
    println!("=== ACCIDENTS ===");
    for a in store.accidents() {
        println!(
            "  {} | day {} | {} | {} | {}",
            a.id(),
            show_day(a.game_day()),
            show(a.location()),
            a.participants().join(", "),
            show(a.description())
        );
    }

    println!();
    println!("=== ARRESTS ===");
    for a in store.arrests() {
        println!(
            "  {} | day {} | {} | {} | {} days",
            a.id(),
            show_day(a.game_day()),
            show(a.suspect()),
            show(a.article()),
            show_day(a.term_days())
        );
    }
}

fn report_load(outcome: &LoadOutcome) {
    match outcome {
        LoadOutcome::Fresh { persist } | LoadOutcome::Recovered { persist, .. }
            if persist.is_failed() =>
        {
            eprintln!("warning: initial save failed: {persist:?}");
        }
        LoadOutcome::Recovered { reason, .. } => {
            eprintln!("warning: saved ledger was unreadable and has been reset ({reason})");
        }
        LoadOutcome::Restored { notes } if !notes.is_empty() => {
            eprintln!("warning: {} saved entries could not be read", notes.len());
        }
        _ => {}
    }
}

fn report<T>(applied: &Applied<T>) {
    if let Some(reason) = applied.warning() {
        eprintln!("warning: change kept in memory but not saved: {reason}");
    }
}

fn report_day(applied: Applied<u64>) {
    println!("game day: {}", applied.value);
    report(&applied);
}

fn show(field: Option<&str>) -> &str {
    field.unwrap_or("-")
}

fn show_day(day: Option<u64>) -> String {
    day.map(|d| d.to_string()).unwrap_or_else(|| "-".into())
}

fn flag_value<'a>(args: &'a [String], flag: &str) -> Option<&'a str> {
    args.windows(2)
        .find(|w| w[0] == flag)
        .map(|w| w[1].as_str())
}

fn positional_args(args: &[String]) -> Vec<&str> {
    let mut positional = Vec::new();
    let mut iter = args.iter().skip(1);
    while let Some(arg) = iter.next() {
        if VALUE_FLAGS.contains(&arg.as_str()) {
            iter.next();
        } else if !arg.starts_with("--") {
            positional.push(arg.as_str());
        }
    }
    positional
}
