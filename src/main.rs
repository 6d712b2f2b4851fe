//! Promply CLI
//!
//! Manage the snippet store and expand snippets from the terminal.
//!
//! Usage:
//!   promply [OPTIONS] <COMMAND>
//!
//! Commands:
//!   list, search, show, add, delete, check, expand, insert, export, import, settings

use std::fs;
use std::io::{self, IsTerminal};
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use tracing::debug;
use tracing_subscriber::EnvFilter;

use promply::collect::{prompt_terminal, VariableForm};
use promply::host::memory::{MemoryElement, MemoryHost};
use promply::host::{EditableElement, Notice};
use promply::keys::KeyChord;
use promply::model::{group_by_folder, UNGROUPED_FOLDER};
use promply::palette::{Dispatch, PaletteController};
use promply::storage::{
    FileBackend, ImportOptions, LocalSettingsStore, LocalSnippetStore, SettingsStore, SnippetStore,
};
use promply::{
    AppContext, Config, FuzzyIndex, NewSnippet, SettingsPatch, Snippet, VariableDeclaration,
    VariableValues,
};

#[derive(Parser)]
#[command(name = "promply")]
#[command(about = "Prompt snippets with {{variables}}, inserted anywhere you type")]
struct Cli {
    /// Config file (TOML); defaults to the platform config directory
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Store file, overriding the configured one
    #[arg(short, long, global = true)]
    store: Option<PathBuf>,

    /// Debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// List snippets grouped by folder
    List {
        /// Only snippets in this folder
        #[arg(short, long)]
        folder: Option<String>,
    },
    /// Fuzzy search over title, body, tags and folder
    Search { query: String },
    /// Print one snippet
    Show { id: String },
    /// Add a snippet
    Add {
        #[arg(short, long)]
        title: String,
        #[arg(short, long)]
        body: String,
        #[arg(long = "tag")]
        tags: Vec<String>,
        #[arg(short, long)]
        folder: Option<String>,
        #[arg(long)]
        shortcut: Option<String>,
        /// Variable declaration: name[:default[:description]]
        #[arg(long = "var", value_parser = parse_declaration)]
        variables: Vec<VariableDeclaration>,
    },
    /// Delete a snippet
    Delete { id: String },
    /// Report undeclared placeholders and bad declarations
    Check { id: Option<String> },
    /// Fill in a snippet's variables and print the result
    Expand {
        /// Snippet id or title
        snippet: String,
        /// Variable value: name=value
        #[arg(long = "set", value_parser = parse_assignment)]
        values: Vec<(String, String)>,
        /// Use defaults for anything not given with --set
        #[arg(long)]
        no_prompt: bool,
    },
    /// Run the palette against a headless page and show what gets inserted
    Insert {
        /// Palette search query
        query: String,
        /// Position in the result list
        #[arg(long, default_value_t = 0)]
        pick: usize,
        /// Kind of element the palette is opened in
        #[arg(long, value_enum, default_value_t = TargetKind::Input)]
        target: TargetKind,
        /// Variable value: name=value
        #[arg(long = "set", value_parser = parse_assignment)]
        values: Vec<(String, String)>,
    },
    /// Write all snippets as an export document
    Export {
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Read an export document
    Import {
        file: PathBuf,
        /// Keep existing snippets and skip duplicate titles
        #[arg(long)]
        merge: bool,
    },
    /// Show or change settings
    Settings {
        /// Key chord that opens the palette, e.g. "/" or "ctrl+space"
        #[arg(long)]
        activator: Option<String>,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum TargetKind {
    Input,
    Textarea,
    Editable,
    Div,
}

struct Stores {
    snippets: Arc<LocalSnippetStore<FileBackend>>,
    settings: Arc<LocalSettingsStore<FileBackend>>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose)?;

    let mut config = Config::load(cli.config.as_deref()).context("failed to load config")?;
    if let Some(store) = cli.store {
        config = config.with_store_path(store);
    }
    debug!(store = %config.store_path.display(), "using store");

    let backend = Arc::new(FileBackend::new(config.store_path.clone()));
    let stores = Stores {
        snippets: Arc::new(LocalSnippetStore::new(Arc::clone(&backend))),
        settings: Arc::new(LocalSettingsStore::new(backend)),
    };

    match cli.command {
        Command::List { folder } => list(&stores, folder.as_deref()).await,
        Command::Search { query } => search(&stores, &config, &query).await,
        Command::Show { id } => show(&stores, &id).await,
        Command::Add {
            title,
            body,
            tags,
            folder,
            shortcut,
            variables,
        } => {
            let mut snippet = NewSnippet::new(title, body).with_tags(tags);
            snippet.folder = folder;
            snippet.shortcut = shortcut;
            snippet.variables = variables;
            add(&stores, snippet).await
        }
        Command::Delete { id } => {
            let snippet = find(&stores, &id).await?;
            stores.snippets.delete(&snippet.id).await?;
            println!("Deleted {} ({})", snippet.title, snippet.id);
            Ok(())
        }
        Command::Check { id } => check(&stores, id.as_deref()).await,
        Command::Expand {
            snippet,
            values,
            no_prompt,
        } => expand(&stores, &snippet, values, no_prompt).await,
        Command::Insert {
            query,
            pick,
            target,
            values,
        } => insert(stores, &config, &query, pick, target, values).await,
        Command::Export { output } => {
            let document = stores.snippets.export_all().await?;
            match output {
                Some(path) => {
                    fs::write(&path, document)
                        .with_context(|| format!("failed to write '{}'", path.display()))?;
                    eprintln!("Exported to {}", path.display());
                }
                None => println!("{}", document),
            }
            Ok(())
        }
        Command::Import { file, merge } => {
            let data = fs::read_to_string(&file)
                .with_context(|| format!("failed to read '{}'", file.display()))?;
            let options = ImportOptions { merge };
            let report = stores.snippets.import_all(&data, options).await?;
            for error in &report.errors {
                eprintln!("warning: {}", error);
            }
            if !report.success {
                bail!("import failed");
            }
            println!(
                "Imported {} snippet(s), skipped {}",
                report.imported_count, report.skipped_count
            );
            Ok(())
        }
        Command::Settings { activator } => {
            let settings = match activator {
                Some(key) => {
                    let chord = KeyChord::parse(&key)
                        .with_context(|| format!("invalid activator key '{}'", key))?;
                    debug!(%chord, "updating activator");
                    stores
                        .settings
                        .update_settings(SettingsPatch {
                            activator_key: Some(key),
                        })
                        .await?
                }
                None => stores.settings.get_settings().await?,
            };
            println!("activator_key = {:?}", settings.activator_key);
            Ok(())
        }
    }
}

fn init_tracing(verbose: bool) -> Result<()> {
    let directive = if verbose { "promply=debug" } else { "promply=info" };
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(directive)?,
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
    Ok(())
}

/// `name=value`
fn parse_assignment(s: &str) -> Result<(String, String), String> {
    match s.split_once('=') {
        Some((name, value)) if !name.trim().is_empty() => {
            Ok((name.trim().to_string(), value.to_string()))
        }
        _ => Err(format!("expected name=value, got '{}'", s)),
    }
}

/// `name[:default[:description]]`
fn parse_declaration(s: &str) -> Result<VariableDeclaration, String> {
    let mut parts = s.splitn(3, ':');
    let name = parts.next().unwrap_or_default().trim();
    if !VariableDeclaration::is_valid_name(name) {
        return Err(format!("'{}' is not a valid variable name", name));
    }
    let mut declaration = VariableDeclaration::new(name);
    if let Some(default) = parts.next().filter(|d| !d.is_empty()) {
        declaration = declaration.with_default(default);
    }
    if let Some(description) = parts.next().filter(|d| !d.is_empty()) {
        declaration = declaration.with_description(description);
    }
    Ok(declaration)
}

/// Look a snippet up by id, then by case-insensitive title
async fn find(stores: &Stores, key: &str) -> Result<Snippet> {
    let snippets = stores.snippets.get_all().await?;
    snippets
        .iter()
        .find(|s| s.id == key)
        .or_else(|| snippets.iter().find(|s| s.title.eq_ignore_ascii_case(key)))
        .cloned()
        .with_context(|| format!("no snippet with id or title '{}'", key))
}

fn print_entry(snippet: &Snippet) {
    let mut line = format!("  {}  {}", snippet.id, snippet.title);
    if let Some(shortcut) = &snippet.shortcut {
        line.push_str(&format!(" ({})", shortcut));
    }
    if !snippet.tags.is_empty() {
        line.push_str(&format!("  [{}]", snippet.tags.join(", ")));
    }
    println!("{}", line);
}

async fn list(stores: &Stores, folder: Option<&str>) -> Result<()> {
    let snippets = stores.snippets.get_all().await?;
    if snippets.is_empty() {
        println!("No snippets found");
        return Ok(());
    }
    for (label, group) in group_by_folder(&snippets) {
        if let Some(folder) = folder {
            if !label.eq_ignore_ascii_case(folder) {
                continue;
            }
        }
        println!("{}", label);
        for snippet in group {
            print_entry(snippet);
        }
    }
    Ok(())
}

async fn search(stores: &Stores, config: &Config, query: &str) -> Result<()> {
    let snippets = stores.snippets.get_all().await?;
    let hits = FuzzyIndex::new(&snippets, &config.search).search(query);
    if hits.is_empty() {
        println!("No matches found");
    }
    for hit in hits {
        let snippet = &snippets[hit.index];
        println!("{:.2}  {}  {}", hit.score, snippet.id, snippet.title);
    }
    Ok(())
}

async fn show(stores: &Stores, key: &str) -> Result<()> {
    let snippet = find(stores, key).await?;
    println!("{}", snippet.title);
    println!("id: {}", snippet.id);
    println!(
        "folder: {}",
        snippet.folder_label().unwrap_or(UNGROUPED_FOLDER)
    );
    if !snippet.tags.is_empty() {
        println!("tags: {}", snippet.tags.join(", "));
    }
    for var in snippet.resolved_variables() {
        let default = var.default_value.as_deref().unwrap_or("");
        match &var.description {
            Some(description) => println!("var {} = {:?}  # {}", var.name, default, description),
            None => println!("var {} = {:?}", var.name, default),
        }
    }
    println!();
    println!("{}", snippet.body);
    Ok(())
}

async fn add(stores: &Stores, snippet: NewSnippet) -> Result<()> {
    if snippet.title.trim().is_empty() || snippet.body.trim().is_empty() {
        bail!("title and body must not be empty");
    }
    let candidate = snippet.clone().with_id(String::new());
    let issues = candidate.check_declarations();
    if !issues.is_empty() {
        for issue in &issues {
            eprintln!("error: {}", issue);
        }
        bail!("invalid variable declarations");
    }
    let validation = candidate.validate();
    if !validation.valid {
        let color = io::stderr().is_terminal();
        eprint!("{}", validation.report(&candidate.body, &candidate.title, color));
    }
    let stored = stores.snippets.add(snippet).await?;
    println!("{}", stored.id);
    Ok(())
}

async fn check(stores: &Stores, key: Option<&str>) -> Result<()> {
    let snippets = match key {
        Some(key) => vec![find(stores, key).await?],
        None => stores.snippets.get_all().await?,
    };
    let color = io::stdout().is_terminal();
    let mut problems = 0;
    for snippet in &snippets {
        let issues = snippet.check_declarations();
        let validation = snippet.validate();
        if issues.is_empty() && validation.valid {
            continue;
        }
        problems += 1;
        for issue in issues {
            println!("{}: {}", snippet.title, issue);
        }
        print!("{}", validation.report(&snippet.body, &snippet.title, color));
    }
    if problems > 0 {
        bail!("{} of {} snippet(s) have problems", problems, snippets.len());
    }
    println!("{} snippet(s) ok", snippets.len());
    Ok(())
}

async fn expand(
    stores: &Stores,
    key: &str,
    values: Vec<(String, String)>,
    no_prompt: bool,
) -> Result<()> {
    let snippet = find(stores, key).await?;
    let variables = snippet.resolved_variables();
    if variables.is_empty() {
        println!("{}", snippet.body);
        return Ok(());
    }

    let mut form = VariableForm::open(&snippet.title, &variables)?;
    for (name, value) in values {
        if !form.set_value(&name, value) {
            eprintln!("warning: '{}' has no variable named '{}'", snippet.title, name);
        }
    }

    let values: VariableValues = if no_prompt {
        form.confirm()
    } else {
        match prompt_terminal(form, &mut io::stdin().lock(), &mut io::stderr())? {
            Some(values) => values,
            None => bail!("cancelled"),
        }
    };
    println!("{}", snippet.render(&values));
    Ok(())
}

async fn insert(
    stores: Stores,
    config: &Config,
    query: &str,
    pick: usize,
    target: TargetKind,
    values: Vec<(String, String)>,
) -> Result<()> {
    let ctx = AppContext::new(stores.snippets, stores.settings)
        .with_search(config.search.clone())
        .with_preview_length(config.preview_length);
    let host = MemoryHost::new();
    let mut palette = PaletteController::new(host.clone(), ctx);
    palette.context_mut().refresh_settings().await;

    let element = match target {
        TargetKind::Input => host.input(),
        TargetKind::Textarea => host.textarea(),
        TargetKind::Editable => host.content_editable(),
        TargetKind::Div => host.div(),
    };
    if !element.is_editable() {
        println!("Palette does not open in this element");
        return Ok(());
    }

    if palette.activate(element.clone()).await.is_err() {
        report_notices(&host);
        bail!("palette did not open");
    }
    palette.set_query(query);
    if let Some(view) = palette.view() {
        for (position, entry) in view.entries.iter().enumerate() {
            let marker = if position == pick { ">" } else { " " };
            println!("{} {}  {}", marker, entry.title, entry.preview);
        }
        if let Some(empty) = view.empty {
            println!("{}\n{}", empty.title(), empty.hint());
        }
    }

    let result = match palette.select_at(pick).await {
        None => {
            palette.close();
            return Ok(());
        }
        Some(Dispatch::Injected(result)) => result,
        Some(Dispatch::AwaitingVariables) => {
            if let Some(form) = palette.variable_form_mut() {
                for (name, value) in values {
                    form.set_value(&name, value);
                }
            }
            match palette.confirm_variables().await {
                Some(result) => result,
                None => bail!("variable form was not open"),
            }
        }
    };
    report_notices(&host);
    let outcome = result?;
    debug!(?outcome, "insert finished");
    print_element(&element, &host);
    Ok(())
}

fn report_notices(host: &MemoryHost) {
    for notice in host.notices() {
        match notice {
            Notice::Error(message) => eprintln!("error: {}", message),
            notice => eprintln!("{}: {}", notice.title(), notice.message()),
        }
    }
}

fn print_element(element: &MemoryElement, host: &MemoryHost) {
    let value = element.value();
    let text = if value.is_empty() {
        element.text_content()
    } else {
        value
    };
    if !text.is_empty() {
        println!("inserted: {}", text);
    } else if let Some(copied) = host.clipboard().last() {
        println!("clipboard: {}", copied);
    }
}
