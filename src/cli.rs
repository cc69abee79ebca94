use std::error::Error;
use std::path::PathBuf;
use std::time::Duration;

use atty::Stream;
use clap::{Parser, Subcommand, ValueEnum};
use serde_json::json;
use termimad::{FmtText, MadSkin, terminal_size};
use tracing_subscriber::EnvFilter;
use wordbook_rs::{
    Config, Dictionary, FetchOutcome, HistoryPolicy, SearchOutcome, WordEntry, WordListState,
};

#[derive(Parser, Debug)]
#[command(name = "wordbook-rs", about = "Browse and collect dictionary words", version)]
pub struct Cli {
    /// Emit JSON instead of human-readable tables.
    #[arg(long, global = true)]
    json: bool,

    /// Directory holding the persisted word lists.
    #[arg(long, global = true, default_value = "wordbook-data")]
    data_dir: PathBuf,

    /// Base URL of the dictionary lookup endpoint.
    #[arg(long, global = true)]
    lookup_url: Option<String>,

    /// URL of the JSON document whose keys form the word corpus.
    #[arg(long, global = true)]
    corpus_url: Option<String>,

    /// Base URL of the per-user document service.
    #[arg(long, global = true)]
    documents_url: Option<String>,

    /// Words per page.
    #[arg(long, global = true, default_value_t = wordbook_rs::DEFAULT_PAGE_SIZE)]
    page_size: usize,

    /// Concurrent definition lookups per batch.
    #[arg(long, global = true, default_value_t = wordbook_rs::DEFAULT_BATCH_SIZE)]
    batch_size: usize,

    /// Timeout for every outgoing request, in seconds.
    #[arg(long, global = true, default_value_t = 10)]
    timeout_secs: u64,

    /// How repeated visits are recorded in history.
    #[arg(long, global = true, value_enum, default_value_t = HistoryPolicyArg::MostRecentFirst)]
    history_policy: HistoryPolicyArg,

    /// Act as this signed-in user; favorites and history go to the document service.
    #[arg(long, global = true)]
    user: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum HistoryPolicyArg {
    MostRecentFirst,
    RejectDuplicates,
}

impl From<HistoryPolicyArg> for HistoryPolicy {
    fn from(value: HistoryPolicyArg) -> Self {
        match value {
            HistoryPolicyArg::MostRecentFirst => HistoryPolicy::MostRecentFirst,
            HistoryPolicyArg::RejectDuplicates => HistoryPolicy::RejectDuplicates,
        }
    }
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Operations on the merged word list.
    #[command(subcommand)]
    Words(WordsCommand),
    /// Show the full definition of a word and record it in history.
    Define {
        /// Word to look up.
        word: String,
    },
    /// Look a word up and add it to your word list when it exists.
    Search {
        /// Word to search for.
        word: String,
    },
    /// Manage favorite words.
    #[command(subcommand)]
    Favorites(FavoritesCommand),
    /// Manage visit history.
    #[command(subcommand)]
    History(HistoryCommand),
    /// Serve the JSON API over HTTP.
    #[cfg(feature = "web")]
    Serve {
        /// Socket address to bind.
        #[arg(long, default_value = "127.0.0.1:8080")]
        addr: std::net::SocketAddr,
        /// Public base URL reported in logs.
        #[arg(long, default_value = "http://127.0.0.1:8080")]
        base_url: String,
    },
}

#[derive(Subcommand, Debug)]
enum WordsCommand {
    /// Fetch one page of words with their definitions.
    Page {
        /// Zero-based page index.
        page: usize,
    },
    /// Fetch every word at once.
    All {
        /// List merged word names without looking up definitions.
        #[arg(long)]
        names_only: bool,
    },
}

#[derive(Subcommand, Debug)]
enum FavoritesCommand {
    /// List favorites.
    List,
    /// Add a favorite.
    Add { word: String },
    /// Remove a favorite.
    Remove { word: String },
    /// Add the word if missing, remove it otherwise.
    Toggle { word: String },
}

#[derive(Subcommand, Debug)]
enum HistoryCommand {
    /// List visited words, newest first.
    List,
    /// Record a visit.
    Add { word: String },
    /// Forget every visit.
    Clear,
}

impl Cli {
    fn config(&self) -> Config {
        let mut config = Config::default()
            .with_data_dir(self.data_dir.clone())
            .with_page_size(self.page_size)
            .with_batch_size(self.batch_size)
            .with_request_timeout(Duration::from_secs(self.timeout_secs.max(1)))
            .with_history_policy(self.history_policy.into())
            .with_remote_documents_url(self.documents_url.clone());
        if let Some(url) = &self.lookup_url {
            config = config.with_lookup_base_url(url.clone());
        }
        if let Some(url) = &self.corpus_url {
            config = config.with_corpus_url(url.clone());
        }
        config
    }
}

fn init_tracing() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("wordbook_rs=info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

pub fn run() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();
    init_tracing();
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;
    runtime.block_on(dispatch(cli))
}

async fn dispatch(cli: Cli) -> Result<(), Box<dyn Error>> {
    let config = cli.config();
    if serve_if_requested(&cli.command, &config).await? {
        return Ok(());
    }

    let dictionary = Dictionary::from_config(&config)?;
    if let Some(user) = &cli.user {
        dictionary.sign_in(user.clone());
    }
    dictionary.restore().await;

    match cli.command {
        Command::Words(WordsCommand::Page { page }) => handle_page(&dictionary, page, cli.json).await,
        Command::Words(WordsCommand::All { names_only }) => {
            handle_all(&dictionary, names_only, cli.json).await
        }
        Command::Define { word } => handle_define(&dictionary, &word, cli.json).await,
        Command::Search { word } => handle_search(&dictionary, &word, cli.json).await,
        Command::Favorites(command) => handle_favorites(&dictionary, command, cli.json).await,
        Command::History(command) => handle_history(&dictionary, command, cli.json).await,
        #[cfg(feature = "web")]
        Command::Serve { .. } => Ok(()),
    }
}

#[cfg(feature = "web")]
async fn serve_if_requested(command: &Command, config: &Config) -> Result<bool, Box<dyn Error>> {
    let Command::Serve { addr, base_url } = command else {
        return Ok(false);
    };
    let web_config = wordbook_rs::web::WebConfig {
        addr: *addr,
        base_url: base_url.clone(),
    };
    wordbook_rs::web::serve(web_config, config).await?;
    Ok(true)
}

#[cfg(not(feature = "web"))]
async fn serve_if_requested(_command: &Command, _config: &Config) -> Result<bool, Box<dyn Error>> {
    Ok(false)
}

async fn handle_page(dictionary: &Dictionary, page: usize, as_json: bool) -> Result<(), Box<dyn Error>> {
    let outcome = dictionary.words().fetch(Some(page)).await?;
    let state = dictionary.store().word_list();
    if as_json {
        let payload = json!({ "page": page, "outcome": outcome, "words": state.words });
        println!("{}", serde_json::to_string_pretty(&payload)?);
        return Ok(());
    }
    match outcome {
        FetchOutcome::NoMoreData => println!("Page {page} is past the end of the word list."),
        _ => print_entry_table(&format!("Page {page}"), &state),
    }
    Ok(())
}

async fn handle_all(
    dictionary: &Dictionary,
    names_only: bool,
    as_json: bool,
) -> Result<(), Box<dyn Error>> {
    if names_only {
        let words = dictionary.words().merged_words().await?;
        if as_json {
            println!("{}", serde_json::to_string_pretty(&words)?);
        } else {
            for word in &words {
                println!("{word}");
            }
        }
        return Ok(());
    }
    dictionary.words().fetch(None).await?;
    let state = dictionary.store().word_list();
    if as_json {
        println!("{}", serde_json::to_string_pretty(&state.words)?);
    } else {
        print_entry_table("All words", &state);
    }
    Ok(())
}

async fn handle_define(dictionary: &Dictionary, word: &str, as_json: bool) -> Result<(), Box<dyn Error>> {
    let entries = dictionary
        .define(word)
        .await
        .ok_or_else(|| format!("No definitions found for {word:?}"))?;
    if as_json {
        println!("{}", serde_json::to_string_pretty(&entries)?);
    } else {
        for entry in &entries {
            render_markdown_block(&entry.word, &entry_markdown(entry));
        }
    }
    Ok(())
}

async fn handle_search(dictionary: &Dictionary, word: &str, as_json: bool) -> Result<(), Box<dyn Error>> {
    let outcome = dictionary.search(word).await;
    if as_json {
        println!("{}", serde_json::to_string_pretty(&outcome)?);
        return Ok(());
    }
    match outcome {
        SearchOutcome::Blank => return Err("Search term cannot be empty".into()),
        SearchOutcome::NotFound { word } => return Err(format!("Word {word:?} not found").into()),
        SearchOutcome::Added { entry } => println!("\"{}\" was added to your list.", entry.word),
        SearchOutcome::AlreadyKnown { entry } => {
            println!("\"{}\" is already in your list.", entry.word)
        }
    }
    Ok(())
}

async fn handle_favorites(
    dictionary: &Dictionary,
    command: FavoritesCommand,
    as_json: bool,
) -> Result<(), Box<dyn Error>> {
    let favorites = dictionary.favorites();
    let changed = match command {
        FavoritesCommand::List => None,
        FavoritesCommand::Add { word } => Some(favorites.add(&word).await),
        FavoritesCommand::Remove { word } => Some(favorites.remove(&word).await),
        FavoritesCommand::Toggle { word } => {
            favorites.toggle(&word).await;
            Some(true)
        }
    };
    print_word_list("Favorites", &favorites.list(), changed, as_json)
}

async fn handle_history(
    dictionary: &Dictionary,
    command: HistoryCommand,
    as_json: bool,
) -> Result<(), Box<dyn Error>> {
    let history = dictionary.history();
    let changed = match command {
        HistoryCommand::List => None,
        HistoryCommand::Add { word } => Some(history.add(&word).await),
        HistoryCommand::Clear => {
            history.clear().await;
            Some(true)
        }
    };
    print_word_list("History", &history.list(), changed, as_json)
}

fn print_word_list(
    title: &str,
    words: &[String],
    changed: Option<bool>,
    as_json: bool,
) -> Result<(), Box<dyn Error>> {
    if as_json {
        let payload = json!({ "words": words, "changed": changed });
        println!("{}", serde_json::to_string_pretty(&payload)?);
        return Ok(());
    }
    if changed == Some(false) {
        println!("(no change)");
    }
    if words.is_empty() {
        println!("{title}: none.");
        return Ok(());
    }
    println!("{title}:");
    for (idx, word) in words.iter().enumerate() {
        println!("{:>4}. {word}", idx + 1);
    }
    Ok(())
}

fn print_entry_table(title: &str, state: &WordListState) {
    if state.words.is_empty() {
        println!("{title}: no words.");
        return;
    }
    let width = state
        .words
        .iter()
        .map(|entry| entry.word.chars().count())
        .max()
        .unwrap_or(4)
        .max("WORD".len());
    println!("{title}:");
    println!("{:<width$}  {:<16}  {}", "WORD", "PHONETIC", "DEFINITION", width = width);
    println!("{:-<width$}  {:-<16}  {}", "", "", "----------", width = width);
    for entry in &state.words {
        let phonetic = entry.phonetic_text().unwrap_or("");
        let definition = entry
            .definitions()
            .next()
            .map(|d| snippet(d, 60))
            .unwrap_or_else(|| "<definition unavailable>".to_string());
        println!(
            "{:<width$}  {:<16}  {}",
            entry.word,
            phonetic,
            definition,
            width = width
        );
    }
}

fn entry_markdown(entry: &WordEntry) -> String {
    let mut text = String::new();
    if let Some(phonetic) = entry.phonetic_text() {
        text.push_str(&format!("*{phonetic}*\n\n"));
    }
    for meaning in &entry.meanings {
        let label = meaning.part_of_speech.as_deref().unwrap_or("unknown");
        text.push_str(&format!("**{label}**\n\n"));
        for definition in &meaning.definitions {
            text.push_str(&format!("* {}\n", definition.definition));
            if let Some(example) = &definition.example {
                text.push_str(&format!("  > {example}\n"));
            }
        }
        if !meaning.synonyms.is_empty() {
            text.push_str(&format!("\nSynonyms: {}\n", meaning.synonyms.join(", ")));
        }
        text.push('\n');
    }
    if let Some(audio) = entry.first_audio() {
        text.push_str(&format!("Audio: {audio}\n"));
    }
    text
}

fn snippet(text: &str, max_chars: usize) -> String {
    let mut out: String = text.chars().take(max_chars).collect();
    if text.chars().count() > max_chars {
        out.push('…');
    }
    out
}

fn stdout_is_tty() -> bool {
    atty::is(Stream::Stdout)
}

fn markdown_width() -> usize {
    let (width, _) = terminal_size();
    width.max(60) as usize
}

fn render_markdown_block(title: &str, body: &str) {
    let trimmed = body.trim();
    if trimmed.is_empty() {
        return;
    }
    println!("\n{title}:");
    if stdout_is_tty() {
        let skin = MadSkin::default();
        let formatted = FmtText::from(&skin, trimmed, Some(markdown_width()));
        println!("{formatted}");
    } else {
        println!("{trimmed}");
    }
}
