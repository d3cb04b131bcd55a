//! vocab - manage the saved vocabulary and look words up

use anyhow::{anyhow, Result};
use clap::{Parser, Subcommand};
use std::io::IsTerminal;

use lexicam::config::LexicamConfig;
use lexicam::detect::registry_from_settings;
use lexicam::dictionary::WordDetails;
use lexicam::session::{percent, ConfidenceBand};
use lexicam::{
    open_source, AliasTable, CycleOutcome, DetectionSession, DictionaryClient,
    SqliteKeyValueStore, Vocabulary,
};

#[path = "../ui.rs"]
mod ui;

#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// Path to the vocabulary database (overrides LEXICAM_DB_PATH / config).
    #[arg(long)]
    db_path: Option<String>,
    /// UI mode for stderr progress (auto|plain|pretty)
    #[arg(long, default_value = "auto", value_name = "MODE")]
    ui: String,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List saved words, oldest first.
    List,
    /// Save a word.
    Add { word: String },
    /// Remove a saved word by id.
    Remove { id: i64 },
    /// Look a word up in the dictionary.
    Lookup {
        word: String,
        /// Save the word after a successful lookup.
        #[arg(long)]
        save: bool,
    },
    /// Capture one frame, detect objects and print them.
    Detect {
        /// Save every detected category.
        #[arg(long)]
        save: bool,
    },
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let args = Args::parse();
    let is_tty = std::io::stderr().is_terminal();
    let stdout_is_tty = std::io::stdout().is_terminal();
    let ui = ui::Ui::from_args(Some(&args.ui), is_tty, !stdout_is_tty);

    let config = LexicamConfig::load()?;
    let db_path = args.db_path.unwrap_or_else(|| config.db_path.clone());

    let mut vocabulary = {
        let _stage = ui.stage("Open vocabulary");
        Vocabulary::load(SqliteKeyValueStore::open(&db_path)?)?
    };

    match args.command {
        Command::List => {
            if vocabulary.is_empty() {
                eprintln!("no saved words");
            }
            for entry in vocabulary.entries() {
                println!("{}\t{}\t{}", entry.id, entry.word, entry.added_at);
            }
        }
        Command::Add { word } => match vocabulary.add(&word)? {
            Some(entry) => println!("saved '{}' (id {})", entry.word, entry.id),
            None => println!("'{}' is already saved", word.trim()),
        },
        Command::Remove { id } => {
            if !vocabulary.remove(id)? {
                return Err(anyhow!("no saved word with id {}", id));
            }
            println!("removed {}", id);
        }
        Command::Lookup { word, save } => {
            let client = DictionaryClient::new(&config.dictionary_url)?;
            let details = {
                let mut stage = ui.stage("Dictionary lookup");
                let result = client.lookup(&word);
                if !matches!(result, Ok(Some(_))) {
                    stage.fail();
                }
                result?
            };
            let details = details.ok_or_else(|| anyhow!("word not found: {}", word.trim()))?;
            print_details(&details, vocabulary.contains(&details.word));
            if save {
                if let Some(entry) = vocabulary.add(&details.word)? {
                    println!("saved '{}' (id {})", entry.word, entry.id);
                }
            }
        }
        Command::Detect { save } => {
            let aliases = match &config.aliases_path {
                Some(path) => AliasTable::load(path)?,
                None => AliasTable::default_expansions(),
            };
            let backend = {
                let _stage = ui.stage("Load detector");
                registry_from_settings(
                    &config.detection,
                    config.source.width,
                    config.source.height,
                )?
                .default_backend()?
            };
            let mut source =
                open_source(&config.source.url, config.source.width, config.source.height)?;
            source.connect()?;

            let mut session = DetectionSession::new(Some(backend), config.postprocess, aliases);
            let outcome = {
                let _stage = ui.stage("Capture & detect");
                session.detect_once(source.as_mut())?
            };
            if outcome == CycleOutcome::FrameNotReady {
                return Err(anyhow!("frame source {} is not ready", config.source.url));
            }
            eprintln!("{}", session.status());
            for det in session.detections() {
                let b = det.bbox();
                println!(
                    "{}\t{}%\t{}\t{:.0},{:.0},{:.0},{:.0}",
                    det.display_label(),
                    percent(det.score()),
                    ConfidenceBand::from_score(det.score()).as_str(),
                    b.x,
                    b.y,
                    b.width,
                    b.height
                );
            }
            if save {
                for det in session.detections() {
                    if let Some(entry) = vocabulary.add(det.category())? {
                        eprintln!("saved '{}'", entry.word);
                    }
                }
            }
        }
    }
    Ok(())
}

fn print_details(details: &WordDetails, saved: bool) {
    let marker = if saved { " (saved)" } else { "" };
    println!("{}{}", details.word, marker);
    if let Some(text) = details.pronunciation().and_then(|p| p.text.as_deref()) {
        println!("  {}", text);
    }
    if let Some(audio) = details.pronunciation().and_then(|p| p.audio.as_deref()) {
        println!("  audio: {}", audio);
    }
    let parts = details.parts_of_speech();
    if !parts.is_empty() {
        println!("  [{}]", parts.join(", "));
    }
    if let Some(origin) = &details.origin {
        println!("  origin: {}", origin);
    }
    for meaning in &details.meanings {
        println!();
        println!("{}", meaning.part_of_speech.as_deref().unwrap_or("definition"));
        for (i, def) in meaning.definitions.iter().enumerate() {
            println!("  {}. {}", i + 1, def.definition);
            if let Some(example) = &def.example {
                println!("     \"{}\"", example);
            }
            let synonyms = def.top_synonyms();
            if !synonyms.is_empty() {
                println!("     synonyms: {}", synonyms.join(", "));
            }
        }
    }
}
