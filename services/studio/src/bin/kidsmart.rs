//! services/studio/src/bin/kidsmart.rs

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::{Parser, Subcommand, ValueEnum};
use kidsmart_core::orchestrator::{DEFAULT_FLASHCARDS, DEFAULT_STORY_PAGES};
use kidsmart_core::{CardViewer, ImageRef, LinkKind, PageOutcome, Rejection, ScriptOutcome, TeacherTool};
use studio_lib::{config::Config, error::StudioError, export::export_story, state::AppState};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "kidsmart", version, about = "Picture stories, flashcards and lesson plans for preschool classes")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Write a story script, then draw its pages one by one
    Story {
        topic: String,
        /// Number of pages (3 to 10)
        #[arg(long, default_value_t = DEFAULT_STORY_PAGES)]
        pages: usize,
        /// Save the story to the library before drawing so every page is checkpointed
        #[arg(long)]
        save: bool,
        /// Write the snapshot and inline page images to this directory
        #[arg(long)]
        export: Option<PathBuf>,
    },
    /// Create a flashcard set, drawing one card at a time
    Flashcards {
        topic: String,
        /// Number of cards (1 to 20)
        #[arg(long, default_value_t = DEFAULT_FLASHCARDS)]
        count: usize,
        /// Save the finished set to the library
        #[arg(long)]
        save: bool,
    },
    /// Write a lesson plan
    Lesson {
        topic: String,
        /// Print without markdown markers
        #[arg(long)]
        plain: bool,
    },
    /// Saved stories and flashcard sets
    Library {
        #[command(subcommand)]
        command: LibraryCommands,
    },
    /// Kid zone story and game bookmarks
    Links {
        #[arg(value_enum)]
        shelf: Shelf,
        #[command(subcommand)]
        command: LinkCommands,
    },
}

#[derive(Subcommand)]
enum LibraryCommands {
    /// List saved stories (built-in templates included)
    Stories,
    /// List saved flashcard sets
    Sets,
    /// Read a saved story page aloud
    Read {
        story_id: String,
        /// One-based page number
        #[arg(long, default_value_t = 1)]
        page: usize,
    },
    /// Walk through the cards of a saved set starting at a card
    Cards {
        set_id: String,
        /// One-based card number
        #[arg(long, default_value_t = 1)]
        from: usize,
    },
    /// Export a saved story to a directory
    Export { story_id: String, dir: PathBuf },
    DeleteStory { story_id: String },
    DeleteSet { set_id: String },
}

#[derive(Subcommand)]
enum LinkCommands {
    List,
    Add { title: String, url: String },
    Delete { id: String },
}

#[derive(Clone, Copy, ValueEnum)]
enum Shelf {
    Story,
    Game,
}

impl From<Shelf> for LinkKind {
    fn from(shelf: Shelf) -> Self {
        match shelf {
            Shelf::Story => LinkKind::Story,
            Shelf::Game => LinkKind::Game,
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), StudioError> {
    let cli = Cli::parse();

    // --- 1. Load Configuration & Set Up Logging ---
    let config = Arc::new(Config::from_env()?);
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(config.log_level.to_string()))
        .with(tracing_subscriber::fmt::layer())
        .init();
    info!(data_dir = %config.data_dir.display(), "configuration loaded");

    // --- 2. Wire Adapters and Workflows ---
    let state = AppState::build(config)?;

    // --- 3. Run the Command ---
    match cli.command {
        Commands::Story {
            topic,
            pages,
            save,
            export,
        } => run_story(&state, &topic, pages, save, export).await,
        Commands::Flashcards { topic, count, save } => run_flashcards(&state, &topic, count, save).await,
        Commands::Lesson { topic, plain } => run_lesson(&state, &topic, plain).await,
        Commands::Library { command } => run_library(&state, command).await,
        Commands::Links { shelf, command } => run_links(&state, shelf.into(), command).await,
    }
}

//=========================================================================================
// Teacher tools
//=========================================================================================

async fn run_story(
    state: &AppState,
    topic: &str,
    pages: usize,
    save: bool,
    export: Option<PathBuf>,
) -> Result<(), StudioError> {
    state.open_tool(TeacherTool::StoryCreator);
    let story = match state.stories.request_script(topic, pages).await? {
        ScriptOutcome::Ready(story) => story,
        ScriptOutcome::EmptyTopic => {
            warn!("empty topic, nothing to write");
            return Ok(());
        }
        ScriptOutcome::Discarded => {
            warn!(topic, "story was reset while the script was being written");
            return Ok(());
        }
    };
    println!("📖 {}", story.title);
    if save {
        state.stories.save_story()?;
    }

    for (index, page) in story.pages.iter().enumerate() {
        println!("\n[{}/{}] {}", index + 1, story.pages.len(), page.narrative_text);
        match draw_page(state, index).await? {
            Some(image) => println!("    🖼  {}", image),
            None => {
                warn!(page = index + 1, "no image for this page, stopping");
                break;
            }
        }
    }

    if let (Some(dir), Some(story)) = (export, state.stories.story()) {
        for path in export_story(&story, &dir)? {
            println!("    → {}", path.display());
        }
    }
    state.back();
    Ok(())
}

/// Draws one page, sitting out any cooldown first.
async fn draw_page(state: &AppState, index: usize) -> Result<Option<ImageRef>, StudioError> {
    loop {
        match state.stories.generate_page_image(index).await? {
            PageOutcome::Attached(image) => return Ok(Some(image)),
            PageOutcome::Unavailable | PageOutcome::Discarded => return Ok(None),
            PageOutcome::Rejected(Rejection::CoolingDown { remaining_secs }) => {
                println!("    ⏳ chờ {}s...", remaining_secs);
                tokio::time::sleep(Duration::from_secs(remaining_secs)).await;
            }
            PageOutcome::Rejected(rejection) => {
                return Err(StudioError::Internal(format!(
                    "page {} refused: {:?}",
                    index + 1,
                    rejection
                )))
            }
        }
    }
}

async fn run_flashcards(state: &AppState, topic: &str, count: usize, save: bool) -> Result<(), StudioError> {
    state.open_tool(TeacherTool::FlashcardMaker);

    let mut progress = state.flashcards.subscribe();
    let printer = tokio::spawn(async move {
        while progress.changed().await.is_ok() {
            if let Some(line) = progress.borrow_and_update().status_text() {
                println!("  {}", line);
            }
        }
    });

    let report = state.flashcards.create(topic, count).await;
    printer.abort();
    let Some(report) = report? else {
        warn!("nothing generated (empty topic or another generation is running)");
        return Ok(());
    };

    println!("🃏 {} ({} thẻ)", report.topic, report.cards.len());
    for (index, card) in report.cards.iter().enumerate() {
        let english = card.foreign_term.as_deref().unwrap_or("-");
        let image = card
            .image_ref
            .as_ref()
            .map(|image| image.to_string())
            .unwrap_or_else(|| "(chưa có ảnh)".to_string());
        println!("  {:>2}. {} / {}  {}", index + 1, card.local_term, english, image);
    }
    if !report.missing_images.is_empty() {
        warn!(cards = ?report.missing_images, "some cards have no image");
    }

    if save && !report.interrupted {
        if let Some(set) = state.flashcards.save_current_set()? {
            println!("  saved as {}", set.id);
        }
    }
    state.back();
    Ok(())
}

async fn run_lesson(state: &AppState, topic: &str, plain: bool) -> Result<(), StudioError> {
    state.open_tool(TeacherTool::LessonPlanner);
    if let Some(plan) = state.lessons.create(topic).await? {
        let text = if plain {
            state.lessons.copy_text().unwrap_or_default()
        } else {
            plan.content
        };
        println!("{}", text);
    }
    state.back();
    Ok(())
}

//=========================================================================================
// Library
//=========================================================================================

async fn run_library(state: &AppState, command: LibraryCommands) -> Result<(), StudioError> {
    match command {
        LibraryCommands::Stories => {
            for story in state.stories.load_library()? {
                let drawn = story.pages.iter().filter(|p| p.has_image()).count();
                println!("{}  {}  ({}/{} trang có ảnh)", story.id, story.title, drawn, story.pages.len());
            }
        }
        LibraryCommands::Sets => {
            for set in state.flashcards.saved_sets()? {
                println!(
                    "{}  {}  {} thẻ  {}",
                    set.id,
                    set.topic,
                    set.cards.len(),
                    set.created_at.format("%d/%m/%Y")
                );
            }
        }
        LibraryCommands::Read { story_id, page } => {
            let story = find_story(state, &story_id)?;
            state.open_tool(TeacherTool::StoryCreator);
            state.stories.open_story(&story);
            let index = page.saturating_sub(1);
            if state.stories.toggle_page_speech(index)? {
                let wait = tokio::time::sleep(Duration::from_secs(120));
                tokio::pin!(wait);
                loop {
                    tokio::select! {
                        _ = &mut wait => break,
                        _ = tokio::signal::ctrl_c() => break,
                        _ = tokio::time::sleep(Duration::from_millis(200)) => {
                            if !state.stories.is_page_speaking(index) {
                                break;
                            }
                        }
                    }
                }
            }
            state.back();
        }
        LibraryCommands::Cards { set_id, from } => {
            let set = state
                .flashcards
                .saved_sets()?
                .into_iter()
                .find(|set| set.id == set_id)
                .ok_or_else(|| StudioError::Internal(format!("no flashcard set {}", set_id)))?;
            state.open_tool(TeacherTool::FlashcardMaker);
            state.flashcards.load_set(&set);

            let cards = state.flashcards.cards();
            let mut viewer = CardViewer::new(cards.len());
            if viewer.open(from.saturating_sub(1)) {
                for _ in 0..cards.len() {
                    if let Some(card) = viewer.selected().and_then(|i| cards.get(i)) {
                        println!("{}  {}", card.local_term, card.foreign_term.as_deref().unwrap_or(""));
                    }
                    viewer.next();
                }
                viewer.close();
            }
            state.back();
        }
        LibraryCommands::Export { story_id, dir } => {
            let story = find_story(state, &story_id)?;
            for path in export_story(&story, &dir)? {
                println!("{}", path.display());
            }
        }
        LibraryCommands::DeleteStory { story_id } => state.stories.delete_story(&story_id)?,
        LibraryCommands::DeleteSet { set_id } => state.flashcards.delete_set(&set_id)?,
    }
    Ok(())
}

fn find_story(state: &AppState, id: &str) -> Result<kidsmart_core::Story, StudioError> {
    state
        .stories
        .load_library()?
        .into_iter()
        .find(|story| story.id == id)
        .ok_or_else(|| StudioError::Internal(format!("no story {}", id)))
}

//=========================================================================================
// Kid zone
//=========================================================================================

async fn run_links(state: &AppState, kind: LinkKind, command: LinkCommands) -> Result<(), StudioError> {
    state.open_shelf(kind);
    let library = state.links(kind);
    library.load().await?;

    match command {
        LinkCommands::List => {
            for link in library.combined() {
                let origin = if link.originates_from_feed { "feed" } else { "local" };
                println!("{}  [{}] {}  {}", link.id, origin, link.title, link.url);
            }
        }
        LinkCommands::Add { title, url } => match library.add_local(&title, &url)? {
            Some(link) => println!("{}  {}", link.id, link.url),
            None => warn!("title and url are both required"),
        },
        LinkCommands::Delete { id } => {
            if !library.delete(&id)? {
                warn!(id, "not deleted: unknown id or a feed entry");
            }
        }
    }
    state.back();
    Ok(())
}
