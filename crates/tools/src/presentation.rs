//! Presentation authoring: a one-slide JSON deck on disk.
//!
//! Every capability here rewrites the deck file, so they are all
//! side effects and never offered as a final answer.

use async_trait::async_trait;
use cognitor_core::{
    BoundArguments, Capability, CapabilityError, CapabilityKind, CapabilityOutput, ParamSchema, ParamType,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::info;

/// Slide coordinates run from 1 to 8 inches.
const GRID: std::ops::RangeInclusive<i64> = 1..=8;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Shape {
    Rectangle { x1: i64, y1: i64, x2: i64, y2: i64 },
    Text { lines: Vec<String> },
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Slide {
    #[serde(default)]
    pub shapes: Vec<Shape>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Deck {
    #[serde(default)]
    pub open: bool,
    #[serde(default)]
    pub slides: Vec<Slide>,
}

/// Why a deck edit was refused.
#[derive(Debug, thiserror::Error)]
pub enum DeckError {
    #[error(transparent)]
    Args(#[from] CapabilityError),

    #[error("No presentation found; call open_presentation first")]
    NotOpened,

    #[error("presentation file is corrupted: {0}")]
    Corrupted(serde_json::Error),

    #[error("cannot {action}: {source}")]
    Io {
        action: &'static str,
        source: std::io::Error,
    },

    #[error("coordinates must be between 1 and 8")]
    OffGrid,

    #[error("x2 must exceed x1 and y2 must exceed y1")]
    Inverted,
}

/// The deck file plus a lock so edits never interleave.
pub struct DeckStore {
    path: PathBuf,
    lock: Mutex<()>,
}

impl DeckStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    async fn load(&self) -> Result<Deck, DeckError> {
        let raw = tokio::fs::read_to_string(&self.path)
            .await
            .map_err(|_| DeckError::NotOpened)?;
        serde_json::from_str(&raw).map_err(DeckError::Corrupted)
    }

    async fn store(&self, deck: &Deck) -> Result<(), DeckError> {
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent).await.map_err(|source| DeckError::Io {
                action: "create presentation directory",
                source,
            })?;
        }
        let raw = serde_json::to_string_pretty(deck).map_err(DeckError::Corrupted)?;
        tokio::fs::write(&self.path, raw).await.map_err(|source| DeckError::Io {
            action: "write presentation",
            source,
        })
    }

    /// Load, edit the first slide, save.
    async fn edit_first_slide(&self, edit: impl FnOnce(&mut Slide)) -> Result<(), DeckError> {
        let _guard = self.lock.lock().await;
        let mut deck = self.load().await?;
        if deck.slides.is_empty() {
            deck.slides.push(Slide::default());
        }
        edit(&mut deck.slides[0]);
        deck.open = true;
        self.store(&deck).await
    }
}

#[derive(Debug, Clone, Copy)]
enum Action {
    Open,
    DrawRectangle,
    AddText,
    Close,
}

pub struct PresentationCapability {
    action: Action,
    schema: ParamSchema,
    deck: Arc<DeckStore>,
}

impl PresentationCapability {
    fn new(action: Action, deck: Arc<DeckStore>) -> Self {
        let schema = match action {
            Action::Open | Action::Close => ParamSchema::new(),
            Action::DrawRectangle => ParamSchema::new()
                .optional("x1", ParamType::Integer, json!(1))
                .optional("y1", ParamType::Integer, json!(1))
                .optional("x2", ParamType::Integer, json!(8))
                .optional("y2", ParamType::Integer, json!(6)),
            Action::AddText => ParamSchema::new().param("text", ParamType::String),
        };
        Self { action, schema, deck }
    }

    /// All four deck capabilities over one shared file.
    pub fn all(deck: Arc<DeckStore>) -> Vec<Self> {
        [Action::Open, Action::DrawRectangle, Action::AddText, Action::Close]
            .into_iter()
            .map(|a| Self::new(a, deck.clone()))
            .collect()
    }

    async fn run(&self, args: &BoundArguments) -> Result<String, DeckError> {
        match self.action {
            Action::Open => {
                let _guard = self.deck.lock.lock().await;
                let deck = Deck {
                    open: true,
                    slides: vec![Slide::default()],
                };
                self.deck.store(&deck).await?;
                Ok("Presentation opened with a new blank slide".into())
            }
            Action::DrawRectangle => {
                let (x1, y1, x2, y2) = (args.i64("x1")?, args.i64("y1")?, args.i64("x2")?, args.i64("y2")?);
                if ![x1, y1, x2, y2].iter().all(|c| GRID.contains(c)) {
                    return Err(DeckError::OffGrid);
                }
                if x2 <= x1 || y2 <= y1 {
                    return Err(DeckError::Inverted);
                }
                self.deck
                    .edit_first_slide(|slide| {
                        slide.shapes.retain(|s| matches!(s, Shape::Text { .. }));
                        slide.shapes.push(Shape::Rectangle { x1, y1, x2, y2 });
                    })
                    .await?;
                Ok(format!("Rectangle drawn successfully from ({x1},{y1}) to ({x2},{y2})"))
            }
            Action::AddText => {
                let text = args.str("text")?;
                let lines: Vec<String> = text
                    .lines()
                    .map(str::trim)
                    .filter(|l| !l.is_empty())
                    .map(String::from)
                    .collect();
                self.deck
                    .edit_first_slide(|slide| slide.shapes.push(Shape::Text { lines }))
                    .await?;
                Ok(format!("Text added successfully: {text}"))
            }
            Action::Close => {
                let _guard = self.deck.lock.lock().await;
                let mut deck = self.deck.load().await?;
                deck.open = false;
                self.deck.store(&deck).await?;
                Ok("Presentation closed successfully".into())
            }
        }
    }
}

#[async_trait]
impl Capability for PresentationCapability {
    fn name(&self) -> &str {
        match self.action {
            Action::Open => "open_presentation",
            Action::DrawRectangle => "draw_rectangle",
            Action::AddText => "add_text",
            Action::Close => "close_presentation",
        }
    }

    fn description(&self) -> &str {
        match self.action {
            Action::Open => "Start a new presentation with one blank slide",
            Action::DrawRectangle => {
                "Draw a rectangle on the first slide; x1,y1,x2,y2 in 1..8 (defaults 1,1,8,6), x2>x1, y2>y1"
            }
            Action::AddText => "Add text (one paragraph per line) to the first slide",
            Action::Close => "Close the presentation",
        }
    }

    fn schema(&self) -> &ParamSchema {
        &self.schema
    }

    fn kind(&self) -> CapabilityKind {
        CapabilityKind::SideEffect
    }

    async fn execute(&self, args: BoundArguments) -> Result<CapabilityOutput, CapabilityError> {
        let message = match self.run(&args).await {
            Ok(message) => message,
            Err(DeckError::Args(e)) => return Err(e),
            Err(e) => return Err(CapabilityError::failed(self.name(), e.to_string())),
        };
        info!(capability = self.name(), "{message}");
        Ok(CapabilityOutput::text(message))
    }
}
