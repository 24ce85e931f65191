use std::fmt;

use anyhow::Result;
use futures::channel::mpsc;
use futures::executor::block_on;
use futures::stream::{FuturesUnordered, StreamExt as _};
use gpui_plate_suggest::{
    DocumentQuery, MemoryDocument, OverlayController, OverlayKey, SelectionChange, SuggestConfig,
    TriggerKind,
};
use serde::Serialize;
use tracing::{debug, warn};

use crate::script::ScriptEvent;

/// A host editor loop: a document, the overlay controller, and the queue of
/// selection changes the document reports.
pub struct Session {
    doc: MemoryDocument,
    controller: OverlayController,
    changes: mpsc::UnboundedReceiver<SelectionChange>,
}

impl Session {
    pub fn new(config: SuggestConfig) -> Self {
        Self::with_document(config, MemoryDocument::default())
    }

    pub fn with_document(config: SuggestConfig, mut doc: MemoryDocument) -> Self {
        let (tx, changes) = mpsc::unbounded();
        doc.on_selection_change(Box::new(move |change| {
            let _ = tx.unbounded_send(*change);
        }));
        Self {
            doc,
            controller: OverlayController::with_default_sources(config),
            changes,
        }
    }

    pub fn document(&self) -> &MemoryDocument {
        &self.doc
    }

    pub fn controller(&self) -> &OverlayController {
        &self.controller
    }

    pub fn apply(&mut self, event: &ScriptEvent) -> Result<()> {
        match event {
            ScriptEvent::Type { text } => {
                for ch in text.chars() {
                    self.doc.type_text(ch.encode_utf8(&mut [0; 4]));
                    self.pump()?;
                }
                return Ok(());
            }
            ScriptEvent::Key { key, shift } => {
                let overlay_key = OverlayKey::from_key_name(key, *shift);
                if !self.controller.on_key_down(overlay_key, &mut self.doc) {
                    self.host_key(key);
                }
            }
            ScriptEvent::Split => self.doc.split_block(),
            ScriptEvent::Backspace => self.doc.backspace(),
            ScriptEvent::Click { index } => {
                if !self.controller.select(*index, &mut self.doc) {
                    warn!(index, "click did not hit an overlay item");
                }
            }
            ScriptEvent::MoveTo { position } => self.doc.set_cursor(*position),
        }
        self.pump()
    }

    /// Keys the overlay did not consume fall through to the editor.
    fn host_key(&mut self, key: &str) {
        let cursor = self.doc.cursor();
        match key {
            "Backspace" => self.doc.backspace(),
            "Enter" => self.doc.split_block(),
            "ArrowLeft" => self.doc.set_cursor(cursor.saturating_sub(1)),
            "ArrowRight" => self.doc.set_cursor(cursor + 1),
            _ => debug!(key, "key ignored"),
        }
    }

    /// Drains queued selection changes and settles every lookup they start.
    fn pump(&mut self) -> Result<()> {
        let mut in_flight = FuturesUnordered::new();
        while let Ok(Some(_change)) = self.changes.try_next() {
            if let Some(request) = self.controller.on_selection_change(&mut self.doc)? {
                in_flight.push(request.run());
            }
        }
        let controller = &mut self.controller;
        block_on(async {
            while let Some(response) = in_flight.next().await {
                controller.apply_response(response);
            }
        });
        Ok(())
    }

    pub fn snapshot(&self) -> Snapshot {
        let view = self.controller.view();
        let overlay = view.is_open().then(|| OverlaySnapshot {
            kind: view.kind,
            query: view.query.to_string(),
            items: view.items.iter().map(|c| c.label().to_string()).collect(),
            selected: view.selected_index,
            loading: view.is_loading(),
        });
        Snapshot {
            text: self.doc.text(),
            cursor: self.doc.cursor(),
            overlay,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Snapshot {
    pub text: String,
    pub cursor: usize,
    pub overlay: Option<OverlaySnapshot>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OverlaySnapshot {
    pub kind: TriggerKind,
    pub query: String,
    pub items: Vec<String>,
    pub selected: usize,
    pub loading: bool,
}

impl fmt::Display for Snapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "text: {:?} (cursor {})", self.text, self.cursor)?;
        let Some(overlay) = &self.overlay else {
            return Ok(());
        };
        writeln!(f, "overlay: {:?} query {:?}", overlay.kind, overlay.query)?;
        if overlay.loading {
            writeln!(f, "  Loading...")?;
        } else if overlay.items.is_empty() {
            writeln!(f, "  No results")?;
        }
        for (ix, label) in overlay.items.iter().enumerate() {
            let marker = if ix == overlay.selected { ">" } else { " " };
            writeln!(f, "  {marker} {label}")?;
        }
        Ok(())
    }
}
