//! In-memory calendar implementing `Page`, for driving the purge loop
//! without a browser. Time-dependent behaviour uses tokio's clock so tests
//! can run with `start_paused = true`.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use calendar_purge::config::{RunConfiguration, Timings};
use calendar_purge::{Descriptor, ElementHandle, HostError, Page};
use tokio::time::Instant;

const DELETE_HANDLE: &str = "delete";
const NEXT_HANDLE: &str = "next";
const DIALOG_HANDLE: &str = "dialog";
const OK_HANDLE: &str = "ok";
const BUSY_HANDLE: &str = "busy";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Kind {
    Event,
    Task,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Behaviour {
    /// Popup shows a delete button; deleting just removes the entry.
    Single,
    /// Deleting opens the recurrence dialog with `text`.
    Recurring { text: String, ok_button: bool },
    /// Popup never shows a delete button.
    NoDeleteControl,
    /// Popup never shows a delete button and the entry scrolls out of
    /// the match set once opened.
    NoDeleteControlVanishes,
    /// Delete button appears this long after the entry is opened.
    SlowDeleteControl(Duration),
    /// Like `Recurring`, but the dialog renders `delay` after the delete click.
    LateRecurring { text: String, delay: Duration },
}

#[derive(Debug, Clone)]
struct Dialog {
    text: String,
    ok_button: bool,
    visible_from: Instant,
}

#[derive(Debug, Clone)]
pub struct Entry {
    pub id: u32,
    pub label: String,
    pub kind: Kind,
    pub behaviour: Behaviour,
}

#[derive(Debug, Default)]
struct World {
    pages: Vec<Vec<Entry>>,
    current: usize,
    next_id: u32,
    opened: Option<(u32, Instant)>,
    dialog: Option<Dialog>,
    next_control: bool,
    case_insensitive_matching: bool,
    failing_scans: VecDeque<usize>,
    lookup_error: bool,
    busy_until: Option<Instant>,
    deleted: Vec<String>,
    activations: Vec<String>,
    lookups: u32,
    host: String,
}

/// Fake calendar. Pages are indexed from 0 internally; page 1 in the
/// loop's numbering is `pages[0]`.
pub struct FakeCalendar {
    world: Mutex<World>,
}

impl FakeCalendar {
    pub fn new(page_count: usize) -> Self {
        FakeCalendar {
            world: Mutex::new(World {
                pages: vec![Vec::new(); page_count.max(1)],
                next_control: true,
                host: "calendar.google.com".to_string(),
                ..Default::default()
            }),
        }
    }

    pub fn with_entry(self, page: usize, label: &str, kind: Kind, behaviour: Behaviour) -> Self {
        {
            let mut w = self.world.lock().unwrap();
            let id = w.next_id;
            w.next_id += 1;
            w.pages[page - 1].push(Entry {
                id,
                label: label.to_string(),
                kind,
                behaviour,
            });
        }
        self
    }

    pub fn with_event(self, page: usize, label: &str) -> Self {
        self.with_entry(page, label, Kind::Event, Behaviour::Single)
    }

    /// No "next" button, so pagination always fails.
    pub fn without_next_control(self) -> Self {
        self.world.lock().unwrap().next_control = false;
        self
    }

    /// Text lookups ignore case, like a sloppy host matcher would.
    pub fn with_case_insensitive_matching(self) -> Self {
        self.world.lock().unwrap().case_insensitive_matching = true;
        self
    }

    /// The scan of `page` (1-based) throws once.
    pub fn with_failing_scan(self, page: usize) -> Self {
        self.world.lock().unwrap().failing_scans.push_back(page - 1);
        self
    }

    /// Every lookup throws.
    pub fn with_broken_lookups(self) -> Self {
        self.world.lock().unwrap().lookup_error = true;
        self
    }

    pub fn with_host(self, host: &str) -> Self {
        self.world.lock().unwrap().host = host.to_string();
        self
    }

    /// Loading indicator shown until `after` from now.
    pub fn busy_for(&self, after: Duration) {
        self.world.lock().unwrap().busy_until = Some(Instant::now() + after);
    }

    pub fn current_page(&self) -> usize {
        self.world.lock().unwrap().current + 1
    }

    pub fn deleted(&self) -> Vec<String> {
        self.world.lock().unwrap().deleted.clone()
    }

    pub fn remaining(&self, page: usize) -> Vec<String> {
        self.world.lock().unwrap().pages[page - 1]
            .iter()
            .map(|e| e.label.clone())
            .collect()
    }

    pub fn activations(&self) -> Vec<String> {
        self.world.lock().unwrap().activations.clone()
    }

    pub fn lookups(&self) -> u32 {
        self.world.lock().unwrap().lookups
    }

    pub fn dialog_open(&self) -> bool {
        self.world.lock().unwrap().dialog.is_some()
    }

    /// Handle for an entry on the current page, as the finder would see it.
    pub fn handle_for(&self, label: &str) -> ElementHandle {
        let w = self.world.lock().unwrap();
        let entry = w.pages[w.current]
            .iter()
            .find(|e| e.label == label)
            .expect("no such entry on current page");
        ElementHandle::new(format!("entry:{}", entry.id))
    }
}

impl World {
    fn entries(&self) -> &[Entry] {
        &self.pages[self.current]
    }

    fn opened_entry(&self) -> Option<(&Entry, Instant)> {
        let (id, at) = self.opened?;
        self.entries().iter().find(|e| e.id == id).map(|e| (e, at))
    }

    fn delete_control_visible(&self, labels: &[String]) -> bool {
        let Some((entry, opened_at)) = self.opened_entry() else {
            return false;
        };
        let shown = match &entry.behaviour {
            Behaviour::Single | Behaviour::Recurring { .. } | Behaviour::LateRecurring { .. } => {
                true
            }
            Behaviour::NoDeleteControl | Behaviour::NoDeleteControlVanishes => false,
            Behaviour::SlowDeleteControl(delay) => opened_at.elapsed() >= *delay,
        };
        let label = match entry.kind {
            Kind::Event => "Delete event",
            Kind::Task => "Delete task",
        };
        shown && labels.iter().any(|l| l == label)
    }

    fn visible_dialog(&self) -> Option<&Dialog> {
        self.dialog
            .as_ref()
            .filter(|d| Instant::now() >= d.visible_from)
    }

    fn matches(&self, text: &str, needle: &str) -> bool {
        if self.case_insensitive_matching {
            text.to_lowercase().contains(&needle.to_lowercase())
        } else {
            text.contains(needle)
        }
    }

    fn find(&mut self, descriptor: &Descriptor) -> Result<Vec<ElementHandle>, HostError> {
        self.lookups += 1;
        if self.lookup_error {
            return Err(HostError::Script("document is gone".to_string()));
        }

        let handles = match descriptor {
            Descriptor::TextContains { needle, .. } => {
                if self.failing_scans.front() == Some(&self.current) {
                    self.failing_scans.pop_front();
                    return Err(HostError::Script("snapshot failed".to_string()));
                }
                self.entries()
                    .iter()
                    .filter(|e| self.matches(&e.label, needle))
                    .map(|e| ElementHandle::new(format!("entry:{}", e.id)))
                    .collect()
            }
            Descriptor::AriaLabel { labels, .. } => {
                if labels.iter().any(|l| l == "Next month") {
                    if self.next_control {
                        vec![ElementHandle::new(NEXT_HANDLE)]
                    } else {
                        vec![]
                    }
                } else if self.delete_control_visible(labels) {
                    vec![ElementHandle::new(DELETE_HANDLE)]
                } else {
                    vec![]
                }
            }
            Descriptor::Css { selector } => match selector.as_str() {
                s if s.contains("MdSI6d") => self
                    .visible_dialog()
                    .map(|_| vec![ElementHandle::new(DIALOG_HANDLE)])
                    .unwrap_or_default(),
                s if s.contains("data-mdc-dialog-action") => match self.visible_dialog() {
                    Some(d) if d.ok_button => vec![ElementHandle::new(OK_HANDLE)],
                    _ => vec![],
                },
                ".busy" => match self.busy_until {
                    Some(until) if Instant::now() < until => vec![ElementHandle::new(BUSY_HANDLE)],
                    _ => vec![],
                },
                _ => vec![],
            },
        };
        Ok(handles)
    }

    fn click(&mut self, element: &ElementHandle) -> Result<(), HostError> {
        self.activations.push(element.as_str().to_string());
        match element.as_str() {
            DELETE_HANDLE => {
                let (id, _) = self
                    .opened
                    .take()
                    .ok_or_else(|| HostError::Detached(element.clone()))?;
                let page = self.current;
                let pos = self.pages[page]
                    .iter()
                    .position(|e| e.id == id)
                    .ok_or_else(|| HostError::Detached(element.clone()))?;
                let entry = self.pages[page].remove(pos);
                self.dialog = match &entry.behaviour {
                    Behaviour::Recurring { text, ok_button } => Some(Dialog {
                        text: text.clone(),
                        ok_button: *ok_button,
                        visible_from: Instant::now(),
                    }),
                    Behaviour::LateRecurring { text, delay } => Some(Dialog {
                        text: text.clone(),
                        ok_button: true,
                        visible_from: Instant::now() + *delay,
                    }),
                    _ => None,
                };
                self.deleted.push(entry.label);
                Ok(())
            }
            OK_HANDLE => {
                self.dialog = None;
                Ok(())
            }
            NEXT_HANDLE => {
                self.opened = None;
                self.dialog = None;
                if self.current + 1 < self.pages.len() {
                    self.current += 1;
                } else {
                    self.pages.push(Vec::new());
                    self.current += 1;
                }
                Ok(())
            }
            token => {
                let id: u32 = token
                    .strip_prefix("entry:")
                    .and_then(|id| id.parse().ok())
                    .ok_or_else(|| HostError::Detached(element.clone()))?;
                let page = self.current;
                let pos = self.pages[page]
                    .iter()
                    .position(|e| e.id == id)
                    .ok_or_else(|| HostError::Detached(element.clone()))?;
                if self.pages[page][pos].behaviour == Behaviour::NoDeleteControlVanishes {
                    self.pages[page].remove(pos);
                    self.opened = None;
                } else {
                    self.opened = Some((id, Instant::now()));
                }
                Ok(())
            }
        }
    }

    fn text(&self, element: &ElementHandle) -> Result<String, HostError> {
        match element.as_str() {
            DIALOG_HANDLE => self
                .visible_dialog()
                .map(|d| d.text.clone())
                .ok_or_else(|| HostError::Detached(element.clone())),
            token => {
                let id: u32 = token
                    .strip_prefix("entry:")
                    .and_then(|id| id.parse().ok())
                    .ok_or_else(|| HostError::Detached(element.clone()))?;
                self.entries()
                    .iter()
                    .find(|e| e.id == id)
                    .map(|e| e.label.clone())
                    .ok_or_else(|| HostError::Detached(element.clone()))
            }
        }
    }
}

#[async_trait]
impl Page for FakeCalendar {
    async fn lookup_element(
        &self,
        descriptor: &Descriptor,
    ) -> Result<Option<ElementHandle>, HostError> {
        Ok(self.world.lock().unwrap().find(descriptor)?.into_iter().next())
    }

    async fn lookup_all(&self, descriptor: &Descriptor) -> Result<Vec<ElementHandle>, HostError> {
        self.world.lock().unwrap().find(descriptor)
    }

    async fn activate(&self, element: &ElementHandle) -> Result<(), HostError> {
        self.world.lock().unwrap().click(element)
    }

    async fn extract_text(&self, element: &ElementHandle) -> Result<String, HostError> {
        self.world.lock().unwrap().text(element)
    }

    async fn current_host_identifier(&self) -> Result<String, HostError> {
        Ok(self.world.lock().unwrap().host.clone())
    }
}

pub fn recurring(text: &str) -> Behaviour {
    Behaviour::Recurring {
        text: text.to_string(),
        ok_button: true,
    }
}

pub fn config(max_pages: u32) -> RunConfiguration {
    RunConfiguration {
        max_pages,
        timings: Timings::default(),
        ..Default::default()
    }
}
