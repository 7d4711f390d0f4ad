//! In-memory note store
//!
//! Mirrors the PostgreSQL repository's observable behaviour: id
//! assignment, listing order, limit clamping, strategy selection and
//! NotFound classification. Title search follows the `simple` text search
//! configuration: lowercase alphanumeric tokens, every query token must
//! appear in the title.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::Utc;

use crate::db::DbError;
use crate::models::{ListParams, ListStrategy, Note, NoteContent, NoteId, NoteTitle};
use crate::store::NoteStore;

#[derive(Default)]
struct Tables {
    notes: BTreeMap<NoteId, Note>,
    audit: Vec<(NoteId, &'static str)>,
    last_id: NoteId,
}

/// In-memory note store
#[derive(Default)]
pub struct MemoryNoteStore {
    tables: Mutex<Tables>,
    round_trips: AtomicUsize,
}

impl MemoryNoteStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of storage round trips served so far.
    pub fn round_trips(&self) -> usize {
        self.round_trips.load(Ordering::SeqCst)
    }

    /// Audit rows written so far, oldest first.
    pub fn audit_entries(&self) -> Vec<(NoteId, &'static str)> {
        self.lock().audit.clone()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Tables> {
        self.tables.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn round_trip(&self) -> std::sync::MutexGuard<'_, Tables> {
        self.round_trips.fetch_add(1, Ordering::SeqCst);
        self.lock()
    }
}

/// Lowercased alphanumeric tokens, as the `simple` configuration splits them.
fn tokens(text: &str) -> Vec<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .map(str::to_lowercase)
        .collect()
}

fn title_matches(title: &str, query: &str) -> bool {
    let wanted = tokens(query);
    if wanted.is_empty() {
        return false;
    }
    let have = tokens(title);
    wanted.iter().all(|w| have.contains(w))
}

fn newest_first<'a>(notes: impl Iterator<Item = &'a Note>) -> Vec<Note> {
    let mut out: Vec<Note> = notes.cloned().collect();
    out.sort_by(|a, b| b.sort_key().cmp(&a.sort_key()));
    out
}

#[async_trait]
impl NoteStore for MemoryNoteStore {
    async fn create(&self, title: &NoteTitle, content: &NoteContent) -> Result<Note, DbError> {
        let mut tables = self.round_trip();

        tables.last_id += 1;
        let note = Note {
            id: tables.last_id,
            title: title.as_str().to_owned(),
            content: content.as_str().to_owned(),
            created_at: Utc::now(),
        };
        tables.notes.insert(note.id, note.clone());
        tables.audit.push((note.id, "create"));

        Ok(note)
    }

    async fn get(&self, id: NoteId) -> Result<Note, DbError> {
        self.round_trip()
            .notes
            .get(&id)
            .cloned()
            .ok_or_else(|| DbError::note_not_found(id))
    }

    async fn update(
        &self,
        id: NoteId,
        title: &NoteTitle,
        content: &NoteContent,
    ) -> Result<Note, DbError> {
        let mut tables = self.round_trip();
        let note = tables
            .notes
            .get_mut(&id)
            .ok_or_else(|| DbError::note_not_found(id))?;

        note.title = title.as_str().to_owned();
        note.content = content.as_str().to_owned();
        Ok(note.clone())
    }

    async fn delete(&self, id: NoteId) -> Result<(), DbError> {
        match self.round_trip().notes.remove(&id) {
            Some(_) => Ok(()),
            None => Err(DbError::note_not_found(id)),
        }
    }

    async fn list(&self, params: &ListParams) -> Result<Vec<Note>, DbError> {
        let tables = self.round_trip();
        let strategy = ListStrategy::select(params);
        let limit = usize::try_from(strategy.limit()).unwrap_or_default();

        let mut notes = match strategy {
            ListStrategy::Search { query, .. } => {
                newest_first(tables.notes.values().filter(|n| title_matches(&n.title, query)))
            }
            ListStrategy::After { cursor, .. } => {
                newest_first(tables.notes.values().filter(|n| cursor.admits(n)))
            }
            ListStrategy::FirstPage { .. } => newest_first(tables.notes.values()),
        };
        notes.truncate(limit);

        Ok(notes)
    }

    async fn batch_get(&self, ids: &[NoteId]) -> Result<Vec<Note>, DbError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let tables = self.round_trip();
        // Each stored note is visited once, so repeated ids collapse
        let found = tables.notes.values().filter(|n| ids.contains(&n.id));
        Ok(newest_first(found))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Cursor, NotePage};

    fn title(s: &str) -> NoteTitle {
        NoteTitle::new(s).unwrap()
    }

    fn content(s: &str) -> NoteContent {
        NoteContent::new(s).unwrap()
    }

    async fn seed(store: &MemoryNoteStore, titles: &[&str]) -> Vec<Note> {
        let mut out = Vec::new();
        for t in titles {
            out.push(store.create(&title(t), &content("body")).await.unwrap());
        }
        out
    }

    #[test]
    fn tokenizes_like_simple_config() {
        assert_eq!(tokens("Buy MILK, eggs!"), vec!["buy", "milk", "eggs"]);
        assert!(title_matches("Weekly Groceries", "groceries"));
        assert!(title_matches("Weekly Groceries", "GROCERIES weekly"));
        assert!(!title_matches("Weekly Groceries", "groceries monthly"));
        assert!(!title_matches("Weekly Groceries", "   "));
    }

    #[tokio::test]
    async fn create_then_get_round_trips_fields() {
        let store = MemoryNoteStore::new();
        let created = store.create(&title("t"), &content("c")).await.unwrap();
        let fetched = store.get(created.id).await.unwrap();

        assert_eq!(fetched, created);
        assert_eq!(fetched.title, "t");
        assert_eq!(fetched.content, "c");
    }

    #[tokio::test]
    async fn ids_strictly_increase() {
        let store = MemoryNoteStore::new();
        let notes = seed(&store, &["a", "b", "c"]).await;
        assert!(notes.windows(2).all(|w| w[0].id < w[1].id));
    }

    #[tokio::test]
    async fn only_create_writes_audit() {
        let store = MemoryNoteStore::new();
        let note = store.create(&title("t"), &content("c")).await.unwrap();
        store.update(note.id, &title("t2"), &content("c2")).await.unwrap();
        store.delete(note.id).await.unwrap();

        assert_eq!(store.audit_entries(), vec![(note.id, "create")]);
    }

    #[tokio::test]
    async fn update_keeps_identity_and_timestamp() {
        let store = MemoryNoteStore::new();
        let note = store.create(&title("t"), &content("c")).await.unwrap();
        let updated = store.update(note.id, &title("t2"), &content("c2")).await.unwrap();

        assert_eq!(updated.id, note.id);
        assert_eq!(updated.created_at, note.created_at);
        assert_eq!(updated.title, "t2");
    }

    #[tokio::test]
    async fn missing_ids_are_not_found() {
        let store = MemoryNoteStore::new();
        assert!(store.get(1).await.unwrap_err().is_not_found());
        assert!(store
            .update(1, &title("t"), &content("c"))
            .await
            .unwrap_err()
            .is_not_found());
        assert!(store.delete(1).await.unwrap_err().is_not_found());

        // Update on a missing id must not create it
        assert!(store.list(&ListParams::default()).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn delete_then_get_is_not_found() {
        let store = MemoryNoteStore::new();
        let note = store.create(&title("t"), &content("c")).await.unwrap();
        store.delete(note.id).await.unwrap();
        assert!(store.get(note.id).await.unwrap_err().is_not_found());
    }

    #[tokio::test]
    async fn default_list_is_capped_and_ordered() {
        let store = MemoryNoteStore::new();
        for i in 0..25 {
            store.create(&title(&format!("n{i}")), &content("c")).await.unwrap();
        }

        let page = store.list(&ListParams::default()).await.unwrap();
        assert_eq!(page.len(), 20);
        assert!(page.windows(2).all(|w| w[0].sort_key() > w[1].sort_key()));

        assert_eq!(store.list(&ListParams::new(0)).await.unwrap().len(), 20);
        assert_eq!(store.list(&ListParams::new(201)).await.unwrap().len(), 20);
        assert_eq!(store.list(&ListParams::new(200)).await.unwrap().len(), 25);
    }

    #[tokio::test]
    async fn keyset_pages_cover_everything_once() {
        let store = MemoryNoteStore::new();
        let notes = seed(&store, &["A", "B", "C"]).await;
        let (a, b, c) = (&notes[0], &notes[1], &notes[2]);

        let first = NotePage::new(store.list(&ListParams::new(2)).await.unwrap());
        assert_eq!(first.items, vec![c.clone(), b.clone()]);
        assert_eq!(first.next_cursor(), Some(Cursor::after(b)));

        let cursor = first.next_cursor().unwrap();
        let second = store.list(&ListParams::new(2).after(cursor)).await.unwrap();
        assert_eq!(second, vec![a.clone()]);

        let third = store
            .list(&ListParams::new(2).after(Cursor::after(a)))
            .await
            .unwrap();
        assert!(third.is_empty());

        let mut walked = first.items;
        walked.extend(second);
        assert_eq!(walked, store.list(&ListParams::new(3)).await.unwrap());
    }

    #[tokio::test]
    async fn search_ignores_cursor() {
        let store = MemoryNoteStore::new();
        let notes = seed(&store, &["alpha report", "beta", "gamma"]).await;

        // Cursor past everything; the query still sees the whole table
        let params = ListParams::new(10)
            .after(Cursor::after(&notes[0]))
            .matching("alpha");
        let found = store.list(&params).await.unwrap();
        assert_eq!(found, vec![notes[0].clone()]);

        let none = store.list(&ListParams::new(10).matching("delta")).await.unwrap();
        assert!(none.is_empty());
    }

    #[tokio::test]
    async fn batch_get_set_semantics() {
        let store = MemoryNoteStore::new();
        let notes = seed(&store, &["a", "b", "c"]).await;

        let before = store.round_trips();
        assert!(store.batch_get(&[]).await.unwrap().is_empty());
        assert_eq!(store.round_trips(), before);

        let found = store
            .batch_get(&[notes[0].id, notes[2].id, notes[0].id, 999])
            .await
            .unwrap();
        assert_eq!(found, vec![notes[2].clone(), notes[0].clone()]);
        assert_eq!(store.round_trips(), before + 1);
    }
}
