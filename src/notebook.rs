use log::debug;

use crate::{
    domain::{Note, NoteChanges, Project},
    storage::{NoteStore, StoreError},
};

/// The session's single source of truth. Every mutating call is followed by a
/// full save; calls that change nothing do not touch the file.
pub struct Notebook {
    project: Project,
    store: NoteStore,
}

impl Notebook {
    pub fn open(store: NoteStore) -> Result<Self, StoreError> {
        let project = store.load()?;
        Ok(Self { project, store })
    }

    pub fn project(&self) -> &Project {
        &self.project
    }

    pub fn store(&self) -> &NoteStore {
        &self.store
    }

    /// Appends `note` and returns its index.
    pub fn add(&mut self, note: Note) -> Result<usize, StoreError> {
        self.project.add_note(note);
        self.store.save(&self.project)?;
        Ok(self.project.len() - 1)
    }

    /// Returns `false` when there is no note at `index`.
    pub fn edit(&mut self, index: usize, changes: NoteChanges) -> Result<bool, StoreError> {
        let Some(note) = self.project.get_mut(index) else {
            debug!("event=note_edit status=skipped index={}", index);
            return Ok(false);
        };
        note.update(changes);
        self.store.save(&self.project)?;
        Ok(true)
    }

    pub fn remove(&mut self, index: usize) -> Result<Option<Note>, StoreError> {
        let Some(removed) = self.project.remove_at(index) else {
            debug!("event=note_remove status=skipped index={}", index);
            return Ok(None);
        };
        self.store.save(&self.project)?;
        Ok(Some(removed))
    }
}
