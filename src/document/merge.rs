use super::{SessionDocument, SessionRecord};

/// How a record landed in the document
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Merge {
    Replaced,
    Appended,
}

impl SessionDocument {
    pub fn find(&self, name: &str) -> Option<&SessionRecord> {
        self.sessions.iter().find(|s| s.name == name)
    }

    pub fn names(&self) -> Vec<String> {
        self.sessions.iter().map(|s| s.name.clone()).collect()
    }

    /// Drop the active mark from every record
    pub fn clear_active(&mut self) {
        for session in &mut self.sessions {
            session.active = false;
        }
    }

    /// Replace the record with the same name wholesale, or append it
    pub fn upsert(&mut self, record: SessionRecord) -> Merge {
        match self.sessions.iter_mut().find(|s| s.name == record.name) {
            Some(existing) => {
                *existing = record;
                Merge::Replaced
            }
            None => {
                self.sessions.push(record);
                Merge::Appended
            }
        }
    }

    pub fn remove(&mut self, name: &str) -> Option<SessionRecord> {
        let position = self.sessions.iter().position(|s| s.name == name)?;
        Some(self.sessions.remove(position))
    }
}
