// src/fixtures.rs
use crate::{
    error::AppResult,
    models::{message::ChatMessage, note::AdminNote, student::Student},
};
use serde::Deserialize;

// Dados de exemplo embutidos no binário (seed + modo degradado)
const FIXTURES_JSON: &str = include_str!("data/fixtures.json");

#[derive(Debug, Clone, Deserialize)]
pub struct Fixtures {
    pub students: Vec<Student>,
    pub messages: Vec<ChatMessage>,
    pub notes: Vec<AdminNote>,
}

pub fn load() -> AppResult<Fixtures> {
    Ok(serde_json::from_str(FIXTURES_JSON)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn embedded_fixtures_are_consistent() {
        let fixtures = load().unwrap();
        assert!(!fixtures.students.is_empty());
        for s in &fixtures.students {
            s.validate().unwrap();
            assert_eq!(s.unread_count, 0);
        }

        let ids: HashSet<&str> = fixtures.students.iter().map(|s| s.id.as_str()).collect();
        assert_eq!(ids.len(), fixtures.students.len());
        assert!(fixtures.messages.iter().all(|m| ids.contains(m.student_id.as_str())));
        assert!(fixtures.notes.iter().all(|n| ids.contains(n.student_id.as_str())));
    }
}
