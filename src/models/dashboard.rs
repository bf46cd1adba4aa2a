// src/models/dashboard.rs
use super::student::Student;
use serde::Serialize;

/// Origem dos dados devolvidos ao painel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DataSource {
    Live,
    /// Fixtures estáticas, usadas só em modo degradado.
    Fixture,
}

#[derive(Debug, Clone, Serialize)]
pub struct DegradedNotice {
    pub reason: String,
}

/// Resposta de `GET /api/dashboard`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardSnapshot {
    pub students: Vec<Student>,
    pub source: DataSource,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub degraded: Option<DegradedNotice>,
}

impl DashboardSnapshot {
    pub fn live(students: Vec<Student>) -> Self {
        DashboardSnapshot { students, source: DataSource::Live, degraded: None }
    }

    pub fn fixture(students: Vec<Student>, reason: impl Into<String>) -> Self {
        DashboardSnapshot {
            students,
            source: DataSource::Fixture,
            degraded: Some(DegradedNotice { reason: reason.into() }),
        }
    }
}
