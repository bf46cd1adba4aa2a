// src/models/student.rs
use super::{narrow, parse_date, parse_ts};
use crate::error::{AppError, AppResult};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    Paid,
    #[default]
    Pending,
    Overdue,
}

impl PaymentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::Paid => "paid",
            PaymentStatus::Pending => "pending",
            PaymentStatus::Overdue => "overdue",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "paid" => Some(PaymentStatus::Paid),
            "pending" => Some(PaymentStatus::Pending),
            "overdue" => Some(PaymentStatus::Overdue),
            _ => None,
        }
    }
}

/// Representa uma linha lida diretamente da tabela `students` (colunas snake_case).
#[derive(Debug, Clone, FromRow)]
pub struct StudentRow {
    pub id: String,
    pub name: String,
    pub email: String,
    pub avatar_url: String,
    pub course_name: String,
    pub current_day: i64,
    pub total_days: i64,
    pub latest_score: i64,
    pub needs_mentor: bool,
    pub last_activity: String,
    pub payment_status: String,
    pub enrollment_date: String,
    pub progress: i64,
}

/// Aluno tal como é usado pela aplicação e exposto em JSON (camelCase).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Student {
    pub id: String,
    pub name: String,
    pub email: String,
    pub avatar: String,
    pub course_name: String,
    pub current_day: u32,
    pub total_days: u32,
    pub latest_score: u8,
    pub needs_mentor: bool,
    pub last_activity: DateTime<Utc>,
    pub payment_status: PaymentStatus,
    pub enrollment_date: NaiveDate,
    pub progress: u8,
    /// Nunca é gravado; não existe estado de leitura no modelo, por isso é sempre 0.
    #[serde(default)]
    pub unread_count: u32,
}

impl Student {
    /// Invariantes: `currentDay <= totalDays`, `progress` e `latestScore` em [0,100].
    /// Nome e curso não podem ser vazios e o email tem de ter '@'.
    pub fn validate(&self) -> AppResult<()> {
        if self.name.trim().is_empty() {
            return Err(AppError::validation("name não pode ser vazio"));
        }
        if !self.email.contains('@') {
            return Err(AppError::validation(format!("email inválido: '{}'", self.email)));
        }
        if self.course_name.trim().is_empty() {
            return Err(AppError::validation("courseName não pode ser vazio"));
        }
        if self.current_day > self.total_days {
            return Err(AppError::validation(format!(
                "currentDay ({}) maior que totalDays ({})",
                self.current_day, self.total_days
            )));
        }
        if self.progress > 100 {
            return Err(AppError::validation(format!("progress fora de [0,100]: {}", self.progress)));
        }
        if self.latest_score > 100 {
            return Err(AppError::validation(format!(
                "latestScore fora de [0,100]: {}",
                self.latest_score
            )));
        }
        Ok(())
    }
}

impl TryFrom<StudentRow> for Student {
    type Error = AppError;

    fn try_from(row: StudentRow) -> AppResult<Self> {
        let payment_status = PaymentStatus::parse(&row.payment_status).ok_or_else(|| {
            AppError::CorruptRow(format!("payment_status = '{}'", row.payment_status))
        })?;

        Ok(Student {
            current_day: narrow("current_day", row.current_day)?,
            total_days: narrow("total_days", row.total_days)?,
            latest_score: narrow("latest_score", row.latest_score)?,
            progress: narrow("progress", row.progress)?,
            last_activity: parse_ts("last_activity", &row.last_activity)?,
            enrollment_date: parse_date("enrollment_date", &row.enrollment_date)?,
            id: row.id,
            name: row.name,
            email: row.email,
            avatar: row.avatar_url,
            course_name: row.course_name,
            needs_mentor: row.needs_mentor,
            payment_status,
            unread_count: 0,
        })
    }
}

fn first_day() -> u32 {
    1
}

/// Dados para criar um aluno (o id é atribuído pelo servidor).
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewStudent {
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub avatar: String,
    pub course_name: String,
    #[serde(default = "first_day")]
    pub current_day: u32,
    pub total_days: u32,
    #[serde(default)]
    pub latest_score: u8,
    #[serde(default)]
    pub needs_mentor: bool,
    #[serde(default)]
    pub last_activity: Option<DateTime<Utc>>,
    #[serde(default)]
    pub payment_status: PaymentStatus,
    #[serde(default)]
    pub enrollment_date: Option<NaiveDate>,
    #[serde(default)]
    pub progress: u8,
}

impl NewStudent {
    /// Preenche os campos em falta com os valores por omissão (agora / hoje).
    pub fn into_student(self, id: String, now: DateTime<Utc>) -> Student {
        Student {
            id,
            name: self.name,
            email: self.email,
            avatar: self.avatar,
            course_name: self.course_name,
            current_day: self.current_day,
            total_days: self.total_days,
            latest_score: self.latest_score,
            needs_mentor: self.needs_mentor,
            last_activity: self.last_activity.unwrap_or(now),
            payment_status: self.payment_status,
            enrollment_date: self.enrollment_date.unwrap_or_else(|| now.date_naive()),
            progress: self.progress,
            unread_count: 0,
        }
    }
}

/// Atualização parcial: só os campos presentes são alterados.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StudentPatch {
    pub name: Option<String>,
    pub email: Option<String>,
    pub avatar: Option<String>,
    pub course_name: Option<String>,
    pub current_day: Option<u32>,
    pub total_days: Option<u32>,
    pub latest_score: Option<u8>,
    pub needs_mentor: Option<bool>,
    pub last_activity: Option<DateTime<Utc>>,
    pub payment_status: Option<PaymentStatus>,
    pub enrollment_date: Option<NaiveDate>,
    pub progress: Option<u8>,
}

impl StudentPatch {
    pub fn apply_to(self, student: &mut Student) {
        if let Some(v) = self.name { student.name = v; }
        if let Some(v) = self.email { student.email = v; }
        if let Some(v) = self.avatar { student.avatar = v; }
        if let Some(v) = self.course_name { student.course_name = v; }
        if let Some(v) = self.current_day { student.current_day = v; }
        if let Some(v) = self.total_days { student.total_days = v; }
        if let Some(v) = self.latest_score { student.latest_score = v; }
        if let Some(v) = self.needs_mentor { student.needs_mentor = v; }
        if let Some(v) = self.last_activity { student.last_activity = v; }
        if let Some(v) = self.payment_status { student.payment_status = v; }
        if let Some(v) = self.enrollment_date { student.enrollment_date = v; }
        if let Some(v) = self.progress { student.progress = v; }
    }
}

/// Corpo de `PUT /api/students/{id}/payment-status`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentStatusPayload {
    pub payment_status: PaymentStatus,
}
