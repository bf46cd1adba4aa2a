// src/realtime.rs
//! Feed de alterações e subscrições "re-fetch on change".
//!
//! Cada escrita bem-sucedida publica um [`ChangeEvent`] no canal da [`Store`].
//! Uma subscrição não aplica o delta: volta a correr a query completa do seu
//! âmbito e entrega a coleção inteira ao callback.

use crate::{
    db::Store,
    error::AppResult,
    models::{message::ChatMessage, note::AdminNote, student::Student},
    services::{message_service, note_service, student_service},
};
use std::future::Future;
use tokio::{sync::broadcast::error::RecvError, task::JoinHandle};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Table {
    Students,
    ChatMessages,
    AdminNotes,
}

impl Table {
    pub fn as_str(&self) -> &'static str {
        match self {
            Table::Students => "students",
            Table::ChatMessages => "chat_messages",
            Table::AdminNotes => "admin_notes",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeKind {
    Insert,
    Update,
    Delete,
}

/// Evento ao nível da linha. `student_id` é a chave usada nos filtros
/// (o próprio id para `students`, a FK para as outras tabelas).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangeEvent {
    pub table: Table,
    pub kind: ChangeKind,
    pub student_id: Option<String>,
}

impl ChangeEvent {
    pub fn new(table: Table, kind: ChangeKind, student_id: impl Into<String>) -> Self {
        ChangeEvent { table, kind, student_id: Some(student_id.into()) }
    }
}

/// Âmbito de uma subscrição: uma tabela, opcionalmente só as linhas de um aluno.
#[derive(Debug, Clone)]
pub struct Scope {
    pub table: Table,
    pub student_id: Option<String>,
}

impl Scope {
    pub fn table(table: Table) -> Self {
        Scope { table, student_id: None }
    }

    pub fn student(table: Table, student_id: impl Into<String>) -> Self {
        Scope { table, student_id: Some(student_id.into()) }
    }

    pub fn matches(&self, event: &ChangeEvent) -> bool {
        if event.table != self.table {
            return false;
        }
        match &self.student_id {
            None => true,
            Some(id) => event.student_id.as_deref() == Some(id.as_str()),
        }
    }
}

/// Handle de uma subscrição ativa. `unsubscribe` (ou drop) termina a task.
#[derive(Debug)]
pub struct Subscription {
    handle: JoinHandle<()>,
}

impl Subscription {
    pub fn unsubscribe(self) {
        self.handle.abort();
    }

    pub fn is_active(&self) -> bool {
        !self.handle.is_finished()
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

/// Abre uma subscrição: a cada evento que corresponde ao `scope`, corre `fetch`
/// e entrega o resultado a `callback`. Falhas no `fetch` são logadas e ignoradas.
pub fn subscribe<T, F, Fut, C>(store: &Store, scope: Scope, fetch: F, callback: C) -> Subscription
where
    T: Send + 'static,
    F: Fn(Store) -> Fut + Send + 'static,
    Fut: Future<Output = AppResult<Vec<T>>> + Send + 'static,
    C: Fn(Vec<T>) + Send + 'static,
{
    // O receiver é criado já aqui para não perder eventos enquanto a task arranca
    let mut rx = store.changes();
    let store = store.clone();

    tracing::debug!(
        "Nova subscrição em '{}' (aluno: {:?})",
        scope.table.as_str(),
        scope.student_id
    );

    let handle = tokio::spawn(async move {
        loop {
            match rx.recv().await {
                Ok(event) if scope.matches(&event) => {
                    tracing::trace!("Evento {:?} em '{}', re-fetch.", event.kind, scope.table.as_str());
                }
                Ok(_) => continue,
                Err(RecvError::Lagged(skipped)) => {
                    // Perdemos eventos; um único re-fetch repõe o estado
                    tracing::warn!(
                        "Subscrição em '{}' atrasada ({} eventos perdidos), re-fetch.",
                        scope.table.as_str(),
                        skipped
                    );
                }
                Err(RecvError::Closed) => break,
            }

            match fetch(store.clone()).await {
                Ok(items) => callback(items),
                Err(e) => tracing::warn!(
                    "Falha no re-fetch de '{}' (aluno: {:?}): {}",
                    scope.table.as_str(),
                    scope.student_id,
                    e
                ),
            }
        }
        tracing::debug!("Feed de alterações fechado, subscrição terminada.");
    });

    Subscription { handle }
}

pub fn subscribe_students<C>(store: &Store, callback: C) -> Subscription
where
    C: Fn(Vec<Student>) + Send + 'static,
{
    subscribe(
        store,
        Scope::table(Table::Students),
        |store| async move { student_service::list_all(&store).await },
        callback,
    )
}

pub fn subscribe_messages<C>(store: &Store, student_id: &str, callback: C) -> Subscription
where
    C: Fn(Vec<ChatMessage>) + Send + 'static,
{
    let id = student_id.to_string();
    subscribe(
        store,
        Scope::student(Table::ChatMessages, student_id),
        move |store| {
            let id = id.clone();
            async move { message_service::list_by_student(&store, &id).await }
        },
        callback,
    )
}

pub fn subscribe_notes<C>(store: &Store, student_id: &str, callback: C) -> Subscription
where
    C: Fn(Vec<AdminNote>) + Send + 'static,
{
    let id = student_id.to_string();
    subscribe(
        store,
        Scope::student(Table::AdminNotes, student_id),
        move |store| {
            let id = id.clone();
            async move { note_service::list_by_student(&store, &id).await }
        },
        callback,
    )
}
