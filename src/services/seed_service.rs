// src/services/seed_service.rs
use crate::{
    db::Store,
    error::{AppError, AppResult},
    fixtures::{self, Fixtures},
    models::{message::NewMessage, note::NewAdminNote},
    realtime::{ChangeEvent, ChangeKind, Table},
    services::{logged, message_service, note_service, student_service},
};
use std::collections::BTreeSet;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SeedOutcome {
    /// A tabela `students` já tinha dados; nada foi escrito.
    Skipped { existing: i64 },
    Seeded { students: usize, messages: usize, notes: usize },
}

/// Popula a DB com as fixtures embutidas, se estiver vazia.
pub async fn seed_database(store: &Store) -> AppResult<SeedOutcome> {
    let fixtures = fixtures::load()?;
    seed_with(store, &fixtures).await
}

/// Seed tudo-ou-nada: a guarda e as inserções correm na mesma transação.
/// Um registo que falhe é logado e desfaz o lote inteiro.
pub async fn seed_with(store: &Store, fixtures: &Fixtures) -> AppResult<SeedOutcome> {
    tracing::info!("🌱 Iniciando seed da base de dados...");
    let mut tx = store.pool().begin().await.map_err(logged("iniciar transação de seed"))?;

    let existing: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM students")
        .fetch_one(&mut *tx)
        .await
        .map_err(logged("contar alunos"))?;
    if existing > 0 {
        tracing::info!("Base de dados já tem {} alunos, seed ignorado.", existing);
        return Ok(SeedOutcome::Skipped { existing });
    }

    tracing::info!("Inserindo {} alunos...", fixtures.students.len());
    for student in &fixtures.students {
        student.validate().inspect_err(|e| {
            tracing::error!("Aluno de fixture inválido '{}': {}", student.name, e);
        })?;
        student_service::insert_row(&mut *tx, student).await.map_err(|e| {
            tracing::error!("Erro no seed do aluno '{}': {}", student.name, e);
            AppError::Store(e)
        })?;
        tracing::debug!("Aluno inserido: {}", student.name);
    }

    tracing::info!("Inserindo {} mensagens...", fixtures.messages.len());
    for message in &fixtures.messages {
        let new = NewMessage {
            student_id: message.student_id.clone(),
            sender: message.sender,
            content: message.content.clone(),
            timestamp: Some(message.timestamp),
            is_admin_note: message.is_admin_note,
        };
        message_service::insert_row(&mut *tx, &message.id, &new).await.map_err(|e| {
            tracing::error!("Erro no seed da mensagem {}: {}", message.id, e);
            AppError::Store(e)
        })?;
    }

    tracing::info!("Inserindo {} notas...", fixtures.notes.len());
    for note in &fixtures.notes {
        let new = NewAdminNote {
            student_id: note.student_id.clone(),
            content: note.content.clone(),
            admin_name: note.admin_name.clone(),
            timestamp: Some(note.timestamp),
        };
        note_service::insert_row(&mut *tx, &note.id, &new).await.map_err(|e| {
            tracing::error!("Erro no seed da nota {}: {}", note.id, e);
            AppError::Store(e)
        })?;
    }

    tx.commit().await.map_err(logged("confirmar seed"))?;

    // Só depois do commit é que os subscritores são avisados
    for student in &fixtures.students {
        store.publish(ChangeEvent::new(Table::Students, ChangeKind::Insert, &student.id));
    }
    let with_messages: BTreeSet<&str> = fixtures.messages.iter().map(|m| m.student_id.as_str()).collect();
    for student_id in with_messages {
        store.publish(ChangeEvent::new(Table::ChatMessages, ChangeKind::Insert, student_id));
    }
    let with_notes: BTreeSet<&str> = fixtures.notes.iter().map(|n| n.student_id.as_str()).collect();
    for student_id in with_notes {
        store.publish(ChangeEvent::new(Table::AdminNotes, ChangeKind::Insert, student_id));
    }

    tracing::info!("✅ Seed concluído com sucesso!");
    Ok(SeedOutcome::Seeded {
        students: fixtures.students.len(),
        messages: fixtures.messages.len(),
        notes: fixtures.notes.len(),
    })
}
