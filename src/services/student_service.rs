// src/services/student_service.rs
use crate::{
    db::Store,
    error::{AppError, AppResult},
    models::{
        format_ts,
        student::{NewStudent, PaymentStatus, Student, StudentPatch, StudentRow},
    },
    realtime::{ChangeEvent, ChangeKind, Table},
    services::logged,
};
use chrono::Utc;
use sqlx::SqliteConnection;
use uuid::Uuid;

// Colunas lidas em todas as queries (created_at/updated_at ficam só na DB)
const COLUMNS: &str = "id, name, email, avatar_url, course_name, current_day, total_days, \
    latest_score, needs_mentor, last_activity, payment_status, enrollment_date, progress";

fn into_students(rows: Vec<StudentRow>) -> AppResult<Vec<Student>> {
    rows.into_iter().map(Student::try_from).collect()
}

/// Todos os alunos, mais recentes primeiro.
pub async fn list_all(store: &Store) -> AppResult<Vec<Student>> {
    tracing::debug!("Buscando todos os alunos...");
    let sql = format!("SELECT {} FROM students ORDER BY created_at DESC, rowid DESC", COLUMNS);
    let rows: Vec<StudentRow> = sqlx::query_as(&sql)
        .fetch_all(store.pool())
        .await
        .map_err(logged("listar alunos"))?;

    tracing::debug!("Encontrados {} alunos.", rows.len());
    into_students(rows)
}

/// Busca um aluno pelo ID. Não encontrado é `Ok(None)`, não um erro.
pub async fn get_by_id(store: &Store, id: &str) -> AppResult<Option<Student>> {
    tracing::debug!("Buscando aluno por ID: {}", id);
    let sql = format!("SELECT {} FROM students WHERE id = ?1", COLUMNS);
    let row: Option<StudentRow> = sqlx::query_as(&sql)
        .bind(id)
        .fetch_optional(store.pool())
        .await
        .map_err(logged("buscar aluno"))?;

    if row.is_none() {
        tracing::debug!("Aluno '{}' não encontrado.", id);
    }
    row.map(Student::try_from).transpose()
}

/// Número total de alunos (usado pelo seed como guarda de idempotência).
pub async fn count(store: &Store) -> AppResult<i64> {
    sqlx::query_scalar("SELECT COUNT(*) FROM students")
        .fetch_one(store.pool())
        .await
        .map_err(logged("contar alunos"))
}

/// Insere a linha tal como está (id incluído). Partilhado com o seed,
/// que corre dentro de uma transação.
pub(crate) async fn insert_row(
    conn: &mut SqliteConnection,
    student: &Student,
) -> Result<StudentRow, sqlx::Error> {
    let now = format_ts(&Utc::now());
    let sql = format!(
        r#"
        INSERT INTO students (
            id, name, email, avatar_url, course_name, current_day, total_days,
            latest_score, needs_mentor, last_activity, payment_status, enrollment_date,
            progress, created_at, updated_at
        )
        VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?14)
        RETURNING {}
        "#,
        COLUMNS
    );

    sqlx::query_as(&sql)
        .bind(&student.id)
        .bind(&student.name)
        .bind(&student.email)
        .bind(&student.avatar)
        .bind(&student.course_name)
        .bind(i64::from(student.current_day))
        .bind(i64::from(student.total_days))
        .bind(i64::from(student.latest_score))
        .bind(student.needs_mentor)
        .bind(format_ts(&student.last_activity))
        .bind(student.payment_status.as_str())
        .bind(student.enrollment_date.format("%Y-%m-%d").to_string())
        .bind(i64::from(student.progress))
        .bind(now)
        .fetch_one(conn)
        .await
}

/// Cria um aluno com ID atribuído pelo servidor e devolve o registo gravado.
pub async fn create(store: &Store, new: NewStudent) -> AppResult<Student> {
    let student = new.into_student(Uuid::new_v4().to_string(), Utc::now());
    student.validate()?;

    tracing::info!("Criando aluno '{}' ({})", student.name, student.id);
    let mut conn = store.pool().acquire().await.map_err(logged("obter conexão"))?;
    let row = insert_row(&mut conn, &student)
        .await
        .map_err(logged("criar aluno"))?;
    drop(conn);
    let created = Student::try_from(row)?;

    store.publish(ChangeEvent::new(Table::Students, ChangeKind::Insert, &created.id));
    tracing::info!("✅ Aluno '{}' criado.", created.id);
    Ok(created)
}

/// Aplica uma atualização parcial. As invariantes são verificadas sobre o
/// registo já combinado, antes de escrever.
pub async fn update(store: &Store, id: &str, patch: StudentPatch) -> AppResult<Student> {
    tracing::info!("Atualizando aluno '{}'", id);
    let mut tx = store.pool().begin().await.map_err(logged("iniciar transação"))?;

    let sql = format!("SELECT {} FROM students WHERE id = ?1", COLUMNS);
    let current: Option<StudentRow> = sqlx::query_as(&sql)
        .bind(id)
        .fetch_optional(&mut *tx)
        .await
        .map_err(logged("buscar aluno"))?;

    let mut student = match current {
        Some(row) => Student::try_from(row)?,
        None => {
            tracing::warn!("Falha ao atualizar: aluno '{}' não encontrado.", id);
            return Err(AppError::not_found("Aluno", id));
        }
    };

    patch.apply_to(&mut student);
    student.validate()?; // Em caso de erro a transação é desfeita no drop

    let sql = format!(
        r#"
        UPDATE students SET
            name = ?1, email = ?2, avatar_url = ?3, course_name = ?4,
            current_day = ?5, total_days = ?6, latest_score = ?7, needs_mentor = ?8,
            last_activity = ?9, payment_status = ?10, enrollment_date = ?11,
            progress = ?12, updated_at = ?13
        WHERE id = ?14
        RETURNING {}
        "#,
        COLUMNS
    );
    let row: StudentRow = sqlx::query_as(&sql)
        .bind(&student.name)
        .bind(&student.email)
        .bind(&student.avatar)
        .bind(&student.course_name)
        .bind(i64::from(student.current_day))
        .bind(i64::from(student.total_days))
        .bind(i64::from(student.latest_score))
        .bind(student.needs_mentor)
        .bind(format_ts(&student.last_activity))
        .bind(student.payment_status.as_str())
        .bind(student.enrollment_date.format("%Y-%m-%d").to_string())
        .bind(i64::from(student.progress))
        .bind(format_ts(&Utc::now()))
        .bind(id)
        .fetch_one(&mut *tx)
        .await
        .map_err(logged("atualizar aluno"))?;

    tx.commit().await.map_err(logged("confirmar transação"))?;

    store.publish(ChangeEvent::new(Table::Students, ChangeKind::Update, id));
    Student::try_from(row)
}

/// Ação do painel: inverte a flag `needsMentor`.
pub async fn toggle_mentor(store: &Store, id: &str) -> AppResult<Student> {
    tracing::info!("Alternando needs_mentor do aluno '{}'", id);
    let sql = format!(
        "UPDATE students SET needs_mentor = NOT needs_mentor, updated_at = ?1 WHERE id = ?2 RETURNING {}",
        COLUMNS
    );
    let row: Option<StudentRow> = sqlx::query_as(&sql)
        .bind(format_ts(&Utc::now()))
        .bind(id)
        .fetch_optional(store.pool())
        .await
        .map_err(logged("alternar mentor"))?;

    let row = row.ok_or_else(|| AppError::not_found("Aluno", id))?;
    store.publish(ChangeEvent::new(Table::Students, ChangeKind::Update, id));
    Student::try_from(row)
}

/// Ação do painel: muda o estado de pagamento.
pub async fn set_payment_status(store: &Store, id: &str, status: PaymentStatus) -> AppResult<Student> {
    let patch = StudentPatch { payment_status: Some(status), ..Default::default() };
    update(store, id, patch).await
}

/// Apaga o aluno. As mensagens e notas saem em cascata (FK na DB).
/// Devolve `false` se o aluno não existia.
pub async fn delete(store: &Store, id: &str) -> AppResult<bool> {
    tracing::info!("Apagando aluno '{}'", id);
    let rows_affected = sqlx::query("DELETE FROM students WHERE id = ?1")
        .bind(id)
        .execute(store.pool())
        .await
        .map_err(logged("apagar aluno"))?
        .rows_affected();

    if rows_affected == 0 {
        tracing::warn!("Aluno '{}' não existia.", id);
        return Ok(false);
    }

    for table in [Table::Students, Table::ChatMessages, Table::AdminNotes] {
        store.publish(ChangeEvent::new(table, ChangeKind::Delete, id));
    }
    Ok(true)
}

fn matches_query(student: &Student, needle: &str) -> bool {
    [&student.name, &student.email, &student.course_name]
        .iter()
        .any(|field| field.to_lowercase().contains(needle))
}

/// Pesquisa (sem distinguir maiúsculas) por nome, email ou curso.
/// Query vazia devolve a lista completa.
///
/// O filtro corre em Rust: o `lower()`/`LIKE` do SQLite só dobra ASCII,
/// e os nomes têm acentos ("Ângela" / "ângela").
pub async fn search(store: &Store, query: &str) -> AppResult<Vec<Student>> {
    let query = query.trim();
    if query.is_empty() {
        return list_all(store).await;
    }

    tracing::debug!("Pesquisando alunos por '{}'", query);
    let needle = query.to_lowercase();
    let found: Vec<Student> = list_all(store)
        .await?
        .into_iter()
        .filter(|student| matches_query(student, &needle))
        .collect();

    tracing::debug!("Pesquisa '{}' devolveu {} alunos.", query, found.len());
    Ok(found)
}
