// src/web/realtime_handlers.rs
use crate::{
    db::Store,
    error::AppResult,
    realtime::{self, Subscription},
    services::{message_service, note_service, student_service},
};
use axum::{
    extract::{
        ws::{Message, WebSocketUpgrade}, // Tipos WebSocket
        Path, State,
    },
    response::IntoResponse,
};
use futures_util::{Sink, SinkExt, Stream, StreamExt}; // Para manipular WS stream
use serde::Serialize;
use std::future::Future;
use tokio::sync::mpsc;
use uuid::Uuid; // Para IDs de conexão

// --- Handlers WebSocket (GET /ws/...) ---

/// GET /ws/students
pub async fn students_ws_handler(ws: WebSocketUpgrade, State(store): State<Store>) -> impl IntoResponse {
    tracing::info!("Upgrade WebSocket: feed de alunos");
    ws.on_upgrade(move |socket| async move {
        let feed_store = store.clone();
        let (ws_sender, ws_receiver) = socket.split();
        run_feed(
            ws_sender,
            ws_receiver,
            "students".to_string(),
            move |tx| realtime::subscribe_students(&feed_store, move |students| forward(&tx, &students)),
            async move { student_service::list_all(&store).await },
        )
        .await
    })
}

/// GET /ws/students/{id}/messages
pub async fn messages_ws_handler(
    ws: WebSocketUpgrade,
    State(store): State<Store>,
    Path(student_id): Path<String>,
) -> impl IntoResponse {
    tracing::info!("Upgrade WebSocket: feed de mensagens do aluno {}", student_id);
    ws.on_upgrade(move |socket| async move {
        let feed_store = store.clone();
        let feed_id = student_id.clone();
        let (ws_sender, ws_receiver) = socket.split();
        run_feed(
            ws_sender,
            ws_receiver,
            format!("messages/{}", student_id),
            move |tx| {
                realtime::subscribe_messages(&feed_store, &feed_id, move |messages| forward(&tx, &messages))
            },
            async move { message_service::list_by_student(&store, &student_id).await },
        )
        .await
    })
}

/// GET /ws/students/{id}/notes
pub async fn notes_ws_handler(
    ws: WebSocketUpgrade,
    State(store): State<Store>,
    Path(student_id): Path<String>,
) -> impl IntoResponse {
    tracing::info!("Upgrade WebSocket: feed de notas do aluno {}", student_id);
    ws.on_upgrade(move |socket| async move {
        let feed_store = store.clone();
        let feed_id = student_id.clone();
        let (ws_sender, ws_receiver) = socket.split();
        run_feed(
            ws_sender,
            ws_receiver,
            format!("notes/{}", student_id),
            move |tx| realtime::subscribe_notes(&feed_store, &feed_id, move |notes| forward(&tx, &notes)),
            async move { note_service::list_by_student(&store, &student_id).await },
        )
        .await
    })
}

/// Serializa a coleção e põe-na no canal da conexão.
/// Canal cheio: o push é descartado, o próximo traz a coleção completa na mesma.
fn forward<T: Serialize + ?Sized>(tx: &mpsc::Sender<Message>, items: &T) {
    match serde_json::to_string(items) {
        Ok(text) => {
            if let Err(e) = tx.try_send(Message::Text(text.into())) {
                tracing::warn!("Push WS descartado: {}", e);
            }
        }
        Err(e) => tracing::error!("Erro ao serializar push WS: {:?}", e),
    }
}

/// Gere uma conexão WebSocket de feed (já dividida em sender/receiver):
/// abre a subscrição, envia o estado inicial e reencaminha cada push até o
/// cliente fechar.
async fn run_feed<T, S, Fut, W, R, E>(mut ws_sender: W, mut ws_receiver: R, feed: String, open: S, initial: Fut)
where
    T: Serialize,
    S: FnOnce(mpsc::Sender<Message>) -> Subscription,
    Fut: Future<Output = AppResult<Vec<T>>>,
    W: Sink<Message> + Unpin + Send + 'static,
    <W as Sink<Message>>::Error: Send,
    R: Stream<Item = Result<Message, E>> + Unpin + Send + 'static,
    E: Send + 'static,
{
    let conn_id = Uuid::new_v4(); // Gera ID único para esta conexão
    tracing::info!("🔌 Nova conexão WS ({}): {}", feed, conn_id);

    let (tx, mut rx) = mpsc::channel::<Message>(32); // Buffer de 32 mensagens

    // Subscreve antes de ler o estado inicial para não perder alterações pelo meio
    let subscription = open(tx.clone());
    match initial.await {
        Ok(items) => forward(&tx, &items),
        Err(e) => tracing::warn!("Falha ao carregar estado inicial do feed {}: {}", feed, e),
    }
    drop(tx);

    // --- Task 1: Enviar mensagens do canal MPSC para o cliente ---
    let mut send_task = tokio::spawn(async move {
        while let Some(msg) = rx.recv().await {
            if ws_sender.send(msg).await.is_err() {
                tracing::warn!("Falha ao enviar msg WS para {}, terminando send_task.", conn_id);
                break;
            }
        }
    });

    // --- Task 2: Ler o cliente só para detetar o fecho ---
    let mut recv_task = tokio::spawn(async move {
        while let Some(Ok(msg)) = ws_receiver.next().await {
            match msg {
                Message::Close(_) => {
                    tracing::info!("Cliente {} enviou Close frame.", conn_id);
                    break;
                }
                // O feed é só de saída; o resto é ignorado
                _ => tracing::trace!("Ignorando msg WS de {}", conn_id),
            }
        }
    });

    // Espera que uma das tasks termine e aborta a outra
    tokio::select! {
        _ = (&mut send_task) => recv_task.abort(),
        _ = (&mut recv_task) => send_task.abort(),
    };

    subscription.unsubscribe();
    tracing::info!("🔌 Conexão WS ({}) {} fechada.", feed, conn_id);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::message::{NewMessage, Sender};
    use crate::models::student::tests::new_student;
    use futures_util::{sink, stream};
    use serde_json::Value;
    use std::time::Duration;
    use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender};
    use tokio::time::timeout;

    type ClientSink = std::pin::Pin<Box<dyn Sink<Message, Error = ()> + Send>>;
    type ClientStream = std::pin::Pin<Box<dyn Stream<Item = Result<Message, axum::Error>> + Send>>;

    /// Socket em memória: o que o servidor envia sai em `out_rx`,
    /// o que o cliente manda entra por `in_tx`.
    fn memory_socket() -> (ClientSink, ClientStream, UnboundedReceiver<Message>, UnboundedSender<Message>) {
        let (out_tx, out_rx) = mpsc::unbounded_channel::<Message>();
        let (in_tx, in_rx) = mpsc::unbounded_channel::<Message>();
        let sink: ClientSink = Box::pin(sink::unfold(out_tx, |tx: UnboundedSender<Message>, msg: Message| async move {
            tx.send(msg).map_err(|_| ())?;
            Ok::<_, ()>(tx)
        }));
        let stream: ClientStream = Box::pin(stream::unfold(in_rx, |mut rx: UnboundedReceiver<Message>| async move {
            rx.recv().await.map(|msg| (Ok::<_, axum::Error>(msg), rx))
        }));
        (sink, stream, out_rx, in_tx)
    }

    async fn recv_json(rx: &mut UnboundedReceiver<Message>) -> Value {
        match timeout(Duration::from_secs(2), rx.recv()).await.unwrap().unwrap() {
            Message::Text(text) => serde_json::from_str(text.as_str()).unwrap(),
            other => panic!("esperava texto, veio {:?}", other),
        }
    }

    async fn wait_for_no_subscribers(store: &Store) {
        timeout(Duration::from_secs(2), async {
            while store.subscriber_count() > 0 {
                tokio::time::sleep(Duration::from_millis(10)).await;
            }
        })
        .await
        .unwrap();
    }

    #[tokio::test]
    async fn students_feed_sends_initial_then_pushes_until_close() {
        let store = Store::open_in_memory().await.unwrap();
        let ana = student_service::create(&store, new_student("Ana", "ana@email.com", "Rust")).await.unwrap();

        let (client_sink, client_stream, mut out_rx, in_tx) = memory_socket();
        let feed_store = store.clone();
        let initial_store = store.clone();
        let feed = tokio::spawn(run_feed(
            client_sink,
            client_stream,
            "students".to_string(),
            move |tx| realtime::subscribe_students(&feed_store, move |students| forward(&tx, &students)),
            async move { student_service::list_all(&initial_store).await },
        ));

        let initial = recv_json(&mut out_rx).await;
        assert_eq!(initial.as_array().unwrap().len(), 1);
        assert_eq!(initial[0]["id"], ana.id.as_str());

        student_service::create(&store, new_student("Bia", "bia@email.com", "Go")).await.unwrap();
        let pushed = recv_json(&mut out_rx).await;
        assert_eq!(pushed.as_array().unwrap().len(), 2);
        assert_eq!(pushed[0]["name"], "Bia");

        in_tx.send(Message::Close(None)).unwrap();
        timeout(Duration::from_secs(2), feed).await.unwrap().unwrap();
        wait_for_no_subscribers(&store).await;

        // Depois do fecho não há mais pushes: o canal do cliente termina
        student_service::create(&store, new_student("Rui", "rui@email.com", "Java")).await.unwrap();
        assert!(timeout(Duration::from_secs(2), out_rx.recv()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn messages_feed_only_pushes_for_its_student() {
        let store = Store::open_in_memory().await.unwrap();
        let ana = student_service::create(&store, new_student("Ana", "ana@email.com", "Rust")).await.unwrap();
        let bia = student_service::create(&store, new_student("Bia", "bia@email.com", "Go")).await.unwrap();

        let (client_sink, client_stream, mut out_rx, in_tx) = memory_socket();
        let feed_store = store.clone();
        let initial_store = store.clone();
        let feed_id = ana.id.clone();
        let initial_id = ana.id.clone();
        let feed = tokio::spawn(run_feed(
            client_sink,
            client_stream,
            format!("messages/{}", ana.id),
            move |tx| realtime::subscribe_messages(&feed_store, &feed_id, move |messages| forward(&tx, &messages)),
            async move { message_service::list_by_student(&initial_store, &initial_id).await },
        ));

        assert_eq!(recv_json(&mut out_rx).await, Value::Array(vec![]));

        let to = |student_id: &str, content: &str| NewMessage {
            student_id: student_id.to_string(),
            sender: Sender::Student,
            content: content.to_string(),
            timestamp: None,
            is_admin_note: false,
        };
        message_service::send(&store, to(&bia.id, "não é para a Ana")).await.unwrap();
        message_service::send(&store, to(&ana.id, "olá")).await.unwrap();

        let pushed = recv_json(&mut out_rx).await;
        assert_eq!(pushed.as_array().unwrap().len(), 1);
        assert_eq!(pushed[0]["content"], "olá");

        // Cliente desaparece sem Close frame: o fim do stream também fecha o feed
        drop(in_tx);
        timeout(Duration::from_secs(2), feed).await.unwrap().unwrap();
        wait_for_no_subscribers(&store).await;
    }

    #[tokio::test]
    async fn notes_feed_sends_current_notes_on_connect() {
        let store = Store::open_in_memory().await.unwrap();
        let ana = student_service::create(&store, new_student("Ana", "ana@email.com", "Rust")).await.unwrap();
        let note = crate::models::note::NewAdminNote {
            student_id: ana.id.clone(),
            content: "Precisa de mentor".to_string(),
            admin_name: "Admin".to_string(),
            timestamp: None,
        };
        note_service::create(&store, note).await.unwrap();

        let (client_sink, client_stream, mut out_rx, in_tx) = memory_socket();
        let feed_store = store.clone();
        let initial_store = store.clone();
        let feed_id = ana.id.clone();
        let initial_id = ana.id.clone();
        let feed = tokio::spawn(run_feed(
            client_sink,
            client_stream,
            format!("notes/{}", ana.id),
            move |tx| realtime::subscribe_notes(&feed_store, &feed_id, move |notes| forward(&tx, &notes)),
            async move { note_service::list_by_student(&initial_store, &initial_id).await },
        ));

        let initial = recv_json(&mut out_rx).await;
        assert_eq!(initial[0]["adminName"], "Admin");

        in_tx.send(Message::Close(None)).unwrap();
        timeout(Duration::from_secs(2), feed).await.unwrap().unwrap();
        wait_for_no_subscribers(&store).await;
    }
}
