// src/api/handlers/ws.rs
//! Live feed of quiz submissions for admin dashboards.

use actix::{Actor, Addr, AsyncContext, Handler, Message, StreamHandler};
use actix_web::{Error, HttpRequest, HttpResponse, web};
use actix_web_actors::ws;
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::api::auth::AdminUser;
use crate::models::{Outcome, QuizAttempt, Score};

/// Pushed to every connected socket after a quiz is submitted.
#[derive(Message, Clone, Debug, Serialize)]
#[rtype(result = "()")]
#[serde(rename_all = "camelCase")]
pub struct SubmissionUpdate {
    pub event: &'static str,
    pub attempt_id: String,
    pub user_id: String,
    pub user_name: String,
    pub quiz_id: String,
    pub result: Outcome,
    pub score: Score,
    pub language: String,
    pub completed_at: String,
}

impl SubmissionUpdate {
    pub fn from_attempt(attempt: &QuizAttempt, user_name: &str) -> Self {
        Self {
            event: "quiz_submitted",
            attempt_id: attempt.id.clone(),
            user_id: attempt.user_id.clone(),
            user_name: user_name.to_string(),
            quiz_id: attempt.quiz_id.clone(),
            result: attempt.result,
            score: attempt.score,
            language: attempt.language.clone(),
            completed_at: attempt.completed_at.clone(),
        }
    }
}

#[derive(Clone, Default)]
pub struct WsBroker {
    clients: Arc<RwLock<Vec<Addr<WsConnection>>>>,
}

impl WsBroker {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn register(&self, addr: Addr<WsConnection>) {
        let mut clients = self.clients.write().await;
        clients.push(addr);
        log::debug!("Live feed client connected ({} total)", clients.len());
    }

    pub async fn unregister(&self, addr: &Addr<WsConnection>) {
        let mut clients = self.clients.write().await;
        clients.retain(|c| c != addr);
    }

    pub async fn client_count(&self) -> usize {
        self.clients.read().await.len()
    }

    pub async fn broadcast(&self, msg: SubmissionUpdate) {
        let clients = self.clients.read().await;
        for client in clients.iter() {
            client.do_send(msg.clone());
        }
    }
}

pub struct WsConnection {
    broker: WsBroker,
}

impl WsConnection {
    pub fn new(broker: WsBroker) -> Self {
        Self { broker }
    }
}

impl Actor for WsConnection {
    type Context = ws::WebsocketContext<Self>;

    fn started(&mut self, ctx: &mut Self::Context) {
        let addr = ctx.address();
        let broker = self.broker.clone();
        actix::spawn(async move {
            broker.register(addr).await;
        });
    }

    fn stopped(&mut self, ctx: &mut Self::Context) {
        let addr = ctx.address();
        let broker = self.broker.clone();
        actix::spawn(async move {
            broker.unregister(&addr).await;
        });
    }
}

impl StreamHandler<Result<ws::Message, ws::ProtocolError>> for WsConnection {
    fn handle(&mut self, msg: Result<ws::Message, ws::ProtocolError>, ctx: &mut Self::Context) {
        match msg {
            Ok(ws::Message::Ping(msg)) => ctx.pong(&msg),
            Ok(ws::Message::Close(reason)) => ctx.close(reason),
            // Feed is one-way.
            _ => (),
        }
    }
}

impl Handler<SubmissionUpdate> for WsConnection {
    type Result = ();

    fn handle(&mut self, msg: SubmissionUpdate, ctx: &mut Self::Context) {
        if let Ok(json) = serde_json::to_string(&msg) {
            ctx.text(json);
        }
    }
}

/// GET /api/ws (admins only)
pub async fn ws_handler(
    req: HttpRequest,
    stream: web::Payload,
    broker: web::Data<WsBroker>,
    admin: AdminUser,
) -> Result<HttpResponse, Error> {
    log::debug!("Live feed requested by {}", admin.0.email);
    let conn = WsConnection::new(broker.get_ref().clone());
    ws::start(conn, &req, stream)
}
