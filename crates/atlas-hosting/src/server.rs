//! HTTP/WebSocket front door: fronts exactly one long-lived room rather
//! than routing requests among many.
use actix_cors::Cors;
use actix_web::App;
use actix_web::HttpRequest;
use actix_web::HttpResponse;
use actix_web::HttpServer;
use actix_web::Responder;
use actix_web::http::StatusCode;
use actix_web::middleware::Logger;
use actix_web::web;
use futures::StreamExt;

use crate::runtime::RoomHandle;

pub struct Server;

impl Server {
    pub async fn run() -> std::io::Result<()> {
        let room = web::Data::new(RoomHandle::spawn());
        let bind_addr = std::env::var("BIND_ADDR").expect("BIND_ADDR must be set");
        log::info!("starting hosting server on {bind_addr}");
        HttpServer::new(move || {
            App::new()
                .wrap(Logger::new("%r %s %Ts"))
                .wrap(Cors::default().allow_any_origin().allow_any_method().allow_any_header())
                .app_data(room.clone())
                .route("/ws", web::get().to(enter))
        })
        .workers(4)
        .bind(bind_addr)?
        .run()
        .await
    }
}

/// Upgrade to a WebSocket and bridge it to the room task. A request that
/// isn't actually a WebSocket upgrade gets a proper 426, not a 500 — this
/// is a client protocol error, not a server fault.
async fn enter(room: web::Data<RoomHandle>, body: web::Payload, req: HttpRequest) -> impl Responder {
    match actix_ws::handle(&req, body) {
        Ok((response, session, stream)) => {
            bridge(room.get_ref().clone(), session, stream);
            response.map_into_left_body()
        }
        Err(err) => HttpResponse::build(StatusCode::UPGRADE_REQUIRED)
            .body(err.to_string())
            .map_into_right_body(),
    }
}

/// Forward room-outbound frames to the socket and socket-inbound text
/// frames into the room, until either side closes or errors.
fn bridge(room: RoomHandle, mut session: actix_ws::Session, mut stream: actix_ws::MessageStream) {
    actix_web::rt::spawn(async move {
        let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
        let id = match room.connect(tx).await {
            Ok(id) => id,
            Err(err) => {
                log::warn!("room connect failed: {err}");
                return;
            }
        };
        log::debug!("connection {id} bridged");

        'bridge: loop {
            tokio::select! {
                biased;
                outgoing = rx.recv() => match outgoing {
                    Some(json) => if session.text(json).await.is_err() { break 'bridge },
                    None => break 'bridge,
                },
                incoming = stream.next() => match incoming {
                    Some(Ok(actix_ws::Message::Text(text))) => room.message(id, text.to_string()),
                    Some(Ok(actix_ws::Message::Close(_))) => break 'bridge,
                    Some(Err(_)) => break 'bridge,
                    None => break 'bridge,
                    _ => continue 'bridge,
                },
            }
        }

        room.disconnect(id);
        log::debug!("connection {id} disconnected");
    });
}
