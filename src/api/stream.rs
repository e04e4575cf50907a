//! Server-sent-event bodies for store subscriptions and clock views.

use crate::logic::ClockView;
use crate::store::Subscription;
use actix_web::http::header;
use actix_web::web::Bytes;
use actix_web::HttpResponse;
use futures_util::stream::{self, Stream, StreamExt};
use log::debug;
use serde::Serialize;
use std::convert::Infallible;
use tokio::sync::broadcast;
use tokio::sync::broadcast::error::RecvError;

fn frame<T: Serialize>(value: &T) -> Bytes {
    match serde_json::to_string(value) {
        Ok(json) => Bytes::from(format!("data: {json}\n\n")),
        Err(e) => {
            debug!("dropping unserializable frame: {e}");
            Bytes::new()
        }
    }
}

fn sse<S>(body: S) -> HttpResponse
where
    S: Stream<Item = Result<Bytes, Infallible>> + 'static,
{
    HttpResponse::Ok()
        .insert_header((header::CONTENT_TYPE, "text/event-stream"))
        .insert_header((header::CACHE_CONTROL, "no-cache"))
        .streaming(body)
}

/// Stream every change the subscription receives. Ends when the client disconnects (the
/// subscription is dropped with the body) or the store closes.
pub(super) fn changes(subscription: Subscription) -> HttpResponse {
    sse(stream::unfold(subscription, |mut sub| async move {
        let change = sub.recv().await?;
        Some((Ok::<_, Infallible>(frame(&change)), sub))
    }))
}

/// Stream clock views, starting with the current one, as seen by a viewer with the given
/// permissions.
pub(super) fn clock_views(
    initial: ClockView,
    rx: broadcast::Receiver<ClockView>,
    read_only: bool,
) -> HttpResponse {
    let first = stream::once(async move {
        Ok::<_, Infallible>(frame(&initial.for_viewer(read_only)))
    });
    let rest = stream::unfold(rx, move |mut rx| async move {
        loop {
            match rx.recv().await {
                Ok(view) => {
                    let bytes = frame(&view.for_viewer(read_only));
                    return Some((Ok::<_, Infallible>(bytes), rx));
                }
                Err(RecvError::Lagged(skipped)) => {
                    debug!("clock stream lagged, skipped {skipped} view(s)");
                }
                Err(RecvError::Closed) => return None,
            }
        }
    });
    sse(first.chain(rest))
}
