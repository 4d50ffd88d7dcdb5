use super::LocalBackend;
use super::crud::{self, CrudOutput, Op, SubRoute};
use super::request::RouteRequest;
use super::response::Payload;
use crate::error::BackendError;

/// Pins are created and removed, never edited.
const ACTIONS: &[(&str, Op)] = &[
    ("get", Op::Find),
    ("pin", Op::Create),
    ("unpin", Op::Delete),
];

pub(crate) async fn handle(
    backend: &LocalBackend,
    route: &str,
    req: &RouteRequest,
) -> Result<Payload, BackendError> {
    let sub = SubRoute::parse(route, "pinned");
    let op = match crud::resolve(ACTIONS, &sub, &req.method)? {
        Op::Update => {
            return Err(BackendError::MethodNotAllowed {
                method: req.method.to_string(),
                route: route.to_string(),
            });
        }
        op => op,
    };

    Ok(match crud::run(backend.pinned.as_ref(), op, &sub, req).await? {
        CrudOutput::Many(all) => Payload::PinnedItems(all),
        CrudOutput::One(item) => Payload::PinnedItem(item),
        CrudOutput::Deleted(d) => Payload::Deleted(d),
    })
}
