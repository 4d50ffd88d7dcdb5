use super::LocalBackend;
use super::crud::{self, CrudOutput, Op, SubRoute};
use super::request::RouteRequest;
use super::response::Payload;
use crate::error::BackendError;
use crate::models::Folder;

const ACTIONS: &[(&str, Op)] = &[
    ("get-all", Op::List),
    ("get", Op::Find),
    ("get-by-id", Op::Get),
    ("create", Op::Create),
    ("update", Op::Update),
    ("delete", Op::Delete),
    ("pinned", Op::List),
];

pub(crate) async fn handle(
    backend: &LocalBackend,
    route: &str,
    req: &RouteRequest,
) -> Result<Payload, BackendError> {
    let sub = SubRoute::parse(route, "folder");
    let op = crud::resolve(ACTIONS, &sub, &req.method)?;

    if sub.action == "pinned" {
        let pinned: Vec<Folder> = backend
            .folders
            .list()
            .await
            .into_iter()
            .filter(|f| f.is_pinned)
            .collect();
        return Ok(Payload::Folders(pinned));
    }

    Ok(match crud::run(backend.folders.as_ref(), op, &sub, req).await? {
        CrudOutput::Many(all) => Payload::Folders(all),
        CrudOutput::One(folder) => Payload::Folder(folder),
        CrudOutput::Deleted(d) => Payload::Deleted(d),
    })
}
