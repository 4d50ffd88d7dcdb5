use super::LocalBackend;
use super::crud::{self, CrudOutput, Op, SubRoute};
use super::request::RouteRequest;
use super::response::Payload;
use crate::error::BackendError;

const ACTIONS: &[(&str, Op)] = &[
    ("get", Op::Find),
    ("get-all", Op::List),
    ("get-by-id", Op::Get),
    ("create", Op::Create),
    ("update", Op::Update),
    ("delete", Op::Delete),
];

pub(crate) async fn handle(
    backend: &LocalBackend,
    route: &str,
    req: &RouteRequest,
) -> Result<Payload, BackendError> {
    let sub = SubRoute::parse(route, "chains");
    let op = crud::resolve(ACTIONS, &sub, &req.method)?;

    Ok(match crud::run(backend.chains.as_ref(), op, &sub, req).await? {
        CrudOutput::Many(all) => Payload::Chains(all),
        CrudOutput::One(chain) => Payload::Chain(chain),
        CrudOutput::Deleted(d) => Payload::Deleted(d),
    })
}
