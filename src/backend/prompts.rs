use super::LocalBackend;
use super::crud::{self, CrudOutput, Op, SubRoute};
use super::request::RouteRequest;
use super::response::Payload;
use crate::error::BackendError;
use crate::models::Prompt;
use crate::models::prompt::library_prompts;

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
    let sub = SubRoute::parse(route, "prompt");
    let op = crud::resolve(ACTIONS, &sub, &req.method)?;

    Ok(match crud::run(backend.prompts.as_ref(), op, &sub, req).await? {
        CrudOutput::Many(all) => Payload::Prompts(filter(all, req)),
        CrudOutput::One(prompt) => Payload::Prompt(prompt),
        CrudOutput::Deleted(d) => Payload::Deleted(d),
    })
}

/// `prompts-library`: built-in starters first, then the user's own prompts.
pub(crate) async fn library(backend: &LocalBackend, req: &RouteRequest) -> Result<Payload, BackendError> {
    let mut prompts = library_prompts();
    prompts.extend(backend.prompts.list().await);
    Ok(Payload::Prompts(filter(prompts, req)))
}

/// Optional `?category=` and case-insensitive `?search=` filters.
fn filter(prompts: Vec<Prompt>, req: &RouteRequest) -> Vec<Prompt> {
    let category = req.query_param("category");
    let search = req.query_param("search").map(str::to_lowercase);

    prompts
        .into_iter()
        .filter(|p| category.is_none_or(|c| p.category.eq_ignore_ascii_case(c)))
        .filter(|p| {
            search.as_deref().is_none_or(|needle| {
                p.name.to_lowercase().contains(needle) || p.content.to_lowercase().contains(needle)
            })
        })
        .collect()
}
