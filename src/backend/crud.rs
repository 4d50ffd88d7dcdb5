use hyper::Method;

use super::request::RouteRequest;
use super::response::Deleted;
use crate::error::BackendError;
use crate::models::Entity;
use crate::repositories::EntityRepository;

/// What a sub-route of an entity segment does.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Op {
    /// Whole collection.
    List,
    /// Whole collection, or one record when an id is supplied.
    Find,
    /// One record; the id is required.
    Get,
    Create,
    Update,
    Delete,
}

impl Op {
    fn accepts(self, method: &Method) -> bool {
        match self {
            Op::List | Op::Find | Op::Get => *method == Method::GET || *method == Method::HEAD,
            Op::Create => *method == Method::POST,
            Op::Update => *method == Method::PUT || *method == Method::PATCH,
            Op::Delete => *method == Method::DELETE,
        }
    }

    /// The operation a bare or unknown sub-route implies from its method.
    fn implied_by(method: &Method) -> Op {
        match *method {
            Method::POST => Op::Create,
            Method::PUT | Method::PATCH => Op::Update,
            Method::DELETE => Op::Delete,
            _ => Op::List,
        }
    }
}

/// An entity segment split into its action and an optional trailing id,
/// e.g. `folder/update/17` → (`update`, `Some("17")`).
#[derive(Debug, Clone, Copy)]
pub struct SubRoute<'a> {
    pub route: &'a str,
    pub action: &'a str,
    pub tail: Option<&'a str>,
}

impl<'a> SubRoute<'a> {
    pub fn parse(route: &'a str, segment: &str) -> Self {
        let rest = route
            .strip_prefix(segment)
            .unwrap_or("")
            .trim_start_matches('/');
        let (action, tail) = match rest.split_once('/') {
            Some((action, tail)) => (action, Some(tail).filter(|t| !t.is_empty())),
            None => (rest, None),
        };
        Self { route, action, tail }
    }
}

/// Map an action name and method to an operation using `table`.
///
/// A known action hit with the wrong method is rejected. Unknown actions
/// fall back to whatever the method implies (GET lists the collection).
pub fn resolve(table: &[(&str, Op)], sub: &SubRoute<'_>, method: &Method) -> Result<Op, BackendError> {
    match table.iter().find(|(name, _)| *name == sub.action) {
        Some((_, op)) if op.accepts(method) => Ok(*op),
        Some(_) => Err(BackendError::MethodNotAllowed {
            method: method.to_string(),
            route: sub.route.to_string(),
        }),
        None => {
            let op = Op::implied_by(method);
            tracing::debug!(route = sub.route, method = %method, op = ?op, "unmapped entity action, using method default");
            Ok(op)
        }
    }
}

pub enum CrudOutput<T> {
    Many(Vec<T>),
    One(T),
    Deleted(Deleted),
}

pub async fn run<T: Entity>(
    repo: &dyn EntityRepository<T>,
    op: Op,
    sub: &SubRoute<'_>,
    req: &RouteRequest,
) -> Result<CrudOutput<T>, BackendError> {
    match op {
        Op::List => Ok(CrudOutput::Many(repo.list().await)),
        Op::Find | Op::Get => {
            let id = req.target_id(sub.tail, &Default::default());
            match (id, op) {
                (Some(id), _) => find_one(repo, &id).await.map(CrudOutput::One),
                (None, Op::Get) => Err(BackendError::MissingId(T::KIND)),
                (None, _) => Ok(CrudOutput::Many(repo.list().await)),
            }
        }
        Op::Create => {
            let body = req.json_object(T::KIND)?;
            repo.create(body).await.map(CrudOutput::One)
        }
        Op::Update => {
            let body = req.json_object(T::KIND)?;
            let id = req
                .target_id(sub.tail, &body)
                .ok_or(BackendError::MissingId(T::KIND))?;
            repo.update(&id, body).await.map(CrudOutput::One)
        }
        Op::Delete => {
            let body = req.json_object(T::KIND)?;
            let id = req
                .target_id(sub.tail, &body)
                .ok_or(BackendError::MissingId(T::KIND))?;
            let deleted = repo.delete(&id).await;
            Ok(CrudOutput::Deleted(Deleted { id, deleted }))
        }
    }
}

async fn find_one<T: Entity>(repo: &dyn EntityRepository<T>, id: &str) -> Result<T, BackendError> {
    repo.get(id).await.ok_or_else(|| BackendError::NotFound {
        entity: T::KIND,
        id: id.to_string(),
    })
}
