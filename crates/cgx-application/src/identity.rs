//! Project identity resolution.
//!
//! A user-facing operation may receive a project id, a friendly name, or a
//! filesystem path; [`resolve_project_input`] turns any of the three into a
//! validated [`ProjectId`].

use std::path::Path;

use cgx_domain::error::{Error, Result};
use cgx_domain::ports::graph_store::GraphStore;
use cgx_domain::utils::path::looks_like_path;
use cgx_domain::value_objects::ProjectId;
use tracing::debug;

/// Resolve free-form user input into a project id.
///
/// Resolution cascade:
/// 1. Input already matching `proj_<12hex>` is returned as-is.
/// 2. Otherwise the store is consulted for a project with that name or
///    stored root path.
/// 3. Otherwise, input that looks like a filesystem path derives the id
///    directly (ids are a pure function of the path).
///
/// # Errors
///
/// Fails with a not-found error when none of the steps apply.
pub async fn resolve_project_input(input: &str, store: &dyn GraphStore) -> Result<ProjectId> {
    if ProjectId::is_valid(input) {
        return ProjectId::parse(input);
    }

    if let Some(project) = store.find_project(input).await? {
        debug!(input, id = %project.id, "Resolved project by name/path lookup");
        return Ok(project.id);
    }

    if looks_like_path(input) {
        let id = ProjectId::from_root_path(Path::new(input));
        debug!(input, id = %id, "Derived project id from path");
        return Ok(id);
    }

    Err(Error::not_found(format!("project '{input}'")))
}
