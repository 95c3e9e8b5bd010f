use crate::error::ApiError;
use crate::projects::{
    dto::{CreateProjectRequest, UpdateProjectRequest},
    repo_types::{NewProject, ProjectPatch},
};
use crate::validation::{check_length, check_optional_length, normalize, normalize_patch};

pub const MAX_NAME: usize = 200;
pub const MAX_DESCRIPTION: usize = 10_000;
pub const MAX_LINK: usize = 2048;

pub fn validate_create(req: CreateProjectRequest) -> Result<NewProject, ApiError> {
    let name = req.name.map(|n| n.trim().to_string());
    let description = normalize(req.description);
    let link = normalize(req.link);

    let mut errors = Vec::new();
    check_length(&mut errors, "name", name.as_deref(), 1, MAX_NAME);
    check_optional_length(&mut errors, "description", description.as_deref(), MAX_DESCRIPTION);
    check_optional_length(&mut errors, "link", link.as_deref(), MAX_LINK);

    match name {
        Some(name) if errors.is_empty() => Ok(NewProject {
            name,
            description,
            link,
        }),
        _ => Err(ApiError::Validation(errors)),
    }
}

pub fn validate_update(req: UpdateProjectRequest) -> Result<ProjectPatch, ApiError> {
    let name = req.name.map(|n| n.trim().to_string());
    let description = normalize_patch(req.description);
    let link = normalize_patch(req.link);

    let mut errors = Vec::new();
    if name.is_some() {
        check_length(&mut errors, "name", name.as_deref(), 1, MAX_NAME);
    }
    check_optional_length(
        &mut errors,
        "description",
        description.as_ref().and_then(Option::as_deref),
        MAX_DESCRIPTION,
    );
    check_optional_length(&mut errors, "link", link.as_ref().and_then(Option::as_deref), MAX_LINK);

    if !errors.is_empty() {
        return Err(ApiError::Validation(errors));
    }
    Ok(ProjectPatch {
        name,
        description,
        link,
    })
}
