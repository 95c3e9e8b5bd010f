use crate::error::ApiError;
use crate::blogs::{
    dto::{CreateBlogRequest, UpdateBlogRequest},
    repo_types::{NewBlog, BlogPatch},
};
use crate::validation::{check_length, check_optional_length, normalize, normalize_patch};

pub const MAX_TITLE: usize = 200;
pub const MAX_CONTENT: usize = 100_000;
pub const MAX_LINK: usize = 2048;

pub fn validate_create(req: CreateBlogRequest) -> Result<NewBlog, ApiError> {
    let title = req.title.map(|n| n.trim().to_string());
    let content = normalize(req.content);
    let link = normalize(req.link);

    let mut errors = Vec::new();
    check_length(&mut errors, "title", title.as_deref(), 1, MAX_TITLE);
    check_optional_length(&mut errors, "content", content.as_deref(), MAX_CONTENT);
    check_optional_length(&mut errors, "link", link.as_deref(), MAX_LINK);

    match title {
        Some(title) if errors.is_empty() => Ok(NewBlog {
            title,
            content,
            link,
        }),
        _ => Err(ApiError::Validation(errors)),
    }
}

pub fn validate_update(req: UpdateBlogRequest) -> Result<BlogPatch, ApiError> {
    let title = req.title.map(|n| n.trim().to_string());
    let content = normalize_patch(req.content);
    let link = normalize_patch(req.link);

    let mut errors = Vec::new();
    if title.is_some() {
        check_length(&mut errors, "title", title.as_deref(), 1, MAX_TITLE);
    }
    check_optional_length(
        &mut errors,
        "content",
        content.as_ref().and_then(Option::as_deref),
        MAX_CONTENT,
    );
    check_optional_length(&mut errors, "link", link.as_ref().and_then(Option::as_deref), MAX_LINK);

    if !errors.is_empty() {
        return Err(ApiError::Validation(errors));
    }
    Ok(BlogPatch {
        title,
        content,
        link,
    })
}
