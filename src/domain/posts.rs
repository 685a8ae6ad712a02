//! Ownership rules for rendered posts.

use folio_api_types::Post;

use super::claims::Claims;

/// Mutation affordances a viewer may see next to a post.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PostActions {
    pub edit: bool,
    pub delete: bool,
}

impl PostActions {
    pub fn any(self) -> bool {
        self.edit || self.delete
    }
}

/// Whether the decoded claims name the owner of `post`.
///
/// The subject must equal the canonical (lowercase, hyphenated) account id
/// exactly. This is a display hint. The server remains the authority and rejects
/// mutations from non-owners regardless of what the client shows.
pub fn is_owner(claims: Option<&Claims>, post: &Post) -> bool {
    claims
        .and_then(|claims| claims.subject.as_deref())
        .is_some_and(|subject| subject == post.account_id.to_string())
}

pub fn actions_for(claims: Option<&Claims>, post: &Post) -> PostActions {
    let owner = is_owner(claims, post);
    PostActions {
        edit: owner,
        delete: owner,
    }
}
