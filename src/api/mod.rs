pub(crate) mod collaborators;
pub(crate) mod errors;
pub(crate) mod extract;
pub(crate) mod guards;
pub(crate) mod handlers;
pub(crate) mod me;
pub(crate) mod quizzes;
pub(crate) mod router;
pub(crate) mod validation;
