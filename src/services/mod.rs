pub(crate) mod attempt_policy;
pub(crate) mod collaborators;
pub(crate) mod grading;
pub(crate) mod permissions;
