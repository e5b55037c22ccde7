mod attempts;
mod manage;
mod questions;

pub(super) use attempts::{get_quiz_result, start_quiz, submit_quiz};
pub(super) use manage::{
    create_quiz, delete_quiz, get_quiz, list_quizzes, publish_quiz, unpublish_quiz, update_quiz,
};
pub(super) use questions::{add_question, delete_question, update_question};
