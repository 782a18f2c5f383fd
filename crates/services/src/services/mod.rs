pub mod advice;
pub mod assistant;
pub mod chat_api;
pub mod fetch;
pub mod meals;
pub mod recommend;
