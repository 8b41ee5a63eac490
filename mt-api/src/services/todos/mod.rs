pub mod todo;
pub mod todos_service;
pub mod todos_shared;

pub use todo::TodoItem;
pub use todos_service::TodosService;
