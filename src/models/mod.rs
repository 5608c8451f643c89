pub mod feedback;
pub mod pagination;
