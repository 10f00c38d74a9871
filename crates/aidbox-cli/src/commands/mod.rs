pub mod crud;
pub mod reference;
pub mod search;
