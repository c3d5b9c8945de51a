pub mod compare;
pub mod hash;
pub mod index;
pub mod search;
pub mod vector;
