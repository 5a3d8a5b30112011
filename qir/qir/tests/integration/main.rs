mod fixtures;
mod planning;
mod traversal;
mod validation;
